//! Reading the subject distinguished name of a certificate.
//!
//! Attributes are rendered with the short names OpenSSL uses (`CN`, `GN`, `SN`,
//! `serialNumber`, `name`, ...), one attribute per line in DER order. The relying-party
//! `srvInfo` name and the end-user fields in the completion data are both derived from
//! this representation.

use const_oid::ObjectIdentifier;
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, TeletexStringRef, Utf8StringRef},
    Encode, Tag, Tagged,
};
use x509_cert::{
    attr::{AttributeTypeAndValue, AttributeValue},
    Certificate,
};

use super::Error;

pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const SURNAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.4");
pub const SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
pub const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
pub const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const TITLE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.12");
pub const NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.41");
pub const GIVEN_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.42");
pub const INITIALS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.43");
pub const DN_QUALIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.46");
pub const PSEUDONYM: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.65");
pub const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");
pub const DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25");
pub const USER_ID: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1");

const SHORT_NAMES: &[(ObjectIdentifier, &str)] = &[
    (COMMON_NAME, "CN"),
    (SURNAME, "SN"),
    (SERIAL_NUMBER, "serialNumber"),
    (COUNTRY_NAME, "C"),
    (LOCALITY_NAME, "L"),
    (STATE_OR_PROVINCE_NAME, "ST"),
    (STREET_ADDRESS, "street"),
    (ORGANIZATION_NAME, "O"),
    (ORGANIZATIONAL_UNIT, "OU"),
    (TITLE, "title"),
    (NAME, "name"),
    (GIVEN_NAME, "GN"),
    (INITIALS, "initials"),
    (DN_QUALIFIER, "dnQualifier"),
    (PSEUDONYM, "pseudonym"),
    (EMAIL_ADDRESS, "emailAddress"),
    (DOMAIN_COMPONENT, "DC"),
    (USER_ID, "UID"),
];

/// Subject attributes in DER order, flattening multi-valued RDNs.
fn attributes(certificate: &Certificate) -> impl Iterator<Item = &AttributeTypeAndValue> {
    certificate
        .tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
}

/// The text of an attribute value, for the directory string types BankID certificates use.
pub fn attribute_text(value: &AttributeValue) -> Option<&str> {
    match value.tag() {
        Tag::Utf8String => Utf8StringRef::try_from(value).ok().map(|s| s.as_str()),
        Tag::PrintableString => PrintableStringRef::try_from(value).ok().map(|s| s.as_str()),
        Tag::Ia5String => Ia5StringRef::try_from(value).ok().map(|s| s.as_str()),
        Tag::TeletexString => TeletexStringRef::try_from(value).ok().map(|s| s.as_str()),
        _ => None,
    }
}

/// The first `CN` of the subject.
pub fn common_name(certificate: &Certificate) -> Option<&str> {
    attributes(certificate)
        .find(|attribute| attribute.oid == COMMON_NAME)
        .and_then(|attribute| attribute_text(&attribute.value))
}

/// How a certificate is named in error messages.
fn label(certificate: &Certificate) -> String {
    common_name(certificate)
        .unwrap_or("certificate without CN")
        .to_string()
}

/// The OpenSSL short name of a subject attribute, if it has one.
pub fn short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .find(|(known, _)| known == oid)
        .map(|(_, name)| *name)
}

/// The subject as `key=value` lines in DER order, e.g. `["C=SE", "O=...", "CN=..."]`.
///
/// Attributes without a short name use their dotted OID, and values that are not
/// strings are rendered as `#` followed by the hex of their DER encoding.
pub fn subject_lines(certificate: &Certificate) -> Vec<String> {
    attributes(certificate)
        .map(|attribute| {
            let key = short_name(&attribute.oid)
                .map(str::to_string)
                .unwrap_or_else(|| attribute.oid.to_string());
            format!("{key}={}", render_value(&attribute.value))
        })
        .collect()
}

fn render_value(value: &AttributeValue) -> String {
    match attribute_text(value) {
        Some(s) => s.to_string(),
        None => {
            let der = value.to_der().unwrap_or_default();
            let hex: String = der.iter().map(|b| format!("{b:02X}")).collect();
            format!("#{hex}")
        }
    }
}

/// Find the single string value of a subject attribute.
///
/// The attribute must occur exactly once and hold a string.
pub fn single_attribute<'a>(
    certificate: &'a Certificate,
    oid: ObjectIdentifier,
    name: &'static str,
) -> Result<&'a str, Error> {
    let mut values = attributes(certificate)
        .filter(|attribute| attribute.oid == oid)
        .map(|attribute| &attribute.value);

    let Some(value) = values.next() else {
        return Err(Error::Missing {
            certificate_common_name: label(certificate),
            name,
        });
    };

    if values.next().is_some() {
        return Err(Error::Multiple {
            certificate_common_name: label(certificate),
            name,
        });
    }

    attribute_text(value).ok_or_else(|| Error::NotAString {
        certificate_common_name: label(certificate),
        name,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::definitions::x509::test::{rp_certificate, user_certificate};

    #[test]
    fn relying_party_subject_in_der_order() {
        let rp = rp_certificate();
        assert_eq!(
            subject_lines(&rp.inner),
            vec![
                "C=SE",
                "O=Testbank A AB (publ)",
                "serialNumber=5566304928",
                "name=Test av BankID",
                "CN=FP Testcert 4",
            ]
        );
    }

    #[test]
    fn end_user_fields_are_found_by_oid() {
        let user = user_certificate();
        assert_eq!(
            single_attribute(&user.inner, SERIAL_NUMBER, "serialNumber").unwrap(),
            "200211242383"
        );
        assert_eq!(
            single_attribute(&user.inner, GIVEN_NAME, "givenName").unwrap(),
            "Test"
        );
        assert_eq!(
            single_attribute(&user.inner, SURNAME, "surname").unwrap(),
            "Person"
        );
    }

    #[test]
    fn common_name_of_both_certificates() {
        assert_eq!(common_name(&user_certificate().inner), Some("Test Person"));
        assert_eq!(common_name(&rp_certificate().inner), Some("FP Testcert 4"));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let rp = rp_certificate();
        let err = single_attribute(&rp.inner, GIVEN_NAME, "givenName").unwrap_err();
        assert!(matches!(err, Error::Missing { name: "givenName", .. }));
        assert_eq!(
            err.to_string(),
            "'FP Testcert 4' has no subject 'givenName'"
        );
    }
}
