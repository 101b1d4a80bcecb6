//! Completion data for a finished order.

use crate::definitions::{
    helpers::base64,
    x509::{
        subject::{single_attribute, COMMON_NAME, GIVEN_NAME, SERIAL_NUMBER, SURNAME},
        CertificateWithDer,
    },
    Cert, CompletionData, Device, User,
};

pub use crate::definitions::x509::Error;

/// Base64 of a fixed (and truncated) OCSP response. Every order gets the same bytes.
pub const CANNED_OCSP_RESPONSE: &str = concat!(
    "MIIHfgoBAKCCB3cwggdzBgkrBgEFBQcwAQEEggdkMIIHYDCCAQyhgYgwgYUxCzAJ",
    "BgNVBAYTAlNFMR0wGwYDVQQKDBRUZXN0YmFuayBBIEFCIChwdWJsKTETMBEGA1UE",
    "BRMKMTExMTExMTExMTFCMEAGA1UEAww5VGVzdGJhbmsgQSBDdXN0b21lciBDQTEg",
    "djEgZm9yIEJhbmtJRCBUZXN0IE9DU1AgU2lnbmluZxgPMjAyMjExMjQxMTE0MzBa",
    "MFgwVjBBMAkGBSsOAwIaBQAEFAJT/Ht8WbUxtOt79Mkv/u1yuk4sBBRiwAEr9/Ku",
    "ZYm4PIXnSNEVx8xUcwIITpK9GfGfoUGAABgPMjAyMjExMjQxMTE0MzBaoTQwMjAw",
    "BgkrBgEFBQcwAQIBAf8EIPKI0LeJH2t0aTiXJTH6D8Pk7IwfPdD/wcYkWVXxCrP1",
    "MA0GCSqGSIb3DQEBCwUAA4IBAQBwUOXmP3gvkRYJmGOIUkfFAMJZeRbCCHA+BoWB",
);

/// Builds the completion data from the configured end-user certificate.
///
/// The user fields come from the certificate subject: `serialNumber` is the personal
/// number, `CN` the full name, `GN` and `SN` the given name and surname. Each must occur
/// exactly once. `xml_signature` is base64 encoded here; `ocsp_response` is already base64.
pub fn assemble(
    user_certificate: &CertificateWithDer,
    ip_address: &str,
    xml_signature: &str,
    ocsp_response: &str,
) -> Result<CompletionData, Error> {
    let cert = &user_certificate.inner;
    let user = User {
        personal_number: single_attribute(cert, SERIAL_NUMBER, "serialNumber")?.to_string(),
        name: single_attribute(cert, COMMON_NAME, "commonName")?.to_string(),
        given_name: single_attribute(cert, GIVEN_NAME, "givenName")?.to_string(),
        surname: single_attribute(cert, SURNAME, "surname")?.to_string(),
    };

    Ok(CompletionData {
        user,
        device: Device {
            ip_address: ip_address.to_string(),
        },
        cert: Cert {
            not_before: user_certificate.not_before_millis().to_string(),
            not_after: user_certificate.not_after_millis().to_string(),
        },
        signature: base64::encode(xml_signature),
        ocsp_response: ocsp_response.to_string(),
    })
}
