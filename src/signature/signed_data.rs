use std::{borrow::Cow, sync::OnceLock};

use quick_xml::escape::{escape, partial_escape};
use regex::Regex;
use strum_macros::{AsRefStr, Display};

use crate::definitions::{
    helpers::base64,
    x509::{subject::subject_lines, CertificateWithDer},
    AuthSignRequest, ClientProfile, Requirement,
};

use super::random::RandomSource;

pub const SIGNED_DATA_NAMESPACE: &str = "http://www.bankid.com/signature/v1.0.0/types";
pub const SIGNED_DATA_ID: &str = "bidSignedData";

const NONCE_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum SignedDataError {
    #[error("relying party certificate subject '{subject}' has no 'name' attribute")]
    MissingDisplayName { subject: String },
    #[error("invalid display name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which call created the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
pub enum FuncId {
    Identification,
    Signing,
}

fn display_name_pattern() -> Result<&'static Regex, SignedDataError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(",name=([^,]+),"))
        .as_ref()
        .map_err(|e| SignedDataError::Pattern(e.clone()))
}

/// Element content. Quotes are left alone, only `<`, `>` and `&` are escaped.
fn text(value: &str) -> Cow<'_, str> {
    partial_escape(value)
}

fn attribute(value: &str) -> Cow<'_, str> {
    escape(value)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// `usrVisibleData`, or nothing when the request carries no visible data.
pub fn usr_visible_data_element(req: &AuthSignRequest) -> String {
    let Some(data) = req.user_visible_data.as_deref().filter(|d| !d.is_empty()) else {
        return String::new();
    };
    let format = match req.user_visible_data_format.as_deref() {
        Some(format) if !format.is_empty() => format!("format=\"{}\" ", attribute(format)),
        _ => String::new(),
    };
    format!(
        "<usrVisibleData charset=\"UTF-8\" {format}visible=\"wysiwys\">{}</usrVisibleData>",
        text(data)
    )
}

/// `usrNonVisibleData`, or nothing when the request carries no such data.
pub fn usr_non_visible_data_element(req: &AuthSignRequest) -> String {
    match req.user_non_visible_data.as_deref() {
        Some(data) if !data.is_empty() => {
            format!("<usrNonVisibleData>{}</usrNonVisibleData>", text(data))
        }
        _ => String::new(),
    }
}

/// The relying party subject in the form carried by `srvInfo/name`.
///
/// Attributes are listed most specific first, e.g.
/// `cn=FP Testcert 4,name=Test av BankID,serialNumber=5566304928,o=Testbank A AB (publ),c=SE`.
pub fn srv_info_name(rp_certificate: &CertificateWithDer) -> String {
    let mut lines = subject_lines(&rp_certificate.inner);
    lines.reverse();
    let joined = lines.join(",");
    let joined = match joined.strip_prefix("CN=") {
        Some(rest) => format!("cn={rest}"),
        None => joined,
    };
    joined.replacen(",O=", ",o=", 1).replacen(",C=", ",c=", 1)
}

/// The display name of the relying party, taken from the `name` attribute of its subject.
pub fn srv_info_display_name(name: &str) -> Result<&str, SignedDataError> {
    display_name_pattern()?
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| SignedDataError::MissingDisplayName {
            subject: name.to_string(),
        })
}

pub fn srv_info_element(
    rp_certificate: &CertificateWithDer,
    random: &dyn RandomSource,
) -> Result<String, SignedDataError> {
    let name = srv_info_name(rp_certificate);
    let display_name = srv_info_display_name(&name)?;
    let nonce = random.bytes(NONCE_LEN);
    Ok(format!(
        "<srvInfo><name>{}</name><nonce>{}</nonce><displayName>{}</displayName></srvInfo>",
        base64::encode(&name),
        base64::encode(nonce),
        base64::encode(display_name),
    ))
}

/// The conditions the relying party put on the order.
///
/// Conditions appear in a fixed order and only when set; an empty policy list counts as unset.
pub fn requirement_element(requirement: Option<&Requirement>) -> String {
    let mut conditions = String::new();
    let mut push = |kind: &str, value: &str| {
        conditions.push_str(&format!(
            "<condition><type>{kind}</type><value>{value}</value></condition>"
        ));
    };

    if let Some(requirement) = requirement {
        if let Some(allow) = requirement.allow_fingerprint {
            push("AllowFingerprint", yes_no(allow));
        }
        if let Some(policies) = requirement
            .certificate_policies
            .as_ref()
            .filter(|p| !p.is_empty())
        {
            push("CertificatePolicies", &text(&policies.join(",")));
        }
        if let Some(issuer_cn) = requirement.issuer_cn.as_deref() {
            push("IssuerCn", &text(issuer_cn));
        }
        if let Some(required) = requirement.token_start_required {
            push("TokenStartRequired", yes_no(required));
        }
    }

    format!("<requirement>{conditions}</requirement>")
}

pub fn env_element(client: &ClientProfile, requirement: Option<&Requirement>) -> String {
    format!(
        "<env><ai><type>{}</type><deviceInfo>{}</deviceInfo><uhi>{}</uhi><fsib>0</fsib><utb>cs1</utb>{}<uauth>pw</uauth></ai></env>",
        base64::encode(&client.client_type),
        base64::encode(&client.version),
        base64::encode(&client.uhi),
        requirement_element(requirement),
    )
}

pub fn client_info_element(
    client: &ClientProfile,
    requirement: Option<&Requirement>,
    func_id: FuncId,
) -> String {
    format!(
        "<clientInfo><funcId>{func_id}</funcId><version>{}</version>{}</clientInfo>",
        base64::encode(&client.os_version),
        env_element(client, requirement),
    )
}

/// The complete `bankIdSignedData` fragment, without any whitespace between elements.
pub fn bankid_signed_data_element(
    req: &AuthSignRequest,
    rp_certificate: &CertificateWithDer,
    func_id: FuncId,
    client: &ClientProfile,
    random: &dyn RandomSource,
) -> Result<String, SignedDataError> {
    Ok(format!(
        "<bankIdSignedData xmlns=\"{SIGNED_DATA_NAMESPACE}\" Id=\"{SIGNED_DATA_ID}\">{}{}{}{}</bankIdSignedData>",
        usr_visible_data_element(req),
        usr_non_visible_data_element(req),
        srv_info_element(rp_certificate, random)?,
        client_info_element(client, req.requirement.as_ref(), func_id),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        definitions::{
            x509::test::{rp_certificate, RP_CERT_WITHOUT_NAME},
            BuiltinClient,
        },
        signature::random::SeededRandom,
    };

    const RP_NAME: &str =
        "cn=FP Testcert 4,name=Test av BankID,serialNumber=5566304928,o=Testbank A AB (publ),c=SE";

    fn request() -> AuthSignRequest {
        AuthSignRequest {
            end_user_ip: "192.168.0.1".into(),
            ..Default::default()
        }
    }

    fn fingerprint_and_policy() -> Requirement {
        Requirement {
            allow_fingerprint: Some(true),
            certificate_policies: Some(vec!["1.2.3.4.5".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn visible_data() {
        assert_eq!(usr_visible_data_element(&request()), "");

        let mut req = request();
        req.user_visible_data = Some("data".into());
        assert_eq!(
            usr_visible_data_element(&req),
            r#"<usrVisibleData charset="UTF-8" visible="wysiwys">data</usrVisibleData>"#
        );

        req.user_visible_data_format = Some("format".into());
        assert_eq!(
            usr_visible_data_element(&req),
            r#"<usrVisibleData charset="UTF-8" format="format" visible="wysiwys">data</usrVisibleData>"#
        );
    }

    #[test]
    fn empty_visible_data_is_omitted() {
        let mut req = request();
        req.user_visible_data = Some(String::new());
        req.user_visible_data_format = Some("format".into());
        assert_eq!(usr_visible_data_element(&req), "");
    }

    #[test]
    fn non_visible_data() {
        assert_eq!(usr_non_visible_data_element(&request()), "");

        let mut req = request();
        req.user_non_visible_data = Some("data".into());
        assert_eq!(
            usr_non_visible_data_element(&req),
            "<usrNonVisibleData>data</usrNonVisibleData>"
        );
    }

    #[test]
    fn markup_in_user_data_is_escaped() {
        let mut req = request();
        req.user_non_visible_data = Some("<a>&</a>".into());
        assert_eq!(
            usr_non_visible_data_element(&req),
            "<usrNonVisibleData>&lt;a&gt;&amp;&lt;/a&gt;</usrNonVisibleData>"
        );
    }

    #[test]
    fn quotes_in_user_data_are_kept() {
        let mut req = request();
        req.user_visible_data = Some("it's \"ok\"".into());
        req.user_non_visible_data = Some("it's \"ok\"".into());
        assert_eq!(
            usr_visible_data_element(&req),
            r#"<usrVisibleData charset="UTF-8" visible="wysiwys">it's "ok"</usrVisibleData>"#
        );
        assert_eq!(
            usr_non_visible_data_element(&req),
            r#"<usrNonVisibleData>it's "ok"</usrNonVisibleData>"#
        );

        let requirement = Requirement {
            issuer_cn: Some("Bank \"A\"".into()),
            ..Default::default()
        };
        assert_eq!(
            requirement_element(Some(&requirement)),
            r#"<requirement><condition><type>IssuerCn</type><value>Bank "A"</value></condition></requirement>"#
        );
    }

    #[test]
    fn quotes_in_format_attribute_are_escaped() {
        let mut req = request();
        req.user_visible_data = Some("data".into());
        req.user_visible_data_format = Some("a\"b".into());
        assert_eq!(
            usr_visible_data_element(&req),
            r#"<usrVisibleData charset="UTF-8" format="a&quot;b" visible="wysiwys">data</usrVisibleData>"#
        );
    }

    #[test]
    fn srv_info() {
        let rp = rp_certificate();
        assert_eq!(srv_info_name(&rp), RP_NAME);
        assert_eq!(srv_info_display_name(RP_NAME).unwrap(), "Test av BankID");

        let element = srv_info_element(&rp, &SeededRandom::new(3)).unwrap();
        let nonce = base64::encode(SeededRandom::new(3).bytes(20));
        assert_eq!(
            element,
            format!(
                "<srvInfo><name>{}</name><nonce>{nonce}</nonce><displayName>{}</displayName></srvInfo>",
                base64::encode(RP_NAME),
                base64::encode("Test av BankID"),
            )
        );
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let rp = rp_certificate();
        let random = SeededRandom::new(3);
        let first = srv_info_element(&rp, &random).unwrap();
        let second = srv_info_element(&rp, &random).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn srv_info_without_name_attribute() {
        let rp = CertificateWithDer::from_pem(RP_CERT_WITHOUT_NAME).unwrap();
        let err = srv_info_element(&rp, &SeededRandom::new(0)).unwrap_err();
        assert!(matches!(err, SignedDataError::MissingDisplayName { .. }));
    }

    #[test]
    fn requirement_conditions() {
        assert_eq!(requirement_element(None), "<requirement></requirement>");
        assert_eq!(
            requirement_element(Some(&Requirement::default())),
            "<requirement></requirement>"
        );

        let cases = [
            (
                Requirement {
                    allow_fingerprint: Some(false),
                    ..Default::default()
                },
                "<requirement><condition><type>AllowFingerprint</type><value>no</value></condition></requirement>",
            ),
            (
                Requirement {
                    allow_fingerprint: Some(true),
                    ..Default::default()
                },
                "<requirement><condition><type>AllowFingerprint</type><value>yes</value></condition></requirement>",
            ),
            (
                Requirement {
                    certificate_policies: Some(vec![]),
                    ..Default::default()
                },
                "<requirement></requirement>",
            ),
            (
                Requirement {
                    certificate_policies: Some(vec!["1.2.3.4.5".into(), "6.7.8.9.0".into()]),
                    ..Default::default()
                },
                "<requirement><condition><type>CertificatePolicies</type><value>1.2.3.4.5,6.7.8.9.0</value></condition></requirement>",
            ),
            (
                Requirement {
                    issuer_cn: Some("issuer".into()),
                    ..Default::default()
                },
                "<requirement><condition><type>IssuerCn</type><value>issuer</value></condition></requirement>",
            ),
            (
                Requirement {
                    token_start_required: Some(false),
                    ..Default::default()
                },
                "<requirement><condition><type>TokenStartRequired</type><value>no</value></condition></requirement>",
            ),
            (
                fingerprint_and_policy(),
                "<requirement><condition><type>AllowFingerprint</type><value>yes</value></condition><condition><type>CertificatePolicies</type><value>1.2.3.4.5</value></condition></requirement>",
            ),
        ];
        for (requirement, expected) in cases {
            assert_eq!(requirement_element(Some(&requirement)), expected);
        }
    }

    #[test]
    fn unset_requirement_fields_are_not_rendered() {
        let requirement = Requirement {
            card_reader: Some("class1".into()),
            auto_start_token_required: Some(true),
            ..Default::default()
        };
        assert_eq!(
            requirement_element(Some(&requirement)),
            "<requirement></requirement>"
        );
    }

    #[test]
    fn client_info_for_mobile_auth() {
        let client = BuiltinClient::Ios14_6.profile();
        assert_eq!(
            client_info_element(&client, None, FuncId::Identification),
            format!(
                "<clientInfo><funcId>Identification</funcId><version>{}</version><env><ai><type>{}</type><deviceInfo>{}</deviceInfo><uhi>{}</uhi><fsib>0</fsib><utb>cs1</utb><requirement></requirement><uauth>pw</uauth></ai></env></clientInfo>",
                base64::encode("7.28.0"),
                base64::encode("IOS"),
                base64::encode("14.6"),
                base64::encode("GI75maOnOYyg0bCbup2JK59oZH6p"),
            )
        );
    }

    #[test]
    fn env_for_desktop_sign() {
        let client = BuiltinClient::OsX12_5.profile();
        assert_eq!(
            env_element(&client, Some(&fingerprint_and_policy())),
            format!(
                "<env><ai><type>{}</type><deviceInfo>{}</deviceInfo><uhi>{}</uhi><fsib>0</fsib><utb>cs1</utb><requirement><condition><type>AllowFingerprint</type><value>yes</value></condition><condition><type>CertificatePolicies</type><value>1.2.3.4.5</value></condition></requirement><uauth>pw</uauth></ai></env>",
                base64::encode("OS_X"),
                base64::encode("12.5"),
                base64::encode("7ApoZbybFpDz6BGzUo+0A9qXCsxx"),
            )
        );
    }

    #[test]
    fn complete_desktop_sign() {
        let client = BuiltinClient::OsX12_5.profile();
        let rp = rp_certificate();
        let mut req = request();
        req.user_visible_data = Some("vis-data".into());
        req.user_visible_data_format = Some("format".into());
        req.user_non_visible_data = Some("non-vis-data".into());
        req.requirement = Some(fingerprint_and_policy());

        let signed_data =
            bankid_signed_data_element(&req, &rp, FuncId::Signing, &client, &SeededRandom::new(9))
                .unwrap();

        let expected = format!(
            "<bankIdSignedData xmlns=\"http://www.bankid.com/signature/v1.0.0/types\" Id=\"bidSignedData\">\
             <usrVisibleData charset=\"UTF-8\" format=\"format\" visible=\"wysiwys\">vis-data</usrVisibleData>\
             <usrNonVisibleData>non-vis-data</usrNonVisibleData>{}{}</bankIdSignedData>",
            srv_info_element(&rp, &SeededRandom::new(9)).unwrap(),
            client_info_element(&client, req.requirement.as_ref(), FuncId::Signing),
        );
        assert_eq!(signed_data, expected);
    }

    #[test]
    fn complete_mobile_auth() {
        let client = BuiltinClient::Ios14_6.profile();
        let rp = rp_certificate();
        let mut req = request();
        req.requirement = Some(Requirement::default());

        let signed_data = bankid_signed_data_element(
            &req,
            &rp,
            FuncId::Identification,
            &client,
            &SeededRandom::new(1),
        )
        .unwrap();
        assert!(signed_data.starts_with(
            "<bankIdSignedData xmlns=\"http://www.bankid.com/signature/v1.0.0/types\" Id=\"bidSignedData\"><srvInfo>"
        ));
        assert!(signed_data.contains("<funcId>Identification</funcId>"));
        assert!(signed_data.ends_with(
            "<requirement></requirement><uauth>pw</uauth></ai></env></clientInfo></bankIdSignedData>"
        ));
        assert!(!signed_data.contains("> <"));
    }
}
