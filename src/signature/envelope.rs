//! The XMLDSIG `Signature` document returned, base64 encoded, as the completion signature.
//!
//! The document has the shape of a real enveloping signature over the signed data and the
//! `KeyInfo` element, but nothing is actually signed: the digest values and the signature
//! value are random bytes. Relying parties that verify the signature will reject it.

use crate::definitions::{helpers::base64, x509::X5Chain};

use super::{random::RandomSource, signed_data::SIGNED_DATA_ID};

pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;
pub const KEY_INFO_ID: &str = "bidKeyInfo";

const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const SIGNED_DATA_TYPE: &str = "http://www.bankid.com/signature/v1.0.0/types";

const DIGEST_LEN: usize = 32;
const SIGNATURE_LEN: usize = 256;

/// `KeyInfo` listing the end-user certificate followed by its issuers, in chain order.
pub fn key_info_element(chain: &X5Chain) -> String {
    let certificates: String = chain
        .iter()
        .map(|c| format!("<X509Certificate>{}</X509Certificate>", c.to_base64()))
        .collect();
    format!(
        "<KeyInfo xmlns=\"{XMLDSIG_NAMESPACE}\" Id=\"{KEY_INFO_ID}\"><X509Data>{certificates}</X509Data></KeyInfo>"
    )
}

fn reference_element(type_attribute: Option<&str>, uri: &str, random: &dyn RandomSource) -> String {
    let type_attribute = type_attribute
        .map(|t| format!(" Type=\"{t}\""))
        .unwrap_or_default();
    format!(
        "<Reference{type_attribute} URI=\"#{uri}\"><Transforms><Transform Algorithm=\"{C14N}\"></Transform></Transforms><DigestMethod Algorithm=\"{SHA256}\"></DigestMethod><DigestValue>{}</DigestValue></Reference>",
        base64::encode(random.bytes(DIGEST_LEN)),
    )
}

/// `SignedInfo` referencing the signed data and the key info, with placeholder digests.
pub fn signed_info_element(random: &dyn RandomSource) -> String {
    format!(
        "<SignedInfo xmlns=\"{XMLDSIG_NAMESPACE}\"><CanonicalizationMethod Algorithm=\"{C14N}\"></CanonicalizationMethod><SignatureMethod Algorithm=\"{RSA_SHA256}\"></SignatureMethod>{}{}</SignedInfo>",
        reference_element(Some(SIGNED_DATA_TYPE), SIGNED_DATA_ID, random),
        reference_element(None, KEY_INFO_ID, random),
    )
}

/// The complete signature document enveloping `signed_data`.
///
/// The digests and the signature value are random placeholders, see the module docs.
pub fn signature_element(signed_data: &str, chain: &X5Chain, random: &dyn RandomSource) -> String {
    format!(
        "{XML_DECLARATION}<Signature xmlns=\"{XMLDSIG_NAMESPACE}\">{}<SignatureValue>{}</SignatureValue>{}<Object>{signed_data}</Object></Signature>",
        signed_info_element(random),
        base64::encode(random.bytes(SIGNATURE_LEN)),
        key_info_element(chain),
    )
}
