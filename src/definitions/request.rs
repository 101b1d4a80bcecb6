use serde::{Deserialize, Serialize};

pub type OrderRef = String;
pub type CertificatePolicy = String;

/// Constraints a relying party puts on how the order may be completed.
///
/// Every field is optional; an absent field means the relying party set no constraint,
/// which is different from a field explicitly set to `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_reader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_policies: Option<Vec<CertificatePolicy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_cn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_token_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_fingerprint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_start_required: Option<bool>,
}

/// Body of the `auth` and `sign` calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSignRequest {
    pub end_user_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_non_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
}

/// Body of the `collect` and `cancel` calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectCancelRequest {
    pub order_ref: OrderRef,
}
