use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::request::OrderRef;

/// Returned from `auth` and `sign`.
///
/// The three tokens are random and only there so that real client libraries can
/// deserialize the response; the simulator never looks at them again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSignResponse {
    pub order_ref: OrderRef,
    pub auto_start_token: String,
    pub qr_start_token: String,
    pub qr_start_secret: String,
}

/// Returned from a successful `cancel`: an empty object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HintCode {
    OutstandingTransaction,
    NoClient,
    Started,
    UserSign,
    ExpiredTransaction,
    CertificateErr,
    UserCancel,
    Cancelled,
    StartFailed,
}

/// One answer to a `collect` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CollectResponse {
    Pending {
        #[serde(rename = "orderRef")]
        order_ref: OrderRef,
        #[serde(rename = "hintCode")]
        hint_code: HintCode,
    },
    Failed {
        #[serde(rename = "orderRef")]
        order_ref: OrderRef,
        #[serde(rename = "hintCode")]
        hint_code: HintCode,
    },
    Complete {
        #[serde(rename = "orderRef")]
        order_ref: OrderRef,
        #[serde(rename = "completionData")]
        completion_data: Box<CompletionData>,
    },
}

impl CollectResponse {
    pub fn pending(order_ref: impl Into<OrderRef>, hint_code: HintCode) -> Self {
        Self::Pending {
            order_ref: order_ref.into(),
            hint_code,
        }
    }

    pub fn failed(order_ref: impl Into<OrderRef>, hint_code: HintCode) -> Self {
        Self::Failed {
            order_ref: order_ref.into(),
            hint_code,
        }
    }

    pub fn complete(order_ref: impl Into<OrderRef>, completion_data: CompletionData) -> Self {
        Self::Complete {
            order_ref: order_ref.into(),
            completion_data: Box::new(completion_data),
        }
    }

    pub fn order_ref(&self) -> &str {
        match self {
            Self::Pending { order_ref, .. }
            | Self::Failed { order_ref, .. }
            | Self::Complete { order_ref, .. } => order_ref,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// End-user information, taken from the end-user certificate subject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub personal_number: String,
    pub name: String,
    pub given_name: String,
    pub surname: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub ip_address: String,
}

/// Validity of the end-user certificate, in milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cert {
    pub not_before: String,
    pub not_after: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub user: User,
    pub device: Device,
    pub cert: Cert,
    /// Base64 encoded XML signature.
    pub signature: String,
    /// Base64 encoded OCSP response.
    pub ocsp_response: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ErrorCode {
    AlreadyInProgress,
    InvalidParameters,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    UnsupportedMediaType,
    InternalError,
    Maintenance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub details: String,
}

impl ErrorResponse {
    pub fn new(error_code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            error_code,
            details: details.into(),
        }
    }
}
