use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

/// Describes the end-user's app as it appears inside the signed data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    #[serde(rename = "type")]
    pub client_type: String,
    pub version: String,
    pub uhi: String,
    pub os_version: String,
}

/// Client profiles that can be selected by name in the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
pub enum BuiltinClient {
    #[serde(rename = "IOS_14_6")]
    #[strum(serialize = "IOS_14_6")]
    Ios14_6,
    #[serde(rename = "OS_X_12_5")]
    #[strum(serialize = "OS_X_12_5")]
    OsX12_5,
}

impl BuiltinClient {
    pub fn profile(self) -> ClientProfile {
        match self {
            BuiltinClient::Ios14_6 => ClientProfile {
                client_type: "IOS".to_string(),
                version: "14.6".to_string(),
                uhi: "GI75maOnOYyg0bCbup2JK59oZH6p".to_string(),
                os_version: "7.28.0".to_string(),
            },
            BuiltinClient::OsX12_5 => ClientProfile {
                client_type: "OS_X".to_string(),
                version: "12.5".to_string(),
                uhi: "7ApoZbybFpDz6BGzUo+0A9qXCsxx".to_string(),
                os_version: concat!(
                    "Personal=7.13.0.4&BankID_exe=7.13.0.4&BISP=7.13.0.4&platform=macosx",
                    "&os_version=12.5&display_version=&uhi=7ApoZbybFpDz6BGzUo+0A9qXCsxx",
                    "&legacyuhi=7ApoZbybFpDz6BGzUo+0A9qXCsxx&best_before=1667066973&"
                )
                .to_string(),
            },
        }
    }
}

impl From<BuiltinClient> for ClientProfile {
    fn from(client: BuiltinClient) -> Self {
        client.profile()
    }
}

/// A client as written in the configuration file: either the name of a built-in profile
/// or a complete profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientSelection {
    Builtin(BuiltinClient),
    Custom(ClientProfile),
}

impl Default for ClientSelection {
    fn default() -> Self {
        Self::Builtin(BuiltinClient::Ios14_6)
    }
}

impl ClientSelection {
    pub fn resolve(&self) -> ClientProfile {
        match self {
            Self::Builtin(client) => client.profile(),
            Self::Custom(profile) => profile.clone(),
        }
    }
}
