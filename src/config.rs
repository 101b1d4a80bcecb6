//! Simulator configuration, read from a JSON file at startup.
//!
//! Every field has a default, so an empty object (or no file at all) gives a simulator
//! listening on `127.0.0.1:3000` with the bundled test user.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::{
    definitions::{
        x509::{self, CertificateWithDer, X5Chain},
        ClientSelection,
    },
    order::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL},
    scenario::{Profile, ScenarioKind},
};

pub const DEFAULT_CLIENT_CERT_HEADER: &str = "x-ssl-client-cert";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no user profile named '{0}'")]
    UnknownProfile(String),
    #[error("orders.{0} must be greater than zero")]
    ZeroOrderLimit(&'static str),
    #[error("invalid client certificate header name '{0}'")]
    InvalidHeaderName(String),
    #[error("unable to load certificates for profile '{profile}': {source}")]
    Certificate {
        profile: String,
        #[source]
        source: x509::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen: String,
    pub logging: LoggingConfig,
    /// Request header in which the TLS-terminating proxy forwards the client certificate.
    pub client_cert_header: String,
    pub orders: OrdersConfig,
    pub scenario: ScenarioKind,
    pub bank_id: BankIdConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset. Set to `debug` to log request and
    /// response bodies.
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrdersConfig {
    pub ttl_seconds: u64,
    /// Per bucket.
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BankIdConfig {
    /// Issuer certificates included in every signature after the end-user certificate.
    pub cert_chain: Vec<PathBuf>,
    pub default_profile: String,
    pub profiles: BTreeMap<String, UserProfileConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileConfig {
    /// PEM file holding the end-user certificate.
    pub cert: PathBuf,
    pub ip_address: String,
    #[serde(default)]
    pub client: ClientSelection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            logging: LoggingConfig::default(),
            client_cert_header: DEFAULT_CLIENT_CERT_HEADER.to_string(),
            orders: OrdersConfig::default(),
            scenario: ScenarioKind::default(),
            bank_id: BankIdConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL.as_secs(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for BankIdConfig {
    fn default() -> Self {
        Self {
            cert_chain: vec![
                PathBuf::from("data/bankid/customer-ca.pem"),
                PathBuf::from("data/bankid/intermediate-ca.pem"),
            ],
            default_profile: DEFAULT_PROFILE.to_string(),
            profiles: BTreeMap::from([(
                DEFAULT_PROFILE.to_string(),
                UserProfileConfig {
                    cert: PathBuf::from("data/bankid/user-200211242383.crt"),
                    ip_address: "192.168.0.1".to_string(),
                    client: ClientSelection::default(),
                },
            )]),
        }
    }
}

impl OrdersConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// A zero TTL would expire every order the moment it is stored.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ttl_seconds == 0 {
            return Err(Error::ZeroOrderLimit("ttlSeconds"));
        }
        if self.max_entries == 0 {
            return Err(Error::ZeroOrderLimit("maxEntries"));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.orders.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn client_cert_header_name(&self) -> Result<HeaderName, Error> {
        HeaderName::from_bytes(self.client_cert_header.to_ascii_lowercase().as_bytes())
            .map_err(|_| Error::InvalidHeaderName(self.client_cert_header.clone()))
    }

    /// Load the certificates of the default profile.
    ///
    /// Relative paths are resolved against `base_dir`.
    pub fn resolve_profile(&self, base_dir: &Path) -> Result<Profile, Error> {
        let name = &self.bank_id.default_profile;
        let profile = self
            .bank_id
            .profiles
            .get(name)
            .ok_or_else(|| Error::UnknownProfile(name.clone()))?;

        let certificate_error = |source| Error::Certificate {
            profile: name.clone(),
            source,
        };

        let user_certificate = CertificateWithDer::from_pem_file(base_dir.join(&profile.cert))
            .map_err(certificate_error)?;
        let mut builder = X5Chain::builder().with_certificate_and_der(user_certificate);
        for ca in &self.bank_id.cert_chain {
            let certificates =
                CertificateWithDer::chain_from_pem_file(base_dir.join(ca)).map_err(certificate_error)?;
            builder = builder.with_certificates(certificates);
        }

        Ok(Profile {
            chain: builder.build().map_err(certificate_error)?,
            ip_address: profile.ip_address.clone(),
            client: profile.client.resolve(),
        })
    }
}
