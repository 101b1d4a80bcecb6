use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to parse certificate from PEM encoding: {0}")]
    PemError(String),
    #[error("unable to parse certificate from DER encoding: {0}")]
    DecodingError(#[from] der::Error),
    #[error("unable to read certificate file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),
    #[error("at least one certificate must be given to the builder")]
    EmptyChain,
    #[error("'{certificate_common_name}' has no subject '{name}'")]
    Missing {
        certificate_common_name: String,
        name: &'static str,
    },
    #[error("'{certificate_common_name}' has multiple subject '{name}'s")]
    Multiple {
        certificate_common_name: String,
        name: &'static str,
    },
    #[error("'{certificate_common_name}' has a subject '{name}' that is not a string")]
    NotAString {
        certificate_common_name: String,
        name: &'static str,
    },
}
