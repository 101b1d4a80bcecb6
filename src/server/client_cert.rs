//! The relying party's TLS client certificate.
//!
//! TLS is terminated in front of the simulator. The proxy verifies the client certificate
//! and forwards it in a request header, either as base64 DER or as PEM. Proxies that
//! cannot put line breaks in a header value replace them with spaces or tabs; those are
//! ignored.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::definitions::{
    helpers::base64,
    x509::{subject::subject_lines, CertificateWithDer},
};

use super::{error::ApiError, AppState};

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// The verified certificate of the calling relying party.
#[derive(Debug, Clone)]
pub struct ClientCertificate(pub CertificateWithDer);

/// Parse a certificate as forwarded by the proxy.
pub fn parse_forwarded_certificate(value: &str) -> Option<CertificateWithDer> {
    let value = value.trim();
    let body = value.strip_prefix(PEM_BEGIN).unwrap_or(value);
    let body = body.strip_suffix(PEM_END).unwrap_or(body).trim();
    if body.is_empty() {
        return None;
    }
    let der = base64::decode(body).ok()?;
    CertificateWithDer::from_der(&der).ok()
}

#[async_trait]
impl FromRequestParts<AppState> for ClientCertificate {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(&state.client_cert_header) else {
            return Err(ApiError::Unauthorized);
        };
        let Some(certificate) = value.to_str().ok().and_then(parse_forwarded_certificate) else {
            tracing::debug!(
                "Ignoring unparseable {} header.",
                state.client_cert_header
            );
            return Err(ApiError::Unauthorized);
        };
        tracing::debug!(
            "Relying Party certificate: {:?}.",
            subject_lines(&certificate.inner).join(", ")
        );
        Ok(Self(certificate))
    }
}
