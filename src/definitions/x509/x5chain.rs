use std::{fs, path::Path};

use der::{Decode, Encode};
use x509_cert::certificate::Certificate;

use crate::definitions::helpers::base64;

use super::{subject, Error};

/// A parsed certificate together with the exact DER it was parsed from, which is what
/// ends up in `X509Certificate` elements.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CertificateWithDer {
    pub inner: Certificate,
    der: Vec<u8>,
}

impl CertificateWithDer {
    pub fn from_pem(bytes: &[u8]) -> Result<Self, Error> {
        let (_label, der) =
            pem_rfc7468::decode_vec(bytes).map_err(|e| Error::PemError(e.to_string()))?;
        CertificateWithDer::from_der(&der)
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, Error> {
        let inner = Certificate::from_der(bytes)?;
        Ok(Self {
            inner,
            der: bytes.to_vec(),
        })
    }

    pub fn from_cert(certificate: Certificate) -> Result<Self, Error> {
        let der = certificate.to_der()?;
        Ok(Self {
            inner: certificate,
            der,
        })
    }

    /// Load a single PEM certificate from a file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&bytes)
    }

    /// Load every PEM certificate in a file, in file order.
    pub fn chain_from_pem_file(path: impl AsRef<Path>) -> Result<Vec<Self>, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let certs = Certificate::load_pem_chain(&bytes)?
            .into_iter()
            .map(Self::from_cert)
            .collect::<Result<Vec<_>, _>>()?;
        if certs.is_empty() {
            return Err(Error::NoCertificates(path.to_path_buf()));
        }
        Ok(certs)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The DER encoding as standard base64, as carried in `X509Certificate` elements.
    pub fn to_base64(&self) -> String {
        base64::encode(&self.der)
    }

    pub fn common_name(&self) -> &str {
        subject::common_name(&self.inner).unwrap_or("")
    }

    /// Start of the validity period in milliseconds since the Unix epoch.
    pub fn not_before_millis(&self) -> u128 {
        self.inner
            .tbs_certificate
            .validity
            .not_before
            .to_unix_duration()
            .as_millis()
    }

    /// End of the validity period in milliseconds since the Unix epoch.
    pub fn not_after_millis(&self) -> u128 {
        self.inner
            .tbs_certificate
            .validity
            .not_after
            .to_unix_duration()
            .as_millis()
    }
}

/// The certificates listed in a signature's `KeyInfo`: the end-entity certificate first,
/// followed by the issuing certificate authorities.
#[derive(Debug, Clone)]
pub struct X5Chain {
    end_entity: CertificateWithDer,
    issuers: Vec<CertificateWithDer>,
}

impl X5Chain {
    pub fn new(end_entity: CertificateWithDer, issuers: Vec<CertificateWithDer>) -> Self {
        Self {
            end_entity,
            issuers,
        }
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn end_entity_certificate(&self) -> &CertificateWithDer {
        &self.end_entity
    }

    pub fn issuers(&self) -> &[CertificateWithDer] {
        &self.issuers
    }

    /// End entity first, then the issuers in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &CertificateWithDer> {
        std::iter::once(&self.end_entity).chain(self.issuers.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.issuers.len()
    }

    /// A chain always holds its end-entity certificate.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Default, Debug, Clone)]
pub struct Builder {
    certs: Vec<CertificateWithDer>,
}

impl Builder {
    pub fn with_certificate_and_der(mut self, x509: CertificateWithDer) -> Builder {
        self.certs.push(x509);
        self
    }

    pub fn with_certificates<I>(mut self, x509s: I) -> Builder
    where
        I: IntoIterator<Item = CertificateWithDer>,
    {
        self.certs.extend(x509s);
        self
    }

    pub fn with_pem_certificate(self, data: &[u8]) -> Result<Builder, Error> {
        Ok(self.with_certificate_and_der(CertificateWithDer::from_pem(data)?))
    }

    pub fn with_der_certificate(self, data: &[u8]) -> Result<Builder, Error> {
        Ok(self.with_certificate_and_der(CertificateWithDer::from_der(data)?))
    }

    /// The first certificate added becomes the end entity.
    pub fn build(self) -> Result<X5Chain, Error> {
        let mut certs = self.certs.into_iter();
        let end_entity = certs.next().ok_or(Error::EmptyChain)?;
        Ok(X5Chain::new(end_entity, certs.collect()))
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::definitions::x509::test::{CA_CERTS, RP_CERT, USER_CERT};

    #[test]
    fn validity_in_epoch_millis() {
        let user = CertificateWithDer::from_pem(USER_CERT).unwrap();
        assert_eq!(user.not_before_millis().to_string(), "1669244400000");
        assert_eq!(user.not_after_millis().to_string(), "1700866799000");
    }

    #[test]
    fn pem_and_der_agree() {
        let from_pem = CertificateWithDer::from_pem(RP_CERT).unwrap();
        let from_der = CertificateWithDer::from_der(from_pem.der()).unwrap();
        assert_eq!(from_pem, from_der);
        assert_eq!(from_pem.common_name(), "FP Testcert 4");
    }

    #[test]
    fn chain_keeps_end_entity_first() {
        let cas = Certificate::load_pem_chain(CA_CERTS)
            .unwrap()
            .into_iter()
            .map(|c| CertificateWithDer::from_cert(c).unwrap());
        let chain = X5Chain::builder()
            .with_pem_certificate(USER_CERT)
            .unwrap()
            .with_certificates(cas)
            .build()
            .unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.end_entity_certificate().common_name(), "Test Person");
        let names: Vec<&str> = chain.iter().map(|c| c.common_name()).collect();
        assert_eq!(
            names,
            vec![
                "Test Person",
                "Testbank A Customer CA1 v1 for BankID Test",
                "Testbank A Intermediate CA v1 for BankID Test",
            ]
        );
    }

    #[test]
    fn der_builder_and_issuers() {
        let user = CertificateWithDer::from_pem(USER_CERT).unwrap();
        let chain = X5Chain::builder()
            .with_der_certificate(user.der())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(chain.len(), 1);
        assert!(chain.issuers().is_empty());
        assert_eq!(chain.end_entity_certificate(), &user);
    }

    #[test]
    fn empty_builder_is_rejected() {
        assert!(matches!(X5Chain::builder().build(), Err(Error::EmptyChain)));
    }

    #[test]
    fn garbage_pem_is_rejected() {
        assert!(matches!(
            CertificateWithDer::from_pem(b"not a certificate"),
            Err(Error::PemError(_))
        ));
    }
}
