use crate::definitions::{
    x509::{CertificateWithDer, X5Chain},
    ClientProfile,
};

/// The simulated end user: who completes every order, from which device and address.
#[derive(Debug, Clone)]
pub struct Profile {
    /// End-user certificate first, then its issuers.
    pub chain: X5Chain,
    pub ip_address: String,
    pub client: ClientProfile,
}

impl Profile {
    pub fn user_certificate(&self) -> &CertificateWithDer {
        self.chain.end_entity_certificate()
    }
}
