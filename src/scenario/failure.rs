use std::sync::Arc;

use crate::{
    definitions::{
        x509::CertificateWithDer, AuthSignRequest, AuthSignResponse, CollectResponse, HintCode,
    },
    order::{Bucket, OrderStore},
    signature::random::RandomSource,
};

use super::{auth_sign_response, Error, Scenario};

/// Every order fails with `hint_code` on the first collect.
pub struct ImmediateFailure {
    hint_code: HintCode,
    random: Arc<dyn RandomSource>,
}

impl ImmediateFailure {
    pub fn new(hint_code: HintCode, random: Arc<dyn RandomSource>) -> Self {
        Self { hint_code, random }
    }

    fn start(&self, bucket: Bucket, store: &mut OrderStore) -> AuthSignResponse {
        let order_ref = store.create();
        tracing::debug!(
            "{bucket} order {order_ref} will fail with {}.",
            self.hint_code
        );
        store.enqueue(
            bucket,
            order_ref.clone(),
            [CollectResponse::failed(order_ref.clone(), self.hint_code)],
        );
        auth_sign_response(order_ref, self.random.as_ref())
    }
}

impl Scenario for ImmediateFailure {
    fn auth(
        &self,
        store: &mut OrderStore,
        _rp_certificate: &CertificateWithDer,
        _req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        Ok(self.start(Bucket::Auth, store))
    }

    fn sign(
        &self,
        store: &mut OrderStore,
        _rp_certificate: &CertificateWithDer,
        _req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        Ok(self.start(Bucket::Sign, store))
    }
}
