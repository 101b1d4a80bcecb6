use std::sync::Arc;

use crate::{
    definitions::{
        x509::CertificateWithDer, AuthSignRequest, AuthSignResponse, CollectResponse, HintCode,
    },
    order::{Bucket, OrderStore},
    signature::{random::RandomSource, FuncId},
};

use super::{auth_sign_response, complete_response, Error, Profile, Scenario};

/// Every order is picked up by the configured end user and completes on the third collect.
///
/// With [DefaultScenario::with_pending_repeats] each pending state is returned several
/// times before the order completes.
pub struct DefaultScenario {
    profile: Profile,
    random: Arc<dyn RandomSource>,
    pending_repeats: usize,
}

impl DefaultScenario {
    pub fn new(profile: Profile, random: Arc<dyn RandomSource>) -> Self {
        Self {
            profile,
            random,
            pending_repeats: 1,
        }
    }

    pub fn with_pending_repeats(mut self, repeats: usize) -> Self {
        self.pending_repeats = repeats.max(1);
        self
    }

    fn start(
        &self,
        bucket: Bucket,
        func_id: FuncId,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        let order_ref = store.create();
        let random = self.random.as_ref();

        let mut outcomes = Vec::with_capacity(2 * self.pending_repeats + 1);
        for hint_code in [HintCode::OutstandingTransaction, HintCode::UserSign] {
            outcomes.extend(
                std::iter::repeat_with(|| CollectResponse::pending(order_ref.clone(), hint_code))
                    .take(self.pending_repeats),
            );
        }
        outcomes.push(complete_response(
            &order_ref,
            req,
            rp_certificate,
            func_id,
            &self.profile,
            random,
        )?);

        tracing::debug!(
            "Storing {} collect responses for {bucket} order {order_ref}.",
            outcomes.len()
        );
        store.enqueue(bucket, order_ref.clone(), outcomes);

        Ok(auth_sign_response(order_ref, random))
    }
}

impl Scenario for DefaultScenario {
    fn auth(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        self.start(Bucket::Auth, FuncId::Identification, store, rp_certificate, req)
    }

    fn sign(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        self.start(Bucket::Sign, FuncId::Signing, store, rp_certificate, req)
    }
}
