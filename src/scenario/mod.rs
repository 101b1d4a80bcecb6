//! How orders play out.
//!
//! A [Scenario] decides, when an order is created, the full sequence of responses its
//! `collect` calls will see, and stores it in the [OrderStore]. The [Dispatcher] routes
//! every `auth` and `sign` call to the scenario chosen at startup.

mod default;
mod failure;
mod profile;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    completion,
    definitions::{
        x509::CertificateWithDer, AuthSignRequest, AuthSignResponse, CollectResponse, HintCode,
        OrderRef,
    },
    order::OrderStore,
    signature::{self, random::RandomSource, FuncId, SignedDataError},
};

pub use default::DefaultScenario;
pub use failure::ImmediateFailure;
pub use profile::Profile;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to build signed data: {0}")]
    SignedData(#[from] SignedDataError),
    #[error("unable to build completion data: {0}")]
    Completion(#[from] completion::Error),
}

pub trait Scenario: Send + Sync {
    fn auth(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error>;

    fn sign(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error>;
}

/// The scenarios that can be selected in the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// Outstanding transaction, user sign, then complete.
    #[default]
    Default,
    /// Every order fails on the first collect.
    ImmediateFailure {
        #[serde(default = "default_failure_hint", rename = "hintCode")]
        hint_code: HintCode,
    },
    /// Like the default, with each pending state repeated.
    ExtendedPending { repeats: usize },
}

fn default_failure_hint() -> HintCode {
    HintCode::StartFailed
}

impl ScenarioKind {
    pub fn build(&self, profile: Profile, random: Arc<dyn RandomSource>) -> Box<dyn Scenario> {
        match self {
            ScenarioKind::Default => Box::new(DefaultScenario::new(profile, random)),
            ScenarioKind::ImmediateFailure { hint_code } => {
                Box::new(ImmediateFailure::new(*hint_code, random))
            }
            ScenarioKind::ExtendedPending { repeats } => {
                Box::new(DefaultScenario::new(profile, random).with_pending_repeats(*repeats))
            }
        }
    }
}

/// Routes auth and sign calls to the configured scenario.
pub struct Dispatcher {
    scenario: Box<dyn Scenario>,
}

impl Dispatcher {
    pub fn new(scenario: Box<dyn Scenario>) -> Self {
        Self { scenario }
    }

    pub fn auth(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        self.scenario.auth(store, rp_certificate, req)
    }

    pub fn sign(
        &self,
        store: &mut OrderStore,
        rp_certificate: &CertificateWithDer,
        req: &AuthSignRequest,
    ) -> Result<AuthSignResponse, Error> {
        self.scenario.sign(store, rp_certificate, req)
    }
}

/// The `auth`/`sign` response for a new order, with random start tokens.
pub fn auth_sign_response(order_ref: OrderRef, random: &dyn RandomSource) -> AuthSignResponse {
    AuthSignResponse {
        order_ref,
        auto_start_token: random.uuid().to_string(),
        qr_start_token: random.uuid().to_string(),
        qr_start_secret: random.uuid().to_string(),
    }
}

/// The `complete` collect response for an order, with signed data, signature and
/// completion data built from the request and `profile`.
pub fn complete_response(
    order_ref: &str,
    req: &AuthSignRequest,
    rp_certificate: &CertificateWithDer,
    func_id: FuncId,
    profile: &Profile,
    random: &dyn RandomSource,
) -> Result<CollectResponse, Error> {
    let signed_data = signature::bankid_signed_data_element(
        req,
        rp_certificate,
        func_id,
        &profile.client,
        random,
    )?;
    let xml_signature = signature::signature_element(&signed_data, &profile.chain, random);
    let completion_data = completion::assemble(
        profile.user_certificate(),
        &profile.ip_address,
        &xml_signature,
        completion::CANNED_OCSP_RESPONSE,
    )?;
    Ok(CollectResponse::complete(order_ref, completion_data))
}
