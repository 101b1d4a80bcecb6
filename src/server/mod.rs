//! The relying-party HTTP API.

mod client_cert;
mod error;
pub mod handlers;

use std::sync::{Arc, Mutex};

use axum::{http::HeaderName, routing::post, Router};

use crate::{
    config::{self, Config},
    order::{Clock, OrderStore},
    scenario::{Dispatcher, Profile},
    signature::random::RandomSource,
};

pub use client_cert::{parse_forwarded_certificate, ClientCertificate};
pub use error::ApiError;

pub const API_PREFIX: &str = "/rp/v5.1";

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<Mutex<OrderStore>>,
    pub dispatcher: Arc<Dispatcher>,
    pub client_cert_header: HeaderName,
}

impl AppState {
    pub fn new(orders: OrderStore, dispatcher: Dispatcher, client_cert_header: HeaderName) -> Self {
        Self {
            orders: Arc::new(Mutex::new(orders)),
            dispatcher: Arc::new(dispatcher),
            client_cert_header,
        }
    }

    /// Wire up the order store and the configured scenario.
    pub fn from_config(
        config: &Config,
        profile: Profile,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, config::Error> {
        config.orders.validate()?;
        let orders = OrderStore::new(clock, config.orders.ttl(), config.orders.max_entries)
            .with_random(random.clone());
        let dispatcher = Dispatcher::new(config.scenario.build(profile, random));
        Ok(Self::new(
            orders,
            dispatcher,
            config.client_cert_header_name()?,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(&format!("{API_PREFIX}/auth"), post(handlers::auth))
        .route(&format!("{API_PREFIX}/sign"), post(handlers::sign))
        .route(&format!("{API_PREFIX}/collect"), post(handlers::collect))
        .route(&format!("{API_PREFIX}/cancel"), post(handlers::cancel))
        .fallback(handlers::not_found)
        .with_state(state)
}
