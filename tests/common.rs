use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde_json::Value;

use bankid_simulator::{
    order::SystemClock,
    server::{self, AppState},
    signature::random::OsRandom,
    Config,
};

pub const RP_CERT_PEM: &str = include_str!("../test/certs/rp-fp-testcert-4.pem");
pub const CLIENT_CERT_HEADER: &str = "x-ssl-client-cert";

#[allow(dead_code)]
fn main() {}

/// A simulator listening on an ephemeral local port.
pub struct Simulator {
    pub base_url: String,
}

/// Status code and body of a response.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    #[allow(dead_code)]
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).with_context(|| format!("not JSON: {}", self.body))
    }
}

/// The relying-party certificate as a proxy forwards it: PEM with the line breaks
/// replaced by spaces.
#[allow(dead_code)]
pub fn forwarded_rp_certificate() -> String {
    RP_CERT_PEM.trim().replace('\n', " ")
}

/// Start a simulator with `config`, resolving certificate paths against the crate root.
#[allow(dead_code)]
pub async fn start(config: Config) -> Result<Simulator> {
    let profile = config
        .resolve_profile(&PathBuf::from(env!("CARGO_MANIFEST_DIR")))
        .context("could not load profile")?;
    let state = AppState::from_config(&config, profile, Arc::new(SystemClock), Arc::new(OsRandom))?;
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });

    Ok(Simulator {
        base_url: format!("http://{addr}/rp/v5.1"),
    })
}

impl Simulator {
    /// POST a raw body to `path`, presenting `certificate` in the client certificate header.
    #[allow(dead_code)]
    pub async fn post_raw(
        &self,
        path: &str,
        certificate: Option<String>,
        body: String,
    ) -> Result<Reply> {
        let url = format!("{}{path}", self.base_url);
        tokio::task::spawn_blocking(move || -> Result<Reply> {
            let mut request = ureq::post(&url).set("content-type", "application/json");
            if let Some(certificate) = certificate {
                request = request.set(CLIENT_CERT_HEADER, &certificate);
            }
            let response = match request.send_string(&body) {
                Ok(response) => response,
                Err(ureq::Error::Status(_, response)) => response,
                Err(e) => return Err(e.into()),
            };
            let status = response.status();
            let body = response.into_string()?;
            Ok(Reply { status, body })
        })
        .await?
    }

    /// POST JSON as the relying party.
    #[allow(dead_code)]
    pub async fn post(&self, path: &str, body: Value) -> Result<Reply> {
        self.post_raw(path, Some(forwarded_rp_certificate()), body.to_string())
            .await
    }

    /// Collect `order_ref` once and return the parsed response.
    #[allow(dead_code)]
    pub async fn collect(&self, order_ref: &str) -> Result<Reply> {
        self.post("/collect", serde_json::json!({ "orderRef": order_ref }))
            .await
    }
}
