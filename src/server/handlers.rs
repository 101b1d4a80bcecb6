use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{StatusCode, Uri},
    Json,
};
use serde::Serialize;

use crate::definitions::{
    AuthSignRequest, AuthSignResponse, CancelResponse, CollectCancelRequest, CollectResponse,
};

use super::{client_cert::ClientCertificate, error::ApiError, AppState};

type Peer = Option<ConnectInfo<SocketAddr>>;

fn peer_address(peer: &Peer) -> String {
    peer.as_ref()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn log_body<T: Serialize>(label: &str, body: &T) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        match serde_json::to_string(body) {
            Ok(json) => tracing::debug!("{label} body: {json}."),
            Err(e) => tracing::debug!("{label} body could not be serialized: {e}."),
        }
    }
}

fn parse_body<T: Serialize>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(body) = body?;
    log_body("Request", &body);
    Ok(body)
}

pub async fn auth(
    State(state): State<AppState>,
    peer: Peer,
    client_certificate: Option<ClientCertificate>,
    body: Result<Json<AuthSignRequest>, JsonRejection>,
) -> Result<Json<AuthSignResponse>, ApiError> {
    tracing::info!("Received auth request from {}.", peer_address(&peer));
    let ClientCertificate(rp_certificate) = client_certificate.ok_or(ApiError::Unauthorized)?;
    let req = parse_body(body)?;

    let resp = {
        let mut orders = state.orders.lock().map_err(|_| ApiError::Poisoned)?;
        state.dispatcher.auth(&mut orders, &rp_certificate, &req)?
    };

    log_body("Response", &resp);
    tracing::info!("Successfully processed auth request.");
    Ok(Json(resp))
}

pub async fn sign(
    State(state): State<AppState>,
    peer: Peer,
    client_certificate: Option<ClientCertificate>,
    body: Result<Json<AuthSignRequest>, JsonRejection>,
) -> Result<Json<AuthSignResponse>, ApiError> {
    tracing::info!("Received sign request from {}.", peer_address(&peer));
    let ClientCertificate(rp_certificate) = client_certificate.ok_or(ApiError::Unauthorized)?;
    let req = parse_body(body)?;

    let resp = {
        let mut orders = state.orders.lock().map_err(|_| ApiError::Poisoned)?;
        state.dispatcher.sign(&mut orders, &rp_certificate, &req)?
    };

    log_body("Response", &resp);
    tracing::info!("Successfully processed sign request.");
    Ok(Json(resp))
}

pub async fn collect(
    State(state): State<AppState>,
    peer: Peer,
    client_certificate: Option<ClientCertificate>,
    body: Result<Json<CollectCancelRequest>, JsonRejection>,
) -> Result<Json<CollectResponse>, ApiError> {
    tracing::info!("Received collect request from {}.", peer_address(&peer));
    client_certificate.ok_or(ApiError::Unauthorized)?;
    let CollectCancelRequest { order_ref } = parse_body(body)?;

    let resp = state
        .orders
        .lock()
        .map_err(|_| ApiError::Poisoned)?
        .peek_and_advance(&order_ref);
    let Some(resp) = resp else {
        tracing::warn!("Collect for unknown order {order_ref}.");
        return Err(ApiError::NoSuchOrder);
    };

    log_body("Response", &resp);
    tracing::info!("Successfully processed collect request.");
    Ok(Json(resp))
}

pub async fn cancel(
    State(state): State<AppState>,
    peer: Peer,
    client_certificate: Option<ClientCertificate>,
    body: Result<Json<CollectCancelRequest>, JsonRejection>,
) -> Result<Json<CancelResponse>, ApiError> {
    tracing::info!("Received cancel request from {}.", peer_address(&peer));
    client_certificate.ok_or(ApiError::Unauthorized)?;
    let CollectCancelRequest { order_ref } = parse_body(body)?;

    let cancelled = state
        .orders
        .lock()
        .map_err(|_| ApiError::Poisoned)?
        .cancel(&order_ref);
    if !cancelled {
        tracing::warn!("Cancel for unknown order {order_ref}.");
        return Err(ApiError::NoSuchOrder);
    }

    tracing::info!("Successfully processed cancel request.");
    Ok(Json(CancelResponse {}))
}

pub async fn not_found(uri: Uri) -> StatusCode {
    tracing::warn!("No matching handler found for endpoint {:?}.", uri.to_string());
    StatusCode::NOT_FOUND
}
