//! Axum HTTP handlers for the Monocle server.
//!
//! `POST /verify` opens a threat bundle and returns the verdict;
//! `GET /health` reports liveness and the active key id.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::error::RootError;
use crate::MonocleService;
use monocle_core::EvaluationResult;

pub const ANONYMIZED_MESSAGE: &str = "Anonymized session detected.";
pub const CLEAN_MESSAGE: &str = "Session is not anonymized.";

/// Shared application state for Axum handlers.
pub struct AppState {
    pub service: MonocleService,
    /// Resolve the client from forwarding headers before the TCP peer.
    pub trust_forwarded_for: bool,
}

/// Build the Axum router with all endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/verify", post(handle_verify))
        .route("/health", get(handle_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Client address resolution
// ---------------------------------------------------------------------------

/// The request's client address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let forwarded = if state.trust_forwarded_for {
            forwarded_client_ip(&parts.headers)
        } else {
            None
        };
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        };

        match forwarded.or_else(peer) {
            Some(ip) => Ok(ClientIp(ip)),
            None => {
                tracing::warn!("request without a resolvable client address");
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "client_ip",
                        "message": "client address could not be determined",
                    })),
                ))
            }
        }
    }
}

/// Left-most parseable `X-Forwarded-For` entry, then `X-Real-IP`.
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_xff = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .find_map(parse_forwarded_entry);

    from_xff.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_forwarded_entry)
    })
}

/// Accepts a bare address or `ip:port` / `[v6]:port`.
fn parse_forwarded_entry(entry: &str) -> Option<IpAddr> {
    let entry = entry.trim();
    entry
        .parse::<IpAddr>()
        .ok()
        .or_else(|| entry.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /verify -- open a bundle and evaluate the session
async fn handle_verify(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    body: Bytes,
) -> Response {
    let bundle = match extract_bundle(&body) {
        Ok(bundle) => bundle,
        Err(e) => return error_response(&e),
    };

    match state.service.verify_anon_mode(&bundle, &client_ip.to_string()) {
        Ok(result) => verdict_response(&result),
        Err(e) => error_response(&e),
    }
}

/// GET /health -- server info
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "key_id": state.service.key_id(),
    }))
}

fn extract_bundle(body: &[u8]) -> Result<String, RootError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RootError::Validation(format!("request body is not valid JSON: {}", e)))?;
    match value.get("monocle_bundle") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(RootError::Validation("monocle_bundle is required".into()))
        }
        Some(_) => Err(RootError::Validation(
            "monocle_bundle must be a string".into(),
        )),
    }
}

fn verdict_response(result: &EvaluationResult) -> Response {
    let (status, message) = if result.is_anonymized() {
        (StatusCode::UNPROCESSABLE_ENTITY, ANONYMIZED_MESSAGE)
    } else {
        (StatusCode::OK, CLEAN_MESSAGE)
    };
    (
        status,
        Json(json!({
            "message": message,
            "is_anon_session": result.is_anon_session(),
            "anon_type": result.anon_type(),
            "justifications": result.justifications(),
        })),
    )
        .into_response()
}

fn error_response(err: &RootError) -> Response {
    let (status, body) = match err {
        RootError::Validation(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": "validation", "message": msg }),
        ),
        RootError::Monocle(e) if e.kind().is_bundle_fault() => (
            StatusCode::BAD_REQUEST,
            json!({ "error": e.kind().as_str(), "message": e.to_string() }),
        ),
        other => {
            tracing::error!(error = %other, "verification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal", "message": "internal error" }),
            )
        }
    };
    (status, Json(body)).into_response()
}
