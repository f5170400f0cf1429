pub mod code;
pub mod error;

pub use code::{lookup, must_register, register, ErrCode};
pub use error::{parse_coder, render_chain, write_response, AppError, ErrResponse, WithCode};

use axum::extract::Path;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use components_core::log::LogOptions;
use components_core::net::is_valid_port;
use components_core::{new_aggregate, BoxError};
use serde::Deserialize;

/// Build the axum Router for the diagnostic API.
/// Registers the default error codes first.
pub fn build_router() -> Router {
    code::register_defaults();
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/ports/{port}", get(check_port))
        .route("/api/validate", post(validate))
        .fallback(not_found)
}

async fn healthz() -> Response {
    write_response(Ok(serde_json::json!({ "status": "ok" })))
}

async fn check_port(Path(port): Path<String>) -> Response {
    write_response(port_status(&port))
}

fn port_status(port: &str) -> anyhow::Result<serde_json::Value> {
    let n: i64 = port
        .parse()
        .map_err(|e| WithCode::wrap(code::ERR_BIND, e))?;
    if !is_valid_port(n) {
        return Err(WithCode::new(code::ERR_VALIDATION, format!("{n} is not a valid port")).into());
    }
    Ok(serde_json::json!({ "port": n, "valid": true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ValidateRequest {
    #[serde(default)]
    log: LogOptions,
    port: i64,
}

/// Report every problem with the submitted settings in one aggregate.
async fn validate(Json(req): Json<ValidateRequest>) -> Result<Json<serde_json::Value>, AppError> {
    let mut errs: Vec<BoxError> = req
        .log
        .validate()
        .into_iter()
        .map(|e| Box::new(WithCode::wrap(code::ERR_VALIDATION, e)) as BoxError)
        .collect();
    if !is_valid_port(req.port) {
        errs.push(Box::new(WithCode::new(
            code::ERR_VALIDATION,
            format!("{} is not a valid port", req.port),
        )));
    }
    if let Some(agg) = new_aggregate(errs) {
        return Err(agg.into());
    }
    Ok(Json(serde_json::json!({ "valid": true })))
}

async fn not_found() -> AppError {
    AppError::with_code(code::ERR_PAGE_NOT_FOUND, "no such route")
}
