use crate::code::{self, ErrCode};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use components_core::errors::as_aggregate;
use components_core::BoxError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

// ---------------------------------------------------------------------------
// WithCode
// ---------------------------------------------------------------------------

/// An error tagged with a business code from the [`code`](crate::code)
/// registry. Displays as the wrapped error.
#[derive(Debug)]
pub struct WithCode {
    code: i32,
    inner: BoxError,
}

impl WithCode {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            code,
            inner: message.into(),
        }
    }

    pub fn wrap(code: i32, err: impl Into<BoxError>) -> Self {
        Self {
            code,
            inner: err.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl fmt::Display for WithCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for WithCode {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.inner)
    }
}

/// The cause chain joined by `": "`. A [`WithCode`] link shows the same text
/// as its inner error, so it is skipped.
pub fn render_chain(err: &anyhow::Error) -> String {
    err.chain()
        .filter(|e| !e.is::<WithCode>())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

fn find_code(err: &(dyn Error + 'static)) -> Option<i32> {
    let mut cause = Some(err);
    while let Some(e) = cause {
        if let Some(tagged) = e.downcast_ref::<WithCode>() {
            return Some(tagged.code);
        }
        if let Some(agg) = as_aggregate(e) {
            return agg.errors().first().and_then(|first| find_code(&**first));
        }
        cause = e.source();
    }
    None
}

/// Resolve the coder for `err`: the first [`WithCode`] in its chain, or for
/// an aggregate, its first element. Anything else is unknown.
pub fn parse_coder(err: &anyhow::Error) -> ErrCode {
    let root: &(dyn Error + 'static) = err.as_ref();
    find_code(root)
        .map(code::lookup)
        .unwrap_or_else(ErrCode::unknown)
}

// ---------------------------------------------------------------------------
// ErrResponse / AppError
// ---------------------------------------------------------------------------

/// JSON body written for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrResponse {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

impl From<&ErrCode> for ErrResponse {
    fn from(coder: &ErrCode) -> Self {
        Self {
            code: coder.code,
            message: coder.message.clone(),
            reference: coder.reference.clone(),
        }
    }
}

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self(WithCode::new(code, message).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{}", render_chain(&self.0));
        let coder = parse_coder(&self.0);
        (coder.status, Json(ErrResponse::from(&coder))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Write `data` as a 200 JSON body, or the error as its coder's status and
/// [`ErrResponse`].
pub fn write_response<T: Serialize>(result: anyhow::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(err) => AppError(err).into_response(),
    }
}
