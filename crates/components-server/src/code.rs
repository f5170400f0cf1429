use axum::http::StatusCode;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use thiserror::Error;

/// Reserved for errors that carry no registered code.
pub const UNKNOWN_CODE: i32 = 1;

pub const ERR_VALIDATION: i32 = 100001;
pub const ERR_BIND: i32 = 100002;
pub const ERR_PAGE_NOT_FOUND: i32 = 100003;

/// Statuses a registered code may map to.
const SUPPORTED_STATUSES: [StatusCode; 6] = [
    StatusCode::OK,
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::INTERNAL_SERVER_ERROR,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("code {0} is reserved as the unknown error code")]
    Reserved(i32),

    #[error("code {0} already registered")]
    AlreadyRegistered(i32),

    #[error("http status {0} is not allowed for an error code")]
    UnsupportedStatus(u16),
}

// ---------------------------------------------------------------------------
// ErrCode
// ---------------------------------------------------------------------------

/// A business error code: its HTTP status, the message safe to show
/// clients, and an optional documentation reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrCode {
    pub code: i32,
    pub status: StatusCode,
    pub message: String,
    pub reference: String,
}

impl ErrCode {
    pub fn new(code: i32, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            reference: String::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// The coder every unregistered code resolves to.
    pub fn unknown() -> Self {
        Self::new(
            UNKNOWN_CODE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal server error occurred",
        )
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn registry() -> &'static RwLock<HashMap<i32, ErrCode>> {
    static CODES: OnceLock<RwLock<HashMap<i32, ErrCode>>> = OnceLock::new();
    CODES.get_or_init(|| RwLock::new(HashMap::new()))
}

fn check(coder: &ErrCode) -> Result<(), CodeError> {
    if coder.code == UNKNOWN_CODE {
        return Err(CodeError::Reserved(coder.code));
    }
    if !SUPPORTED_STATUSES.contains(&coder.status) {
        return Err(CodeError::UnsupportedStatus(coder.status.as_u16()));
    }
    Ok(())
}

/// Register `coder`, replacing any earlier registration of the same code.
pub fn register(coder: ErrCode) -> Result<(), CodeError> {
    check(&coder)?;
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(coder.code, coder);
    Ok(())
}

/// Register `coder`; fails if the code is taken.
pub fn must_register(coder: ErrCode) -> Result<(), CodeError> {
    check(&coder)?;
    let mut codes = registry().write().unwrap_or_else(PoisonError::into_inner);
    if codes.contains_key(&coder.code) {
        return Err(CodeError::AlreadyRegistered(coder.code));
    }
    codes.insert(coder.code, coder);
    Ok(())
}

/// The registered coder for `code`, or [`ErrCode::unknown`].
pub fn lookup(code: i32) -> ErrCode {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&code)
        .cloned()
        .unwrap_or_else(ErrCode::unknown)
}

/// Register the codes the bundled router responds with. Safe to call twice.
pub fn register_defaults() {
    let defaults = [
        ErrCode::new(ERR_VALIDATION, StatusCode::BAD_REQUEST, "Validation failed"),
        ErrCode::new(
            ERR_BIND,
            StatusCode::BAD_REQUEST,
            "Error occurred while binding the request body to the struct",
        ),
        ErrCode::new(ERR_PAGE_NOT_FOUND, StatusCode::NOT_FOUND, "Page not found"),
    ];
    for coder in defaults {
        let code = coder.code;
        let registered = register(coder);
        debug_assert!(registered.is_ok(), "default code {code} rejected: {registered:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_code_is_unknown() {
        let coder = lookup(999_999);
        assert_eq!(coder, ErrCode::unknown());
        assert_eq!(coder.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(coder.message, "An internal server error occurred");
    }

    #[test]
    fn unknown_code_is_reserved() {
        let err = register(ErrCode::new(UNKNOWN_CODE, StatusCode::OK, "nope")).unwrap_err();
        assert_eq!(err, CodeError::Reserved(UNKNOWN_CODE));
    }

    #[test]
    fn unsupported_status_is_rejected() {
        let err = register(ErrCode::new(200_101, StatusCode::IM_A_TEAPOT, "tea")).unwrap_err();
        assert_eq!(err, CodeError::UnsupportedStatus(418));
    }

    #[test]
    fn register_replaces_and_must_register_refuses() {
        register(ErrCode::new(200_201, StatusCode::NOT_FOUND, "first")).unwrap();
        register(ErrCode::new(200_201, StatusCode::NOT_FOUND, "second")).unwrap();
        assert_eq!(lookup(200_201).message, "second");

        let err =
            must_register(ErrCode::new(200_201, StatusCode::NOT_FOUND, "third")).unwrap_err();
        assert_eq!(err, CodeError::AlreadyRegistered(200_201));
        assert_eq!(lookup(200_201).message, "second");
    }

    #[test]
    fn reference_is_kept() {
        let coder = ErrCode::new(200_301, StatusCode::FORBIDDEN, "denied")
            .with_reference("https://example.com/docs/denied");
        must_register(coder.clone()).unwrap();
        assert_eq!(lookup(200_301), coder);
    }

    #[test]
    fn defaults_register_idempotently() {
        register_defaults();
        register_defaults();
        assert_eq!(lookup(ERR_PAGE_NOT_FOUND).status, StatusCode::NOT_FOUND);
    }
}
