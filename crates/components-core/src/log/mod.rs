//! Logging facade over `tracing`.
//!
//! [`LogOptions`] configures the process-wide subscriber, [`Logger`] is the
//! handle code passes around. A default logger exists only after an explicit
//! [`init`]; nothing is created on first use.

mod logger;
mod options;

pub use logger::Logger;
pub use options::{parse_level, LogOptions, CONSOLE_FORMAT, JSON_FORMAT};

use crate::error::Result;
use std::sync::OnceLock;

pub const KEY_REQUEST_ID: &str = "requestID";
pub const KEY_USERNAME: &str = "username";
pub const KEY_WATCHER_NAME: &str = "watcher";

/// Name given to loggers resolved without any context or default.
pub const UNKNOWN_CONTEXT: &str = "Unknown-Context";

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// Install the global subscriber and the default [`Logger`].
///
/// Errors if a global subscriber is already installed.
pub fn init(opts: &LogOptions) -> Result<&'static Logger> {
    opts.build()?;
    let logger = if opts.name.is_empty() {
        Logger::new()
    } else {
        Logger::named(opts.name.as_str())
    };
    Ok(DEFAULT.get_or_init(|| logger))
}

/// The default logger, if [`init`] has run.
pub fn global() -> Option<&'static Logger> {
    DEFAULT.get()
}

/// Resolve the logger for a call site: the one passed in, else the default,
/// else a logger named [`UNKNOWN_CONTEXT`].
pub fn from_context(ctx: Option<&Logger>) -> Logger {
    ctx.or_else(|| global())
        .cloned()
        .unwrap_or_else(|| Logger::named(UNKNOWN_CONTEXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_context_wins() {
        let mine = Logger::named("mine");
        assert_eq!(from_context(Some(&mine)), mine);
    }

    #[test]
    fn missing_context_falls_back() {
        let resolved = from_context(None);
        match global() {
            Some(default) => assert_eq!(&resolved, default),
            None => assert_eq!(resolved.name(), Some(UNKNOWN_CONTEXT)),
        }
    }
}
