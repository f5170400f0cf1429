use std::fmt::{self, Display};
use tracing::level_filters::LevelFilter;
use tracing::Level;

/// A named logging handle carrying key/value context.
///
/// Cheap to clone. `with_name` and `with_values` return new handles and
/// leave the receiver untouched, so a base logger can be specialised per
/// request or per worker. Events go through `tracing` and carry two extra
/// fields: `logger` (the dotted name) and `context` (`k=v` pairs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Logger {
    name: Option<String>,
    values: Vec<(String, String)>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    /// Append a segment to the logger name: `a` → `a.b`.
    pub fn with_name(&self, name: &str) -> Logger {
        let name = match &self.name {
            Some(base) => format!("{base}.{name}"),
            None => name.to_string(),
        };
        Logger {
            name: Some(name),
            values: self.values.clone(),
        }
    }

    /// Add key/value pairs attached to every event from the returned logger.
    pub fn with_values<I, K, V>(&self, pairs: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        let mut values = self.values.clone();
        values.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        Logger {
            name: self.name.clone(),
            values,
        }
    }

    /// Whether events at `level` pass the current max level.
    pub fn enabled(&self, level: Level) -> bool {
        level <= LevelFilter::current()
    }

    pub fn trace(&self, msg: impl Display) {
        self.emit(Level::TRACE, &msg);
    }

    pub fn debug(&self, msg: impl Display) {
        self.emit(Level::DEBUG, &msg);
    }

    pub fn info(&self, msg: impl Display) {
        self.emit(Level::INFO, &msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.emit(Level::WARN, &msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.emit(Level::ERROR, &msg);
    }

    fn emit(&self, level: Level, msg: &dyn Display) {
        let logger = self.name.as_deref().unwrap_or_default();
        let context = Context(&self.values);
        // tracing needs the level at compile time
        if level == Level::ERROR {
            tracing::error!(logger, context = %context, "{msg}");
        } else if level == Level::WARN {
            tracing::warn!(logger, context = %context, "{msg}");
        } else if level == Level::INFO {
            tracing::info!(logger, context = %context, "{msg}");
        } else if level == Level::DEBUG {
            tracing::debug!(logger, context = %context, "{msg}");
        } else {
            tracing::trace!(logger, context = %context, "{msg}");
        }
    }
}

struct Context<'a>(&'a [(String, String)]);

impl Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}
