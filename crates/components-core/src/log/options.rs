use crate::error::{ComponentsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const CONSOLE_FORMAT: &str = "console";
pub const JSON_FORMAT: &str = "json";

// ---------------------------------------------------------------------------
// LogOptions
// ---------------------------------------------------------------------------

/// Settings for the process-wide log subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogOptions {
    /// `stdout`, `stderr`, or file paths (appended to). Every event goes to all of them.
    pub output_paths: Vec<String>,
    /// Minimum level: trace, debug, info, warn, error (panic/fatal map to error).
    pub level: String,
    /// `console` or `json`.
    pub format: String,
    /// Drop source file and line from events.
    pub disable_caller: bool,
    /// ANSI colors, console format only.
    pub enable_color: bool,
    pub name: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            output_paths: vec!["stdout".to_string()],
            level: "info".to_string(),
            format: CONSOLE_FORMAT.to_string(),
            disable_caller: false,
            enable_color: false,
            name: String::new(),
        }
    }
}

impl LogOptions {
    /// Every problem with the options, not just the first.
    pub fn validate(&self) -> Vec<ComponentsError> {
        let mut errs = Vec::new();
        if let Err(e) = parse_level(&self.level) {
            errs.push(e);
        }
        if !is_json(&self.format) && !self.format.eq_ignore_ascii_case(CONSOLE_FORMAT) {
            errs.push(ComponentsError::InvalidLogFormat(self.format.clone()));
        }
        errs
    }

    /// Assemble the subscriber these options describe without installing it.
    ///
    /// An unparseable level falls back to info. `RUST_LOG` directives are
    /// honored for targets the level does not cover.
    pub fn subscriber(&self) -> Result<impl Subscriber + Send + Sync + 'static> {
        let level = parse_level(&self.level).unwrap_or(LevelFilter::INFO);
        let writer = self.make_writer()?;
        let with_caller = !self.disable_caller;

        let layer: Box<dyn Layer<Registry> + Send + Sync> = if is_json(&self.format) {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_file(with_caller)
                .with_line_number(with_caller)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_ansi(self.enable_color)
                .with_writer(writer)
                .with_file(with_caller)
                .with_line_number(with_caller)
                .boxed()
        };

        let filter = EnvFilter::from_default_env().add_directive(level.into());
        Ok(tracing_subscriber::registry().with(layer).with(filter))
    }

    /// Install the subscriber as the global default. Fails if one is already set.
    pub fn build(&self) -> Result<()> {
        self.subscriber()?
            .try_init()
            .map_err(|e| ComponentsError::LogInit(e.to_string()))
    }

    fn make_writer(&self) -> Result<BoxMakeWriter> {
        let mut writers = Vec::with_capacity(self.output_paths.len());
        for path in &self.output_paths {
            let writer = match path.as_str() {
                "stdout" => BoxMakeWriter::new(std::io::stdout),
                "stderr" => BoxMakeWriter::new(std::io::stderr),
                file => {
                    let f = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(file)
                        .map_err(|source| ComponentsError::LogOutput {
                            path: file.to_string(),
                            source,
                        })?;
                    BoxMakeWriter::new(Mutex::new(f))
                }
            };
            writers.push(writer);
        }

        let mut iter = writers.into_iter();
        let first = iter
            .next()
            .unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout));
        Ok(iter.fold(first, |acc, w| BoxMakeWriter::new(acc.and(w))))
    }
}

impl fmt::Display for LogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case(JSON_FORMAT)
}

/// Parse a level name. The panic/fatal family has no tracing counterpart and
/// maps to error.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "dpanic" | "panic" | "fatal" => Ok(LevelFilter::ERROR),
        _ => Err(ComponentsError::InvalidLogLevel(level.to_string())),
    }
}
