use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComponentsError {
    #[error("unrecognized level: {0:?}")]
    InvalidLogLevel(String),

    #[error("not a valid log format: {0:?}")]
    InvalidLogFormat(String),

    #[error("cannot open log output {path:?}: {source}")]
    LogOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logger already initialized: {0}")]
    LogInit(String),
}

pub type Result<T> = std::result::Result<T, ComponentsError>;
