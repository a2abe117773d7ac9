use thiserror::Error;

/// Returned by a block run that ended in failure.
///
/// Carries nothing: the failure has already been written out through the
/// block's `error` message. Callers treat it purely as "stop the sequence".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("test block stopped after reporting its failure")]
pub struct Stopped;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("log level {0} is out of range (expected 0, 1 or 2)")]
    InvalidLogLevel(u8),
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("no test block registered under '{0}'")]
    UnknownBlock(String),

    #[error("invalid configuration for test block '{block}': {source}")]
    Config {
        block: String,
        #[source]
        source: ConfigError,
    },
}
