use thiserror::Error;

/// Failures surfaced by the smart actions. Resolution itself never errors;
/// "nothing matched" is a `None` until an action-level caller decides it is
/// fatal.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("could not find element for description '{description}'")]
    NoMatchFound { description: String },

    #[error("element for '{description}' is <{actual}>, expected {expected}")]
    WrongElementKind {
        description: String,
        expected: &'static str,
        actual: String,
    },

    #[error(
        "timed out after {timeout_ms}ms waiting for '{description}' (last error: {})",
        .last_error.as_deref().unwrap_or("none")
    )]
    Timeout {
        description: String,
        timeout_ms: u64,
        last_error: Option<String>,
    },

    #[error("{action} failed for '{description}': {source}")]
    ActionFailed {
        action: &'static str,
        description: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
