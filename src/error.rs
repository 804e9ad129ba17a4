use std::error::Error as StdError;

use thiserror::Error;

/// mediacut's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// mediacut's crate-wide error type.
///
/// The first five variants are the operation failures surfaced to users. Only
/// [`Error::EngineUnavailable`] is ever produced after an internal retry (across engine source
/// candidates); every other kind aborts the operation immediately.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was triggered while the session had no selected input.
    #[error("no file selected")]
    NoFileSelected,

    /// Every engine source candidate failed to initialize.
    #[error("engine unavailable: {}", summarize_attempts(.attempts))]
    EngineUnavailable { attempts: Vec<String> },

    /// Writing the input into the engine's working storage failed.
    #[error("failed to stage input '{name}': {reason}")]
    StageFailure { name: String, reason: String },

    /// The engine reported an error while running the operation.
    #[error("engine invocation failed: {reason}")]
    InvocationFailure { reason: String },

    /// The output was missing (or unreadable) after a reported-successful invocation.
    #[error("failed to retrieve output '{name}': {reason}")]
    RetrievalFailure { name: String, reason: String },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Short, stable identifier for the error kind (used in logs and metrics labels).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoFileSelected => "no_file_selected",
            Self::EngineUnavailable { .. } => "engine_unavailable",
            Self::StageFailure { .. } => "stage_failure",
            Self::InvocationFailure { .. } => "invocation_failure",
            Self::RetrievalFailure { .. } => "retrieval_failure",
            Self::Message(_) | Self::Other(_) => "other",
        }
    }
}

fn summarize_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        return "no engine source candidates were configured".to_owned();
    }
    attempts.join("; ")
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unavailable_lists_every_attempt() {
        let err = Error::EngineUnavailable {
            attempts: vec!["a: not found".into(), "b: exit 1".into()],
        };
        assert_eq!(err.to_string(), "engine unavailable: a: not found; b: exit 1");
    }

    #[test]
    fn engine_unavailable_without_candidates_says_so() {
        let err = Error::EngineUnavailable { attempts: vec![] };
        assert!(err.to_string().contains("no engine source candidates"));
    }

    #[test]
    fn kinds_are_distinct_for_operation_failures() {
        let kinds = [
            Error::NoFileSelected.kind(),
            Error::EngineUnavailable { attempts: vec![] }.kind(),
            Error::StageFailure {
                name: "input.mp4".into(),
                reason: "disk full".into(),
            }
            .kind(),
            Error::InvocationFailure {
                reason: "exit 1".into(),
            }
            .kind(),
            Error::RetrievalFailure {
                name: "output.mp4".into(),
                reason: "missing".into(),
            }
            .kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
