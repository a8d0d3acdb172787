use std::{io, path::PathBuf};

use thiserror::Error;

use crate::transform::TransformStatus;

pub type SdrResult<T> = Result<T, SdrError>;

/// Errors produced by secure stores and their backends.
///
/// An absent record is not an error: reads report it as `Ok(None)` and
/// removals treat it as a no-op.
#[derive(Debug, Error)]
pub enum SdrError {
    /// The location is invalid, inaccessible, or could not be created.
    #[error("invalid location {location:?}: {reason}")]
    Configuration { location: String, reason: String },

    /// The transform engine reported a non-success status.
    #[error("transform failed: {status}")]
    Transform { status: TransformStatus },

    /// File open/read/write failure.
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store has no transform state; call `initialize` first.
    #[error("store is not initialized")]
    NotInitialized,

    /// `initialize` was called twice without an intervening `remove_all`.
    #[error("store is already initialized")]
    AlreadyInitialized,

    /// A record was read as a string but does not hold UTF-8.
    #[error("record {key} is not valid UTF-8")]
    NotUtf8 { key: String },
}

impl SdrError {
    pub fn configuration(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<TransformStatus> for SdrError {
    fn from(status: TransformStatus) -> Self {
        Self::Transform { status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_carries_status_name_and_description() {
        let err = SdrError::from(TransformStatus::AuthenticationFailed);
        let message = err.to_string();
        assert!(message.contains(TransformStatus::AuthenticationFailed.name()));
        assert!(message.contains(TransformStatus::AuthenticationFailed.description()));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = SdrError::io(
            "/var/sdr/token",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/var/sdr/token"));
    }
}
