//! Errors raised while loading, saving or applying session presets.

use std::path::PathBuf;
use thiserror::Error;

use patchbay_core::ControlError;

use crate::validation::ValidationError;

/// Preset file and apply errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A session file could not be read.
    #[error("cannot read session '{path}': {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A session file could not be written.
    #[error("cannot write session '{path}': {source}")]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The parent directory of a session file could not be created.
    #[error("cannot create session directory '{path}': {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid session TOML.
    #[error("malformed session TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preset could not be encoded as TOML.
    #[error("cannot encode session as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// One or more fields are outside device limits. Nothing was applied.
    #[error("invalid session: {0}")]
    Validation(#[from] ValidationError),

    /// A device rejected a value while the preset was applied.
    #[error("device rejected preset value: {0}")]
    Apply(#[from] ControlError),
}

impl ConfigError {
    pub(crate) fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::ErrorKind;

    #[test]
    fn file_errors_keep_path_and_source() {
        let err = ConfigError::read_file(
            "/sessions/groove.toml",
            std::io::Error::from(ErrorKind::NotFound),
        );
        assert!(matches!(&err, ConfigError::Read { path, .. } if path.ends_with("groove.toml")));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/sessions/groove.toml"));
    }

    #[test]
    fn write_and_create_dir_messages() {
        let denied = || std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(
            ConfigError::write_file("/ro/a.toml", denied())
                .to_string()
                .starts_with("cannot write session")
        );
        assert!(
            ConfigError::create_dir("/ro", denied())
                .to_string()
                .starts_with("cannot create session directory")
        );
    }

    #[test]
    fn apply_wraps_control_error() {
        let err = ConfigError::from(ControlError::TempoSelector(3));
        assert!(matches!(err, ConfigError::Apply(ControlError::TempoSelector(3))));
        assert!(err.to_string().starts_with("device rejected preset value"));
    }
}
