// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while pulling records from a source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Input file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied reading file: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV at line {line} in {path}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl SourceError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_maps_not_found() {
        let err = SourceError::io(
            "/missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert_eq!(err.to_string(), "Input file not found: /missing.csv");
    }

    #[test]
    fn test_io_maps_permission_denied() {
        let err = SourceError::io(
            "/secret.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, SourceError::PermissionDenied { .. }));
    }

    #[test]
    fn test_io_keeps_other_kinds() {
        let err = SourceError::io(
            "/data.csv",
            std::io::Error::new(std::io::ErrorKind::Other, "disk error"),
        );
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("disk error"));
    }

    #[test]
    fn test_malformed_display() {
        let err = SourceError::malformed("/data.csv", 7, "unterminated quoted field");
        assert_eq!(
            err.to_string(),
            "Malformed CSV at line 7 in /data.csv: unterminated quoted field"
        );
    }
}
