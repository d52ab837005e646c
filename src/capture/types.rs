// Core types for the capture pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::EngineError;
use crate::format::OutputFormat;

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// What caused the render to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTrigger {
    /// Ordinary readiness: document complete and geometry known
    Readiness,
    /// A page script raised the expected alert string
    AlertMatch,
    /// The global timeout expired before readiness was reached
    Timeout,
}

/// Terminal outcome of a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOutcome {
    /// Path the output was written to
    pub output: PathBuf,

    /// Format the output was encoded in
    pub format: OutputFormat,

    /// What fired the render
    pub trigger: RenderTrigger,

    /// Output surface width in pixels (raster and vector formats only)
    pub width: Option<u32>,

    /// Output surface height in pixels (raster and vector formats only)
    pub height: Option<u32>,

    /// Wall time from load start to output written, in milliseconds
    pub elapsed_ms: u64,

    /// When the capture completed
    #[serde(with = "chrono::serde::ts_seconds")]
    pub completed_at: DateTime<Utc>,
}

/// Error types for capture operations
#[derive(Debug)]
pub enum CaptureError {
    /// Invalid or missing configuration, detected before any load begins
    Config(String),

    /// Browser engine failure
    Engine(EngineError),

    /// Encoder failure while producing the output
    Encode(String),

    /// I/O error writing the output
    Io(std::io::Error),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CaptureError::Engine(err) => write!(f, "Engine error: {}", err),
            CaptureError::Encode(msg) => write!(f, "Encode error: {}", msg),
            CaptureError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Config(_) => None,
            CaptureError::Engine(err) => Some(err),
            CaptureError::Encode(_) => None,
            CaptureError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err)
    }
}

impl From<EngineError> for CaptureError {
    fn from(err: EngineError) -> Self {
        CaptureError::Engine(err)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaptureError::Config("missing url".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing url");

        let err = CaptureError::Encode("palette overflow".to_string());
        assert_eq!(err.to_string(), "Encode error: palette overflow");
    }

    #[test]
    fn test_error_conversions() {
        let io = std::io::Error::other("disk full");
        let err: CaptureError = io.into();
        assert!(matches!(err, CaptureError::Io(_)));

        let err: CaptureError = EngineError::Load("bad url".to_string()).into();
        assert!(matches!(err, CaptureError::Engine(_)));
    }

    #[test]
    fn test_trigger_serialization() {
        assert_eq!(
            serde_json::to_string(&RenderTrigger::AlertMatch).unwrap(),
            "\"alertmatch\""
        );
        assert_eq!(
            serde_json::to_string(&RenderTrigger::Timeout).unwrap(),
            "\"timeout\""
        );
    }
}
