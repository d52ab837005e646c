//! pagecapt - readiness-coordinated web page capture.
//!
//! This crate captures a single rendered web page to a file in one of 14
//! output formats. It provides:
//! - A capture coordinator that picks the one correct instant to snapshot a
//!   page whose readiness signals arrive asynchronously and out of order
//! - An output dispatcher covering raster, vector, paginated, and text formats
//! - A `PageEngine` trait for plugging in the embedded browser engine, with a
//!   scripted `MockEngine` for testing
//! - Optional script injection with alert-driven capture control (feature
//!   `script`)
//!
//! # Example
//!
//! ```rust,no_run
//! use pagecapt::engine::{MockEngine, Viewport};
//! use pagecapt::request::CaptureRequest;
//! use pagecapt::runner::run_capture;
//!
//! # async fn capture() -> Result<(), Box<dyn std::error::Error>> {
//! let request = CaptureRequest::builder("http://example.org/", "page.png")
//!     .max_wait_ms(5_000)
//!     .build()?;
//! let mut engine = MockEngine::ready_at(Viewport::new(800, 600));
//! let outcome = run_capture(&mut engine, &request).await?;
//! println!("captured via {:?} trigger", outcome.trigger);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod engine;
pub mod format;
pub mod request;
pub mod runner;
#[cfg(feature = "script")]
pub mod script;

// Re-export the capture pipeline
pub use capture::{
    Action, CaptureCoordinator, CaptureError, CaptureEvent, CaptureOutcome, CaptureResult, Phase,
    ReadinessTracker, RenderTrigger,
};

// Re-export the engine seam
pub use engine::{
    ContentKind, EngineError, EngineEvent, EngineResult, MockEngine, PageEngine, RenderSurface,
    Viewport,
};

// Re-export request construction and format resolution
pub use format::{FormatClass, OutputFormat};
pub use request::{CaptureRequest, PageSettings};
pub use runner::run_capture;

#[cfg(feature = "script")]
pub use script::ScriptSession;
