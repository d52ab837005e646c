//! Browser engine seam.
//!
//! Rendering, layout, and script execution are performed by an external
//! engine. This module defines the boundary: `PageEngine` is the capability
//! interface a real embedded engine implements, `EngineEvent` is the set of
//! asynchronous signals it reports while a page loads, and `RenderSurface`
//! is the pixel buffer it paints into for raster and vector output.
//!
//! The bundled `MockEngine` is a scripted stand-in used by the test suite and
//! by the binary; it performs no real layout or rasterization.

pub mod mock;
pub mod surface;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;

use crate::request::{CaptureRequest, PageSettings};

pub use mock::{MockEngine, MockEngineConfig, ScriptedEvent};
pub use surface::RenderSurface;

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The smallest viewport containing both `self` and `other`
    pub fn expanded_to(self, other: Viewport) -> Viewport {
        Viewport {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Asynchronous signals reported by the engine while a page loads.
///
/// These arrive in no guaranteed order and any of them may repeat; the
/// capture coordinator is responsible for making sense of them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine finished its initial layout pass.
    ///
    /// Newer engines never emit this; it is tracked but does not gate
    /// readiness.
    LayoutComplete,

    /// The document finished loading. `ok` is false on load failure.
    DocumentComplete { ok: bool },

    /// The viewport settled on (or changed to) a new size
    GeometryChanged { viewport: Viewport },

    /// A page script invoked `alert(...)` with the given message
    AlertRaised(String),

    /// The page script context was torn down and rebuilt (navigation,
    /// reload); injected script must be re-installed
    ContextCleared,
}

/// Which extracted representation of the document to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    PlainText,
    Html,
}

/// Page setup for the engine's print pipeline
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Page width in millimeters
    pub page_width_mm: f64,
    /// Page height in millimeters
    pub page_height_mm: f64,
    /// Whether to paint element backgrounds
    pub print_backgrounds: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        // A4 portrait
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            print_backgrounds: false,
        }
    }
}

impl PrintOptions {
    /// Build print options from page settings
    pub fn from_settings(settings: &PageSettings) -> Self {
        Self {
            print_backgrounds: settings.print_backgrounds.unwrap_or(false),
            ..Default::default()
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error types for engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Failure starting or performing the page load
    Load(String),

    /// Failure painting the render surface
    Render(String),

    /// Failure in the print pipeline
    Print(String),

    /// Failure running script in the page context
    Script(String),

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Load(msg) => write!(f, "Load error: {}", msg),
            EngineError::Render(msg) => write!(f, "Render error: {}", msg),
            EngineError::Print(msg) => write!(f, "Print error: {}", msg),
            EngineError::Script(msg) => write!(f, "Script error: {}", msg),
            EngineError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err)
    }
}

/// Capability interface of the external browser engine.
///
/// `load` starts the page load and the engine reports progress through the
/// event stream obtained from `take_events`. The remaining operations are
/// only meaningful once the coordinator has decided to capture; each models
/// an engine callback as an awaitable completion (e.g. `print_document`
/// resolves when the engine's print-finished callback fires).
#[async_trait]
pub trait PageEngine: Send {
    /// Short identifier for logging (e.g. "mock", "webkit")
    fn name(&self) -> &str;

    /// Apply page behavior settings. Called once, before `load`.
    fn configure(&mut self, settings: &PageSettings) -> EngineResult<()>;

    /// Begin loading the request's URL with its headers and body
    fn load(&mut self, request: &CaptureRequest) -> EngineResult<()>;

    /// Take the event stream for the current load. Yields events until the
    /// engine has nothing further to report.
    fn take_events(&mut self) -> EngineResult<mpsc::UnboundedReceiver<EngineEvent>>;

    /// Paint the current page into a surface of the given size.
    /// `smooth` requests antialiasing and smooth-transform hints.
    async fn render_surface(&mut self, viewport: Viewport, smooth: bool)
        -> EngineResult<RenderSurface>;

    /// Run the print pipeline against a fixed page size, writing directly to
    /// `path`. Resolves when the engine reports print-finished.
    async fn print_document(&mut self, path: &Path, options: &PrintOptions) -> EngineResult<()>;

    /// Extract the document as plain text or serialized HTML
    async fn extract_content(&mut self, kind: ContentKind) -> EngineResult<String>;

    /// Evaluate script in the page context and return its JSON-coerced result
    async fn run_script(&mut self, source: &str) -> EngineResult<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_expanded_to() {
        let a = Viewport::new(800, 600);
        let b = Viewport::new(1024, 400);
        assert_eq!(a.expanded_to(b), Viewport::new(1024, 600));
        assert_eq!(b.expanded_to(a), Viewport::new(1024, 600));
        assert_eq!(a.expanded_to(a), a);
    }

    #[test]
    fn test_print_options_from_settings() {
        let mut settings = PageSettings::default();
        let options = PrintOptions::from_settings(&settings);
        assert!(!options.print_backgrounds);
        assert_eq!(options.page_width_mm, 210.0);

        settings.print_backgrounds = Some(true);
        assert!(PrintOptions::from_settings(&settings).print_backgrounds);
    }
}
