//! Capture request construction and validation.
//!
//! A `CaptureRequest` is built once from resolved CLI/config input and never
//! mutated afterwards. Validation is front-loaded: an unresolved output
//! format or a format without an encoder fails at `build()` time, before any
//! network or render activity begins.

use std::path::PathBuf;

use crate::capture::types::{CaptureError, CaptureResult};
use crate::config;
use crate::format::OutputFormat;

/// Engine behavior knobs for the page being captured.
///
/// Toggles are tri-state: `None` leaves the engine default untouched,
/// matching how the original tool only forwarded explicitly set options.
#[derive(Debug, Clone, Default)]
pub struct PageSettings {
    /// JavaScript execution
    pub javascript: Option<bool>,
    /// Plugin execution
    pub plugins: Option<bool>,
    /// Automatic image loading
    pub auto_load_images: Option<bool>,
    /// Whether page script may open windows
    pub js_can_open_windows: Option<bool>,
    /// Whether page script may access the clipboard
    pub js_can_access_clipboard: Option<bool>,
    /// Whether links participate in the tab focus chain
    pub links_included_in_focus_chain: Option<bool>,
    /// Element backgrounds in paginated output
    pub print_backgrounds: Option<bool>,
    /// Page zoom factor (None = no zooming)
    pub zoom_factor: Option<f64>,
    /// Ignore TLS certificate errors
    pub insecure: bool,
    /// User-Agent header override
    pub user_agent: Option<String>,
    /// Application name reported in the default User-Agent
    pub app_name: Option<String>,
    /// Application version reported in the default User-Agent
    pub app_version: Option<String>,
}

/// Immutable input to a capture session
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Target URL
    pub url: String,

    /// Output file path
    pub output: PathBuf,

    /// Resolved output format
    pub format: OutputFormat,

    /// Request headers in order; duplicate names are kept
    pub headers: Vec<(String, String)>,

    /// Optional request body bytes
    pub body: Option<Vec<u8>>,

    /// Post-readiness delay in milliseconds
    pub delay_ms: u64,

    /// Maximum total wait in milliseconds (0 = unbounded)
    pub max_wait_ms: u64,

    /// Minimum viewport width in pixels
    pub min_width: u32,

    /// Minimum viewport height in pixels
    pub min_height: u32,

    /// Request high-quality painting hints
    pub smooth: bool,

    /// Suppress progress output
    pub silent: bool,

    /// Engine behavior settings
    pub settings: PageSettings,

    /// Alert string that preempts ordinary readiness when observed
    pub expected_alert: Option<String>,

    /// Script source injected on each page-context reset
    pub script_source: Option<String>,

    /// Property name exposed to page script for persisted state
    pub script_property: Option<String>,

    /// Log every alert string observed during the session
    pub debug_print_alerts: bool,
}

impl CaptureRequest {
    /// Start building a request for the given URL and output path
    pub fn builder(url: impl Into<String>, output: impl Into<PathBuf>) -> CaptureRequestBuilder {
        CaptureRequestBuilder::new(url, output)
    }
}

/// Builder for `CaptureRequest`
#[derive(Debug, Clone)]
pub struct CaptureRequestBuilder {
    url: String,
    output: PathBuf,
    format: Option<OutputFormat>,
    format_identifier: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    delay_ms: u64,
    max_wait_ms: u64,
    min_width: u32,
    min_height: u32,
    smooth: bool,
    silent: bool,
    settings: PageSettings,
    expected_alert: Option<String>,
    script_source: Option<String>,
    script_property: Option<String>,
    debug_print_alerts: bool,
}

impl CaptureRequestBuilder {
    fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        let defaults = config::get();
        Self {
            url: url.into(),
            output: output.into(),
            format: None,
            format_identifier: None,
            headers: Vec::new(),
            body: None,
            delay_ms: defaults.timing.delay_ms,
            max_wait_ms: defaults.timing.max_wait_ms,
            min_width: defaults.viewport.min_width,
            min_height: defaults.viewport.min_height,
            smooth: false,
            silent: false,
            settings: PageSettings::default(),
            expected_alert: None,
            script_source: None,
            script_property: None,
            debug_print_alerts: false,
        }
    }

    /// Override the format inferred from the output extension
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Override the format by CLI identifier; unknown identifiers fail at
    /// `build()`
    pub fn format_identifier(mut self, id: impl Into<String>) -> Self {
        self.format_identifier = Some(id.into());
        self
    }

    /// Append a request header. Repeatable; duplicate names are preserved in
    /// order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body bytes
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the post-readiness delay in milliseconds
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the maximum total wait in milliseconds (0 = unbounded)
    pub fn max_wait_ms(mut self, max_wait_ms: u64) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }

    /// Set the minimum viewport size in pixels
    pub fn min_size(mut self, width: u32, height: u32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    /// Request high-quality painting hints
    pub fn smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    /// Suppress progress output
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Set engine behavior settings
    pub fn settings(mut self, settings: PageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wait for `alert(string)` instead of ordinary readiness
    pub fn expected_alert(mut self, alert: impl Into<String>) -> Self {
        self.expected_alert = Some(alert.into());
        self
    }

    /// Script source re-injected on each page-context reset
    pub fn script_source(mut self, source: impl Into<String>) -> Self {
        self.script_source = Some(source.into());
        self
    }

    /// Property name exposed to page script for persisted state
    pub fn script_property(mut self, property: impl Into<String>) -> Self {
        self.script_property = Some(property.into());
        self
    }

    /// Log every alert string observed during the session
    pub fn debug_print_alerts(mut self, enabled: bool) -> Self {
        self.debug_print_alerts = enabled;
        self
    }

    /// Validate and produce the immutable request
    pub fn build(self) -> CaptureResult<CaptureRequest> {
        if self.url.is_empty() {
            return Err(CaptureError::Config("the target URL must not be empty".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(CaptureError::Config("the output path must not be empty".to_string()));
        }

        let format = match (self.format, &self.format_identifier) {
            (Some(format), _) => format,
            (None, Some(id)) => OutputFormat::from_identifier(id).ok_or_else(|| {
                CaptureError::Config(format!("unknown output format identifier '{}'", id))
            })?,
            (None, None) => OutputFormat::from_path(&self.output).ok_or_else(|| {
                CaptureError::Config(format!(
                    "cannot infer an output format from '{}'; use --out-format",
                    self.output.display()
                ))
            })?,
        };

        if !format.encoder_available() {
            return Err(CaptureError::Config(format!(
                "no encoder is available for the '{}' format",
                format.identifier()
            )));
        }

        let mut settings = self.settings;
        if settings.user_agent.is_none() {
            settings.user_agent = config::get().user_agent.clone();
        }

        Ok(CaptureRequest {
            url: self.url,
            output: self.output,
            format,
            headers: self.headers,
            body: self.body,
            delay_ms: self.delay_ms,
            max_wait_ms: self.max_wait_ms,
            min_width: self.min_width,
            min_height: self.min_height,
            smooth: self.smooth,
            silent: self.silent,
            settings,
            expected_alert: self.expected_alert,
            script_source: self.script_source,
            script_property: self.script_property,
            debug_print_alerts: self.debug_print_alerts,
        })
    }
}
