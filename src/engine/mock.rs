//! A scripted stand-in engine.
//!
//! `MockEngine` reports a preconfigured event sequence and paints flat-color
//! surfaces. It backs the test suite, and the binary uses it as the bundled
//! engine so the whole pipeline can be exercised without an embedded
//! browser; real deployments implement `PageEngine` themselves.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{
    ContentKind, EngineError, EngineEvent, EngineResult, PageEngine, PrintOptions, RenderSurface,
    Viewport,
};
use crate::request::{CaptureRequest, PageSettings};

/// An engine event scheduled relative to the previous one
#[derive(Debug, Clone)]
pub struct ScriptedEvent {
    /// Delay after the previous event, in milliseconds
    pub after_ms: u64,
    pub event: EngineEvent,
}

impl ScriptedEvent {
    /// Fire immediately after the previous event
    pub fn immediate(event: EngineEvent) -> Self {
        Self { after_ms: 0, event }
    }

    /// Fire `after_ms` milliseconds after the previous event
    pub fn after(after_ms: u64, event: EngineEvent) -> Self {
        Self { after_ms, event }
    }
}

/// Behavior of a `MockEngine`
#[derive(Debug, Clone)]
pub struct MockEngineConfig {
    /// Events emitted after `load`, in order
    pub events: Vec<ScriptedEvent>,
    /// Flat color every rendered surface is filled with
    pub surface_color: [u8; 3],
    /// Content returned for plain-text extraction
    pub plain_text: String,
    /// Content returned for HTML extraction
    pub html: String,
    /// Fail `render_surface` with this message
    pub fail_render: Option<String>,
    /// Fail `print_document` with this message
    pub fail_print: Option<String>,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            surface_color: [255, 255, 255],
            plain_text: String::new(),
            html: String::new(),
            fail_render: None,
            fail_print: None,
        }
    }
}

/// Scripted `PageEngine` implementation
pub struct MockEngine {
    config: MockEngineConfig,
    settings: Option<PageSettings>,
    loaded_url: Option<String>,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    script_slots: HashMap<String, Value>,
    script_log: Vec<String>,
}

impl MockEngine {
    pub fn new(config: MockEngineConfig) -> Self {
        Self {
            config,
            settings: None,
            loaded_url: None,
            events: None,
            script_slots: HashMap::new(),
            script_log: Vec::new(),
        }
    }

    /// An engine that reports readiness immediately at the given viewport
    pub fn ready_at(viewport: Viewport) -> Self {
        Self::new(MockEngineConfig {
            events: vec![
                ScriptedEvent::immediate(EngineEvent::GeometryChanged { viewport }),
                ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: true }),
            ],
            ..Default::default()
        })
    }

    /// An engine that never reports anything (a page that never completes)
    pub fn silent_page() -> Self {
        Self::new(MockEngineConfig::default())
    }

    /// Build a stand-in engine for a request.
    ///
    /// `file://` URLs are read from disk so content extraction returns the
    /// real file; a failed read is reported as `DocumentComplete { ok: false }`,
    /// which still satisfies readiness. Other schemes report an immediately
    /// ready blank page.
    pub fn for_request(request: &CaptureRequest) -> Self {
        let viewport = Viewport::new(request.min_width, request.min_height);
        let geometry = ScriptedEvent::immediate(EngineEvent::GeometryChanged { viewport });
        let mut config = MockEngineConfig::default();

        if let Some(path) = request.url.strip_prefix("file://") {
            match std::fs::read_to_string(path) {
                Ok(html) => {
                    config.plain_text = strip_markup(&html);
                    config.html = html;
                    config.events = vec![
                        geometry,
                        ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: true }),
                    ];
                }
                Err(err) => {
                    log::warn!("failed to read {}: {}", path, err);
                    config.events = vec![
                        geometry,
                        ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: false }),
                    ];
                }
            }
        } else {
            config.events = vec![
                geometry,
                ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: true }),
            ];
        }

        Self::new(config)
    }

    /// Scripts evaluated so far that were neither slot reads nor writes
    pub fn script_log(&self) -> &[String] {
        &self.script_log
    }

    /// The value stored under a script slot, if any
    pub fn script_slot(&self, name: &str) -> Option<&Value> {
        self.script_slots.get(name)
    }

    /// The settings applied by `configure`, if it ran
    pub fn settings(&self) -> Option<&PageSettings> {
        self.settings.as_ref()
    }
}

#[async_trait]
impl PageEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn configure(&mut self, settings: &PageSettings) -> EngineResult<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn load(&mut self, request: &CaptureRequest) -> EngineResult<()> {
        if request.url.is_empty() {
            return Err(EngineError::Load("empty URL".to_string()));
        }
        self.loaded_url = Some(request.url.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let events = self.config.events.clone();
        tokio::spawn(async move {
            for scripted in events {
                if scripted.after_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(scripted.after_ms)).await;
                }
                if tx.send(scripted.event).is_err() {
                    break;
                }
            }
        });
        self.events = Some(rx);
        Ok(())
    }

    fn take_events(&mut self) -> EngineResult<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events
            .take()
            .ok_or_else(|| EngineError::Load("no load in progress".to_string()))
    }

    async fn render_surface(
        &mut self,
        viewport: Viewport,
        _smooth: bool,
    ) -> EngineResult<RenderSurface> {
        if let Some(msg) = &self.config.fail_render {
            return Err(EngineError::Render(msg.clone()));
        }
        Ok(RenderSurface::with_color(viewport, self.config.surface_color))
    }

    async fn print_document(&mut self, path: &Path, options: &PrintOptions) -> EngineResult<()> {
        if let Some(msg) = &self.config.fail_print {
            return Err(EngineError::Print(msg.clone()));
        }
        let postscript = path.extension().is_some_and(|ext| ext == "ps");
        let body = if postscript {
            format!(
                "%!PS-Adobe-3.0\n%%Pages: 1\n%%Title: mock print ({}mm x {}mm)\n%%EOF\n",
                options.page_width_mm, options.page_height_mm
            )
        } else {
            format!(
                "%PDF-1.4\n% mock print ({}mm x {}mm, backgrounds: {})\n%%EOF\n",
                options.page_width_mm, options.page_height_mm, options.print_backgrounds
            )
        };
        std::fs::write(path, body)?;
        Ok(())
    }

    async fn extract_content(&mut self, kind: ContentKind) -> EngineResult<String> {
        Ok(match kind {
            ContentKind::PlainText => self.config.plain_text.clone(),
            ContentKind::Html => self.config.html.clone(),
        })
    }

    async fn run_script(&mut self, source: &str) -> EngineResult<Value> {
        // Slot assignment: "<target> = <json>"
        if let Some((target, value)) = source.split_once(" = ") {
            let parsed =
                serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
            self.script_slots.insert(target.trim().to_string(), parsed);
            return Ok(Value::Null);
        }
        // Slot read
        if let Some(value) = self.script_slots.get(source.trim()) {
            return Ok(value.clone());
        }
        self.script_log.push(source.to_string());
        Ok(Value::Null)
    }
}

/// Very rough tag stripping for the stand-in's plain-text extraction
fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> CaptureRequest {
        CaptureRequest::builder(url, "out.png").build().unwrap()
    }

    #[tokio::test]
    async fn test_scripted_events_arrive_in_order() {
        let viewport = Viewport::new(800, 600);
        let mut engine = MockEngine::ready_at(viewport);
        engine.load(&request("http://example.org/")).unwrap();
        let mut events = engine.take_events().unwrap();

        assert_eq!(
            events.recv().await,
            Some(EngineEvent::GeometryChanged { viewport })
        );
        assert_eq!(
            events.recv().await,
            Some(EngineEvent::DocumentComplete { ok: true })
        );
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn test_silent_page_emits_nothing() {
        let mut engine = MockEngine::silent_page();
        engine.load(&request("http://example.org/")).unwrap();
        let mut events = engine.take_events().unwrap();
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn test_take_events_requires_load() {
        let mut engine = MockEngine::silent_page();
        assert!(engine.take_events().is_err());
    }

    #[tokio::test]
    async fn test_render_surface_uses_configured_color() {
        let mut engine = MockEngine::new(MockEngineConfig {
            surface_color: [10, 20, 30],
            ..Default::default()
        });
        let surface = engine
            .render_surface(Viewport::new(4, 4), false)
            .await
            .unwrap();
        assert_eq!(surface.get_pixel(2, 2), [10, 20, 30]);
    }

    #[tokio::test]
    async fn test_script_slots() {
        let mut engine = MockEngine::silent_page();
        assert_eq!(
            engine.run_script("window.state").await.unwrap(),
            Value::Null
        );
        engine.run_script("window.state = {\"n\": 1}").await.unwrap();
        assert_eq!(
            engine.run_script("window.state").await.unwrap(),
            serde_json::json!({"n": 1})
        );
        engine.run_script("console.log('hi')").await.unwrap();
        assert_eq!(engine.script_log(), ["console.log('hi')"]);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("<html><body><p>Hello,\n  world</p></body></html>"),
            "Hello, world"
        );
        assert_eq!(strip_markup("no tags"), "no tags");
    }
}
