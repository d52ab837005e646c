//! Experimental script injection bridge (cargo feature `script`).
//!
//! Re-injects user script on every page-context reset and keeps a
//! process-unique token under a configured window property so churn in the
//! script context can be told apart from a context that survived intact.
//! Injected script runs with full page privileges; this feature effectively
//! remote-controls the page and should be used with caution.

use serde_json::{json, Value};

use crate::engine::{EngineResult, PageEngine};
use crate::request::CaptureRequest;

/// Per-session injection state
#[derive(Debug, Clone)]
pub struct ScriptSession {
    property: String,
    source: String,
    token: Value,
}

impl ScriptSession {
    /// Build a session if the request configures a script property.
    /// The source may be empty; the token is still maintained so page script
    /// can use the property for its own state.
    pub fn from_request(request: &CaptureRequest) -> Option<Self> {
        let property = request.script_property.clone()?;
        Some(Self {
            property,
            source: request.script_source.clone().unwrap_or_default(),
            token: session_token(),
        })
    }

    /// The token this session installs under the configured property
    pub fn token(&self) -> &Value {
        &self.token
    }

    /// Handle a page-context reset: if the property no longer holds this
    /// session's token the context is fresh, so the token is re-installed
    /// and the script re-injected.
    pub async fn on_context_cleared<E: PageEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> EngineResult<()> {
        let current = engine
            .run_script(&format!("window.{}", self.property))
            .await?;
        if current == self.token {
            return Ok(());
        }

        log::debug!("script context reset, re-injecting under window.{}", self.property);
        engine
            .run_script(&format!("window.{} = {}", self.property, self.token))
            .await?;
        if !self.source.is_empty() {
            engine.run_script(&self.source).await?;
        }
        Ok(())
    }
}

/// A value no page script will hold by accident
fn session_token() -> Value {
    json!({
        "pagecapt": std::process::id(),
        "nonce": chrono::Utc::now().timestamp_millis(),
    })
}
