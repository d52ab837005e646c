//! Configuration defaults with environment variable support.
//!
//! Every timing and viewport default can be overridden through the
//! environment; command-line flags take precedence over both.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PAGECAPT_MAX_WAIT` | Maximum total wait in ms (0 = unbounded) | `90000` |
//! | `PAGECAPT_DELAY` | Post-readiness delay in ms | `0` |
//! | `PAGECAPT_MIN_WIDTH` | Minimum viewport width in pixels | `800` |
//! | `PAGECAPT_MIN_HEIGHT` | Minimum viewport height in pixels | `600` |
//! | `PAGECAPT_USER_AGENT` | User-Agent header override | engine default |

use once_cell::sync::OnceCell;
use std::env;

// ============================================================================
// Default Values
// ============================================================================

/// Default maximum total wait before a forced capture (milliseconds)
pub const DEFAULT_MAX_WAIT_MS: u64 = 90_000;

/// Default post-readiness delay (milliseconds)
pub const DEFAULT_DELAY_MS: u64 = 0;

/// Default minimum viewport width (pixels)
pub const DEFAULT_MIN_WIDTH: u32 = 800;

/// Default minimum viewport height (pixels)
pub const DEFAULT_MIN_HEIGHT: u32 = 600;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the maximum total wait
pub const ENV_MAX_WAIT: &str = "PAGECAPT_MAX_WAIT";

/// Environment variable for the post-readiness delay
pub const ENV_DELAY: &str = "PAGECAPT_DELAY";

/// Environment variable for the minimum viewport width
pub const ENV_MIN_WIDTH: &str = "PAGECAPT_MIN_WIDTH";

/// Environment variable for the minimum viewport height
pub const ENV_MIN_HEIGHT: &str = "PAGECAPT_MIN_HEIGHT";

/// Environment variable for the User-Agent override
pub const ENV_USER_AGENT: &str = "PAGECAPT_USER_AGENT";

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Resolved configuration defaults
#[derive(Debug, Clone)]
pub struct Config {
    /// Timing defaults
    pub timing: TimingSettings,
    /// Viewport defaults
    pub viewport: ViewportSettings,
    /// User-Agent override, if any
    pub user_agent: Option<String>,
}

/// Timeout and delay defaults
#[derive(Debug, Clone)]
pub struct TimingSettings {
    /// Maximum total wait in milliseconds (0 = unbounded)
    pub max_wait_ms: u64,
    /// Post-readiness delay in milliseconds
    pub delay_ms: u64,
}

/// Minimum viewport defaults
#[derive(Debug, Clone)]
pub struct ViewportSettings {
    /// Minimum width in pixels
    pub min_width: u32,
    /// Minimum height in pixels
    pub min_height: u32,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            timing: TimingSettings {
                max_wait_ms: env_parsed(ENV_MAX_WAIT, DEFAULT_MAX_WAIT_MS),
                delay_ms: env_parsed(ENV_DELAY, DEFAULT_DELAY_MS),
            },
            viewport: ViewportSettings {
                min_width: env_parsed(ENV_MIN_WIDTH, DEFAULT_MIN_WIDTH),
                min_height: env_parsed(ENV_MIN_HEIGHT, DEFAULT_MIN_HEIGHT),
            },
            user_agent: env::var(ENV_USER_AGENT).ok(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            timing: TimingSettings {
                max_wait_ms: DEFAULT_MAX_WAIT_MS,
                delay_ms: DEFAULT_DELAY_MS,
            },
            viewport: ViewportSettings {
                min_width: DEFAULT_MIN_WIDTH,
                min_height: DEFAULT_MIN_HEIGHT,
            },
            user_agent: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Read an environment variable and parse it, falling back on absence or
/// parse failure
fn env_parsed<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}
