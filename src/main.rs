use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use pagecapt::capture::{CaptureError, CaptureOutcome};
use pagecapt::config;
use pagecapt::engine::MockEngine;
use pagecapt::format::OutputFormat;
use pagecapt::request::{CaptureRequest, PageSettings};
use pagecapt::runner::run_capture;

/// pagecapt - capture a web page to an image, document, or text file
#[derive(Parser, Debug)]
#[command(
    name = "pagecapt",
    version,
    about = "Capture a rendered web page to one of 14 output formats",
    after_help = "ENVIRONMENT VARIABLES:\n\
        PAGECAPT_MAX_WAIT      Maximum total wait in ms, 0 = unbounded\n\
        PAGECAPT_DELAY         Post-readiness delay in ms\n\
        PAGECAPT_MIN_WIDTH     Minimum viewport width in pixels\n\
        PAGECAPT_MIN_HEIGHT    Minimum viewport height in pixels\n\
        PAGECAPT_USER_AGENT    User-Agent header override"
)]
struct Args {
    /// URL to capture
    #[arg(long)]
    url: String,

    /// Output file path
    #[arg(long)]
    out: PathBuf,

    /// Output format: svg, pdf, ps, itext, html, png, jpeg, mng, tiff, gif,
    /// bmp, ppm, xbm, xpm (default: inferred from the output extension)
    #[arg(long)]
    out_format: Option<String>,

    /// Delay between page readiness and capture, in milliseconds
    #[arg(long, env = config::ENV_DELAY, default_value_t = config::DEFAULT_DELAY_MS)]
    delay: u64,

    /// Maximum total wait in milliseconds before a forced capture (0 = unbounded)
    #[arg(long, env = config::ENV_MAX_WAIT, default_value_t = config::DEFAULT_MAX_WAIT_MS)]
    max_wait: u64,

    /// Minimum viewport width in pixels
    #[arg(long, env = config::ENV_MIN_WIDTH, default_value_t = config::DEFAULT_MIN_WIDTH)]
    min_width: u32,

    /// Minimum viewport height in pixels
    #[arg(long, env = config::ENV_MIN_HEIGHT, default_value_t = config::DEFAULT_MIN_HEIGHT)]
    min_height: u32,

    /// Extra request header as "Name: Value" (repeatable, duplicates kept)
    #[arg(long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Request body as a literal string (switches the request to POST)
    #[arg(long, overrides_with = "body_base64")]
    body_string: Option<String>,

    /// Request body as base64-encoded bytes (switches the request to POST)
    #[arg(long, overrides_with = "body_string")]
    body_base64: Option<String>,

    /// Render with high-quality painting hints
    #[arg(long)]
    smooth: bool,

    /// Capture when the page raises alert() with exactly this string,
    /// instead of waiting for ordinary readiness
    #[arg(long, value_name = "STRING")]
    expect_alert: Option<String>,

    /// JavaScript execution: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    javascript: Option<bool>,

    /// Plugin execution: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    plugins: Option<bool>,

    /// Automatic image loading: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    auto_load_images: Option<bool>,

    /// Allow page script to open windows: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    js_can_open_windows: Option<bool>,

    /// Allow page script to access the clipboard: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    js_can_access_clipboard: Option<bool>,

    /// Include links in the tab focus chain: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    links_included_in_focus_chain: Option<bool>,

    /// Print element backgrounds in paginated output: on or off
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    print_backgrounds: Option<bool>,

    /// Page zoom factor (1.0 = no zoom)
    #[arg(long)]
    zoom_factor: Option<f64>,

    /// Ignore TLS certificate errors
    #[arg(long)]
    insecure: bool,

    /// User-Agent header override
    #[arg(long, env = config::ENV_USER_AGENT)]
    user_agent: Option<String>,

    /// Application name reported in the default User-Agent
    #[arg(long)]
    app_name: Option<String>,

    /// Application version reported in the default User-Agent
    #[arg(long)]
    app_version: Option<String>,

    /// Path to a script injected on every page-context reset
    #[cfg(feature = "script")]
    #[arg(long, value_name = "PATH")]
    inject_script: Option<PathBuf>,

    /// Window property name exposed to page script for persisted state
    #[cfg(feature = "script")]
    #[arg(long, value_name = "NAME")]
    script_object: Option<String>,

    /// Log every alert() string observed during the session
    #[cfg(feature = "script")]
    #[arg(long)]
    debug_print_alerts: bool,

    /// Suppress progress output
    #[arg(long)]
    silent: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse an on/off toggle value
fn parse_toggle(value: &str) -> Result<bool, String> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{}'", other)),
    }
}

/// Parse a "Name: Value" header argument
fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, rest) = value
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: Value', got '{}'", value))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", value));
    }
    Ok((name.to_string(), rest.trim_start().to_string()))
}

fn init_logging(silent: bool, verbose: u8) {
    let level = if silent {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    // RUST_LOG still takes precedence when set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .init();
}

fn build_request(args: &Args) -> Result<CaptureRequest, CaptureError> {
    let settings = PageSettings {
        javascript: args.javascript,
        plugins: args.plugins,
        auto_load_images: args.auto_load_images,
        js_can_open_windows: args.js_can_open_windows,
        js_can_access_clipboard: args.js_can_access_clipboard,
        links_included_in_focus_chain: args.links_included_in_focus_chain,
        print_backgrounds: args.print_backgrounds,
        zoom_factor: args.zoom_factor,
        insecure: args.insecure,
        user_agent: args.user_agent.clone(),
        app_name: args.app_name.clone(),
        app_version: args.app_version.clone(),
    };

    let mut builder = CaptureRequest::builder(&args.url, &args.out)
        .delay_ms(args.delay)
        .max_wait_ms(args.max_wait)
        .min_size(args.min_width, args.min_height)
        .smooth(args.smooth)
        .silent(args.silent)
        .settings(settings);

    if let Some(id) = &args.out_format {
        builder = builder.format_identifier(id);
    }
    for (name, value) in &args.headers {
        builder = builder.header(name, value);
    }
    if let Some(body) = &args.body_string {
        builder = builder.body(body.clone().into_bytes());
    } else if let Some(encoded) = &args.body_base64 {
        use base64::Engine as _;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CaptureError::Config(format!("invalid base64 request body: {}", e)))?;
        builder = builder.body(bytes);
    }
    if let Some(alert) = &args.expect_alert {
        builder = builder.expected_alert(alert);
    }

    #[cfg(feature = "script")]
    {
        if let Some(path) = &args.inject_script {
            let source = std::fs::read_to_string(path).map_err(|e| {
                CaptureError::Config(format!("cannot read script '{}': {}", path.display(), e))
            })?;
            builder = builder.script_source(source);
        }
        if let Some(property) = &args.script_object {
            builder = builder.script_property(property);
        }
        builder = builder.debug_print_alerts(args.debug_print_alerts);
    }

    builder.build()
}

fn report_outcome(outcome: &CaptureOutcome) {
    println!("Captured {} -> {}", outcome.format.identifier(), outcome.output.display());
    if let (Some(width), Some(height)) = (outcome.width, outcome.height) {
        println!("  Size: {}x{}", width, height);
    }
    println!("  Trigger: {:?}, elapsed: {}ms", outcome.trigger, outcome.elapsed_ms);
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.silent, args.verbose);

    let request = match build_request(&args) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("error: {}", err);
            if matches!(err, CaptureError::Config(_)) {
                eprintln!(
                    "supported formats: {}",
                    OutputFormat::identifiers().collect::<Vec<_>>().join(", ")
                );
                eprintln!("{}", Args::command().render_usage());
            }
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = MockEngine::for_request(&request);
    match runtime.block_on(run_capture(&mut engine, &request)) {
        Ok(outcome) => {
            if !args.silent {
                report_outcome(&outcome);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle() {
        assert_eq!(parse_toggle("on"), Ok(true));
        assert_eq!(parse_toggle("off"), Ok(false));
        assert!(parse_toggle("yes").is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Cookie: a=1"),
            Ok(("Cookie".to_string(), "a=1".to_string()))
        );
        assert_eq!(
            parse_header("X-Empty:"),
            Ok(("X-Empty".to_string(), String::new()))
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::try_parse_from(["pagecapt", "--url", "http://example.org/", "--out", "x.png"])
            .unwrap();
        assert_eq!(args.url, "http://example.org/");
        assert!(args.out_format.is_none());
    }

    #[test]
    fn test_focus_chain_toggle_forwarded_to_settings() {
        let args = Args::try_parse_from([
            "pagecapt",
            "--url",
            "http://example.org/",
            "--out",
            "x.png",
            "--links-included-in-focus-chain",
            "off",
        ])
        .unwrap();
        assert_eq!(args.links_included_in_focus_chain, Some(false));

        let request = build_request(&args).unwrap();
        assert_eq!(request.settings.links_included_in_focus_chain, Some(false));
        assert!(request.settings.javascript.is_none());
    }

    #[test]
    fn test_usage_names_required_flags() {
        let usage = Args::command().render_usage().to_string();
        assert!(usage.contains("--url"));
        assert!(usage.contains("--out"));
    }

    #[test]
    fn test_last_body_flag_wins() {
        let args = Args::try_parse_from([
            "pagecapt",
            "--url",
            "http://example.org/",
            "--out",
            "x.png",
            "--body-string",
            "a=1",
            "--body-base64",
            "YT0x",
        ])
        .unwrap();
        assert!(args.body_string.is_none());
        assert_eq!(args.body_base64.as_deref(), Some("YT0x"));
    }
}
