use tracing_subscriber::EnvFilter;

/// Websocket internals log every frame at debug level.
const QUIET_CRATES: &str = ",tungstenite=warn,tokio_tungstenite=warn";

/// Build the filter directives for a configured level name.
///
/// Unknown names fall back to `info`.
pub fn directives(level: &str) -> String {
    let level = match level.trim().to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    format!("{level}{QUIET_CRATES}")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Installing twice is a no-op.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
