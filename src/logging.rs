use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Picks the default level when `RUST_LOG` is unset. The runner sets
/// `RUNNER_DEBUG=1` when step debug logging is enabled.
fn default_level(runner_debug: Option<&str>) -> Level {
    match runner_debug {
        Some("1") | Some("true") => Level::DEBUG,
        _ => Level::INFO,
    }
}

pub fn init() {
    let runner_debug = std::env::var("RUNNER_DEBUG").ok();
    let in_runner = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level(runner_debug.as_deref()).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(!in_runner)
        .with_target(false)
        .compact()
        .init();
}
