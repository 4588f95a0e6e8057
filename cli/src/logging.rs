use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Filter comes from `RUST_LOG` (default
/// `warn`), output goes to stderr so `--json` stdout stays clean.
/// `PREP_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if std::env::var("PREP_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
