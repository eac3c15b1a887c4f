use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `local` gets compact human-readable output at debug level, every other
/// environment JSON at info. `RUST_LOG` overrides the level in both cases.
pub fn init(env: &str) {
    let (default_level, json) = match env {
        "local" => ("debug", false),
        _ => ("info", true),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
