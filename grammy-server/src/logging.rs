use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over `-v`.
pub fn setup_logging(verbose: u8) {
    // Request spans from the trace layer are emitted at debug.
    let default = match verbose {
        0 => "info,tower_http=debug",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
