use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks info/debug/trace.
/// Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
