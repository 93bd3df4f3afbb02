//! Tracing setup for the CLI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level for the
/// hostbind crates (0 = info, 1 = debug, 2+ = trace).
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("warn,hostbind_gen={level},hostbind={level}"))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose > 0)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
