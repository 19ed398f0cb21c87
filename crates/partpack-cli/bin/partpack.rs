//! partpack binary entry point.
//!
//! Thin wrapper around the partpack-cli library: parse arguments,
//! initialize logging, validate, then dispatch.

use anyhow::Result;
use partpack_cli::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // RUST_LOG wins over --verbose
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.validate()?;

    let mut stdout = std::io::stdout().lock();
    run(&cli, &mut stdout)
}
