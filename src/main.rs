//! pacycle binary entry point.

use clap::Parser;
use color_eyre::eyre::Result;
use pacycle::commands::{self, CycleOptions};
use pacycle::{Args, Config};

/// Initialize logging to stderr, keeping stdout for the candidate listing.
///
/// The verbosity flags map to a level filter (0 uses the config file's
/// `log_level`, then info/debug/trace); `RUST_LOG` overrides everything.
fn init_logging(verbose: u8, config_level: &str) {
    let default = match verbose {
        0 => config_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config = Config::load()?;
    init_logging(args.verbose, &config.settings.log_level);

    let opts = CycleOptions::merge(&args, &config);
    commands::run_cycle(&opts)
}
