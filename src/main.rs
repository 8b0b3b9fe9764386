// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand the run
//   configuration to the UI layer.
// - Any failure ends up here and becomes a non-zero exit status.

use std::process::ExitCode;

use auth0_user_creator::{cli::Cli, ui};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = cli
        .into_config()
        .map_err(anyhow::Error::from)
        .and_then(ui::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug output for this
/// crate when `--debug` is set.
fn init_tracing(debug: bool) {
    let default = if debug {
        "auth0_user_creator=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
