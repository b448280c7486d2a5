//! Escenario CLI: run browser scenarios against the demo storefront
//!
//! ## Usage
//!
//! ```bash
//! escenario run --headless              # Run every scenario in Chromium
//! escenario run --backend mock -t cart  # Run cart scenarios offline
//! escenario run --format json           # Machine-readable report
//! escenario list                        # Show scenarios and steps
//! escenario config -c escenario.yaml    # Print the effective config
//! ```

use clap::Parser;
use escenario_cli::{execute, init_logging, Cli, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}
