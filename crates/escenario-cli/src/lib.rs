//! Escenario CLI Library
//!
//! Command-line front end for the Escenario scenario runner, bundled with
//! the demo storefront suite.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;
pub mod storefront;

pub use commands::{
    Backend, Cli, ColorArg, Commands, ConfigArgs, ConfigOverrides, ListArgs, OutputFormatArg,
    RunArgs, SelectArgs,
};
pub use config::{build_runner_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{OutputFormat, ProgressReporter};

/// Presentation settings from the global flags
#[must_use]
pub fn cli_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
}

/// Dispatch a parsed command line; `Ok(false)` means scenarios failed
pub fn execute(cli: &Cli) -> CliResult<bool> {
    let config = cli_config(cli);
    match &cli.command {
        Commands::Run(args) => handlers::execute_run(&config, args),
        Commands::List(args) => handlers::execute_list(&config, args).map(|()| true),
        Commands::Config(args) => handlers::execute_config(args).map(|()| true),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::try_parse_from(["escenario", "-v", "--color", "never", "list"]).unwrap();
        let config = cli_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert_eq!(config.color, ColorChoice::Never);
    }

    #[test]
    fn test_execute_config_and_list() {
        let cli = Cli::try_parse_from(["escenario", "-q", "config"]).unwrap();
        assert!(execute(&cli).unwrap());
        let cli = Cli::try_parse_from(["escenario", "list", "--format", "json"]).unwrap();
        assert!(execute(&cli).unwrap());
    }
}
