//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Escenario: run resilient browser scenarios against the demo storefront
#[derive(Parser, Debug)]
#[command(name = "escenario")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),

    /// Print the effective runner configuration as YAML
    Config(ConfigArgs),
}

/// Scenario selection shared by `run` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Only scenarios whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only scenarios carrying one of these tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Runner configuration sources shared by `run` and `config`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storefront base URL
    #[arg(long, env = "ESCENARIO_BASE_URL")]
    pub base_url: Option<String>,

    /// Element wait timeout in milliseconds
    #[arg(long, env = "ESCENARIO_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Per-scenario time budget in milliseconds
    #[arg(long)]
    pub scenario_timeout_ms: Option<u64>,

    /// Run Chromium without a window
    #[arg(long, env = "ESCENARIO_HEADLESS")]
    pub headless: bool,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium executable
    #[arg(long)]
    pub chromium_path: Option<PathBuf>,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// Configuration
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Browser backend
    #[arg(short, long, default_value = "chromium")]
    pub backend: Backend,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,

    /// Show what would run without launching a browser
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Browser backend
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Chromium over the DevTools protocol
    #[default]
    Chromium,
    /// Scripted in-memory storefront
    Mock,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

impl From<OutputFormatArg> for crate::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => Self::Text,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_verify_cli() {
            use clap::CommandFactory;
            Cli::command().debug_assert();
        }

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["escenario", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.backend, Backend::Chromium);
            assert_eq!(args.format, OutputFormatArg::Text);
            assert!(!args.dry_run);
            assert!(args.select.tags.is_empty());
        }

        #[test]
        fn test_run_all_flags() {
            let cli = Cli::try_parse_from([
                "escenario",
                "-vv",
                "run",
                "--backend",
                "mock",
                "--filter",
                "login",
                "--tag",
                "smoke",
                "--tag",
                "cart",
                "--format",
                "json",
                "--base-url",
                "https://shop.test/",
                "--timeout-ms",
                "2000",
                "--fail-fast",
                "--dry-run",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.backend, Backend::Mock);
            assert_eq!(args.select.filter.as_deref(), Some("login"));
            assert_eq!(args.select.tags, vec!["smoke", "cart"]);
            assert_eq!(args.overrides.timeout_ms, Some(2000));
            assert!(args.overrides.fail_fast);
            assert!(args.dry_run);
        }

        #[test]
        fn test_unknown_backend_rejected() {
            assert!(Cli::try_parse_from(["escenario", "run", "--backend", "firefox"]).is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["escenario"]).is_err());
        }
    }
}
