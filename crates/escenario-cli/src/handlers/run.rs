//! Run command handler

use escenario::mock::MockLauncher;
use escenario::{DriverLauncher, Runner, RunnerConfig, Suite, SuiteReport};
use std::sync::Arc;

use super::select_suite;
use crate::commands::Backend;
use crate::config::{build_runner_config, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::{render_listing, OutputFormat, ProgressReporter};
use crate::storefront::{mock_storefront, DEFAULT_BASE_URL};
use crate::RunArgs;

/// Run the selected scenarios; `Ok(false)` when any failed or was skipped
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let runner_config = build_runner_config(&args.overrides)?;
    let suite = select_suite(&args.select);
    if suite.is_empty() {
        return Err(CliError::invalid_argument(
            "no scenarios match the given --filter/--tag",
        ));
    }

    if args.dry_run {
        print_plan(&suite, &runner_config, args.backend);
        return Ok(true);
    }

    let launcher = launcher_for(args.backend, &runner_config)?;
    let format = OutputFormat::from(args.format);
    let mut reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet() || format == OutputFormat::Json,
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("failed to start tokio runtime: {e}")))?;

    tracing::info!(
        scenarios = suite.len(),
        backend = ?args.backend,
        "starting run"
    );
    reporter.start_progress(suite.len(), suite.name());
    let report = runtime.block_on(run_suite(launcher, runner_config, &suite));
    reporter.finish();

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => reporter.suite(&report),
    }
    Ok(report.all_passed())
}

async fn run_suite(launcher: Arc<dyn DriverLauncher>, config: RunnerConfig, suite: &Suite) -> SuiteReport {
    Runner::new(launcher, config).run_suite(suite).await
}

/// Driver launcher for the chosen backend
pub fn launcher_for(backend: Backend, config: &RunnerConfig) -> CliResult<Arc<dyn DriverLauncher>> {
    match backend {
        Backend::Mock => {
            let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
            Ok(Arc::new(MockLauncher::new(mock_storefront(base)?)))
        }
        #[cfg(feature = "browser")]
        Backend::Chromium => Ok(Arc::new(escenario::ChromiumLauncher::new(
            config.browser.clone(),
        ))),
        #[cfg(not(feature = "browser"))]
        Backend::Chromium => Err(CliError::config(
            "chromium backend not enabled. Rebuild with --features browser",
        )),
    }
}

fn print_plan(suite: &Suite, config: &RunnerConfig, backend: Backend) {
    println!(
        "Would run {} scenario(s) on {:?} against {}",
        suite.len(),
        backend,
        config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    );
    for scenario in suite.scenarios() {
        println!("{}", render_listing(scenario));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::{ConfigOverrides, OutputFormatArg, SelectArgs};
    use crate::config::{ColorChoice, Verbosity};

    fn args(select: SelectArgs, dry_run: bool) -> RunArgs {
        RunArgs {
            select,
            overrides: ConfigOverrides {
                base_url: Some("https://shop.test/".into()),
                timeout_ms: Some(2000),
                ..ConfigOverrides::default()
            },
            backend: Backend::Mock,
            format: OutputFormatArg::Json,
            dry_run,
        }
    }

    fn quiet() -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    #[test]
    fn test_mock_run_passes() {
        let select = SelectArgs {
            filter: Some("login".into()),
            tags: vec![],
        };
        assert!(execute_run(&quiet(), &args(select, false)).unwrap());
    }

    #[test]
    fn test_dry_run_launches_nothing() {
        let mut run_args = args(SelectArgs::default(), true);
        run_args.backend = Backend::Chromium;
        assert!(execute_run(&quiet(), &run_args).unwrap());
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let select = SelectArgs {
            filter: Some("checkout".into()),
            tags: vec![],
        };
        let err = execute_run(&quiet(), &args(select, false)).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_mock_launcher_uses_base_url() {
        let config = RunnerConfig::new().with_base_url("https://shop.test/");
        assert!(launcher_for(Backend::Mock, &config).is_ok());
    }
}
