//! List command handler

use escenario::Suite;
use serde_json::json;

use super::select_suite;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{OutputFormat, ProgressReporter};
use crate::ListArgs;

/// Print the selected scenarios without running them
pub fn execute_list(config: &CliConfig, args: &ListArgs) -> CliResult<()> {
    let suite = select_suite(&args.select);
    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", render_json(&suite)?),
        OutputFormat::Text => {
            let reporter = ProgressReporter::new(config.color.should_color(), false);
            reporter.listing(&suite.scenarios().iter().collect::<Vec<_>>());
        }
    }
    Ok(())
}

/// Scenario names, tags and step labels as JSON
pub fn render_json(suite: &Suite) -> CliResult<String> {
    let scenarios: Vec<_> = suite
        .scenarios()
        .iter()
        .map(|s| {
            json!({
                "name": s.name(),
                "tags": s.tags(),
                "steps": s.steps().iter().map(escenario::Step::label).collect::<Vec<_>>(),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json!({
        "suite": suite.name(),
        "scenarios": scenarios,
    }))?)
}
