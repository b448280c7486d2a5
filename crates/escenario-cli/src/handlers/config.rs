//! Config command handler

use crate::config::build_runner_config;
use crate::error::CliResult;
use crate::ConfigArgs;

/// Print the effective runner configuration as YAML
pub fn execute_config(args: &ConfigArgs) -> CliResult<()> {
    print!("{}", render_config(args)?);
    Ok(())
}

/// Effective configuration rendered as YAML
pub fn render_config(args: &ConfigArgs) -> CliResult<String> {
    let config = build_runner_config(&args.overrides)?;
    Ok(config.to_yaml()?)
}
