//! Command handlers, one module per subcommand

pub mod config;
pub mod list;
pub mod run;

pub use config::execute_config;
pub use list::execute_list;
pub use run::execute_run;

use escenario::{ScenarioFilter, Suite};

use crate::commands::SelectArgs;
use crate::storefront::storefront_suite;

/// Storefront scenarios matching `--filter` and `--tag`
#[must_use]
pub fn select_suite(select: &SelectArgs) -> Suite {
    let filter = ScenarioFilter {
        name: select.filter.clone(),
        tags: select.tags.clone(),
    };
    storefront_suite().filter(&filter)
}
