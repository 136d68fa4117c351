//! Browsable-API controls.
//!
//! Templates live next to this module as plain files and are compiled in with
//! `include_str!`. The `.html` template names turn on minijinja's HTML auto-escaping.

use minijinja::Environment;
use serde::Serialize;

pub const CONDITIONAL_TEMPLATE: &str = include_str!("templates/conditional.html");
pub const SEARCH_TEMPLATE: &str = include_str!("templates/search.html");

/// Render `source` registered under `name` with `context`.
pub(crate) fn render<T: Serialize>(
    name: &'static str,
    source: &'static str,
    context: &T,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    env.get_template(name)?.render(context)
}
