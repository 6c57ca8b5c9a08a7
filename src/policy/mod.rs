//! Policy rules: each one judges an invocation and may deny it.
//!
//! Rules run in a fixed order behind the tool allow/block lists. The
//! protected-path guard always runs; the others are switched on under
//! `[rules]` in the configuration.

/// Substring blocklist for Bash commands.
pub mod commands;
/// File-count budget between commits.
pub mod incremental;
/// Declarative structural checks on modified files.
pub mod invariants;
/// Hardcoded credential and self-protection guard.
pub mod protected;
/// Glob allow/block lists for modified files.
pub mod scope;
/// Commit message format checks.
pub mod versioning;
/// Confinement to the working directory.
pub mod workspace;

use crate::eval::{Decision, EvalContext};
use crate::tool::Tool;

/// A single policy rule.
pub trait Rule: Send + Sync {
    /// Short rule name, used in logs.
    fn name(&self) -> &str;

    /// Whether the rule has anything to say about this tool.
    fn applies_to(&self, tool: &Tool) -> bool;

    /// Judge the invocation.
    fn evaluate(&self, ctx: &EvalContext) -> Decision;

    /// Called once the whole pipeline allowed the invocation.
    fn on_allowed(&self, _ctx: &EvalContext) {}
}

/// Compile a regex, logging and discarding it when invalid.
///
/// An invalid pattern disables only the check that owns it.
pub(crate) fn compile_regex(what: &str, pattern: &str) -> Option<regex::Regex> {
    match regex::Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("{what}: ignoring invalid regex {pattern:?}: {e}");
            None
        }
    }
}
