//! cc-warden: a PreToolUse hook for Claude Code that gates every tool call.
//!
//! Each proposed action (a shell command, a file read, write or edit, a
//! search) is evaluated against a layered policy and answered with
//! [`eval::Decision::Allow`] (optionally carrying a warning) or
//! [`eval::Decision::Deny`] with a reason.
//!
//! # Architecture
//!
//! - **[`parse`]**: heredoc stripping, shlex tokenizer, compound-command splitter.
//! - **[`pattern`]**: glob matching with single-segment wildcards and `**`.
//! - **[`tool`]**: the closed tool set and per-tool path extraction.
//! - **[`policy`]**: the protected-path guard and the configurable rules.
//! - **[`hook`]**: external hook processes with timeouts.
//! - **[`eval`]**: the ordered pipeline and decision type.
//! - **[`config`]**: embedded defaults plus user and project overlays.
//! - **[`state`]**: the incremental rule's change counter.
//! - **[`logging`]**: decision logging to `~/.local/share/cc-warden/decisions.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types.
pub mod error;
/// Evaluation pipeline and decision type.
pub mod eval;
/// External hook matching and execution.
pub mod hook;
/// File-based decision logging.
pub mod logging;
/// Shell command parsing: heredocs, tokenizer, compound splitter.
pub mod parse;
/// Lexical path helpers.
pub mod paths;
/// Glob matching.
pub mod pattern;
/// Policy rules and the protected-path guard.
pub mod policy;
/// Incremental change-count state file.
pub mod state;
/// Tool enumeration and path extraction.
pub mod tool;

use std::path::Path;

use eval::Decision;

/// Build an evaluator from the default config and evaluate one tool call.
///
/// This is the main entry point for tests and simple usage.
/// For CLI usage with user and project overlays, load the config and build
/// the evaluator directly.
pub fn evaluate(tool_name: &str, tool_input: serde_json::Value, working_dir: &Path) -> Decision {
    let config = config::Config::default_config();
    let evaluator = eval::Evaluator::from_config(&config);
    let input = match tool_input {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    evaluator.evaluate(&tool::ToolInvocation::new(tool_name, input, working_dir))
}
