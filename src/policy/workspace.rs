use crate::config::WorkspaceConfig;
use crate::eval::{Decision, EvalContext};
use crate::paths;
use crate::pattern;
use crate::tool::Tool;

use super::Rule;
use super::protected::PROTECTED_FILES;

/// Confines path candidates to the working directory.
///
/// Absolute paths and parent traversal are denied unless an allow pattern
/// covers them. Block patterns win over allow patterns. The agent's own
/// operational directory (`~/.claude`) is reachable without configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceRule {
    allow: Vec<String>,
    block: Vec<String>,
}

impl WorkspaceRule {
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            allow: config.allow.clone(),
            block: config.block.clone(),
        }
    }

    /// Judge a single candidate.
    pub fn check(&self, candidate: &str) -> Decision {
        let expanded = paths::expand_full(candidate);
        let path = expanded.as_ref();

        if self.is_blocked(path) {
            return Decision::deny(format!("path is blocked by workspace configuration: {path}"));
        }
        if self.is_allowed(path) || is_claude_operational(path) {
            return Decision::allow();
        }
        if violates_boundary(path) {
            return Decision::deny(format!("path is outside the workspace: {path}"));
        }
        Decision::allow()
    }

    fn is_blocked(&self, path: &str) -> bool {
        self.block.iter().any(|p| matches_workspace_pattern(path, p))
    }

    fn is_allowed(&self, path: &str) -> bool {
        self.allow.iter().any(|p| matches_workspace_pattern(path, p))
    }
}

impl Rule for WorkspaceRule {
    fn name(&self) -> &str {
        "workspace"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_filesystem()
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        ctx.paths
            .iter()
            .map(|p| self.check(p))
            .find(Decision::is_denied)
            .unwrap_or_else(Decision::allow)
    }
}

/// A pattern ending in `/` covers that directory and everything below it.
/// Other patterns match as a glob or as a directory prefix.
fn matches_workspace_pattern(path: &str, pattern: &str) -> bool {
    let path = paths::clean(path);
    let pattern = paths::expand_tilde(pattern);
    if pattern.ends_with('/') {
        return paths::is_within(&path, &paths::clean(&pattern));
    }
    pattern::matches(&path, &pattern) || paths::is_within(&path, &paths::clean(&pattern))
}

/// True for absolute paths and paths that climb out of the working directory.
fn violates_boundary(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let cleaned = paths::clean(path);
    cleaned == ".." || cleaned.starts_with("../")
}

/// `~/.claude` and anything below it, except its credential and settings
/// files.
fn is_claude_operational(path: &str) -> bool {
    let root = paths::expand_tilde("~/.claude");
    if !root.starts_with('/') {
        return false;
    }
    let cleaned = paths::clean(path);
    if !paths::is_within(&cleaned, &root) {
        return false;
    }
    !PROTECTED_FILES
        .iter()
        .any(|file| cleaned == paths::clean(&paths::expand_tilde(file)))
}
