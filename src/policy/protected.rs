//! Paths no configuration can unlock.
//!
//! Credential stores, the agent's own credentials and settings, and
//! cc-warden's policy, state and binary. An agent that could edit its own
//! policy would not be governed by it.

use std::path::Path;

use crate::eval::{Decision, EvalContext};
use crate::paths;
use crate::tool::Tool;

use super::Rule;

/// Directories protected together with everything below them.
const PROTECTED_DIRS: &[&str] = &[
    "~/.ssh",
    "~/.aws",
    "~/.gnupg",
    "~/.gpg",
    "~/.config/gh",
    "~/.config/gcloud",
    "~/.azure",
    "~/.config/cc-warden",
];

/// Individual protected files.
pub(crate) const PROTECTED_FILES: &[&str] = &[
    "~/.claude/.credentials.json",
    "~/.claude/settings.json",
    "~/.claude/settings.local.json",
    "~/.netrc",
    "~/.git-credentials",
    "~/.cargo/bin/cc-warden",
];

/// File names protected in every directory.
const PROTECTED_NAMES: &[&str] = &[
    crate::config::LOCAL_CONFIG_FILE,
    crate::state::STATE_FILE,
];

const DENY_REASON: &str =
    "path is protected and cannot be accessed. User must perform this action manually.";

/// Check a path against the protected set, resolving relative paths
/// against the process working directory.
pub fn is_always_protected(path: &str) -> bool {
    let cwd = std::env::current_dir().unwrap_or_else(|_| "/".into());
    is_protected_in(path, &cwd)
}

/// Check a path against the protected set, resolving relative paths
/// against `cwd`.
pub fn is_protected_in(path: &str, cwd: &Path) -> bool {
    if path.is_empty() {
        return false;
    }
    let resolved = paths::resolve(path, cwd);

    let name = paths::base_name(&resolved);
    if PROTECTED_NAMES.contains(&name) {
        return true;
    }

    PROTECTED_DIRS
        .iter()
        .any(|dir| paths::is_within(&resolved, &paths::clean(&paths::expand_tilde(dir))))
        || PROTECTED_FILES
            .iter()
            .any(|file| resolved == paths::clean(&paths::expand_tilde(file)))
}

/// Denies any invocation whose paths touch the protected set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtectedPathRule;

impl Rule for ProtectedPathRule {
    fn name(&self) -> &str {
        "protected"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_filesystem()
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        match ctx.paths.iter().find(|p| is_protected_in(p, ctx.working_dir())) {
            Some(path) => {
                log::debug!("protected path touched: {path}");
                Decision::deny(DENY_REASON)
            }
            None => Decision::allow(),
        }
    }
}
