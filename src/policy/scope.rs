use std::path::Path;

use crate::config::ScopeConfig;
use crate::eval::{Decision, EvalContext};
use crate::paths;
use crate::pattern;
use crate::tool::Tool;

use super::Rule;

/// Limits which files modification tools may touch.
#[derive(Debug, Clone, Default)]
pub struct ScopeRule {
    allow: Vec<String>,
    block: Vec<String>,
}

impl ScopeRule {
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self {
            allow: config.allow.clone(),
            block: config.block.clone(),
        }
    }

    /// Judge one path. It is matched both as given and relative to `cwd`,
    /// so `/work/repo/src/main.go` and `src/main.go` are the same file.
    pub fn check(&self, path: &str, cwd: &Path) -> Decision {
        let relative = paths::relative_to(path, cwd);
        let forms = [path, relative.as_str()];

        if forms.iter().any(|p| pattern::match_any(p, &self.block)) {
            return Decision::deny(format!("path is blocked by scope configuration: {path}"));
        }
        if !self.allow.is_empty() && !forms.iter().any(|p| pattern::match_any(p, &self.allow)) {
            return Decision::deny(format!("path is outside allowed scope: {path}"));
        }
        Decision::allow()
    }
}

impl Rule for ScopeRule {
    fn name(&self) -> &str {
        "scope"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_modification()
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        ctx.paths
            .iter()
            .map(|p| self.check(p, ctx.working_dir()))
            .find(Decision::is_denied)
            .unwrap_or_else(Decision::allow)
    }
}
