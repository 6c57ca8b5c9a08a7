use std::path::Path;

use crate::config::IncrementalConfig;
use crate::eval::{Decision, EvalContext};
use crate::paths;
use crate::state::ChangeState;
use crate::tool::Tool;

use super::Rule;
use super::versioning::find_commits;

/// Caps the number of distinct files modified between commits.
///
/// Modifications are counted once allowed; an allowed `git commit` starts
/// the count over.
#[derive(Debug, Clone)]
pub struct IncrementalRule {
    max_files: usize,
    warn_ratio: f64,
}

impl IncrementalRule {
    pub fn from_config(config: &IncrementalConfig) -> Self {
        Self {
            max_files: config.max_files,
            warn_ratio: config.warn_ratio,
        }
    }

    /// Judge a projected file count.
    pub fn check_count(&self, projected: usize) -> Decision {
        if projected > self.max_files {
            return Decision::deny(format!(
                "incremental limit reached: {projected} files modified since last commit (max {}). \
                 Commit the current changes before modifying more files.",
                self.max_files
            ));
        }
        if projected as f64 >= self.warn_ratio * self.max_files as f64 {
            return Decision::advise(format!(
                "approaching incremental limit: {projected}/{} files modified since last commit",
                self.max_files
            ));
        }
        Decision::allow()
    }
}

/// Normalize candidates so `src/a.rs` and `<cwd>/src/a.rs` count once.
fn normalized(paths: &[String], cwd: &Path) -> Vec<String> {
    paths
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| paths::relative_to(&paths::resolve(p, cwd), cwd))
        .collect()
}

fn load_state(cwd: &Path) -> ChangeState {
    ChangeState::load(cwd).unwrap_or_else(|e| {
        log::warn!("incremental: treating state in {} as empty: {e}", cwd.display());
        ChangeState::default()
    })
}

fn save_state(state: &ChangeState, cwd: &Path) {
    if let Err(e) = state.save(cwd) {
        log::warn!("incremental: cannot save state in {}: {e}", cwd.display());
    }
}

impl Rule for IncrementalRule {
    fn name(&self) -> &str {
        "incremental"
    }

    /// Bash is observed for commits, never judged.
    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_modification() || *tool == Tool::Bash
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        if !ctx.tool().is_modification() {
            return Decision::allow();
        }
        let state = load_state(ctx.working_dir());
        let projected = state.projected(&normalized(&ctx.paths, ctx.working_dir()));
        self.check_count(projected)
    }

    fn on_allowed(&self, ctx: &EvalContext) {
        let cwd = ctx.working_dir();
        if ctx.tool().is_modification() {
            let mut state = load_state(cwd);
            if state.record(normalized(&ctx.paths, cwd)) > 0 {
                save_state(&state, cwd);
            }
        } else if ctx.command().is_some_and(|cmd| !find_commits(cmd).is_empty()) {
            log::debug!("incremental: commit observed, resetting change count");
            let mut state = load_state(cwd);
            state.reset();
            save_state(&state, cwd);
        }
    }
}
