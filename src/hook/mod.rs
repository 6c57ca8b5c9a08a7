//! External hooks: user-configured processes consulted after the built-in
//! rules, speaking a small JSON protocol over stdin/stdout.

/// Process execution with timeout and `on_error` handling.
pub mod executor;
/// Tool/command/path filters deciding when a hook fires.
pub mod matcher;

pub use executor::{DEFAULT_TIMEOUT, HookInput, HookOutput};
pub use matcher::HookMatcher;

use crate::config::HookConfig;
use crate::eval::{Decision, EvalContext};
use crate::policy::Rule;
use crate::tool::Tool;

struct Hook {
    config: HookConfig,
    matcher: HookMatcher,
}

/// Runs every matching hook in configured order.
///
/// The first denial stops the run and carries the hook's name. Warnings
/// from the hooks that allowed are collected and joined.
pub struct HookRule {
    hooks: Vec<Hook>,
}

impl HookRule {
    pub fn from_config(hooks: &[HookConfig]) -> Self {
        Self {
            hooks: hooks
                .iter()
                .map(|config| Hook {
                    matcher: HookMatcher::from_config(config),
                    config: config.clone(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Rule for HookRule {
    fn name(&self) -> &str {
        "hooks"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_filesystem()
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        let tool_name = ctx.tool().name();
        let input = HookInput {
            tool_name,
            tool_input: &ctx.invocation.input,
            paths: &ctx.paths,
            working_dir: ctx.working_dir(),
        };

        let mut warnings = Vec::new();
        for hook in &self.hooks {
            if !hook.matcher.matches(tool_name, &ctx.paths, ctx.command()) {
                continue;
            }
            log::debug!("running hook {}", hook.config.name);
            match executor::execute(&hook.config, &input) {
                Decision::Deny { reason } => {
                    return Decision::deny(format!("{}: {reason}", hook.config.name));
                }
                Decision::Allow { warning: Some(w) } => {
                    warnings.push(format!("{}: {w}", hook.config.name));
                }
                Decision::Allow { warning: None } => {}
            }
        }

        if warnings.is_empty() {
            Decision::allow()
        } else {
            Decision::advise(warnings.join("; "))
        }
    }
}
