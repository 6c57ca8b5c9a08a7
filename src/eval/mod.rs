pub mod context;
pub mod decision;

pub use context::EvalContext;
pub use decision::Decision;

use crate::config::Config;
use crate::hook::HookRule;
use crate::policy::Rule;
use crate::policy::commands::CommandBlockRule;
use crate::policy::incremental::IncrementalRule;
use crate::policy::invariants::InvariantsRule;
use crate::policy::protected::ProtectedPathRule;
use crate::policy::scope::ScopeRule;
use crate::policy::versioning::VersioningRule;
use crate::policy::workspace::WorkspaceRule;
use crate::tool::ToolInvocation;

/// The ordered rule pipeline for one configuration.
pub struct Evaluator {
    tool_allow: Vec<String>,
    tool_block: Vec<String>,
    rules: Vec<Box<dyn Rule>>,
}

impl Evaluator {
    /// Build the pipeline from configuration.
    ///
    /// Order: command blocklist, protected paths, then the enabled rules
    /// (workspace, scope, versioning, incremental, invariants) and finally
    /// external hooks.
    pub fn from_config(config: &Config) -> Self {
        let mut rules: Vec<Box<dyn Rule>> = vec![
            Box::new(CommandBlockRule::from_config(&config.commands)),
            Box::new(ProtectedPathRule),
        ];

        let enabled = &config.rules;
        if enabled.workspace {
            rules.push(Box::new(WorkspaceRule::from_config(&config.workspace)));
        }
        if enabled.scope {
            rules.push(Box::new(ScopeRule::from_config(&config.scope)));
        }
        if enabled.versioning {
            rules.push(Box::new(VersioningRule::from_config(&config.versioning.commit)));
        }
        if enabled.incremental {
            rules.push(Box::new(IncrementalRule::from_config(&config.incremental)));
        }
        if enabled.invariants {
            rules.push(Box::new(InvariantsRule::from_config(&config.invariants)));
        }
        let hooks = HookRule::from_config(&config.hooks);
        if !hooks.is_empty() {
            rules.push(Box::new(hooks));
        }

        Self {
            tool_allow: config.tools.allow.clone(),
            tool_block: config.tools.block.clone(),
            rules,
        }
    }

    /// Names of the active rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate one invocation.
    pub fn evaluate(&self, invocation: &ToolInvocation) -> Decision {
        let name = invocation.tool.name();

        if self.tool_block.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            return Decision::deny(format!("tool is blocked by configuration: {name}"));
        }
        if !self.tool_allow.is_empty()
            && !self.tool_allow.iter().any(|t| t.eq_ignore_ascii_case(name))
        {
            return Decision::deny(format!("tool is not in allowed list: {name}"));
        }
        if !invocation.tool.is_filesystem() {
            return Decision::allow();
        }

        let ctx = EvalContext::new(invocation);
        let applicable: Vec<&dyn Rule> = self
            .rules
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| r.applies_to(&invocation.tool))
            .collect();

        let mut warnings = Vec::new();
        for rule in &applicable {
            match rule.evaluate(&ctx) {
                Decision::Deny { reason } => {
                    log::debug!("{} denied {name}: {reason}", rule.name());
                    return Decision::Deny { reason };
                }
                Decision::Allow { warning: Some(w) } => warnings.push(w),
                Decision::Allow { warning: None } => {}
            }
        }

        for rule in &applicable {
            rule.on_allowed(&ctx);
        }

        if warnings.is_empty() {
            Decision::allow()
        } else {
            Decision::advise(warnings.join("; "))
        }
    }
}
