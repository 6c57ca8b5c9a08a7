use crate::config::CommandsConfig;
use crate::eval::{Decision, EvalContext};
use crate::tool::Tool;

use super::Rule;

/// Denies Bash commands containing a configured substring.
#[derive(Debug, Clone)]
pub struct CommandBlockRule {
    block: Vec<String>,
}

impl CommandBlockRule {
    pub fn from_config(config: &CommandsConfig) -> Self {
        Self {
            block: config.block.iter().filter(|b| !b.is_empty()).cloned().collect(),
        }
    }

    /// The first blocked substring found in the command.
    fn blocked_by(&self, command: &str) -> Option<&str> {
        self.block
            .iter()
            .find(|pattern| command.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl Rule for CommandBlockRule {
    fn name(&self) -> &str {
        "commands"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        *tool == Tool::Bash
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        match ctx.command().and_then(|cmd| self.blocked_by(cmd)) {
            Some(pattern) => {
                Decision::deny(format!("command is blocked by configuration: {pattern}"))
            }
            None => Decision::allow(),
        }
    }
}
