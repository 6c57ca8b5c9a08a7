use regex::Regex;

use crate::config::HookConfig;
use crate::pattern;
use crate::policy::compile_regex;

/// Decides whether a configured hook fires for an invocation.
#[derive(Debug)]
pub struct HookMatcher {
    tools: Vec<String>,
    paths: Vec<String>,
    /// `Some(None)` when a `match_command` was configured but is invalid:
    /// such a hook never fires.
    command: Option<Option<Regex>>,
}

impl HookMatcher {
    pub fn from_config(hook: &HookConfig) -> Self {
        let command = hook
            .match_command
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| compile_regex(&format!("hooks[{}].match_command", hook.name), p));
        Self {
            tools: hook.tools.clone(),
            paths: hook.paths.clone(),
            command,
        }
    }

    /// The tool must be listed (case-insensitive). A `match_command` regex
    /// must match the raw command. With `paths` configured, at least one
    /// extracted path must match one of them.
    pub fn matches(&self, tool_name: &str, paths: &[String], command: Option<&str>) -> bool {
        if !self.tools.iter().any(|t| t.eq_ignore_ascii_case(tool_name)) {
            return false;
        }
        match &self.command {
            Some(Some(re)) if !re.is_match(command.unwrap_or_default()) => return false,
            Some(None) => return false,
            _ => {}
        }
        self.paths.is_empty() || paths.iter().any(|p| pattern::match_any(p, &self.paths))
    }
}
