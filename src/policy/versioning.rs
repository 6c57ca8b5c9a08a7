use regex::Regex;

use crate::config::CommitConfig;
use crate::eval::{Decision, EvalContext};
use crate::parse::tokenize::split_assignment;
use crate::parse::{self, SUBST_PLACEHOLDER};
use crate::tool::Tool;

use super::{Rule, compile_regex};

/// git global options that consume the following word.
const GIT_OPTIONS_WITH_VALUE: &[&str] = &[
    "-C",
    "-c",
    "--git-dir",
    "--work-tree",
    "--namespace",
    "--super-prefix",
    "--config-env",
];

/// A `git commit` found in a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    /// The message given on the command line, when it can be read without
    /// running anything. `None` for editor commits, `-F` and substitutions.
    pub message: Option<String>,
}

/// Every `git commit` in a command, including ones inside compound commands
/// and command substitutions.
pub fn find_commits(command: &str) -> Vec<GitCommit> {
    let pipeline = parse::parse(command);
    pipeline
        .all_segments()
        .filter_map(|segment| parse_commit(&parse::tokenize(segment)))
        .collect()
}

fn parse_commit(words: &[String]) -> Option<GitCommit> {
    let mut iter = words
        .iter()
        .map(String::as_str)
        .skip_while(|w| split_assignment(w).is_some())
        .peekable();

    let program = iter.next()?;
    if program != "git" && !program.ends_with("/git") {
        return None;
    }

    // Global options before the subcommand.
    while let Some(word) = iter.next_if(|w| w.starts_with('-')) {
        if GIT_OPTIONS_WITH_VALUE.contains(&word) {
            iter.next();
        }
    }
    if iter.next()? != "commit" {
        return None;
    }

    let mut messages = Vec::new();
    while let Some(word) = iter.next() {
        if word == "--" {
            break;
        }
        if word == "--message" {
            messages.push(iter.next().unwrap_or_default().to_string());
        } else if let Some(msg) = word.strip_prefix("--message=") {
            messages.push(msg.to_string());
        } else if let Some(cluster) = word.strip_prefix('-').filter(|c| !c.starts_with('-')) {
            // Short option cluster: `-m msg`, `-mmsg`, `-am msg`.
            if let Some((before, inline)) = cluster.split_once('m')
                && before.chars().all(|c| c.is_ascii_alphabetic())
            {
                if inline.is_empty() {
                    messages.push(iter.next().unwrap_or_default().to_string());
                } else {
                    messages.push(inline.to_string());
                }
            }
        }
    }

    let message = if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n\n")).filter(|m| !m.contains(SUBST_PLACEHOLDER))
    };
    Some(GitCommit { message })
}

/// Enforces commit message format on `git commit` commands.
#[derive(Debug, Clone, Default)]
pub struct VersioningRule {
    max_length: usize,
    require_uppercase: bool,
    no_period: bool,
    prefix: Option<(String, Regex)>,
    forbid: Vec<(String, Regex)>,
}

impl VersioningRule {
    pub fn from_config(config: &CommitConfig) -> Self {
        let prefix = Some(config.prefix_pattern.as_str())
            .filter(|p| !p.is_empty())
            .and_then(|p| {
                compile_regex("versioning.commit.prefix_pattern", p).map(|re| (p.to_string(), re))
            });
        let forbid = config
            .forbid_patterns
            .iter()
            .filter_map(|p| {
                compile_regex("versioning.commit.forbid_patterns", p).map(|re| (p.clone(), re))
            })
            .collect();

        Self {
            max_length: config.max_length,
            require_uppercase: config.require_uppercase,
            no_period: config.no_period,
            prefix,
            forbid,
        }
    }

    /// Check one commit message.
    pub fn check_message(&self, message: &str) -> Decision {
        if message.trim().is_empty() {
            return Decision::deny("commit message is empty");
        }
        let subject = message.lines().next().unwrap_or_default().trim_end();

        let length = subject.chars().count();
        if self.max_length > 0 && length > self.max_length {
            return Decision::deny(format!(
                "commit message subject is {length} characters, limit is {}",
                self.max_length
            ));
        }
        if self.require_uppercase && !subject.starts_with(|c: char| c.is_uppercase()) {
            return Decision::deny("commit message must start with an uppercase letter");
        }
        if self.no_period && subject.ends_with('.') {
            return Decision::deny("commit message subject must not end with a period");
        }
        if let Some((pattern, re)) = &self.prefix
            && !re.is_match(subject)
        {
            return Decision::deny(format!(
                "commit message does not match required pattern: {pattern}"
            ));
        }
        if let Some((pattern, _)) = self.forbid.iter().find(|(_, re)| re.is_match(message)) {
            return Decision::deny(format!("commit message contains forbidden pattern: {pattern}"));
        }
        Decision::allow()
    }
}

impl Rule for VersioningRule {
    fn name(&self) -> &str {
        "versioning"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        *tool == Tool::Bash
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        let Some(command) = ctx.command() else {
            return Decision::allow();
        };
        find_commits(command)
            .iter()
            .filter_map(|c| c.message.as_deref())
            .map(|m| self.check_message(m))
            .find(Decision::is_denied)
            .unwrap_or_else(Decision::allow)
    }
}
