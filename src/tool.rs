//! The closed set of agent tools and the paths each one touches.

use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::parse::{self, ParsedCommand, SUBST_PLACEHOLDER};

/// An agent tool, as named in the invocation's `tool_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    Bash,
    Read,
    Write,
    Edit,
    NotebookEdit,
    Glob,
    Grep,
    /// Any tool without filesystem semantics (WebSearch, Task, MCP tools...).
    Other(String),
}

impl Tool {
    /// Map a tool name to its variant. Names are case-sensitive, as the
    /// agent sends them.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Bash" => Tool::Bash,
            "Read" => Tool::Read,
            "Write" => Tool::Write,
            "Edit" => Tool::Edit,
            "NotebookEdit" => Tool::NotebookEdit,
            "Glob" => Tool::Glob,
            "Grep" => Tool::Grep,
            other => Tool::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::Bash => "Bash",
            Tool::Read => "Read",
            Tool::Write => "Write",
            Tool::Edit => "Edit",
            Tool::NotebookEdit => "NotebookEdit",
            Tool::Glob => "Glob",
            Tool::Grep => "Grep",
            Tool::Other(name) => name,
        }
    }

    /// Tools the path rules apply to. Everything else is allowed once the
    /// tool allow/block lists pass.
    pub fn is_filesystem(&self) -> bool {
        !matches!(self, Tool::Other(_))
    }

    /// Tools that create or change file contents.
    pub fn is_modification(&self) -> bool {
        matches!(self, Tool::Write | Tool::Edit | Tool::NotebookEdit)
    }

    /// Every path-like value in the tool input.
    ///
    /// For Bash this is every argument, non-empty flag value, env value and
    /// redirect target of every segment, plus the program of every segment
    /// but the first, including those inside command substitutions.
    /// Candidates may not be paths at all; rules judge them as text.
    pub fn extract_paths(&self, input: &Map<String, Value>) -> Vec<String> {
        match self {
            Tool::Bash => str_field(input, "command")
                .map(bash_paths)
                .unwrap_or_default(),
            Tool::Read | Tool::Write | Tool::Edit => fields(input, &["file_path"]),
            Tool::NotebookEdit => fields(input, &["notebook_path"]),
            Tool::Glob => fields(input, &["path", "pattern"]),
            Tool::Grep => fields(input, &["path"]),
            Tool::Other(_) => Vec::new(),
        }
    }

    /// The text a modification tool is about to write, if any.
    pub fn new_content<'a>(&self, input: &'a Map<String, Value>) -> Option<&'a str> {
        match self {
            Tool::Write => str_field(input, "content"),
            Tool::Edit => str_field(input, "new_string"),
            Tool::NotebookEdit => str_field(input, "new_source"),
            _ => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One proposed tool action.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub input: Map<String, Value>,
    pub working_dir: PathBuf,
}

impl ToolInvocation {
    pub fn new(
        tool_name: &str,
        input: Map<String, Value>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool: Tool::from_name(tool_name),
            input,
            working_dir: working_dir.into(),
        }
    }

    /// The raw shell command of a Bash invocation.
    pub fn command(&self) -> Option<&str> {
        match self.tool {
            Tool::Bash => str_field(&self.input, "command"),
            _ => None,
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.tool.extract_paths(&self.input)
    }

    pub fn new_content(&self) -> Option<&str> {
        self.tool.new_content(&self.input)
    }
}

fn str_field<'a>(input: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

fn fields(input: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|k| str_field(input, k))
        .map(str::to_string)
        .collect()
}

fn bash_paths(command: &str) -> Vec<String> {
    let pipeline = parse::parse(command);
    let mut paths = Vec::new();

    // Every program but the leading one is a candidate: `ls; ../run.sh`.
    let (head, rest) = pipeline.segments.split_first().unzip();
    let later = rest.into_iter().flatten().map(String::as_str);
    let substituted = pipeline.substitutions.iter().flat_map(|s| s.all_segments());

    if let Some(segment) = head {
        collect_segment(segment, false, &mut paths);
    }
    for segment in later.chain(substituted) {
        collect_segment(segment, true, &mut paths);
    }

    paths.retain(|p| !p.contains(SUBST_PLACEHOLDER));
    paths
}

fn collect_segment(segment: &str, with_program: bool, paths: &mut Vec<String>) {
    let cmd = ParsedCommand::parse(segment);
    if with_program && !cmd.program.is_empty() {
        paths.push(cmd.program);
    }
    for arg in cmd.args {
        match redirect_target(&arg) {
            Some("") => {}
            Some(target) => paths.push(target.to_string()),
            None => paths.push(arg),
        }
    }
    paths.extend(
        cmd.flags
            .into_iter()
            .map(|(_, value)| value)
            .filter(|v| !v.is_empty()),
    );
    paths.extend(cmd.env.into_iter().map(|(_, value)| value));
}

/// For a word that starts with a redirection (`>out`, `2>>log`, `<in`,
/// `&>all`), the target after the operator.
fn redirect_target(word: &str) -> Option<&str> {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.strip_prefix('&').unwrap_or(rest);
    if !rest.starts_with(['<', '>']) {
        return None;
    }
    let target = rest.trim_start_matches(['<', '>']);
    let target = target.strip_prefix('&').unwrap_or(target);
    // `2>&1` duplicates a descriptor; there is no file to report.
    if target.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Some("");
    }
    Some(target)
}
