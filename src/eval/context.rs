use std::path::Path;

use crate::tool::{Tool, ToolInvocation};

/// Context for evaluating a single invocation.
///
/// Paths are extracted once up front and shared by every rule.
#[derive(Debug)]
pub struct EvalContext<'a> {
    pub invocation: &'a ToolInvocation,
    /// Path candidates extracted from the tool input.
    pub paths: Vec<String>,
}

impl<'a> EvalContext<'a> {
    pub fn new(invocation: &'a ToolInvocation) -> Self {
        Self {
            invocation,
            paths: invocation.paths(),
        }
    }

    pub fn tool(&self) -> &Tool {
        &self.invocation.tool
    }

    pub fn working_dir(&self) -> &Path {
        &self.invocation.working_dir
    }

    /// The raw Bash command, if this is a Bash invocation.
    pub fn command(&self) -> Option<&str> {
        self.invocation.command()
    }

    /// New file content for Write/Edit/NotebookEdit, empty otherwise.
    pub fn new_content(&self) -> &str {
        self.invocation.new_content().unwrap_or_default()
    }
}
