//! Runs one external hook process under a timeout.
//!
//! Each run gets a private current-thread tokio runtime. The child is
//! spawned with `kill_on_drop`, so when the timeout drops the I/O future
//! the process is killed, and dropping the runtime closes its pipes.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{HookConfig, OnError};
use crate::error::HookError;
use crate::eval::Decision;

/// Applies when a hook sets no `timeout_ms`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit status shells use for "command not found".
const EXIT_NOT_FOUND: i32 = 127;

/// JSON written to the hook's stdin.
#[derive(Debug, Serialize)]
pub struct HookInput<'a> {
    pub tool_name: &'a str,
    pub tool_input: &'a Map<String, Value>,
    pub paths: &'a [String],
    pub working_dir: &'a Path,
}

/// JSON a hook may print on stdout.
#[derive(Debug, Default, Deserialize)]
pub struct HookOutput {
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

impl HookOutput {
    fn into_decision(self) -> Decision {
        match self.decision.as_str() {
            "deny" => {
                Decision::deny(non_empty(self.reason).unwrap_or_else(|| "denied by hook".into()))
            }
            "advise" => match non_empty(self.warning).or_else(|| non_empty(self.reason)) {
                Some(warning) => Decision::advise(warning),
                None => Decision::allow(),
            },
            _ => Decision::allow(),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// A hook process that ran to completion.
#[derive(Debug)]
struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Run a hook and turn whatever happened into a decision.
///
/// Resolution order: a failure to run (missing command, exit 127, timeout)
/// goes to the hook's `on_error` policy; otherwise a JSON verdict on stdout
/// wins regardless of exit code; otherwise a non-zero exit denies with the
/// hook's stderr; otherwise the hook allows.
pub fn execute(hook: &HookConfig, input: &HookInput) -> Decision {
    let finished = match run(hook, input) {
        Ok(f) if f.status.code() == Some(EXIT_NOT_FOUND) => {
            return on_error(hook, &HookError::NotFound(hook.command.clone()));
        }
        Ok(f) => f,
        Err(e) => return on_error(hook, &e),
    };

    if let Ok(output) = serde_json::from_slice::<HookOutput>(&finished.stdout) {
        return output.into_decision();
    }

    if !finished.status.success() {
        let stderr = String::from_utf8_lossy(&finished.stderr);
        let reason = stderr.trim();
        return Decision::deny(if reason.is_empty() {
            "hook denied (exit code non-zero)".to_string()
        } else {
            reason.to_string()
        });
    }

    Decision::allow()
}

fn on_error(hook: &HookConfig, err: &HookError) -> Decision {
    log::warn!("hook {}: {err}", hook.name);
    match hook.on_error {
        OnError::Deny => Decision::deny(format!("hook error: {err}")),
        OnError::Allow => Decision::advise(format!("hook error (allowed): {err}")),
    }
}

fn run(hook: &HookConfig, input: &HookInput) -> Result<Finished, HookError> {
    let payload = serde_json::to_vec(input)?;
    let timeout = hook.timeout_ms.map(Duration::from_millis).unwrap_or(DEFAULT_TIMEOUT);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HookError::Runtime)?;

    runtime.block_on(async move {
        let mut command = Command::new(&hook.command);
        command
            .args(&hook.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if input.working_dir.is_dir() {
            command.current_dir(input.working_dir);
        }

        let mut child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                HookError::NotFound(hook.command.clone())
            } else {
                HookError::Spawn {
                    command: hook.command.clone(),
                    source,
                }
            }
        })?;
        let stdin = child.stdin.take();

        let io = async move {
            if let Some(mut stdin) = stdin {
                // A hook that exits without reading its input is fine.
                match stdin.write_all(&payload).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
                drop(stdin);
            }
            child.wait_with_output().await
        };

        match tokio::time::timeout(timeout, io).await {
            Ok(output) => {
                let output = output?;
                Ok(Finished {
                    status: output.status,
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            Err(_) => Err(HookError::Timeout(timeout)),
        }
    })
}
