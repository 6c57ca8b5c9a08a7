//! cc-warden: PreToolUse hook for Claude Code.
//!
//! Reads one tool call as JSON from stdin, writes a permission decision to
//! stdout. Exits 0 when the call is allowed and 2 when it is denied, with
//! the reason echoed to stderr.
//!
//! Maintenance flags:
//!   --dump-config    print the merged configuration as TOML
//!   --check-config   report configuration problems, exit 1 if any

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use cc_warden::config::Config;
use cc_warden::error::InputError;
use cc_warden::eval::{Decision, Evaluator};
use cc_warden::logging;
use cc_warden::tool::ToolInvocation;

const DEFAULT_EVENT: &str = "PreToolUse";

#[derive(Debug, Deserialize)]
struct HookRequest {
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Map<String, Value>,
    cwd: Option<PathBuf>,
    hook_event_name: Option<String>,
}

fn read_request() -> Result<HookRequest, InputError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: HookRequest = serde_json::from_str(&input)?;
    if request.tool_name.as_deref().is_none_or(str::is_empty) {
        return Err(InputError::MissingToolName);
    }
    Ok(request)
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// The `hookSpecificOutput` document for a decision.
fn hook_response(decision: &Decision, event: &str) -> Value {
    let mut output = json!({
        "hookEventName": event,
        "permissionDecision": decision.as_str(),
    });
    if let Some(reason) = decision.reason() {
        output["permissionDecisionReason"] = json!(reason);
    }
    if let Some(warning) = decision.warning() {
        output["additionalContext"] = json!(warning);
    }
    json!({ "hookSpecificOutput": output })
}

fn respond(decision: &Decision, event: &str) -> ExitCode {
    println!("{}", hook_response(decision, event));
    match decision.reason() {
        Some(reason) => {
            eprintln!("{reason}");
            ExitCode::from(2)
        }
        None => ExitCode::SUCCESS,
    }
}

fn dump_config() -> ExitCode {
    let config = match Config::load(&current_dir()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cc-warden: {e}");
            return ExitCode::FAILURE;
        }
    };
    match toml::to_string_pretty(&config) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("cc-warden: cannot serialize config: {e}");
            ExitCode::FAILURE
        }
    }
}

fn check_config() -> ExitCode {
    let config = match Config::load(&current_dir()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cc-warden: {e}");
            return ExitCode::FAILURE;
        }
    };
    let problems = config.validate();
    if problems.is_empty() {
        println!("configuration OK");
        return ExitCode::SUCCESS;
    }
    for problem in &problems {
        println!("{problem}");
    }
    ExitCode::FAILURE
}

fn run_hook() -> ExitCode {
    logging::init();

    let request = match read_request() {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return respond(&Decision::deny(format!("cc-warden input error: {e}")), DEFAULT_EVENT);
        }
    };
    let event = request.hook_event_name.as_deref().unwrap_or(DEFAULT_EVENT);
    let working_dir = request.cwd.clone().unwrap_or_else(current_dir);

    let config = match Config::load(&working_dir) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return respond(&Decision::deny(format!("cc-warden config error: {e}")), event);
        }
    };
    for problem in config.validate() {
        log::warn!("config: {problem}");
    }

    let evaluator = Evaluator::from_config(&config);
    let invocation = ToolInvocation::new(
        request.tool_name.as_deref().unwrap_or_default(),
        request.tool_input,
        working_dir,
    );
    let decision = evaluator.evaluate(&invocation);
    logging::log_decision(&invocation, &decision);

    respond(&decision, event)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => run_hook(),
        Some("--dump-config") => dump_config(),
        Some("--check-config") => check_config(),
        Some(other) => {
            eprintln!("cc-warden: unknown argument {other:?}");
            eprintln!("usage: cc-warden [--dump-config | --check-config] < tool-call.json");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ───────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_response() {
        let v = hook_response(&Decision::allow(), DEFAULT_EVENT);
        assert_eq!(
            v,
            json!({ "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "allow",
            }})
        );
    }

    #[test]
    fn deny_response_carries_reason() {
        let v = hook_response(&Decision::deny("path is outside the workspace: /etc"), DEFAULT_EVENT);
        assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "deny");
        assert_eq!(
            v["hookSpecificOutput"]["permissionDecisionReason"],
            "path is outside the workspace: /etc"
        );
        assert!(v["hookSpecificOutput"].get("additionalContext").is_none());
    }

    #[test]
    fn warning_goes_to_additional_context() {
        let v = hook_response(&Decision::advise("approaching limit"), "PreToolUse");
        assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "allow");
        assert_eq!(v["hookSpecificOutput"]["additionalContext"], "approaching limit");
        assert!(v["hookSpecificOutput"].get("permissionDecisionReason").is_none());
    }

    #[test]
    fn request_parsing() {
        let r: HookRequest = serde_json::from_str(
            r#"{"tool_name":"Read","tool_input":{"file_path":"a"},"cwd":"/w","hook_event_name":"PreToolUse"}"#,
        )
        .unwrap();
        assert_eq!(r.tool_name.as_deref(), Some("Read"));
        assert_eq!(r.cwd, Some(PathBuf::from("/w")));
        assert_eq!(r.tool_input["file_path"], "a");

        let r: HookRequest = serde_json::from_str(r#"{"tool_name":"WebSearch"}"#).unwrap();
        assert!(r.tool_input.is_empty());
    }
}
