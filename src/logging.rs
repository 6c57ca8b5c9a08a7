use std::fs::OpenOptions;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::eval::Decision;
use crate::tool::ToolInvocation;

/// Environment variable overriding the log level (`debug`, `warn`, ...).
pub const LOG_LEVEL_ENV: &str = "CC_WARDEN_LOG";

fn log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/cc-warden/decisions.log"))
}

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install a file logger appending to ~/.local/share/cc-warden/decisions.log.
/// Best-effort: failures leave logging disabled (logging must never block the hook).
pub fn init() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let mut builder = ConfigBuilder::new();
    builder
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off);

    let _ = WriteLogger::init(level_from_env(), builder.build(), file);
}

/// Log one decision as a single line: tool, verdict, subject, reason.
pub fn log_decision(invocation: &ToolInvocation, decision: &Decision) {
    let subject = invocation
        .command()
        .map(str::to_string)
        .unwrap_or_else(|| invocation.paths().join(" "));
    let subject: String = subject.replace('\n', "\\n").chars().take(200).collect();

    let detail = decision
        .reason()
        .or_else(|| decision.warning())
        .unwrap_or_default()
        .replace('\n', "; ");

    match decision {
        Decision::Deny { .. } => log::warn!(
            "{}\t{}\t{subject}\t{detail}",
            decision.label(),
            invocation.tool
        ),
        Decision::Allow { .. } => log::info!(
            "{}\t{}\t{subject}\t{detail}",
            decision.label(),
            invocation.tool
        ),
    }
}
