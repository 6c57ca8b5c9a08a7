//! Error types for cc-warden.
//!
//! Configuration and input errors fail closed: the binary turns them into a
//! denial carrying the error text. State and hook errors are soft: the
//! incremental rule and the hook executor resolve them locally.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The policy configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The hook invocation on stdin could not be decoded.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("cannot read stdin: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed invocation JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invocation has no tool_name")]
    MissingToolName,
}

/// The incremental change-count state could not be loaded or saved.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot replace state file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// An external hook could not produce a verdict.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start hook runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("hook timed out after {0:?}")]
    Timeout(Duration),

    #[error("hook I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode input: {0}")]
    Encode(#[from] serde_json::Error),
}
