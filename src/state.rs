//! Persisted change counter for the incremental rule.
//!
//! One JSON file per working directory. Saves go through a temp file and a
//! rename, so readers never see a torn write; concurrent writers resolve to
//! last writer wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StateError;

/// State file name, created in the working directory.
pub const STATE_FILE: &str = ".cc-warden-state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangeState {
    /// Distinct files modified since the last commit, relative to the
    /// working directory where possible.
    #[serde(default)]
    pub files_modified: Vec<String>,
}

impl ChangeState {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(STATE_FILE)
    }

    /// Load the state for `dir`. A missing file is a fresh state.
    pub fn load(dir: &Path) -> Result<Self, StateError> {
        let path = Self::path_in(dir);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Atomically replace the state file in `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), StateError> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(Self::path_in(dir))?;
        Ok(())
    }

    /// Number of distinct files once `paths` are added.
    pub fn projected(&self, paths: &[String]) -> usize {
        let new = paths
            .iter()
            .enumerate()
            .filter(|(i, p)| !self.files_modified.contains(p) && !paths[..*i].contains(p))
            .count();
        self.files_modified.len() + new
    }

    /// Add paths not yet recorded. Returns how many were new.
    pub fn record<I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.files_modified.len();
        for path in paths {
            if !self.files_modified.contains(&path) {
                self.files_modified.push(path);
            }
        }
        self.files_modified.len() - before
    }

    pub fn reset(&mut self) {
        self.files_modified.clear();
    }
}
