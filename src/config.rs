use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Per-project policy file, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".cc-warden.toml";

/// User policy file, relative to the home directory.
const USER_CONFIG_PATH: &str = ".config/cc-warden/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub versioning: VersioningConfig,
    #[serde(default)]
    pub incremental: IncrementalConfig,
    #[serde(default)]
    pub invariants: InvariantsConfig,
    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// When non-empty, only these tools may run.
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandsConfig {
    /// Substrings that deny a Bash command outright.
    #[serde(default)]
    pub block: Vec<String>,
}

/// Which configurable rules run. The protected-path guard is not listed:
/// it always runs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub workspace: bool,
    #[serde(default)]
    pub scope: bool,
    #[serde(default)]
    pub versioning: bool,
    #[serde(default)]
    pub incremental: bool,
    #[serde(default)]
    pub invariants: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersioningConfig {
    #[serde(default)]
    pub commit: CommitConfig,
}

/// Commit message format checks.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommitConfig {
    /// Maximum subject length in characters; 0 disables the check.
    #[serde(default)]
    pub max_length: usize,
    #[serde(default)]
    pub require_uppercase: bool,
    #[serde(default)]
    pub no_period: bool,
    /// Regex the subject line must match. Empty disables the check.
    #[serde(default)]
    pub prefix_pattern: String,
    /// Regexes that must not match anywhere in the message.
    #[serde(default)]
    pub forbid_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IncrementalConfig {
    /// Distinct files that may be modified before a commit resets the count.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Share of `max_files` at which a warning is attached.
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,
}

fn default_max_files() -> usize {
    10
}

fn default_warn_ratio() -> f64 {
    0.7
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            warn_ratio: default_warn_ratio(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvariantsConfig {
    #[serde(default)]
    pub coexistence: Vec<CoexistenceCheck>,
    #[serde(default)]
    pub content: Vec<ContentCheck>,
    #[serde(default)]
    pub imports: Vec<ImportCheck>,
    #[serde(default)]
    pub naming: Vec<NamingCheck>,
    #[serde(default)]
    pub required: Vec<RequiredCheck>,
}

/// A companion file must exist alongside files matching `if`.
///
/// `require` may use `${name}` (filename without extension), `${base}`
/// (name without a test suffix) and `${ext}` (extension with the dot).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoexistenceCheck {
    pub name: String,
    #[serde(rename = "if")]
    pub if_glob: String,
    pub require: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentCheck {
    pub name: String,
    /// Globs selecting files; `!`-prefixed entries exclude.
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImportCheck {
    pub name: String,
    #[serde(default)]
    pub paths: Vec<String>,
    pub forbid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NamingCheck {
    pub name: String,
    #[serde(default)]
    pub paths: Vec<String>,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Once a directory matching `dirs` holds a file matching `when`, the file
/// `require` must exist there too.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequiredCheck {
    pub name: String,
    pub dirs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    pub require: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What a hook failure (timeout, missing command) resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Allow,
    Deny,
}

/// An external process consulted through the hook JSON protocol.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HookConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Tool names this hook applies to (case-insensitive).
    #[serde(default)]
    pub tools: Vec<String>,
    /// Globs; when set, at least one extracted path must match.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Regex over the raw Bash command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub on_error: OnError,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    tools: ToolsOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
    #[serde(default)]
    rules: RulesOverlay,
    #[serde(default)]
    workspace: PatternsOverlay,
    #[serde(default)]
    scope: PatternsOverlay,
    #[serde(default)]
    versioning: VersioningOverlay,
    #[serde(default)]
    incremental: IncrementalOverlay,
    #[serde(default)]
    invariants: InvariantsConfig,
    #[serde(default)]
    hooks: Vec<HookConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct ToolsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    block: Vec<String>,
    #[serde(default)]
    remove_allow: Vec<String>,
    #[serde(default)]
    remove_block: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    block: Vec<String>,
    #[serde(default)]
    remove_block: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RulesOverlay {
    workspace: Option<bool>,
    scope: Option<bool>,
    versioning: Option<bool>,
    incremental: Option<bool>,
    invariants: Option<bool>,
}

/// Shared by `[workspace]` and `[scope]`.
#[derive(Debug, Deserialize, Default)]
struct PatternsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    block: Vec<String>,
    #[serde(default)]
    remove_allow: Vec<String>,
    #[serde(default)]
    remove_block: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct VersioningOverlay {
    #[serde(default)]
    commit: CommitOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct CommitOverlay {
    #[serde(default)]
    replace: bool,
    max_length: Option<usize>,
    require_uppercase: Option<bool>,
    no_period: Option<bool>,
    prefix_pattern: Option<String>,
    #[serde(default)]
    forbid_patterns: Vec<String>,
    #[serde(default)]
    remove_forbid_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct IncrementalOverlay {
    max_files: Option<usize>,
    warn_ratio: Option<f64>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay from ~/.config/cc-warden/config.toml
    /// 3. Merge the project overlay from `<cwd>/.cc-warden.toml`
    ///
    /// Missing files are skipped. Unreadable or unparsable files are errors:
    /// the caller must fail closed rather than run with a partial policy.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        for path in Self::overlay_paths(cwd) {
            if let Some(overlay) = Self::load_overlay(&path)? {
                log::debug!("applying config overlay {}", path.display());
                config.apply_overlay(overlay);
            }
        }
        Ok(config)
    }

    fn overlay_paths(cwd: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(Path::new(&home).join(USER_CONFIG_PATH));
        }
        paths.push(cwd.join(LOCAL_CONFIG_FILE));
        paths
    }

    fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let t = overlay.tools;
        merge_list(&mut self.tools.allow, t.allow, &t.remove_allow, t.replace);
        merge_list(&mut self.tools.block, t.block, &t.remove_block, t.replace);

        let c = overlay.commands;
        merge_list(&mut self.commands.block, c.block, &c.remove_block, c.replace);

        let r = overlay.rules;
        override_with(&mut self.rules.workspace, r.workspace);
        override_with(&mut self.rules.scope, r.scope);
        override_with(&mut self.rules.versioning, r.versioning);
        override_with(&mut self.rules.incremental, r.incremental);
        override_with(&mut self.rules.invariants, r.invariants);

        let w = overlay.workspace;
        merge_list(&mut self.workspace.allow, w.allow, &w.remove_allow, w.replace);
        merge_list(&mut self.workspace.block, w.block, &w.remove_block, w.replace);

        let s = overlay.scope;
        merge_list(&mut self.scope.allow, s.allow, &s.remove_allow, s.replace);
        merge_list(&mut self.scope.block, s.block, &s.remove_block, s.replace);

        let v = overlay.versioning.commit;
        override_with(&mut self.versioning.commit.max_length, v.max_length);
        override_with(&mut self.versioning.commit.require_uppercase, v.require_uppercase);
        override_with(&mut self.versioning.commit.no_period, v.no_period);
        override_with(&mut self.versioning.commit.prefix_pattern, v.prefix_pattern);
        merge_list(
            &mut self.versioning.commit.forbid_patterns,
            v.forbid_patterns,
            &v.remove_forbid_patterns,
            v.replace,
        );

        let i = overlay.incremental;
        override_with(&mut self.incremental.max_files, i.max_files);
        override_with(&mut self.incremental.warn_ratio, i.warn_ratio);

        // Checks and hooks are additive: later files extend earlier ones.
        let inv = overlay.invariants;
        self.invariants.coexistence.extend(inv.coexistence);
        self.invariants.content.extend(inv.content);
        self.invariants.imports.extend(inv.imports);
        self.invariants.naming.extend(inv.naming);
        self.invariants.required.extend(inv.required);
        self.hooks.extend(overlay.hooks);
    }

    /// Report configuration problems that would otherwise only show up as
    /// silently skipped checks at evaluation time.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut check_regex = |what: String, pattern: &str| {
            if let Err(e) = Regex::new(pattern) {
                problems.push(format!("{what}: invalid regex {pattern:?}: {e}"));
            }
        };

        let commit = &self.versioning.commit;
        if !commit.prefix_pattern.is_empty() {
            check_regex("versioning.commit.prefix_pattern".into(), &commit.prefix_pattern);
        }
        for p in &commit.forbid_patterns {
            check_regex("versioning.commit.forbid_patterns".into(), p);
        }
        for c in &self.invariants.content {
            for p in c.forbid.iter().chain(c.require.iter()) {
                check_regex(format!("invariants.content[{}]", c.name), p);
            }
        }
        for c in &self.invariants.imports {
            check_regex(format!("invariants.imports[{}]", c.name), &c.forbid);
        }
        for c in &self.invariants.naming {
            check_regex(format!("invariants.naming[{}]", c.name), &c.pattern);
        }
        for h in &self.hooks {
            if let Some(p) = &h.match_command {
                check_regex(format!("hooks[{}].match_command", h.name), p);
            }
        }

        for h in &self.hooks {
            if h.command.trim().is_empty() {
                problems.push(format!("hooks[{}]: empty command", h.name));
            }
            if h.tools.is_empty() {
                problems.push(format!("hooks[{}]: no tools listed, hook never runs", h.name));
            }
        }
        let ratio = self.incremental.warn_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            problems.push(format!("incremental.warn_ratio: {ratio} is outside (0, 1]"));
        }

        problems
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(config.rules.workspace);
        assert!(!config.rules.scope);
        assert!(!config.rules.versioning);
        assert!(!config.rules.incremental);
        assert!(!config.rules.invariants);
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn default_config_values() {
        let config = Config::default_config();
        assert_eq!(config.workspace.allow, vec!["/dev/null"]);
        assert_eq!(config.versioning.commit.max_length, 72);
        assert_eq!(config.incremental.max_files, 10);
        assert!((config.incremental.warn_ratio - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default_config().validate().is_empty());
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_lists() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [workspace]
            allow = ["/tmp/"]
        "#,
        );
        assert_eq!(config.workspace.allow, vec!["/dev/null", "/tmp/"]);
    }

    #[test]
    fn overlay_removes_and_replaces() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [workspace]
            remove_allow = ["/dev/null"]

            [scope]
            replace = true
            allow = ["src/**"]
        "#,
        );
        assert!(config.workspace.allow.is_empty());
        assert_eq!(config.scope.allow, vec!["src/**"]);
    }

    #[test]
    fn overlay_no_duplicates() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [workspace]
            allow = ["/dev/null"]
        "#,
        );
        assert_eq!(config.workspace.allow.len(), 1);
    }

    #[test]
    fn overlay_toggles_rules() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [rules]
            workspace = false
            scope = true
        "#,
        );
        assert!(!config.rules.workspace);
        assert!(config.rules.scope);
        // Unmentioned flags keep their defaults
        assert!(!config.rules.invariants);
    }

    #[test]
    fn overlay_scalars_override() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [versioning.commit]
            max_length = 50
            prefix_pattern = "^(feat|fix): "

            [incremental]
            max_files = 3
        "#,
        );
        assert_eq!(config.versioning.commit.max_length, 50);
        assert_eq!(config.versioning.commit.prefix_pattern, "^(feat|fix): ");
        assert_eq!(config.incremental.max_files, 3);
        assert!((config.incremental.warn_ratio - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn overlay_appends_checks_and_hooks() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [[invariants.coexistence]]
            name = "tests"
            if = "**/*.go"
            require = "${base}_test.go"

            [[hooks]]
            name = "lint"
            command = "lint-hook"
            tools = ["Write"]
            timeout_ms = 250
            on_error = "deny"
        "#,
        );
        config.apply_overlay_str(
            r#"
            [[hooks]]
            name = "second"
            command = "other"
            tools = ["Edit"]
        "#,
        );
        assert_eq!(config.invariants.coexistence[0].if_glob, "**/*.go");
        assert_eq!(config.hooks.len(), 2);
        assert_eq!(config.hooks[0].timeout_ms, Some(250));
        assert_eq!(config.hooks[0].on_error, OnError::Deny);
        assert_eq!(config.hooks[1].on_error, OnError::Allow);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.workspace.allow, original.workspace.allow);
        assert_eq!(config.rules.workspace, original.rules.workspace);
    }

    #[test]
    fn load_reads_project_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LOCAL_CONFIG_FILE),
            "[rules]\nscope = true\n[scope]\nallow = [\"src/**\"]\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.rules.scope);
        assert!(config.scope.allow.contains(&"src/**".to_string()));
    }

    #[test]
    fn load_fails_on_malformed_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCAL_CONFIG_FILE), "[rules\nscope = ").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validate_reports_bad_regexes() {
        let mut config = Config::default();
        config.invariants.naming.push(NamingCheck {
            name: "broken".into(),
            pattern: "([a-z".into(),
            ..Default::default()
        });
        config.hooks.push(HookConfig {
            name: "h".into(),
            command: "x".into(),
            tools: vec!["Bash".into()],
            match_command: Some("*oops".into()),
            ..Default::default()
        });
        let problems = config.validate();
        assert_eq!(problems.len(), 2, "{problems:?}");
        assert!(problems[0].contains("invariants.naming[broken]"));
        assert!(problems[1].contains("hooks[h].match_command"));
    }

    #[test]
    fn dump_round_trips() {
        let mut config = Config::default_config();
        config.hooks.push(HookConfig {
            name: "h".into(),
            command: "x".into(),
            tools: vec!["Write".into()],
            ..Default::default()
        });
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.hooks.len(), 1);
        assert_eq!(back.workspace.allow, config.workspace.allow);
    }
}
