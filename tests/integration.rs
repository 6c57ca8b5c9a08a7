use std::path::Path;

use cc_warden::config::{Config, HookConfig, OnError};
use cc_warden::eval::{Decision, Evaluator};
use cc_warden::tool::ToolInvocation;
use serde_json::{Value, json};

const CWD: &str = "/work/repo";

fn invocation(tool: &str, input: Value, cwd: &Path) -> ToolInvocation {
    ToolInvocation::new(tool, input.as_object().cloned().unwrap_or_default(), cwd)
}

fn decision_for(tool: &str, input: Value) -> Decision {
    cc_warden::evaluate(tool, input, Path::new(CWD))
}

fn bash(command: &str) -> Decision {
    decision_for("Bash", json!({ "command": command }))
}

fn evaluate_with(config: &Config, tool: &str, input: Value, cwd: &Path) -> Decision {
    Evaluator::from_config(config).evaluate(&invocation(tool, input, cwd))
}

macro_rules! decision_test {
    ($name:ident, $cmd:expr, Allow) => {
        #[test]
        fn $name() {
            let d = bash($cmd);
            assert!(d.is_allowed(), "command: {} -> {:?}", $cmd, d);
        }
    };
    ($name:ident, $cmd:expr, Deny) => {
        #[test]
        fn $name() {
            let d = bash($cmd);
            assert!(d.is_denied(), "command: {} -> {:?}", $cmd, d);
        }
    };
}

// ── ALLOW: commands confined to the workspace ──

decision_test!(allow_go_test, "go test ./...", Allow);
decision_test!(allow_go_test_flags, "go test -race -v ./pkg/...", Allow);
decision_test!(allow_make, "make test", Allow);
decision_test!(allow_ls, "ls", Allow);
decision_test!(allow_empty, "", Allow);
decision_test!(allow_cargo_build, "cargo build --release", Allow);
decision_test!(allow_relative_env, "RUST_LOG=debug cargo run", Allow);
decision_test!(allow_dev_null, "make 2>/dev/null", Allow);
decision_test!(allow_fd_dup, "make 2>&1 | tee build.log", Allow);
decision_test!(allow_git_commit, "git commit -m 'Add parser'", Allow);
decision_test!(allow_inner_traversal, "cat src/../README.md", Allow);

// ── DENY: absolute paths and traversal ──

decision_test!(deny_rm_root, "rm -rf /", Deny);
decision_test!(deny_cat_passwd, "cat /etc/passwd", Deny);
decision_test!(deny_parent, "cat ..", Deny);
decision_test!(deny_parent_traversal, "cat ../secrets", Deny);
decision_test!(deny_flag_value, "go test -coverprofile=/tmp/cover.out ./...", Deny);
decision_test!(deny_env_value, "GOMODCACHE=/tmp/mod go test ./...", Deny);
decision_test!(deny_chained, "ls && cat /etc/shadow", Deny);
decision_test!(deny_substitution, "echo $(cat /etc/hostname)", Deny);
decision_test!(deny_redirect_target, "echo pwned >/etc/motd", Deny);
decision_test!(deny_later_program_traversal, "ls; ../outside/run.sh", Deny);
decision_test!(deny_later_program_absolute, "true && /usr/local/bin/deploy", Deny);
decision_test!(deny_substituted_program, "echo $(../evil.sh)", Deny);
decision_test!(allow_later_program_relative, "cargo fmt && cargo test", Allow);

// ── DENY: protected paths ──

decision_test!(deny_ssh_key, "cat ~/.ssh/id_rsa", Deny);
decision_test!(deny_policy_file, "rm .cc-warden.toml", Deny);
decision_test!(deny_nested_policy_file, "vim sub/dir/.cc-warden.toml", Deny);
decision_test!(deny_state_file, "echo '{}' > .cc-warden-state.json", Deny);

// ── Heredocs ──

decision_test!(allow_heredoc_body_ignored, "cat <<EOF\n/etc/passwd\nEOF", Allow);
decision_test!(
    deny_heredoc_redirect_target,
    "cat <<EOF > /etc/cron.d/job\nhello\nEOF",
    Deny
);
decision_test!(
    allow_quoted_heredoc_commit,
    "git commit -m \"$(cat <<'EOF'\nFix /etc handling\n\nDetails in ../notes\nEOF\n)\"",
    Allow
);

#[test]
fn protected_reason_is_fixed() {
    let d = bash("cat ~/.ssh/id_rsa");
    assert_eq!(
        d.reason(),
        Some("path is protected and cannot be accessed. User must perform this action manually.")
    );
}

#[test]
fn workspace_reason_names_the_path() {
    assert_eq!(bash("cat ../secrets").reason(), Some("path is outside the workspace: ../secrets"));
}

// ── File tools ──

#[test]
fn read_outside_workspace_denied() {
    assert!(decision_for("Read", json!({ "file_path": "/etc/passwd" })).is_denied());
    assert!(decision_for("Read", json!({ "file_path": "src/main.rs" })).is_allowed());
}

#[test]
fn glob_pattern_is_checked() {
    assert!(decision_for("Glob", json!({ "pattern": "../**/*.pem" })).is_denied());
    assert!(decision_for("Glob", json!({ "path": "src", "pattern": "**/*.rs" })).is_allowed());
}

#[test]
fn grep_pattern_is_not_a_path() {
    let d = decision_for("Grep", json!({ "path": "src", "pattern": "/etc/passwd" }));
    assert!(d.is_allowed());
}

#[test]
fn notebook_edit_is_guarded() {
    let d = decision_for(
        "NotebookEdit",
        json!({ "notebook_path": "/tmp/nb.ipynb", "new_source": "x" }),
    );
    assert!(d.is_denied());
}

#[test]
fn write_to_protected_settings_denied() {
    let d = decision_for("Write", json!({ "file_path": "~/.claude/settings.json", "content": "{}" }));
    assert!(d.reason().unwrap().starts_with("path is protected"));
}

#[test]
fn claude_plans_allowed() {
    let d = decision_for("Write", json!({ "file_path": "~/.claude/plans/plan.md", "content": "x" }));
    assert!(d.is_allowed(), "{d:?}");
}

// ── Non-filesystem tools ──

#[test]
fn web_search_always_allowed() {
    assert_eq!(decision_for("WebSearch", json!({ "query": "/etc/passwd" })), Decision::allow());
    assert_eq!(decision_for("mcp__github__get_issue", json!({})), Decision::allow());
}

// ── Scope ──

fn scoped_config() -> Config {
    let mut config = Config::default_config();
    config.rules.scope = true;
    config.scope.allow = vec!["src/**/*.go".into()];
    config
}

#[test]
fn scope_limits_writes() {
    let config = scoped_config();
    let cwd = Path::new(CWD);
    let write = |p: &str| evaluate_with(&config, "Write", json!({ "file_path": p, "content": "" }), cwd);
    assert!(write("vendor/lib.go").is_denied());
    assert!(write("src/main.go").is_allowed());
    assert!(write("src/pkg/util.go").is_allowed());
}

#[test]
fn scope_relativises_absolute_paths_under_cwd() {
    let mut config = scoped_config();
    config.workspace.allow.push(format!("{CWD}/"));
    let d = evaluate_with(
        &config,
        "Edit",
        json!({ "file_path": format!("{CWD}/src/main.go"), "old_string": "a", "new_string": "b" }),
        Path::new(CWD),
    );
    assert!(d.is_allowed(), "{d:?}");
}

#[test]
fn scope_ignores_reads() {
    let d = evaluate_with(&scoped_config(), "Read", json!({ "file_path": "vendor/lib.go" }), Path::new(CWD));
    assert!(d.is_allowed());
}

// ── Versioning ──

#[test]
fn versioning_checks_commit_messages() {
    let mut config = Config::default_config();
    config.rules.versioning = true;
    config.versioning.commit.prefix_pattern = r"^(feat|fix|docs|chore)(\(.+\))?: ".into();
    let cwd = Path::new(CWD);
    let run = |cmd: &str| evaluate_with(&config, "Bash", json!({ "command": cmd }), cwd);

    assert!(run("git commit -m 'feat(parser): strip heredocs'").is_allowed());
    let d = run("git add -A && git commit -m 'Strip heredocs'");
    assert!(d.reason().unwrap().contains("required pattern"));
    assert!(run("git commit").is_allowed());
    assert!(run("git status").is_allowed());
}

// ── Incremental ──

#[test]
fn incremental_budget_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default_config();
    config.rules.incremental = true;
    config.incremental.max_files = 3;
    config.incremental.warn_ratio = 0.6;
    let evaluator = Evaluator::from_config(&config);
    let write = |p: &str| {
        evaluator.evaluate(&invocation("Write", json!({ "file_path": p, "content": "" }), dir.path()))
    };

    assert_eq!(write("a.rs"), Decision::allow());
    let d = write("b.rs");
    assert_eq!(d.warning(), Some("approaching incremental limit: 2/3 files modified since last commit"));
    assert!(write("c.rs").is_allowed());
    assert!(write("a.rs").is_allowed());
    assert!(write("d.rs").reason().unwrap().starts_with("incremental limit reached"));

    let commit = invocation("Bash", json!({ "command": "git commit -am 'Step one'" }), dir.path());
    assert!(evaluator.evaluate(&commit).is_allowed());
    assert_eq!(write("d.rs"), Decision::allow());
}

#[test]
fn denied_writes_are_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default_config();
    config.rules.incremental = true;
    config.incremental.max_files = 5;
    config.rules.scope = true;
    config.scope.block = vec!["*.lock".into()];
    let evaluator = Evaluator::from_config(&config);

    let d = evaluator.evaluate(&invocation("Write", json!({ "file_path": "Cargo.lock", "content": "" }), dir.path()));
    assert!(d.is_denied());
    let state = cc_warden::state::ChangeState::load(dir.path()).unwrap();
    assert!(state.files_modified.is_empty());
}

// ── Invariants ──

#[test]
fn invariants_run_on_new_content() {
    let mut config = Config::default_config();
    config.rules.invariants = true;
    config.invariants.content.push(cc_warden::config::ContentCheck {
        name: "no-dbg".into(),
        paths: vec!["src/**/*.rs".into(), "!src/bin/**".into()],
        forbid: Some(r"dbg!\(".into()),
        ..Default::default()
    });
    let cwd = Path::new(CWD);
    let edit = |p: &str, s: &str| {
        evaluate_with(&config, "Edit", json!({ "file_path": p, "old_string": "x", "new_string": s }), cwd)
    };
    assert!(edit("src/lib.rs", "dbg!(x)").is_denied());
    assert!(edit("src/bin/tool.rs", "dbg!(x)").is_allowed());
    assert!(edit("src/lib.rs", "x").is_allowed());
}

// ── Hooks ──

fn sh_hook(name: &str, script: &str) -> HookConfig {
    HookConfig {
        name: name.into(),
        command: "sh".into(),
        args: vec!["-c".into(), script.into()],
        tools: vec!["Write".into(), "Bash".into()],
        ..Default::default()
    }
}

fn with_hooks(hooks: Vec<HookConfig>) -> Config {
    let mut config = Config::default_config();
    config.hooks = hooks;
    config
}

#[test]
fn hook_json_deny_regardless_of_exit_code() {
    let config = with_hooks(vec![sh_hook("policy", r#"echo '{"decision":"deny","reason":"x"}'"#)]);
    let d = evaluate_with(&config, "Write", json!({ "file_path": "a.txt", "content": "" }), Path::new("."));
    assert_eq!(d.reason(), Some("policy: x"));

    let config = with_hooks(vec![sh_hook(
        "policy",
        r#"echo '{"decision":"deny","reason":"x"}'; exit 1"#,
    )]);
    let d = evaluate_with(&config, "Write", json!({ "file_path": "a.txt", "content": "" }), Path::new("."));
    assert_eq!(d.reason(), Some("policy: x"));
}

#[test]
fn workspace_block_sees_through_dot_segments() {
    let mut config = Config::default_config();
    config.workspace.block = vec!["secrets/".into()];
    let cwd = Path::new(CWD);
    for path in ["secrets/key.pem", "./secrets/key.pem", "src/../secrets/key.pem"] {
        let d = evaluate_with(&config, "Read", json!({ "file_path": path }), cwd);
        assert!(d.is_denied(), "{path} -> {d:?}");
    }
    assert!(evaluate_with(&config, "Read", json!({ "file_path": "src/lib.rs" }), cwd).is_allowed());
}

#[test]
fn hook_timeout_follows_on_error() {
    let mut hook = sh_hook("slow", "sleep 5");
    hook.timeout_ms = Some(100);
    let input = json!({ "file_path": "a.txt", "content": "" });

    let d = evaluate_with(&with_hooks(vec![hook.clone()]), "Write", input.clone(), Path::new("."));
    assert!(d.warning().unwrap().starts_with("slow: hook error (allowed): hook timed out"));

    hook.on_error = OnError::Deny;
    let d = evaluate_with(&with_hooks(vec![hook]), "Write", input, Path::new("."));
    assert!(d.reason().unwrap().starts_with("slow: hook error: hook timed out"));
}

#[test]
fn hooks_do_not_run_after_a_denial() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let hook = sh_hook("marker", &format!("touch {}", marker.display()));
    let d = evaluate_with(&with_hooks(vec![hook]), "Bash", json!({ "command": "cat /etc/passwd" }), dir.path());
    assert!(d.is_denied());
    assert!(!marker.exists());
}

#[test]
fn hook_match_command_filters_bash() {
    let mut hook = sh_hook("push-guard", "echo 'no pushing' >&2; exit 1");
    hook.match_command = Some(r"git\s+push".into());
    let config = with_hooks(vec![hook]);
    let cwd = Path::new(".");
    let run = |cmd: &str| evaluate_with(&config, "Bash", json!({ "command": cmd }), cwd);
    assert_eq!(run("git push origin main").reason(), Some("push-guard: no pushing"));
    assert!(run("git status").is_allowed());
}
