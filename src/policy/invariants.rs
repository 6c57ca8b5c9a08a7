use std::path::Path;

use regex::Regex;

use crate::config::{
    CoexistenceCheck, ContentCheck, ImportCheck, InvariantsConfig, NamingCheck, RequiredCheck,
};
use crate::eval::{Decision, EvalContext};
use crate::paths;
use crate::pattern;
use crate::tool::Tool;

use super::{Rule, compile_regex};

/// Suffixes stripped from a file stem to form `${base}`.
const TEST_SUFFIXES: &[&str] = &["_test", ".test", ".spec"];

struct Content {
    check: ContentCheck,
    forbid: Option<Regex>,
    require: Option<Regex>,
}

struct Import {
    check: ImportCheck,
    forbid: Option<Regex>,
}

struct Naming {
    check: NamingCheck,
    pattern: Option<Regex>,
}

/// Declarative structural checks on files about to be modified.
///
/// Checks run in a fixed order: coexistence, content, imports, naming,
/// required. The first failure denies.
pub struct InvariantsRule {
    coexistence: Vec<CoexistenceCheck>,
    content: Vec<Content>,
    imports: Vec<Import>,
    naming: Vec<Naming>,
    required: Vec<RequiredCheck>,
}

impl InvariantsRule {
    /// Build the rule, compiling every regex once. An invalid regex
    /// disables only the check that owns it.
    pub fn from_config(config: &InvariantsConfig) -> Self {
        let content = config
            .content
            .iter()
            .map(|c| {
                let what = format!("invariants.content[{}]", c.name);
                Content {
                    forbid: c.forbid.as_deref().and_then(|p| compile_regex(&what, p)),
                    require: c.require.as_deref().and_then(|p| compile_regex(&what, p)),
                    check: c.clone(),
                }
            })
            .collect();
        let imports = config
            .imports
            .iter()
            .map(|c| Import {
                forbid: compile_regex(&format!("invariants.imports[{}]", c.name), &c.forbid),
                check: c.clone(),
            })
            .collect();
        let naming = config
            .naming
            .iter()
            .map(|c| Naming {
                pattern: compile_regex(&format!("invariants.naming[{}]", c.name), &c.pattern),
                check: c.clone(),
            })
            .collect();

        Self {
            coexistence: config.coexistence.clone(),
            content,
            imports,
            naming,
            required: config.required.clone(),
        }
    }

    /// Check one file. `path` is as the agent gave it; filesystem lookups
    /// resolve it against `cwd`.
    pub fn check_file(&self, path: &str, content: &str, cwd: &Path) -> Decision {
        let relative = paths::relative_to(path, cwd);
        let path = relative.as_str();

        self.check_coexistence(path, cwd)
            .or_else(|| self.check_content(path, content))
            .or_else(|| self.check_imports(path, content))
            .or_else(|| self.check_naming(path))
            .or_else(|| self.check_required(path, cwd))
            .map(Decision::deny)
            .unwrap_or_else(Decision::allow)
    }

    fn check_coexistence(&self, path: &str, cwd: &Path) -> Option<String> {
        self.coexistence.iter().find_map(|check| {
            if !pattern::matches(path, &check.if_glob) {
                return None;
            }
            let required = expand_placeholders(&check.require, path);
            // Writing the companion itself satisfies the check.
            if paths::clean(&required) == paths::clean(path) || exists(&required, cwd) {
                return None;
            }
            Some(check.message.clone().unwrap_or_else(|| {
                format!("coexistence check failed: {} requires {required}", check.name)
            }))
        })
    }

    fn check_content(&self, path: &str, content: &str) -> Option<String> {
        self.content.iter().find_map(|c| {
            if !in_scope(path, &c.check.paths) {
                return None;
            }
            if let Some(re) = &c.forbid
                && re.is_match(content)
            {
                return Some(c.check.message.clone().unwrap_or_else(|| {
                    format!(
                        "content check failed: {} forbids pattern: {}",
                        c.check.name,
                        re.as_str()
                    )
                }));
            }
            if let Some(re) = &c.require
                && !re.is_match(content)
            {
                return Some(c.check.message.clone().unwrap_or_else(|| {
                    format!(
                        "content check failed: {} requires pattern: {}",
                        c.check.name,
                        re.as_str()
                    )
                }));
            }
            None
        })
    }

    fn check_imports(&self, path: &str, content: &str) -> Option<String> {
        self.imports.iter().find_map(|c| {
            let re = c.forbid.as_ref()?;
            if !in_scope(path, &c.check.paths) || !re.is_match(content) {
                return None;
            }
            Some(c.check.message.clone().unwrap_or_else(|| {
                format!(
                    "import check failed: {} forbids import matching: {}",
                    c.check.name,
                    re.as_str()
                )
            }))
        })
    }

    fn check_naming(&self, path: &str) -> Option<String> {
        let filename = paths::base_name(path);
        self.naming.iter().find_map(|c| {
            let re = c.pattern.as_ref()?;
            if !in_scope(path, &c.check.paths) || re.is_match(filename) {
                return None;
            }
            Some(c.check.message.clone().unwrap_or_else(|| {
                format!(
                    "naming check failed: {} requires pattern: {}",
                    c.check.name,
                    re.as_str()
                )
            }))
        })
    }

    fn check_required(&self, path: &str, cwd: &Path) -> Option<String> {
        let dir = paths::dir_name(path);
        let filename = paths::base_name(path);

        self.required.iter().find_map(|check| {
            if !pattern::matches(&dir, &check.dirs) || filename == check.require {
                return None;
            }
            if let Some(when) = &check.when
                && !dir_has_match(&dir, when, cwd)
            {
                return None;
            }
            let required = format!("{dir}/{}", check.require);
            if exists(&required, cwd) {
                return None;
            }
            Some(check.message.clone().unwrap_or_else(|| {
                format!(
                    "required check failed: {} requires {} in {dir}",
                    check.name, check.require
                )
            }))
        })
    }
}

impl Rule for InvariantsRule {
    fn name(&self) -> &str {
        "invariants"
    }

    fn applies_to(&self, tool: &Tool) -> bool {
        tool.is_modification()
    }

    fn evaluate(&self, ctx: &EvalContext) -> Decision {
        let content = ctx.new_content();
        ctx.paths
            .iter()
            .map(|p| self.check_file(p, content, ctx.working_dir()))
            .find(Decision::is_denied)
            .unwrap_or_else(Decision::allow)
    }
}

/// Substitute `${name}`, `${base}` and `${ext}` for `path`, then anchor a
/// relative result in the file's directory.
pub fn expand_placeholders(template: &str, path: &str) -> String {
    let file = paths::base_name(path);
    let (name, ext) = match file.rfind('.') {
        Some(i) if i > 0 => (&file[..i], &file[i..]),
        _ => (file, ""),
    };
    let base = TEST_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name);

    let expanded = template
        .replace("${name}", name)
        .replace("${base}", base)
        .replace("${ext}", ext);

    if expanded.starts_with('/') || expanded.starts_with('.') {
        expanded
    } else {
        paths::clean(&format!("{}/{expanded}", paths::dir_name(path)))
    }
}

/// In scope iff at least one inclusion matches and no `!` exclusion does.
/// No patterns at all means every path is in scope.
pub fn in_scope(path: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }
    let mut included = false;
    for p in patterns {
        match p.strip_prefix('!') {
            Some(excluded) if pattern::matches(path, excluded) => return false,
            Some(_) => {}
            None => included |= pattern::matches(path, p),
        }
    }
    included
}

fn exists(path: &str, cwd: &Path) -> bool {
    Path::new(&paths::resolve(path, cwd)).exists()
}

fn dir_has_match(dir: &str, glob: &str, cwd: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(paths::resolve(dir, cwd)) else {
        return false;
    };
    entries
        .flatten()
        .any(|entry| pattern::matches(&entry.file_name().to_string_lossy(), glob))
}
