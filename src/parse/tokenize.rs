use super::heredoc::strip_heredocs;

/// A shell command broken into the pieces the policy layer inspects.
///
/// Heredoc bodies are stripped before tokenizing, so nothing here comes
/// from inside one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The first word after any leading assignments (e.g. `"go"`).
    pub program: String,
    /// Positional words, in order.
    pub args: Vec<String>,
    /// `-flag[=value]` / `--flag[=value]` words, in order. A flag without
    /// `=` has an empty value. Duplicates are kept.
    pub flags: Vec<(String, String)>,
    /// Leading `NAME=value` assignments.
    pub env: Vec<(String, String)>,
}

impl ParsedCommand {
    /// Parse a raw command string.
    pub fn parse(raw: &str) -> Self {
        let words = tokenize(&strip_heredocs(raw));
        let mut parsed = ParsedCommand::default();
        let mut iter = words.into_iter().peekable();

        while let Some(word) = iter.next_if(|w| split_assignment(w).is_some()) {
            if let Some((name, value)) = split_assignment(&word) {
                parsed.env.push((name.to_string(), value.to_string()));
            }
        }

        parsed.program = iter.next().unwrap_or_default();

        let mut options_done = false;
        for word in iter {
            if !options_done && word == "--" {
                options_done = true;
                continue;
            }
            if !options_done && word.len() > 1 && word.starts_with('-') {
                match word.split_once('=') {
                    Some((flag, value)) => parsed.flags.push((flag.to_string(), value.to_string())),
                    None => parsed.flags.push((word, String::new())),
                }
                continue;
            }
            parsed.args.push(word);
        }

        parsed
    }

    /// First value recorded for a flag, if the flag is present.
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(flag, _)| flag == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Split a `NAME=value` word, where NAME is a valid shell identifier.
pub(crate) fn split_assignment(word: &str) -> Option<(&str, &str)> {
    let (name, value) = word.split_once('=')?;
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    valid.then_some((name, value))
}

/// Tokenize a command into words using shlex (POSIX word splitting).
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        command.split_whitespace().map(String::from).collect()
    })
}
