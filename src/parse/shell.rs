use super::heredoc::strip_heredocs;
use super::types::{Operator, ParsedPipeline};

/// Placeholder left in the outer command where a substitution was removed.
pub const SUBST_PLACEHOLDER: &str = "__SUBST__";

/// Quote/escape tracking shared by the scanners below.
#[derive(Debug, Default, Clone, Copy)]
struct Quotes {
    single: bool,
    double: bool,
    escaped: bool,
}

impl Quotes {
    /// Feed one character. Returns true when the character is shell syntax,
    /// i.e. not quoted, not escaped, and not itself a quote or backslash.
    fn feed(&mut self, c: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        match c {
            '\\' if !self.single => self.escaped = true,
            '\'' if !self.double => self.single = !self.single,
            '"' if !self.single => self.double = !self.double,
            _ => return !self.single && !self.double,
        }
        false
    }
}

/// Split a command at `&&`, `||`, `;`, `|`, `|&` and newlines, respecting
/// quotes and backslash escapes. Empty segments are dropped.
fn split_compound_command(command: &str) -> (Vec<String>, Vec<Operator>) {
    let chars: Vec<char> = command.chars().collect();
    let mut parts = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !quotes.feed(c) {
            buf.push(c);
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let op = match (c, next) {
            ('&', Some('&')) => Some((Operator::And, 2)),
            ('|', Some('|')) => Some((Operator::Or, 2)),
            ('|', Some('&')) => Some((Operator::PipeErr, 2)),
            ('|', _) => Some((Operator::Pipe, 1)),
            (';', _) | ('\n', _) => Some((Operator::Semi, 1)),
            _ => None,
        };

        match op {
            Some((op, width)) => {
                parts.push(buf.trim().to_string());
                operators.push(op);
                buf.clear();
                i += width;
            }
            None => {
                buf.push(c);
                i += 1;
            }
        }
    }
    parts.push(buf.trim().to_string());
    parts.retain(|p| !p.is_empty());

    (parts, operators)
}

/// Pull `$(...)`, backtick and `<(...)`/`>(...)` bodies out of a command.
///
/// Returns the outer text with each substitution replaced by
/// [`SUBST_PLACEHOLDER`] and the trimmed inner commands in order. Single
/// quotes suppress substitution; double quotes do not, except for process
/// substitution, which bash does not expand inside them.
fn extract_substitutions(command: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = command.chars().collect();
    let mut outer = String::new();
    let mut inners = Vec::new();
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let live = !quotes.single && !quotes.escaped;

        let span = match (c, next) {
            ('$', Some('(')) if live => Some(balanced_paren(&chars, i + 2)),
            ('<' | '>', Some('(')) if live && !quotes.double => Some(balanced_paren(&chars, i + 2)),
            ('`', _) if live => Some(backtick_body(&chars, i + 1)),
            _ => None,
        };

        match span {
            Some((inner, resume)) => {
                let inner = inner.trim();
                if !inner.is_empty() {
                    inners.push(inner.to_string());
                }
                outer.push_str(SUBST_PLACEHOLDER);
                i = resume;
            }
            None => {
                quotes.feed(c);
                outer.push(c);
                i += 1;
            }
        }
    }

    (outer, inners)
}

/// Collect text up to the `)` that balances an already consumed `(`.
/// Returns the body and the index just past the closing paren.
fn balanced_paren(chars: &[char], start: usize) -> (String, usize) {
    let mut depth = 1u32;
    let mut quotes = Quotes::default();
    let mut body = String::new();
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if quotes.feed(c) {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        body.push(c);
    }
    (body, i)
}

/// Collect text up to the next unescaped backtick (no nesting).
fn backtick_body(chars: &[char], start: usize) -> (String, usize) {
    let mut body = String::new();
    let mut i = start;
    while i < chars.len() && chars[i] != '`' {
        if chars[i] == '\\' && i + 1 < chars.len() {
            body.push(chars[i]);
            i += 1;
        }
        body.push(chars[i]);
        i += 1;
    }
    (body, (i + 1).min(chars.len()))
}

/// Parse a full command string into a [`ParsedPipeline`].
///
/// Heredoc bodies are stripped first so their lines cannot be mistaken for
/// commands. Substitutions are extracted, then the outer text is split at
/// compound operators. Substitution contents are parsed the same way.
pub fn parse(command: &str) -> ParsedPipeline {
    let stripped = strip_heredocs(command);
    let (outer, substitutions) = extract_substitutions(&stripped);
    let (segments, operators) = split_compound_command(&outer);

    ParsedPipeline {
        segments,
        operators,
        substitutions: substitutions.iter().map(|inner| parse(inner)).collect(),
    }
}
