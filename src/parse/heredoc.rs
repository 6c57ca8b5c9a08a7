use std::sync::LazyLock;

use regex::Regex;

/// `<<` or `<<-`, optional whitespace, optionally quoted word delimiter.
static HEREDOC_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<<-?\s*['"]?(\w+)['"]?"#).expect("heredoc opener regex must compile")
});

/// Remove heredoc bodies (and their openers) from a command string.
///
/// The body starts on the line after the opener and runs through the first
/// line that is exactly the delimiter. Anything else on the opener's line,
/// such as `> out.txt` or `| sh`, is kept. An opener without a closing line
/// is left untouched.
pub fn strip_heredocs(cmd: &str) -> String {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    // Openers that sit inside an excised body are plain text.
    let mut bodies: Vec<(usize, usize)> = Vec::new();

    for caps in HEREDOC_OPENER.captures_iter(cmd) {
        let (Some(opener), Some(delim)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if bodies
            .iter()
            .any(|&(start, end)| opener.start() >= start && opener.start() < end)
        {
            continue;
        }
        let Some(newline) = cmd[opener.end()..].find('\n').map(|i| opener.end() + i) else {
            continue;
        };
        let Some(close_end) = closing_line_end(cmd, newline + 1, delim.as_str()) else {
            continue;
        };

        ranges.push((opener.start(), opener.end()));
        ranges.push((newline, close_end));
        bodies.push((newline, close_end));
    }

    if ranges.is_empty() {
        return cmd.to_string();
    }

    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    // Apply back to front so earlier offsets stay valid.
    let mut out = cmd.to_string();
    for (start, end) in merged.into_iter().rev() {
        out.replace_range(start..end, "");
    }
    out
}

/// Byte offset just past the closing delimiter line, before its `\n`.
fn closing_line_end(cmd: &str, body_start: usize, delim: &str) -> Option<usize> {
    let mut offset = body_start;
    for line in cmd[body_start..].split_inclusive('\n') {
        let without_newline = line.trim_end_matches('\n');
        if without_newline.trim_end_matches('\r') == delim {
            return Some(offset + without_newline.len());
        }
        offset += line.len();
    }
    None
}
