//! Types produced by the compound-command splitter.

/// Shell operator separating consecutive pipeline segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;` or a newline: run next unconditionally
    Semi,
    /// `|`: pipe stdout
    Pipe,
    /// `|&`: pipe stdout+stderr
    PipeErr,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
        }
    }
}

/// A decomposed compound command: segments interleaved with operators.
///
/// For `a && b | c` there are three segments and two operators. Each
/// `$(...)`, backtick or process substitution is replaced by a placeholder
/// in its segment and parsed separately into `substitutions`.
#[derive(Debug, Clone, Default)]
pub struct ParsedPipeline {
    pub segments: Vec<String>,
    pub operators: Vec<Operator>,
    pub substitutions: Vec<ParsedPipeline>,
}

impl ParsedPipeline {
    /// Every segment, outer ones first, then substitution contents depth-first.
    pub fn all_segments(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(
            self.segments
                .iter()
                .map(String::as_str)
                .chain(self.substitutions.iter().flat_map(|s| s.all_segments())),
        )
    }
}
