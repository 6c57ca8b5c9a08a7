pub mod heredoc;
pub mod shell;
pub mod tokenize;
pub mod types;

pub use heredoc::strip_heredocs;
pub use shell::{SUBST_PLACEHOLDER, parse};
pub use tokenize::{ParsedCommand, tokenize};
pub use types::{Operator, ParsedPipeline};
