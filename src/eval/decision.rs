/// The verdict for one invocation.
///
/// A denial always carries a reason; an allow may carry an advisory warning
/// that is surfaced to the agent without blocking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow { warning: Option<String> },
    Deny { reason: String },
}

impl Decision {
    pub fn allow() -> Self {
        Decision::Allow { warning: None }
    }

    pub fn advise(warning: impl Into<String>) -> Self {
        Decision::Allow {
            warning: Some(warning.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Deny { reason } => Some(reason),
            Decision::Allow { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Decision::Allow { warning } => warning.as_deref(),
            Decision::Deny { .. } => None,
        }
    }

    /// Hook protocol spelling of the verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow { .. } => "allow",
            Decision::Deny { .. } => "deny",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow { warning: None } => "ALLOW",
            Decision::Allow { warning: Some(_) } => "ADVISE",
            Decision::Deny { .. } => "DENY",
        }
    }
}
