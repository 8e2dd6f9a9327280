use std::fmt;

use super::rule::Action;

/// The rule that decided a transaction and the action it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    rule: String,
    action: Action,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.rule, self.action)
    }
}

impl Verdict {
    pub fn new(rule: impl Into<String>, action: Action) -> Self {
        Self {
            rule: rule.into(),
            action,
        }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }
}
