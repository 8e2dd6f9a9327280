use std::fmt;
use std::time::Duration;

use super::error::EvalError;
use super::verdict::Verdict;

/// A rule that could not be evaluated, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    rule: String,
    error: EvalError,
}

impl RuleFailure {
    pub(crate) fn new(rule: impl Into<String>, error: EvalError) -> Self {
        Self {
            rule: rule.into(),
            error,
        }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub fn error(&self) -> &EvalError {
        &self.error
    }
}

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Every active rule is evaluated. The verdict is the one
/// [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate) would return:
/// it is `None` when no rule matched or when a rule ahead of the first match
/// failed.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    verdict: Option<Verdict>,
    matched: Vec<String>,
    failures: Vec<RuleFailure>,
    evaluation_order: Vec<String>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        verdict: Option<Verdict>,
        matched: Vec<String>,
        failures: Vec<RuleFailure>,
        evaluation_order: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            verdict,
            matched,
            failures,
            evaluation_order,
            duration,
        }
    }

    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Names of rules whose expression held, in evaluation order.
    #[must_use]
    pub fn matched(&self) -> &[String] {
        &self.matched
    }

    /// Rules that failed to evaluate, in evaluation order.
    #[must_use]
    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    /// All active rule names in the order they were evaluated.
    #[must_use]
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Some(v) => write!(f, "verdict: {v}")?,
            None => write!(f, "verdict: none")?,
        }
        write!(f, ", matched: [{}]", self.matched.join(", "))?;
        if !self.failures.is_empty() {
            let failed: Vec<&str> = self.failures.iter().map(RuleFailure::rule).collect();
            write!(f, ", failed: [{}]", failed.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
