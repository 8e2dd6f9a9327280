use std::fmt;
use std::str::FromStr;

use super::error::{EvalError, RuleSetError};
use super::expr::Expr;
use super::features::FeatureRecord;
use crate::validate::Validator;

/// Priority given to rules that do not set one.
pub const DEFAULT_PRIORITY: i32 = 10;

/// What the decision pipeline does with a transaction a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Action {
    Pass,
    Hold,
    Reject,
}

/// Whether a rule takes part in evaluation. Unrelated to validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl FromStr for Action {
    type Err = RuleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(Action::Pass),
            "HOLD" => Ok(Action::Hold),
            "REJECT" => Ok(Action::Reject),
            _ => Err(RuleSetError::UnknownAction {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pass => write!(f, "PASS"),
            Action::Hold => write!(f, "HOLD"),
            Action::Reject => write!(f, "REJECT"),
        }
    }
}

impl FromStr for RuleStatus {
    type Err = RuleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(RuleStatus::Active),
            "INACTIVE" => Ok(RuleStatus::Inactive),
            _ => Err(RuleSetError::UnknownStatus {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStatus::Active => write!(f, "ACTIVE"),
            RuleStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

#[cfg(feature = "serde")]
fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// A rule as an operator submitted it: text only, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleDraft {
    pub name: String,
    pub logic_expression: String,
    pub action: Action,
    #[cfg_attr(feature = "serde", serde(default))]
    pub narrative: String,
    #[cfg_attr(feature = "serde", serde(default = "default_priority"))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: RuleStatus,
}

impl RuleDraft {
    /// A draft with an empty narrative, the default priority, and active status.
    #[must_use]
    pub fn new(name: &str, logic_expression: &str, action: Action) -> Self {
        Self {
            name: name.to_owned(),
            logic_expression: logic_expression.to_owned(),
            action,
            narrative: String::new(),
            priority: DEFAULT_PRIORITY,
            status: RuleStatus::Active,
        }
    }

    #[must_use]
    pub fn narrative(mut self, narrative: &str) -> Self {
        self.narrative = narrative.to_owned();
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    /// Validate the logic expression with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::InvalidRule`] naming this rule and the reason.
    pub fn validate(self) -> Result<Rule, RuleSetError> {
        self.validate_with(&Validator::new())
    }

    /// Validate the logic expression with the given validator.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::InvalidRule`] naming this rule and the reason.
    pub fn validate_with(self, validator: &Validator) -> Result<Rule, RuleSetError> {
        match validator.validate(&self.logic_expression) {
            Ok(expr) => Ok(Rule { draft: self, expr }),
            Err(source) => Err(RuleSetError::InvalidRule {
                rule: self.name,
                source,
            }),
        }
    }
}

/// A rule whose logic expression passed validation.
///
/// The only way to obtain one is [`RuleDraft::validate`], so anything that
/// accepts a `Rule` (a [`RuleSet`](super::RuleSet), a
/// [`RuleStore`](crate::store::RuleStore)) never sees an unchecked expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    draft: RuleDraft,
    expr: Expr,
}

impl Rule {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.draft.name
    }

    #[must_use]
    pub fn logic_expression(&self) -> &str {
        &self.draft.logic_expression
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.draft.action
    }

    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.draft.narrative
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.draft.priority
    }

    #[must_use]
    pub fn status(&self) -> RuleStatus {
        self.draft.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.draft.status == RuleStatus::Active
    }

    /// The validated expression tree.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Whether this rule's expression holds for the given features.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the expression cannot be evaluated.
    pub fn matches(&self, features: &FeatureRecord) -> Result<bool, EvalError> {
        crate::evaluate::evaluate(&self.expr, features)
    }

    /// Back to an editable draft. Edits must be validated again.
    #[must_use]
    pub fn into_draft(self) -> RuleDraft {
        self.draft
    }
}
