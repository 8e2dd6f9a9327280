use std::fmt;

use super::error::RuleSetError;
use super::evaluation_report::EvaluationReport;
use super::expr::Expr;
use super::features::FeatureRecord;
use super::rule::{Action, DEFAULT_PRIORITY, Rule, RuleDraft, RuleStatus};
use super::verdict::Verdict;
use crate::validate::Validator;

/// Builder for constructing a [`RuleSet`].
///
/// Rules are defined via closures and compiled into an immutable, thread-safe
/// set. Every rule's expression is validated during [`compile()`](Self::compile).
///
/// # Example
///
/// ```
/// use riskrule::{Action, FeatureRecord, RuleSetBuilder};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("sanctioned", |r| r.when("is_sanctioned").action(Action::Reject).priority(100))
///     .rule("big_withdrawal", |r| {
///         r.when("withdrawal_amount > 5000 and is_new_device").action(Action::Hold)
///     })
///     .compile()
///     .unwrap();
///
/// let features = FeatureRecord::new()
///     .set("is_sanctioned", false)
///     .set("withdrawal_amount", 6000_i64)
///     .set("is_new_device", true);
/// let verdict = ruleset.evaluate(&features).unwrap().unwrap();
/// assert_eq!(verdict.rule(), "big_withdrawal");
/// assert_eq!(verdict.action(), Action::Hold);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    entries: Vec<Entry>,
    validator: Validator,
}

#[derive(Debug)]
enum Entry {
    Built { name: String, builder: RuleBuilder },
    Draft(RuleDraft),
    Validated(Rule),
}

#[derive(Debug)]
enum Condition {
    Text(String),
    Expr(Expr),
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    condition: Option<Condition>,
    action: Option<Action>,
    narrative: String,
    priority: i32,
    status: RuleStatus,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate rule expressions with this validator instead of the default.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Define a rule. The closure must call `.when(..)` and `.action(..)`.
    ///
    /// A rule without `.when()` fails compilation as an empty expression; one
    /// without `.action()` fails with [`RuleSetError::MissingAction`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::new());
        self.entries.push(Entry::Built {
            name: name.to_owned(),
            builder,
        });
        self
    }

    /// Add an unvalidated draft. It is validated during compilation.
    #[must_use]
    pub fn draft(mut self, draft: RuleDraft) -> Self {
        self.entries.push(Entry::Draft(draft));
        self
    }

    /// Add a rule that has already been validated.
    #[must_use]
    pub fn add(mut self, rule: Rule) -> Self {
        self.entries.push(Entry::Validated(rule));
        self
    }

    /// Validate every rule and compile them into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleSetError`] encountered, in definition order.
    pub fn compile(self) -> Result<RuleSet, RuleSetError> {
        let validator = self.validator;
        let rules = self
            .entries
            .into_iter()
            .map(|entry| entry.into_rule(&validator))
            .collect::<Result<Vec<_>, _>>()?;
        crate::compile::compile(rules)
    }
}

impl Entry {
    fn into_rule(self, validator: &Validator) -> Result<Rule, RuleSetError> {
        match self {
            Entry::Validated(rule) => Ok(rule),
            Entry::Draft(draft) => draft.validate_with(validator),
            Entry::Built { name, builder } => {
                let Some(action) = builder.action else {
                    return Err(RuleSetError::MissingAction { rule: name });
                };
                let text = match &builder.condition {
                    Some(Condition::Text(text)) => text.clone(),
                    Some(Condition::Expr(expr)) => expr.to_string(),
                    None => String::new(),
                };
                let rule = RuleDraft::new(&name, &text, action)
                    .narrative(&builder.narrative)
                    .priority(builder.priority)
                    .status(builder.status)
                    .validate_with(validator)?;
                match builder.condition {
                    // The stored text must mean exactly the tree that was given.
                    Some(Condition::Expr(expr)) if *rule.expr() != expr => {
                        Err(RuleSetError::Unrepresentable { rule: name, text })
                    }
                    _ => Ok(rule),
                }
            }
        }
    }
}

impl RuleBuilder {
    fn new() -> Self {
        Self {
            condition: None,
            action: None,
            narrative: String::new(),
            priority: DEFAULT_PRIORITY,
            status: RuleStatus::Active,
        }
    }

    /// Set the condition from expression text.
    #[must_use]
    pub fn when(mut self, expression: &str) -> Self {
        self.condition = Some(Condition::Text(expression.to_owned()));
        self
    }

    /// Set the condition from an already constructed expression tree.
    ///
    /// The rule's text is the tree's rendering. Compilation validates that
    /// text like any other and fails with [`RuleSetError::Unrepresentable`]
    /// unless it reads back as this same tree.
    #[must_use]
    pub fn when_expr(mut self, expr: Expr) -> Self {
        self.condition = Some(Condition::Expr(expr));
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn narrative(mut self, narrative: &str) -> Self {
        self.narrative = narrative.to_owned();
        self
    }

    /// Higher priorities are evaluated first.
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
}

/// A compiled, immutable set of validated rules, ordered by priority
/// (highest first, definition order among equals). Thread-safe and designed
/// to live behind `Arc`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
}

impl RuleSet {
    /// Validate and compile a batch of drafts.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if any draft is invalid or names collide.
    pub fn from_drafts(drafts: impl IntoIterator<Item = RuleDraft>) -> Result<Self, RuleSetError> {
        drafts
            .into_iter()
            .fold(RuleSetBuilder::new(), RuleSetBuilder::draft)
            .compile()
    }

    /// Evaluate the active rules in order and return the verdict of the first
    /// one that matches, or `None` if none does.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::Evaluation`] if a rule reached before the first
    /// match cannot be evaluated. A failing rule never counts as a miss.
    pub fn evaluate(&self, features: &FeatureRecord) -> Result<Option<Verdict>, RuleSetError> {
        crate::evaluate::evaluate_rules(&self.rules, features)
    }

    /// Evaluate every active rule and report matches, failures, and timing.
    pub fn evaluate_detailed(&self, features: &FeatureRecord) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(&self.rules, features)
    }

    /// Names of active rules in evaluation order.
    #[must_use]
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.is_active())
            .map(Rule::name)
            .collect()
    }

    /// All rules, inactive ones included, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} active)",
            self.rules.len(),
            self.rules.iter().filter(|r| r.is_active()).count(),
        )
    }
}
