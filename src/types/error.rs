use thiserror::Error;

use super::value::ValueType;
use crate::parse::NodeKind;

/// Why a rule expression was rejected. Surfaced verbatim to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expression is empty")]
    EmptyExpression,

    /// `offset` counts characters into the normalized expression text.
    #[error("syntax error at offset {offset}: {message}")]
    SyntaxError { message: String, offset: usize },

    #[error("disallowed element: {kind}")]
    DisallowedElement { kind: NodeKind },
}

/// Failures while evaluating a validated expression against a feature record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown feature '{name}'")]
    UnknownFeature { name: String },

    #[error("type mismatch: cannot apply {operation} to {found}")]
    TypeMismatch { operation: String, found: String },

    #[error("expression evaluated to {found}, expected bool")]
    NonBooleanResult { found: ValueType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {operation}")]
    ArithmeticOverflow { operation: String },
}

/// Errors from building or evaluating a [`RuleSet`](crate::RuleSet).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSetError {
    #[error("rule '{rule}' has an invalid expression: {source}")]
    InvalidRule {
        rule: String,
        source: ValidationError,
    },

    /// A tree given directly has no rule text that validates back to it.
    #[error("rule '{rule}' cannot be written as rule text: {text}")]
    Unrepresentable { rule: String, text: String },

    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("rule '{rule}' has no action")]
    MissingAction { rule: String },

    #[error("unknown action '{value}'; expected PASS, HOLD or REJECT")]
    UnknownAction { value: String },

    #[error("unknown rule status '{value}'; expected ACTIVE or INACTIVE")]
    UnknownStatus { value: String },

    #[error("rule '{rule}' failed to evaluate: {source}")]
    Evaluation { rule: String, source: EvalError },
}
