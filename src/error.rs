use thiserror::Error;

use crate::store::StoreError;
use crate::{EvalError, RuleSetError, ValidationError};

/// Unified error type covering validation, evaluation, rule sets, and storage.
///
/// Returned by convenience functions like [`check()`](crate::check).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskRuleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    RuleSet(#[from] RuleSetError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_pass_through() {
        let err: RiskRuleError = EvalError::DivisionByZero.into();
        assert_eq!(err.to_string(), "division by zero");

        let err: RiskRuleError = ValidationError::EmptyExpression.into();
        assert_eq!(err.to_string(), "expression is empty");
    }
}
