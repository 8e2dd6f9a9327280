//! Restricted rule expressions for transaction-risk review.
//!
//! Operators write rules such as `withdrawal_amount > 5000 and is_new_device`.
//! [`validate()`] parses the text and accepts only a closed set of node kinds
//! (literals, feature names, arithmetic, comparisons, and boolean logic),
//! producing an [`Expr`]. [`evaluate()`] runs an `Expr` against a
//! [`FeatureRecord`]. On top of that, [`RuleSet`] turns a record into a
//! [`Verdict`] and [`store::RuleStore`] only ever persists validated rules.

mod compile;
mod error;
mod evaluate;
mod parse;
pub mod store;
mod types;
mod validate;

pub use error::RiskRuleError;
pub use evaluate::{check, evaluate};
pub use parse::NodeKind;
pub use types::{
    Action, ArithOp, CompareOp, DEFAULT_PRIORITY, EvalError, EvaluationReport, Expr, FeatureExpr,
    FeatureRecord, Rule, RuleBuilder, RuleDraft, RuleFailure, RuleSet, RuleSetBuilder,
    RuleSetError, RuleStatus, SignOp, ValidationError, Value, ValueType, Verdict, feature,
};
pub use validate::{Limits, Validator, validate};
