mod error;
mod evaluation_report;
mod expr;
mod features;
mod rule;
mod ruleset;
mod value;
mod verdict;

pub use error::{EvalError, RuleSetError, ValidationError};
pub use evaluation_report::{EvaluationReport, RuleFailure};
pub use expr::{ArithOp, CompareOp, Expr, FeatureExpr, SignOp, feature};
pub use features::FeatureRecord;
pub use rule::{Action, DEFAULT_PRIORITY, Rule, RuleDraft, RuleStatus};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use value::{Value, ValueType};
pub use verdict::Verdict;
