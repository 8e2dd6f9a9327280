use std::borrow::Cow;
use std::time::Instant;

use crate::{
    ArithOp, EvalError, EvaluationReport, Expr, FeatureRecord, RiskRuleError, Rule, RuleFailure,
    RuleSetError, SignOp, Value, Verdict,
};

/// Evaluate a validated expression against one feature record.
///
/// `and`/`or` short-circuit, so a feature referenced only by the right-hand
/// side of a decided `and`/`or` does not need to be present.
///
/// # Errors
///
/// Returns [`EvalError`] when a feature is missing, an operator is applied to
/// operands it does not support, arithmetic fails, or the expression does
/// not produce a boolean.
pub fn evaluate(expr: &Expr, features: &FeatureRecord) -> Result<bool, EvalError> {
    match eval(expr, features)?.as_ref() {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::NonBooleanResult {
            found: other.value_type(),
        }),
    }
}

fn eval<'a>(expr: &'a Expr, features: &'a FeatureRecord) -> Result<Cow<'a, Value>, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(Cow::Borrowed(value)),
        Expr::Feature(name) => features
            .get(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| EvalError::UnknownFeature { name: name.clone() }),
        Expr::Sign { op, operand } => {
            let value = eval(operand, features)?;
            sign(*op, &value).map(Cow::Owned)
        }
        Expr::Arith { op, left, right } => {
            let l = eval(left, features)?;
            let r = eval(right, features)?;
            arith(*op, &l, &r).map(Cow::Owned)
        }
        Expr::Compare { op, left, right } => {
            let l = eval(left, features)?;
            let r = eval(right, features)?;
            l.compare(*op, &r)
                .map(|b| Cow::Owned(Value::Bool(b)))
                .ok_or_else(|| mismatch(format!("'{op}'"), &l, Some(&*r)))
        }
        Expr::And(a, b) => {
            if !boolean(a, features, "'and'")? {
                return Ok(Cow::Owned(Value::Bool(false)));
            }
            Ok(Cow::Owned(Value::Bool(boolean(b, features, "'and'")?)))
        }
        Expr::Or(a, b) => {
            if boolean(a, features, "'or'")? {
                return Ok(Cow::Owned(Value::Bool(true)));
            }
            Ok(Cow::Owned(Value::Bool(boolean(b, features, "'or'")?)))
        }
        Expr::Not(inner) => Ok(Cow::Owned(Value::Bool(!boolean(
            inner, features, "'not'",
        )?))),
    }
}

/// Boolean operators take booleans only; there is no truthiness.
fn boolean(expr: &Expr, features: &FeatureRecord, operation: &str) -> Result<bool, EvalError> {
    match eval(expr, features)?.as_ref() {
        Value::Bool(b) => Ok(*b),
        other => Err(mismatch(operation.to_owned(), other, None)),
    }
}

fn mismatch(operation: String, left: &Value, right: Option<&Value>) -> EvalError {
    let found = match right {
        Some(right) => format!("{} and {}", left.value_type(), right.value_type()),
        None => left.value_type().to_string(),
    };
    EvalError::TypeMismatch { operation, found }
}

fn sign(op: SignOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (SignOp::Plus, Value::Int(_) | Value::Float(_)) => Ok(value.clone()),
        (SignOp::Minus, Value::Int(i)) => {
            i.checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::ArithmeticOverflow {
                    operation: "unary '-'".to_owned(),
                })
        }
        (SignOp::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
        _ => Err(mismatch(format!("unary '{op}'"), value, None)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(_) | Value::String(_) => None,
    }
}

fn arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return int_arith(op, *a, *b);
    }
    match (as_float(left), as_float(right)) {
        (Some(a), Some(b)) => float_arith(op, a, b),
        _ => Err(mismatch(format!("'{op}'"), left, Some(right))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::ArithmeticOverflow {
        operation: format!("'{op}'"),
    };
    match op {
        ArithOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        ArithOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
        ArithOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
        // True division: the quotient is always a float.
        ArithOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        ArithOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            // Floored modulo: the result takes the sign of the divisor.
            if r != 0 && (r < 0) != (b < 0) {
                Ok(Value::Int(r + b))
            } else {
                Ok(Value::Int(r))
            }
        }
    }
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        ArithOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
    };
    Ok(Value::Float(result))
}

/// Validate `text` and evaluate it in one step, for callers that keep only
/// the expression source around.
///
/// # Errors
///
/// Returns [`RiskRuleError::Validation`] if the text is rejected and
/// [`RiskRuleError::Eval`] if evaluation fails.
pub fn check(text: &str, features: &FeatureRecord) -> Result<bool, RiskRuleError> {
    let expr = crate::validate(text)?;
    Ok(evaluate(&expr, features)?)
}

/// First active rule that matches, in order. Any evaluation failure before a
/// match aborts the whole evaluation.
pub(crate) fn evaluate_rules(
    rules: &[Rule],
    features: &FeatureRecord,
) -> Result<Option<Verdict>, RuleSetError> {
    for rule in rules.iter().filter(|r| r.is_active()) {
        match rule.matches(features) {
            Ok(true) => {
                tracing::trace!(rule = rule.name(), action = %rule.action(), "rule matched");
                return Ok(Some(Verdict::new(rule.name(), rule.action())));
            }
            Ok(false) => {}
            Err(source) => {
                tracing::warn!(rule = rule.name(), error = %source, "rule evaluation failed");
                return Err(RuleSetError::Evaluation {
                    rule: rule.name().to_owned(),
                    source,
                });
            }
        }
    }
    Ok(None)
}

pub(crate) fn evaluate_detailed(rules: &[Rule], features: &FeatureRecord) -> EvaluationReport {
    let start = Instant::now();

    let mut verdict = None;
    let mut blocked = false;
    let mut matched = Vec::new();
    let mut failures = Vec::new();
    let mut evaluation_order = Vec::new();

    for rule in rules.iter().filter(|r| r.is_active()) {
        evaluation_order.push(rule.name().to_owned());
        match rule.matches(features) {
            Ok(true) => {
                matched.push(rule.name().to_owned());
                if verdict.is_none() && !blocked {
                    verdict = Some(Verdict::new(rule.name(), rule.action()));
                }
            }
            Ok(false) => {}
            Err(error) => {
                tracing::warn!(rule = rule.name(), error = %error, "rule evaluation failed");
                if verdict.is_none() {
                    blocked = true;
                }
                failures.push(RuleFailure::new(rule.name(), error));
            }
        }
    }

    EvaluationReport::new(
        verdict,
        matched,
        failures,
        evaluation_order,
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ValueType, validate};

    fn eval_text(text: &str, features: &FeatureRecord) -> Result<bool, EvalError> {
        let expr = validate(text).unwrap();
        evaluate(&expr, features)
    }

    fn value_of(text: &str) -> Value {
        let expr = validate(text).unwrap();
        let features = FeatureRecord::new();
        eval(&expr, &features).unwrap().into_owned()
    }

    #[test]
    fn eval_simple_comparison() {
        let features = FeatureRecord::new()
            .set("withdrawal_amount", 7500_i64)
            .set("is_new_device", true);
        assert_eq!(
            eval_text("withdrawal_amount > 5000 and is_new_device", &features),
            Ok(true)
        );
        let features = features.set("is_new_device", false);
        assert_eq!(
            eval_text("withdrawal_amount > 5000 and is_new_device", &features),
            Ok(false)
        );
    }

    #[test]
    fn eval_all_compare_ops() {
        let features = FeatureRecord::new().set("x", 10_i64);
        let cases = [
            ("x == 10", true),
            ("x != 10", false),
            ("x > 5", true),
            ("x >= 10", true),
            ("x >= 11", false),
            ("x < 20", true),
            ("x <= 10", true),
            ("x <= 9", false),
        ];
        for (text, expected) in cases {
            assert_eq!(eval_text(text, &features), Ok(expected), "failed for {text}");
        }
    }

    #[test]
    fn eval_arithmetic() {
        assert_eq!(value_of("1 + 2 * 3"), Value::Int(7));
        assert_eq!(value_of("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(value_of("7 - 10"), Value::Int(-3));
        assert_eq!(value_of("1.5 + 1"), Value::Float(2.5));
        assert_eq!(value_of("-(3)"), Value::Int(-3));
        assert_eq!(value_of("+2.5"), Value::Float(2.5));
    }

    #[test]
    fn division_is_true_division() {
        assert_eq!(value_of("7 / 2"), Value::Float(3.5));
        assert_eq!(value_of("6 / 3"), Value::Float(2.0));
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(value_of("7 % 3"), Value::Int(1));
        assert_eq!(value_of("-7 % 3"), Value::Int(2));
        assert_eq!(value_of("7 % -3"), Value::Int(-2));
        assert_eq!(value_of("-7.5 % 2"), Value::Float(0.5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let features = FeatureRecord::new().set("withdrawal_amount", 10_i64);
        assert_eq!(
            eval_text("withdrawal_amount / 0 > 1", &features),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            eval_text("withdrawal_amount % 0 > 1", &features),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            eval_text("withdrawal_amount / 0.0 > 1", &features),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let features = FeatureRecord::new().set("big", i64::MAX).set("min", i64::MIN);
        assert!(matches!(
            eval_text("big + 1 > 0", &features),
            Err(EvalError::ArithmeticOverflow { .. })
        ));
        assert!(matches!(
            eval_text("-min > 0", &features),
            Err(EvalError::ArithmeticOverflow { .. })
        ));
        assert!(matches!(
            eval_text("min % -1 == 0", &features),
            Err(EvalError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn unknown_feature_is_an_error() {
        let features = FeatureRecord::new();
        assert_eq!(
            eval_text("device_age_days < 2", &features),
            Err(EvalError::UnknownFeature {
                name: "device_age_days".into()
            })
        );
    }

    #[test]
    fn and_short_circuits_on_false() {
        let features = FeatureRecord::new().set("is_vip", false);
        assert_eq!(eval_text("is_vip and missing_feature > 1", &features), Ok(false));
    }

    #[test]
    fn or_short_circuits_on_true() {
        let features = FeatureRecord::new().set("session_risk_score", 90_i64);
        assert_eq!(
            eval_text(
                "session_risk_score >= 80 or (is_sanctioned and not user_whitelisted)",
                &features
            ),
            Ok(true)
        );
    }

    #[test]
    fn right_operand_is_required_when_left_does_not_decide() {
        let features = FeatureRecord::new().set("is_vip", true);
        assert_eq!(
            eval_text("is_vip and missing_feature", &features),
            Err(EvalError::UnknownFeature {
                name: "missing_feature".into()
            })
        );
    }

    #[test]
    fn ordering_across_types_is_a_mismatch() {
        let features = FeatureRecord::new().set("country", "NG");
        assert_eq!(
            eval_text("country > 5", &features),
            Err(EvalError::TypeMismatch {
                operation: "'>'".into(),
                found: "string and int".into(),
            })
        );
    }

    #[test]
    fn equality_across_types_is_false() {
        let features = FeatureRecord::new().set("country", "NG");
        assert_eq!(eval_text("country == 5", &features), Ok(false));
        assert_eq!(eval_text("country != 5", &features), Ok(true));
    }

    #[test]
    fn booleans_are_not_numbers() {
        let features = FeatureRecord::new().set("flag", true);
        assert!(matches!(
            eval_text("flag + 1 > 0", &features),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            eval_text("-flag", &features),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn boolean_operators_reject_non_booleans() {
        let features = FeatureRecord::new().set("score", 3_i64);
        assert_eq!(
            eval_text("score and true", &features),
            Err(EvalError::TypeMismatch {
                operation: "'and'".into(),
                found: "int".into(),
            })
        );
        assert!(matches!(
            eval_text("not score", &features),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn non_boolean_root_is_an_error() {
        let features = FeatureRecord::new().set("amount", 10_i64);
        assert_eq!(
            eval_text("amount * 2", &features),
            Err(EvalError::NonBooleanResult {
                found: ValueType::Int
            })
        );
        assert_eq!(
            eval_text("'text'", &features),
            Err(EvalError::NonBooleanResult {
                found: ValueType::String
            })
        );
    }

    #[test]
    fn string_comparison() {
        let features = FeatureRecord::new().set("chain", "TRON");
        assert_eq!(eval_text("chain == 'TRON'", &features), Ok(true));
        assert_eq!(eval_text("chain < 'ZZZ'", &features), Ok(true));
    }

    #[test]
    fn mixed_int_float_comparison() {
        let features = FeatureRecord::new().set("score", 10_i64);
        assert_eq!(eval_text("score == 10.0", &features), Ok(true));
        assert_eq!(eval_text("score / 4 == 2.5", &features), Ok(true));
    }

    #[test]
    fn check_validates_then_evaluates() {
        let features = FeatureRecord::new().set("amount", 10_i64);
        assert!(matches!(check("amount > 5", &features), Ok(true)));
        assert!(matches!(
            check("__import__('os')", &features),
            Err(RiskRuleError::Validation(_))
        ));
        assert!(matches!(
            check("amount / 0 > 1", &features),
            Err(RiskRuleError::Eval(EvalError::DivisionByZero))
        ));
    }
}
