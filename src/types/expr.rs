use std::fmt;
use std::ops::Not;

use super::Value;

/// Comparison operators supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Binary arithmetic operators permitted in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Unary sign operators permitted in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOp {
    Plus,
    Minus,
}

/// A rule expression tree.
///
/// This is the closed set of node kinds a rule may contain, so evaluating any
/// `Expr` only ever reads features and computes. Trees built by hand are not
/// checked against [`Limits`](crate::Limits) and may hold names or values
/// that no rule text can spell; a [`Rule`](crate::Rule) only ever holds a tree
/// that [`validate`](crate::validate) produced from its text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Feature(String),
    Sign {
        op: SignOp,
        operand: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "+"),
            ArithOp::Sub => write!(f, "-"),
            ArithOp::Mul => write!(f, "*"),
            ArithOp::Div => write!(f, "/"),
            ArithOp::Mod => write!(f, "%"),
        }
    }
}

impl fmt::Display for SignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignOp::Plus => write!(f, "+"),
            SignOp::Minus => write!(f, "-"),
        }
    }
}

/// Fully parenthesized rule text. Trees that [`validate`](crate::validate)
/// produced render to text that validates back to the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Feature(name) => write!(f, "{name}"),
            Expr::Sign { op, operand } => write!(f, "({op}{operand})"),
            Expr::Arith { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Compare { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}

impl Expr {
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// Names of all features this expression references, in first-seen order
    /// and without duplicates.
    #[must_use]
    pub fn features(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_features(self, &mut out);
        out
    }
}

fn collect_features<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Feature(name) => {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        Expr::Literal(_) => {}
        Expr::Sign { operand, .. } | Expr::Not(operand) => collect_features(operand, out),
        Expr::Arith { left, right, .. }
        | Expr::Compare { left, right, .. }
        | Expr::And(left, right)
        | Expr::Or(left, right) => {
            collect_features(left, out);
            collect_features(right, out);
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// Intermediate builder for feature comparison expressions.
/// Created by [`feature()`]; requires a comparison method to produce an [`Expr`].
#[derive(Debug, Clone)]
pub struct FeatureExpr {
    name: String,
}

impl FeatureExpr {
    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(Expr::Feature(self.name)),
            right: Box::new(Expr::Literal(value.into())),
        }
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Eq, value)
    }

    #[must_use]
    pub fn neq(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Neq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Lte, value)
    }

    /// The bare feature reference, for boolean features used directly.
    #[must_use]
    pub fn is_set(self) -> Expr {
        Expr::Feature(self.name)
    }
}

#[must_use]
pub fn feature(name: &str) -> FeatureExpr {
    FeatureExpr {
        name: name.to_owned(),
    }
}
