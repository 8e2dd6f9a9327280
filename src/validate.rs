use crate::parse::{self, BinaryOp, NodeKind, Syntax, UnaryOp};
use crate::{ArithOp, Expr, SignOp, ValidationError, Value};

/// Bounds applied to expression text before it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of the normalized expression, in characters.
    pub max_length: usize,
    /// Maximum nesting. Brackets, prefix operators and each link of an
    /// operator chain count one level, and the parsed tree may be no deeper.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_length: 4096,
            max_depth: 64,
        }
    }
}

/// Validates rule expressions under a set of [`Limits`].
///
/// ```
/// use riskrule::Validator;
///
/// let validator = Validator::new().max_length(256);
/// assert!(validator.validate("withdrawal_amount > 5000 and is_new_device").is_ok());
/// assert!(validator.validate("__import__('os').system('ls')").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: Limits,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.limits.max_length = max_length;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Validate an expression, returning its safe tree.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyExpression`] for blank input,
    /// [`ValidationError::SyntaxError`] for grammar violations or exceeded
    /// limits, and [`ValidationError::DisallowedElement`] for the first node
    /// outside the allow-set.
    pub fn validate(&self, text: &str) -> Result<Expr, ValidationError> {
        let result = self.validate_inner(text);
        if let Err(err) = &result {
            tracing::debug!(expression = text, reason = %err, "rule expression rejected");
        }
        result
    }

    fn validate_inner(&self, text: &str) -> Result<Expr, ValidationError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(ValidationError::EmptyExpression);
        }
        self.check_limits(&normalized)?;
        let syntax = parse::parse(&normalized, self.limits.max_depth).map_err(|e| {
            ValidationError::SyntaxError {
                message: e.message().to_owned(),
                offset: e.offset(),
            }
        })?;
        // The tree carries no positions, so this points past the end.
        if syntax.height() > self.limits.max_depth {
            return Err(self.too_deep(normalized.chars().count()));
        }
        lower(syntax)
    }

    fn too_deep(&self, offset: usize) -> ValidationError {
        ValidationError::SyntaxError {
            message: format!(
                "expression nested deeper than {} levels",
                self.limits.max_depth
            ),
            offset,
        }
    }

    fn check_limits(&self, text: &str) -> Result<(), ValidationError> {
        if let Some((offset, _)) = text.char_indices().nth(self.limits.max_length) {
            return Err(ValidationError::SyntaxError {
                message: format!(
                    "expression longer than {} characters",
                    self.limits.max_length
                ),
                offset: text[..offset].chars().count(),
            });
        }
        if let Some(offset) = depth_violation(text, self.limits.max_depth) {
            return Err(self.too_deep(offset));
        }
        Ok(())
    }
}

/// Validate an expression with the default [`Limits`].
///
/// # Errors
///
/// See [`Validator::validate`].
pub fn validate(text: &str) -> Result<Expr, ValidationError> {
    Validator::new().validate(text)
}

/// Line breaks become spaces; surrounding whitespace is dropped.
fn normalize(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_owned()
}

/// Character offset of the first bracket that exceeds `max_depth`, ignoring
/// brackets inside string literals.
fn depth_violation(text: &str, max_depth: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in text.chars().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => {
                depth += 1;
                if depth > max_depth {
                    return Some(offset);
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// A minus applied directly to a non-negative number becomes a negative
/// literal, so `-5` and `Value::Int(-5)` are the same tree.
fn signed(op: SignOp, operand: Expr) -> Expr {
    match (op, operand) {
        (SignOp::Minus, Expr::Literal(Value::Int(n))) if n >= 0 => Expr::Literal(Value::Int(-n)),
        (SignOp::Minus, Expr::Literal(Value::Float(f))) if f.is_sign_positive() => {
            Expr::Literal(Value::Float(-f))
        }
        (op, operand) => Expr::Sign {
            op,
            operand: Box::new(operand),
        },
    }
}

fn disallowed(kind: NodeKind) -> ValidationError {
    ValidationError::DisallowedElement { kind }
}

/// The allow-set walk. Visits nodes pre-order and stops at the first one
/// that is not permitted. Every surface node kind is named explicitly here,
/// so a new kind does not compile until it is classified.
fn lower(node: Syntax) -> Result<Expr, ValidationError> {
    let kind = node.kind();
    match node {
        Syntax::Literal(value) => Ok(Expr::Literal(value)),
        Syntax::Name(name) => Ok(Expr::Feature(name)),
        Syntax::Unary { op, operand } => {
            let op = match op {
                UnaryOp::Plus => SignOp::Plus,
                UnaryOp::Minus => SignOp::Minus,
                UnaryOp::Invert => return Err(disallowed(kind)),
            };
            Ok(signed(op, lower(*operand)?))
        }
        Syntax::Binary { op, left, right } => {
            let op = match op {
                BinaryOp::Add => ArithOp::Add,
                BinaryOp::Sub => ArithOp::Sub,
                BinaryOp::Mul => ArithOp::Mul,
                BinaryOp::Div => ArithOp::Div,
                BinaryOp::Mod => ArithOp::Mod,
                BinaryOp::FloorDiv
                | BinaryOp::Pow
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::ShiftLeft
                | BinaryOp::ShiftRight => return Err(disallowed(kind)),
            };
            Ok(Expr::Arith {
                op,
                left: Box::new(lower(*left)?),
                right: Box::new(lower(*right)?),
            })
        }
        Syntax::Compare { op, left, right } => Ok(Expr::Compare {
            op,
            left: Box::new(lower(*left)?),
            right: Box::new(lower(*right)?),
        }),
        Syntax::And(a, b) => Ok(Expr::And(Box::new(lower(*a)?), Box::new(lower(*b)?))),
        Syntax::Or(a, b) => Ok(Expr::Or(Box::new(lower(*a)?), Box::new(lower(*b)?))),
        Syntax::Not(inner) => Ok(Expr::Not(Box::new(lower(*inner)?))),
        Syntax::Null
        | Syntax::Membership { .. }
        | Syntax::Identity { .. }
        | Syntax::Call { .. }
        | Syntax::Attribute { .. }
        | Syntax::Subscript { .. }
        | Syntax::Assignment { .. }
        | Syntax::Lambda { .. }
        | Syntax::Conditional { .. }
        | Syntax::FormattedString(_)
        | Syntax::Sequence(_)
        | Syntax::Comprehension { .. } => Err(disallowed(kind)),
    }
}
