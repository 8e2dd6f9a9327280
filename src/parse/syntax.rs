use std::fmt;

use crate::{CompareOp, Value};

/// Unary operators recognized by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Plus,
    Minus,
    Invert,
}

/// Binary operators recognized by the grammar, permitted or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

/// Surface syntax tree produced by the grammar.
///
/// The grammar recognizes constructs that rules may not use so that they can
/// be reported by name. Only the allow-set walk in
/// [`validate`](crate::validate) turns this into an [`Expr`](crate::Expr).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Syntax {
    Literal(Value),
    Null,
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Syntax>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    Compare {
        op: CompareOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    Membership {
        negated: bool,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    Identity {
        negated: bool,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    And(Box<Syntax>, Box<Syntax>),
    Or(Box<Syntax>, Box<Syntax>),
    Not(Box<Syntax>),
    Call {
        callee: Box<Syntax>,
        args: Vec<Syntax>,
    },
    Attribute {
        object: Box<Syntax>,
        name: String,
    },
    Subscript {
        object: Box<Syntax>,
        index: Box<Syntax>,
    },
    Assignment {
        target: String,
        value: Box<Syntax>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Syntax>,
    },
    Conditional {
        then: Box<Syntax>,
        condition: Box<Syntax>,
        otherwise: Box<Syntax>,
    },
    FormattedString(String),
    Sequence(Vec<Syntax>),
    Comprehension {
        element: Box<Syntax>,
        target: String,
        iter: Box<Syntax>,
        filters: Vec<Syntax>,
    },
}

/// The kind of a syntax node, as reported by
/// [`ValidationError::DisallowedElement`](crate::ValidationError::DisallowedElement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Null,
    Name,
    UnaryPlus,
    UnaryMinus,
    Invert,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Compare,
    Membership,
    Identity,
    And,
    Or,
    Not,
    Call,
    Attribute,
    Subscript,
    Assignment,
    Lambda,
    Conditional,
    FormattedString,
    Sequence,
    Comprehension,
}

impl Syntax {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Syntax::Literal(_) => NodeKind::Literal,
            Syntax::Null => NodeKind::Null,
            Syntax::Name(_) => NodeKind::Name,
            Syntax::Unary { op, .. } => match op {
                UnaryOp::Plus => NodeKind::UnaryPlus,
                UnaryOp::Minus => NodeKind::UnaryMinus,
                UnaryOp::Invert => NodeKind::Invert,
            },
            Syntax::Binary { op, .. } => match op {
                BinaryOp::Add => NodeKind::Add,
                BinaryOp::Sub => NodeKind::Sub,
                BinaryOp::Mul => NodeKind::Mul,
                BinaryOp::Div => NodeKind::Div,
                BinaryOp::Mod => NodeKind::Mod,
                BinaryOp::FloorDiv => NodeKind::FloorDiv,
                BinaryOp::Pow => NodeKind::Pow,
                BinaryOp::BitAnd => NodeKind::BitAnd,
                BinaryOp::BitOr => NodeKind::BitOr,
                BinaryOp::BitXor => NodeKind::BitXor,
                BinaryOp::ShiftLeft => NodeKind::ShiftLeft,
                BinaryOp::ShiftRight => NodeKind::ShiftRight,
            },
            Syntax::Compare { .. } => NodeKind::Compare,
            Syntax::Membership { .. } => NodeKind::Membership,
            Syntax::Identity { .. } => NodeKind::Identity,
            Syntax::And(..) => NodeKind::And,
            Syntax::Or(..) => NodeKind::Or,
            Syntax::Not(_) => NodeKind::Not,
            Syntax::Call { .. } => NodeKind::Call,
            Syntax::Attribute { .. } => NodeKind::Attribute,
            Syntax::Subscript { .. } => NodeKind::Subscript,
            Syntax::Assignment { .. } => NodeKind::Assignment,
            Syntax::Lambda { .. } => NodeKind::Lambda,
            Syntax::Conditional { .. } => NodeKind::Conditional,
            Syntax::FormattedString(_) => NodeKind::FormattedString,
            Syntax::Sequence(_) => NodeKind::Sequence,
            Syntax::Comprehension { .. } => NodeKind::Comprehension,
        }
    }

    fn children(&self) -> Vec<&Syntax> {
        match self {
            Syntax::Literal(_) | Syntax::Null | Syntax::Name(_) | Syntax::FormattedString(_) => {
                Vec::new()
            }
            Syntax::Unary { operand: inner, .. }
            | Syntax::Not(inner)
            | Syntax::Attribute { object: inner, .. }
            | Syntax::Assignment { value: inner, .. }
            | Syntax::Lambda { body: inner, .. } => vec![inner.as_ref()],
            Syntax::Binary { left, right, .. }
            | Syntax::Compare { left, right, .. }
            | Syntax::Membership { left, right, .. }
            | Syntax::Identity { left, right, .. }
            | Syntax::And(left, right)
            | Syntax::Or(left, right)
            | Syntax::Subscript {
                object: left,
                index: right,
            } => vec![left.as_ref(), right.as_ref()],
            Syntax::Call { callee, args } => {
                let mut out = vec![callee.as_ref()];
                out.extend(args);
                out
            }
            Syntax::Conditional {
                then,
                condition,
                otherwise,
            } => vec![then.as_ref(), condition.as_ref(), otherwise.as_ref()],
            Syntax::Sequence(items) => items.iter().collect(),
            Syntax::Comprehension {
                element,
                iter,
                filters,
                ..
            } => {
                let mut out = vec![element.as_ref(), iter.as_ref()];
                out.extend(filters);
                out
            }
        }
    }

    /// Nodes on the longest path from this node to a leaf. Walks with an
    /// explicit stack so arbitrarily deep trees can be measured.
    pub(crate) fn height(&self) -> usize {
        let mut stack = vec![(self, 1_usize)];
        let mut height = 0;
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            stack.extend(node.children().into_iter().map(|child| (child, depth + 1)));
        }
        height
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Literal => "literal",
            NodeKind::Null => "null literal",
            NodeKind::Name => "feature name",
            NodeKind::UnaryPlus => "unary plus",
            NodeKind::UnaryMinus => "unary minus",
            NodeKind::Invert => "bitwise inversion '~'",
            NodeKind::Add => "addition",
            NodeKind::Sub => "subtraction",
            NodeKind::Mul => "multiplication",
            NodeKind::Div => "division",
            NodeKind::Mod => "modulo",
            NodeKind::FloorDiv => "floor division '//'",
            NodeKind::Pow => "power '**'",
            NodeKind::BitAnd => "bitwise and '&'",
            NodeKind::BitOr => "bitwise or '|'",
            NodeKind::BitXor => "bitwise xor '^'",
            NodeKind::ShiftLeft => "left shift '<<'",
            NodeKind::ShiftRight => "right shift '>>'",
            NodeKind::Compare => "comparison",
            NodeKind::Membership => "membership test 'in'",
            NodeKind::Identity => "identity test 'is'",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Call => "function call",
            NodeKind::Attribute => "attribute access",
            NodeKind::Subscript => "subscript",
            NodeKind::Assignment => "assignment",
            NodeKind::Lambda => "lambda",
            NodeKind::Conditional => "conditional expression",
            NodeKind::FormattedString => "formatted string",
            NodeKind::Sequence => "list or tuple",
            NodeKind::Comprehension => "comprehension",
        };
        f.write_str(name)
    }
}
