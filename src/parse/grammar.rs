use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, fail, opt, preceded, repeat};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stateful;
use winnow::token::{any, one_of, take_while};

use crate::{CompareOp, Value};

use super::syntax::{BinaryOp, Syntax, UnaryOp};

/// Words that can never name a feature.
const RESERVED: &[&str] = &[
    "and", "or", "not", "AND", "OR", "NOT", "in", "is", "if", "else", "lambda", "for", "true",
    "false", "True", "False", "None",
];

/// How many levels the grammar has descended, and how many it may.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Nesting {
    depth: usize,
    max: usize,
}

impl Nesting {
    pub(crate) fn new(max: usize) -> Self {
        Self { depth: 0, max }
    }
}

pub(crate) type Input<'i> = Stateful<&'i str, Nesting>;

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// -- Nesting ----------------------------------------------------------------

/// Enter one level of nesting. Past the limit this is a hard failure, so
/// neither the parser nor anything walking its output recurses unboundedly.
fn descend(input: &mut Input<'_>) -> ModalResult<()> {
    if input.state.depth >= input.state.max {
        return cut_err(fail)
            .context(StrContext::Label("nesting depth"))
            .context(expected("shallower nesting"))
            .parse_next(input);
    }
    input.state.depth += 1;
    Ok(())
}

/// Run `parser` one nesting level deeper.
fn nested<'i, O>(
    mut parser: impl Parser<Input<'i>, O, ErrMode<ContextError>>,
) -> impl Parser<Input<'i>, O, ErrMode<ContextError>> {
    move |input: &mut Input<'i>| {
        descend(input)?;
        let result = parser.parse_next(input);
        input.state.depth -= 1;
        result
    }
}

/// The `op operand` links after a chain's first operand. Folding adds one
/// tree level per link, so each link also counts as a level of nesting.
fn links<'i, Op, O>(
    input: &mut Input<'i>,
    mut op: impl Parser<Input<'i>, Op, ErrMode<ContextError>>,
    mut operand: impl Parser<Input<'i>, O, ErrMode<ContextError>>,
) -> ModalResult<Vec<(Op, O)>> {
    let depth = input.state.depth;
    let mut out = Vec::new();
    let result = (|| -> ModalResult<()> {
        while let Some(o) = opt(op.by_ref()).parse_next(input)? {
            descend(input)?;
            out.push((o, cut_err(operand.by_ref()).parse_next(input)?));
        }
        Ok(())
    })();
    input.state.depth = depth;
    result.map(|()| out)
}

// -- Whitespace -------------------------------------------------------------

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

// -- Words ------------------------------------------------------------------

fn word<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// A whole word matching one of `words`. `android` never matches `and`.
fn keyword<'i>(
    words: &'static [&'static str],
) -> impl Parser<Input<'i>, &'i str, ErrMode<ContextError>> {
    word.verify(move |w: &str| words.contains(&w))
}

fn name<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    word.verify(|w: &str| !RESERVED.contains(&w))
        .parse_next(input)
}

// -- Literals ---------------------------------------------------------------

fn exponent<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)
        .take()
        .parse_next(input)
}

fn number(input: &mut Input<'_>) -> ModalResult<Value> {
    let start = input.checkpoint();
    let text = (digit1, opt(('.', digit1)), opt(exponent))
        .take()
        .parse_next(input)?;

    if text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        input.reset(&start);
        return cut_err(fail)
            .context(expected("integer within the 64-bit range"))
            .parse_next(input);
    }

    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Value::Float(f)),
        _ => {
            input.reset(&start);
            cut_err(fail)
                .context(expected("finite number"))
                .parse_next(input)
        }
    }
}

fn quoted(input: &mut Input<'_>) -> ModalResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(expected("closing quote"))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(any)
                    .context(expected("escape character"))
                    .parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\'' => s.push('\''),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    'r' => s.push('\r'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn formatted_string(input: &mut Input<'_>) -> ModalResult<Syntax> {
    preceded(one_of(['f', 'F']), quoted)
        .map(Syntax::FormattedString)
        .parse_next(input)
}

fn keyword_literal(input: &mut Input<'_>) -> ModalResult<Syntax> {
    word.verify_map(|w: &str| match w {
        "true" | "True" => Some(Syntax::Literal(Value::Bool(true))),
        "false" | "False" => Some(Syntax::Literal(Value::Bool(false))),
        "None" => Some(Syntax::Null),
        _ => None,
    })
    .parse_next(input)
}

// -- Displays: (...), [...] -------------------------------------------------

fn closing(input: &mut Input<'_>, close: char) -> ModalResult<()> {
    ws.parse_next(input)?;
    cut_err(close)
        .context(StrContext::Expected(StrContextValue::CharLiteral(close)))
        .void()
        .parse_next(input)
}

/// Items after the first one in a comma-separated display. Returns the items
/// and whether the display ended with a trailing comma.
fn remaining_items(input: &mut Input<'_>, close: char) -> ModalResult<(Vec<Syntax>, bool)> {
    let mut items = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt(',').parse_next(input)?.is_none() {
            return Ok((items, false));
        }
        ws.parse_next(input)?;
        if input.input.starts_with(close) {
            return Ok((items, true));
        }
        items.push(expr.parse_next(input)?);
    }
}

fn comprehension(input: &mut Input<'_>, element: Syntax) -> ModalResult<Syntax> {
    ws.parse_next(input)?;
    let target = name.context(expected("loop variable")).parse_next(input)?;
    ws.parse_next(input)?;
    keyword(&["in"]).context(expected("'in'")).parse_next(input)?;
    let iter = or_expr.parse_next(input)?;
    let filters: Vec<Syntax> =
        repeat(0.., preceded((ws, keyword(&["if"])), or_expr)).parse_next(input)?;
    Ok(Syntax::Comprehension {
        element: Box::new(element),
        target: target.to_owned(),
        iter: Box::new(iter),
        filters,
    })
}

fn display(input: &mut Input<'_>, close: char, grouping: bool) -> ModalResult<Syntax> {
    ws.parse_next(input)?;
    if opt(close).parse_next(input)?.is_some() {
        return Ok(Syntax::Sequence(Vec::new()));
    }
    let first = expr.parse_next(input)?;
    ws.parse_next(input)?;
    if opt(keyword(&["for"])).parse_next(input)?.is_some() {
        let node = comprehension(input, first)?;
        closing(input, close)?;
        return Ok(node);
    }
    let (rest, trailing_comma) = remaining_items(input, close)?;
    closing(input, close)?;
    if grouping && rest.is_empty() && !trailing_comma {
        return Ok(first);
    }
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest);
    Ok(Syntax::Sequence(items))
}

fn paren_display(input: &mut Input<'_>) -> ModalResult<Syntax> {
    display(input, ')', true)
}

fn list_display(input: &mut Input<'_>) -> ModalResult<Syntax> {
    display(input, ']', false)
}

fn call_args(input: &mut Input<'_>) -> ModalResult<Vec<Syntax>> {
    ws.parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(Vec::new());
    }
    let first = expr.parse_next(input)?;
    let (rest, _) = remaining_items(input, ')')?;
    closing(input, ')')?;
    let mut args = Vec::with_capacity(rest.len() + 1);
    args.push(first);
    args.extend(rest);
    Ok(args)
}

// -- Atoms and postfix ------------------------------------------------------

fn atom(input: &mut Input<'_>) -> ModalResult<Syntax> {
    ws.parse_next(input)?;
    alt((
        number.map(Syntax::Literal),
        formatted_string,
        quoted.map(|s| Syntax::Literal(Value::String(s))),
        preceded('(', cut_err(nested(paren_display))),
        preceded('[', cut_err(nested(list_display))),
        keyword_literal,
        name.map(|n: &str| Syntax::Name(n.to_owned())),
    ))
    .context(expected("expression"))
    .parse_next(input)
}

fn postfix(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let node = atom.parse_next(input)?;
    let depth = input.state.depth;
    let result = trailers(input, node);
    input.state.depth = depth;
    result
}

/// Calls, attribute accesses and subscripts applied to `node`, each one a
/// level deeper than the last.
fn trailers(input: &mut Input<'_>, mut node: Syntax) -> ModalResult<Syntax> {
    loop {
        ws.parse_next(input)?;
        if opt('(').parse_next(input)?.is_some() {
            descend(input)?;
            let args = cut_err(call_args).parse_next(input)?;
            node = Syntax::Call {
                callee: Box::new(node),
                args,
            };
        } else if opt('.').parse_next(input)?.is_some() {
            descend(input)?;
            ws.parse_next(input)?;
            let attr = cut_err(word)
                .context(expected("attribute name"))
                .parse_next(input)?;
            node = Syntax::Attribute {
                object: Box::new(node),
                name: attr.to_owned(),
            };
        } else if opt('[').parse_next(input)?.is_some() {
            descend(input)?;
            let index = cut_err(expr).parse_next(input)?;
            closing(input, ']')?;
            node = Syntax::Subscript {
                object: Box::new(node),
                index: Box::new(index),
            };
        } else {
            return Ok(node);
        }
    }
}

// -- Arithmetic (precedence: | < ^ < & < shifts < +- < */ < unary < **) -----

fn fold_binary(first: Syntax, rest: Vec<(BinaryOp, Syntax)>) -> Syntax {
    rest.into_iter()
        .fold(first, |left, (op, right)| Syntax::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
}

fn power(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let base = postfix.parse_next(input)?;
    if opt(preceded(ws, "**")).parse_next(input)?.is_some() {
        let exponent = cut_err(nested(unary)).parse_next(input)?;
        return Ok(Syntax::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        });
    }
    Ok(base)
}

fn unary(input: &mut Input<'_>) -> ModalResult<Syntax> {
    ws.parse_next(input)?;
    let op = opt(alt((
        '+'.value(UnaryOp::Plus),
        '-'.value(UnaryOp::Minus),
        '~'.value(UnaryOp::Invert),
    )))
    .parse_next(input)?;
    match op {
        Some(op) => {
            let operand = cut_err(nested(unary)).parse_next(input)?;
            Ok(Syntax::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        None => power(input),
    }
}

fn term(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = unary.parse_next(input)?;
    let rest = links(
        input,
        preceded(
            ws,
            alt((
                "//".value(BinaryOp::FloorDiv),
                '*'.value(BinaryOp::Mul),
                '/'.value(BinaryOp::Div),
                '%'.value(BinaryOp::Mod),
            )),
        ),
        unary,
    )?;
    Ok(fold_binary(first, rest))
}

fn sum(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = term.parse_next(input)?;
    let rest = links(
        input,
        preceded(
            ws,
            alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))),
        ),
        term,
    )?;
    Ok(fold_binary(first, rest))
}

fn shift(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = sum.parse_next(input)?;
    let rest = links(
        input,
        preceded(
            ws,
            alt((
                "<<".value(BinaryOp::ShiftLeft),
                ">>".value(BinaryOp::ShiftRight),
            )),
        ),
        sum,
    )?;
    Ok(fold_binary(first, rest))
}

fn bit_and(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = shift.parse_next(input)?;
    let rest = links(input, preceded(ws, '&'.value(BinaryOp::BitAnd)), shift)?;
    Ok(fold_binary(first, rest))
}

fn bit_xor(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = bit_and.parse_next(input)?;
    let rest = links(input, preceded(ws, '^'.value(BinaryOp::BitXor)), bit_and)?;
    Ok(fold_binary(first, rest))
}

fn bit_or(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = bit_xor.parse_next(input)?;
    let rest = links(input, preceded(ws, '|'.value(BinaryOp::BitOr)), bit_xor)?;
    Ok(fold_binary(first, rest))
}

// -- Comparisons ------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum ChainOp {
    Compare(CompareOp),
    In { negated: bool },
    Is { negated: bool },
}

fn chain_op(input: &mut Input<'_>) -> ModalResult<ChainOp> {
    ws.parse_next(input)?;
    alt((
        "==".value(ChainOp::Compare(CompareOp::Eq)),
        "!=".value(ChainOp::Compare(CompareOp::Neq)),
        ">=".value(ChainOp::Compare(CompareOp::Gte)),
        "<=".value(ChainOp::Compare(CompareOp::Lte)),
        '>'.value(ChainOp::Compare(CompareOp::Gt)),
        '<'.value(ChainOp::Compare(CompareOp::Lt)),
        (keyword(&["not"]), ws, keyword(&["in"])).value(ChainOp::In { negated: true }),
        keyword(&["in"]).value(ChainOp::In { negated: false }),
        (keyword(&["is"]), ws, keyword(&["not"])).value(ChainOp::Is { negated: true }),
        keyword(&["is"]).value(ChainOp::Is { negated: false }),
    ))
    .parse_next(input)
}

fn chain_link(op: ChainOp, left: Syntax, right: Syntax) -> Syntax {
    let left = Box::new(left);
    let right = Box::new(right);
    match op {
        ChainOp::Compare(op) => Syntax::Compare { op, left, right },
        ChainOp::In { negated } => Syntax::Membership {
            negated,
            left,
            right,
        },
        ChainOp::Is { negated } => Syntax::Identity {
            negated,
            left,
            right,
        },
    }
}

/// `a < b <= c` means `a < b and b <= c`.
fn comparison(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = bit_or.parse_next(input)?;
    let rest = links(input, chain_op, bit_or)?;

    let mut left = first;
    let mut chain: Option<Syntax> = None;
    for (op, right) in rest {
        let link = chain_link(op, left, right.clone());
        chain = Some(match chain {
            Some(acc) => Syntax::And(Box::new(acc), Box::new(link)),
            None => link,
        });
        left = right;
    }
    Ok(chain.unwrap_or(left))
}

// -- Boolean operators (precedence: or < and < not < comparison) ------------

fn not_expr(input: &mut Input<'_>) -> ModalResult<Syntax> {
    ws.parse_next(input)?;
    if opt(keyword(&["not", "NOT"])).parse_next(input)?.is_some() {
        let inner = cut_err(nested(not_expr)).parse_next(input)?;
        Ok(Syntax::Not(Box::new(inner)))
    } else {
        comparison(input)
    }
}

fn and_expr(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = not_expr(input)?;
    let rest = links(input, preceded(ws, keyword(&["and", "AND"])), not_expr)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, (_, r)| Syntax::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let first = and_expr(input)?;
    let rest = links(input, preceded(ws, keyword(&["or", "OR"])), and_expr)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, (_, r)| Syntax::Or(Box::new(acc), Box::new(r))))
}

// -- Conditional, assignment, lambda ----------------------------------------

fn conditional(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let then = or_expr.parse_next(input)?;
    if opt(preceded(ws, keyword(&["if"]))).parse_next(input)?.is_none() {
        return Ok(then);
    }
    let condition = cut_err(nested(or_expr)).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(keyword(&["else"]))
        .context(expected("'else'"))
        .parse_next(input)?;
    let otherwise = cut_err(nested(expr)).parse_next(input)?;
    Ok(Syntax::Conditional {
        then: Box::new(then),
        condition: Box::new(condition),
        otherwise: Box::new(otherwise),
    })
}

fn assignment(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let target = opt((ws, name, ws, ":=").map(|(_, n, _, _)| n)).parse_next(input)?;
    match target {
        Some(target) => {
            let value = cut_err(nested(expr)).parse_next(input)?;
            Ok(Syntax::Assignment {
                target: target.to_owned(),
                value: Box::new(value),
            })
        }
        None => conditional(input),
    }
}

fn lambda_params(input: &mut Input<'_>) -> ModalResult<Vec<String>> {
    let mut params = Vec::new();
    ws.parse_next(input)?;
    if let Some(first) = opt(name).parse_next(input)? {
        params.push(first.to_owned());
        loop {
            ws.parse_next(input)?;
            if opt(',').parse_next(input)?.is_none() {
                break;
            }
            ws.parse_next(input)?;
            let next = cut_err(name)
                .context(expected("parameter name"))
                .parse_next(input)?;
            params.push(next.to_owned());
        }
    }
    Ok(params)
}

fn lambda(input: &mut Input<'_>) -> ModalResult<Syntax> {
    preceded(ws, keyword(&["lambda"])).parse_next(input)?;
    let params = lambda_params(input)?;
    ws.parse_next(input)?;
    cut_err(':')
        .context(StrContext::Expected(StrContextValue::CharLiteral(':')))
        .parse_next(input)?;
    let body = cut_err(nested(expr)).parse_next(input)?;
    Ok(Syntax::Lambda {
        params,
        body: Box::new(body),
    })
}

fn expr(input: &mut Input<'_>) -> ModalResult<Syntax> {
    alt((lambda, assignment)).parse_next(input)
}

// -- Top level --------------------------------------------------------------

/// A single expression with optional surrounding whitespace.
pub(crate) fn expression(input: &mut Input<'_>) -> ModalResult<Syntax> {
    let node = expr.parse_next(input)?;
    ws.parse_next(input)?;
    Ok(node)
}
