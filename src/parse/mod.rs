mod error;
mod grammar;
mod syntax;

pub(crate) use error::ParseError;
pub use syntax::NodeKind;
pub(crate) use syntax::{BinaryOp, Syntax, UnaryOp};

/// Parse a normalized expression string into a surface [`Syntax`] tree,
/// descending at most `max_depth` levels.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a single well-formed expression
/// or nests deeper than `max_depth`.
pub(crate) fn parse(input: &str, max_depth: usize) -> Result<Syntax, ParseError> {
    use winnow::Parser;
    use winnow::stream::Stateful;

    let stream = Stateful {
        input,
        state: grammar::Nesting::new(max_depth),
    };
    grammar::expression
        .parse(stream)
        .map_err(|e| ParseError::from_winnow(input, e.offset(), e.inner().to_string()))
}
