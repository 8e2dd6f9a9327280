use std::fmt;

/// A grammar violation at a character offset into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Build from a winnow failure, converting its byte offset into a
    /// character offset and filling in a message when winnow has none.
    pub(crate) fn from_winnow(input: &str, byte_offset: usize, message: String) -> Self {
        let consumed = input.get(..byte_offset).unwrap_or(input);
        let offset = consumed.chars().count();
        let message = if message.trim().is_empty() {
            match input[consumed.len()..].chars().next() {
                Some(c) => format!("unexpected {c:?}"),
                None => "unexpected end of expression".to_owned(),
            }
        } else {
            message.replace('\n', "; ")
        };
        Self::new(message, offset)
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}
