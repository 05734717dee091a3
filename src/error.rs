use crate::token::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A diagnostic produced by any pipeline stage.
///
/// Every stage returns the first error it encounters; nothing is accumulated
/// or recovered. The span points into the original source so callers can map
/// it to line/column if they want to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub message: String,
    pub span: Span,
}

impl Error {
    pub fn new(message: impl Into<String>, span: Span) -> Error {
        Error {
            message: message.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_message_alone() {
        let error = Error::new("Unknown identifier", Span::new(3, 6));
        assert_eq!(error.to_string(), "Unknown identifier");
        assert_eq!(error.span, Span::new(3, 6));
    }
}
