//! Error types for svg2raphael

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Broad class of an [`ErrorKind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// The document could not be read or is not well-formed XML
    Parse,
    /// A `style` attribute does not follow `prop:value;prop:value`
    Format,
    /// A template set is invalid
    Template,
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Io { path: String },
    InvalidToken,
    InvalidUtf8,
    InvalidEntity { entity: String },
    InvalidName { name: String },
    MismatchedTag { expected: String, found: String },
    UnterminatedMarkup,
    DuplicateAttribute { name: String },
    UnboundPrefix { prefix: String },
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
    MalformedStyle { segment: String },
    UnknownPlaceholder { template: String, placeholder: String },
    UnbalancedBrace { template: String },
    InvalidTemplateConfig,
}

impl ErrorKind {
    pub const fn category(&self) -> Category {
        match self {
            Self::MalformedStyle { .. } => Category::Format,
            Self::UnknownPlaceholder { .. }
            | Self::UnbalancedBrace { .. }
            | Self::InvalidTemplateConfig => Category::Template,
            _ => Category::Parse,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path } => write!(f, "failed to read {path}"),
            Self::InvalidToken => write!(f, "invalid token"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::InvalidEntity { entity } => write!(f, "invalid xml entity: &{entity};"),
            Self::InvalidName { name } => write!(f, "invalid name: {name}"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::UnterminatedMarkup => write!(f, "unterminated markup"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::UnboundPrefix { prefix } => write!(f, "unbound namespace prefix: {prefix}"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::MalformedStyle { segment } => write!(f, "malformed style segment: {segment:?}"),
            Self::UnknownPlaceholder {
                template,
                placeholder,
            } => write!(f, "unknown placeholder {{{placeholder}}} in {template} template"),
            Self::UnbalancedBrace { template } => {
                write!(f, "unbalanced brace in {template} template")
            }
            Self::InvalidTemplateConfig => write!(f, "invalid template configuration"),
        }
    }
}

/// Main error type for svg2raphael
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create error without a source location
    pub fn bare(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub const fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

/// Result type alias for svg2raphael
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_display_with_location() {
        let err = Error::at(ErrorKind::UnterminatedMarkup, Pos::new(10, 2, 5));
        assert_eq!(err.to_string(), "error at 2:5: unterminated markup");
    }

    #[test]
    fn test_error_display_without_location() {
        let err = Error::bare(ErrorKind::MalformedStyle {
            segment: "fill".to_string(),
        });
        assert_eq!(err.to_string(), "malformed style segment: \"fill\"");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorKind::InvalidToken.category(), Category::Parse);
        assert_eq!(
            ErrorKind::Io {
                path: "a.svg".to_string()
            }
            .category(),
            Category::Parse
        );
        assert_eq!(
            ErrorKind::MalformedStyle {
                segment: String::new()
            }
            .category(),
            Category::Format
        );
        assert_eq!(
            ErrorKind::UnbalancedBrace {
                template: "rect".to_string()
            }
            .category(),
            Category::Template
        );
    }
}
