//! Expression types produced by the TOML parser.

use std::borrow::Cow;

use crate::Span;

/// Kind of a top-level expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    /// A table header `[a.b]`.
    Table,
    /// An array-of-tables header `[[a.b]]`.
    ArrayTable,
    /// A key/value assignment `a.b = value`.
    KeyValue,
}

/// How a key part was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum KeyKind {
    /// Bare key: `key`.
    #[default]
    Bare,
    /// Literal (single-quoted) key: `'key'`.
    Literal,
    /// Basic (double-quoted) key: `"key"`.
    Quoted,
}

/// One part of a dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPartNode<'src> {
    /// The key text after escape processing (without quotes).
    pub value: Cow<'src, str>,
    /// How the part was written.
    pub kind: KeyKind,
    /// Span of the part, including quotes.
    pub span: Span,
}

/// A comment attached to an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment text without the leading `#` (and one following space).
    /// Consecutive comment lines are joined with `\n`.
    pub text: String,
    /// Whether the comment sits on the same line as the expression.
    pub inline: bool,
    /// Span covering all comment lines.
    pub span: Span,
}

/// A top-level expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<'src> {
    /// What kind of expression this is.
    pub kind: ExpressionKind,
    /// Span of the whole expression (header brackets included, trailing
    /// comment excluded).
    pub span: Span,
    /// Comment attached to this expression.
    pub comment: Option<Comment>,
    pub(crate) key: Vec<KeyPartNode<'src>>,
    pub(crate) value: Option<ValueNode<'src>>,
}

impl<'src> Expression<'src> {
    /// The parts of the dotted key, in order.
    pub fn key(&self) -> std::slice::Iter<'_, KeyPartNode<'src>> {
        self.key.iter()
    }

    /// Span covering the whole dotted key.
    pub fn key_span(&self) -> Span {
        match (self.key.first(), self.key.last()) {
            (Some(first), Some(last)) => first.span.extend(last.span),
            _ => Span::empty(self.span.start),
        }
    }

    /// The value sub-expression of a key/value expression.
    pub fn value(&self) -> Option<&ValueNode<'src>> {
        self.value.as_ref()
    }

    /// Take the value sub-expression out of a key/value expression.
    pub fn take_value(&mut self) -> Option<ValueNode<'src>> {
        self.value.take()
    }
}

/// The literal category of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    LocalDate,
    LocalTime,
    LocalDateTime,
    OffsetDateTime,
    Array,
    InlineTable,
}

/// A value sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode<'src> {
    /// Literal category.
    pub kind: ValueKind,
    /// Span of the value in the source.
    pub span: Span,
    /// Raw source text of the value.
    pub raw: &'src str,
    /// Processed content for strings and containers.
    pub content: ValueContent<'src>,
}

/// Content of a value node beyond its raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueContent<'src> {
    /// Scalar literal; decode [`ValueNode::raw`].
    Literal,
    /// A string, already unescaped.
    String(StringLiteral<'src>),
    /// An array `[a, b]`.
    Array {
        /// Elements in order.
        elements: Vec<ValueNode<'src>>,
        /// Whether the array spans more than one line.
        multiline: bool,
    },
    /// An inline table `{ a = 1 }`. Entries are key/value expressions.
    InlineTable {
        /// Entries in order.
        entries: Vec<Expression<'src>>,
    },
}

/// A string value after escape processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral<'src> {
    /// The string contents.
    pub value: Cow<'src, str>,
    /// Written with triple quotes.
    pub multiline: bool,
    /// Written with single quotes.
    pub literal: bool,
}

/// A parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {}", .span.start)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Source location.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Parse error kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A token that does not fit the grammar here.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },
    /// A string that is not closed before the end of the line (or input).
    #[error("unterminated string")]
    UnterminatedString,
    /// A character that cannot start any token.
    #[error("invalid character")]
    InvalidCharacter,
    /// Invalid escape sequence in a basic string.
    #[error("invalid escape sequence '{0}'")]
    InvalidEscape(String),
    /// Expected a key.
    #[error("expected key")]
    ExpectedKey,
    /// Expected a value.
    #[error("expected value")]
    ExpectedValue,
    /// A dotted key with an empty segment (`a..b`, `a.`).
    #[error("empty key segment")]
    EmptyKeySegment,
    /// A bare key containing characters outside `A-Za-z0-9_-`.
    #[error("invalid bare key")]
    InvalidBareKey,
    /// A multi-line string used as a key.
    #[error("multi-line strings cannot be used as keys")]
    MultilineKey,
    /// Inline tables must fit on one line.
    #[error("newline in inline table")]
    NewlineInInlineTable,
    /// Something other than a comment after an expression on the same line.
    #[error("unexpected content after expression")]
    TrailingContent,
    /// A bare literal that is not a boolean, number or date-time.
    #[error("invalid value")]
    InvalidValue,
}
