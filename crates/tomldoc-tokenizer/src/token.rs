//! Token types for the TOML tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `=`
    Eq,
    /// `,`
    Comma,

    /// A run of bare characters (`A-Za-z0-9_-+.:`).
    ///
    /// Depending on where it appears this is a (possibly dotted) bare key, a
    /// boolean, a number, or a date/time literal. The parser decides.
    Atom,

    // String tokens (text includes the delimiters)
    /// Basic string: `"..."`
    BasicString,
    /// Multi-line basic string: `"""..."""`
    MultilineBasicString,
    /// Literal string: `'...'`
    LiteralString,
    /// Multi-line literal string: `'''...'''`
    MultilineLiteralString,

    /// Comment: `# ...` (up to, not including, the newline)
    Comment,

    // Whitespace tokens
    /// Horizontal whitespace: spaces and tabs
    Whitespace,
    /// Newline: `\n` or `\r\n`
    Newline,

    // Special tokens
    /// End of file
    Eof,
    /// Tokenizer error (unrecognized input or unterminated string)
    Error,
}

impl TokenKind {
    /// Whether this token is trivia (horizontal whitespace or comments).
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Whether this token is one of the four string forms.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            TokenKind::BasicString
                | TokenKind::MultilineBasicString
                | TokenKind::LiteralString
                | TokenKind::MultilineLiteralString
        )
    }

    /// Human readable name, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Eq => "`=`",
            TokenKind::Comma => "`,`",
            TokenKind::Atom => "bare value",
            TokenKind::BasicString
            | TokenKind::MultilineBasicString
            | TokenKind::LiteralString
            | TokenKind::MultilineLiteralString => "string",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid input",
        }
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }
}
