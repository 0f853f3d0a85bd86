//! Pull-based expression parser for TOML.

use std::borrow::Cow;
use std::collections::VecDeque;

use tomldoc_tokenizer::{Span, Token, TokenKind, Tokenizer, is_bare_key_char};
use tracing::{debug, trace};

use crate::literal::{classify_literal, looks_like_time, trim_leading_newline, unescape_basic};
use crate::{
    Comment, Expression, ExpressionKind, KeyKind, KeyPartNode, ParseError, ParseErrorKind,
    StringLiteral, ValueContent, ValueKind, ValueNode,
};


/// Options controlling what the parser records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Attach comments to expressions. When `false` comments are skipped.
    pub comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { comments: true }
    }
}

/// Wraps the tokenizer with unbounded lookahead.
#[derive(Clone)]
struct TokenSource<'src> {
    tokenizer: Tokenizer<'src>,
    lookahead: VecDeque<Token<'src>>,
}

impl<'src> TokenSource<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            lookahead: VecDeque::new(),
        }
    }

    /// Peek at the token `n` positions ahead (0 is the next token).
    fn peek_nth(&mut self, n: usize) -> &Token<'src> {
        while self.lookahead.len() <= n {
            let token = self.tokenizer.next_token();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n]
    }

    fn peek(&mut self) -> &Token<'src> {
        self.peek_nth(0)
    }

    fn next(&mut self) -> Token<'src> {
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.tokenizer.next_token(),
        }
    }
}

/// Pull-based parser producing one [`Expression`] per table header or
/// key/value line.
///
/// The stream ends after the first error.
#[derive(Clone)]
pub struct Parser<'src> {
    input: &'src str,
    tokens: TokenSource<'src>,
    options: ParseOptions,
    done: bool,
    /// Comment lines seen since the last expression.
    pending_comments: Vec<Token<'src>>,
    /// Comments after the last expression, available once the stream ends.
    trailer: Option<Comment>,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    /// Create a new parser with explicit options.
    pub fn with_options(source: &'src str, options: ParseOptions) -> Self {
        Self {
            input: source,
            tokens: TokenSource::new(source),
            options,
            done: false,
            pending_comments: Vec::new(),
            trailer: None,
        }
    }

    /// The source text being parsed.
    pub fn source(&self) -> &'src str {
        self.input
    }

    /// Get the next expression from the parser.
    pub fn next_expression(&mut self) -> Option<Result<Expression<'src>, ParseError>> {
        if self.done {
            return None;
        }
        match self.parse_expression() {
            Ok(Some(expr)) => {
                trace!(kind = ?expr.kind, span = ?expr.span, "expression");
                Some(Ok(expr))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                debug!(%err, "parse failed");
                self.done = true;
                Some(Err(err))
            }
        }
    }

    /// Parse all expressions into a vector, stopping at the first error.
    pub fn parse_to_vec(mut self) -> Result<Vec<Expression<'src>>, ParseError> {
        let mut exprs = Vec::new();
        while let Some(expr) = self.next_expression() {
            exprs.push(expr?);
        }
        Ok(exprs)
    }

    /// Comments after the last expression. Only set once the stream has been
    /// fully consumed.
    pub fn trailer_comment(&self) -> Option<&Comment> {
        self.trailer.as_ref()
    }

    /// Take the trailing comment out of the parser.
    pub fn take_trailer_comment(&mut self) -> Option<Comment> {
        self.trailer.take()
    }

    fn parse_expression(&mut self) -> Result<Option<Expression<'src>>, ParseError> {
        loop {
            let token = self.tokens.peek();
            match token.kind {
                TokenKind::Whitespace | TokenKind::Newline => {
                    self.tokens.next();
                }
                TokenKind::Comment => {
                    let token = self.tokens.next();
                    self.pending_comments.push(token);
                }
                TokenKind::LBracket => return self.parse_header().map(Some),
                TokenKind::Atom | TokenKind::BasicString | TokenKind::LiteralString => {
                    return self.parse_key_value_line().map(Some);
                }
                TokenKind::MultilineBasicString | TokenKind::MultilineLiteralString => {
                    return Err(ParseError::new(ParseErrorKind::MultilineKey, token.span));
                }
                TokenKind::Error => return Err(error_token(token)),
                TokenKind::Eof => {
                    self.trailer = self.attach_comment(None);
                    return Ok(None);
                }
                kind => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            expected: "key or table header",
                            found: kind.describe(),
                        },
                        token.span,
                    ));
                }
            }
        }
    }

    /// Parse `[key]` or `[[key]]` and the rest of its line.
    fn parse_header(&mut self) -> Result<Expression<'src>, ParseError> {
        let open = self.tokens.next();
        let next = self.tokens.peek();
        let array = next.kind == TokenKind::LBracket && next.span.start == open.span.end;
        if array {
            self.tokens.next();
        }

        self.skip_whitespace();
        let key = self.parse_key()?;
        self.skip_whitespace();

        let close = self.expect(TokenKind::RBracket, if array { "`]]`" } else { "`]`" })?;
        let mut end = close.span;
        if array {
            let second = self.tokens.next();
            if second.kind != TokenKind::RBracket || second.span.start != close.span.end {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken {
                        expected: "`]]`",
                        found: second.kind.describe(),
                    },
                    second.span,
                ));
            }
            end = second.span;
        }

        let inline = self.finish_line()?;
        Ok(Expression {
            kind: if array {
                ExpressionKind::ArrayTable
            } else {
                ExpressionKind::Table
            },
            span: open.span.extend(end),
            comment: self.attach_comment(inline),
            key,
            value: None,
        })
    }

    /// Parse a top-level `key = value` and the rest of its line.
    fn parse_key_value_line(&mut self) -> Result<Expression<'src>, ParseError> {
        let mut expr = self.parse_key_value()?;
        let inline = self.finish_line()?;
        expr.comment = self.attach_comment(inline);
        Ok(expr)
    }

    /// Parse `key = value` without anything around it.
    fn parse_key_value(&mut self) -> Result<Expression<'src>, ParseError> {
        let key = self.parse_key()?;
        self.skip_whitespace();
        self.expect(TokenKind::Eq, "`=`")?;
        self.skip_whitespace();
        let value = self.parse_value()?;

        let start = key.first().map_or(value.span, |part| part.span);
        Ok(Expression {
            kind: ExpressionKind::KeyValue,
            span: start.extend(value.span),
            comment: None,
            key,
            value: Some(value),
        })
    }

    /// Parse a dotted key.
    ///
    /// Dots may be surrounded by whitespace. Since the tokenizer lumps dots
    /// into atoms, a bare run like `a.b.c` arrives as one atom and is split
    /// here.
    fn parse_key(&mut self) -> Result<Vec<KeyPartNode<'src>>, ParseError> {
        let mut parts = Vec::new();
        let mut need_part = true;
        let mut last_dot = None;

        loop {
            let token = self.tokens.peek();
            match token.kind {
                TokenKind::Atom => {
                    if !need_part && !token.text.starts_with('.') {
                        break;
                    }
                    let token = self.tokens.next();
                    let mut offset = 0;
                    for (idx, segment) in token.text.split('.').enumerate() {
                        if idx > 0 {
                            let dot = token.span.sub(offset - 1, offset);
                            if need_part {
                                return Err(ParseError::new(ParseErrorKind::EmptyKeySegment, dot));
                            }
                            need_part = true;
                            last_dot = Some(dot);
                        }
                        if !segment.is_empty() {
                            let span = token.span.sub(offset, offset + segment.len());
                            if !segment.chars().all(is_bare_key_char) {
                                return Err(ParseError::new(ParseErrorKind::InvalidBareKey, span));
                            }
                            parts.push(KeyPartNode {
                                value: Cow::Borrowed(segment),
                                kind: KeyKind::Bare,
                                span,
                            });
                            need_part = false;
                        }
                        offset += segment.len() + 1;
                    }
                }
                TokenKind::BasicString | TokenKind::LiteralString => {
                    if !need_part {
                        break;
                    }
                    let token = self.tokens.next();
                    parts.push(quoted_key_part(&token)?);
                    need_part = false;
                }
                TokenKind::MultilineBasicString | TokenKind::MultilineLiteralString
                    if need_part =>
                {
                    return Err(ParseError::new(ParseErrorKind::MultilineKey, token.span));
                }
                TokenKind::Whitespace => {
                    let after = self.tokens.peek_nth(1);
                    let continues = match after.kind {
                        TokenKind::Atom => need_part || after.text.starts_with('.'),
                        TokenKind::BasicString | TokenKind::LiteralString => need_part,
                        _ => false,
                    };
                    if !continues {
                        break;
                    }
                    self.tokens.next();
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            let token = self.tokens.peek();
            if token.kind == TokenKind::Error {
                return Err(error_token(token));
            }
            return Err(ParseError::new(ParseErrorKind::ExpectedKey, token.span));
        }
        if need_part && let Some(dot) = last_dot {
            return Err(ParseError::new(ParseErrorKind::EmptyKeySegment, dot));
        }
        Ok(parts)
    }

    fn parse_value(&mut self) -> Result<ValueNode<'src>, ParseError> {
        let token = self.tokens.peek();
        match token.kind {
            TokenKind::BasicString
            | TokenKind::MultilineBasicString
            | TokenKind::LiteralString
            | TokenKind::MultilineLiteralString => {
                let token = self.tokens.next();
                string_value(token)
            }
            TokenKind::Atom => self.parse_literal(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_inline_table(),
            TokenKind::Error => Err(error_token(token)),
            _ => Err(ParseError::new(ParseErrorKind::ExpectedValue, token.span)),
        }
    }

    /// Parse a boolean, number or date-time.
    fn parse_literal(&mut self) -> Result<ValueNode<'src>, ParseError> {
        let token = self.tokens.next();
        let mut span = token.span;
        let mut kind = classify_literal(token.text)
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidValue, token.span))?;

        // A date followed by a single space and a time is one date-time.
        if kind == ValueKind::LocalDate {
            let space = self.tokens.peek();
            if space.kind == TokenKind::Whitespace && space.text == " " {
                let time = self.tokens.peek_nth(1);
                if time.kind == TokenKind::Atom && looks_like_time(time.text) {
                    let time_span = time.span;
                    self.tokens.next();
                    self.tokens.next();
                    span = span.extend(time_span);
                    kind = classify_literal(span.slice(self.input))
                        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidValue, span))?;
                }
            }
        }

        Ok(ValueNode {
            kind,
            span,
            raw: span.slice(self.input),
            content: ValueContent::Literal,
        })
    }

    /// Parse `[a, b, ...]`. Arrays may span lines and contain comments.
    fn parse_array(&mut self) -> Result<ValueNode<'src>, ParseError> {
        let open = self.tokens.next();
        let mut elements = Vec::new();
        let mut multiline = false;

        let close = loop {
            self.skip_array_trivia(&mut multiline);
            if self.tokens.peek().kind == TokenKind::RBracket {
                break self.tokens.next();
            }

            elements.push(self.parse_value()?);

            self.skip_array_trivia(&mut multiline);
            let token = self.tokens.next();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RBracket => break token,
                TokenKind::Error => return Err(error_token(&token)),
                kind => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            expected: "`,` or `]`",
                            found: kind.describe(),
                        },
                        token.span,
                    ));
                }
            }
        };

        let span = open.span.extend(close.span);
        Ok(ValueNode {
            kind: ValueKind::Array,
            span,
            raw: span.slice(self.input),
            content: ValueContent::Array {
                elements,
                multiline,
            },
        })
    }

    /// Parse `{ a = 1, b = 2 }`. Inline tables must fit on one line and do
    /// not allow a trailing comma.
    fn parse_inline_table(&mut self) -> Result<ValueNode<'src>, ParseError> {
        let open = self.tokens.next();
        let mut entries = Vec::new();

        self.skip_inline_whitespace()?;
        let close = if self.tokens.peek().kind == TokenKind::RBrace {
            self.tokens.next()
        } else {
            loop {
                entries.push(self.parse_key_value()?);
                self.skip_inline_whitespace()?;

                let token = self.tokens.next();
                match token.kind {
                    TokenKind::Comma => {
                        self.skip_inline_whitespace()?;
                        let next = self.tokens.peek();
                        if next.kind == TokenKind::RBrace {
                            return Err(ParseError::new(
                                ParseErrorKind::UnexpectedToken {
                                    expected: "key",
                                    found: next.kind.describe(),
                                },
                                next.span,
                            ));
                        }
                    }
                    TokenKind::RBrace => break token,
                    TokenKind::Error => return Err(error_token(&token)),
                    kind => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnexpectedToken {
                                expected: "`,` or `}`",
                                found: kind.describe(),
                            },
                            token.span,
                        ));
                    }
                }
            }
        };

        let span = open.span.extend(close.span);
        Ok(ValueNode {
            kind: ValueKind::InlineTable,
            span,
            raw: span.slice(self.input),
            content: ValueContent::InlineTable { entries },
        })
    }

    /// After an expression: optional whitespace, an optional comment, then a
    /// newline or the end of input. Returns the comment token, if any.
    fn finish_line(&mut self) -> Result<Option<Token<'src>>, ParseError> {
        self.skip_whitespace();
        let comment = if self.tokens.peek().kind == TokenKind::Comment {
            Some(self.tokens.next())
        } else {
            None
        };

        let token = self.tokens.peek();
        match token.kind {
            TokenKind::Newline => {
                self.tokens.next();
            }
            TokenKind::Eof => {}
            TokenKind::Error => return Err(error_token(token)),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::TrailingContent,
                    token.span,
                ));
            }
        }
        Ok(comment)
    }

    /// Build the comment for the expression just parsed from the pending
    /// comment lines and the same-line comment.
    fn attach_comment(&mut self, inline: Option<Token<'src>>) -> Option<Comment> {
        let above = std::mem::take(&mut self.pending_comments);
        if !self.options.comments {
            return None;
        }

        let mut lines = Vec::with_capacity(above.len() + 1);
        let mut span: Option<Span> = None;
        for token in above.iter().chain(inline.as_ref()) {
            lines.push(comment_text(token.text));
            span = Some(span.map_or(token.span, |s| s.extend(token.span)));
        }
        let span = span?;

        Some(Comment {
            text: lines.join("\n"),
            inline: above.is_empty(),
            span,
        })
    }

    fn skip_whitespace(&mut self) {
        while self.tokens.peek().kind == TokenKind::Whitespace {
            self.tokens.next();
        }
    }

    /// Skip whitespace, newlines and comments inside an array.
    fn skip_array_trivia(&mut self, multiline: &mut bool) {
        loop {
            match self.tokens.peek().kind {
                TokenKind::Whitespace | TokenKind::Comment => {}
                TokenKind::Newline => *multiline = true,
                _ => return,
            }
            self.tokens.next();
        }
    }

    /// Skip whitespace inside an inline table, rejecting line breaks.
    fn skip_inline_whitespace(&mut self) -> Result<(), ParseError> {
        loop {
            let token = self.tokens.peek();
            match token.kind {
                TokenKind::Whitespace => {
                    self.tokens.next();
                }
                TokenKind::Newline | TokenKind::Comment => {
                    return Err(ParseError::new(
                        ParseErrorKind::NewlineInInlineTable,
                        token.span,
                    ));
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
    ) -> Result<Token<'src>, ParseError> {
        let token = self.tokens.next();
        if token.kind == kind {
            return Ok(token);
        }
        if token.kind == TokenKind::Error {
            return Err(error_token(&token));
        }
        Err(ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected,
                found: token.kind.describe(),
            },
            token.span,
        ))
    }
}

impl<'src> Iterator for Parser<'src> {
    type Item = Result<Expression<'src>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_expression()
    }
}

/// Turn a tokenizer error token into a parse error.
fn error_token(token: &Token<'_>) -> ParseError {
    let kind = if token.text.starts_with(['"', '\'']) {
        ParseErrorKind::UnterminatedString
    } else {
        ParseErrorKind::InvalidCharacter
    };
    ParseError::new(kind, token.span)
}

/// Comment text without the `#` and one following space.
fn comment_text(text: &str) -> String {
    let text = text.strip_prefix('#').unwrap_or(text);
    text.strip_prefix(' ').unwrap_or(text).to_string()
}

/// A basic or literal string used as a key part.
fn quoted_key_part<'src>(token: &Token<'src>) -> Result<KeyPartNode<'src>, ParseError> {
    let text = token.text;
    let body = &text[1..text.len() - 1];
    let (value, kind) = if token.kind == TokenKind::BasicString {
        (unescape(body, false, token.span.start + 1)?, KeyKind::Quoted)
    } else {
        (Cow::Borrowed(body), KeyKind::Literal)
    };
    Ok(KeyPartNode {
        value,
        kind,
        span: token.span,
    })
}

/// Build a string value node from one of the four string tokens.
fn string_value(token: Token<'_>) -> Result<ValueNode<'_>, ParseError> {
    let text = token.text;
    let (literal, multiline) = match token.kind {
        TokenKind::BasicString => (false, false),
        TokenKind::MultilineBasicString => (false, true),
        TokenKind::LiteralString => (true, false),
        _ => (true, true),
    };

    let delim = if multiline { 3 } else { 1 };
    let mut body = &text[delim..text.len() - delim];
    let mut body_start = token.span.start + delim as u32;
    if multiline {
        let (rest, trimmed) = trim_leading_newline(body);
        body = rest;
        body_start += trimmed as u32;
    }

    let value = if literal {
        Cow::Borrowed(body)
    } else {
        unescape(body, multiline, body_start)?
    };

    Ok(ValueNode {
        kind: ValueKind::String,
        span: token.span,
        raw: text,
        content: ValueContent::String(StringLiteral {
            value,
            multiline,
            literal,
        }),
    })
}

/// Unescape a basic string body that starts at `base` in the source.
fn unescape(body: &str, multiline: bool, base: u32) -> Result<Cow<'_, str>, ParseError> {
    unescape_basic(body, multiline).map_err(|err| {
        let start = base + err.offset as u32;
        ParseError::new(
            ParseErrorKind::InvalidEscape(err.sequence.clone()),
            Span::new(start, start + err.sequence.len() as u32),
        )
    })
}
