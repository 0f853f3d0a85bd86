//! Tokenizer for TOML documents.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from TOML source text.
///
/// The tokenizer is context free: keys, numbers, booleans and date-times all
/// come out as [`TokenKind::Atom`] and it is up to the parser to split dotted
/// keys and classify literals.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
        }
    }

    /// The full source text.
    #[inline]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance by n bytes.
    #[inline]
    fn advance_by(&mut self, n: usize) {
        self.pos += n as u32;
        self.remaining = &self.remaining[n..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Whether the remaining text starts with a line break.
    #[inline]
    fn at_newline(&self) -> bool {
        self.starts_with("\n") || self.starts_with("\r\n")
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match c {
            // Structural tokens
            '[' => {
                self.advance();
                self.token(TokenKind::LBracket, start)
            }
            ']' => {
                self.advance();
                self.token(TokenKind::RBracket, start)
            }
            '{' => {
                self.advance();
                self.token(TokenKind::LBrace, start)
            }
            '}' => {
                self.advance();
                self.token(TokenKind::RBrace, start)
            }
            '=' => {
                self.advance();
                self.token(TokenKind::Eq, start)
            }
            ',' => {
                self.advance();
                self.token(TokenKind::Comma, start)
            }

            // Strings
            '"' if self.starts_with("\"\"\"") => self.tokenize_multiline_string('"'),
            '"' => self.tokenize_basic_string(),
            '\'' if self.starts_with("'''") => self.tokenize_multiline_string('\''),
            '\'' => self.tokenize_literal_string(),

            '#' => self.tokenize_comment(),

            // Whitespace
            ' ' | '\t' => self.tokenize_whitespace(),

            // Newline
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, start)
            }
            '\r' if self.peek_nth(1) == Some('\n') => {
                self.advance();
                self.advance();
                self.token(TokenKind::Newline, start)
            }

            _ if is_atom_char(c) => self.tokenize_atom(),

            // Error: unrecognized character
            _ => {
                self.advance();
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Tokenize horizontal whitespace (spaces and tabs).
    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(' ' | '\t') = self.peek() {
            self.advance();
        }
        self.token(TokenKind::Whitespace, start)
    }

    /// Tokenize a run of bare characters.
    fn tokenize_atom(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_atom_char(c) {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Atom, start)
    }

    /// Tokenize a comment up to the end of the line.
    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        while !self.is_eof() && !self.at_newline() {
            self.advance();
        }
        self.token(TokenKind::Comment, start)
    }

    /// Tokenize a single-line basic string. Escapes are skipped over here and
    /// validated by the parser.
    fn tokenize_basic_string(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance(); // opening quote

        loop {
            if self.is_eof() || self.at_newline() {
                return self.token(TokenKind::Error, start);
            }
            match self.advance() {
                Some('"') => return self.token(TokenKind::BasicString, start),
                Some('\\') => {
                    if !self.is_eof() && !self.at_newline() {
                        self.advance();
                    }
                }
                _ => {}
            }
        }
    }

    /// Tokenize a single-line literal string.
    fn tokenize_literal_string(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance(); // opening quote

        loop {
            if self.is_eof() || self.at_newline() {
                return self.token(TokenKind::Error, start);
            }
            if self.advance() == Some('\'') {
                return self.token(TokenKind::LiteralString, start);
            }
        }
    }

    /// Tokenize a multi-line string delimited by three `quote` characters.
    ///
    /// Up to two quote characters may directly precede the closing delimiter,
    /// so a run of four or five quotes still closes the string.
    fn tokenize_multiline_string(&mut self, quote: char) -> Token<'src> {
        let start = self.pos;
        self.advance_by(3);

        let kind = if quote == '"' {
            TokenKind::MultilineBasicString
        } else {
            TokenKind::MultilineLiteralString
        };

        loop {
            match self.peek() {
                None => return self.token(TokenKind::Error, start),
                Some('\\') if quote == '"' => {
                    self.advance();
                    self.advance();
                }
                Some(c) if c == quote => {
                    let run = self.remaining.chars().take_while(|&c| c == quote).count();
                    if run >= 3 {
                        self.advance_by(run.min(5));
                        return self.token(kind, start);
                    }
                    self.advance_by(run);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character can appear in an atom (bare key, number, boolean,
/// or date-time).
pub fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.' | ':')
}

/// Check if a character can appear in a bare key.
pub fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn tokenize(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(tokenize("["), vec![(TokenKind::LBracket, "[")]);
        assert_eq!(tokenize("]"), vec![(TokenKind::RBracket, "]")]);
        assert_eq!(tokenize("{"), vec![(TokenKind::LBrace, "{")]);
        assert_eq!(tokenize("}"), vec![(TokenKind::RBrace, "}")]);
        assert_eq!(tokenize("="), vec![(TokenKind::Eq, "=")]);
        assert_eq!(tokenize(","), vec![(TokenKind::Comma, ",")]);
    }

    #[test]
    fn test_atoms() {
        assert_eq!(tokenize("key"), vec![(TokenKind::Atom, "key")]);
        assert_eq!(tokenize("a.b.c"), vec![(TokenKind::Atom, "a.b.c")]);
        assert_eq!(tokenize("-1_000"), vec![(TokenKind::Atom, "-1_000")]);
        assert_eq!(tokenize("+3.14e-2"), vec![(TokenKind::Atom, "+3.14e-2")]);
        assert_eq!(
            tokenize("1979-05-27T07:32:00-08:00"),
            vec![(TokenKind::Atom, "1979-05-27T07:32:00-08:00")]
        );
    }

    #[test]
    fn test_key_value_line() {
        assert_eq!(
            tokenize("x = 42"),
            vec![
                (TokenKind::Atom, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Eq, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Atom, "42"),
            ]
        );
        assert_eq!(
            tokenize("x=42"),
            vec![
                (TokenKind::Atom, "x"),
                (TokenKind::Eq, "="),
                (TokenKind::Atom, "42"),
            ]
        );
    }

    #[test]
    fn test_array_table_header() {
        assert_eq!(
            tokenize("[[fruit]]"),
            vec![
                (TokenKind::LBracket, "["),
                (TokenKind::LBracket, "["),
                (TokenKind::Atom, "fruit"),
                (TokenKind::RBracket, "]"),
                (TokenKind::RBracket, "]"),
            ]
        );
    }

    #[test]
    fn test_basic_string() {
        assert_eq!(
            tokenize(r#""hello world""#),
            vec![(TokenKind::BasicString, r#""hello world""#)]
        );
        assert_eq!(
            tokenize(r#""with \"escapes\"""#),
            vec![(TokenKind::BasicString, r#""with \"escapes\"""#)]
        );
        assert_eq!(tokenize(r#""""#), vec![(TokenKind::BasicString, r#""""#)]);
    }

    #[test]
    fn test_literal_string() {
        assert_eq!(
            tokenize(r"'C:\Users\nodejs'"),
            vec![(TokenKind::LiteralString, r"'C:\Users\nodejs'")]
        );
    }

    #[test]
    fn test_multiline_strings() {
        assert_eq!(
            tokenize("\"\"\"\nRoses are red\nViolets are blue\"\"\""),
            vec![(
                TokenKind::MultilineBasicString,
                "\"\"\"\nRoses are red\nViolets are blue\"\"\""
            )]
        );
        assert_eq!(
            tokenize("'''\nfirst\nsecond'''"),
            vec![(TokenKind::MultilineLiteralString, "'''\nfirst\nsecond'''")]
        );
    }

    #[test]
    fn test_multiline_string_with_trailing_quotes() {
        // Two quotes right before the closing delimiter belong to the content.
        assert_eq!(
            tokenize(r#""""say "hi"""""#),
            vec![(TokenKind::MultilineBasicString, r#""""say "hi"""""#)]
        );
        assert_eq!(
            tokenize(r#""""escaped \""" still open""""#),
            vec![(
                TokenKind::MultilineBasicString,
                r#""""escaped \""" still open""""#
            )]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokenize("# comment\nx"),
            vec![
                (TokenKind::Comment, "# comment"),
                (TokenKind::Newline, "\n"),
                (TokenKind::Atom, "x"),
            ]
        );
        assert_eq!(
            tokenize("# windows\r\n"),
            vec![(TokenKind::Comment, "# windows"), (TokenKind::Newline, "\r\n")]
        );
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(tokenize("  \t"), vec![(TokenKind::Whitespace, "  \t")]);
        assert_eq!(tokenize("\n"), vec![(TokenKind::Newline, "\n")]);
        assert_eq!(tokenize("\r\n"), vec![(TokenKind::Newline, "\r\n")]);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("\"hello");
        assert!(
            tokens.iter().any(|t| t.0 == TokenKind::Error),
            "Expected Error token for unterminated string"
        );

        let tokens = tokenize("'hello\nworld'");
        assert_eq!(tokens[0], (TokenKind::Error, "'hello"));

        let tokens = tokenize("'''never closed");
        assert_eq!(tokens, vec![(TokenKind::Error, "'''never closed")]);
    }

    #[test]
    fn test_unrecognized_character() {
        assert_eq!(
            tokenize("a = é"),
            vec![
                (TokenKind::Atom, "a"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Eq, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Error, "é"),
            ]
        );
        assert_eq!(tokenize("\r"), vec![(TokenKind::Error, "\r")]);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens: Vec<_> = Tokenizer::new("ключ = 1").collect();
        // Non-ASCII input produces one error token per character.
        assert_eq!(tokens[0].span, Span::new(0, 2));
        let eq = tokens.iter().find(|t| t.kind == TokenKind::Eq).unwrap();
        assert_eq!(eq.span, Span::new(9, 10));
    }
}
