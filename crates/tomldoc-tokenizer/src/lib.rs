//! A tokenizer for TOML

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::{Tokenizer, is_atom_char, is_bare_key_char};
