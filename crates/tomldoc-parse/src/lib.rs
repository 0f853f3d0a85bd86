#![doc = include_str!("../README.md")]

pub use tomldoc_tokenizer::{Span, Token, TokenKind, Tokenizer};

mod expression;
pub use expression::{
    Comment, Expression, ExpressionKind, KeyKind, KeyPartNode, ParseError, ParseErrorKind,
    StringLiteral, ValueContent, ValueKind, ValueNode,
};

mod literal;
pub use literal::classify_literal;

mod parser;
pub use parser::{ParseOptions, Parser};
