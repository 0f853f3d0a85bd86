#![doc = include_str!("../README.md")]
//! Document tree representation for TOML files.
//!
//! [`parse`] runs the tokenizer, the expression parser and the
//! [`TreeBuilder`] and returns a [`Document`]. Documents can also be built
//! by hand from the [`Entity`] types and checked with [`Document::validate`].

#[macro_use]
mod tracing_macros;

mod builder;
mod datetime;
mod decode;
mod diagnostic;
mod entity;
mod key;
mod lookup;
mod validate;


pub use builder::{BuildError, TreeBuilder};
pub use datetime::{LocalDate, LocalDateTime, LocalTime, Offset, OffsetDateTime};
pub use decode::{
    DecodeError, decode_float, decode_integer, decode_local_date, decode_local_date_time,
    decode_local_time, decode_offset_date_time,
};
pub use entity::{Array, Comment, Entity, InlineTable, KeyValue, StringValue, Table};
pub use key::{Key, KeyKind, KeyPart};
pub use lookup::PathSegment;
pub use tomldoc_parse::{ParseError, ParseErrorKind, ParseOptions, Span};
pub use validate::{ValidationError, ValidationErrorKind};

/// Parse a TOML document into a tree.
pub fn parse(source: &str) -> Result<Document, BuildError> {
    parse_with(source, ParseOptions::default())
}

/// Parse a TOML document into a tree with explicit parser options.
pub fn parse_with(source: &str, options: ParseOptions) -> Result<Document, BuildError> {
    let mut parser = tomldoc_parse::Parser::with_options(source, options);
    let mut builder = TreeBuilder::new();
    while let Some(expression) = parser.next_expression() {
        builder.expression(expression?)?;
    }
    builder.set_trailer_comment(parser.take_trailer_comment().map(Comment::from));
    Ok(builder.finish())
}

/// A TOML document: the top-level key/values and tables in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Document {
    /// Top-level entities.
    pub elements: Vec<Entity>,
    /// Comment lines after the last entity.
    pub trailer_comment: Option<Comment>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the top-level entities.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The last top-level entity named `name`. See [`Table::get`].
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.elements.iter().rev().find(|e| e.has_local_name(name))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
