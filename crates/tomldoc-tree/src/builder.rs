//! Tree builder from parsed expressions.

use tomldoc_parse::{
    Expression, ExpressionKind, ParseError, Span, ValueContent, ValueKind, ValueNode,
};

use crate::Document;
use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::decode::{DecodeError, decode_float, decode_integer};
use crate::entity::{Array, Comment, Entity, InlineTable, KeyValue, StringValue, Table};
use crate::key::{Key, KeyPart};

/// Error during tree building.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The source is not syntactically valid.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A numeric or date-time literal is malformed.
    #[error("{0} at offset {offset}", offset = .0.span.start)]
    Decode(#[from] DecodeError),
    /// An explicit table header repeats an existing explicit table.
    #[error("table `{key}` is defined more than once")]
    TableRedefined {
        key: String,
        span: Span,
        previous: Option<Span>,
    },
    /// A key segment names something that cannot hold children.
    #[error("`{key}` is not a table")]
    NotATable { key: String, span: Span },
    /// A new entity clashes with an existing one of a different kind.
    #[error("`{key}` conflicts with an existing definition")]
    KeyCollision { key: String, span: Span },
    /// A key/value repeats a sibling key.
    #[error("duplicate key `{key}`")]
    DuplicateKey {
        key: String,
        span: Span,
        previous: Option<Span>,
    },
    /// Something other than a header or a key/value where one is required,
    /// or a non-value in value position.
    #[error("unexpected {kind}")]
    UnexpectedExpression { kind: String, span: Span },
}

impl BuildError {
    /// The source location of the offending construct.
    pub fn span(&self) -> Span {
        match self {
            BuildError::Parse(err) => err.span,
            BuildError::Decode(err) => err.span,
            BuildError::TableRedefined { span, .. }
            | BuildError::NotATable { span, .. }
            | BuildError::KeyCollision { span, .. }
            | BuildError::DuplicateKey { span, .. }
            | BuildError::UnexpectedExpression { span, .. } => *span,
        }
    }
}

/// Builds a [`Document`] from a stream of expressions.
///
/// Headers are resolved from the document root. Key/values attach to the
/// cursor, which is the table named by the most recent header.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    document: Document,
    /// Element indices from the root to the cursor table.
    cursor: Vec<usize>,
    /// Absolute key of the cursor table.
    cursor_key: Key,
}

impl TreeBuilder {
    /// Create a new tree builder with the cursor at the document root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one expression to the tree.
    pub fn expression(&mut self, expression: Expression<'_>) -> Result<(), BuildError> {
        let result = match expression.kind {
            ExpressionKind::Table => self.table_header(expression, false),
            ExpressionKind::ArrayTable => self.table_header(expression, true),
            ExpressionKind::KeyValue => self.key_value(expression),
        };
        if let Err(_err) = &result {
            debug!("build aborted: {_err}");
        }
        result
    }

    /// Set the comment that follows the last expression.
    pub fn set_trailer_comment(&mut self, comment: Option<Comment>) {
        self.document.trailer_comment = comment;
    }

    /// Finish building and return the document.
    pub fn finish(self) -> Document {
        self.document
    }

    fn table_header(&mut self, expression: Expression<'_>, array: bool) -> Result<(), BuildError> {
        let key: Key = expression.key().map(KeyPart::from).collect();
        let span = expression.span;
        let comment = expression.comment.map(Comment::from);

        if key.is_empty() {
            return Err(BuildError::UnexpectedExpression {
                kind: "header without a key".to_string(),
                span,
            });
        }

        let mut elements = &mut self.document.elements;
        let mut path = Vec::with_capacity(key.len());

        for len in 1..key.len() {
            let prefix = key.prefix(len);
            let index = match last_table(elements, &prefix) {
                Some(index) => index,
                None => {
                    if find_key_value(elements, &prefix).is_some() {
                        return Err(BuildError::NotATable {
                            key: prefix.to_string(),
                            span,
                        });
                    }
                    trace!("creating implicit table {prefix}");
                    elements.push(Table::implicit(prefix).into());
                    elements.len() - 1
                }
            };
            path.push(index);
            elements = match &mut elements[index] {
                Entity::Table(table) => &mut table.elements,
                _ => {
                    return Err(BuildError::NotATable {
                        key: key.prefix(len).to_string(),
                        span,
                    });
                }
            };
        }

        if array {
            if let Some(index) = last_table(elements, &key)
                && !matches!(&elements[index], Entity::Table(t) if t.array)
            {
                return Err(BuildError::KeyCollision {
                    key: key.to_string(),
                    span,
                });
            }
            if find_key_value(elements, &key).is_some() {
                return Err(BuildError::KeyCollision {
                    key: key.to_string(),
                    span,
                });
            }
            trace!("appending array table {key}");
            let mut table = Table::array(key.clone());
            table.comment = comment;
            table.span = Some(span);
            elements.push(table.into());
            path.push(elements.len() - 1);
        } else {
            match last_table(elements, &key) {
                Some(index) => {
                    let Entity::Table(table) = &mut elements[index] else {
                        return Err(BuildError::NotATable {
                            key: key.to_string(),
                            span,
                        });
                    };
                    if table.explicit {
                        return Err(BuildError::TableRedefined {
                            key: key.to_string(),
                            span,
                            previous: table.span,
                        });
                    }
                    trace!("promoting implicit table {key}");
                    table.explicit = true;
                    table.span = Some(span);
                    table.key = key.clone();
                    if comment.is_some() {
                        table.comment = comment;
                    }
                    path.push(index);
                }
                None => {
                    if find_key_value(elements, &key).is_some() {
                        return Err(BuildError::KeyCollision {
                            key: key.to_string(),
                            span,
                        });
                    }
                    let mut table = Table::explicit(key.clone());
                    table.comment = comment;
                    table.span = Some(span);
                    elements.push(table.into());
                    path.push(elements.len() - 1);
                }
            }
        }

        trace!("cursor moved to {key}");
        self.cursor = path;
        self.cursor_key = key;
        Ok(())
    }

    fn key_value(&mut self, mut expression: Expression<'_>) -> Result<(), BuildError> {
        let parts: Vec<KeyPart> = expression.key().map(KeyPart::from).collect();
        let span = expression.span;
        let comment = expression.comment.take().map(Comment::from);
        let Some(node) = expression.take_value() else {
            return Err(BuildError::UnexpectedExpression {
                kind: "key without a value".to_string(),
                span,
            });
        };

        let value = convert_value(node)?;
        let leaf = Leaf {
            value,
            span,
            comment,
        };

        let base = self.cursor_key.clone();
        let elements = self.cursor_elements()?;
        insert_into_table(elements, &base, &parts, leaf)
    }

    /// The elements of the cursor table (or of the root).
    fn cursor_elements(&mut self) -> Result<&mut Vec<Entity>, BuildError> {
        let mut elements = &mut self.document.elements;
        for &index in &self.cursor {
            match elements.get_mut(index) {
                Some(Entity::Table(table)) => elements = &mut table.elements,
                _ => {
                    return Err(BuildError::NotATable {
                        key: self.cursor_key.to_string(),
                        span: Span::default(),
                    });
                }
            }
        }
        Ok(elements)
    }
}

/// The value end of a key/value being inserted.
struct Leaf {
    value: Entity,
    span: Span,
    comment: Option<Comment>,
}

impl Leaf {
    fn into_key_value(self, part: &KeyPart) -> KeyValue {
        KeyValue {
            key: Key::new(vec![part.clone()]),
            value: Box::new(self.value),
            comment: self.comment,
            commented: false,
            span: Some(self.span),
        }
    }
}

/// Index of the last table among `elements` whose key denotes `key`.
fn last_table(elements: &[Entity], key: &Key) -> Option<usize> {
    elements
        .iter()
        .rposition(|e| matches!(e, Entity::Table(t) if t.key.path_equal(key)))
}

/// Index of the last key/value among `elements` whose first key part is the
/// last part of `key`.
fn find_key_value(elements: &[Entity], key: &Key) -> Option<usize> {
    let name = &key.last()?.value;
    elements.iter().rposition(|e| {
        matches!(e, Entity::KeyValue(kv)
            if kv.key.parts().first().is_some_and(|part| &part.value == name))
    })
}

/// Insert a (possibly dotted) key/value into a table's elements.
///
/// `base` is the absolute key of the table, used to recognize sub-tables
/// and to name keys in errors.
fn insert_into_table(
    elements: &mut Vec<Entity>,
    base: &Key,
    parts: &[KeyPart],
    leaf: Leaf,
) -> Result<(), BuildError> {
    let Some((first, rest)) = parts.split_first() else {
        return Err(BuildError::UnexpectedExpression {
            kind: "key/value without a key".to_string(),
            span: leaf.span,
        });
    };
    let full = base.child(first.clone());

    if rest.is_empty() {
        if let Some(index) = find_key_value(elements, &full) {
            return Err(BuildError::DuplicateKey {
                key: full.to_string(),
                span: leaf.span,
                previous: elements[index].as_key_value().and_then(|kv| kv.span),
            });
        }
        if last_table(elements, &full).is_some() {
            return Err(BuildError::KeyCollision {
                key: full.to_string(),
                span: leaf.span,
            });
        }
        elements.push(leaf.into_key_value(first).into());
        return Ok(());
    }

    if let Some(index) = last_table(elements, &full) {
        return match &mut elements[index] {
            Entity::Table(table) if !table.explicit && !table.array => {
                insert_into_table(&mut table.elements, &full, rest, leaf)
            }
            _ => Err(BuildError::KeyCollision {
                key: full.to_string(),
                span: leaf.span,
            }),
        };
    }

    let index = match find_key_value(elements, &full) {
        Some(index) => index,
        None => {
            elements.push(dotted_key_value(first, leaf.span).into());
            elements.len() - 1
        }
    };
    match &mut elements[index] {
        Entity::KeyValue(kv) => descend_dotted(kv, &full, rest, leaf),
        _ => Err(BuildError::NotATable {
            key: full.to_string(),
            span: leaf.span,
        }),
    }
}

/// Insert a (possibly dotted) key/value into the entries of an inline table.
fn insert_into_inline(
    elements: &mut Vec<KeyValue>,
    base: &Key,
    parts: &[KeyPart],
    leaf: Leaf,
) -> Result<(), BuildError> {
    let Some((first, rest)) = parts.split_first() else {
        return Err(BuildError::UnexpectedExpression {
            kind: "key/value without a key".to_string(),
            span: leaf.span,
        });
    };
    let full = base.child(first.clone());
    let existing = elements
        .iter()
        .rposition(|kv| kv.key.is_single(&first.value));

    if rest.is_empty() {
        if let Some(index) = existing {
            return Err(BuildError::DuplicateKey {
                key: full.to_string(),
                span: leaf.span,
                previous: elements[index].span,
            });
        }
        elements.push(leaf.into_key_value(first));
        return Ok(());
    }

    let index = match existing {
        Some(index) => index,
        None => {
            elements.push(dotted_key_value(first, leaf.span));
            elements.len() - 1
        }
    };
    descend_dotted(&mut elements[index], &full, rest, leaf)
}

/// A key/value holding the structure implied by one dotted key part.
fn dotted_key_value(part: &KeyPart, span: Span) -> KeyValue {
    let mut kv = KeyValue::new(
        Key::new(vec![part.clone()]),
        InlineTable {
            elements: Vec::new(),
            dotted: true,
        },
    );
    kv.span = Some(span);
    kv
}

/// Continue a dotted key inside an existing key/value.
///
/// Only structure created by other dotted keys can be extended; inline
/// tables written with braces are closed.
fn descend_dotted(
    kv: &mut KeyValue,
    full: &Key,
    rest: &[KeyPart],
    leaf: Leaf,
) -> Result<(), BuildError> {
    match kv.value.as_mut() {
        Entity::InlineTable(inline) if inline.dotted => {
            insert_into_inline(&mut inline.elements, full, rest, leaf)
        }
        Entity::InlineTable(_) => Err(BuildError::KeyCollision {
            key: full.to_string(),
            span: leaf.span,
        }),
        _ => Err(BuildError::NotATable {
            key: full.to_string(),
            span: leaf.span,
        }),
    }
}

/// Convert a parsed value into a value-kind entity, decoding literals.
fn convert_value(node: ValueNode<'_>) -> Result<Entity, BuildError> {
    let ValueNode {
        kind,
        span,
        raw,
        content,
    } = node;
    let rebase = |err: DecodeError| BuildError::Decode(err.offset_by(span.start));

    match (kind, content) {
        (ValueKind::String, ValueContent::String(string)) => Ok(Entity::String(StringValue {
            value: string.value.into_owned(),
            multiline: string.multiline,
            literal: string.literal,
        })),
        (ValueKind::Integer, ValueContent::Literal) => {
            decode_integer(raw).map(Entity::Integer).map_err(rebase)
        }
        (ValueKind::Float, ValueContent::Literal) => {
            decode_float(raw).map(Entity::Float).map_err(rebase)
        }
        (ValueKind::Boolean, ValueContent::Literal) => match raw {
            "true" => Ok(Entity::Boolean(true)),
            "false" => Ok(Entity::Boolean(false)),
            _ => Err(rebase(DecodeError::new(
                0..raw.len(),
                "booleans are `true` or `false`",
            ))),
        },
        (ValueKind::LocalDate, ValueContent::Literal) => {
            raw.parse::<LocalDate>().map(Entity::LocalDate).map_err(rebase)
        }
        (ValueKind::LocalTime, ValueContent::Literal) => {
            raw.parse::<LocalTime>().map(Entity::LocalTime).map_err(rebase)
        }
        (ValueKind::LocalDateTime, ValueContent::Literal) => raw
            .parse::<LocalDateTime>()
            .map(Entity::LocalDateTime)
            .map_err(rebase),
        (ValueKind::OffsetDateTime, ValueContent::Literal) => raw
            .parse::<OffsetDateTime>()
            .map(Entity::OffsetDateTime)
            .map_err(rebase),
        (ValueKind::Array, ValueContent::Array { elements, multiline }) => {
            let elements = elements
                .into_iter()
                .map(convert_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Entity::Array(Array {
                elements,
                multiline,
                comment: None,
                commented: false,
            }))
        }
        (ValueKind::InlineTable, ValueContent::InlineTable { entries }) => {
            let mut elements = Vec::with_capacity(entries.len());
            for mut entry in entries {
                let entry_span = entry.span;
                if entry.kind != ExpressionKind::KeyValue {
                    return Err(BuildError::UnexpectedExpression {
                        kind: format!("{:?} expression in inline table", entry.kind),
                        span: entry_span,
                    });
                }
                let parts: Vec<KeyPart> = entry.key().map(KeyPart::from).collect();
                let Some(node) = entry.take_value() else {
                    return Err(BuildError::UnexpectedExpression {
                        kind: "key without a value".to_string(),
                        span: entry_span,
                    });
                };
                let leaf = Leaf {
                    value: convert_value(node)?,
                    span: entry_span,
                    comment: None,
                };
                insert_into_inline(&mut elements, &Key::default(), &parts, leaf)?;
            }
            Ok(Entity::InlineTable(InlineTable {
                elements,
                dotted: false,
            }))
        }
        (kind, _) => Err(BuildError::UnexpectedExpression {
            kind: format!("{kind:?} value"),
            span,
        }),
    }
}
