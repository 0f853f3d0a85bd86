//! Node types of the document tree.
//!
//! Every node is an [`Entity`]. Tables and key/values are keyed; arrays,
//! inline tables and scalars are values and carry no key.

use tomldoc_parse::Span;

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::key::{Key, KeyPart};

/// A comment attached to a table, key/value or array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Comment {
    /// Comment text without `#`. Several lines are joined with `\n`.
    pub text: String,
    /// Whether the comment sits on the same line as its entity.
    pub inline: bool,
}

impl Comment {
    /// A comment placed on the lines above its entity.
    pub fn above(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            inline: false,
        }
    }

    /// A comment on the same line as its entity.
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            inline: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<tomldoc_parse::Comment> for Comment {
    fn from(comment: tomldoc_parse::Comment) -> Self {
        Self {
            text: comment.text,
            inline: comment.inline,
        }
    }
}

/// A table, introduced by a header or implied by a longer path.
///
/// The key is the absolute path from the document root.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Table {
    /// Absolute path of the table.
    pub key: Key,
    /// Key/values and sub-tables in declaration order.
    pub elements: Vec<Entity>,
    /// Member of an array of tables (`[[key]]`).
    pub array: bool,
    /// Introduced by its own header rather than implied.
    pub explicit: bool,
    pub comment: Option<Comment>,
    /// Commented out when written.
    pub commented: bool,
    /// Span of the header (None for implicit or hand-built tables).
    pub span: Option<Span>,
}

impl Table {
    /// A table that exists only as an intermediate path segment.
    pub fn implicit(key: Key) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// A table with its own `[key]` header.
    pub fn explicit(key: Key) -> Self {
        Self {
            key,
            explicit: true,
            ..Self::default()
        }
    }

    /// One member of an array of tables (`[[key]]`).
    pub fn array(key: Key) -> Self {
        Self {
            key,
            array: true,
            explicit: true,
            ..Self::default()
        }
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Append a child.
    pub fn push(&mut self, entity: impl Into<Entity>) {
        self.elements.push(entity.into());
    }

    /// The last direct child named `name`.
    ///
    /// Key/values match on their key, sub-tables on the last part of theirs.
    /// For an array of tables this is the last member.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.elements.iter().rev().find(|e| e.has_local_name(name))
    }

    /// Mutable variant of [`Table::get`].
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.elements.iter_mut().rev().find(|e| e.has_local_name(name))
    }

    /// The direct key/value children.
    pub fn key_values(&self) -> impl Iterator<Item = &KeyValue> {
        self.elements.iter().filter_map(Entity::as_key_value)
    }

    /// The direct sub-tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(Entity::as_table)
    }
}

/// A key bound to a value: `key = value`.
///
/// The key is relative to the enclosing table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct KeyValue {
    pub key: Key,
    /// Always a value-kind entity.
    pub value: Box<Entity>,
    pub comment: Option<Comment>,
    pub commented: bool,
    /// Span of the whole assignment (None if hand-built).
    pub span: Option<Span>,
}

impl KeyValue {
    /// Bind `value` to `key`.
    pub fn new(key: Key, value: impl Into<Entity>) -> Self {
        Self {
            key,
            value: Box::new(value.into()),
            comment: None,
            commented: false,
            span: None,
        }
    }

    /// Shorthand for a key/value with a single bare key part.
    pub fn bare(name: impl Into<String>, value: impl Into<Entity>) -> Self {
        Self::new(Key::new(vec![KeyPart::bare(name)]), value)
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// An array value `[a, b, c]`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Array {
    pub elements: Vec<Entity>,
    /// Written across several lines.
    pub multiline: bool,
    pub comment: Option<Comment>,
    pub commented: bool,
}

impl Array {
    pub fn new(elements: Vec<Entity>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }
}

/// An inline table `{ a = 1, b = 2 }`.
///
/// Also used for the structure a dotted key creates inside a table:
/// `a.b = 1` binds `a` to an inline table with `dotted` set.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct InlineTable {
    pub elements: Vec<KeyValue>,
    /// Created by a dotted key rather than written with braces.
    pub dotted: bool,
}

impl InlineTable {
    pub fn new(elements: Vec<KeyValue>) -> Self {
        Self {
            elements,
            dotted: false,
        }
    }

    /// The last entry whose key is `name`.
    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.elements.iter().rev().find(|kv| kv.key.is_single(name))
    }
}

/// A string value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct StringValue {
    /// The contents, escapes already processed.
    pub value: String,
    /// Written with triple quotes.
    pub multiline: bool,
    /// Written with single quotes.
    pub literal: bool,
}

impl StringValue {
    /// A basic single-line string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Entity {
    Table(Table),
    KeyValue(KeyValue),
    Array(Array),
    InlineTable(InlineTable),
    String(StringValue),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    LocalDateTime(LocalDateTime),
    OffsetDateTime(OffsetDateTime),
}

impl Entity {
    /// Whether this entity may appear on the right-hand side of `=` or
    /// inside an array.
    pub fn is_value(&self) -> bool {
        !self.is_keyed()
    }

    /// Whether this entity carries a key.
    pub fn is_keyed(&self) -> bool {
        matches!(self, Entity::Table(_) | Entity::KeyValue(_))
    }

    /// Whether this entity holds other entities.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Entity::Table(_) | Entity::Array(_) | Entity::InlineTable(_)
        )
    }

    /// The key of a table or key/value.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Entity::Table(table) => Some(&table.key),
            Entity::KeyValue(kv) => Some(&kv.key),
            _ => None,
        }
    }

    /// A short lowercase name of the variant, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Table(t) if t.array => "array table",
            Entity::Table(_) => "table",
            Entity::KeyValue(_) => "key/value",
            Entity::Array(_) => "array",
            Entity::InlineTable(_) => "inline table",
            Entity::String(_) => "string",
            Entity::Integer(_) => "integer",
            Entity::Float(_) => "float",
            Entity::Boolean(_) => "boolean",
            Entity::LocalDate(_) => "local date",
            Entity::LocalTime(_) => "local time",
            Entity::LocalDateTime(_) => "local date-time",
            Entity::OffsetDateTime(_) => "offset date-time",
        }
    }

    pub fn comment(&self) -> Option<&Comment> {
        match self {
            Entity::Table(t) => t.comment.as_ref(),
            Entity::KeyValue(kv) => kv.comment.as_ref(),
            Entity::Array(a) => a.comment.as_ref(),
            _ => None,
        }
    }

    pub fn is_commented(&self) -> bool {
        match self {
            Entity::Table(t) => t.commented,
            Entity::KeyValue(kv) => kv.commented,
            Entity::Array(a) => a.commented,
            _ => false,
        }
    }

    /// Whether a table or key/value child is reachable as `name` from its
    /// parent.
    pub(crate) fn has_local_name(&self, name: &str) -> bool {
        match self {
            Entity::Table(t) => t.key.last().is_some_and(|part| part.value == name),
            Entity::KeyValue(kv) => kv.key.is_single(name),
            _ => false,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Entity::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Entity::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_key_value(&self) -> Option<&KeyValue> {
        match self {
            Entity::KeyValue(kv) => Some(kv),
            _ => None,
        }
    }

    pub fn as_key_value_mut(&mut self) -> Option<&mut KeyValue> {
        match self {
            Entity::KeyValue(kv) => Some(kv),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Entity::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_inline_table(&self) -> Option<&InlineTable> {
        match self {
            Entity::InlineTable(t) => Some(t),
            _ => None,
        }
    }

    /// The contents of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Entity::String(s) => Some(&s.value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Entity::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Entity::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Entity::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_local_date(&self) -> Option<LocalDate> {
        match self {
            Entity::LocalDate(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_local_time(&self) -> Option<LocalTime> {
        match self {
            Entity::LocalTime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_local_date_time(&self) -> Option<LocalDateTime> {
        match self {
            Entity::LocalDateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_offset_date_time(&self) -> Option<OffsetDateTime> {
        match self {
            Entity::OffsetDateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl From<Table> for Entity {
    fn from(table: Table) -> Self {
        Entity::Table(table)
    }
}

impl From<KeyValue> for Entity {
    fn from(kv: KeyValue) -> Self {
        Entity::KeyValue(kv)
    }
}

impl From<Array> for Entity {
    fn from(array: Array) -> Self {
        Entity::Array(array)
    }
}

impl From<InlineTable> for Entity {
    fn from(table: InlineTable) -> Self {
        Entity::InlineTable(table)
    }
}

impl From<StringValue> for Entity {
    fn from(s: StringValue) -> Self {
        Entity::String(s)
    }
}

impl From<&str> for Entity {
    fn from(s: &str) -> Self {
        Entity::String(StringValue::new(s))
    }
}

impl From<String> for Entity {
    fn from(s: String) -> Self {
        Entity::String(StringValue::new(s))
    }
}

impl From<i64> for Entity {
    fn from(i: i64) -> Self {
        Entity::Integer(i)
    }
}

impl From<f64> for Entity {
    fn from(f: f64) -> Self {
        Entity::Float(f)
    }
}

impl From<bool> for Entity {
    fn from(b: bool) -> Self {
        Entity::Boolean(b)
    }
}

impl From<LocalDate> for Entity {
    fn from(d: LocalDate) -> Self {
        Entity::LocalDate(d)
    }
}

impl From<LocalTime> for Entity {
    fn from(t: LocalTime) -> Self {
        Entity::LocalTime(t)
    }
}

impl From<LocalDateTime> for Entity {
    fn from(dt: LocalDateTime) -> Self {
        Entity::LocalDateTime(dt)
    }
}

impl From<OffsetDateTime> for Entity {
    fn from(dt: OffsetDateTime) -> Self {
        Entity::OffsetDateTime(dt)
    }
}

impl<V: Into<Entity>> From<Vec<V>> for Entity {
    fn from(values: Vec<V>) -> Self {
        Entity::Array(Array::new(values.into_iter().map(Into::into).collect()))
    }
}
