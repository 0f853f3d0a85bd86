//! On-demand validation of a document tree.
//!
//! Parsed documents satisfy these checks by construction. Documents built or
//! edited by hand may not, so callers run [`Document::validate`] before
//! handing a tree to anything that relies on them.

use std::collections::{HashMap, HashSet};

use crate::Document;
use crate::entity::{Entity, KeyValue};
use crate::key::{Key, KeyKind};

/// A problem found by [`Document::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    /// Where the problem is, as a dotted key with `[n]` for array elements.
    pub path: String,
    pub kind: ValidationErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("key has no parts")]
    EmptyKey,
    #[error("key part {part:?} cannot be written as a {kind:?} key")]
    InvalidKeyPart { part: String, kind: KeyKind },
    /// A table whose key does not extend its parent's key by one part.
    #[error("table key does not extend `{parent}` by exactly one part")]
    MisplacedTable { parent: String },
    #[error("{kind} cannot appear directly in a table")]
    ValueInTablePosition { kind: &'static str },
    #[error("{kind} cannot be used as a value")]
    NotAValue { kind: &'static str },
    #[error("table is defined more than once")]
    DuplicateTable,
    #[error("key is defined more than once")]
    DuplicateKey,
    /// A sibling of a different kind already claims the path.
    #[error("{kind} conflicts with a sibling {existing} of the same name")]
    KeyCollision {
        kind: &'static str,
        existing: &'static str,
    },
    #[error("{kind} `{value}` does not exist")]
    InvalidDateTime { kind: &'static str, value: String },
}

impl Document {
    /// Check the tree for structural problems.
    ///
    /// Returns every problem found; an empty list means the document is
    /// valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut validator = Validator::default();
        validator.table_elements(&Key::default(), &self.elements);
        validator.errors
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn report(&mut self, path: impl Into<String>, kind: ValidationErrorKind) {
        self.errors.push(ValidationError {
            path: path.into(),
            kind,
        });
    }

    fn table_elements(&mut self, parent: &Key, elements: &[Entity]) {
        // First sibling to claim each absolute path.
        let mut siblings: HashMap<Vec<String>, Sibling> = HashMap::new();

        for element in elements {
            match element {
                Entity::Table(table) => {
                    let path = table.key.to_string();
                    self.key(&path, &table.key);
                    if table.key.len() != parent.len() + 1 || !table.key.starts_with(parent) {
                        self.report(
                            &path,
                            ValidationErrorKind::MisplacedTable {
                                parent: parent.to_string(),
                            },
                        );
                    }
                    let sibling = if table.array {
                        Sibling::ArrayTable
                    } else {
                        Sibling::Table
                    };
                    self.claim(&mut siblings, path_values(&table.key), sibling, &path);
                    self.table_elements(&table.key, &table.elements);
                }
                Entity::KeyValue(kv) => {
                    let path = qualified(parent, &kv.key);
                    let mut values = path_values(parent);
                    values.extend(path_values(&kv.key));
                    self.claim(&mut siblings, values, Sibling::KeyValue, &path);
                    self.key_value(&path, kv);
                }
                value => self.report(
                    parent.to_string(),
                    ValidationErrorKind::ValueInTablePosition {
                        kind: value.kind_name(),
                    },
                ),
            }
        }
    }

    fn claim(
        &mut self,
        siblings: &mut HashMap<Vec<String>, Sibling>,
        values: Vec<String>,
        sibling: Sibling,
        path: &str,
    ) {
        let Some(&existing) = siblings.get(&values) else {
            siblings.insert(values, sibling);
            return;
        };
        let kind = match (existing, sibling) {
            (Sibling::ArrayTable, Sibling::ArrayTable) => return,
            (Sibling::KeyValue, Sibling::KeyValue) => ValidationErrorKind::DuplicateKey,
            (Sibling::Table, Sibling::Table) => ValidationErrorKind::DuplicateTable,
            _ => ValidationErrorKind::KeyCollision {
                kind: sibling.name(),
                existing: existing.name(),
            },
        };
        self.report(path, kind);
    }

    fn key_value(&mut self, path: &str, kv: &KeyValue) {
        self.key(path, &kv.key);
        self.value(path, &kv.value);
    }

    fn key(&mut self, path: &str, key: &Key) {
        if key.is_empty() {
            self.report(path, ValidationErrorKind::EmptyKey);
        }
        for part in key.parts().iter().filter(|part| !part.is_valid()) {
            self.report(
                path,
                ValidationErrorKind::InvalidKeyPart {
                    part: part.value.clone(),
                    kind: part.kind,
                },
            );
        }
    }

    fn value(&mut self, path: &str, value: &Entity) {
        match value {
            Entity::Table(_) | Entity::KeyValue(_) => self.report(
                path,
                ValidationErrorKind::NotAValue {
                    kind: value.kind_name(),
                },
            ),
            Entity::Array(array) => {
                for (i, element) in array.elements.iter().enumerate() {
                    self.value(&format!("{path}[{i}]"), element);
                }
            }
            Entity::InlineTable(inline) => {
                let mut keys = HashSet::new();
                for kv in &inline.elements {
                    let child = format!("{path}.{}", kv.key);
                    if !keys.insert(path_values(&kv.key)) {
                        self.report(&child, ValidationErrorKind::DuplicateKey);
                    }
                    self.key_value(&child, kv);
                }
            }
            Entity::LocalDate(date) if !date.is_valid() => {
                self.invalid_date_time(path, value, date.to_string())
            }
            Entity::LocalTime(time) if !time.is_valid() => {
                self.invalid_date_time(path, value, time.to_string())
            }
            Entity::LocalDateTime(dt) if !dt.is_valid() => {
                self.invalid_date_time(path, value, dt.to_string())
            }
            Entity::OffsetDateTime(dt) if !dt.is_valid() => {
                self.invalid_date_time(path, value, dt.to_string())
            }
            _ => {}
        }
    }

    fn invalid_date_time(&mut self, path: &str, entity: &Entity, value: String) {
        self.report(
            path,
            ValidationErrorKind::InvalidDateTime {
                kind: entity.kind_name(),
                value,
            },
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sibling {
    KeyValue,
    Table,
    ArrayTable,
}

impl Sibling {
    fn name(self) -> &'static str {
        match self {
            Sibling::KeyValue => "key/value",
            Sibling::Table => "table",
            Sibling::ArrayTable => "array table",
        }
    }
}

fn path_values(key: &Key) -> Vec<String> {
    key.parts().iter().map(|part| part.value.clone()).collect()
}

fn qualified(parent: &Key, key: &Key) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::{LocalDate, LocalDateTime, LocalTime, Offset, OffsetDateTime};
    use crate::entity::{Array, InlineTable, Table};
    use crate::key::KeyPart;
    use crate::parse;
    use facet_testhelpers::test;

    fn kinds(doc: &Document) -> Vec<ValidationErrorKind> {
        doc.validate().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_parsed_documents_are_valid() {
        let doc = parse(
            "a = 1\n[t]\nb.c = [1, { d = 2 }]\n[[arr]]\n[[arr]]\nx = 1979-05-27\n[t.u]\n",
        )
        .unwrap();
        assert_eq!(doc.validate(), vec![]);
    }

    #[test]
    fn test_duplicates() {
        let mut doc = Document::new();
        doc.elements.push(KeyValue::bare("a", 1i64).into());
        doc.elements.push(KeyValue::bare("a", 2i64).into());
        doc.elements.push(Table::explicit(Key::single("t")).into());
        doc.elements.push(Table::explicit(Key::single("t")).into());
        doc.elements.push(Table::array(Key::single("p")).into());
        doc.elements.push(Table::array(Key::single("p")).into());

        let errors = doc.validate();
        assert_eq!(errors.len(), 2);
        insta::assert_snapshot!(errors[0], @"a: key is defined more than once");
        insta::assert_snapshot!(errors[1], @"t: table is defined more than once");
    }

    #[test]
    fn test_siblings_of_different_kinds_collide() {
        let mut doc = Document::new();
        doc.elements.push(KeyValue::bare("a", 1i64).into());
        doc.elements.push(Table::explicit(Key::single("a")).into());
        doc.elements.push(Table::explicit(Key::single("b")).into());
        doc.elements.push(Table::array(Key::single("b")).into());
        doc.elements.push(Table::array(Key::single("c")).into());
        doc.elements.push(KeyValue::bare("c", 2i64).into());

        let errors = doc.validate();
        assert_eq!(errors.len(), 3);
        insta::assert_snapshot!(errors[0], @"a: table conflicts with a sibling key/value of the same name");
        insta::assert_snapshot!(errors[1], @"b: array table conflicts with a sibling table of the same name");
        insta::assert_snapshot!(errors[2], @"c: key/value conflicts with a sibling array table of the same name");
    }

    #[test]
    fn test_implicit_and_explicit_table_are_duplicates() {
        let mut doc = Document::new();
        doc.elements.push(Table::implicit(Key::single("t")).into());
        doc.elements.push(Table::explicit(Key::single("t")).into());

        assert_eq!(kinds(&doc), vec![ValidationErrorKind::DuplicateTable]);
    }

    #[test]
    fn test_nested_key_value_collides_with_table() {
        let mut outer = Table::explicit(Key::single("a"));
        outer.push(KeyValue::bare("b", 1i64));
        outer.push(Table::explicit(Key::join(["a", "b"])));
        let mut doc = Document::new();
        doc.elements.push(outer.into());

        let errors = doc.validate();
        assert_eq!(errors.len(), 1);
        insta::assert_snapshot!(errors[0], @"a.b: table conflicts with a sibling key/value of the same name");
    }

    #[test]
    fn test_misplaced_table() {
        let mut outer = Table::explicit(Key::single("a"));
        outer.push(Table::explicit(Key::join(["b", "c"])));
        let mut doc = Document::new();
        doc.elements.push(outer.into());

        assert_eq!(
            kinds(&doc),
            vec![ValidationErrorKind::MisplacedTable {
                parent: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_position_errors() {
        let mut doc = Document::new();
        doc.elements.push(Entity::Integer(3));
        doc.elements.push(KeyValue::bare("k", Table::explicit(Key::single("k"))).into());
        doc.elements.push(
            KeyValue::bare(
                "arr",
                Array::new(vec![KeyValue::bare("x", 1i64).into()]),
            )
            .into(),
        );

        let errors = doc.validate();
        insta::assert_snapshot!(errors[0], @": integer cannot appear directly in a table");
        insta::assert_snapshot!(errors[1], @"k: table cannot be used as a value");
        insta::assert_snapshot!(errors[2], @"arr[0]: key/value cannot be used as a value");
    }

    #[test]
    fn test_invalid_keys() {
        let mut doc = Document::new();
        doc.elements.push(KeyValue::new(Key::default(), 1i64).into());
        doc.elements.push(KeyValue::new(Key::new(vec![KeyPart::bare("a b")]), 1i64).into());
        doc.elements.push(
            KeyValue::bare(
                "inline",
                InlineTable::new(vec![
                    KeyValue::new(Key::new(vec![KeyPart::new("it's", KeyKind::Literal)]), 1i64),
                ]),
            )
            .into(),
        );

        assert_eq!(
            kinds(&doc),
            vec![
                ValidationErrorKind::EmptyKey,
                ValidationErrorKind::InvalidKeyPart {
                    part: "a b".to_string(),
                    kind: KeyKind::Bare
                },
                ValidationErrorKind::InvalidKeyPart {
                    part: "it's".to_string(),
                    kind: KeyKind::Literal
                },
            ]
        );
    }

    #[test]
    fn test_calendar_checks() {
        let mut doc = parse("d = 1979-02-30\nt = 24:00:00\nok = 2024-02-29\n").unwrap();
        doc.elements.push(
            KeyValue::bare(
                "odt",
                OffsetDateTime::new(
                    LocalDateTime::new(LocalDate::new(2024, 1, 1), LocalTime::new(0, 0, 0, 0)),
                    Offset::Fixed(25 * 3600),
                ),
            )
            .into(),
        );

        let errors = doc.validate();
        assert_eq!(errors.len(), 3);
        insta::assert_snapshot!(errors[0], @"d: local date `1979-02-30` does not exist");
        insta::assert_snapshot!(errors[1], @"t: local time `24:00:00` does not exist");
        insta::assert_snapshot!(errors[2], @"odt: offset date-time `2024-01-01T00:00:00+25:00` does not exist");
    }
}
