//! Path lookup through a document.

use crate::Document;
use crate::entity::Entity;

/// One step of a lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A table, key/value or inline-table entry by name.
    Key(String),
    /// An array element, or a member of an array of tables. Negative
    /// indices count from the end.
    Index(isize),
}

impl PathSegment {
    pub fn key(name: impl Into<String>) -> Self {
        PathSegment::Key(name.into())
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Key(name.to_string())
    }
}

impl From<isize> for PathSegment {
    fn from(index: isize) -> Self {
        PathSegment::Index(index)
    }
}

impl Document {
    /// Look up the entity at `path`.
    ///
    /// A key segment matches a sub-table by the last part of its key, or a
    /// key/value, resolving to its value. For an array of tables, an index
    /// segment right after the name picks a member; otherwise the last member
    /// is used. Implicit tables can be walked through but are never returned.
    pub fn get_at(&self, path: &[PathSegment]) -> Option<&Entity> {
        let (first, rest) = path.split_first()?;
        let PathSegment::Key(name) = first else {
            return None;
        };
        let (found, rest) = select_child(&self.elements, name, rest)?;
        resolve(found, rest)
    }
}

/// Continue a lookup from `current`.
fn resolve<'a>(current: &'a Entity, path: &[PathSegment]) -> Option<&'a Entity> {
    let Some((segment, rest)) = path.split_first() else {
        return match current {
            Entity::Table(table) if !table.explicit => None,
            other => Some(other),
        };
    };

    match (current, segment) {
        (Entity::Table(table), PathSegment::Key(name)) => {
            let (found, rest) = select_child(&table.elements, name, rest)?;
            resolve(found, rest)
        }
        (Entity::InlineTable(inline), PathSegment::Key(name)) => {
            resolve(&inline.get(name)?.value, rest)
        }
        (Entity::Array(array), PathSegment::Index(index)) => {
            resolve(array.elements.get(absolute(*index, array.elements.len())?)?, rest)
        }
        _ => None,
    }
}

/// Find the child named `name` among `elements`, consuming a following index
/// segment when the name denotes an array of tables.
fn select_child<'a, 'p>(
    elements: &'a [Entity],
    name: &str,
    rest: &'p [PathSegment],
) -> Option<(&'a Entity, &'p [PathSegment])> {
    let last = elements.iter().rev().find(|e| e.has_local_name(name))?;

    match last {
        Entity::KeyValue(kv) => Some((&kv.value, rest)),
        Entity::Table(table) if table.array => {
            let members: Vec<&Entity> = elements
                .iter()
                .filter(|e| matches!(e, Entity::Table(t) if t.array && t.key.path_equal(&table.key)))
                .collect();
            match rest.split_first() {
                Some((PathSegment::Index(index), rest)) => {
                    let member = members.get(absolute(*index, members.len())?)?;
                    Some((*member, rest))
                }
                _ => Some((last, rest)),
            }
        }
        table => Some((table, rest)),
    }
}

fn absolute(index: isize, len: usize) -> Option<usize> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use facet_testhelpers::test;

    fn key(name: &str) -> PathSegment {
        PathSegment::key(name)
    }

    #[test]
    fn test_key_values_and_tables() {
        let doc = parse("title = \"x\"\n[owner]\nname = \"Tom\"\n[db.conn]\nport = 5432\n").unwrap();
        assert_eq!(doc.get_at(&[key("title")]).and_then(Entity::as_str), Some("x"));
        assert_eq!(
            doc.get_at(&[key("owner"), key("name")]).and_then(Entity::as_str),
            Some("Tom")
        );
        assert_eq!(
            doc.get_at(&[key("db"), key("conn"), key("port")])
                .and_then(Entity::as_integer),
            Some(5432)
        );
        assert!(doc.get_at(&[key("owner")]).and_then(Entity::as_table).is_some());
        assert_eq!(doc.get_at(&[key("missing")]), None);
        assert_eq!(doc.get_at(&[]), None);
    }

    #[test]
    fn test_implicit_tables_are_not_returned() {
        let doc = parse("[a.b]\nc = 1\n").unwrap();
        assert_eq!(doc.get_at(&[key("a")]), None);
        assert!(doc.get_at(&[key("a"), key("b")]).is_some());
    }

    #[test]
    fn test_array_of_tables() {
        let doc = parse("[[p]]\nn = 1\n[[p]]\nn = 2\n[[p]]\nn = 3\n").unwrap();
        let n = |path: &[PathSegment]| doc.get_at(path).and_then(Entity::as_integer);
        assert_eq!(n(&[key("p"), key("n")]), Some(3));
        assert_eq!(n(&[key("p"), PathSegment::Index(0), key("n")]), Some(1));
        assert_eq!(n(&[key("p"), PathSegment::Index(-2), key("n")]), Some(2));
        assert_eq!(n(&[key("p"), PathSegment::Index(3), key("n")]), None);
        assert_eq!(n(&[key("p"), PathSegment::Index(-4), key("n")]), None);
    }

    #[test]
    fn test_arrays_and_inline_tables() {
        let doc = parse("a = [1, [2, 3]]\npoint = { x = 1, y = { z = 9 } }\nb.c = 7\n").unwrap();
        let n = |path: &[PathSegment]| doc.get_at(path).and_then(Entity::as_integer);
        assert_eq!(n(&[key("a"), PathSegment::Index(0)]), Some(1));
        assert_eq!(n(&[key("a"), PathSegment::Index(-1), PathSegment::Index(-1)]), Some(3));
        assert_eq!(n(&[key("point"), key("y"), key("z")]), Some(9));
        assert_eq!(n(&[key("b"), key("c")]), Some(7));
        assert_eq!(n(&[key("a"), key("x")]), None);
    }
}
