//! Dotted keys of tables and key/values.

use std::fmt;

pub use tomldoc_parse::KeyKind;
use tomldoc_parse::KeyPartNode;

/// One part of a dotted key.
///
/// A part constructed by hand is not guaranteed to be representable with its
/// [`KeyKind`]; use [`KeyPart::is_valid`] to check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct KeyPart {
    /// The key text, without quotes or escapes.
    pub value: String,
    /// How the part is written.
    pub kind: KeyKind,
}

impl KeyPart {
    /// Create a key part.
    pub fn new(value: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Create a bare key part.
    pub fn bare(value: impl Into<String>) -> Self {
        Self::new(value, KeyKind::Bare)
    }

    /// Create a key part with the simplest kind that can represent `value`.
    ///
    /// The precedence is bare, then literal, then quoted.
    pub fn infer(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = [KeyKind::Bare, KeyKind::Literal]
            .into_iter()
            .find(|kind| representable(&value, *kind))
            .unwrap_or(KeyKind::Quoted);
        Self { value, kind }
    }

    /// Whether `value` can be written with `kind`.
    pub fn is_valid(&self) -> bool {
        representable(&self.value, self.kind)
    }
}

fn representable(value: &str, kind: KeyKind) -> bool {
    match kind {
        KeyKind::Bare => {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        KeyKind::Literal => value
            .chars()
            .all(|c| c != '\'' && (c == '\t' || !(c < ' ' || c == '\u{7f}'))),
        KeyKind::Quoted => !value.contains('\n'),
    }
}

impl From<&KeyPartNode<'_>> for KeyPart {
    fn from(node: &KeyPartNode<'_>) -> Self {
        Self::new(node.value.as_ref(), node.kind)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            KeyKind::Bare => f.write_str(&self.value),
            KeyKind::Literal => write!(f, "'{}'", self.value),
            KeyKind::Quoted => {
                f.write_str("\"")?;
                for c in self.value.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\u{8}' => f.write_str("\\b")?,
                        '\t' => f.write_str("\\t")?,
                        '\n' => f.write_str("\\n")?,
                        '\u{c}' => f.write_str("\\f")?,
                        '\r' => f.write_str("\\r")?,
                        c if c < ' ' || c == '\u{7f}' => write!(f, "\\u{:04X}", c as u32)?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

/// A dotted key: an ordered sequence of parts.
///
/// `PartialEq` compares parts including their kind. Use
/// [`Key::path_equal`] to compare the paths two keys denote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Key {
    parts: Vec<KeyPart>,
}

impl Key {
    /// Create a key from parts.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    /// Build a key of bare parts from plain strings.
    pub fn join<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(KeyPart::bare).collect(),
        }
    }

    /// Build a key from plain strings, picking the simplest kind for each
    /// part (see [`KeyPart::infer`]).
    pub fn infer<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(KeyPart::infer).collect(),
        }
    }

    /// A key with one bare part.
    pub fn single(part: impl Into<String>) -> Self {
        Self {
            parts: vec![KeyPart::bare(part)],
        }
    }

    /// Whether two keys denote the same path. Quoting is ignored.
    pub fn path_equal(&self, other: &Key) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.value == b.value)
    }

    /// Whether the path of `prefix` is a prefix of this key's path.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.parts.len() >= prefix.parts.len()
            && self
                .parts
                .iter()
                .zip(&prefix.parts)
                .all(|(a, b)| a.value == b.value)
    }

    /// Whether this key is exactly one part named `name`.
    pub fn is_single(&self, name: &str) -> bool {
        matches!(self.parts.as_slice(), [part] if part.value == name)
    }

    /// The first `len` parts as a new key.
    pub fn prefix(&self, len: usize) -> Key {
        Key {
            parts: self.parts[..len.min(self.parts.len())].to_vec(),
        }
    }

    /// This key extended by one part.
    pub fn child(&self, part: KeyPart) -> Key {
        let mut parts = Vec::with_capacity(self.parts.len() + 1);
        parts.extend_from_slice(&self.parts);
        parts.push(part);
        Key { parts }
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the key has no parts. Such a key is never valid.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The parts in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// The last part.
    pub fn last(&self) -> Option<&KeyPart> {
        self.parts.last()
    }

    /// Append a part.
    pub fn push(&mut self, part: KeyPart) {
        self.parts.push(part);
    }
}

impl From<Vec<KeyPart>> for Key {
    fn from(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }
}

impl FromIterator<KeyPart> for Key {
    fn from_iter<T: IntoIterator<Item = KeyPart>>(iter: T) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_path_equal_ignores_kind() {
        let quoted = Key::new(vec![
            KeyPart::new("a", KeyKind::Quoted),
            KeyPart::new("b", KeyKind::Literal),
        ]);
        let bare = Key::join(["a", "b"]);
        assert!(quoted.path_equal(&bare));
        assert_ne!(quoted, bare);
        assert!(!bare.path_equal(&Key::join(["a"])));
    }

    #[test]
    fn test_infer_precedence() {
        let key = Key::infer(["plain-key_1", "with space", "it's"]);
        let kinds: Vec<_> = key.parts().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, [KeyKind::Bare, KeyKind::Literal, KeyKind::Quoted]);
        assert_eq!(KeyPart::infer("").kind, KeyKind::Literal);
    }

    #[test]
    fn test_is_valid() {
        assert!(KeyPart::bare("abc-DEF_09").is_valid());
        assert!(!KeyPart::bare("").is_valid());
        assert!(!KeyPart::bare("a.b").is_valid());
        assert!(KeyPart::new("tab\there", KeyKind::Literal).is_valid());
        assert!(!KeyPart::new("it's", KeyKind::Literal).is_valid());
        assert!(!KeyPart::new("line\nbreak", KeyKind::Literal).is_valid());
        assert!(KeyPart::new("it's \"fine\"", KeyKind::Quoted).is_valid());
        assert!(!KeyPart::new("line\nbreak", KeyKind::Quoted).is_valid());
    }

    #[test]
    fn test_display() {
        let key = Key::new(vec![
            KeyPart::bare("site"),
            KeyPart::new("google.com", KeyKind::Quoted),
            KeyPart::new("C:\\path", KeyKind::Literal),
            KeyPart::new("say \"hi\"\u{1}", KeyKind::Quoted),
        ]);
        insta::assert_snapshot!(key.to_string(), @r#"site."google.com".'C:\path'."say \"hi\"\u0001""#);
    }

    #[test]
    fn test_prefix_and_child() {
        let key = Key::join(["a", "b", "c"]);
        assert_eq!(key.prefix(2), Key::join(["a", "b"]));
        assert_eq!(key.prefix(9), key);
        assert_eq!(Key::join(["a", "b"]).child(KeyPart::bare("c")), key);
        assert!(key.starts_with(&Key::join(["a"])));
        assert!(key.starts_with(&Key::default()));
        assert!(!Key::join(["a"]).starts_with(&key));
        assert!(Key::single("x").is_single("x"));
        assert!(!key.is_single("a"));
    }
}
