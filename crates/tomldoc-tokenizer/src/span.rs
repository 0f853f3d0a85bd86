//! Byte ranges into TOML source text.

/// A span representing a range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Span {
    /// Byte offset of the start (inclusive)
    pub start: u32,
    /// Byte offset of the end (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn extend(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shift a span that is relative to some text so that it becomes relative
    /// to the text's enclosing source, given where that text starts.
    #[inline]
    pub fn offset_by(&self, base: u32) -> Span {
        Span {
            start: self.start + base,
            end: self.end + base,
        }
    }

    /// Sub-span given as byte offsets relative to `self.start`.
    ///
    /// The result is clamped to `self`.
    #[inline]
    pub fn sub(&self, from: usize, to: usize) -> Span {
        let start = (self.start + from as u32).min(self.end);
        let end = (self.start + to as u32).clamp(start, self.end);
        Span { start, end }
    }

    /// Get the source text for this span.
    #[inline]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start as usize..self.end as usize]
    }
}

impl From<std::ops::Range<u32>> for Span {
    fn from(range: std::ops::Range<u32>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start as usize..span.end as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_sub_is_clamped() {
        let span = Span::new(10, 20);
        assert_eq!(span.sub(2, 4), Span::new(12, 14));
        assert_eq!(span.sub(8, 40), Span::new(18, 20));
        assert_eq!(span.sub(30, 40), Span::new(20, 20));
    }

    #[test]
    fn test_offset_by() {
        assert_eq!(Span::new(0, 3).offset_by(7), Span::new(7, 10));
    }
}
