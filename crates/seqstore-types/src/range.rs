use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Half-open byte range `[start, end)` with `start < end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Create a range, rejecting empty or inverted bounds.
    pub fn new(start: u64, end: u64) -> Result<Self, TypeError> {
        if start >= end {
            return Err(TypeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always `false`; a valid range covers at least one byte.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest range covering both `self` and `other`, including any gap
    /// between them.
    pub fn envelope(&self, other: &ByteRange) -> ByteRange {
        ByteRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &ByteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if this range is exactly `[0, len)`.
    pub fn spans_whole(&self, len: u64) -> bool {
        self.start == 0 && self.end == len
    }

    /// The same-length range expressed relative to offset `base`.
    ///
    /// Used to locate a requested range inside a fragment that was fetched
    /// starting at `base`.
    pub fn relative_to(&self, base: u64) -> ByteRange {
        let start = self.start.saturating_sub(base);
        ByteRange {
            start,
            end: start + self.len(),
        }
    }

    /// Index range into content of length `len`, clamped to its bounds.
    pub fn clamp_to(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.start).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(self.end).unwrap_or(usize::MAX).min(len);
        start..end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.start, self.end)
    }
}

impl Serialize for ByteRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.start)?;
        tuple.serialize_element(&self.end)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for ByteRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(u64, u64)>::deserialize(deserializer)?;
        ByteRange::new(start, end).map_err(de::Error::custom)
    }
}

/// What part of a stored sequence is wanted: all of it, or one range.
///
/// Serialized as `true` for [`Span::Whole`] and `[start, end]` for
/// [`Span::Range`], the shape used by block range maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Span {
    Whole,
    Range(ByteRange),
}

impl Span {
    /// Build a ranged span, validating the bounds.
    pub fn range(start: u64, end: u64) -> Result<Self, TypeError> {
        ByteRange::new(start, end).map(Span::Range)
    }

    pub fn is_whole(&self) -> bool {
        matches!(self, Span::Whole)
    }

    pub fn as_range(&self) -> Option<&ByteRange> {
        match self {
            Span::Whole => None,
            Span::Range(r) => Some(r),
        }
    }

    /// Combine two spans over the same content.
    ///
    /// `Whole` absorbs everything; two ranges widen to their envelope. The
    /// operation is commutative and associative, so folding a batch of spans
    /// gives the same result in any order.
    pub fn merge(self, other: Span) -> Span {
        match (self, other) {
            (Span::Range(a), Span::Range(b)) => Span::Range(a.envelope(&b)),
            _ => Span::Whole,
        }
    }
}

impl From<ByteRange> for Span {
    fn from(range: ByteRange) -> Self {
        Span::Range(range)
    }
}

impl From<Option<ByteRange>> for Span {
    fn from(range: Option<ByteRange>) -> Self {
        range.map_or(Span::Whole, Span::Range)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Whole => write!(f, "whole"),
            Span::Range(r) => write!(f, "{r}"),
        }
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Span::Whole => serializer.serialize_bool(true),
            Span::Range(r) => r.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpanVisitor;

        impl<'de> Visitor<'de> for SpanVisitor {
            type Value = Span;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("`true` or a two-element [start, end] array")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Span, E> {
                if v {
                    Ok(Span::Whole)
                } else {
                    Err(E::invalid_value(de::Unexpected::Bool(false), &self))
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Span, A::Error> {
                let start: u64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let end: u64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Span::range(start, end).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(SpanVisitor)
    }
}
