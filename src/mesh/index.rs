//! Identifier types for mesh entities.
//!
//! Node, element and grain identifiers are the labels written in the input
//! deck, not dense array positions. They are kept as distinct wrapper types so
//! a node label can never be passed where an element label is expected.

use std::fmt::{self, Debug, Display};

/// A node label.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u64);

/// An element label (bulk, cohesive, or generated).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ElementId(u64);

/// A grain label (the integer suffix of the grain's element set name).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct GrainId(u32);

macro_rules! impl_label_type {
    ($name:ident, $raw:ty, $debug:literal) => {
        impl $name {
            /// Create an identifier from its label.
            #[inline]
            pub const fn new(label: $raw) -> Self {
                Self(label)
            }

            /// The label as written in the deck.
            #[inline]
            pub const fn get(self) -> $raw {
                self.0
            }

            /// The identifier following this one, or `None` past the largest
            /// label.
            #[inline]
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(label) => Some(Self(label)),
                    None => None,
                }
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $debug, self.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(v: $raw) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_label_type!(NodeId, u64, "N");
impl_label_type!(ElementId, u64, "E");
impl_label_type!(GrainId, u32, "G");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        let n = NodeId::new(42);
        assert_eq!(n.get(), 42);
        assert_eq!(n.next(), Some(NodeId::new(43)));

        let g: GrainId = 7u32.into();
        assert_eq!(g.get(), 7);
    }

    #[test]
    fn test_next_stops_at_largest_label() {
        assert_eq!(NodeId::new(u64::MAX).next(), None);
        assert_eq!(ElementId::new(u64::MAX - 1).next(), Some(ElementId::new(u64::MAX)));
        assert_eq!(GrainId::new(u32::MAX).next(), None);
    }

    #[test]
    fn test_debug_and_display() {
        assert_eq!(format!("{:?}", NodeId::new(5)), "N(5)");
        assert_eq!(format!("{:?}", ElementId::new(5)), "E(5)");
        assert_eq!(format!("{:?}", GrainId::new(5)), "G(5)");
        assert_eq!(NodeId::new(5).to_string(), "5");
    }

    #[test]
    fn test_ordering_follows_labels() {
        let mut ids = vec![ElementId::new(10), ElementId::new(2), ElementId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![ElementId::new(2), ElementId::new(7), ElementId::new(10)]);
    }
}
