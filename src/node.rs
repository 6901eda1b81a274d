/*!
# Node Representation

Citation records identify publications by a zero-padded 9-digit key (`"000012345"`).
We map this key bijectively onto `Node = u32` so that every per-node attribute can live in a dense
array indexed by the node itself, avoiding maps and per-node allocations entirely.

Positions are stored as two `f32` per node. The value `(0, 0)` is reserved as the
[`Position::UNPLACED`] sentinel: every real coordinate has a seed offset added when it enters the
system, so no laid-out node ever sits exactly at the origin.
*/

use std::fmt;

/// Nodes are the numeric value of a 9-digit record key
pub type Node = u32;

/// Number of nodes / capacity of a dense per-node array
pub type NumNodes = Node;

/// Number of ASCII digits in an external key
pub const KEY_DIGITS: usize = 9;

/// Default capacity of dense per-node arrays (covers the full Web of Science id range in use)
pub const DEFAULT_CAPACITY: NumNodes = 150_000_000;

/// Decodes a key of exactly [`KEY_DIGITS`] ASCII digits into its node.
///
/// Returns `None` if `key` has the wrong length or contains a non-digit.
///
/// # Examples
/// ```
/// use citemap::node::*;
///
/// assert_eq!(parse_key("000012345"), Some(12345));
/// assert_eq!(parse_key("12345"), None);
/// assert_eq!(parse_key("00001234x"), None);
/// ```
pub fn parse_key(key: &str) -> Option<Node> {
    let bytes = key.as_bytes();
    if bytes.len() != KEY_DIGITS || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(decode_key_digits(bytes))
}

/// Decodes [`KEY_DIGITS`] bytes that are already known to be ASCII digits.
///
/// `999_999_999 < u32::MAX`, so this can never overflow.
#[inline(always)]
pub(crate) fn decode_key_digits(digits: &[u8]) -> Node {
    debug_assert_eq!(digits.len(), KEY_DIGITS);
    digits
        .iter()
        .fold(0, |acc, &d| acc * 10 + (d - b'0') as Node)
}

/// Formats a node as its zero-padded external key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key(pub Node);

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = KEY_DIGITS)
    }
}

/// A 2-D layout coordinate.
///
/// `Position::UNPLACED` (`(0, 0)`) marks a node without a coordinate. It is never a valid
/// placement; see the module documentation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Sentinel for "no coordinate yet"
    pub const UNPLACED: Position = Position { x: 0.0, y: 0.0 };

    /// Creates a new position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns *true* if this is a real coordinate and not the sentinel
    #[inline(always)]
    pub fn is_placed(&self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }

    /// Squared euclidean distance to the point `(x, y)`
    #[inline(always)]
    pub fn squared_distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x as f64 - x;
        let dy = self.y as f64 - y;
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_roundtrip() {
        for node in [0, 1, 12345, DEFAULT_CAPACITY - 1, 999_999_999] {
            let key = Key(node).to_string();
            assert_eq!(key.len(), KEY_DIGITS);
            assert_eq!(parse_key(&key), Some(node));
        }
    }

    #[test]
    fn invalid_keys() {
        for key in ["", "12345678", "1234567890", "12345678a", " 12345678", "-12345678"] {
            assert_eq!(parse_key(key), None, "{key:?}");
        }
    }

    #[test]
    fn sentinel() {
        assert!(!Position::UNPLACED.is_placed());
        assert!(!Position::default().is_placed());
        assert!(Position::new(0.0, 1.0).is_placed());
        assert!(Position::new(-3.0, 0.0).is_placed());
    }
}
