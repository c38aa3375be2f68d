use std::fmt::Display;

use serde::Serialize;

/// Number of flags the controller reports in its status word.
pub const STATUS_BIT_COUNT: u8 = 16;

/// Raw status word reported by the pump controller. Each set bit is one
/// active operational condition.
///
/// ```
/// use edwards_next_control::models::status_bits::StatusBits;
/// let bits = StatusBits::from_bits(&[2, 4]);
/// assert!(bits.contains(2));
/// assert_eq!(bits.iter().collect::<Vec<_>>(), vec![2, 4]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StatusBits(u16);

impl StatusBits {
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Build a status word from a list of bit indices.
    /// Indices outside of the 16 bit word are ignored.
    pub fn from_bits(bits: &[u8]) -> Self {
        let raw = bits
            .iter()
            .filter(|bit| **bit < STATUS_BIT_COUNT)
            .fold(0u16, |acc, bit| acc | (1 << bit));
        Self(raw)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, bit: u8) -> bool {
        bit < STATUS_BIT_COUNT && self.0 & (1 << bit) != 0
    }

    /// Iterate the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..STATUS_BIT_COUNT).filter(|bit| self.contains(*bit))
    }
}

impl From<u16> for StatusBits {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl Display for StatusBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<StatusBits: {:#06x}>", self.0)
    }
}
