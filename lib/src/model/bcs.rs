//! Band Combination Sets: which bandwidth combinations of a band set are
//! supported, carried as a bitmask of arbitrary width.

use bitvec::prelude::*;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

const ALL_BCS_WIDTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Bcs {
    #[default]
    Empty,
    Single(u32),
    Multi(Vec<u32>),
    All,
}

impl Bcs {
    /// Decodes a bitmask given most significant bit first (i.e. in the order
    /// its binary string would be written). Bit 0 is the least significant.
    pub fn from_bits(bits: &BitSlice<u8, Msb0>) -> Self {
        let Some(first_one) = bits.first_one() else {
            return Bcs::Empty;
        };
        let significant = &bits[first_one..];
        let width = significant.len();
        let mut indices: Vec<u32> = significant
            .iter_ones()
            .map(|i| (width - 1 - i) as u32)
            .collect();
        indices.reverse();

        match indices.len() {
            1 => Bcs::Single(indices[0]),
            n if width == ALL_BCS_WIDTH && n == ALL_BCS_WIDTH => Bcs::All,
            _ => Bcs::Multi(indices),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Bcs::Empty
    }

    pub fn indices(&self) -> Vec<u32> {
        match self {
            Bcs::Empty => Vec::new(),
            Bcs::Single(index) => vec![*index],
            Bcs::Multi(indices) => indices.clone(),
            Bcs::All => (0..ALL_BCS_WIDTH as u32).collect(),
        }
    }
}

impl Serialize for Bcs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bcs::All => serializer.serialize_str("all"),
            other => {
                let indices = other.indices();
                let mut seq = serializer.serialize_seq(Some(indices.len()))?;
                for index in &indices {
                    seq.serialize_element(index)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bits_of(binary: &str) -> BitVec<u8, Msb0> {
        binary.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(Bcs::from_bits(&bits_of("")), Bcs::Empty);
        assert_eq!(Bcs::from_bits(&bits_of("0000")), Bcs::Empty);
        assert_eq!(Bcs::from_bits(&bits_of("1")), Bcs::Single(0));
        assert_eq!(Bcs::from_bits(&bits_of("0100")), Bcs::Single(2));
        assert_eq!(Bcs::from_bits(&bits_of("1011")), Bcs::Multi(vec![0, 1, 3]));
        assert_eq!(Bcs::from_bits(&bits_of(&"1".repeat(32))), Bcs::All);
        assert_eq!(
            Bcs::from_bits(&bits_of(&"1".repeat(8))),
            Bcs::Multi((0..8).collect())
        );
    }

    #[test]
    fn test_leading_zeros_do_not_matter() {
        let padded = format!("{}{}", "0".repeat(40), "1".repeat(32));
        assert_eq!(Bcs::from_bits(&bits_of(&padded)), Bcs::All);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&Bcs::Single(3)).unwrap(), "[3]");
        assert_eq!(serde_json::to_string(&Bcs::Multi(vec![0, 2])).unwrap(), "[0,2]");
        assert_eq!(serde_json::to_string(&Bcs::All).unwrap(), "\"all\"");
    }
}
