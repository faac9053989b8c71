//! The canonical capability model every importer decodes into.

use std::fmt;

use serde::{Serialize, Serializer};

pub mod bcs;
pub mod capabilities;
pub mod combo;
pub mod component;

pub use bcs::Bcs;
pub use capabilities::Capabilities;
pub use combo::{Combo, ComboCategory, ComboEnDc, ComboLte, ComboNr, ComboNrDc};
pub use component::{Band, BandComponent, Component, ComponentLte, ComponentNr};

/// A carrier aggregation bandwidth class. Code 0 is `NONE`, 1 is `A`, 2 is
/// `B` and so on. Codes past `Z` are kept as-is so nothing is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BwClass(u8);

impl BwClass {
    pub const NONE: BwClass = BwClass(0);

    pub fn from_code(code: u8) -> Self {
        BwClass(code)
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A'..='Z' => Some(BwClass(letter as u8 - b'A' + 1)),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BwClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => Ok(()),
            code @ 1..=26 => write!(f, "{}", (b'A' + code - 1) as char),
            code => write!(f, "{code}"),
        }
    }
}

impl Serialize for BwClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModulationOrder {
    #[default]
    None,
    Qam64,
    Qam256,
    Qam1024,
}

impl ModulationOrder {
    pub fn is_none(&self) -> bool {
        *self == ModulationOrder::None
    }
}

/// Layer counts per antenna port group, e.g. `[4, 2]`. Ordering compares the
/// whole sequence lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Mimo(Vec<u8>);

impl Mimo {
    pub fn empty() -> Self {
        Mimo(Vec::new())
    }

    pub fn single(layers: u8) -> Self {
        Mimo(vec![layers])
    }

    pub fn from_layers(layers: Vec<u8>) -> Self {
        Mimo(layers)
    }

    pub fn layers(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Mimo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layers) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{layers}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bw_class_display() {
        assert_eq!(BwClass::NONE.to_string(), "");
        assert_eq!(BwClass::from_code(1).to_string(), "A");
        assert_eq!(BwClass::from_code(3).to_string(), "C");
        assert_eq!(BwClass::from_code(26).to_string(), "Z");
        assert_eq!(BwClass::from_code(30).to_string(), "30");
        assert_eq!(BwClass::from_letter('B'), Some(BwClass::from_code(2)));
        assert_eq!(BwClass::from_letter('b'), None);
    }

    #[test]
    fn test_bw_class_order() {
        let a = BwClass::from_letter('A').unwrap();
        let c = BwClass::from_letter('C').unwrap();
        assert!(BwClass::NONE < a);
        assert!(a < c);
    }

    #[test]
    fn test_mimo_order_is_lexicographic() {
        assert!(Mimo::from_layers(vec![4, 2]) > Mimo::from_layers(vec![4]));
        assert!(Mimo::from_layers(vec![2, 2]) < Mimo::single(4));
        assert!(Mimo::from_layers(vec![1, 1, 1]) < Mimo::from_layers(vec![2, 1]));
        assert!(Mimo::empty() < Mimo::single(0));
        assert_eq!(Mimo::from_layers(vec![4, 2]).to_string(), "4,2");
    }
}
