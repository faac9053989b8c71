//! Index lookup tables for the values vendors encode as small integers.
//!
//! None of these are documented anywhere we know of. They were worked out by
//! comparing logs against the UE capability information the same devices
//! sent over the air, so some entries are guesses. Every table passes an
//! unknown index through instead of failing.

use std::fmt;

use num_enum::TryFromPrimitive;

use crate::model::{BwClass, ModulationOrder};

/// Max channel bandwidth in MHz, 0xB826 versions before 8.
pub fn max_bw_from_index(index: u16) -> u16 {
    match index {
        4 => 5,
        5 => 10,
        6 => 15,
        7 => 20,
        8 => 25,
        9 => 30,
        10 => 40,
        11 | 15 => 50,
        12 => 60,
        13 => 80,
        14 | 20..=26 => 100,
        _ => index,
    }
}

/// Max channel bandwidth in MHz, 0xB826 version 8 onwards.
pub fn max_bw_from_index_v8(index: u16) -> u16 {
    match index {
        0 => 5,
        1 | 2 => 10,
        3 => 15,
        4 | 5 | 7 => 20,
        8 | 9 => 25,
        10 => 30,
        11 => 40,
        12 | 13 => 50,
        17 => 60,
        18 => 70,
        19 | 20 => 80,
        21..=31 => 100,
        _ => index,
    }
}

pub fn modulation_from_index(index: u8) -> ModulationOrder {
    match index {
        2 | 5 => ModulationOrder::Qam256,
        3 | 6 => ModulationOrder::Qam1024,
        _ => ModulationOrder::Qam64,
    }
}

/// Subcarrier spacing in kHz.
pub fn scs_from_index(index: u16) -> u16 {
    match index {
        1 => 15,
        2 => 30,
        3 => 60,
        4 => 120,
        _ => index,
    }
}

/// Qualcomm numbers bandwidth classes from 1 (`A`), 0 meaning no support.
pub fn bw_class_from_index(index: u8) -> BwClass {
    BwClass::from_code(index)
}

/// MTK numbers bandwidth classes from 0 (`A`) up to `F`; anything else
/// (including the 0xFF it uses for "no uplink") means no support.
pub fn bw_class_from_mtk_index(index: i64) -> BwClass {
    match index {
        0..=5 => BwClass::from_code(index as u8 + 1),
        _ => BwClass::NONE,
    }
}

/// Which list a 0xB826 log's combos were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ComboSource {
    Rf = 0,
    Pm = 1,
    RfEnDc = 3,
    RfNrCa = 4,
    RfNrDc = 5,
}

impl ComboSource {
    pub fn from_index(index: u8) -> Option<Self> {
        ComboSource::try_from(index).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComboSource::Rf => "RF",
            ComboSource::Pm => "PM",
            ComboSource::RfEnDc => "RF_ENDC",
            ComboSource::RfNrCa => "RF_NRCA",
            ComboSource::RfNrDc => "RF_NRDC",
        }
    }
}

impl fmt::Display for ComboSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for a source index, falling back to the index itself.
pub fn source_label(index: u8) -> String {
    match ComboSource::from_index(index) {
        Some(source) => source.to_string(),
        None => index.to_string(),
    }
}
