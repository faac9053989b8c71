//! Decoding of modem carrier aggregation combo logs into a vendor neutral
//! capability model.
//!
//! Qualcomm modems report their supported combos in the 0xB826 diag log,
//! either captured in a QMDL file or exported as a hex dump. MTK modems
//! report LTE combos in ELT text dumps.

pub mod cursor;
pub mod diag;
pub mod hdlc;
pub mod importer;
pub mod log_codes;
pub mod mimo;
pub mod model;
pub mod qmdl;
pub mod tables;
pub mod util;
