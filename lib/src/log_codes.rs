//! Diag log codes for the capability logs we know how to decode.

// These are 5G-related log types.

/// NR5G RRC Supported CA Combos
pub const LOG_NR5G_RRC_SUPPORTED_CA_COMBOS_C: u32 = 0xb826;
