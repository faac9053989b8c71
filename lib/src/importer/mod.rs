//! Importers turn a vendor's capability log into a [crate::model::Capabilities].
//! They never fail outright: malformed or truncated input yields whatever
//! could be decoded, and the problem is logged.

pub mod b826;
pub mod mtk_lte;
