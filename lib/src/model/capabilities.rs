use std::collections::BTreeMap;

use serde::Serialize;

use super::combo::{Combo, ComboEnDc, ComboLte, ComboNr, ComboNrDc};

/// The result of decoding one input: combos filed per category, plus
/// whatever header fields the importer came across along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    #[serde(rename = "lteca")]
    pub lte_combos: Vec<ComboLte>,
    #[serde(rename = "endc")]
    pub en_dc_combos: Vec<ComboEnDc>,
    #[serde(rename = "nrca")]
    pub nr_combos: Vec<ComboNr>,
    #[serde(rename = "nrdc")]
    pub nr_dc_combos: Vec<ComboNrDc>,
    pub metadata: BTreeMap<String, String>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&mut self, key: &str, value: impl ToString) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn get_int_metadata(&self, key: &str) -> Option<i64> {
        self.get_metadata(key)?.parse().ok()
    }

    pub fn push_combo(&mut self, combo: Combo) {
        match combo {
            Combo::Lte(combo) => self.lte_combos.push(combo),
            Combo::EnDc(combo) => self.en_dc_combos.push(combo),
            Combo::Nr(combo) => self.nr_combos.push(combo),
            Combo::NrDc(combo) => self.nr_dc_combos.push(combo),
        }
    }

    pub fn num_combos(&self) -> usize {
        self.lte_combos.len()
            + self.en_dc_combos.len()
            + self.nr_combos.len()
            + self.nr_dc_combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_combos() == 0
    }

    /// Appends `other`'s combos after ours. Metadata keys we already have
    /// are kept.
    pub fn merge(&mut self, other: Capabilities) {
        self.lte_combos.extend(other.lte_combos);
        self.en_dc_combos.extend(other.en_dc_combos);
        self.nr_combos.extend(other.nr_combos);
        self.nr_dc_combos.extend(other.nr_dc_combos);
        for (key, value) in other.metadata {
            self.metadata.entry(key).or_insert(value);
        }
    }
}
