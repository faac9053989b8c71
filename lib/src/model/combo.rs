use std::fmt;

use serde::Serialize;

use super::Bcs;
use super::component::{BandComponent, ComponentLte, ComponentNr, sort_descending};
use crate::tables::ComboSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboCategory {
    Lte,
    EnDc,
    NrCa,
    NrDc,
}

impl fmt::Display for ComboCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComboCategory::Lte => "LTE-only",
            ComboCategory::EnDc => "EN-DC",
            ComboCategory::NrCa => "NR-CA",
            ComboCategory::NrDc => "NR-DC",
        };
        f.write_str(label)
    }
}

fn join_compact<C: BandComponent>(components: &[C]) -> String {
    components
        .iter()
        .map(BandComponent::to_compact_str)
        .collect::<Vec<_>>()
        .join("-")
}

fn with_feature_set(compact: String, feature_set: Option<u32>) -> String {
    match feature_set {
        Some(feature_set) => format!("{compact}-{feature_set}"),
        None => compact,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboLte {
    pub components: Vec<ComponentLte>,
    #[serde(skip_serializing_if = "Bcs::is_empty")]
    pub bcs: Bcs,
}

impl ComboLte {
    pub fn new(mut components: Vec<ComponentLte>, bcs: Bcs) -> Self {
        sort_descending(&mut components);
        ComboLte { components, bcs }
    }

    pub fn to_compact_str(&self) -> String {
        join_compact(&self.components)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboEnDc {
    pub components_lte: Vec<ComponentLte>,
    pub components_nr: Vec<ComponentNr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_set: Option<u32>,
    #[serde(skip_serializing_if = "Bcs::is_empty")]
    pub bcs: Bcs,
}

impl ComboEnDc {
    pub fn new(mut components_lte: Vec<ComponentLte>, mut components_nr: Vec<ComponentNr>) -> Self {
        sort_descending(&mut components_lte);
        sort_descending(&mut components_nr);
        ComboEnDc {
            components_lte,
            components_nr,
            feature_set: None,
            bcs: Bcs::Empty,
        }
    }

    pub fn to_compact_str(&self) -> String {
        let compact = format!(
            "{}_{}",
            join_compact(&self.components_lte),
            join_compact(&self.components_nr)
        );
        with_feature_set(compact, self.feature_set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboNr {
    pub components: Vec<ComponentNr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_set: Option<u32>,
    #[serde(skip_serializing_if = "Bcs::is_empty")]
    pub bcs: Bcs,
}

impl ComboNr {
    pub fn new(mut components: Vec<ComponentNr>) -> Self {
        sort_descending(&mut components);
        ComboNr {
            components,
            feature_set: None,
            bcs: Bcs::Empty,
        }
    }

    pub fn to_compact_str(&self) -> String {
        with_feature_set(join_compact(&self.components), self.feature_set)
    }
}

/// NR dual connectivity, typically an FR1 group anchoring an FR2 group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboNrDc {
    pub components_primary: Vec<ComponentNr>,
    pub components_secondary: Vec<ComponentNr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_set: Option<u32>,
    #[serde(skip_serializing_if = "Bcs::is_empty")]
    pub bcs: Bcs,
}

impl ComboNrDc {
    pub fn new(
        mut components_primary: Vec<ComponentNr>,
        mut components_secondary: Vec<ComponentNr>,
    ) -> Self {
        sort_descending(&mut components_primary);
        sort_descending(&mut components_secondary);
        ComboNrDc {
            components_primary,
            components_secondary,
            feature_set: None,
            bcs: Bcs::Empty,
        }
    }

    pub fn to_compact_str(&self) -> String {
        let compact = format!(
            "{}_{}",
            join_compact(&self.components_primary),
            join_compact(&self.components_secondary)
        );
        with_feature_set(compact, self.feature_set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combo {
    Lte(ComboLte),
    EnDc(ComboEnDc),
    Nr(ComboNr),
    NrDc(ComboNrDc),
}

impl Combo {
    pub fn category(&self) -> ComboCategory {
        match self {
            Combo::Lte(_) => ComboCategory::Lte,
            Combo::EnDc(_) => ComboCategory::EnDc,
            Combo::Nr(_) => ComboCategory::NrCa,
            Combo::NrDc(_) => ComboCategory::NrDc,
        }
    }

    pub fn to_compact_str(&self) -> String {
        match self {
            Combo::Lte(combo) => combo.to_compact_str(),
            Combo::EnDc(combo) => combo.to_compact_str(),
            Combo::Nr(combo) => combo.to_compact_str(),
            Combo::NrDc(combo) => combo.to_compact_str(),
        }
    }

    /// Files the components of one decoded combo into a category. Some log
    /// revisions never say whether an all-NR combo is NR-CA or NR-DC, so
    /// unless the source says NR-CA explicitly, a combo mixing FR1 and FR2
    /// carriers is taken to be NR-DC anchored on FR1.
    pub fn classify(
        lte: Vec<ComponentLte>,
        nr: Vec<ComponentNr>,
        source: Option<ComboSource>,
    ) -> Combo {
        if !lte.is_empty() {
            return Combo::EnDc(ComboEnDc::new(lte, nr));
        }
        if source == Some(ComboSource::RfNrCa) {
            return Combo::Nr(ComboNr::new(nr));
        }

        let (fr2, mut fr1): (Vec<ComponentNr>, Vec<ComponentNr>) =
            nr.into_iter().partition(ComponentNr::is_fr2);
        if !fr1.is_empty() && !fr2.is_empty() {
            Combo::NrDc(ComboNrDc::new(fr1, fr2))
        } else {
            fr1.extend(fr2);
            Combo::Nr(ComboNr::new(fr1))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{BwClass, Mimo};

    fn nr(band: u16) -> ComponentNr {
        ComponentNr {
            band,
            class_dl: BwClass::from_letter('A').unwrap(),
            mimo_dl: Mimo::single(2),
            ..Default::default()
        }
    }

    fn lte(band: u16) -> ComponentLte {
        ComponentLte {
            band,
            class_dl: BwClass::from_letter('A').unwrap(),
            mimo_dl: Mimo::single(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_lte_makes_en_dc_even_without_nr() {
        let combo = Combo::classify(vec![lte(3)], vec![], Some(ComboSource::RfNrDc));
        assert_eq!(combo.category(), ComboCategory::EnDc);
        assert_eq!(combo.to_compact_str(), "3A4_");
    }

    #[test]
    fn test_fr1_fr2_mix_makes_nr_dc() {
        let combo = Combo::classify(vec![], vec![nr(260), nr(77), nr(261), nr(5)], None);
        let Combo::NrDc(nr_dc) = combo else {
            panic!("expected NR-DC, got {combo:?}");
        };
        let primary: Vec<u16> = nr_dc.components_primary.iter().map(|c| c.band).collect();
        let secondary: Vec<u16> = nr_dc.components_secondary.iter().map(|c| c.band).collect();
        assert_eq!(primary, vec![77, 5]);
        assert_eq!(secondary, vec![261, 260]);
        assert_eq!(nr_dc.to_compact_str(), "n77A2-n5A2_n261A2-n260A2");
    }

    #[test]
    fn test_nrca_source_keeps_single_group() {
        let combo = Combo::classify(vec![], vec![nr(260), nr(77)], Some(ComboSource::RfNrCa));
        let Combo::Nr(nr_ca) = combo else {
            panic!("expected NR-CA, got {combo:?}");
        };
        let bands: Vec<u16> = nr_ca.components.iter().map(|c| c.band).collect();
        assert_eq!(bands, vec![260, 77]);
    }

    #[test]
    fn test_single_frequency_range_is_nr_ca() {
        let fr1_only = Combo::classify(vec![], vec![nr(78), nr(1)], None);
        assert_eq!(fr1_only.category(), ComboCategory::NrCa);
        let fr2_only = Combo::classify(vec![], vec![nr(257), nr(260)], Some(ComboSource::Rf));
        assert_eq!(fr2_only.category(), ComboCategory::NrCa);
        assert_eq!(fr2_only.to_compact_str(), "n260A2-n257A2");
    }

    #[test]
    fn test_feature_set_in_compact_str() {
        let mut combo = ComboNr::new(vec![nr(78)]);
        combo.feature_set = Some(12);
        assert_eq!(combo.to_compact_str(), "n78A2-12");
        assert_eq!(ComboCategory::NrDc.to_string(), "NR-DC");
    }
}
