use std::cmp::Ordering;

use serde::Serialize;

use super::{BwClass, Mimo, ModulationOrder};

pub type Band = u16;

/// NR bands from n257 upwards are mmWave.
const FIRST_FR2_BAND: Band = 257;

/// What every carrier exposes, whatever its RAT.
pub trait BandComponent {
    fn band(&self) -> Band;
    fn class_dl(&self) -> BwClass;
    fn class_ul(&self) -> BwClass;
    fn mimo_dl(&self) -> &Mimo;
    fn mimo_ul(&self) -> &Mimo;
    fn to_compact_str(&self) -> String;

    /// Ordering used to canonicalize combos: band, then DL class, UL class,
    /// DL MIMO and UL MIMO.
    fn canonical_cmp(&self, other: &Self) -> Ordering
    where
        Self: Sized,
    {
        self.band()
            .cmp(&other.band())
            .then_with(|| self.class_dl().cmp(&other.class_dl()))
            .then_with(|| self.class_ul().cmp(&other.class_ul()))
            .then_with(|| self.mimo_dl().cmp(other.mimo_dl()))
            .then_with(|| self.mimo_ul().cmp(other.mimo_ul()))
    }
}

/// Sorts a component group into its canonical (descending) order. The sort is
/// stable, so components equal under [BandComponent::canonical_cmp] keep
/// their decoded order.
pub fn sort_descending<C: BandComponent>(components: &mut [C]) {
    components.sort_by(|a, b| b.canonical_cmp(a));
}

fn compact_str<C: BandComponent>(prefix: &str, component: &C) -> String {
    let mut compact = format!(
        "{prefix}{}{}{}",
        component.band(),
        component.class_dl(),
        component.mimo_dl()
    );
    if !component.class_ul().is_none() {
        compact.push_str(&component.class_ul().to_string());
        let mimo_ul = component.mimo_ul();
        if !mimo_ul.is_empty() && mimo_ul.layers() != [1] {
            compact.push_str(&mimo_ul.to_string());
        }
    }
    compact
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLte {
    pub band: Band,
    pub class_dl: BwClass,
    #[serde(skip_serializing_if = "BwClass::is_none")]
    pub class_ul: BwClass,
    #[serde(skip_serializing_if = "Mimo::is_empty")]
    pub mimo_dl: Mimo,
    #[serde(skip_serializing_if = "Mimo::is_empty")]
    pub mimo_ul: Mimo,
    #[serde(skip_serializing_if = "ModulationOrder::is_none")]
    pub mod_dl: ModulationOrder,
    #[serde(skip_serializing_if = "ModulationOrder::is_none")]
    pub mod_ul: ModulationOrder,
}

impl ComponentLte {
    pub fn new(band: Band) -> Self {
        ComponentLte {
            band,
            ..Default::default()
        }
    }
}

impl BandComponent for ComponentLte {
    fn band(&self) -> Band {
        self.band
    }

    fn class_dl(&self) -> BwClass {
        self.class_dl
    }

    fn class_ul(&self) -> BwClass {
        self.class_ul
    }

    fn mimo_dl(&self) -> &Mimo {
        &self.mimo_dl
    }

    fn mimo_ul(&self) -> &Mimo {
        &self.mimo_ul
    }

    fn to_compact_str(&self) -> String {
        compact_str("", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNr {
    pub band: Band,
    pub class_dl: BwClass,
    #[serde(skip_serializing_if = "BwClass::is_none")]
    pub class_ul: BwClass,
    #[serde(skip_serializing_if = "Mimo::is_empty")]
    pub mimo_dl: Mimo,
    #[serde(skip_serializing_if = "Mimo::is_empty")]
    pub mimo_ul: Mimo,
    #[serde(skip_serializing_if = "ModulationOrder::is_none")]
    pub mod_dl: ModulationOrder,
    #[serde(skip_serializing_if = "ModulationOrder::is_none")]
    pub mod_ul: ModulationOrder,
    /// Subcarrier spacing in kHz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scs: Option<u16>,
    /// Max channel bandwidth in MHz
    #[serde(rename = "maxBw", skip_serializing_if = "Option::is_none")]
    pub max_bandwidth: Option<u16>,
}

impl ComponentNr {
    pub fn new(band: Band) -> Self {
        ComponentNr {
            band,
            ..Default::default()
        }
    }

    pub fn is_fr2(&self) -> bool {
        self.band >= FIRST_FR2_BAND
    }
}

impl BandComponent for ComponentNr {
    fn band(&self) -> Band {
        self.band
    }

    fn class_dl(&self) -> BwClass {
        self.class_dl
    }

    fn class_ul(&self) -> BwClass {
        self.class_ul
    }

    fn mimo_dl(&self) -> &Mimo {
        &self.mimo_dl
    }

    fn mimo_ul(&self) -> &Mimo {
        &self.mimo_ul
    }

    fn to_compact_str(&self) -> String {
        compact_str("n", self)
    }
}

/// A decoded carrier before it's been filed into a combo group. Importers
/// only learn the RAT from a flag bit partway through each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Lte(ComponentLte),
    Nr(ComponentNr),
}

impl Component {
    pub fn new(band: Band, is_nr: bool) -> Self {
        if is_nr {
            Component::Nr(ComponentNr::new(band))
        } else {
            Component::Lte(ComponentLte::new(band))
        }
    }

    pub fn is_nr(&self) -> bool {
        matches!(self, Component::Nr(_))
    }

    pub fn set_class_dl(&mut self, class: BwClass) {
        match self {
            Component::Lte(c) => c.class_dl = class,
            Component::Nr(c) => c.class_dl = class,
        }
    }

    pub fn set_class_ul(&mut self, class: BwClass) {
        match self {
            Component::Lte(c) => c.class_ul = class,
            Component::Nr(c) => c.class_ul = class,
        }
    }

    pub fn set_mimo_dl(&mut self, mimo: Mimo) {
        match self {
            Component::Lte(c) => c.mimo_dl = mimo,
            Component::Nr(c) => c.mimo_dl = mimo,
        }
    }

    pub fn set_mimo_ul(&mut self, mimo: Mimo) {
        match self {
            Component::Lte(c) => c.mimo_ul = mimo,
            Component::Nr(c) => c.mimo_ul = mimo,
        }
    }

    pub fn set_mod_ul(&mut self, modulation: ModulationOrder) {
        match self {
            Component::Lte(c) => c.mod_ul = modulation,
            Component::Nr(c) => c.mod_ul = modulation,
        }
    }
}

impl BandComponent for Component {
    fn band(&self) -> Band {
        match self {
            Component::Lte(c) => c.band(),
            Component::Nr(c) => c.band(),
        }
    }

    fn class_dl(&self) -> BwClass {
        match self {
            Component::Lte(c) => c.class_dl(),
            Component::Nr(c) => c.class_dl(),
        }
    }

    fn class_ul(&self) -> BwClass {
        match self {
            Component::Lte(c) => c.class_ul(),
            Component::Nr(c) => c.class_ul(),
        }
    }

    fn mimo_dl(&self) -> &Mimo {
        match self {
            Component::Lte(c) => c.mimo_dl(),
            Component::Nr(c) => c.mimo_dl(),
        }
    }

    fn mimo_ul(&self) -> &Mimo {
        match self {
            Component::Lte(c) => c.mimo_ul(),
            Component::Nr(c) => c.mimo_ul(),
        }
    }

    fn to_compact_str(&self) -> String {
        match self {
            Component::Lte(c) => c.to_compact_str(),
            Component::Nr(c) => c.to_compact_str(),
        }
    }
}
