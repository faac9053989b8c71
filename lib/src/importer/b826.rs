//! Parser for the Qualcomm 0xB826 log item (NR5G RRC Supported CA Combos).
//!
//! The log has gone through many revisions and none of them are documented;
//! the layouts here come from captures of versions 2, 3, 4, 6, 7, 8, 9, 10,
//! 13 and 14. Some bandwidth, MIMO and modulation values are guessed (see
//! [crate::tables] and [crate::mimo]).
//!
//! Both the bare log payload and the payload prefixed with its diag log
//! header (length, log code, timestamp) are accepted.

use std::cmp::Ordering;

use log::{debug, warn};

use crate::cursor::{ByteCursor, CursorError, extract, extract_bit, insert};
use crate::log_codes::LOG_NR5G_RRC_SUPPORTED_CA_COMBOS_C;
use crate::mimo::mimo_from_index;
use crate::model::{Capabilities, Combo, Component};
use crate::tables::{
    ComboSource, bw_class_from_index, max_bw_from_index, max_bw_from_index_v8,
    modulation_from_index, scs_from_index, source_label,
};

/// Length of the diag log header after the size field: log code plus timestamp
const LOG_HEADER_TIMESTAMP_LEN: usize = 8;

/// How an NR component's max bandwidth is stored before version 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreV8Bandwidth {
    /// 8 bits at offset 8, in units of 4 MHz
    Shifted,
    /// 5 bits at offset 6, looked up in [max_bw_from_index]
    Indexed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLayout {
    /// Byte aligned fields, 10 bytes per component
    PreV8 {
        scs_bias: u16,
        bandwidth: PreV8Bandwidth,
    },
    /// Bit packed fields, 8 bytes per component
    V8,
}

/// Everything that differs between revisions of the log, resolved once from
/// the version field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub version: u16,
    /// Whether the combo count is preceded by the series total and index,
    /// and followed by a source byte
    pub has_series_info: bool,
    pub combo_padding: usize,
    pub num_components_offset: u32,
    pub components_padding: usize,
    pub component: ComponentLayout,
}

impl Layout {
    pub fn for_version(version: u16) -> Self {
        let num_components_offset = match version {
            0..=2 => 0,
            3..=7 => 1,
            _ => 3,
        };
        let components_padding = match version {
            6 | 8 => 1,
            7 => 3,
            9..=13 => 9,
            14 => 25,
            _ => 0,
        };
        let component = if version >= 8 {
            ComponentLayout::V8
        } else {
            ComponentLayout::PreV8 {
                scs_bias: if version < 3 { 1 } else { 0 },
                bandwidth: if version >= 6 {
                    PreV8Bandwidth::Indexed
                } else {
                    PreV8Bandwidth::Shifted
                },
            }
        };
        Layout {
            version,
            has_series_info: version > 3,
            combo_padding: if version >= 8 { 3 } else { 0 },
            num_components_offset,
            components_padding,
            component,
        }
    }
}

/// Decodes a 0xB826 log. Combos are filed into EN-DC, NR-CA or NR-DC
/// depending on their components.
///
/// A log that ends early isn't an error: whatever combos were fully decoded
/// before the end are returned.
pub fn parse(input: &[u8]) -> Capabilities {
    let mut capabilities = Capabilities::new();
    let mut cursor = ByteCursor::new(input);
    if let Err(err) = parse_into(&mut cursor, &mut capabilities) {
        warn!(
            "0xB826 log truncated after {} combos: {err}",
            capabilities.num_combos()
        );
    }
    capabilities
}

/// Decodes several 0xB826 logs (usually one series split across logs) into
/// a single result. Metadata comes from the first log that has each key,
/// except `numCombos` which counts every combo decoded.
pub fn parse_multiple<'a, I>(inputs: I) -> Capabilities
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut merged = Capabilities::new();
    for input in inputs {
        merged.merge(parse(input));
    }
    merged.set_metadata("numCombos", merged.num_combos());
    merged
}

fn parse_into(
    cursor: &mut ByteCursor,
    capabilities: &mut Capabilities,
) -> Result<(), CursorError> {
    let log_size = read_log_size(cursor, capabilities)?;
    capabilities.set_metadata("logSize", log_size);
    debug!("log size: {log_size} bytes");

    let version = cursor.read_u16()?;
    capabilities.set_metadata("version", version);
    debug!("version: {version}");
    let layout = Layout::for_version(version);

    cursor.skip(2)?;

    let num_combos = read_num_combos(cursor, &layout, capabilities)?;
    capabilities.set_metadata("numCombos", num_combos);
    debug!("num combos: {num_combos}");

    let source = if layout.has_series_info {
        let index = cursor.read_u8()?;
        let label = source_label(index);
        debug!("source: {label}");
        capabilities.set_metadata("source", label);
        ComboSource::from_index(index)
    } else {
        None
    };

    for _ in 0..num_combos {
        let combo = parse_combo(cursor, &layout, source)?;
        capabilities.push_combo(combo);
    }
    Ok(())
}

/// If the input starts with its own length it carries a diag log header,
/// otherwise it's a bare payload and its size is the input's. A header whose
/// length runs past the end of the input is still recognised by its log
/// code, so a truncated log decodes like its bare payload would.
fn read_log_size(
    cursor: &mut ByteCursor,
    capabilities: &mut Capabilities,
) -> Result<usize, CursorError> {
    let declared = usize::from(cursor.read_u16()?);
    let has_header = match declared.cmp(&cursor.len()) {
        Ordering::Equal => true,
        Ordering::Greater => cursor
            .read_u16()
            .is_ok_and(|code| u32::from(code) == LOG_NR5G_RRC_SUPPORTED_CA_COMBOS_C),
        Ordering::Less => false,
    };
    cursor.rewind();
    if !has_header {
        return Ok(cursor.len());
    }

    cursor.skip(2)?;
    let log_item = cursor.read_u16()?;
    capabilities.set_metadata("logItem", format!("0x{log_item:X}"));
    debug!("log item: 0x{log_item:X}");
    cursor.skip(LOG_HEADER_TIMESTAMP_LEN)?;
    Ok(declared)
}

/// Versions up to 3 only give the number of combos in this log. Later ones
/// first give the total number of combos in the series and this log's index
/// within it.
fn read_num_combos(
    cursor: &mut ByteCursor,
    layout: &Layout,
    capabilities: &mut Capabilities,
) -> Result<u16, CursorError> {
    if !layout.has_series_info {
        return cursor.read_u16();
    }

    let total_combos = cursor.read_u16()?;
    capabilities.set_metadata("totalCombos", total_combos);
    let index = cursor.read_u16()?;
    capabilities.set_metadata("index", index);
    debug!("total combos: {total_combos}, index: {index}");
    cursor.read_u16()
}

fn parse_combo(
    cursor: &mut ByteCursor,
    layout: &Layout,
    source: Option<ComboSource>,
) -> Result<Combo, CursorError> {
    cursor.skip(layout.combo_padding)?;
    let num_components = extract(
        u32::from(cursor.read_u8()?),
        layout.num_components_offset,
        4,
    ) as usize;
    cursor.skip(layout.components_padding)?;

    let mut lte = Vec::with_capacity(num_components);
    let mut nr = Vec::with_capacity(num_components);
    for _ in 0..num_components {
        let component = match layout.component {
            ComponentLayout::PreV8 {
                scs_bias,
                bandwidth,
            } => parse_component_pre_v8(cursor, scs_bias, bandwidth)?,
            ComponentLayout::V8 => parse_component_v8(cursor)?,
        };
        match component {
            Component::Lte(component) => lte.push(component),
            Component::Nr(component) => nr.push(component),
        }
    }

    Ok(Combo::classify(lte, nr, source))
}

fn parse_component_pre_v8(
    cursor: &mut ByteCursor,
    scs_bias: u16,
    bandwidth: PreV8Bandwidth,
) -> Result<Component, CursorError> {
    let band = cursor.read_u16()?;
    let byte = u32::from(cursor.read_u8()?);
    let mut component = Component::new(band, extract_bit(byte, 0));
    component.set_class_dl(bw_class_from_index(extract(byte, 1, 8) as u8));
    component.set_mimo_dl(mimo_from_index(u32::from(cursor.read_u8()?)));

    let class_ul = bw_class_from_index(extract(u32::from(cursor.read_u8()?), 1, 8) as u8);
    component.set_class_ul(class_ul);
    component.set_mimo_ul(mimo_from_index(u32::from(cursor.read_u8()?)));

    let mod_ul = cursor.read_u8()?;
    if !class_ul.is_none() {
        component.set_mod_ul(modulation_from_index(mod_ul));
    }

    match &mut component {
        Component::Nr(nr) => {
            cursor.skip(1)?;
            let short = u32::from(cursor.read_u16()?);
            let scs_index = extract(short, 0, 4) as u16 + scs_bias;
            nr.scs = Some(scs_from_index(scs_index));
            nr.max_bandwidth = Some(match bandwidth {
                PreV8Bandwidth::Indexed => max_bw_from_index(extract(short, 6, 5) as u16),
                PreV8Bandwidth::Shifted => (extract(short, 8, 8) << 2) as u16,
            });
        }
        Component::Lte(_) => cursor.skip(3)?,
    }
    Ok(component)
}

/// From version 8 fields straddle byte boundaries:
///
/// ```text
/// u16   | 15: mimo dl lsb | 10-14: class dl | 9: nr | 0-8: band |
/// byte1 | 6-7: class ul lsbs | 0-5: mimo dl msbs |
/// byte2 | 3-7: mimo ul | 0-2: class ul msbs |
/// byte3 | 7: scs lsb | 1-2: modulation ul |
/// byte4 | 2-6: max bw | 0-1: scs msbs |          (NR only)
/// ```
fn parse_component_v8(cursor: &mut ByteCursor) -> Result<Component, CursorError> {
    let short = u32::from(cursor.read_u16()?);
    let band = extract(short, 0, 9) as u16;
    let mut component = Component::new(band, extract_bit(short, 9));
    component.set_class_dl(bw_class_from_index(extract(short, 10, 5) as u8));

    let byte1 = u32::from(cursor.read_u8()?);
    let mimo_dl = insert(extract(short, 15, 1), extract(byte1, 0, 6), 1);
    component.set_mimo_dl(mimo_from_index(mimo_dl));

    let byte2 = u32::from(cursor.read_u8()?);
    component.set_mimo_ul(mimo_from_index(extract(byte2, 3, 7)));
    let class_ul = insert(extract(byte1, 6, 2), extract(byte2, 0, 3), 2);
    let class_ul = bw_class_from_index(class_ul as u8);
    component.set_class_ul(class_ul);

    let byte3 = u32::from(cursor.read_u8()?);
    if !class_ul.is_none() {
        component.set_mod_ul(modulation_from_index(extract(byte3, 1, 2) as u8));
    }

    match &mut component {
        Component::Nr(nr) => {
            let byte4 = u32::from(cursor.read_u8()?);
            let scs_index = insert(extract(byte3, 7, 1), extract(byte4, 0, 2), 1);
            nr.scs = Some(scs_from_index(scs_index as u16));
            nr.max_bandwidth = Some(max_bw_from_index_v8(extract(byte4, 2, 5) as u16));
            cursor.skip(2)?;
        }
        Component::Lte(_) => cursor.skip(3)?,
    }
    Ok(component)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{BandComponent, BwClass, ModulationOrder};

    #[test]
    fn test_layouts() {
        let v2 = Layout::for_version(2);
        assert!(!v2.has_series_info);
        assert_eq!(v2.num_components_offset, 0);
        assert_eq!(
            v2.component,
            ComponentLayout::PreV8 {
                scs_bias: 1,
                bandwidth: PreV8Bandwidth::Shifted
            }
        );

        let v3 = Layout::for_version(3);
        assert!(!v3.has_series_info);
        assert_eq!(v3.num_components_offset, 1);

        let v6 = Layout::for_version(6);
        assert!(v6.has_series_info);
        assert_eq!(v6.components_padding, 1);
        assert_eq!(
            v6.component,
            ComponentLayout::PreV8 {
                scs_bias: 0,
                bandwidth: PreV8Bandwidth::Indexed
            }
        );

        assert_eq!(Layout::for_version(7).components_padding, 3);
        assert_eq!(Layout::for_version(7).combo_padding, 0);

        let v8 = Layout::for_version(8);
        assert_eq!(v8.combo_padding, 3);
        assert_eq!(v8.num_components_offset, 3);
        assert_eq!(v8.components_padding, 1);
        assert_eq!(v8.component, ComponentLayout::V8);

        for version in 9..=13 {
            assert_eq!(Layout::for_version(version).components_padding, 9);
        }
        assert_eq!(Layout::for_version(14).components_padding, 25);
        assert_eq!(Layout::for_version(15).components_padding, 0);
        assert_eq!(Layout::for_version(4).components_padding, 0);
    }

    #[test]
    fn test_v8_lte_component_bits() {
        // band 4, LTE, class A, mimo index 3 (lsb 1, msbs 1), class ul A,
        // mimo ul index 1, modulation ul index 2
        let data = [0x04, 0x84, 0x41, 0x08, 0x04, 0x00, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);
        let Component::Lte(lte) = parse_component_v8(&mut cursor).unwrap() else {
            panic!("expected an LTE component");
        };
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(lte.band, 4);
        assert_eq!(lte.class_dl, BwClass::from_letter('A').unwrap());
        assert_eq!(lte.mimo_dl.layers(), &[4]);
        assert_eq!(lte.class_ul, BwClass::from_letter('A').unwrap());
        assert_eq!(lte.mimo_ul.layers(), &[1]);
        assert_eq!(lte.mod_ul, ModulationOrder::Qam256);
    }

    #[test]
    fn test_v8_first_short_fields() {
        // 0x1804: band 4, bit 9 clear (LTE), class code 6
        let data = [0x04, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);
        let Component::Lte(lte) = parse_component_v8(&mut cursor).unwrap() else {
            panic!("expected an LTE component");
        };
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(lte.band(), 4);
        assert_eq!(lte.class_dl, BwClass::from_letter('F').unwrap());
    }

    #[test]
    fn test_v8_nr_component_bits() {
        // 0x1a04: band 4, bit 9 set (NR), class code 6
        let data = [0x04, 0x1a, 0x00, 0x00, 0x80, 0x2d, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);
        let Component::Nr(nr) = parse_component_v8(&mut cursor).unwrap() else {
            panic!("expected an NR component");
        };
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(nr.band(), 4);
        assert_eq!(nr.class_dl, BwClass::from_letter('F').unwrap());
        assert_eq!(nr.class_ul, BwClass::NONE);
        assert_eq!(nr.mod_ul, ModulationOrder::None);
        // scs index = (0x2d & 3) << 1 | 1 = 3
        assert_eq!(nr.scs, Some(60));
        // bw index = (0x2d >> 2) & 0x1f = 11
        assert_eq!(nr.max_bandwidth, Some(40));
    }

    #[test]
    fn test_truncated_component() {
        let data = [0x04, 0x1a, 0x00, 0x00, 0x80, 0x2d, 0x00];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            parse_component_v8(&mut cursor),
            Err(CursorError::Underflow { needed: 2, .. })
        ));
    }
}
