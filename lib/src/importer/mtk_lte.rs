//! Parser for MTK's `MSG_ID_ERRC_RCM_UE_PRE_CA_COMB_INFO` and
//! `MSG_ID_ERRC_RCM_UE_CA_COMB_INFO`, as dumped in text form by ELT.
//!
//! `UE_PRE_CA_COMB_INFO` lists the LTE combos a device supports before any
//! filtering, `UE_CA_COMB_INFO` what's left after carrier policy and UE
//! capability enquiry filtering. A dump can contain several messages.

use bitvec::prelude::*;
use log::{debug, warn};
use thiserror::Error;

use crate::model::{Bcs, Capabilities, Combo, ComboLte, ComponentLte, Mimo};
use crate::tables::bw_class_from_mtk_index;

const MESSAGE_HEADERS: [&str; 2] = [
    "MSG_ID_ERRC_RCM_UE_PRE_CA_COMB_INFO",
    "MSG_ID_ERRC_RCM_UE_CA_COMB_INFO",
];
const COMBO_MARKER: &str = "band_comb[";
const BCS_ARRAY_MARKER: &str = "bandwidth_comb_set = Array";
const MIMO_ARRAY_MARKER: &str = "band_mimo = Array";
const MIMO_FOUR_LAYERS: &str = "ERRC_CAPA_CA_MIMO_CAPA_FOUR_LAYERS";
const MIMO_TWO_LAYERS: &str = "ERRC_CAPA_CA_MIMO_CAPA_TWO_LAYERS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtkError {
    #[error("Message ended early")]
    Exhausted,
    #[error("Malformed numeric literal in line {0:?}")]
    MalformedNumericLiteral(String),
}

/// Parses a raw ELT text dump.
pub fn parse(input: &[u8]) -> Capabilities {
    let text = String::from_utf8_lossy(input);
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines)
}

/// Parses a dump already split into lines. Every combo found is LTE-only.
///
/// A message containing a malformed number is dropped as a whole; the
/// messages around it are still parsed.
pub fn parse_lines(lines: &[&str]) -> Capabilities {
    let mut capabilities = Capabilities::new();
    for (i, message) in split_messages(lines).into_iter().enumerate() {
        match parse_message(message) {
            Ok(combos) => {
                debug!("message {i}: {} combos", combos.len());
                for combo in combos {
                    capabilities.push_combo(Combo::Lte(combo));
                }
            }
            Err(err) => warn!("skipping MTK message {i}: {err}"),
        }
    }
    capabilities
}

/// Splits at message header lines. A header only starts a new message once
/// the current one has some content, since ELT repeats the message name
/// within its own header block.
fn split_messages<'a, 'b>(lines: &'b [&'a str]) -> Vec<&'b [&'a str]> {
    let mut messages = Vec::new();
    let mut start = 0;
    let mut has_content = false;
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        if MESSAGE_HEADERS.iter().any(|header| line.contains(header)) {
            if has_content {
                messages.push(&lines[start..i]);
                start = i;
                has_content = false;
            }
        } else if line.starts_with(COMBO_MARKER) || line.starts_with(BCS_ARRAY_MARKER) {
            has_content = true;
        }
    }
    messages.push(&lines[start..]);
    messages
}

/// A forward-only view over a message's lines, mirroring how the dump has to
/// be read: scan for a marker, then consume the lines following it.
struct LineScanner<'a, 'b> {
    lines: &'b [&'a str],
    pos: usize,
}

impl<'a, 'b> LineScanner<'a, 'b> {
    fn new(lines: &'b [&'a str]) -> Self {
        LineScanner { lines, pos: 0 }
    }

    fn next_line(&mut self) -> Result<&'a str, MtkError> {
        let line = self.lines.get(self.pos).ok_or(MtkError::Exhausted)?;
        self.pos += 1;
        Ok(line.trim())
    }

    /// Consumes lines up to and including the first one matching
    /// `predicate`. Exhausts the scanner if none does.
    fn find<P: Fn(&str) -> bool>(&mut self, predicate: P) -> Option<&'a str> {
        while let Ok(line) = self.next_line() {
            if predicate(line) {
                return Some(line);
            }
        }
        None
    }
}

fn parse_message(lines: &[&str]) -> Result<Vec<ComboLte>, MtkError> {
    let mut bcs_list = parse_bcs_arrays(lines)?.into_iter();
    let mut scanner = LineScanner::new(lines);
    let mut combos = Vec::new();

    while scanner.find(|line| line.starts_with(COMBO_MARKER)).is_some() {
        // BCS entries are index aligned with band_comb entries, so a skipped
        // combo still uses up its own
        let bcs = bcs_list.next().unwrap_or_default();
        match parse_combo(&mut scanner) {
            Ok(Some(components)) => combos.push(ComboLte::new(components, bcs)),
            Ok(None) => continue,
            Err(MtkError::Exhausted) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(combos)
}

/// Collects every `bandwidth_comb_set` array in the message, in order.
fn parse_bcs_arrays(lines: &[&str]) -> Result<Vec<Bcs>, MtkError> {
    // usually 111 or 117 entries
    let mut bcs_list = Vec::with_capacity(117);
    let mut scanner = LineScanner::new(lines);
    while let Some(line) = scanner.find(|line| line.starts_with(BCS_ARRAY_MARKER)) {
        for _ in 0..extract_array_size(line) {
            let Ok(line) = scanner.next_line() else {
                return Ok(bcs_list);
            };
            bcs_list.push(Bcs::from_bits(&extract_big_hex(line)?));
        }
    }
    Ok(bcs_list)
}

/// Returns `None` for a combo with no components.
fn parse_combo(scanner: &mut LineScanner) -> Result<Option<Vec<ComponentLte>>, MtkError> {
    let num_ccs = extract_int(scanner.next_line()?)?;
    if num_ccs < 1 {
        return Ok(None);
    }

    let array_size = extract_array_size(scanner.next_line()?);
    let num_ccs = (num_ccs as usize).min(array_size);
    let mut components = parse_components(num_ccs, scanner)?;

    let Some(line) = scanner.find(|line| line.starts_with(MIMO_ARRAY_MARKER)) else {
        return Ok(None);
    };
    let num_mimo = components.len().min(extract_array_size(line));
    parse_mimo(num_mimo, scanner, &mut components)?;
    Ok(Some(components))
}

fn parse_components(
    num_ccs: usize,
    scanner: &mut LineScanner,
) -> Result<Vec<ComponentLte>, MtkError> {
    let mut components = Vec::with_capacity(num_ccs);
    for i in 0..num_ccs {
        let marker = format!("band_param[{i}]");
        scanner.find(|line| line.starts_with(&marker));

        let line = scanner.next_line()?;
        let band = u16::try_from(extract_int(line)?)
            .map_err(|_| MtkError::MalformedNumericLiteral(line.to_string()))?;
        let class_ul = bw_class_from_mtk_index(extract_int(scanner.next_line()?)?);
        let class_dl = bw_class_from_mtk_index(extract_int(scanner.next_line()?)?);

        // no uplink MIMO in these messages
        let mimo_ul = if class_ul.is_none() {
            Mimo::empty()
        } else {
            Mimo::single(1)
        };
        components.push(ComponentLte {
            band,
            class_dl,
            class_ul,
            mimo_ul,
            ..Default::default()
        });
    }
    Ok(components)
}

fn parse_mimo(
    num_ccs: usize,
    scanner: &mut LineScanner,
    components: &mut [ComponentLte],
) -> Result<(), MtkError> {
    for (i, component) in components.iter_mut().enumerate().take(num_ccs) {
        let marker = format!("band_mimo[{i}]");
        if scanner.find(|line| line.starts_with(&marker)).is_none() {
            break;
        }
        let value = extract_value(scanner.next_line()?);
        match value.split(' ').next() {
            Some(MIMO_FOUR_LAYERS) => component.mimo_dl = Mimo::single(4),
            Some(MIMO_TWO_LAYERS) => component.mimo_dl = Mimo::single(2),
            _ => {}
        }
    }
    Ok(())
}

/// The value of a `name = value` line.
fn extract_value(line: &str) -> &str {
    line.rsplit('=').next().unwrap_or(line).trim()
}

/// N in a `name = Array[N]` line, or 0 if there's none.
fn extract_array_size(line: &str) -> usize {
    let Some(start) = line.find("Array[") else {
        return 0;
    };
    let digits = &line[start + "Array[".len()..];
    let Some(end) = digits.find(']') else {
        return 0;
    };
    digits[..end].parse().unwrap_or(0)
}

fn extract_int(line: &str) -> Result<i64, MtkError> {
    decode_int(extract_value(line))
        .ok_or_else(|| MtkError::MalformedNumericLiteral(line.to_string()))
}

/// Parses an integer literal the way ELT writes them: decimal, `0x`/`#`
/// hexadecimal or `0` prefixed octal, optionally signed.
pub fn decode_int(literal: &str) -> Option<i64> {
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .or_else(|| unsigned.strip_prefix('#'))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// The bits of a `name = 0x...` line's value, most significant first.
fn extract_big_hex(line: &str) -> Result<BitVec<u8, Msb0>, MtkError> {
    let malformed = || MtkError::MalformedNumericLiteral(line.to_string());
    let digits = extract_value(line).get(2..).ok_or_else(malformed)?;
    if digits.is_empty() {
        return Err(malformed());
    }
    let bytes = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    }
    .map_err(|_| malformed())?;
    Ok(BitVec::from_vec(bytes))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_int() {
        assert_eq!(decode_int("42"), Some(42));
        assert_eq!(decode_int("0x1F"), Some(31));
        assert_eq!(decode_int("0X1f"), Some(31));
        assert_eq!(decode_int("#10"), Some(16));
        assert_eq!(decode_int("010"), Some(8));
        assert_eq!(decode_int("0"), Some(0));
        assert_eq!(decode_int("-7"), Some(-7));
        assert_eq!(decode_int("+7"), Some(7));
        assert_eq!(decode_int("0x"), None);
        assert_eq!(decode_int("09"), None);
        assert_eq!(decode_int("--1"), None);
        assert_eq!(decode_int("two"), None);
        assert_eq!(decode_int(""), None);
    }

    #[test]
    fn test_extract_helpers() {
        assert_eq!(extract_value("band = 3"), "3");
        assert_eq!(extract_value("  [0] = 0x1F "), "0x1F");
        assert_eq!(extract_array_size("band_param = Array[5]"), 5);
        assert_eq!(extract_array_size("bandwidth_comb_set = Array[117]"), 117);
        assert_eq!(extract_array_size("band_param = Array[]"), 0);
        assert_eq!(extract_array_size("band_num = 2"), 0);
        assert_eq!(extract_int("band_num = 0x02"), Ok(2));
        assert_eq!(
            extract_int("band_num = oops"),
            Err(MtkError::MalformedNumericLiteral("band_num = oops".to_string()))
        );
    }

    #[test]
    fn test_extract_big_hex() {
        let bits = extract_big_hex("[0] = 0x5").unwrap();
        assert_eq!(Bcs::from_bits(&bits), Bcs::Multi(vec![0, 2]));
        let bits = extract_big_hex("[1] = 0x100000000").unwrap();
        assert_eq!(Bcs::from_bits(&bits), Bcs::Single(32));
        assert!(extract_big_hex("[2] = 0x").is_err());
        assert!(extract_big_hex("[3] = 0xG1").is_err());
        assert!(extract_big_hex("[4] = 0x1G").is_err());
        let bits = extract_big_hex("[5] = 0xF0").unwrap();
        assert_eq!(bits.len(), 8);
        assert_eq!(Bcs::from_bits(&bits), Bcs::Multi(vec![4, 5, 6, 7]));
    }

    #[test]
    fn test_split_messages() {
        let lines = [
            "MSG_ID_ERRC_RCM_UE_CA_COMB_INFO",
            "msg_id = MSG_ID_ERRC_RCM_UE_CA_COMB_INFO",
            "band_comb[0]",
            "MSG_ID_ERRC_RCM_UE_PRE_CA_COMB_INFO",
            "bandwidth_comb_set = Array[0]",
        ];
        let messages = split_messages(&lines);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].len(), 3);
        assert_eq!(messages[1].len(), 2);

        let no_headers = ["band_comb[0]", "band_num = 0"];
        assert_eq!(split_messages(&no_headers).len(), 1);
    }

    #[test]
    fn test_scanner() {
        let lines = ["a = 1", "  b = 2  ", "c = 3"];
        let mut scanner = LineScanner::new(&lines);
        assert_eq!(scanner.find(|line| line.starts_with('b')), Some("b = 2"));
        assert_eq!(scanner.next_line(), Ok("c = 3"));
        assert_eq!(scanner.next_line(), Err(MtkError::Exhausted));
        assert_eq!(scanner.find(|_| true), None);
    }
}
