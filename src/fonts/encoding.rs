//! Glyph names, named encodings, ToUnicode CMaps and code splitting.

use std::collections::HashMap;

use adobe_cmap_parser::{ByteMapping, CIDRange, CodeRange};
use tracing::{debug, warn};

use crate::data::{GLYPH_NAMES, MAC_ROMAN_ENCODING, STANDARD_ENCODING, WIN_ANSI_ENCODING};
use crate::error::{DecodeError, Result};
use crate::fonts::dict::CharCode;
use crate::utils::utf16be_to_string;

pub(crate) type EncodingTable = [Option<&'static str>; 256];

/// Unicode for a PostScript glyph name.
///
/// Handles suffixed names (`a.sc`), ligature names joined by `_`, and the
/// `uniXXXX` / `uXXXX` forms.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    let base = match name.find('.') {
        Some(0) => return None,
        Some(i) => &name[..i],
        None => name,
    };
    if base.contains('_') {
        let parts: Option<Vec<String>> = base.split('_').map(single_name).collect();
        return parts.map(|p| p.concat()).filter(|s| !s.is_empty());
    }
    single_name(base)
}

fn single_name(name: &str) -> Option<String> {
    if let Ok(i) = GLYPH_NAMES.binary_search_by_key(&name, |&(n, _)| n) {
        return char::from_u32(GLYPH_NAMES[i].1 as u32).map(String::from);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let mut out = String::new();
            for chunk in hex.as_bytes().chunks(4) {
                let v = u32::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
                out.push(char::from_u32(v)?);
            }
            return Some(out);
        }
        return None;
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let v = u32::from_str_radix(hex, 16).ok()?;
            return char::from_u32(v).map(String::from);
        }
    }
    None
}

/// Looks up one of the named simple-font encodings.
pub(crate) fn named_encoding(name: &str) -> Option<&'static EncodingTable> {
    match name {
        "StandardEncoding" => Some(&STANDARD_ENCODING),
        "WinAnsiEncoding" => Some(&WIN_ANSI_ENCODING),
        "MacRomanEncoding" => Some(&MAC_ROMAN_ENCODING),
        "MacExpertEncoding" => {
            warn!("MacExpertEncoding is read as StandardEncoding");
            Some(&STANDARD_ENCODING)
        }
        _ => {
            debug!("unknown encoding name {}", name);
            None
        }
    }
}

/// Glyph names per code from a Type1 `FontFile` program's own encoding.
pub(crate) fn type1_builtin_encoding(program: &[u8]) -> Vec<(CharCode, String)> {
    match type1_encoding_parser::get_encoding_map(program) {
        Ok(map) => {
            let mut out: Vec<(CharCode, String)> = map
                .into_iter()
                .map(|(code, name)| (code as CharCode, String::from_utf8_lossy(&name).into_owned()))
                .collect();
            out.sort();
            out
        }
        Err(_) => {
            warn!("could not read the Type1 program's encoding");
            Vec::new()
        }
    }
}

/// Parses a ToUnicode CMap into code -> text.
///
/// Entries that are not valid UTF-16 (lone surrogates) or that map to NUL
/// are dropped.
pub(crate) fn parse_to_unicode(data: &[u8]) -> HashMap<CharCode, String> {
    let Ok(cmap) = adobe_cmap_parser::get_unicode_map(data) else {
        warn!("unparseable ToUnicode CMap");
        return HashMap::new();
    };
    let mut unicode = HashMap::new();
    for (code, bytes) in cmap {
        let text = if bytes.len() == 1 {
            Some(char::from(bytes[0]).to_string())
        } else {
            utf16be_to_string(&bytes)
        };
        match text {
            Some(s) if !s.is_empty() && !s.contains('\0') => {
                unicode.insert(code, s);
            }
            _ => debug!("dropping ToUnicode entry {} -> {:02x?}", code, bytes),
        }
    }
    unicode
}

/// Splits composite-font strings into codes and maps codes to CIDs.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeMap {
    codespace: Vec<(u8, u32, u32)>,
    cid: Vec<(u32, u32, u32)>,
}

impl CodeMap {
    /// Two-byte codes equal to their CIDs (`Identity-H` / `Identity-V`).
    pub fn identity() -> CodeMap {
        CodeMap {
            codespace: vec![(2, 0, 0xffff)],
            cid: vec![(0, 0xffff, 0)],
        }
    }

    /// A predefined CMap by name. Only the identity CMaps are built in.
    pub fn named(name: &str) -> CodeMap {
        if name != "Identity-H" && name != "Identity-V" {
            warn!("predefined CMap {} read as Identity-H", name);
        }
        CodeMap::identity()
    }

    pub fn parse(data: &[u8]) -> Result<CodeMap> {
        let mapping = adobe_cmap_parser::get_byte_mapping(data)
            .map_err(|_| DecodeError::MalformedFontDict("unparseable encoding CMap".into()))?;
        Ok(CodeMap::from_mapping(&mapping))
    }

    fn from_mapping(mapping: &ByteMapping) -> CodeMap {
        let codespace = mapping
            .codespace
            .iter()
            .map(|r: &CodeRange| (r.width as u8, r.start, r.end))
            .collect();
        let cid = mapping
            .cid
            .iter()
            .map(|r: &CIDRange| (r.src_code_lo, r.src_code_hi, r.dst_CID_lo))
            .collect();
        CodeMap { codespace, cid }
    }

    /// The next code at the start of `bytes` and how many bytes it spans.
    pub fn next_code(&self, bytes: &[u8]) -> Option<(CharCode, usize)> {
        let mut code: u32 = 0;
        for width in 1..=4u8 {
            code = (code << 8) | *bytes.get(width as usize - 1)? as u32;
            let hit = self
                .codespace
                .iter()
                .any(|&(w, lo, hi)| w == width && code >= lo && code <= hi);
            if hit {
                return Some((code, width as usize));
            }
        }
        None
    }

    pub fn cid(&self, code: CharCode) -> Option<u32> {
        self.cid
            .iter()
            .find(|&&(lo, hi, _)| code >= lo && code <= hi)
            .and_then(|&(lo, _, dst)| (code - lo).checked_add(dst))
    }
}
