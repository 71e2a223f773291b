//! Compact Font Format programs: FontFile3 `/Type1C` and `/CIDFontType0C`
//! streams and the `CFF ` table of OpenType fonts.

mod charstring;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bytes::{Reader, slice};
use crate::data::{CFF_STANDARD_STRINGS, STANDARD_ENCODING};
use crate::error::{DecodeError, Result};
use crate::path::{PathSink, TransformSink};

use charstring::Context;

const STANDARD_STRING_COUNT: u16 = 391;
const MAX_DICT_OPERANDS: usize = 48;

// Top DICT and Private DICT keys; two-byte operators are 1200 + second byte.
const CHARSET: u16 = 15;
const ENCODING: u16 = 16;
const CHARSTRINGS: u16 = 17;
const PRIVATE: u16 = 18;
const SUBRS: u16 = 19;
const DEFAULT_WIDTH_X: u16 = 20;
const NOMINAL_WIDTH_X: u16 = 21;
const CHARSTRING_TYPE: u16 = 1206;
const FONT_MATRIX: u16 = 1207;
const ROS: u16 = 1230;
const FD_ARRAY: u16 = 1236;
const FD_SELECT: u16 = 1237;

fn malformed(what: impl Into<String>) -> DecodeError {
    DecodeError::MalformedProgram(what.into())
}

/// A CFF INDEX: a counted list of variable-length objects.
#[derive(Debug, Clone, Default)]
pub(crate) struct Index<'a> {
    data: &'a [u8],
    offsets: Vec<usize>,
}

impl<'a> Index<'a> {
    /// Parses the INDEX starting at `pos`, returning it with the position
    /// just past its data.
    pub(crate) fn parse(data: &'a [u8], pos: usize) -> Result<(Index<'a>, usize)> {
        let truncated = |_| malformed("truncated INDEX");
        let mut r = Reader::at(data, pos).map_err(truncated)?;
        let count = r.read_u16().map_err(truncated)? as usize;
        if count == 0 {
            return Ok((Index::default(), r.pos()));
        }
        let off_size = r.read_u8().map_err(truncated)?;
        if !(1..=4).contains(&off_size) {
            return Err(malformed(format!("INDEX offset size {}", off_size)));
        }
        let mut offsets = Vec::with_capacity(count + 1);
        for _ in 0..=count {
            let offset = r.read_offset(off_size).map_err(truncated)? as usize;
            if offset == 0 {
                return Err(malformed("INDEX offset of zero"));
            }
            offsets.push(offset - 1);
        }
        if offsets[0] != 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(malformed("INDEX offsets out of order"));
        }
        let base = r.pos();
        let len = offsets[count];
        let objects = slice(data, base, len).ok_or_else(|| malformed("INDEX data past end"))?;
        Ok((
            Index {
                data: objects,
                offsets,
            },
            base + len,
        ))
    }

    pub(crate) fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub(crate) fn get(&self, i: usize) -> Option<&'a [u8]> {
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        self.data.get(start..end)
    }
}

type Dict = HashMap<u16, Vec<f64>>;

fn parse_dict(data: &[u8]) -> Result<Dict> {
    let truncated = |_| malformed("truncated DICT");
    let mut dict = Dict::new();
    let mut operands = Vec::new();
    let mut r = Reader::new(data);
    while !r.is_empty() {
        let b0 = r.read_u8().map_err(truncated)?;
        match b0 {
            0..=11 | 13..=21 => {
                dict.insert(b0 as u16, std::mem::take(&mut operands));
            }
            12 => {
                let b1 = r.read_u8().map_err(truncated)?;
                dict.insert(1200 + b1 as u16, std::mem::take(&mut operands));
            }
            28 => operands.push(r.read_i16().map_err(truncated)? as f64),
            29 => operands.push(r.read_i32().map_err(truncated)? as f64),
            30 => operands.push(parse_real(&mut r)?),
            32..=246 => operands.push(b0 as f64 - 139.),
            247..=250 => {
                let b1 = r.read_u8().map_err(truncated)?;
                operands.push((b0 as f64 - 247.) * 256. + b1 as f64 + 108.);
            }
            251..=254 => {
                let b1 = r.read_u8().map_err(truncated)?;
                operands.push(-(b0 as f64 - 251.) * 256. - b1 as f64 - 108.);
            }
            _ => return Err(malformed(format!("reserved DICT byte {}", b0))),
        }
        if operands.len() > MAX_DICT_OPERANDS {
            return Err(malformed("too many DICT operands"));
        }
    }
    Ok(dict)
}

fn parse_real(r: &mut Reader<'_>) -> Result<f64> {
    let mut s = String::new();
    loop {
        let byte = r
            .read_u8()
            .map_err(|_| malformed("truncated real number"))?;
        for nibble in [byte >> 4, byte & 0x0f] {
            match nibble {
                0..=9 => s.push((b'0' + nibble) as char),
                0xa => s.push('.'),
                0xb => s.push('E'),
                0xc => s.push_str("E-"),
                0xe => s.push('-'),
                0xf => {
                    return s
                        .parse()
                        .map_err(|_| malformed(format!("bad real number {:?}", s)));
                }
                _ => return Err(malformed("reserved nibble in real number")),
            }
        }
        if s.len() > 64 {
            return Err(malformed("unterminated real number"));
        }
    }
}

fn dict_num(dict: &Dict, key: u16) -> Option<f64> {
    dict.get(&key).and_then(|v| v.first()).copied()
}

fn dict_offset(dict: &Dict, key: u16) -> Option<usize> {
    dict_num(dict, key)
        .filter(|n| *n >= 0. && n.is_finite())
        .map(|n| n as usize)
}

#[derive(Debug, Clone, Default)]
struct PrivateDict<'a> {
    subrs: Index<'a>,
    default_width_x: f32,
    nominal_width_x: f32,
}

/// Reads the Private DICT named by a `[size offset]` entry. A missing entry
/// gives an empty private dictionary.
fn parse_private<'a>(data: &'a [u8], entry: Option<&Vec<f64>>) -> Result<PrivateDict<'a>> {
    let (size, offset) = match entry.map(Vec::as_slice) {
        Some(&[size, offset]) if size >= 0. && offset >= 0. => (size as usize, offset as usize),
        _ => return Ok(PrivateDict::default()),
    };
    let bytes = slice(data, offset, size).ok_or_else(|| malformed("Private DICT past end"))?;
    let dict = parse_dict(bytes)?;
    let subrs = match dict_offset(&dict, SUBRS) {
        Some(rel) => Index::parse(data, offset.saturating_add(rel))?.0,
        None => Index::default(),
    };
    Ok(PrivateDict {
        subrs,
        default_width_x: dict_num(&dict, DEFAULT_WIDTH_X).unwrap_or(0.) as f32,
        nominal_width_x: dict_num(&dict, NOMINAL_WIDTH_X).unwrap_or(0.) as f32,
    })
}

/// Maps glyph index to SID (name-keyed) or CID (CID-keyed).
fn parse_charset(data: &[u8], offset: usize, num_glyphs: usize, is_cid: bool) -> Result<Vec<u16>> {
    if offset <= 2 {
        if offset == 0 && !is_cid {
            // ISOAdobe: SIDs 0..=228 in order
            return Ok((0..num_glyphs)
                .map(|g| if g <= 228 { g as u16 } else { 0 })
                .collect());
        }
        debug!("predefined charset {} mapped as identity", offset);
        return Ok((0..num_glyphs).map(|g| g as u16).collect());
    }
    let truncated = |_| malformed("truncated charset");
    let mut r = Reader::at(data, offset).map_err(truncated)?;
    let format = r.read_u8().map_err(truncated)?;
    let mut charset = Vec::with_capacity(num_glyphs);
    charset.push(0);
    match format {
        0 => {
            while charset.len() < num_glyphs {
                charset.push(r.read_u16().map_err(truncated)?);
            }
        }
        1 | 2 => {
            while charset.len() < num_glyphs {
                let first = r.read_u16().map_err(truncated)?;
                let left = if format == 1 {
                    r.read_u8().map_err(truncated)? as u16
                } else {
                    r.read_u16().map_err(truncated)?
                };
                for i in 0..=left {
                    if charset.len() >= num_glyphs {
                        break;
                    }
                    charset.push(first.wrapping_add(i));
                }
            }
        }
        _ => return Err(malformed(format!("charset format {}", format))),
    }
    Ok(charset)
}

fn parse_fd_select(data: &[u8], offset: usize, num_glyphs: usize) -> Result<Vec<u8>> {
    let truncated = |_| malformed("truncated FDSelect");
    let mut r = Reader::at(data, offset).map_err(truncated)?;
    match r.read_u8().map_err(truncated)? {
        0 => Ok(r.read_bytes(num_glyphs).map_err(truncated)?.to_vec()),
        3 => {
            let mut fds = vec![0; num_glyphs];
            let ranges = r.read_u16().map_err(truncated)?;
            let mut first = r.read_u16().map_err(truncated)? as usize;
            for _ in 0..ranges {
                let fd = r.read_u8().map_err(truncated)?;
                let next = r.read_u16().map_err(truncated)? as usize;
                for slot in fds.iter_mut().take(next).skip(first) {
                    *slot = fd;
                }
                first = next;
            }
            Ok(fds)
        }
        format => Err(malformed(format!("FDSelect format {}", format))),
    }
}

/// A parsed CFF font ready to hand glyph programs to the interpreter.
#[derive(Debug)]
pub struct CffFont<'a> {
    name: String,
    global_subrs: Index<'a>,
    charstrings: Index<'a>,
    charset: Vec<u16>,
    by_name: HashMap<String, u16>,
    by_cid: HashMap<u16, u16>,
    encoding: Vec<Option<u16>>,
    names: Vec<Option<String>>,
    privates: Vec<PrivateDict<'a>>,
    fd_select: Vec<u8>,
    font_matrix: [f32; 6],
    is_cid: bool,
}

impl<'a> CffFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<CffFont<'a>> {
        let mut r = Reader::new(data);
        let truncated = |_| malformed("truncated CFF header");
        let major = r.read_u8().map_err(truncated)?;
        let _minor = r.read_u8().map_err(truncated)?;
        let header_size = r.read_u8().map_err(truncated)? as usize;
        if major != 1 {
            return Err(malformed(format!("CFF major version {}", major)));
        }

        let (names, pos) = Index::parse(data, header_size)?;
        let (top_dicts, pos) = Index::parse(data, pos)?;
        let (strings, pos) = Index::parse(data, pos)?;
        let (global_subrs, _) = Index::parse(data, pos)?;

        let name = names
            .get(0)
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let top = parse_dict(top_dicts.get(0).ok_or_else(|| malformed("no Top DICT"))?)?;

        if let Some(kind) = dict_num(&top, CHARSTRING_TYPE).filter(|t| *t != 2.) {
            return Err(malformed(format!("charstring type {}", kind)));
        }
        let charstrings_at =
            dict_offset(&top, CHARSTRINGS).ok_or_else(|| malformed("no CharStrings offset"))?;
        let (charstrings, _) = Index::parse(data, charstrings_at)?;
        let num_glyphs = charstrings.len();
        if num_glyphs == 0 {
            return Err(malformed("empty CharStrings INDEX"));
        }

        let is_cid = top.contains_key(&ROS);
        let charset = parse_charset(
            data,
            dict_offset(&top, CHARSET).unwrap_or(0),
            num_glyphs,
            is_cid,
        )?;

        let (privates, fd_select) = if is_cid {
            let fd_array_at =
                dict_offset(&top, FD_ARRAY).ok_or_else(|| malformed("CID font without FDArray"))?;
            let (fd_array, _) = Index::parse(data, fd_array_at)?;
            let mut privates = Vec::with_capacity(fd_array.len());
            for i in 0..fd_array.len() {
                let fd = parse_dict(fd_array.get(i).unwrap_or_default())?;
                privates.push(parse_private(data, fd.get(&PRIVATE))?);
            }
            let fd_select = match dict_offset(&top, FD_SELECT) {
                Some(at) => parse_fd_select(data, at, num_glyphs)?,
                None => vec![0; num_glyphs],
            };
            (privates, fd_select)
        } else {
            (vec![parse_private(data, top.get(&PRIVATE))?], Vec::new())
        };

        let mut font_matrix = [0.001, 0., 0., 0.001, 0., 0.];
        if let Some(m) = top.get(&FONT_MATRIX).filter(|m| m.len() == 6) {
            for (slot, v) in font_matrix.iter_mut().zip(m) {
                *slot = *v as f32;
            }
        }

        let mut font = CffFont {
            name,
            global_subrs,
            charstrings,
            charset,
            by_name: HashMap::new(),
            by_cid: HashMap::new(),
            encoding: vec![None; 256],
            names: Vec::new(),
            privates,
            fd_select,
            font_matrix,
            is_cid,
        };

        if is_cid {
            for (gid, &cid) in font.charset.iter().enumerate() {
                font.by_cid.entry(cid).or_insert(gid as u16);
            }
        } else {
            font.names = font
                .charset
                .iter()
                .map(|&sid| string_for_sid(&strings, sid))
                .collect();
            for (gid, name) in font.names.iter().enumerate() {
                if let Some(name) = name {
                    font.by_name.entry(name.clone()).or_insert(gid as u16);
                }
            }
            font.encoding = font.parse_encoding(data, dict_offset(&top, ENCODING).unwrap_or(0))?;
        }
        debug!(
            "parsed CFF font {:?}: {} glyphs, cid-keyed: {}",
            font.name, num_glyphs, is_cid
        );
        Ok(font)
    }

    fn parse_encoding(&self, data: &[u8], offset: usize) -> Result<Vec<Option<u16>>> {
        let mut encoding = vec![None; 256];
        match offset {
            0 => {
                for (code, name) in STANDARD_ENCODING.iter().enumerate() {
                    encoding[code] = name.and_then(|n| self.by_name.get(n).copied());
                }
                return Ok(encoding);
            }
            1 => {
                debug!("predefined Expert encoding is not mapped");
                return Ok(encoding);
            }
            _ => {}
        }
        let truncated = |_| malformed("truncated encoding");
        let mut r = Reader::at(data, offset).map_err(truncated)?;
        let format = r.read_u8().map_err(truncated)?;
        let num_glyphs = self.charset.len();
        match format & 0x7f {
            0 => {
                let count = r.read_u8().map_err(truncated)? as usize;
                for gid in 1..=count {
                    let code = r.read_u8().map_err(truncated)? as usize;
                    if gid < num_glyphs {
                        encoding[code] = Some(gid as u16);
                    }
                }
            }
            1 => {
                let ranges = r.read_u8().map_err(truncated)?;
                let mut gid = 1usize;
                for _ in 0..ranges {
                    let first = r.read_u8().map_err(truncated)? as usize;
                    let left = r.read_u8().map_err(truncated)? as usize;
                    for code in first..=first + left {
                        if code < 256 && gid < num_glyphs {
                            encoding[code] = Some(gid as u16);
                        }
                        gid += 1;
                    }
                }
            }
            f => return Err(malformed(format!("encoding format {}", f))),
        }
        if format & 0x80 != 0 {
            let supplements = r.read_u8().map_err(truncated)?;
            for _ in 0..supplements {
                let code = r.read_u8().map_err(truncated)? as usize;
                let sid = r.read_u16().map_err(truncated)?;
                if let Some(gid) = self.charset.iter().position(|&s| s == sid) {
                    encoding[code] = Some(gid as u16);
                }
            }
        }
        Ok(encoding)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_glyphs(&self) -> usize {
        self.charstrings.len()
    }

    pub fn is_cid(&self) -> bool {
        self.is_cid
    }

    /// Font units per em derived from the FontMatrix.
    pub fn units_per_em(&self) -> f32 {
        let a = self.font_matrix[0];
        if a.is_finite() && a > 0. { (1. / a).round() } else { 1000. }
    }

    pub fn glyph_name(&self, gid: u16) -> Option<&str> {
        self.names.get(gid as usize)?.as_deref()
    }

    pub(crate) fn gid_for_name(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Glyph for a CID. Name-keyed programs inside CID fonts are indexed by
    /// CID directly.
    pub(crate) fn gid_for_cid(&self, cid: u32) -> Option<u16> {
        let cid = u16::try_from(cid).ok()?;
        if self.is_cid {
            self.by_cid.get(&cid).copied()
        } else {
            ((cid as usize) < self.num_glyphs()).then_some(cid)
        }
    }

    /// Glyph for a code through the program's built-in encoding.
    pub(crate) fn gid_for_code(&self, code: u8) -> Option<u16> {
        self.encoding[code as usize]
    }

    /// The built-in encoding as (code, glyph name) pairs.
    pub(crate) fn builtin_encoding(&self) -> Vec<(u32, String)> {
        self.encoding
            .iter()
            .enumerate()
            .filter_map(|(code, gid)| {
                let name = self.glyph_name((*gid)?)?;
                Some((code as u32, name.to_string()))
            })
            .collect()
    }

    /// Draws glyph `gid` into `sink` in font units and returns its advance.
    pub fn outline(&self, gid: u16, sink: &mut dyn PathSink) -> Result<f32> {
        self.outline_at(gid, sink, true)
    }

    fn outline_at(&self, gid: u16, sink: &mut dyn PathSink, allow_accent: bool) -> Result<f32> {
        let glyph = gid as u32;
        let program = self
            .charstrings
            .get(gid as usize)
            .ok_or_else(|| DecodeError::glyph(glyph, "glyph index out of range"))?;
        let private = self
            .private_for(gid)
            .ok_or_else(|| DecodeError::glyph(glyph, "no private dictionary"))?;
        let ctx = Context {
            global_subrs: &self.global_subrs,
            local_subrs: &private.subrs,
            default_width_x: private.default_width_x,
            nominal_width_x: private.nominal_width_x,
        };
        let outcome =
            charstring::execute(program, &ctx, sink).map_err(|e| DecodeError::glyph(glyph, e))?;
        if let Some(seac) = outcome.seac {
            if !allow_accent {
                return Err(DecodeError::glyph(glyph, "nested accented glyph"));
            }
            let base = self
                .standard_gid(seac.base)
                .ok_or_else(|| DecodeError::glyph(glyph, "accent base not in font"))?;
            let accent = self
                .standard_gid(seac.accent)
                .ok_or_else(|| DecodeError::glyph(glyph, "accent not in font"))?;
            trace!("glyph {} composes {} + {}", gid, base, accent);
            self.outline_at(base, sink, false)?;
            let mut shifted = TransformSink::offset(sink, seac.adx, seac.ady);
            self.outline_at(accent, &mut shifted, false)?;
        }
        Ok(outcome.advance)
    }

    fn private_for(&self, gid: u16) -> Option<&PrivateDict<'a>> {
        if self.is_cid {
            let fd = *self.fd_select.get(gid as usize)?;
            self.privates.get(fd as usize)
        } else {
            self.privates.first()
        }
    }

    fn standard_gid(&self, code: u8) -> Option<u16> {
        STANDARD_ENCODING[code as usize].and_then(|name| self.gid_for_name(name))
    }
}

fn string_for_sid(strings: &Index<'_>, sid: u16) -> Option<String> {
    if sid < STANDARD_STRING_COUNT {
        return Some(CFF_STANDARD_STRINGS[sid as usize].to_string());
    }
    strings
        .get((sid - STANDARD_STRING_COUNT) as usize)
        .map(|s| String::from_utf8_lossy(s).into_owned())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal CFF writer for tests.

    use super::*;

    pub(crate) fn encode_index(items: &[&[u8]]) -> Vec<u8> {
        if items.is_empty() {
            return vec![0, 0];
        }
        let mut out = (items.len() as u16).to_be_bytes().to_vec();
        out.push(4);
        let mut offset = 1u32;
        out.extend(offset.to_be_bytes());
        for item in items {
            offset += item.len() as u32;
            out.extend(offset.to_be_bytes());
        }
        for item in items {
            out.extend_from_slice(item);
        }
        out
    }

    fn int(v: i32) -> Vec<u8> {
        let mut out = vec![29];
        out.extend(v.to_be_bytes());
        out
    }

    /// A name-keyed font whose glyph 0 is `.notdef` followed by `glyphs`.
    pub(crate) fn build_cff(glyphs: &[(&str, Vec<u8>)], default_width: i32, nominal_width: i32) -> Vec<u8> {
        let mut custom: Vec<&str> = Vec::new();
        let mut sids = Vec::new();
        for (name, _) in glyphs {
            let sid = match CFF_STANDARD_STRINGS.iter().position(|s| s == name) {
                Some(sid) => sid as u16,
                None => {
                    custom.push(*name);
                    STANDARD_STRING_COUNT + custom.len() as u16 - 1
                }
            };
            sids.push(sid);
        }
        let notdef = vec![14u8];
        let mut programs: Vec<&[u8]> = vec![&notdef];
        programs.extend(glyphs.iter().map(|(_, p)| p.as_slice()));

        let name_index = encode_index(&[b"Test".as_slice()]);
        let custom_bytes: Vec<&[u8]> = custom.iter().map(|s| s.as_bytes()).collect();
        let string_index = encode_index(&custom_bytes);
        let gsubrs = encode_index(&[]);
        let charstrings = encode_index(&programs);
        let mut charset = vec![0u8];
        for sid in &sids {
            charset.extend(sid.to_be_bytes());
        }
        let mut private = int(default_width);
        private.push(20);
        private.extend(int(nominal_width));
        private.push(21);

        // Top DICT with fixed-width operands, so its size is known up front
        let top_len = 23;
        let top_index_len = 2 + 1 + 8 + top_len;
        let start = 4 + name_index.len() + top_index_len + string_index.len() + gsubrs.len();
        let charset_at = start;
        let charstrings_at = charset_at + charset.len();
        let private_at = charstrings_at + charstrings.len();

        let mut top = int(charset_at as i32);
        top.push(15);
        top.extend(int(charstrings_at as i32));
        top.push(17);
        top.extend(int(private.len() as i32));
        top.extend(int(private_at as i32));
        top.push(18);
        debug_assert_eq!(top.len(), top_len);

        let mut out = vec![1, 0, 4, 4];
        out.extend(name_index);
        out.extend(encode_index(&[top.as_slice()]));
        out.extend(string_index);
        out.extend(gsubrs);
        out.extend(charset);
        out.extend(charstrings);
        out.extend(private);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::path::{GlyphOutline, PathSegment};

    /// `w 100 100 rmoveto 500 0 0 500 -500 0 rlineto endchar`
    fn square(width: Option<i32>) -> Vec<u8> {
        let mut p = Vec::new();
        if let Some(w) = width {
            p.push((w + 139) as u8);
        }
        p.extend([239, 239, 21]);
        p.extend([248, 136, 139, 139, 248, 136, 252, 136, 139, 5, 14]);
        p
    }

    #[test_log::test]
    fn parses_names_and_outlines() {
        let data = build_cff(&[("A", square(Some(50))), ("uni2202", square(None))], 400, 600);
        let font = CffFont::parse(&data).unwrap();
        assert_eq!(font.name(), "Test");
        assert_eq!(font.num_glyphs(), 3);
        assert_eq!(font.glyph_name(1), Some("A"));
        assert_eq!(font.gid_for_name("uni2202"), Some(2));
        assert_eq!(font.units_per_em(), 1000.);

        let mut outline = GlyphOutline::new();
        let advance = font.outline(1, &mut outline).unwrap();
        assert_eq!(advance, 650.);
        assert_eq!(outline.segments[0], PathSegment::MoveTo(100., 100.));
        assert_eq!(outline.segments[2], PathSegment::LineTo(600., 600.));

        assert_eq!(font.outline(2, &mut GlyphOutline::new()).unwrap(), 400.);
    }

    #[test_log::test]
    fn standard_encoding_by_default() {
        let data = build_cff(&[("A", square(None)), ("a", square(None))], 0, 0);
        let font = CffFont::parse(&data).unwrap();
        assert_eq!(font.gid_for_code(b'A'), Some(1));
        assert_eq!(font.gid_for_code(b'a'), Some(2));
        assert_eq!(font.gid_for_code(b'b'), None);
        assert_eq!(
            font.builtin_encoding(),
            vec![(65, "A".to_string()), (97, "a".to_string())]
        );
    }

    #[test_log::test]
    fn accented_glyph_draws_base_and_accent() {
        // 0 0 rmoveto; 10 0 rlineto ... kept tiny: two one-line contours
        let base = vec![139, 139, 21, 149, 139, 5, 14];
        let accent = vec![139, 139, 21, 139, 149, 5, 14];
        // adx=100 ady=200 bchar=65 achar=194 endchar
        let composite = vec![239, 28, 0, 200, 28, 0, 65, 28, 0, 194, 14];
        let data = build_cff(&[("A", base), ("acute", accent), ("Aacute", composite)], 0, 0);
        let font = CffFont::parse(&data).unwrap();
        let mut outline = GlyphOutline::new();
        font.outline(3, &mut outline).unwrap();
        assert!(outline.segments.contains(&PathSegment::LineTo(10., 0.)));
        assert!(outline.segments.contains(&PathSegment::MoveTo(100., 200.)));
        assert!(outline.segments.contains(&PathSegment::LineTo(100., 210.)));
    }

    #[test_log::test]
    fn bad_glyph_is_glyph_level() {
        let data = build_cff(&[("A", vec![139, 5])], 0, 0);
        let font = CffFont::parse(&data).unwrap();
        let err = font.outline(1, &mut GlyphOutline::new()).unwrap_err();
        assert!(err.is_glyph_level());
        let err = font.outline(9, &mut GlyphOutline::new()).unwrap_err();
        assert!(matches!(err, DecodeError::GlyphDecodeFailure { glyph: 9, .. }));
    }

    #[test_log::test]
    fn rejects_broken_containers() {
        assert!(matches!(
            CffFont::parse(&[2, 0, 4, 4]),
            Err(DecodeError::MalformedProgram(_))
        ));
        assert!(CffFont::parse(&[1, 0]).is_err());
        let mut data = build_cff(&[("A", square(None))], 0, 0);
        data.truncate(data.len() / 2);
        assert!(CffFont::parse(&data).is_err());
    }

    #[test_log::test]
    fn dict_operands() {
        // 1000 (two-byte), -5, 0.5 as real, key 12 7
        let dict = parse_dict(&[250, 124, 134, 30, 0x0a, 0x5f, 12, 7]).unwrap();
        assert_eq!(dict.get(&FONT_MATRIX), Some(&vec![1000., -5., 0.5]));
        assert!(parse_dict(&[255]).is_err());
    }

    #[test_log::test]
    fn fd_select_ranges() {
        let data = [3, 0, 2, 0, 0, 1, 0, 2, 4, 0, 5];
        assert_eq!(parse_fd_select(&data, 0, 5).unwrap(), vec![1, 1, 4, 4, 4]);
    }
}
