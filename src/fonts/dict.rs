//! Narrowly typed font dictionaries built once from a [`PdfValue`] graph.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{DecodeError, Result};
use crate::value::{PdfDict, PdfValue};

pub type CharCode = u32;

/// Largest `c_first c_last w` range accepted from a `W` array.
const MAX_W_RANGE: u32 = 0x10000;

fn malformed(what: impl Into<String>) -> DecodeError {
    DecodeError::MalformedFontDict(what.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontKind {
    Type0,
    Type1,
    MMType1,
    Type3,
    TrueType,
    CIDType0,
    CIDType2,
}

impl FontKind {
    fn from_subtype(name: &str) -> Option<FontKind> {
        Some(match name {
            "Type0" => FontKind::Type0,
            "Type1" => FontKind::Type1,
            "MMType1" => FontKind::MMType1,
            "Type3" => FontKind::Type3,
            "TrueType" => FontKind::TrueType,
            "CIDFontType0" => FontKind::CIDType0,
            "CIDFontType2" => FontKind::CIDType2,
            _ => return None,
        })
    }

    pub fn is_cid(self) -> bool {
        matches!(self, FontKind::Type0 | FontKind::CIDType0 | FontKind::CIDType2)
    }
}

/// Embedded font program, by the descriptor key and subtype it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FontProgram {
    /// `FontFile`
    Type1(Vec<u8>),
    /// `FontFile2`
    TrueType(Vec<u8>),
    /// `FontFile3` with `/Subtype /Type1C`
    Type1C(Vec<u8>),
    /// `FontFile3` with `/Subtype /CIDFontType0C`
    CidType0C(Vec<u8>),
    /// `FontFile3` with `/Subtype /OpenType`
    OpenType(Vec<u8>),
}

impl FontProgram {
    pub fn data(&self) -> &[u8] {
        match self {
            FontProgram::Type1(d)
            | FontProgram::TrueType(d)
            | FontProgram::Type1C(d)
            | FontProgram::CidType0C(d)
            | FontProgram::OpenType(d) => d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontDescriptor {
    pub font_name: Option<String>,
    pub flags: u32,
    pub font_bbox: Option<[f32; 4]>,
    pub italic_angle: f32,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: Option<f32>,
    pub x_height: Option<f32>,
    pub stem_v: Option<f32>,
    pub font_weight: Option<f32>,
    pub missing_width: f32,
    pub char_set: Option<String>,
    pub program: Option<FontProgram>,
}

impl FontDescriptor {
    const FIXED_PITCH: u32 = 1 << 0;
    const SERIF: u32 = 1 << 1;
    const SYMBOLIC: u32 = 1 << 2;
    const ITALIC: u32 = 1 << 6;
    const FORCE_BOLD: u32 = 1 << 18;

    pub fn is_fixed_pitch(&self) -> bool {
        self.flags & Self::FIXED_PITCH != 0
    }

    pub fn is_serif(&self) -> bool {
        self.flags & Self::SERIF != 0
    }

    pub fn is_symbolic(&self) -> bool {
        self.flags & Self::SYMBOLIC != 0
    }

    pub fn is_italic(&self) -> bool {
        self.flags & Self::ITALIC != 0 || self.italic_angle.abs() > 1.0
    }

    pub fn is_bold(&self) -> bool {
        self.flags & Self::FORCE_BOLD != 0
            || self.font_weight.is_some_and(|w| w >= 600.0)
            || self.stem_v.is_some_and(|v| v >= 120.0)
    }

    fn from_value(value: &PdfValue) -> Result<FontDescriptor> {
        let dict = value
            .as_dict()
            .ok_or_else(|| malformed("FontDescriptor is not a dictionary"))?;
        let num = |key: &str| dict.get(key).and_then(PdfValue::as_f32);
        let program = read_program(dict);
        let font_bbox = dict.get("FontBBox").and_then(|b| b.as_f32_array::<4>());
        if program.is_some() && font_bbox.is_none() {
            return Err(malformed("FontDescriptor with embedded program lacks FontBBox"));
        }
        Ok(FontDescriptor {
            font_name: dict.get("FontName").and_then(PdfValue::as_name).map(String::from),
            flags: dict.get("Flags").and_then(PdfValue::as_u32).unwrap_or(0),
            font_bbox,
            italic_angle: num("ItalicAngle").unwrap_or(0.0),
            ascent: num("Ascent").unwrap_or(0.0),
            descent: num("Descent").unwrap_or(0.0),
            cap_height: num("CapHeight").filter(|h| *h > 0.0),
            x_height: num("XHeight").filter(|h| *h > 0.0),
            stem_v: num("StemV"),
            font_weight: num("FontWeight"),
            missing_width: num("MissingWidth").unwrap_or(0.0),
            char_set: dict
                .get("CharSet")
                .and_then(PdfValue::as_text)
                .map(|s| String::from_utf8_lossy(s).into_owned()),
            program,
        })
    }
}

fn read_program(dict: &PdfDict) -> Option<FontProgram> {
    let stream = |key: &str| dict.get(key).and_then(PdfValue::as_stream);
    if let Some(s) = stream("FontFile") {
        return Some(FontProgram::Type1(s.data.clone()));
    }
    if let Some(s) = stream("FontFile2") {
        return Some(FontProgram::TrueType(s.data.clone()));
    }
    let s = stream("FontFile3")?;
    let subtype = s.dict.get("Subtype").and_then(PdfValue::as_name);
    match subtype {
        Some("Type1C") => Some(FontProgram::Type1C(s.data.clone())),
        Some("CIDFontType0C") => Some(FontProgram::CidType0C(s.data.clone())),
        Some("OpenType") => Some(FontProgram::OpenType(s.data.clone())),
        other => {
            warn!("unsupported FontFile3 subtype {:?}", other);
            None
        }
    }
}

/// A simple font's `Encoding` entry, or a composite font's CMap.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingSpec {
    Named(String),
    Differences {
        base: Option<String>,
        differences: Vec<(CharCode, String)>,
    },
    /// Predefined CMap name such as `Identity-H`.
    CMapName(String),
    /// Embedded CMap stream bytes.
    CMap(Vec<u8>),
}

fn parse_simple_encoding(value: &PdfValue) -> Result<Option<EncodingSpec>> {
    match value {
        PdfValue::Name(n) => Ok(Some(EncodingSpec::Named(n.clone()))),
        PdfValue::Dict(dict) => {
            let base = dict.get("BaseEncoding").and_then(PdfValue::as_name).map(String::from);
            let mut differences = Vec::new();
            let mut code: Option<CharCode> = None;
            for item in dict.get("Differences").and_then(PdfValue::as_array).unwrap_or_default() {
                match item {
                    PdfValue::Number(_) => {
                        code = Some(
                            item.as_u32()
                                .ok_or_else(|| malformed("bad code in Differences"))?,
                        );
                    }
                    PdfValue::Name(name) => {
                        let c = code.ok_or_else(|| malformed("Differences starts with a name"))?;
                        differences.push((c, name.clone()));
                        code = Some(
                            c.checked_add(1)
                                .ok_or_else(|| malformed("Differences run past the last code"))?,
                        );
                    }
                    other => {
                        return Err(malformed(format!("unexpected {:?} in Differences", other)));
                    }
                }
            }
            Ok(Some(EncodingSpec::Differences { base, differences }))
        }
        PdfValue::Null => Ok(None),
        other => {
            debug!("ignoring encoding {:?}", other);
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CidToGid {
    Identity,
    Map(Vec<u16>),
}

impl CidToGid {
    pub fn gid(&self, cid: CharCode) -> Option<u16> {
        match self {
            CidToGid::Identity => u16::try_from(cid).ok(),
            CidToGid::Map(map) => map.get(cid as usize).copied(),
        }
    }
}

/// The descendant of a Type0 font.
#[derive(Debug, Clone, PartialEq)]
pub struct CidFont {
    pub kind: FontKind,
    pub base_font: String,
    pub default_width: f32,
    pub widths: HashMap<CharCode, f32>,
    pub descriptor: Option<FontDescriptor>,
    pub cid_to_gid: CidToGid,
}

impl CidFont {
    fn from_value(value: &PdfValue) -> Result<CidFont> {
        let dict = value
            .as_dict()
            .ok_or_else(|| malformed("descendant font is not a dictionary"))?;
        let kind = dict
            .get("Subtype")
            .and_then(PdfValue::as_name)
            .and_then(FontKind::from_subtype)
            .filter(|k| matches!(k, FontKind::CIDType0 | FontKind::CIDType2))
            .ok_or_else(|| malformed("descendant font is not a CIDFont"))?;
        let widths = match dict.get("W") {
            Some(w) => parse_w_array(w)?,
            None => HashMap::new(),
        };
        let cid_to_gid = match dict.get("CIDToGIDMap") {
            Some(PdfValue::Stream(s)) => CidToGid::Map(
                s.data
                    .chunks_exact(2)
                    .map(|p| u16::from_be_bytes([p[0], p[1]]))
                    .collect(),
            ),
            _ => CidToGid::Identity,
        };
        Ok(CidFont {
            kind,
            base_font: dict
                .get("BaseFont")
                .and_then(PdfValue::as_name)
                .unwrap_or_default()
                .to_string(),
            default_width: dict.get("DW").and_then(PdfValue::as_f32).unwrap_or(1000.0),
            widths,
            descriptor: dict
                .get("FontDescriptor")
                .map(FontDescriptor::from_value)
                .transpose()?,
            cid_to_gid,
        })
    }
}

/// `W` arrays mix `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_w_array(value: &PdfValue) -> Result<HashMap<CharCode, f32>> {
    let items = value.as_array().ok_or_else(|| malformed("W is not an array"))?;
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let first = items[i]
            .as_u32()
            .ok_or_else(|| malformed("W entry does not start with a CID"))?;
        match items.get(i + 1) {
            Some(PdfValue::Array(list)) => {
                for (j, w) in list.iter().enumerate() {
                    let w = w.as_f32().ok_or_else(|| malformed("non-numeric width in W"))?;
                    let cid = CharCode::try_from(j)
                        .ok()
                        .and_then(|j| first.checked_add(j))
                        .ok_or_else(|| malformed(format!("W list at {} runs past the last CID", first)))?;
                    widths.insert(cid, w);
                }
                i += 2;
            }
            Some(last) => {
                let last = last.as_u32().ok_or_else(|| malformed("bad CID range in W"))?;
                let w = items
                    .get(i + 2)
                    .and_then(PdfValue::as_f32)
                    .ok_or_else(|| malformed("W range without width"))?;
                if last < first || last - first > MAX_W_RANGE {
                    return Err(malformed(format!("W range {}..{} out of bounds", first, last)));
                }
                for cid in first..=last {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => return Err(malformed("truncated W array")),
        }
    }
    Ok(widths)
}

/// Everything the font model needs from a font dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDict {
    pub kind: FontKind,
    pub base_font: String,
    pub first_char: CharCode,
    pub widths: Vec<f32>,
    pub encoding: Option<EncodingSpec>,
    pub to_unicode: Option<Vec<u8>>,
    pub descriptor: Option<FontDescriptor>,
    pub font_matrix: Option<[f32; 6]>,
    pub font_bbox: Option<[f32; 4]>,
    pub cid: Option<CidFont>,
}

impl FontDict {
    pub fn from_value(value: &PdfValue) -> Result<FontDict> {
        let dict = value
            .as_dict()
            .ok_or_else(|| malformed("font is not a dictionary"))?;
        let subtype = dict
            .get("Subtype")
            .and_then(PdfValue::as_name)
            .ok_or_else(|| malformed("font without Subtype"))?;
        let kind = FontKind::from_subtype(subtype)
            .ok_or_else(|| malformed(format!("unknown font subtype {}", subtype)))?;
        let base_font = dict
            .get("BaseFont")
            .and_then(PdfValue::as_name)
            .unwrap_or_default()
            .to_string();
        let to_unicode = match dict.get("ToUnicode") {
            Some(PdfValue::Stream(s)) => Some(s.data.clone()),
            _ => None,
        };

        if kind == FontKind::Type0 {
            let descendant = dict
                .get("DescendantFonts")
                .and_then(PdfValue::as_array)
                .and_then(|a| a.first())
                .ok_or_else(|| malformed("Type0 font without DescendantFonts"))?;
            let cid = CidFont::from_value(descendant)?;
            let encoding = match dict.get("Encoding") {
                Some(PdfValue::Name(n)) => EncodingSpec::CMapName(n.clone()),
                Some(PdfValue::Stream(s)) => EncodingSpec::CMap(s.data.clone()),
                _ => return Err(malformed("Type0 font without Encoding CMap")),
            };
            debug!("Type0 font {} over {:?}", base_font, cid.kind);
            return Ok(FontDict {
                kind,
                base_font,
                first_char: 0,
                widths: Vec::new(),
                encoding: Some(encoding),
                to_unicode,
                descriptor: cid.descriptor.clone(),
                font_matrix: None,
                font_bbox: None,
                cid: Some(cid),
            });
        }
        if kind.is_cid() {
            return Err(malformed("CIDFont used directly as a font"));
        }

        let widths = match dict.get("Widths") {
            Some(w) => w
                .as_array()
                .ok_or_else(|| malformed("Widths is not an array"))?
                .iter()
                .map(|w| w.as_f32().ok_or_else(|| malformed("non-numeric entry in Widths")))
                .collect::<Result<Vec<f32>>>()?,
            None => Vec::new(),
        };
        let first_char = dict.get("FirstChar").and_then(PdfValue::as_u32);
        let last_char = dict.get("LastChar").and_then(PdfValue::as_u32);
        if !widths.is_empty() {
            let first = first_char.ok_or_else(|| malformed("Widths without FirstChar"))?;
            if u64::from(first) + widths.len() as u64 > u64::from(CharCode::MAX) + 1 {
                return Err(malformed(format!("Widths at FirstChar {} run past the last code", first)));
            }
            if let Some(last) = last_char {
                if last < first || u64::from(last - first) + 1 != widths.len() as u64 {
                    return Err(malformed(format!(
                        "{} Widths for FirstChar {} LastChar {}",
                        widths.len(),
                        first,
                        last
                    )));
                }
            }
        }

        let (font_matrix, font_bbox) = if kind == FontKind::Type3 {
            let matrix = dict
                .get("FontMatrix")
                .and_then(|m| m.as_f32_array::<6>())
                .ok_or_else(|| malformed("Type3 font without FontMatrix"))?;
            let bbox = dict
                .get("FontBBox")
                .and_then(|b| b.as_f32_array::<4>())
                .ok_or_else(|| malformed("Type3 font without FontBBox"))?;
            (Some(matrix), Some(bbox))
        } else {
            (None, None)
        };

        let encoding = match dict.get("Encoding") {
            Some(e) => parse_simple_encoding(e)?,
            None => None,
        };
        let descriptor = dict
            .get("FontDescriptor")
            .map(FontDescriptor::from_value)
            .transpose()?;

        Ok(FontDict {
            kind,
            base_font,
            first_char: first_char.unwrap_or(0),
            widths,
            encoding,
            to_unicode,
            descriptor,
            font_matrix,
            font_bbox,
            cid: None,
        })
    }

    /// The kind of the program actually drawing glyphs: the descendant's
    /// for Type0 fonts.
    pub fn program_kind(&self) -> FontKind {
        self.cid.as_ref().map_or(self.kind, |c| c.kind)
    }

    /// Width from `Widths` or `W` for `code`.
    pub fn array_width(&self, code: CharCode) -> Option<f32> {
        match &self.cid {
            Some(cid) => cid.widths.get(&code).copied(),
            None => {
                let i = code.checked_sub(self.first_char)? as usize;
                self.widths.get(i).copied()
            }
        }
    }

    pub fn has_width_array(&self) -> bool {
        match &self.cid {
            Some(cid) => !cid.widths.is_empty(),
            None => !self.widths.is_empty(),
        }
    }

    pub fn program(&self) -> Option<&FontProgram> {
        self.descriptor.as_ref()?.program.as_ref()
    }

    pub fn is_symbolic(&self) -> bool {
        self.descriptor.as_ref().is_some_and(FontDescriptor::is_symbolic)
    }
}
