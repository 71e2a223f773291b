//! Nominal (declared) tables built from a font dictionary before any
//! glyph is decoded.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::cff::CffFont;
use crate::error::Result;
use crate::fonts::base::BaseFont;
use crate::fonts::dict::{CharCode, EncodingSpec, FontDict, FontKind, FontProgram};
use crate::fonts::encoding::{
    CodeMap, EncodingTable, glyph_name_to_unicode, named_encoding, parse_to_unicode,
    type1_builtin_encoding,
};
use crate::truetype::cff_table;

#[derive(Debug, Clone, Default)]
pub(crate) struct Nominal {
    /// Declared text per code.
    pub unicode: HashMap<CharCode, String>,
    /// Codes whose text came from `ToUnicode`.
    pub from_to_unicode: HashSet<CharCode>,
    /// Glyph names per code from the encoding.
    pub names: HashMap<CharCode, String>,
    /// Codes named by a `Differences` array.
    pub differences: HashSet<CharCode>,
    /// Widths already in text space for specific codes.
    pub code_widths: HashMap<CharCode, f32>,
    pub code_map: Option<CodeMap>,
    pub missing_width: f32,
    pub nominal_width: f32,
}

/// Encoding of the embedded program itself, when it has one.
fn program_encoding(dict: &FontDict) -> Vec<(CharCode, String)> {
    match dict.program() {
        Some(FontProgram::Type1(data)) => type1_builtin_encoding(data),
        Some(FontProgram::Type1C(data)) => match CffFont::parse(data) {
            Ok(cff) => cff.builtin_encoding(),
            Err(e) => {
                debug!("no built-in encoding: {}", e);
                Vec::new()
            }
        },
        Some(FontProgram::OpenType(data)) => cff_table(data)
            .ok()
            .flatten()
            .and_then(|cff| CffFont::parse(cff).ok())
            .map(|cff| cff.builtin_encoding())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn table_names(table: &EncodingTable) -> HashMap<CharCode, String> {
    table
        .iter()
        .enumerate()
        .filter_map(|(code, name)| Some((code as CharCode, (*name)?.to_string())))
        .collect()
}

fn encoding_names(dict: &FontDict, base: &BaseFont) -> (HashMap<CharCode, String>, HashSet<CharCode>) {
    let (named, differences) = match &dict.encoding {
        Some(EncodingSpec::Named(n)) => (named_encoding(n), &[][..]),
        Some(EncodingSpec::Differences { base, differences }) => {
            (base.as_deref().and_then(named_encoding), differences.as_slice())
        }
        _ => (None, &[][..]),
    };

    let mut names = match named {
        Some(table) => table_names(table),
        None => {
            let builtin = program_encoding(dict);
            if !builtin.is_empty() {
                debug!("using the program's built-in encoding ({} codes)", builtin.len());
                builtin.into_iter().collect()
            } else if dict.program().is_none() && base.is_symbolic() {
                (0..256)
                    .filter_map(|c| Some((c, base.glyph_name(c)?.to_string())))
                    .collect()
            } else if dict.is_symbolic() || dict.kind == FontKind::Type3 {
                HashMap::new()
            } else if dict.kind == FontKind::TrueType {
                table_names(&crate::data::WIN_ANSI_ENCODING)
            } else {
                table_names(&crate::data::STANDARD_ENCODING)
            }
        }
    };

    let mut diff_codes = HashSet::new();
    for (code, name) in differences {
        names.insert(*code, name.clone());
        diff_codes.insert(*code);
    }
    (names, diff_codes)
}

fn is_case_pair(a: &str, b: &str) -> bool {
    a != b && a.chars().count() == 1 && a.to_lowercase() == b.to_lowercase()
}

/// Settles codes where the glyph name and `ToUnicode` disagree only in case,
/// siding with whichever case is more common among the codes `ToUnicode`
/// declares. The full encoding table is not counted: it names every letter
/// whether the document uses it or not. Ties keep `ToUnicode`.
fn resolve_case_conflicts(nominal: &mut Nominal, name_text: &HashMap<CharCode, String>) {
    let conflicts: Vec<CharCode> = nominal
        .from_to_unicode
        .iter()
        .copied()
        .filter(|code| match (nominal.unicode.get(code), name_text.get(code)) {
            (Some(t), Some(n)) => is_case_pair(t, n),
            _ => false,
        })
        .collect();
    if conflicts.is_empty() {
        return;
    }
    let (mut upper, mut lower) = (0usize, 0usize);
    let declared = nominal
        .from_to_unicode
        .iter()
        .filter_map(|code| nominal.unicode.get(code));
    for text in declared {
        for c in text.chars() {
            if c.is_uppercase() {
                upper += 1;
            } else if c.is_lowercase() {
                lower += 1;
            }
        }
    }
    for code in conflicts {
        let Some(current) = nominal.unicode.get(&code) else {
            continue;
        };
        let fixed = if upper > lower {
            current.to_uppercase()
        } else if lower > upper {
            current.to_lowercase()
        } else {
            continue;
        };
        if &fixed != current {
            debug!("code {}: case conflict settled as {:?}", code, fixed);
            nominal.unicode.insert(code, fixed);
        }
    }
}

pub(crate) fn build_nominal(dict: &FontDict, base: &BaseFont) -> Result<Nominal> {
    let mut nominal = Nominal::default();

    if let Some(cid) = &dict.cid {
        nominal.code_map = Some(match &dict.encoding {
            Some(EncodingSpec::CMap(data)) => CodeMap::parse(data)?,
            Some(EncodingSpec::CMapName(name)) => CodeMap::named(name),
            _ => CodeMap::identity(),
        });
        nominal.missing_width = cid.default_width;
        let widths: Vec<f32> = cid.widths.values().copied().filter(|w| *w > 0.0).collect();
        nominal.nominal_width = if widths.is_empty() {
            cid.default_width
        } else {
            widths.iter().sum::<f32>() / widths.len() as f32
        };
    } else {
        let (names, differences) = encoding_names(dict, base);
        for (code, name) in &names {
            if let Some(text) = glyph_name_to_unicode(name) {
                nominal.unicode.insert(*code, text);
            }
        }
        nominal.names = names;
        nominal.differences = differences;

        let scale = match (dict.kind, dict.font_matrix) {
            (FontKind::Type3, Some(m)) => m[0] * 1000.0,
            _ => 1.0,
        };
        if dict.kind == FontKind::Type3 {
            for (code, w) in (dict.first_char..=CharCode::MAX).zip(&dict.widths) {
                nominal.code_widths.insert(code, w * scale);
            }
        }
        nominal.missing_width = dict.descriptor.as_ref().map_or(0.0, |d| d.missing_width) * scale;
        let widths: Vec<f32> = dict.widths.iter().copied().filter(|w| *w > 0.0).collect();
        nominal.nominal_width = if widths.is_empty() {
            base.average_width()
        } else {
            widths.iter().sum::<f32>() / widths.len() as f32 * scale
        };
    }

    let name_text = nominal.unicode.clone();
    if let Some(data) = &dict.to_unicode {
        let map = parse_to_unicode(data);
        if map.is_empty() {
            warn!("ToUnicode CMap of {} has no usable entries", dict.base_font);
        }
        for (code, text) in map {
            nominal.from_to_unicode.insert(code);
            nominal.unicode.insert(code, text);
        }
        resolve_case_conflicts(&mut nominal, &name_text);
    }
    debug!(
        "{}: {} names, {} declared characters",
        dict.base_font,
        nominal.names.len(),
        nominal.unicode.len()
    );
    Ok(nominal)
}
