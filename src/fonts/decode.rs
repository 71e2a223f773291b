use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, debug_span, trace, warn};

use crate::cff::CffFont;
use crate::error::{DecodeError, Result};
use crate::fonts::dict::{CharCode, FontProgram};
use crate::fonts::usage::{combining_form, is_glued_accent};
use crate::fonts::{CharSet, Decoded, FontModel};
use crate::identify::{
    Confidence, GlyphResolution, GlyphSample, Identification, detect_implicit_spaces, height_normalization,
    identify, measured_width,
};
use crate::path::GlyphOutline;
use crate::raster::{GlyphImage, render_outline};
use crate::truetype::{TrueTypeFont, cff_table};
use crate::type1::Type1Font;

struct ProgramGlyph {
    code: CharCode,
    outline: GlyphOutline,
    /// Advance in 1000-unit text space.
    advance: Option<f32>,
    name: Option<String>,
}

struct ProgramGlyphs {
    glyphs: Vec<ProgramGlyph>,
    units_per_em: f32,
}

impl ProgramGlyphs {
    fn empty() -> Self {
        ProgramGlyphs {
            glyphs: Vec::new(),
            units_per_em: 1000.0,
        }
    }
}

fn cff_glyphs(model: &FontModel, cff: &CffFont<'_>, codes: &BTreeSet<CharCode>) -> ProgramGlyphs {
    let upem = cff.units_per_em();
    let mut glyphs = Vec::new();
    for &code in codes {
        let gid = match &model.nominal.code_map {
            Some(map) => map.cid(code).and_then(|cid| cff.gid_for_cid(cid)),
            None => model
                .nominal
                .names
                .get(&code)
                .and_then(|n| cff.gid_for_name(n))
                .or_else(|| u8::try_from(code).ok().and_then(|c| cff.gid_for_code(c))),
        };
        let Some(gid) = gid.filter(|&g| g != 0) else {
            trace!("code {} has no glyph", code);
            continue;
        };
        let mut outline = GlyphOutline::new();
        match cff.outline(gid, &mut outline) {
            Ok(advance) => glyphs.push(ProgramGlyph {
                code,
                outline,
                advance: Some(advance * 1000.0 / upem),
                name: cff
                    .glyph_name(gid)
                    .map(String::from)
                    .or_else(|| model.nominal.names.get(&code).cloned()),
            }),
            Err(e) => warn!("{}: code {}: {}", model.name(), code, e),
        }
    }
    ProgramGlyphs {
        glyphs,
        units_per_em: upem,
    }
}

fn type1_glyphs(model: &FontModel, font: &Type1Font, codes: &BTreeSet<CharCode>) -> ProgramGlyphs {
    let upem = font.units_per_em();
    let mut glyphs = Vec::new();
    for &code in codes {
        let Some(name) = model.nominal.names.get(&code) else {
            trace!("code {} has no glyph name", code);
            continue;
        };
        let Some(gid) = font.gid_for_name(name).filter(|_| name != ".notdef") else {
            trace!("code {}: {} is not in the program", code, name);
            continue;
        };
        let mut outline = GlyphOutline::new();
        match font.outline(gid, &mut outline) {
            Ok(advance) => glyphs.push(ProgramGlyph {
                code,
                outline,
                advance: Some(advance * 1000.0 / upem),
                name: Some(name.clone()),
            }),
            Err(e) => warn!("{}: code {}: {}", model.name(), code, e),
        }
    }
    ProgramGlyphs {
        glyphs,
        units_per_em: upem,
    }
}

fn truetype_glyphs(
    model: &FontModel,
    tt: &TrueTypeFont<'_>,
    codes: &BTreeSet<CharCode>,
) -> ProgramGlyphs {
    let cid_to_gid = model.dict().and_then(|d| d.cid.as_ref()).map(|c| &c.cid_to_gid);
    let mut gids = Vec::new();
    for &code in codes {
        let gid = match (&model.nominal.code_map, cid_to_gid) {
            (Some(map), Some(cid_to_gid)) => map.cid(code).and_then(|cid| cid_to_gid.gid(cid)),
            _ => {
                let Ok(byte) = u8::try_from(code) else {
                    continue;
                };
                let unicode = model
                    .nominal
                    .unicode
                    .get(&code)
                    .and_then(|s| s.chars().next());
                tt.gid_for_simple_code(byte, unicode)
            }
        };
        match gid.filter(|&g| g != 0 && (g as usize) < tt.num_glyphs()) {
            Some(gid) => gids.push((code, gid)),
            None => trace!("code {} has no glyph", code),
        }
    }

    let upem = tt.units_per_em();
    let arena = tt.load_glyphs(gids.iter().map(|&(_, g)| g));
    let mut glyphs = Vec::new();
    for (code, gid) in gids {
        let mut outline = GlyphOutline::new();
        match arena.outline(gid, &mut outline) {
            Ok(()) => glyphs.push(ProgramGlyph {
                code,
                outline,
                advance: tt.advance(gid).map(|a| a * 1000.0 / upem),
                name: model.nominal.names.get(&code).cloned(),
            }),
            Err(e) => warn!("{}: code {}: {}", model.name(), code, e),
        }
    }
    ProgramGlyphs {
        glyphs,
        units_per_em: upem,
    }
}

fn program_glyphs(
    model: &FontModel,
    program: &FontProgram,
    codes: &BTreeSet<CharCode>,
) -> Result<ProgramGlyphs> {
    match program {
        FontProgram::Type1(data) => {
            let font = Type1Font::parse(data)?;
            Ok(type1_glyphs(model, &font, codes))
        }
        FontProgram::Type1C(data) | FontProgram::CidType0C(data) => {
            let cff = CffFont::parse(data)?;
            Ok(cff_glyphs(model, &cff, codes))
        }
        FontProgram::TrueType(data) | FontProgram::OpenType(data) => {
            if let Some(table) = cff_table(data)? {
                let cff = CffFont::parse(table)?;
                return Ok(cff_glyphs(model, &cff, codes));
            }
            let tt = TrueTypeFont::parse(data)?;
            Ok(truetype_glyphs(model, &tt, codes))
        }
    }
}

/// Rasterizes every glyph at one scale so that the longest glyph dimension
/// is `max_px` pixels.
fn render_all(glyphs: &ProgramGlyphs, max_px: f32, compare_height: usize) -> HashMap<CharCode, Arc<GlyphImage>> {
    let longest = glyphs
        .glyphs
        .iter()
        .filter_map(|g| g.outline.bounds())
        .map(|b| b.width().max(b.height()))
        .fold(0.0, f32::max);
    let mut images = HashMap::new();
    if longest <= 0.0 {
        return images;
    }
    let scale = max_px / longest;
    for glyph in &glyphs.glyphs {
        if let Some(image) = render_outline(&glyph.outline, scale, glyphs.units_per_em, compare_height) {
            images.insert(glyph.code, Arc::new(image));
        }
    }
    images
}

fn declared_only(samples: &[GlyphSample]) -> Identification {
    let mut ident = Identification::default();
    for s in samples {
        if let Some(text) = &s.predicted {
            ident.resolutions.insert(
                s.code,
                GlyphResolution {
                    unicode: Some(text.clone()),
                    confidence: Confidence::Declared,
                },
            );
        }
    }
    ident
}

pub(crate) fn decode_font(model: &FontModel, charset: Option<&CharSet>) -> Result<Decoded> {
    let span = debug_span!("decode_font", name = %model.name());
    let _enter = span.enter();

    let Some(dict) = model.dict() else {
        return Err(DecodeError::MalformedFontDict("font dictionary was not readable".into()));
    };
    let usage = model.usage();
    let mut codes: BTreeSet<CharCode> = usage.codes().into_iter().collect();
    if let Some(extra) = charset {
        codes.extend(extra.iter().copied());
    }
    debug!("{} codes in use", codes.len());

    let glyphs = match dict.program() {
        Some(program) => program_glyphs(model, program, &codes)?,
        None => ProgramGlyphs::empty(),
    };
    let config = model.config();
    let images = render_all(&glyphs, config.max_glyph_px, config.compare_height);

    let samples: Vec<GlyphSample> = glyphs
        .glyphs
        .iter()
        .filter_map(|g| {
            let image = images.get(&g.code)?.clone();
            Some(GlyphSample {
                code: g.code,
                image,
                predicted: model.nominal.unicode.get(&g.code).cloned(),
                from_name: !model.nominal.from_to_unicode.contains(&g.code),
            })
        })
        .collect();
    let ident = if model.matcher().has_references() && !samples.is_empty() {
        identify(&samples, model.matcher(), config)
    } else {
        declared_only(&samples)
    };

    let mut decoded = Decoded {
        has_descent: ident.has_descent(),
        ..Decoded::default()
    };
    for (code, res) in &ident.resolutions {
        decoded.unicode.insert(*code, res.unicode.clone());
    }

    let glued: Vec<(CharCode, char)> = decoded
        .unicode
        .iter()
        .filter_map(|(&code, text)| {
            let mut chars = text.as_deref()?.chars();
            let ch = chars.next()?;
            let mark = combining_form(ch).filter(|_| chars.next().is_none())?;
            let stats = usage.get(code)?;
            let is_letter = |c: CharCode| {
                decoded
                    .unicode
                    .get(&c)
                    .cloned()
                    .flatten()
                    .or_else(|| model.nominal.unicode.get(&c).cloned())
                    .is_some_and(|t| t.chars().last().is_some_and(char::is_alphabetic))
            };
            is_glued_accent(stats, is_letter).then_some((code, mark))
        })
        .collect();
    for (code, mark) in glued {
        debug!("code {} is a combining {:?}", code, mark);
        decoded.unicode.insert(code, Some(mark.to_string()));
    }

    let has_array = dict.has_width_array();
    for glyph in &glyphs.glyphs {
        if let Some(image) = images.get(&glyph.code) {
            decoded.measured_widths.insert(glyph.code, measured_width(image));
            if let Some(name) = &glyph.name {
                decoded.images_by_name.insert(name.clone(), image.clone());
            }
        }
        if !has_array && !model.nominal.code_widths.contains_key(&glyph.code) {
            if let Some(advance) = glyph.advance {
                decoded.code_widths.insert(glyph.code, advance);
            }
        }
    }
    for (code, res) in &ident.resolutions {
        let changed = matches!(
            res.confidence,
            Confidence::Corrected(_) | Confidence::Recognized(_) | Confidence::BelowConfidence(_)
        );
        if changed {
            if let (Some(text), Some(width)) = (&res.unicode, model.declared_width(*code)) {
                decoded.char_widths.entry(text.clone()).or_insert(width);
            }
        }
    }

    let samples: Vec<(f32, f32)> = decoded
        .measured_widths
        .iter()
        .filter_map(|(&code, &measured)| Some((model.declared_width(code)?, measured)))
        .collect();
    let height_norm = height_normalization(ident.cap_height.or(Some(model.metrics().cap_height)));
    decoded.implicit_spaces =
        detect_implicit_spaces(usage.average_word_length(), &samples, height_norm, config);

    decoded.images = images;
    decoded.resolutions = ident.resolutions.clone();
    decoded.identification = Some(ident);
    debug!(
        "decoded {} glyphs; implicit spaces: {}",
        decoded.images.len(),
        decoded.implicit_spaces
    );
    Ok(decoded)
}
