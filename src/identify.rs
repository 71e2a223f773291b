//! Per-font decision policy on top of the glyph matcher.
//!
//! Every decoded glyph with a declared character is scored against that
//! character (and its other case). The font's mappings are trusted only when
//! the scores clear one of the joint (minimum, mean) bounds; otherwise the
//! name-derived mappings are thrown away and glyphs are recognized from
//! shape alone.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::fonts::dict::CharCode;
use crate::matcher::{CharMatchResult, Family, Matcher, Style};
use crate::raster::GlyphImage;

/// Characters tried when a glyph has to be recognized from its shape.
const OCR_CANDIDATES: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,;:!?'\"()[]-/&%$@#*+=";

/// Glyphs whose italic rendering is too close to a slanted stroke to say
/// anything about the style.
const ITALIC_DENY_LIST: &str = "Iil1|/\\-_.,:;'\"`";

const CAP_HEIGHT_LETTERS: &str = "HIEFLTNMKZX";
/// Lowercase letters whose top is not at the x-height.
const TALL_LOWERCASE: &str = "bdfhkltij";
/// Typical x-height over cap height, used when no reference can say.
const DEFAULT_X_HEIGHT_RATIO: f32 = 0.66;
const SMALL_CAP_LETTERS: &str = "acemnorsuvwxz";
const DESCENDERS: &str = "gjpqy";

/// Extra advance added to ink width to approximate sidebearings.
const SIDEBEARING_FACTOR: f32 = 1.15;
const REFERENCE_CAP_HEIGHT: f32 = 700.0;

/// How a glyph's character was settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// Taken from the font's declarations without comparison.
    Declared,
    /// The declared character matched its reference rendering.
    Verified(f32),
    /// The other case of the declared character matched better.
    Corrected(f32),
    /// Recognized from shape alone and above the acceptance score.
    Recognized(f32),
    /// Best guess from shape alone, below the acceptance score.
    BelowConfidence(f32),
    Unmatched,
}

impl Confidence {
    pub fn score(&self) -> Option<f32> {
        match *self {
            Confidence::Verified(s)
            | Confidence::Corrected(s)
            | Confidence::Recognized(s)
            | Confidence::BelowConfidence(s) => Some(s),
            Confidence::Declared | Confidence::Unmatched => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphResolution {
    /// `None` when the glyph's mapping was removed.
    pub unicode: Option<String>,
    pub confidence: Confidence,
}

/// One decoded glyph handed to identification.
#[derive(Debug, Clone)]
pub struct GlyphSample {
    pub code: CharCode,
    pub image: Arc<GlyphImage>,
    /// Character the font declares for the glyph.
    pub predicted: Option<String>,
    /// Whether `predicted` came only from a glyph name.
    pub from_name: bool,
}

/// Outcome of identifying one font's glyphs.
#[derive(Debug, Clone, Default)]
pub struct Identification {
    pub resolutions: BTreeMap<CharCode, GlyphResolution>,
    pub accepted: bool,
    pub min_score: f32,
    pub mean_score: f32,
    pub style: Option<(Family, Style)>,
    pub cap_height: Option<f32>,
    pub x_height: Option<f32>,
}

impl Identification {
    /// Whether any glyph resolved to a letter with a descender.
    pub fn has_descent(&self) -> bool {
        self.resolutions.values().any(|r| {
            r.unicode
                .as_deref()
                .is_some_and(|u| u.chars().any(|c| DESCENDERS.contains(c)))
        })
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

fn other_case(ch: char) -> Option<char> {
    let flipped: String = if ch.is_uppercase() {
        ch.to_lowercase().collect()
    } else if ch.is_lowercase() {
        ch.to_uppercase().collect()
    } else {
        return None;
    };
    single_char(&flipped).filter(|&c| c != ch)
}

/// Majority vote across buckets: `alt` wins only where it beats `primary`
/// in more buckets than it loses.
fn prefers(alt: &CharMatchResult, primary: &CharMatchResult) -> bool {
    let (mut wins, mut losses) = (0, 0);
    for family in Family::ALL {
        for style in Style::ALL {
            let (a, p) = (alt.score(family, style), primary.score(family, style));
            if a > p {
                wins += 1;
            } else if p > a {
                losses += 1;
            }
        }
    }
    wins > losses
}

fn median(mut values: Vec<f32>) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    Some(values[values.len() / 2])
}

/// Scale applied to measured widths so fonts drawn small in their em compare
/// like ordinary ones.
pub fn height_normalization(cap_height: Option<f32>) -> f32 {
    match cap_height {
        Some(cap) if cap > 0.0 => (REFERENCE_CAP_HEIGHT / cap).clamp(0.5, 2.0),
        _ => 1.0,
    }
}

/// Advance implied by a glyph's ink, in 1000-unit text space.
pub fn measured_width(image: &GlyphImage) -> f32 {
    image.bounds.width() * 1000.0 * SIDEBEARING_FACTOR
}

/// Flags fonts that encode word gaps as oversized advances: words are
/// suspiciously short and the declared widths far exceed what the glyph
/// shapes need. `samples` pairs declared and measured widths.
pub fn detect_implicit_spaces(
    average_word_length: Option<f32>,
    samples: &[(f32, f32)],
    height_norm: f32,
    config: &DecoderConfig,
) -> bool {
    let Some(avg) = average_word_length else {
        return false;
    };
    if avg > config.implicit_space_word_len {
        return false;
    }
    let nominal: f32 = samples.iter().map(|s| s.0).sum();
    let measured: f32 = samples.iter().map(|s| s.1).sum::<f32>() * height_norm;
    if samples.is_empty() || measured <= 0.0 {
        return false;
    }
    let ratio = nominal / measured;
    debug!("implicit spaces: word length {:.2}, width ratio {:.2}", avg, ratio);
    ratio >= config.implicit_space_ratio
}

struct Scored<'a> {
    sample: &'a GlyphSample,
    result: CharMatchResult,
    corrected: bool,
}

/// Runs the full decision policy for one font.
pub fn identify(samples: &[GlyphSample], matcher: &Matcher, config: &DecoderConfig) -> Identification {
    let mut out = Identification::default();
    let mut kept: Vec<Scored> = Vec::new();
    let mut removed: Vec<&GlyphSample> = Vec::new();
    let mut unmapped: Vec<&GlyphSample> = Vec::new();

    for sample in samples {
        let Some(text) = sample.predicted.as_deref() else {
            unmapped.push(sample);
            continue;
        };
        let Some(ch) = single_char(text).filter(|&c| matcher.can_render(c)) else {
            out.resolutions.insert(
                sample.code,
                GlyphResolution {
                    unicode: Some(text.to_string()),
                    confidence: Confidence::Declared,
                },
            );
            continue;
        };
        let primary = matcher.match_char(&sample.image, ch);
        let alternate = other_case(ch)
            .filter(|&c| matcher.can_render(c))
            .map(|c| matcher.match_char(&sample.image, c));
        let (result, corrected) = match alternate {
            Some(alt) if prefers(&alt, &primary) => (alt, true),
            _ => (primary, false),
        };
        trace!("code {} as {:?}: {:.3}", sample.code, result.ch, result.best());
        if result.best() <= config.removal_score {
            removed.push(sample);
        } else {
            kept.push(Scored {
                sample,
                result,
                corrected,
            });
        }
    }

    let scores: Vec<f32> = kept.iter().map(|s| s.result.best()).collect();
    if !scores.is_empty() {
        out.min_score = scores.iter().copied().fold(f32::INFINITY, f32::min);
        out.mean_score = scores.iter().sum::<f32>() / scores.len() as f32;
    }
    let judged = kept.len() + removed.len();
    out.accepted = !kept.is_empty()
        && removed.len() * 2 < judged
        && config.accepts(out.min_score, out.mean_score);
    debug!(
        "{} glyphs judged, {} removed, min {:.3} mean {:.3}: {}",
        judged,
        removed.len(),
        out.min_score,
        out.mean_score,
        if out.accepted { "accepted" } else { "rejected" }
    );

    if out.accepted {
        out.style = pick_style(&kept);
        let height_of = |letters: &str| {
            median(
                kept.iter()
                    .filter(|s| letters.contains(s.result.ch))
                    .map(|s| s.sample.image.bounds.y_max * 1000.0)
                    .collect(),
            )
        };
        out.cap_height = height_of(CAP_HEIGHT_LETTERS);
        let observed = median(
            kept.iter()
                .filter(|s| s.result.ch.is_lowercase() && !TALL_LOWERCASE.contains(s.result.ch))
                .map(|s| s.sample.image.bounds.y_max * 1000.0)
                .collect(),
        );
        let expected = out
            .cap_height
            .map(|cap| cap * x_height_ratio(matcher, out.style).unwrap_or(DEFAULT_X_HEIGHT_RATIO));
        out.x_height = estimate_x_height(observed, expected, config.small_caps_tolerance);
        if let Some(x_height) = out.x_height {
            correct_small_caps(&mut kept, x_height, matcher, config);
        }
        for s in &kept {
            let score = s.result.best();
            out.resolutions.insert(
                s.sample.code,
                GlyphResolution {
                    unicode: Some(s.result.ch.to_string()),
                    confidence: if s.corrected {
                        Confidence::Corrected(score)
                    } else {
                        Confidence::Verified(score)
                    },
                },
            );
        }
        unmapped.extend(removed);
    } else {
        for s in kept {
            if s.sample.from_name {
                unmapped.push(s.sample);
            } else {
                out.resolutions.insert(
                    s.sample.code,
                    GlyphResolution {
                        unicode: s.sample.predicted.clone(),
                        confidence: Confidence::Declared,
                    },
                );
            }
        }
        for s in removed {
            unmapped.push(s);
        }
    }

    let candidates: Vec<char> = OCR_CANDIDATES.chars().collect();
    for sample in unmapped {
        out.resolutions
            .insert(sample.code, recognize(sample, &candidates, matcher, config));
    }
    out
}

fn recognize(
    sample: &GlyphSample,
    candidates: &[char],
    matcher: &Matcher,
    config: &DecoderConfig,
) -> GlyphResolution {
    let results = matcher.recognize(&sample.image, candidates, config.candidate_limit);
    match results.first() {
        Some(best) if best.best() > 0.0 => {
            let score = best.best();
            debug!("code {} recognized as {:?} ({:.3})", sample.code, best.ch, score);
            GlyphResolution {
                unicode: Some(best.ch.to_string()),
                confidence: if score >= config.ocr_accept {
                    Confidence::Recognized(score)
                } else {
                    Confidence::BelowConfidence(score)
                },
            }
        }
        _ => GlyphResolution {
            unicode: None,
            confidence: Confidence::Unmatched,
        },
    }
}

/// The (family, style) bucket with the highest mean score. Italic buckets
/// skip glyphs on the deny-list.
fn pick_style(kept: &[Scored]) -> Option<(Family, Style)> {
    let mut best: Option<(Family, Style, f32)> = None;
    for family in Family::ALL {
        for style in Style::ALL {
            let scores: Vec<f32> = kept
                .iter()
                .filter(|s| !(style.is_italic() && ITALIC_DENY_LIST.contains(s.result.ch)))
                .map(|s| s.result.score(family, style))
                .collect();
            if scores.is_empty() {
                continue;
            }
            let mean = scores.iter().sum::<f32>() / scores.len() as f32;
            if best.is_none_or(|b| mean > b.2) {
                best = Some((family, style, mean));
            }
        }
    }
    best.map(|(f, s, _)| (f, s))
}

/// x-height over cap height of the reference face for `style`.
fn x_height_ratio(matcher: &Matcher, style: Option<(Family, Style)>) -> Option<f32> {
    let (family, style) = style?;
    let renderer = matcher.renderer();
    let x = renderer.render('x', family, style)?.bounds.y_max;
    let cap = renderer.render('H', family, style)?.bounds.y_max;
    (x > 0.0 && cap > 0.0).then(|| x / cap)
}

/// Picks the x-height from the used lowercase glyphs unless they stand
/// clearly above what the cap height predicts, which is what a font of
/// small capitals looks like. Falls back to the prediction.
fn estimate_x_height(observed: Option<f32>, expected: Option<f32>, tolerance: f32) -> Option<f32> {
    match (observed, expected) {
        (Some(o), Some(e)) if e > 0.0 && (o - e) / e > tolerance => {
            debug!("lowercase tops at {:.0} against {:.0} expected; using the latter", o, e);
            Some(e)
        }
        (Some(o), _) => Some(o),
        (None, e) => e,
    }
}

/// Lowercase glyphs standing well above the x-height that look more like
/// their capital are small capitals.
fn correct_small_caps(kept: &mut [Scored], x_height: f32, matcher: &Matcher, config: &DecoderConfig) {
    let mut heights: HashMap<char, f32> = HashMap::new();
    for s in kept.iter_mut() {
        let ch = s.result.ch;
        if !SMALL_CAP_LETTERS.contains(ch) {
            continue;
        }
        let height = *heights
            .entry(ch)
            .or_insert(s.sample.image.bounds.y_max * 1000.0);
        if (height - x_height) / x_height <= config.small_caps_tolerance {
            continue;
        }
        let Some(upper) = other_case(ch) else {
            continue;
        };
        let capital = matcher.match_char(&s.sample.image, upper);
        if capital.best() > s.result.best() {
            debug!("code {} is a small capital {:?}", s.sample.code, upper);
            s.result = capital;
            s.corrected = true;
        }
    }
}
