//! Shape comparison between decoded glyphs and reference renderings.

use std::sync::Arc;

use tracing::trace;

use crate::raster::{Bitmap, GlyphImage};
use crate::reference::ReferenceRenderer;

const GRID: usize = 24;
const PLACEMENT_SPAN: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Serif,
    Sans,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Serif, Family::Sans];

    fn index(self) -> usize {
        self as usize
    }

    pub fn other(self) -> Family {
        match self {
            Family::Serif => Family::Sans,
            Family::Sans => Family::Serif,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Style {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Regular, Style::Bold, Style::Italic, Style::BoldItalic];

    pub fn from_flags(bold: bool, italic: bool) -> Style {
        match (bold, italic) {
            (false, false) => Style::Regular,
            (true, false) => Style::Bold,
            (false, true) => Style::Italic,
            (true, true) => Style::BoldItalic,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Style::Bold | Style::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, Style::Italic | Style::BoldItalic)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Similarity of one glyph against one character in every family and style.
#[derive(Debug, Clone, PartialEq)]
pub struct CharMatchResult {
    pub ch: char,
    pub scores: [[f32; 4]; 2],
}

impl CharMatchResult {
    pub fn score(&self, family: Family, style: Style) -> f32 {
        self.scores[family.index()][style.index()]
    }

    pub fn best(&self) -> f32 {
        self.scores.iter().flatten().copied().fold(0.0, f32::max)
    }

    /// Highest score of `style` in either family.
    pub fn style_score(&self, style: Style) -> f32 {
        Family::ALL
            .iter()
            .map(|&f| self.score(f, style))
            .fold(0.0, f32::max)
    }

    /// Best bucket as (family, style, score); ties keep the earlier bucket.
    pub fn best_bucket(&self) -> (Family, Style, f32) {
        let mut best = (Family::Serif, Style::Regular, -1.0);
        for family in Family::ALL {
            for style in Style::ALL {
                let s = self.score(family, style);
                if s > best.2 {
                    best = (family, style, s);
                }
            }
        }
        best
    }
}

/// Similarity of two glyph images in [0, 1].
///
/// Shape overlap on a normalized grid, weighted by how well the aspect
/// ratios and the vertical placement against the baseline agree.
pub fn similarity(a: &GlyphImage, b: &GlyphImage) -> f32 {
    if a.is_blank() || b.is_blank() {
        return 0.0;
    }
    let ga = a.bitmap.resample(GRID, GRID);
    let gb = b.bitmap.resample(GRID, GRID);
    let shape = soft_f1(&ga, &gb);

    let (aa, ab) = (a.aspect().max(0.0), b.aspect().max(0.0));
    let aspect = (aa.min(ab) + 0.1) / (aa.max(ab) + 0.1);

    let drift = (a.bounds.y_max - b.bounds.y_max).abs() + (a.bounds.y_min - b.bounds.y_min).abs();
    let placement = (1.0 - drift / PLACEMENT_SPAN).max(0.0);

    (shape * (0.6 + 0.2 * aspect + 0.2 * placement)).clamp(0.0, 1.0)
}

/// F1 of black pixels where a pixel counts as matched if the other bitmap
/// has ink within one cell.
fn soft_f1(a: &Bitmap, b: &Bitmap) -> f32 {
    let precision = covered(a, b);
    let recall = covered(b, a);
    if precision + recall <= 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

fn covered(from: &Bitmap, to: &Bitmap) -> f32 {
    let mut total = 0usize;
    let mut hit = 0usize;
    for y in 0..from.height() {
        for x in 0..from.width() {
            if !from.get(x, y) {
                continue;
            }
            total += 1;
            if near_ink(to, x, y) {
                hit += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        hit as f32 / total as f32
    }
}

fn near_ink(bitmap: &Bitmap, x: usize, y: usize) -> bool {
    let (w, h) = (bitmap.width(), bitmap.height());
    for ny in y.saturating_sub(1)..=(y + 1).min(h.saturating_sub(1)) {
        for nx in x.saturating_sub(1)..=(x + 1).min(w.saturating_sub(1)) {
            if bitmap.get(nx, ny) {
                return true;
            }
        }
    }
    false
}

/// Cheap descriptor used to rank candidates before full rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSignature {
    aspect: f32,
    density: f32,
    zones: [f32; 9],
    top: f32,
    bottom: f32,
}

impl ShapeSignature {
    pub fn of(image: &GlyphImage) -> ShapeSignature {
        let bitmap = &image.bitmap;
        let (w, h) = (bitmap.width().max(1), bitmap.height().max(1));
        let mut zones = [0.0; 9];
        let mut counts = [0usize; 9];
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                let zone = (y * 3 / h).min(2) * 3 + (x * 3 / w).min(2);
                counts[zone] += 1;
                if bitmap.get(x, y) {
                    zones[zone] += 1.0;
                }
            }
        }
        for (z, n) in zones.iter_mut().zip(counts) {
            *z = if n == 0 { 0.0 } else { *z / n as f32 };
        }
        ShapeSignature {
            aspect: image.aspect(),
            density: bitmap.black_count() as f32 / (w * h) as f32,
            zones,
            top: image.bounds.y_max,
            bottom: image.bounds.y_min,
        }
    }

    pub fn distance(&self, other: &ShapeSignature) -> f32 {
        let (a, b) = (self.aspect.max(0.0), other.aspect.max(0.0));
        let aspect = 1.0 - (a.min(b) + 0.1) / (a.max(b) + 0.1);
        let zones: f32 = self
            .zones
            .iter()
            .zip(&other.zones)
            .map(|(x, y)| (x - y).abs())
            .sum::<f32>()
            / 9.0;
        2.0 * aspect
            + (self.density - other.density).abs()
            + zones
            + (self.top - other.top).abs()
            + (self.bottom - other.bottom).abs()
    }
}

/// Scores decoded glyphs against rendered reference characters.
pub struct Matcher {
    renderer: Arc<ReferenceRenderer>,
}

impl Matcher {
    pub fn new(renderer: Arc<ReferenceRenderer>) -> Self {
        Matcher { renderer }
    }

    pub fn renderer(&self) -> &ReferenceRenderer {
        &self.renderer
    }

    pub fn has_references(&self) -> bool {
        self.renderer.has_references()
    }

    /// Whether some reference face draws `ch`.
    pub fn can_render(&self, ch: char) -> bool {
        Family::ALL
            .iter()
            .any(|&f| self.renderer.render(ch, f, Style::Regular).is_some())
    }

    /// Scores `image` against `predicted` in every family and style bucket.
    pub fn match_char(&self, image: &GlyphImage, predicted: char) -> CharMatchResult {
        let mut scores = [[0.0; 4]; 2];
        for family in Family::ALL {
            for style in Style::ALL {
                if let Some(reference) = self.renderer.render(predicted, family, style) {
                    scores[family.index()][style.index()] = similarity(image, &reference);
                }
            }
        }
        trace!("match {:?}: {:?}", predicted, scores);
        CharMatchResult {
            ch: predicted,
            scores,
        }
    }

    /// Ranks `candidates` by signature distance, fully scores the closest
    /// `limit` of them and returns those results best first.
    pub fn recognize(
        &self,
        image: &GlyphImage,
        candidates: &[char],
        limit: usize,
    ) -> Vec<CharMatchResult> {
        let signature = ShapeSignature::of(image);
        let mut ranked: Vec<(f32, char)> = candidates
            .iter()
            .filter_map(|&ch| {
                let distance = Family::ALL
                    .iter()
                    .filter_map(|&f| self.renderer.render(ch, f, Style::Regular))
                    .map(|r| signature.distance(&ShapeSignature::of(&r)))
                    .fold(f32::INFINITY, f32::min);
                distance.is_finite().then_some((distance, ch))
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(limit.max(1));

        let mut results: Vec<CharMatchResult> = ranked
            .into_iter()
            .map(|(_, ch)| self.match_char(image, ch))
            .collect();
        results.sort_by(|a, b| b.best().total_cmp(&a.best()).then(a.ch.cmp(&b.ch)));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Bounds;

    fn image(rows: &[&str], bounds: Bounds) -> GlyphImage {
        GlyphImage {
            bitmap: Bitmap::from_ascii(rows),
            bounds,
            baseline: rows.len() as f32,
        }
    }

    fn cap_bounds(width: f32) -> Bounds {
        Bounds {
            x_min: 0.0,
            y_min: 0.0,
            x_max: width,
            y_max: 0.7,
        }
    }

    const L: &[&str] = &["#...", "#...", "#...", "#...", "####"];
    const T: &[&str] = &["####", ".#..", ".#..", ".#..", ".#.."];

    #[test_log::test]
    fn identical_images_score_one() {
        let a = image(L, cap_bounds(0.56));
        let s = similarity(&a, &a);
        assert!(s > 0.999 && s <= 1.0, "{}", s);
    }

    #[test_log::test]
    fn different_shapes_score_lower() {
        let l = image(L, cap_bounds(0.56));
        let t = image(T, cap_bounds(0.56));
        let s = similarity(&l, &t);
        assert!((0.0..0.9).contains(&s), "{}", s);
    }

    #[test_log::test]
    fn placement_and_aspect_penalize() {
        let cap = image(L, cap_bounds(0.56));
        let low = image(
            L,
            Bounds {
                x_min: 0.0,
                y_min: -0.3,
                x_max: 0.56,
                y_max: 0.4,
            },
        );
        let wide = image(L, cap_bounds(2.0));
        assert!(similarity(&cap, &low) < 0.85);
        assert!(similarity(&cap, &wide) < similarity(&cap, &cap));
    }

    #[test_log::test]
    fn blank_scores_zero() {
        let blank = image(&["...."], cap_bounds(0.5));
        let l = image(L, cap_bounds(0.56));
        assert_eq!(similarity(&blank, &l), 0.0);
    }

    #[test_log::test]
    fn best_bucket_prefers_earliest_on_tie() {
        let mut r = CharMatchResult {
            ch: 'a',
            scores: [[0.5; 4]; 2],
        };
        assert_eq!(r.best_bucket(), (Family::Serif, Style::Regular, 0.5));
        r.scores[1][2] = 0.9;
        assert_eq!(r.best_bucket(), (Family::Sans, Style::Italic, 0.9));
        assert_eq!(r.style_score(Style::Italic), 0.9);
        assert_eq!(r.best(), 0.9);
    }

    #[test_log::test]
    fn signature_distance_is_zero_for_self() {
        let l = image(L, cap_bounds(0.56));
        let t = image(T, cap_bounds(0.56));
        let sl = ShapeSignature::of(&l);
        assert_eq!(sl.distance(&sl), 0.0);
        assert!(sl.distance(&ShapeSignature::of(&t)) > 0.0);
    }
}
