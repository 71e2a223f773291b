//! Monochrome rasterization of glyph outlines.
//!
//! Outlines are stroked into an edge canvas and the interior is recovered by
//! sweeping concentric rings inward from the canvas border: the region
//! reachable from the border is ring 0, every region reached by crossing one
//! more edge gets the next ring number, and odd rings are ink. This copes
//! with overlapping and multi-contour outlines where a single scanline
//! parity pass would not.

use std::collections::VecDeque;

use crate::path::{Bounds, GlyphOutline, PathSink, cubic_point, quad_point};

/// Blank pixels kept around the outline so the border flood can surround it.
pub const MARGIN: usize = 1;

/// Hard cap on canvas size, whatever scale the caller asks for.
const MAX_CANVAS: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, black: bool) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = black;
        }
    }

    pub fn black_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Inclusive `(x0, y0, x1, y1)` of the black pixels.
    pub fn ink_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut out: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixels[y * self.width + x] {
                    out = Some(match out {
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                        None => (x, y, x, y),
                    });
                }
            }
        }
        out
    }

    pub fn crop(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Bitmap {
        let x1 = x1.min(self.width.saturating_sub(1));
        let y1 = y1.min(self.height.saturating_sub(1));
        if x0 > x1 || y0 > y1 {
            return Bitmap::new(0, 0);
        }
        let mut out = Bitmap::new(x1 - x0 + 1, y1 - y0 + 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                out.set(x - x0, y - y0, self.get(x, y));
            }
        }
        out
    }

    /// Area-weighted resampling; a target pixel is black when at least half
    /// of the source area it covers is black.
    pub fn resample(&self, width: usize, height: usize) -> Bitmap {
        let mut out = Bitmap::new(width, height);
        if self.width == 0 || self.height == 0 || width == 0 || height == 0 {
            return out;
        }
        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;
        for ty in 0..height {
            let fy0 = ty as f32 * sy;
            let fy1 = fy0 + sy;
            for tx in 0..width {
                let fx0 = tx as f32 * sx;
                let fx1 = fx0 + sx;
                let mut ink = 0.0;
                let mut y = fy0.floor() as usize;
                while (y as f32) < fy1 && y < self.height {
                    let cover_y = (fy1.min(y as f32 + 1.0) - fy0.max(y as f32)).max(0.0);
                    let mut x = fx0.floor() as usize;
                    while (x as f32) < fx1 && x < self.width {
                        if self.pixels[y * self.width + x] {
                            let cover_x = (fx1.min(x as f32 + 1.0) - fx0.max(x as f32)).max(0.0);
                            ink += cover_x * cover_y;
                        }
                        x += 1;
                    }
                    y += 1;
                }
                if ink * 2.0 >= sx * sy {
                    out.set(tx, ty, true);
                }
            }
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn from_ascii(rows: &[&str]) -> Bitmap {
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut out = Bitmap::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.bytes().enumerate() {
                out.set(x, y, c == b'#');
            }
        }
        out
    }
}

/// Strokes outline edges onto a canvas sized for `bounds` at `scale` pixels
/// per font unit, then fills it with the ring sweep in [`Rasterizer::finish`].
pub struct Rasterizer {
    edges: Bitmap,
    scale: f32,
    x_min: f32,
    y_max: f32,
    current: (f32, f32),
    start: (f32, f32),
    open: bool,
}

impl Rasterizer {
    pub fn new(bounds: &Bounds, scale: f32) -> Self {
        let span = |units: f32| {
            let px = (units.max(0.0) * scale).ceil();
            (px as usize).min(MAX_CANVAS) + 1 + 2 * MARGIN
        };
        Self {
            edges: Bitmap::new(span(bounds.width()), span(bounds.height())),
            scale,
            x_min: bounds.x_min,
            y_max: bounds.y_max,
            current: (0., 0.),
            start: (0., 0.),
            open: false,
        }
    }

    fn to_px(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.x_min) * self.scale + MARGIN as f32,
            (self.y_max - y) * self.scale + MARGIN as f32,
        )
    }

    /// 8-connected Bresenham between pixel centres.
    fn stroke_px(&mut self, from: (f32, f32), to: (f32, f32)) {
        let clamp = |v: f32, max: usize| v.round().clamp(0.0, max.saturating_sub(1) as f32) as i64;
        let (mut x0, mut y0) = (clamp(from.0, self.edges.width), clamp(from.1, self.edges.height));
        let (x1, y1) = (clamp(to.0, self.edges.width), clamp(to.1, self.edges.height));
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.edges.set(x0 as usize, y0 as usize, true);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn segment_to(&mut self, x: f32, y: f32) {
        let from = self.to_px(self.current.0, self.current.1);
        let to = self.to_px(x, y);
        self.stroke_px(from, to);
        self.current = (x, y);
    }

    fn flatten_steps(&self, points: &[(f32, f32)]) -> usize {
        let len: f32 = points
            .windows(2)
            .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
            .sum::<f32>()
            * self.scale;
        ((len / 2.0).ceil() as usize).clamp(2, 64)
    }

    /// Fills the stroked canvas. Black pixels are edges and odd rings.
    pub fn finish(mut self) -> Bitmap {
        if self.open {
            self.close_path();
        }
        ring_fill(&self.edges)
    }
}

impl PathSink for Rasterizer {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.open {
            self.close_path();
        }
        self.current = (x, y);
        self.start = (x, y);
        self.open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.segment_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.current;
        let steps = self.flatten_steps(&[p0, (x1, y1), (x, y)]);
        for i in 1..=steps {
            let (px, py) = quad_point(p0, (x1, y1), (x, y), i as f32 / steps as f32);
            self.segment_to(px, py);
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.current;
        let steps = self.flatten_steps(&[p0, (x1, y1), (x2, y2), (x, y)]);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let (px, py) = cubic_point(p0, (x1, y1), (x2, y2), (x, y), t);
            self.segment_to(px, py);
        }
    }

    fn close_path(&mut self) {
        if self.open && self.current != self.start {
            self.segment_to(self.start.0, self.start.1);
        }
        self.open = false;
    }
}

const UNSET: u32 = u32::MAX;

fn ring_fill(edges: &Bitmap) -> Bitmap {
    let (w, h) = (edges.width, edges.height);
    let mut out = edges.clone();
    if w == 0 || h == 0 {
        return out;
    }
    let mut ring = vec![UNSET; w * h];
    let mut walked = vec![false; w * h];

    let mut seeds: Vec<usize> = (0..w * h)
        .filter(|&i| {
            let (x, y) = (i % w, i / w);
            (x == 0 || y == 0 || x == w - 1 || y == h - 1) && !edges.pixels[i]
        })
        .collect();

    let mut level = 0u32;
    while !seeds.is_empty() {
        let region = flood(edges, &mut ring, &seeds, level);

        // Walk the edge pixels bordering this ring; the untouched regions on
        // their far side seed the next ring.
        let mut queue = VecDeque::new();
        for &i in &region {
            for n in neighbours4(i, w, h) {
                if edges.pixels[n] && !walked[n] {
                    walked[n] = true;
                    queue.push_back(n);
                }
            }
        }
        let mut next = Vec::new();
        while let Some(i) = queue.pop_front() {
            for n in neighbours4(i, w, h) {
                if !edges.pixels[n] && ring[n] == UNSET {
                    next.push(n);
                }
            }
            for n in neighbours8(i, w, h) {
                if edges.pixels[n] && !walked[n] {
                    walked[n] = true;
                    queue.push_back(n);
                }
            }
        }
        seeds = next;
        level += 1;
    }

    for (i, &r) in ring.iter().enumerate() {
        if r != UNSET && r % 2 == 1 {
            out.pixels[i] = true;
        }
    }
    out
}

fn flood(edges: &Bitmap, ring: &mut [u32], seeds: &[usize], level: u32) -> Vec<usize> {
    let (w, h) = (edges.width, edges.height);
    let mut region = Vec::new();
    let mut queue = VecDeque::new();
    for &s in seeds {
        if ring[s] == UNSET && !edges.pixels[s] {
            ring[s] = level;
            queue.push_back(s);
        }
    }
    while let Some(i) = queue.pop_front() {
        region.push(i);
        for n in neighbours4(i, w, h) {
            if ring[n] == UNSET && !edges.pixels[n] {
                ring[n] = level;
                queue.push_back(n);
            }
        }
    }
    region
}

fn neighbours4(i: usize, w: usize, h: usize) -> impl Iterator<Item = usize> {
    let (x, y) = (i % w, i / w);
    [
        (x > 0).then(|| i - 1),
        (x + 1 < w).then(|| i + 1),
        (y > 0).then(|| i - w),
        (y + 1 < h).then(|| i + w),
    ]
    .into_iter()
    .flatten()
}

fn neighbours8(i: usize, w: usize, h: usize) -> impl Iterator<Item = usize> {
    let (x, y) = ((i % w) as i64, (i / w) as i64);
    let (w, h) = (w as i64, h as i64);
    (-1..=1i64)
        .flat_map(move |dy| (-1..=1i64).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            (nx >= 0 && ny >= 0 && nx < w && ny < h).then(|| (ny * w + nx) as usize)
        })
}

/// A glyph prepared for comparison: the ink bitmap, its extent in em units
/// (y up, baseline at 0) and the baseline's row measured from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphImage {
    pub bitmap: Bitmap,
    pub bounds: Bounds,
    pub baseline: f32,
}

impl GlyphImage {
    pub fn is_blank(&self) -> bool {
        self.bitmap.black_count() == 0
    }

    /// Width over height of the ink extent.
    pub fn aspect(&self) -> f32 {
        let h = self.bounds.height();
        if h <= f32::EPSILON {
            return self.bounds.width().max(0.0) / 0.01;
        }
        self.bounds.width() / h
    }
}

/// Rasterizes `outline` at `scale` pixels per font unit, crops to ink and
/// shrinks the result to at most `compare_height` rows.
pub fn render_outline(
    outline: &GlyphOutline,
    scale: f32,
    units_per_em: f32,
    compare_height: usize,
) -> Option<GlyphImage> {
    let bounds = outline.bounds()?;
    if !(scale.is_finite() && scale > 0.0 && units_per_em > 0.0) {
        return None;
    }
    let mut rasterizer = Rasterizer::new(&bounds, scale);
    outline.replay(&mut rasterizer);
    let filled = rasterizer.finish();
    let (x0, y0, x1, y1) = filled.ink_bounds()?;
    let cropped = filled.crop(x0, y0, x1, y1);

    let margin = MARGIN as f32;
    let ink = Bounds {
        x_min: bounds.x_min + (x0 as f32 - margin) / scale,
        x_max: bounds.x_min + (x1 as f32 + 1.0 - margin) / scale,
        y_max: bounds.y_max - (y0 as f32 - margin) / scale,
        y_min: bounds.y_max - (y1 as f32 + 1.0 - margin) / scale,
    };
    let mut baseline = bounds.y_max * scale + margin - y0 as f32;

    let bitmap = if cropped.height() > compare_height && compare_height > 0 {
        let factor = compare_height as f32 / cropped.height() as f32;
        let width = ((cropped.width() as f32 * factor).round() as usize).max(1);
        baseline *= factor;
        cropped.resample(width, compare_height)
    } else {
        cropped
    };

    Some(GlyphImage {
        bitmap,
        bounds: ink.scale(1.0 / units_per_em),
        baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(outline: &mut dyn PathSink, x0: f32, y0: f32, x1: f32, y1: f32) {
        outline.move_to(x0, y0);
        outline.line_to(x1, y0);
        outline.line_to(x1, y1);
        outline.line_to(x0, y1);
        outline.close_path();
    }

    #[test]
    fn fills_a_square() {
        let bounds = Bounds {
            x_min: 0.,
            y_min: 0.,
            x_max: 20.,
            y_max: 20.,
        };
        let mut r = Rasterizer::new(&bounds, 1.0);
        square(&mut r, 0., 0., 20., 20.);
        let bitmap = r.finish();
        assert!(!bitmap.get(0, 0));
        assert!(bitmap.get(11, 11));
        assert!(bitmap.get(1, 1));
        assert!(!bitmap.get(bitmap.width() - 1, 5));
        assert_eq!(bitmap.ink_bounds(), Some((1, 1, 21, 21)));
        assert_eq!(bitmap.black_count(), 21 * 21);
    }

    #[test]
    fn nested_contour_leaves_a_hole() {
        let bounds = Bounds {
            x_min: 0.,
            y_min: 0.,
            x_max: 30.,
            y_max: 30.,
        };
        let mut r = Rasterizer::new(&bounds, 1.0);
        square(&mut r, 0., 0., 30., 30.);
        square(&mut r, 10., 10., 20., 20.);
        let bitmap = r.finish();
        // ring 1 between the contours, ring 2 inside the counter
        assert!(bitmap.get(5, 5));
        assert!(!bitmap.get(16, 16));
        assert!(bitmap.get(11, 16));
    }

    #[test]
    fn overlapping_contours_fill_union() {
        let bounds = Bounds {
            x_min: 0.,
            y_min: 0.,
            x_max: 30.,
            y_max: 20.,
        };
        let mut r = Rasterizer::new(&bounds, 1.0);
        square(&mut r, 0., 0., 20., 20.);
        square(&mut r, 10., 5., 30., 15.);
        let bitmap = r.finish();
        assert!(bitmap.get(5, 10));
        assert!(bitmap.get(26, 10));
        // inside both squares
        assert!(bitmap.get(16, 11));
    }

    #[test]
    fn touching_contour_leaves_counter_open() {
        let bounds = Bounds {
            x_min: 0.,
            y_min: 0.,
            x_max: 40.,
            y_max: 30.,
        };
        let mut r = Rasterizer::new(&bounds, 1.0);
        // an "O" with a block sharing its right edge
        square(&mut r, 0., 0., 30., 30.);
        square(&mut r, 10., 10., 20., 20.);
        square(&mut r, 30., 10., 40., 20.);
        let bitmap = r.finish();
        assert!(bitmap.get(5, 16));
        assert!(bitmap.get(36, 16));
        assert!(bitmap.get(11, 16));
        assert!(!bitmap.get(16, 16));
        assert!(!bitmap.get(12, 12));
        assert!(!bitmap.get(36, 5));
    }

    #[test]
    fn resample_keeps_solid_blocks() {
        let b = Bitmap::from_ascii(&["##..", "##..", "....", "...."]);
        let small = b.resample(2, 2);
        assert!(small.get(0, 0));
        assert!(!small.get(1, 0));
        assert!(!small.get(1, 1));
        let large = small.resample(4, 4);
        assert_eq!(large, b);
    }

    #[test]
    fn render_reports_em_bounds() {
        let mut outline = GlyphOutline::new();
        square(&mut outline, 100., 0., 600., 700.);
        let image = render_outline(&outline, 0.2, 1000., 32).unwrap();
        assert_eq!(image.bitmap.height(), 32);
        assert!((image.bounds.x_min - 0.1).abs() < 0.01);
        assert!((image.bounds.y_max - 0.7).abs() < 0.01);
        assert!(image.bounds.y_min.abs() < 0.01);
        assert!((image.baseline - 32.0).abs() < 1.0);
        assert_eq!(image.bitmap.black_count(), image.bitmap.width() * 32);
    }
}
