//! Glyph outline plumbing shared by the CFF and TrueType decoders.

use euclid::{Point2D, Transform2D};

pub struct FontSpace;
pub type FontTransform = Transform2D<f32, FontSpace, FontSpace>;

/// Receiver of absolute outline segments in font units, y up.
pub trait PathSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32);
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn close_path(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn scale(&self, factor: f32) -> Bounds {
        Bounds {
            x_min: self.x_min * factor,
            y_min: self.y_min * factor,
            x_max: self.x_max * factor,
            y_max: self.y_max * factor,
        }
    }
}

/// Measures the extent of everything drawn into it. Curves are sampled, so
/// the result hugs the curve rather than its control polygon.
#[derive(Debug, Default)]
pub struct BoundsSink {
    bounds: Option<Bounds>,
    current: (f32, f32),
}

const CURVE_SAMPLES: usize = 8;

impl BoundsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn include(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let p = Bounds {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        };
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&p),
            None => p,
        });
    }
}

impl PathSink for BoundsSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.current = (x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x0, y0) = self.current;
        self.include(x0, y0);
        self.include(x, y);
        self.current = (x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x0, y0) = self.current;
        self.include(x0, y0);
        for i in 1..=CURVE_SAMPLES {
            let (px, py) = quad_point((x0, y0), (x1, y1), (x, y), i as f32 / CURVE_SAMPLES as f32);
            self.include(px, py);
        }
        self.current = (x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x0, y0) = self.current;
        self.include(x0, y0);
        for i in 1..=CURVE_SAMPLES {
            let t = i as f32 / CURVE_SAMPLES as f32;
            let (px, py) = cubic_point((x0, y0), (x1, y1), (x2, y2), (x, y), t);
            self.include(px, py);
        }
        self.current = (x, y);
    }

    fn close_path(&mut self) {}
}

pub(crate) fn quad_point(p0: (f32, f32), p1: (f32, f32), p2: (f32, f32), t: f32) -> (f32, f32) {
    let mt = 1.0 - t;
    (
        mt * mt * p0.0 + 2.0 * mt * t * p1.0 + t * t * p2.0,
        mt * mt * p0.1 + 2.0 * mt * t * p1.1 + t * t * p2.1,
    )
}

pub(crate) fn cubic_point(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
    Close,
}

/// A recorded outline that can be replayed into any sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub segments: Vec<PathSegment>,
}

impl GlyphOutline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|s| !matches!(s, PathSegment::MoveTo(..) | PathSegment::Close))
    }

    pub fn replay(&self, sink: &mut dyn PathSink) {
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(x, y) => sink.move_to(x, y),
                PathSegment::LineTo(x, y) => sink.line_to(x, y),
                PathSegment::QuadTo(x1, y1, x, y) => sink.quad_to(x1, y1, x, y),
                PathSegment::CurveTo(x1, y1, x2, y2, x, y) => sink.curve_to(x1, y1, x2, y2, x, y),
                PathSegment::Close => sink.close_path(),
            }
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut sink = BoundsSink::new();
        self.replay(&mut sink);
        sink.bounds()
    }
}

impl PathSink for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::LineTo(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.segments.push(PathSegment::QuadTo(x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.segments.push(PathSegment::CurveTo(x1, y1, x2, y2, x, y));
    }

    fn close_path(&mut self) {
        self.segments.push(PathSegment::Close);
    }
}

/// Applies an affine transform before forwarding to the inner sink.
pub struct TransformSink<'a> {
    inner: &'a mut dyn PathSink,
    transform: FontTransform,
}

impl<'a> TransformSink<'a> {
    pub fn new(inner: &'a mut dyn PathSink, transform: FontTransform) -> Self {
        Self { inner, transform }
    }

    pub fn offset(inner: &'a mut dyn PathSink, dx: f32, dy: f32) -> Self {
        Self::new(inner, Transform2D::create_translation(dx, dy))
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self.transform.transform_point(Point2D::new(x, y));
        (p.x, p.y)
    }
}

impl PathSink for TransformSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.inner.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.inner.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.inner.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.inner.curve_to(x1, y1, x2, y2, x, y);
    }

    fn close_path(&mut self) {
        self.inner.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_curve_not_control_points() {
        let mut sink = BoundsSink::new();
        sink.move_to(0., 0.);
        sink.quad_to(50., 100., 100., 0.);
        let b = sink.bounds().unwrap();
        assert_eq!(b.x_min, 0.);
        assert_eq!(b.x_max, 100.);
        // the apex of the quad is at half the control height
        assert!((b.y_max - 50.).abs() < 0.01);
    }

    #[test]
    fn move_only_outline_is_empty() {
        let mut outline = GlyphOutline::new();
        outline.move_to(10., 10.);
        outline.close_path();
        assert!(outline.is_empty());
        assert_eq!(outline.bounds(), None);
    }

    #[test]
    fn offset_sink_translates_points() {
        let mut outline = GlyphOutline::new();
        {
            let mut sink = TransformSink::offset(&mut outline, 5., -3.);
            sink.move_to(1., 1.);
            sink.line_to(2., 2.);
        }
        assert_eq!(
            outline.segments,
            vec![PathSegment::MoveTo(6., -2.), PathSegment::LineTo(7., -1.)]
        );
    }
}
