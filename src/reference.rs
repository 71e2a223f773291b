//! Trusted reference faces and the cache of their rendered glyphs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::matcher::{Family, Style};
use crate::path::{GlyphOutline, PathSink};
use crate::raster::{GlyphImage, render_outline};

/// Environment variable naming an extra directory of reference fonts.
pub const FONT_DIR_ENV: &str = "PDF_GLYPHS_FONT_DIR";

/// Pixels per em used when rendering reference glyphs before they are
/// shrunk to the comparison height.
const REFERENCE_EM_PX: f32 = 200.0;

const MAX_DIR_DEPTH: usize = 5;

/// A face that can draw characters for comparison.
pub trait ReferenceFont: Send + Sync {
    fn units_per_em(&self) -> f32;

    /// Draws `ch` into `sink` in font units. Returns false when the face has
    /// no glyph for it.
    fn outline(&self, ch: char, sink: &mut dyn PathSink) -> bool;

    /// Advance width in font units.
    fn advance(&self, ch: char) -> Option<f32>;
}

/// A TrueType or OpenType file parsed with `ttf-parser`.
pub struct TtfReference {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
}

impl TtfReference {
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Option<TtfReference> {
        let units_per_em = ttf_parser::Face::parse(&data, index).ok()?.units_per_em() as f32;
        Some(TtfReference {
            data,
            index,
            units_per_em,
        })
    }

    pub fn from_path(path: &Path) -> Option<TtfReference> {
        let data = std::fs::read(path)
            .map_err(|e| debug!("cannot read {}: {}", path.display(), e))
            .ok()?;
        Self::from_bytes(data, 0)
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

struct OutlineAdapter<'a>(&'a mut dyn PathSink);

impl ttf_parser::OutlineBuilder for OutlineAdapter<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.curve_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close_path();
    }
}

impl ReferenceFont for TtfReference {
    fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    fn outline(&self, ch: char, sink: &mut dyn PathSink) -> bool {
        let Some(face) = self.face() else {
            return false;
        };
        let Some(gid) = face.glyph_index(ch) else {
            return false;
        };
        face.outline_glyph(gid, &mut OutlineAdapter(sink)).is_some()
    }

    fn advance(&self, ch: char) -> Option<f32> {
        let face = self.face()?;
        face.glyph_hor_advance(face.glyph_index(ch)?).map(f32::from)
    }
}

/// Reference faces by family and style.
#[derive(Clone, Default)]
pub struct ReferenceSet {
    faces: HashMap<(Family, Style), Arc<dyn ReferenceFont>>,
}

impl std::fmt::Debug for ReferenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.faces.keys().collect();
        keys.sort();
        f.debug_struct("ReferenceSet").field("faces", &keys).finish()
    }
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: Family, style: Style, font: Arc<dyn ReferenceFont>) {
        self.faces.insert((family, style), font);
    }

    pub fn with(mut self, family: Family, style: Style, font: Arc<dyn ReferenceFont>) -> Self {
        self.insert(family, style, font);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn exact(&self, family: Family, style: Style) -> Option<&Arc<dyn ReferenceFont>> {
        self.faces.get(&(family, style))
    }

    /// The face for (family, style), falling back to the family's regular
    /// face, then the other family, then anything available.
    pub fn get(&self, family: Family, style: Style) -> Option<&Arc<dyn ReferenceFont>> {
        self.exact(family, style)
            .or_else(|| self.exact(family, Style::Regular))
            .or_else(|| self.exact(family.other(), style))
            .or_else(|| self.exact(family.other(), Style::Regular))
            .or_else(|| {
                Family::ALL
                    .iter()
                    .flat_map(|&f| Style::ALL.iter().map(move |&s| (f, s)))
                    .find_map(|(f, s)| self.exact(f, s))
            })
    }

    /// Loads the first available face for every bucket from `dirs`.
    pub fn load_system(dirs: &[PathBuf]) -> ReferenceSet {
        let files = index_font_files(dirs);
        let mut set = ReferenceSet::new();
        for family in Family::ALL {
            for style in Style::ALL {
                let found = candidate_files(family, style).iter().find_map(|name| {
                    let path = files.get(&name.to_lowercase())?;
                    let font = TtfReference::from_path(path)?;
                    debug!("reference {:?} {:?}: {}", family, style, path.display());
                    Some(font)
                });
                if let Some(font) = found {
                    set.insert(family, style, Arc::new(font));
                }
            }
        }
        if set.is_empty() {
            warn!("no reference fonts found in {:?}", dirs);
        } else {
            info!("loaded {} reference faces", set.len());
        }
        set
    }
}

/// Where reference fonts are looked for when none are configured.
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(dir) = std::env::var(FONT_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/System/Library/Fonts",
            "/Library/Fonts",
            "C:\\Windows\\Fonts",
        ]
        .iter()
        .map(PathBuf::from),
    );
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs
}

fn candidate_files(family: Family, style: Style) -> &'static [&'static str] {
    match (family, style) {
        (Family::Serif, Style::Regular) => &[
            "DejaVuSerif.ttf",
            "LiberationSerif-Regular.ttf",
            "FreeSerif.ttf",
            "NotoSerif-Regular.ttf",
            "times.ttf",
        ],
        (Family::Serif, Style::Bold) => &[
            "DejaVuSerif-Bold.ttf",
            "LiberationSerif-Bold.ttf",
            "FreeSerifBold.ttf",
            "NotoSerif-Bold.ttf",
            "timesbd.ttf",
        ],
        (Family::Serif, Style::Italic) => &[
            "DejaVuSerif-Italic.ttf",
            "LiberationSerif-Italic.ttf",
            "FreeSerifItalic.ttf",
            "NotoSerif-Italic.ttf",
            "timesi.ttf",
        ],
        (Family::Serif, Style::BoldItalic) => &[
            "DejaVuSerif-BoldItalic.ttf",
            "LiberationSerif-BoldItalic.ttf",
            "FreeSerifBoldItalic.ttf",
            "NotoSerif-BoldItalic.ttf",
            "timesbi.ttf",
        ],
        (Family::Sans, Style::Regular) => &[
            "DejaVuSans.ttf",
            "LiberationSans-Regular.ttf",
            "FreeSans.ttf",
            "NotoSans-Regular.ttf",
            "arial.ttf",
        ],
        (Family::Sans, Style::Bold) => &[
            "DejaVuSans-Bold.ttf",
            "LiberationSans-Bold.ttf",
            "FreeSansBold.ttf",
            "NotoSans-Bold.ttf",
            "arialbd.ttf",
        ],
        (Family::Sans, Style::Italic) => &[
            "DejaVuSans-Oblique.ttf",
            "LiberationSans-Italic.ttf",
            "FreeSansOblique.ttf",
            "NotoSans-Italic.ttf",
            "ariali.ttf",
        ],
        (Family::Sans, Style::BoldItalic) => &[
            "DejaVuSans-BoldOblique.ttf",
            "LiberationSans-BoldItalic.ttf",
            "FreeSansBoldOblique.ttf",
            "NotoSans-BoldItalic.ttf",
            "arialbi.ttf",
        ],
    }
}

/// Lower-cased file name to path for every font file under `dirs`; the
/// first directory wins on duplicates.
fn index_font_files(dirs: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut files = HashMap::new();
    let mut stack: Vec<(PathBuf, usize)> = dirs.iter().rev().map(|d| (d.clone(), 0)).collect();
    while let Some((dir, depth)) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if depth < MAX_DIR_DEPTH {
                    subdirs.push((path, depth + 1));
                }
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = name.to_lowercase();
            if lower.ends_with(".ttf") || lower.ends_with(".otf") {
                files.entry(lower).or_insert(path);
            }
        }
        subdirs.sort();
        stack.extend(subdirs.into_iter().rev());
    }
    files
}

/// Renders reference characters for comparison, caching every result
/// (including misses) by character, family and style.
pub struct ReferenceRenderer {
    set: ReferenceSet,
    compare_height: usize,
    cache: DashMap<(char, Family, Style), Option<Arc<GlyphImage>>>,
}

impl ReferenceRenderer {
    pub fn new(set: ReferenceSet, compare_height: usize) -> Self {
        ReferenceRenderer {
            set,
            compare_height,
            cache: DashMap::new(),
        }
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.set
    }

    pub fn has_references(&self) -> bool {
        !self.set.is_empty()
    }

    pub fn render(&self, ch: char, family: Family, style: Style) -> Option<Arc<GlyphImage>> {
        let key = (ch, family, style);
        if let Some(hit) = self.cache.get(&key) {
            return hit.value().clone();
        }
        let image = self.render_uncached(ch, family, style).map(Arc::new);
        self.cache.insert(key, image.clone());
        image
    }

    fn render_uncached(&self, ch: char, family: Family, style: Style) -> Option<GlyphImage> {
        let font = self.set.get(family, style)?;
        let mut outline = GlyphOutline::new();
        if !font.outline(ch, &mut outline) {
            return None;
        }
        let upem = font.units_per_em();
        render_outline(&outline, REFERENCE_EM_PX / upem, upem, self.compare_height)
    }

    /// Advance of `ch` in 1000-unit text space.
    pub fn advance(&self, ch: char, family: Family, style: Style) -> Option<f32> {
        let font = self.set.get(family, style)?;
        Some(font.advance(ch)? * 1000.0 / font.units_per_em())
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Block;

    impl ReferenceFont for Block {
        fn units_per_em(&self) -> f32 {
            1000.0
        }

        fn outline(&self, ch: char, sink: &mut dyn PathSink) -> bool {
            if ch != 'I' {
                return false;
            }
            sink.move_to(100.0, 0.0);
            sink.line_to(200.0, 0.0);
            sink.line_to(200.0, 700.0);
            sink.line_to(100.0, 700.0);
            sink.close_path();
            true
        }

        fn advance(&self, _ch: char) -> Option<f32> {
            Some(300.0)
        }
    }

    #[test_log::test]
    fn falls_back_through_styles_and_families() {
        let set = ReferenceSet::new().with(Family::Sans, Style::Bold, Arc::new(Block));
        assert!(set.exact(Family::Serif, Style::Bold).is_none());
        assert!(set.get(Family::Serif, Style::Bold).is_some());
        assert!(set.get(Family::Serif, Style::Italic).is_some());
        assert!(ReferenceSet::new().get(Family::Sans, Style::Regular).is_none());
    }

    #[test_log::test]
    fn renders_and_caches_misses_too() {
        let set = ReferenceSet::new().with(Family::Serif, Style::Regular, Arc::new(Block));
        let renderer = ReferenceRenderer::new(set, 32);
        let image = renderer.render('I', Family::Serif, Style::Regular).unwrap();
        assert_eq!(image.bitmap.height(), 32);
        assert!((image.bounds.y_max - 0.7).abs() < 0.01);
        assert!(renderer.render('x', Family::Serif, Style::Regular).is_none());
        renderer.render('I', Family::Serif, Style::Regular).unwrap();
        assert_eq!(renderer.cached(), 2);
        assert_eq!(renderer.advance('I', Family::Sans, Style::Bold), Some(300.0));
    }

    #[test_log::test]
    fn rejects_unparseable_fonts() {
        assert!(TtfReference::from_bytes(vec![0; 16], 0).is_none());
        assert!(TtfReference::from_path(Path::new("/nonexistent/font.ttf")).is_none());
    }

    #[test_log::test]
    fn missing_directories_give_empty_set() {
        let set = ReferenceSet::load_system(&[PathBuf::from("/nonexistent/fonts")]);
        assert!(set.is_empty());
    }
}
