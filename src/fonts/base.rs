//! The 14 standard fonts and the fallback chain that maps any font name
//! onto one of them.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::data::{CORE_FONT_METRICS, CoreFontMetrics, EXTRA_NAMES, STANDARD_ENCODING};
use crate::fonts::dict::CharCode;
use crate::fonts::encoding::glyph_name_to_unicode;
use crate::matcher::Style;

/// Built standard fonts, shared by every registry in the process.
static STANDARD_FONTS: Lazy<DashMap<&'static str, Arc<BaseFont>>> = Lazy::new(DashMap::new);

const DEFAULT_FAMILY: &str = "Times";

/// Metrics of one standard font.
#[derive(Debug)]
pub struct BaseFont {
    metrics: &'static CoreFontMetrics,
    code_widths: HashMap<CharCode, f32>,
    code_names: HashMap<CharCode, &'static str>,
    name_widths: HashMap<&'static str, f32>,
    char_widths: HashMap<char, f32>,
    average_width: f32,
}

impl BaseFont {
    fn build(metrics: &'static CoreFontMetrics) -> BaseFont {
        let mut code_widths = HashMap::new();
        let mut code_names = HashMap::new();
        let mut name_widths = HashMap::new();

        for (i, &w) in metrics.ascii_widths.iter().enumerate() {
            let code = 32 + i as CharCode;
            let name = match metrics.ascii_names {
                Some(names) => Some(names[i]),
                None if metrics.symbolic => None,
                None => STANDARD_ENCODING[code as usize],
            };
            code_widths.insert(code, w as f32);
            if let Some(name) = name {
                code_names.insert(code, name);
                name_widths.insert(name, w as f32);
            }
        }
        if let Some(extra) = metrics.extra_widths {
            for (name, &w) in EXTRA_NAMES.iter().zip(extra.iter()) {
                name_widths.entry(*name).or_insert(w as f32);
            }
            for code in 128..256u32 {
                if let Some(name) = STANDARD_ENCODING[code as usize] {
                    if let Some(&w) = name_widths.get(name) {
                        code_widths.insert(code, w);
                        code_names.insert(code, name);
                    }
                }
            }
        }

        let mut char_widths = HashMap::new();
        for (name, &w) in &name_widths {
            if let Some(ch) = glyph_name_to_unicode(name).and_then(|s| single_char(&s)) {
                char_widths.insert(ch, w);
            }
        }

        let inked: Vec<f32> = metrics.ascii_widths[1..].iter().map(|&w| w as f32).collect();
        let average_width = inked.iter().sum::<f32>() / inked.len().max(1) as f32;

        BaseFont {
            metrics,
            code_widths,
            code_names,
            name_widths,
            char_widths,
            average_width,
        }
    }

    /// One of the 14 standard fonts by exact PostScript name.
    pub fn standard(name: &str) -> Option<Arc<BaseFont>> {
        CORE_FONT_METRICS
            .iter()
            .find(|m| m.name == name)
            .map(BaseFont::cached)
    }

    fn cached(metrics: &'static CoreFontMetrics) -> Arc<BaseFont> {
        if let Some(font) = STANDARD_FONTS.get(metrics.name) {
            return font.clone();
        }
        let font = Arc::new(BaseFont::build(metrics));
        STANDARD_FONTS.insert(metrics.name, font.clone());
        font
    }

    pub fn name(&self) -> &'static str {
        self.metrics.name
    }

    pub fn is_bold(&self) -> bool {
        self.metrics.bold
    }

    pub fn is_italic(&self) -> bool {
        self.metrics.italic
    }

    pub fn is_serif(&self) -> bool {
        self.metrics.serif
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.metrics.fixed_pitch
    }

    pub fn is_symbolic(&self) -> bool {
        self.metrics.symbolic
    }

    pub fn ascent(&self) -> f32 {
        self.metrics.ascent
    }

    pub fn descent(&self) -> f32 {
        self.metrics.descent
    }

    pub fn cap_height(&self) -> f32 {
        self.metrics.cap_height
    }

    pub fn x_height(&self) -> f32 {
        self.metrics.x_height
    }

    pub fn average_width(&self) -> f32 {
        self.average_width
    }

    pub fn default_width(&self) -> f32 {
        self.metrics.default_width as f32
    }

    /// Width of `code` in the font's built-in encoding.
    pub fn width_for_code(&self, code: CharCode) -> Option<f32> {
        self.code_widths.get(&code).copied()
    }

    /// Glyph name of `code` in the font's built-in encoding.
    pub fn glyph_name(&self, code: CharCode) -> Option<&'static str> {
        self.code_names.get(&code).copied()
    }

    pub fn width_for_name(&self, name: &str) -> Option<f32> {
        self.name_widths.get(name).copied()
    }

    /// Width of the glyph for `ch`; accented letters fall back to their base
    /// letter.
    pub fn width_for_char(&self, ch: char) -> Option<f32> {
        if let Some(&w) = self.char_widths.get(&ch) {
            return Some(w);
        }
        let base = std::iter::once(ch).nfd().next().filter(|&b| b != ch)?;
        self.char_widths.get(&base).copied()
    }

    pub fn width_for_text(&self, text: &str) -> Option<f32> {
        single_char(text).and_then(|ch| self.width_for_char(ch))
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

/// How a font name was mapped onto a standard font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStep {
    Exact,
    SubsetTag,
    StyleSuffix,
    FamilyTable,
    Default,
}

fn strip_subset_tag(name: &str) -> Option<&str> {
    let (tag, rest) = name.split_once('+')?;
    (tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase())).then_some(rest)
}

fn split_style(name: &str) -> Option<(&str, &str)> {
    let i = name.find([',', '-'])?;
    Some((&name[..i], &name[i + 1..]))
}

fn style_of(suffix: &str) -> Style {
    let s = suffix.to_ascii_lowercase();
    let bold = ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|w| s.contains(w));
    let italic = ["italic", "oblique", "slanted"].iter().any(|w| s.contains(w));
    Style::from_flags(bold, italic)
}

/// Standard font name for a family and style.
fn compose(family: &str, style: Style) -> Option<&'static str> {
    Some(match (family, style) {
        ("Helvetica", Style::Regular) => "Helvetica",
        ("Helvetica", Style::Bold) => "Helvetica-Bold",
        ("Helvetica", Style::Italic) => "Helvetica-Oblique",
        ("Helvetica", Style::BoldItalic) => "Helvetica-BoldOblique",
        ("Times", Style::Regular) => "Times-Roman",
        ("Times", Style::Bold) => "Times-Bold",
        ("Times", Style::Italic) => "Times-Italic",
        ("Times", Style::BoldItalic) => "Times-BoldItalic",
        ("Courier", Style::Regular) => "Courier",
        ("Courier", Style::Bold) => "Courier-Bold",
        ("Courier", Style::Italic) => "Courier-Oblique",
        ("Courier", Style::BoldItalic) => "Courier-BoldOblique",
        ("Symbol", _) => "Symbol",
        ("ZapfDingbats", _) => "ZapfDingbats",
        _ => return None,
    })
}

/// Maps font names onto standard fonts, caching each resolution.
#[derive(Debug)]
pub struct BaseFontRegistry {
    fallbacks: Vec<(String, String)>,
    resolved: DashMap<(String, Style), (Arc<BaseFont>, FallbackStep)>,
}

impl BaseFontRegistry {
    pub fn new(fallbacks: Vec<(String, String)>) -> Self {
        BaseFontRegistry {
            fallbacks,
            resolved: DashMap::new(),
        }
    }

    /// Resolves `name`, with `hint` supplying bold/italic flags the name
    /// itself does not carry.
    pub fn resolve(&self, name: &str, hint: Style) -> (Arc<BaseFont>, FallbackStep) {
        let key = (name.to_string(), hint);
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }
        let resolved = self.resolve_uncached(name, hint);
        debug!("base font {} -> {} ({:?})", name, resolved.0.name(), resolved.1);
        self.resolved.insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, name: &str, hint: Style) -> (Arc<BaseFont>, FallbackStep) {
        if let Some(font) = BaseFont::standard(name) {
            return (font, FallbackStep::Exact);
        }
        let untagged = strip_subset_tag(name);
        if let Some(font) = untagged.and_then(BaseFont::standard) {
            return (font, FallbackStep::SubsetTag);
        }
        let name = untagged.unwrap_or(name);

        let mut style = hint;
        if let Some((family, suffix)) = split_style(name) {
            let s = style_of(suffix);
            style = Style::from_flags(s.is_bold() || hint.is_bold(), s.is_italic() || hint.is_italic());
            let standard = compose(family, style).or_else(|| match family {
                "Arial" => compose("Helvetica", style),
                "TimesNewRoman" => compose("Times", style),
                "CourierNew" => compose("Courier", style),
                _ => None,
            });
            if let Some(font) = standard.and_then(BaseFont::standard) {
                return (font, FallbackStep::StyleSuffix);
            }
        }

        let lower = name.to_ascii_lowercase();
        let family = self
            .fallbacks
            .iter()
            .find(|(fragment, _)| lower.contains(fragment.as_str()))
            .map(|(_, family)| family.as_str());
        if let Some(font) = family
            .and_then(|f| compose(f, style).or(Some(f)))
            .and_then(BaseFont::standard)
        {
            return (font, FallbackStep::FamilyTable);
        }

        let default = compose(DEFAULT_FAMILY, style)
            .and_then(BaseFont::standard)
            .unwrap_or_else(|| BaseFont::cached(&CORE_FONT_METRICS[4]));
        (default, FallbackStep::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;

    fn registry() -> BaseFontRegistry {
        BaseFontRegistry::new(DecoderConfig::default().fallback_fonts)
    }

    #[test_log::test]
    fn standard_widths() {
        let helv = BaseFont::standard("Helvetica").unwrap();
        assert_eq!(helv.width_for_code(65), Some(667.0));
        assert_eq!(helv.width_for_char('A'), Some(667.0));
        assert_eq!(helv.width_for_name("endash"), Some(556.0));
        assert_eq!(helv.glyph_name(39), Some("quoteright"));
        assert!(!helv.is_serif());
    }

    #[test_log::test]
    fn accented_letters_borrow_base_width() {
        let times = BaseFont::standard("Times-Roman").unwrap();
        assert_eq!(times.width_for_char('é'), times.width_for_char('e'));
        assert_eq!(times.width_for_char('Å'), times.width_for_char('A'));
    }

    #[test_log::test]
    fn fallback_chain() {
        let r = registry();
        let (f, step) = r.resolve("Courier-Bold", Style::Regular);
        assert_eq!((f.name(), step), ("Courier-Bold", FallbackStep::Exact));

        let (f, step) = r.resolve("ABCDEF+Helvetica-Oblique", Style::Regular);
        assert_eq!((f.name(), step), ("Helvetica-Oblique", FallbackStep::SubsetTag));

        let (f, step) = r.resolve("Arial,BoldItalic", Style::Regular);
        assert_eq!((f.name(), step), ("Helvetica-BoldOblique", FallbackStep::StyleSuffix));

        let (f, step) = r.resolve("QWERTY+GeorgiaPro", Style::Bold);
        assert_eq!((f.name(), step), ("Times-Bold", FallbackStep::FamilyTable));

        let (f, step) = r.resolve("Zebrawood", Style::Italic);
        assert_eq!((f.name(), step), ("Times-Italic", FallbackStep::Default));
    }

    #[test_log::test]
    fn configured_fallbacks_take_precedence() {
        let config = DecoderConfig::builder().fallback_font("Zebra", "Courier").build();
        let r = BaseFontRegistry::new(config.fallback_fonts);
        assert_eq!(r.resolve("Zebrawood", Style::Regular).0.name(), "Courier");
    }
}
