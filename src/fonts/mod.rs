//! Per-font model: declared tables, usage tracking and the one-time decode
//! that replaces declared characters with identified ones.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::identify::{GlyphResolution, Identification};
use crate::matcher::{Family, Matcher, Style};
use crate::raster::GlyphImage;
use crate::value::PdfValue;

pub mod base;
mod builder;
mod decode;
pub mod dict;
pub mod encoding;
pub mod usage;

pub use base::{BaseFont, BaseFontRegistry, FallbackStep};
pub use dict::{CharCode, FontDict, FontKind};
use builder::{Nominal, build_nominal};
use usage::CharUsageStats;

/// Extra codes to decode besides the ones marked used.
pub type CharSet = HashSet<CharCode>;

/// Text reported for codes nothing could be resolved for.
pub const PLACEHOLDER: &str = "\u{FFFD}";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq)]
enum DecodeState {
    Pending,
    Decoding,
    Done,
    Failed(DecodeError),
}

/// Tables produced by decoding.
#[derive(Debug, Default)]
pub(crate) struct Decoded {
    /// `None` marks a mapping that identification removed.
    pub unicode: HashMap<CharCode, Option<String>>,
    pub resolutions: BTreeMap<CharCode, GlyphResolution>,
    pub code_widths: HashMap<CharCode, f32>,
    pub char_widths: HashMap<String, f32>,
    pub measured_widths: HashMap<CharCode, f32>,
    pub implicit_spaces: bool,
    pub has_descent: bool,
    pub images: HashMap<CharCode, Arc<GlyphImage>>,
    pub images_by_name: HashMap<String, Arc<GlyphImage>>,
    pub identification: Option<Identification>,
}

/// Vertical metrics and style flags in 1000-unit text space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub x_height: f32,
    pub bold: bool,
    pub italic: bool,
    pub serif: bool,
    pub fixed_pitch: bool,
}

impl FontMetrics {
    fn new(dict: Option<&FontDict>, base: &BaseFont, name_style: Style) -> FontMetrics {
        let descriptor = dict.and_then(|d| d.descriptor.as_ref());
        let nonzero = |v: f32| (v != 0.0).then_some(v);
        FontMetrics {
            ascent: descriptor.and_then(|d| nonzero(d.ascent)).unwrap_or(base.ascent()),
            descent: descriptor.and_then(|d| nonzero(d.descent)).unwrap_or(base.descent()),
            cap_height: descriptor.and_then(|d| d.cap_height).unwrap_or(base.cap_height()),
            x_height: descriptor.and_then(|d| d.x_height).unwrap_or(base.x_height()),
            bold: name_style.is_bold() || descriptor.map_or(base.is_bold(), |d| d.is_bold()),
            italic: name_style.is_italic() || descriptor.map_or(base.is_italic(), |d| d.is_italic()),
            serif: descriptor.map_or(base.is_serif(), |d| d.is_serif()),
            fixed_pitch: descriptor.map_or(base.is_fixed_pitch(), |d| d.is_fixed_pitch()),
        }
    }
}

fn style_from_name(name: &str) -> Style {
    let lower = name.to_ascii_lowercase();
    Style::from_flags(
        ["bold", "black", "heavy", "semibold"].iter().any(|w| lower.contains(w)),
        ["italic", "oblique"].iter().any(|w| lower.contains(w)),
    )
}

/// One font of a document.
///
/// Built from its dictionary with declared widths and characters, then
/// decoded at most once. Decoding blocks concurrent callers until it
/// finishes; a failed decode leaves the declared tables in effect.
pub struct FontModel {
    name: String,
    dict: Option<FontDict>,
    base: Arc<BaseFont>,
    fallback: FallbackStep,
    nominal: Nominal,
    metrics: FontMetrics,
    usage: Mutex<CharUsageStats>,
    state: Mutex<DecodeState>,
    ready: Condvar,
    decoded: OnceCell<Decoded>,
    config: Arc<DecoderConfig>,
    matcher: Arc<Matcher>,
}

impl std::fmt::Debug for FontModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontModel")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("base", &self.base.name())
            .field("state", &*lock(&self.state))
            .finish()
    }
}

/// Marks the font failed if decoding unwinds, so waiters wake up.
struct DecodeGuard<'a> {
    model: &'a FontModel,
    armed: bool,
}

impl DecodeGuard<'_> {
    fn finish(mut self, state: DecodeState) {
        self.armed = false;
        self.model.set_state(state);
    }
}

impl Drop for DecodeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("decoding {} panicked", self.model.name);
            self.model.set_state(DecodeState::Failed(DecodeError::MalformedProgram(
                "decoder panicked".into(),
            )));
        }
    }
}

impl FontModel {
    pub(crate) fn new(
        value: &PdfValue,
        registry: &BaseFontRegistry,
        config: Arc<DecoderConfig>,
        matcher: Arc<Matcher>,
    ) -> FontModel {
        let built = FontDict::from_value(value).and_then(|dict| {
            let hint = dict.descriptor.as_ref().map_or(Style::Regular, |d| {
                Style::from_flags(d.is_bold(), d.is_italic())
            });
            let (base, fallback) = registry.resolve(&dict.base_font, hint);
            let nominal = build_nominal(&dict, &base)?;
            Ok((dict, base, fallback, nominal))
        });

        let (name, dict, base, fallback, nominal, state) = match built {
            Ok((dict, base, fallback, nominal)) => (
                dict.base_font.clone(),
                Some(dict),
                base,
                fallback,
                nominal,
                DecodeState::Pending,
            ),
            Err(e) => {
                let name = value
                    .get("BaseFont")
                    .and_then(PdfValue::as_name)
                    .unwrap_or_default()
                    .to_string();
                warn!("font {}: {}", name, e);
                let (base, fallback) = registry.resolve(&name, Style::Regular);
                (name, None, base, fallback, Nominal::default(), DecodeState::Failed(e))
            }
        };
        let metrics = FontMetrics::new(dict.as_ref(), &base, style_from_name(&name));
        debug!("font {} on {} ({:?})", name, base.name(), fallback);
        FontModel {
            name,
            dict,
            base,
            fallback,
            nominal,
            metrics,
            usage: Mutex::new(CharUsageStats::new()),
            state: Mutex::new(state),
            ready: Condvar::new(),
            decoded: OnceCell::new(),
            config,
            matcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Font subtype; `None` when the dictionary was unreadable.
    pub fn kind(&self) -> Option<FontKind> {
        self.dict.as_ref().map(|d| d.kind)
    }

    pub fn dict(&self) -> Option<&FontDict> {
        self.dict.as_ref()
    }

    pub fn base_font(&self) -> &BaseFont {
        &self.base
    }

    pub fn fallback_step(&self) -> FallbackStep {
        self.fallback
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn missing_width(&self) -> f32 {
        self.nominal.missing_width
    }

    /// Average declared width.
    pub fn nominal_width(&self) -> f32 {
        self.nominal.nominal_width
    }

    pub(crate) fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub(crate) fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Snapshot of the usage statistics.
    pub fn usage(&self) -> CharUsageStats {
        lock(&self.usage).clone()
    }

    /// Splits a string operand into character codes.
    pub fn char_codes(&self, bytes: &[u8]) -> Vec<CharCode> {
        let Some(map) = &self.nominal.code_map else {
            return bytes.iter().map(|&b| b as CharCode).collect();
        };
        let mut codes = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            match map.next_code(rest) {
                Some((code, len)) => {
                    codes.push(code);
                    rest = &rest[len..];
                }
                None => {
                    debug!("{}: bytes {:02x?} outside the codespace", self.name, rest);
                    break;
                }
            }
        }
        codes
    }

    pub fn mark_used(&self, code: CharCode) {
        let separator = self
            .nominal
            .unicode
            .get(&code)
            .is_some_and(|t| !t.is_empty() && t.chars().all(char::is_whitespace));
        let mut usage = lock(&self.usage);
        if separator {
            usage.mark_separator(code);
        } else {
            usage.mark_used(code);
        }
    }

    pub fn mark_word_boundary(&self) {
        lock(&self.usage).mark_word_boundary();
    }

    /// Records text drawn in another font right before or after `code`.
    pub fn record_neighbor(&self, code: CharCode, before: Option<String>, after: Option<String>) {
        let mut usage = lock(&self.usage);
        if let Some(text) = before {
            usage.record_cross_predecessor(code, text);
        }
        if let Some(text) = after {
            usage.record_cross_successor(code, text);
        }
    }

    fn set_state(&self, state: DecodeState) {
        *lock(&self.state) = state;
        self.ready.notify_all();
    }

    /// Decodes the used glyphs (plus `charset`) and identifies them.
    ///
    /// Runs the decoder once; later and concurrent calls return the same
    /// outcome, waiting while another thread decodes.
    pub fn decode(&self, charset: Option<&CharSet>) -> Result<()> {
        {
            let mut state = lock(&self.state);
            loop {
                match &*state {
                    DecodeState::Done => return Ok(()),
                    DecodeState::Failed(e) => return Err(e.clone()),
                    DecodeState::Decoding => {
                        state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                    }
                    DecodeState::Pending => {
                        *state = DecodeState::Decoding;
                        break;
                    }
                }
            }
        }

        let guard = DecodeGuard {
            model: self,
            armed: true,
        };
        match decode::decode_font(self, charset) {
            Ok(decoded) => {
                let _ = self.decoded.set(decoded);
                guard.finish(DecodeState::Done);
                Ok(())
            }
            Err(e) => {
                warn!("{}: decoding failed: {}", self.name, e);
                guard.finish(DecodeState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Decoded tables, decoding first if that has not happened yet.
    fn decoded(&self) -> Option<&Decoded> {
        if let Some(decoded) = self.decoded.get() {
            return Some(decoded);
        }
        let _ = self.decode(None);
        self.decoded.get()
    }

    pub fn is_decoded(&self) -> bool {
        matches!(*lock(&self.state), DecodeState::Done)
    }

    /// The stored decode failure, if any.
    pub fn error(&self) -> Option<DecodeError> {
        match &*lock(&self.state) {
            DecodeState::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Declared text for `code`, without decoding.
    pub fn nominal_unicode(&self, code: CharCode) -> String {
        self.nominal
            .unicode
            .get(&code)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn resolve_unicode(&self, code: CharCode) -> String {
        if let Some(text) = self.decoded().and_then(|d| d.unicode.get(&code)) {
            return text.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
        }
        self.nominal_unicode(code)
    }

    /// How `code` was resolved by decoding.
    pub fn resolution(&self, code: CharCode) -> Option<GlyphResolution> {
        self.decoded()?.resolutions.get(&code).cloned()
    }

    fn cid(&self, code: CharCode) -> CharCode {
        self.nominal
            .code_map
            .as_ref()
            .and_then(|m| m.cid(code))
            .unwrap_or(code)
    }

    /// Width from the dictionary alone: code widths, the width array, then
    /// the base font by code.
    pub(crate) fn declared_width(&self, code: CharCode) -> Option<f32> {
        if let Some(&w) = self.nominal.code_widths.get(&code) {
            return Some(w);
        }
        let dict = self.dict.as_ref()?;
        if let Some(w) = dict.array_width(self.cid(code)) {
            return Some(w);
        }
        if dict.cid.is_none() && !dict.has_width_array() {
            return self.base.width_for_code(code);
        }
        None
    }

    /// Width of `code` in 1000-unit text space.
    pub fn resolve_width(&self, code: CharCode) -> f32 {
        let decoded = self.decoded();
        if let Some(&w) = self
            .nominal
            .code_widths
            .get(&code)
            .or_else(|| decoded.and_then(|d| d.code_widths.get(&code)))
        {
            return w;
        }
        if let Some(d) = decoded.filter(|d| d.implicit_spaces) {
            if let Some(&w) = d.measured_widths.get(&code) {
                return w;
            }
        }
        let text = decoded
            .and_then(|d| d.unicode.get(&code).cloned().flatten())
            .or_else(|| self.nominal.unicode.get(&code).cloned());
        if let Some(&w) = text
            .as_ref()
            .and_then(|t| decoded.and_then(|d| d.char_widths.get(t)))
        {
            return w;
        }
        let dict = self.dict.as_ref();
        let has_array = dict.is_some_and(|d| d.has_width_array());
        if !has_array && dict.is_some_and(|d| d.cid.is_none()) {
            if let Some(w) = text.as_deref().and_then(|t| self.base.width_for_text(t)) {
                return w;
            }
        }
        if let Some(w) = dict.and_then(|d| d.array_width(self.cid(code))) {
            return w;
        }
        if dict.is_none_or(|d| d.cid.is_none()) {
            if let Some(w) = self.base.width_for_code(code) {
                return w;
            }
        }
        self.nominal.missing_width
    }

    pub fn has_descent(&self) -> bool {
        self.decoded().is_some_and(|d| d.has_descent)
    }

    pub fn has_implicit_spaces(&self) -> bool {
        self.decoded().is_some_and(|d| d.implicit_spaces)
    }

    pub fn glyph_image(&self, code: CharCode) -> Option<Arc<GlyphImage>> {
        self.decoded()?.images.get(&code).cloned()
    }

    pub fn glyph_image_by_name(&self, name: &str) -> Option<Arc<GlyphImage>> {
        self.decoded()?.images_by_name.get(name).cloned()
    }

    /// Whether identification trusted the font's declared characters.
    pub fn is_verified(&self) -> bool {
        self.decoded()
            .and_then(|d| d.identification.as_ref())
            .is_some_and(|i| i.accepted)
    }

    /// Identified family and style, falling back to the declared flags.
    pub fn style(&self) -> (Family, Style) {
        let identified = self
            .decoded()
            .and_then(|d| d.identification.as_ref())
            .and_then(|i| i.style);
        identified.unwrap_or_else(|| {
            let family = if self.metrics.serif {
                Family::Serif
            } else {
                Family::Sans
            };
            (family, Style::from_flags(self.metrics.bold, self.metrics.italic))
        })
    }

    /// Cap height, preferring the one measured from identified glyphs.
    pub fn cap_height(&self) -> f32 {
        self.decoded()
            .and_then(|d| d.identification.as_ref())
            .and_then(|i| i.cap_height)
            .unwrap_or(self.metrics.cap_height)
    }

    pub fn x_height(&self) -> f32 {
        self.decoded()
            .and_then(|d| d.identification.as_ref())
            .and_then(|i| i.x_height)
            .unwrap_or(self.metrics.x_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ReferenceRenderer, ReferenceSet};

    fn model(value: PdfValue) -> FontModel {
        let config = Arc::new(DecoderConfig::default());
        let registry = BaseFontRegistry::new(config.fallback_fonts.clone());
        let matcher = Arc::new(Matcher::new(Arc::new(ReferenceRenderer::new(
            ReferenceSet::new(),
            config.compare_height,
        ))));
        FontModel::new(&value, &registry, config, matcher)
    }

    #[test_log::test]
    fn width_array_beats_base_font() {
        let font = model(PdfValue::dict([
            ("Subtype", PdfValue::name("Type1")),
            ("BaseFont", PdfValue::name("Helvetica")),
            ("FirstChar", PdfValue::number(65)),
            ("LastChar", PdfValue::number(65)),
            ("Widths", PdfValue::numbers([999])),
        ]));
        assert_eq!(font.resolve_width(65), 999.0);
        assert_eq!(font.resolve_width(66), 667.0);
        assert_eq!(font.resolve_unicode(65), "A");
        assert!(font.is_decoded());
    }

    #[test_log::test]
    fn standard_font_widths_follow_characters() {
        let font = model(PdfValue::dict([
            ("Subtype", PdfValue::name("Type1")),
            ("BaseFont", PdfValue::name("Helvetica")),
            (
                "Encoding",
                PdfValue::dict([(
                    "Differences",
                    PdfValue::Array(vec![PdfValue::number(1), PdfValue::name("W")]),
                )]),
            ),
        ]));
        assert_eq!(font.resolve_width(1), 944.0);
        assert_eq!(font.resolve_unicode(1), "W");
    }

    #[test_log::test]
    fn malformed_dict_fails_decode() {
        let font = model(PdfValue::dict([
            ("Subtype", PdfValue::name("Type3")),
            ("BaseFont", PdfValue::name("T3")),
        ]));
        assert!(matches!(font.decode(None), Err(DecodeError::MalformedFontDict(_))));
        assert!(matches!(font.decode(None), Err(DecodeError::MalformedFontDict(_))));
        assert!(!font.is_decoded());
        assert_eq!(font.resolve_unicode(65), PLACEHOLDER);
    }

    #[test_log::test]
    fn spaces_split_words() {
        let font = model(PdfValue::dict([
            ("Subtype", PdfValue::name("Type1")),
            ("BaseFont", PdfValue::name("Times-Roman")),
        ]));
        for &b in b"ab cd ef" {
            font.mark_used(b as CharCode);
        }
        assert_eq!(font.usage().average_word_length(), Some(2.0));
        assert_eq!(font.char_codes(b"ab"), vec![97, 98]);
    }
}
