use std::path::PathBuf;

use crate::reference::default_font_dirs;

/// Family-name fragments mapped to the standard font whose metrics stand in
/// for them. Matched case-insensitively, first hit wins.
const DEFAULT_FALLBACKS: &[(&str, &str)] = &[
    ("arial", "Helvetica"),
    ("helv", "Helvetica"),
    ("calibri", "Helvetica"),
    ("verdana", "Helvetica"),
    ("tahoma", "Helvetica"),
    ("segoe", "Helvetica"),
    ("trebuchet", "Helvetica"),
    ("myriad", "Helvetica"),
    ("frutiger", "Helvetica"),
    ("univers", "Helvetica"),
    ("futura", "Helvetica"),
    ("gill", "Helvetica"),
    ("lucida", "Helvetica"),
    ("sans", "Helvetica"),
    ("courier", "Courier"),
    ("consolas", "Courier"),
    ("mono", "Courier"),
    ("symbol", "Symbol"),
    ("dingbat", "ZapfDingbats"),
    ("times", "Times"),
    ("georgia", "Times"),
    ("garamond", "Times"),
    ("cambria", "Times"),
    ("palatino", "Times"),
    ("bookman", "Times"),
    ("century", "Times"),
    ("minion", "Times"),
    ("serif", "Times"),
];

/// Joint (minimum, mean) similarity bounds; a font is accepted when it is
/// strictly above both values of any pair.
const DEFAULT_ACCEPTANCE: &[(f32, f32)] = &[(0.5, 0.6), (0.375, 0.7), (0.25, 0.8)];

/// Tuning for font decoding and glyph identification.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub(crate) reference_dirs: Vec<PathBuf>,
    pub(crate) fallback_fonts: Vec<(String, String)>,
    pub(crate) max_glyph_px: f32,
    pub(crate) compare_height: usize,
    pub(crate) acceptance: Vec<(f32, f32)>,
    pub(crate) removal_score: f32,
    pub(crate) ocr_accept: f32,
    pub(crate) candidate_limit: usize,
    pub(crate) implicit_space_word_len: f32,
    pub(crate) implicit_space_ratio: f32,
    pub(crate) small_caps_tolerance: f32,
    pub(crate) threads: Option<usize>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            reference_dirs: default_font_dirs(),
            fallback_fonts: DEFAULT_FALLBACKS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            max_glyph_px: 300.0,
            compare_height: 32,
            acceptance: DEFAULT_ACCEPTANCE.to_vec(),
            removal_score: 0.25,
            ocr_accept: 0.8,
            candidate_limit: 12,
            implicit_space_word_len: 2.0,
            implicit_space_ratio: 1.5,
            small_caps_tolerance: 0.15,
            threads: None,
        }
    }
}

impl DecoderConfig {
    pub fn builder() -> DecoderConfigBuilder {
        DecoderConfigBuilder::new()
    }

    pub fn reference_dirs(&self) -> &[PathBuf] {
        &self.reference_dirs
    }

    pub fn compare_height(&self) -> usize {
        self.compare_height
    }

    /// Whether (min, mean) clears any of the acceptance pairs.
    pub(crate) fn accepts(&self, min: f32, mean: f32) -> bool {
        self.acceptance.iter().any(|&(m, a)| min > m && mean > a)
    }
}

/// Builder for [`DecoderConfig`].
///
/// ```
/// use pdf_glyphs::DecoderConfig;
///
/// let config = DecoderConfig::builder()
///     .reference_dir("/usr/share/fonts/truetype/dejavu")
///     .compare_height(24)
///     .threads(2)
///     .build();
/// assert_eq!(config.compare_height(), 24);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DecoderConfigBuilder {
    config: DecoderConfig,
    custom_dirs: bool,
}

impl DecoderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference font directory. The first call replaces the
    /// default search path.
    pub fn reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        if !self.custom_dirs {
            self.config.reference_dirs.clear();
            self.custom_dirs = true;
        }
        self.config.reference_dirs.push(dir.into());
        self
    }

    /// Maps fonts whose name contains `fragment` to the metrics of the
    /// standard font `base`. Checked before the built-in table.
    pub fn fallback_font(mut self, fragment: impl Into<String>, base: impl Into<String>) -> Self {
        self.config
            .fallback_fonts
            .insert(0, (fragment.into().to_lowercase(), base.into()));
        self
    }

    /// Longest glyph dimension in pixels at which fonts are rasterized.
    pub fn max_glyph_px(mut self, px: f32) -> Self {
        self.config.max_glyph_px = px;
        self
    }

    /// Row count glyph images are reduced to before comparison.
    pub fn compare_height(mut self, rows: usize) -> Self {
        self.config.compare_height = rows.max(4);
        self
    }

    pub fn acceptance(mut self, pairs: Vec<(f32, f32)>) -> Self {
        self.config.acceptance = pairs;
        self
    }

    /// Glyphs whose best match is at or below this are dropped from the
    /// font's mapping.
    pub fn removal_score(mut self, score: f32) -> Self {
        self.config.removal_score = score;
        self
    }

    /// Minimum score for a recognized character to be trusted.
    pub fn ocr_accept(mut self, score: f32) -> Self {
        self.config.ocr_accept = score;
        self
    }

    /// Number of candidates kept after the signature pre-filter.
    pub fn candidate_limit(mut self, limit: usize) -> Self {
        self.config.candidate_limit = limit.max(1);
        self
    }

    pub fn implicit_spaces(mut self, max_word_len: f32, min_width_ratio: f32) -> Self {
        self.config.implicit_space_word_len = max_word_len;
        self.config.implicit_space_ratio = min_width_ratio;
        self
    }

    pub fn small_caps_tolerance(mut self, tolerance: f32) -> Self {
        self.config.small_caps_tolerance = tolerance;
        self
    }

    /// Worker threads for batch decoding; defaults to the core count.
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads.max(1));
        self
    }

    pub fn build(self) -> DecoderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graduated_acceptance() {
        let config = DecoderConfig::default();
        assert!(config.accepts(0.55, 0.65));
        assert!(!config.accepts(0.55, 0.6));
        assert!(config.accepts(0.4, 0.75));
        assert!(!config.accepts(0.4, 0.65));
        assert!(config.accepts(0.3, 0.85));
        assert!(!config.accepts(0.25, 0.95));
    }

    #[test]
    fn custom_dirs_replace_defaults() {
        let config = DecoderConfig::builder()
            .reference_dir("/a")
            .reference_dir("/b")
            .build();
        assert_eq!(config.reference_dirs(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn custom_fallbacks_come_first() {
        let config = DecoderConfig::builder().fallback_font("Arial", "Courier").build();
        assert_eq!(config.fallback_fonts[0], ("arial".to_string(), "Courier".to_string()));
    }
}
