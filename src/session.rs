use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::fonts::{BaseFontRegistry, FontModel};
use crate::matcher::Matcher;
use crate::reference::{ReferenceRenderer, ReferenceSet};
use crate::value::PdfValue;

/// Owns the registries fonts are built against: configuration, base-font
/// fallback table, reference renderer and matcher.
///
/// # Examples
///
/// ```
/// use pdf_glyphs::{DecodeSession, DecoderConfig, PdfValue, ReferenceSet};
///
/// let session = DecodeSession::with_references(DecoderConfig::default(), ReferenceSet::new());
/// let font = session.build_font(&PdfValue::dict([
///     ("Subtype", PdfValue::name("Type1")),
///     ("BaseFont", PdfValue::name("Helvetica")),
/// ]));
/// font.mark_used(65);
/// assert_eq!(font.resolve_unicode(65), "A");
/// assert_eq!(font.resolve_width(65), 667.0);
/// ```
pub struct DecodeSession {
    config: Arc<DecoderConfig>,
    base_fonts: BaseFontRegistry,
    matcher: Arc<Matcher>,
}

impl std::fmt::Debug for DecodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSession")
            .field("config", &self.config)
            .field("references", self.matcher.renderer().references())
            .finish()
    }
}

impl DecodeSession {
    /// Creates a session, loading reference faces from the configured
    /// directories.
    pub fn new(config: DecoderConfig) -> Self {
        let references = ReferenceSet::load_system(config.reference_dirs());
        Self::with_references(config, references)
    }

    /// Creates a session with an explicit set of reference faces. An empty
    /// set disables identification; fonts then keep their declared tables.
    pub fn with_references(config: DecoderConfig, references: ReferenceSet) -> Self {
        let renderer = ReferenceRenderer::new(references, config.compare_height());
        let base_fonts = BaseFontRegistry::new(config.fallback_fonts.clone());
        DecodeSession {
            config: Arc::new(config),
            base_fonts,
            matcher: Arc::new(Matcher::new(Arc::new(renderer))),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Builds the model for one font dictionary. Never fails: a malformed
    /// dictionary yields a model whose `decode` reports the problem.
    pub fn build_font(&self, dict: &PdfValue) -> Arc<FontModel> {
        Arc::new(FontModel::new(
            dict,
            &self.base_fonts,
            self.config.clone(),
            self.matcher.clone(),
        ))
    }

    /// Decodes every font, one font per worker.
    pub fn decode_all(&self, fonts: &[Arc<FontModel>]) -> Vec<Result<(), DecodeError>> {
        let decode = || -> Vec<Result<(), DecodeError>> {
            fonts.par_iter().map(|font| font.decode(None)).collect()
        };
        let results = match self.config.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(decode),
                Err(e) => {
                    warn!("cannot start {} decode threads: {}", threads, e);
                    decode()
                }
            },
            None => decode(),
        };
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("decoded {} fonts, {} failed", fonts.len(), failed);
        for (font, result) in fonts.iter().zip(&results) {
            if let Err(e) = result {
                debug!("{}: {}", font.name(), e);
            }
        }
        results
    }
}
