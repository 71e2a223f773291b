use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use lopdf::Document;
use tracing::{debug, info};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, ExtractError};
use crate::fonts::FontModel;
use crate::processor::{FontCache, FontKey, Processor};
use crate::reference::ReferenceSet;
use crate::session::DecodeSession;

/// A font found in a document together with the resource name it was first
/// seen under.
#[derive(Debug, Clone)]
pub struct DocumentFont {
    pub resource_name: String,
    /// Object number and generation, for fonts stored as indirect objects.
    pub object_id: Option<(u32, u16)>,
    pub model: Arc<FontModel>,
    /// Outcome of decoding this font.
    pub result: Result<(), DecodeError>,
}

/// Every font of a document, decoded, plus the session that built them.
#[derive(Debug)]
pub struct DocumentFonts {
    session: DecodeSession,
    fonts: Vec<DocumentFont>,
}

impl DocumentFonts {
    pub fn fonts(&self) -> &[DocumentFont] {
        &self.fonts
    }

    pub fn session(&self) -> &DecodeSession {
        &self.session
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn extract_fonts_from_doc(doc: &Document, session: DecodeSession) -> DocumentFonts {
    let mut cache = FontCache::new(&session);
    {
        let mut processor = Processor::new(&mut cache);
        for (page_num, page_id) in doc.get_pages() {
            debug!("scanning page {}", page_num);
            processor.process_page(doc, page_num, page_id);
        }
    }
    let found = std::mem::take(&mut cache.fonts);
    drop(cache);

    let models: Vec<Arc<FontModel>> = found.iter().map(|(_, _, m)| m.clone()).collect();
    let results = session.decode_all(&models);
    let fonts = found
        .into_iter()
        .zip(results)
        .map(|((key, resource_name, model), result)| DocumentFont {
            resource_name,
            object_id: match key {
                FontKey::Object(id) => Some(id),
                FontKey::Inline { .. } => None,
            },
            model,
            result,
        })
        .collect::<Vec<_>>();
    info!("{} fonts in document", fonts.len());
    DocumentFonts { session, fonts }
}

/// Builder for configuring font extraction options.
///
/// # Examples
///
/// ```no_run
/// use pdf_glyphs::{DecoderConfig, FontExtractor};
///
/// let fonts = FontExtractor::builder()
///     .password("secret")
///     .config(DecoderConfig::builder().threads(4).build())
///     .build()
///     .from_path("encrypted.pdf")?;
/// # Ok::<(), pdf_glyphs::ExtractError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FontExtractorBuilder {
    password: Option<String>,
    config: Option<DecoderConfig>,
    references: Option<ReferenceSet>,
}

impl FontExtractorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password for encrypted PDFs.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use these reference faces instead of loading system fonts.
    pub fn references(mut self, references: ReferenceSet) -> Self {
        self.references = Some(references);
        self
    }

    pub fn build(self) -> FontExtractor {
        FontExtractor {
            password: self.password,
            config: self.config.unwrap_or_default(),
            references: self.references,
        }
    }
}

/// Loads a PDF, records which codes each font draws and decodes every font.
///
/// # Examples
///
/// ```no_run
/// use pdf_glyphs::FontExtractor;
///
/// let doc = FontExtractor::default().from_path("file.pdf")?;
/// for font in doc.fonts() {
///     println!("{}: decoded {}", font.model.name(), font.model.is_decoded());
/// }
/// # Ok::<(), pdf_glyphs::ExtractError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FontExtractor {
    password: Option<String>,
    config: DecoderConfig,
    references: Option<ReferenceSet>,
}

impl FontExtractor {
    pub fn builder() -> FontExtractorBuilder {
        FontExtractorBuilder::new()
    }

    /// Extract fonts from a PDF file at the given path.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<DocumentFonts, ExtractError> {
        let mut doc = Document::load(path)?;
        self.extract_from_document(&mut doc)
    }

    /// Extract fonts from a PDF in memory.
    pub fn from_bytes(self, bytes: &[u8]) -> Result<DocumentFonts, ExtractError> {
        let mut doc = Document::load_mem(bytes)?;
        self.extract_from_document(&mut doc)
    }

    /// Extract fonts from a PDF reader.
    pub fn from_reader<R: Read>(self, mut reader: R) -> Result<DocumentFonts, ExtractError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.from_bytes(&bytes)
    }

    /// Extract fonts from an already loaded document.
    pub fn from_document(self, doc: &Document) -> DocumentFonts {
        extract_fonts_from_doc(doc, self.session())
    }

    fn session(self) -> DecodeSession {
        match self.references {
            Some(references) => DecodeSession::with_references(self.config, references),
            None => DecodeSession::new(self.config),
        }
    }

    fn extract_from_document(self, doc: &mut Document) -> Result<DocumentFonts, ExtractError> {
        if doc.is_encrypted() {
            if let Some(password) = &self.password {
                doc.decrypt(password)?;
            } else {
                doc.decrypt("")?;
            }
        }
        Ok(self.from_document(doc))
    }
}

/// Extract fonts from a PDF file at the given path using default settings.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DocumentFonts, ExtractError> {
    FontExtractor::default().from_path(path)
}

/// Extract fonts from a PDF in memory using default settings.
pub fn from_bytes(bytes: &[u8]) -> Result<DocumentFonts, ExtractError> {
    FontExtractor::default().from_bytes(bytes)
}

/// Extract fonts from a PDF reader using default settings.
pub fn from_reader<R: Read>(reader: R) -> Result<DocumentFonts, ExtractError> {
    FontExtractor::default().from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Object, Stream, dictionary};

    fn document(ops: Vec<Operation>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn extractor() -> FontExtractor {
        FontExtractor::builder()
            .config(DecoderConfig::builder().threads(1).build())
            .references(ReferenceSet::new())
            .build()
    }

    #[test_log::test]
    fn records_usage_and_word_boundaries() {
        let doc = document(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tj", vec![Object::string_literal("ab")]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("cd"),
                    Object::Integer(-400),
                    Object::string_literal("ef"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ]);
        let fonts = extractor().from_document(&doc);
        assert_eq!(fonts.len(), 1);
        let font = &fonts.fonts()[0];
        assert_eq!(font.resource_name, "F1");
        assert!(font.object_id.is_some());
        assert!(font.result.is_ok());
        let usage = font.model.usage();
        assert_eq!(usage.codes(), vec![97, 98, 99, 100, 101, 102]);
        assert_eq!(usage.word_count(), 2);
        assert_eq!(usage.average_word_length(), Some(3.0));
        assert_eq!(font.model.resolve_unicode(97), "a");
    }

    #[test_log::test]
    fn unused_fonts_are_still_listed() {
        let doc = document(vec![]);
        let fonts = extractor().from_document(&doc);
        assert_eq!(fonts.len(), 1);
        assert!(fonts.fonts()[0].model.usage().is_empty());
        assert!(fonts.fonts()[0].model.is_decoded());
    }
}
