use std::collections::HashMap;
use std::sync::Arc;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use crate::fonts::FontModel;
use crate::fonts::usage::UsageRecorder;
use crate::session::DecodeSession;
use crate::utils::*;

/// A `TJ` adjustment moving the pen right by more than this many
/// thousandths of an em separates words.
const TJ_WORD_GAP: f32 = 200.0;

/// Form XObjects nested deeper than this are not scanned.
const MAX_FORM_DEPTH: usize = 8;

/// Identity of a font resource: shared objects by id, inline dictionaries
/// by the page and resource name they appear under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum FontKey {
    Object(ObjectId),
    Inline { page: u32, name: Vec<u8> },
}

/// One model per distinct font object in a document.
pub(crate) struct FontCache<'s> {
    session: &'s DecodeSession,
    index: HashMap<FontKey, usize>,
    pub(crate) fonts: Vec<(FontKey, String, Arc<FontModel>)>,
}

impl<'s> FontCache<'s> {
    pub(crate) fn new(session: &'s DecodeSession) -> Self {
        FontCache {
            session,
            index: HashMap::new(),
            fonts: Vec::new(),
        }
    }

    pub(crate) fn load(
        &mut self,
        doc: &Document,
        fonts: &Dictionary,
        name: &[u8],
        page: u32,
    ) -> Option<Arc<FontModel>> {
        let obj = fonts.get(name).ok()?;
        let key = match obj {
            Object::Reference(id) => FontKey::Object(*id),
            _ => FontKey::Inline {
                page,
                name: name.to_vec(),
            },
        };
        if let Some(&i) = self.index.get(&key) {
            return Some(self.fonts[i].2.clone());
        }
        let model = self.session.build_font(&to_value(doc, obj));
        debug!("font resource {} -> {}", pdf_to_utf8(name), model.name());
        self.index.insert(key.clone(), self.fonts.len());
        self.fonts
            .push((key, String::from_utf8_lossy(name).into_owned(), model.clone()));
        Some(model)
    }

    /// Every font a `Font` resource dictionary names, used or not.
    pub(crate) fn load_all(&mut self, doc: &Document, fonts: &Dictionary, page: u32) {
        for (name, _) in fonts.iter() {
            self.load(doc, fonts, name, page);
        }
    }
}

/// Scans content streams for the codes each font draws and where words
/// break. Nothing is positioned.
pub(crate) struct Processor<'c, 's> {
    cache: &'c mut FontCache<'s>,
    recorder: UsageRecorder,
}

impl<'c, 's> Processor<'c, 's> {
    pub(crate) fn new(cache: &'c mut FontCache<'s>) -> Self {
        Processor {
            cache,
            recorder: UsageRecorder::new(),
        }
    }

    fn show_text(&mut self, font: Option<&Arc<FontModel>>, s: &[u8]) {
        let Some(font) = font else {
            debug!("text shown without a font");
            return;
        };
        for code in font.char_codes(s) {
            self.recorder.record(font, code);
        }
    }

    pub(crate) fn process_page(&mut self, doc: &Document, page: u32, page_id: ObjectId) {
        let empty = Dictionary::new();
        let resources = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .ok()
            .and_then(|d| get_inherited(doc, d, b"Resources"))
            .and_then(|r| r.as_dict().ok())
            .unwrap_or(&empty);
        if let Some(fonts) = maybe_get_dict(doc, resources, b"Font") {
            self.cache.load_all(doc, fonts, page);
        }
        match doc.get_page_content(page_id) {
            Ok(content) => self.process_stream(doc, &content, resources, page, 0),
            Err(e) => warn!("page {}: no content: {}", page, e),
        }
        self.recorder.word_boundary();
    }

    fn process_stream(
        &mut self,
        doc: &Document,
        content: &[u8],
        resources: &Dictionary,
        page: u32,
        depth: usize,
    ) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to decode content stream for page {}: {}. Skipping this content.",
                    page, e
                );
                return;
            }
        };
        let mut font: Option<Arc<FontModel>> = None;
        let mut font_stack = Vec::new();

        for operation in &content.operations {
            let operands = &operation.operands;
            match operation.operator.as_ref() {
                "BT" | "ET" | "Td" | "TD" | "T*" | "Tm" => {
                    self.recorder.word_boundary();
                }
                "Tf" => {
                    let loaded = operands
                        .first()
                        .and_then(|n| n.as_name().ok())
                        .zip(maybe_get_dict(doc, resources, b"Font"))
                        .and_then(|(name, fonts)| self.cache.load(doc, fonts, name, page));
                    if loaded.is_none() {
                        debug!("unresolved font in {:?}", operation);
                    }
                    font = loaded;
                }
                "Tj" => match operands.first() {
                    Some(Object::String(s, _)) => self.show_text(font.as_ref(), s),
                    _ => debug!("unexpected Tj operands {:?}", operands),
                },
                "'" | "\"" => {
                    self.recorder.word_boundary();
                    match operands.last() {
                        Some(Object::String(s, _)) => self.show_text(font.as_ref(), s),
                        _ => debug!("unexpected {} operands {:?}", operation.operator, operands),
                    }
                }
                "TJ" => match operands.first() {
                    Some(Object::Array(array)) => {
                        for e in array {
                            match e {
                                Object::String(s, _) => self.show_text(font.as_ref(), s),
                                Object::Integer(_) | Object::Real(_) => {
                                    let tj = as_num(e).unwrap_or(0.0);
                                    if tj < -TJ_WORD_GAP {
                                        trace!("adjustment {} breaks a word", tj);
                                        self.recorder.word_boundary();
                                    }
                                }
                                _ => debug!("kind of {:?}", e),
                            }
                        }
                    }
                    _ => debug!("unexpected TJ operands {:?}", operands),
                },
                "q" => font_stack.push(font.clone()),
                "Q" => match font_stack.pop() {
                    Some(f) => font = f,
                    None => warn!("No state to pop"),
                },
                "Do" => {
                    if depth >= MAX_FORM_DEPTH {
                        warn!("form XObjects nested deeper than {}", MAX_FORM_DEPTH);
                        continue;
                    }
                    let Some(xf) = operands
                        .first()
                        .and_then(|n| n.as_name().ok())
                        .zip(maybe_get_dict(doc, resources, b"XObject"))
                        .and_then(|(name, xobjects)| maybe_get_obj(doc, xobjects, name))
                        .and_then(|o| o.as_stream().ok())
                    else {
                        continue;
                    };
                    let is_form = xf
                        .dict
                        .get(b"Subtype")
                        .and_then(Object::as_name)
                        .is_ok_and(|s| s == b"Form");
                    if !is_form {
                        continue;
                    }
                    let form_resources = maybe_get_dict(doc, &xf.dict, b"Resources").unwrap_or(resources);
                    if let Some(fonts) = maybe_get_dict(doc, form_resources, b"Font") {
                        self.cache.load_all(doc, fonts, page);
                    }
                    self.recorder.word_boundary();
                    let contents = get_contents(xf);
                    self.process_stream(doc, &contents, form_resources, page, depth + 1);
                    self.recorder.word_boundary();
                }
                _ => {
                    trace!("ignored operation {:?}", operation.operator);
                }
            }
        }
    }
}
