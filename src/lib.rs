//! Decoding of embedded PDF fonts
//!
//! This library recovers per-code text and widths from PDF fonts whose
//! encodings cannot be trusted. Embedded Type 1, CFF and TrueType programs are
//! decoded into outlines, rasterized and compared against glyphs rendered
//! from reference fonts, replacing declared characters that do not match
//! what the glyphs actually show.

mod bytes;
mod cff;
mod config;
mod data;
mod error;
mod extract;
mod fonts;
mod identify;
mod matcher;
mod path;
mod processor;
mod raster;
mod reference;
mod session;
mod truetype;
mod type1;
mod utils;
mod value;

// Re-export error types
pub use error::{DecodeError, ExtractError, Result};

// Re-export configuration and session
pub use config::{DecoderConfig, DecoderConfigBuilder};
pub use session::DecodeSession;

// Re-export the lopdf adapter
pub use extract::{
    DocumentFont, DocumentFonts, FontExtractor, FontExtractorBuilder, from_bytes, from_path,
    from_reader,
};

// Re-export the font model
pub use fonts::base::{BaseFont, BaseFontRegistry, FallbackStep};
pub use fonts::dict::{CharCode, FontDict, FontKind};
pub use fonts::encoding::glyph_name_to_unicode;
pub use fonts::usage::{CharUsage, CharUsageStats, UsageRecorder};
pub use fonts::{CharSet, FontMetrics, FontModel, PLACEHOLDER};

// Re-export glyph decoding and identification
pub use cff::CffFont;
pub use identify::{Confidence, GlyphResolution};
pub use matcher::{Family, Matcher, Style, similarity};
pub use path::{Bounds, GlyphOutline, PathSink};
pub use raster::{Bitmap, GlyphImage, render_outline};
pub use reference::{FONT_DIR_ENV, ReferenceFont, ReferenceRenderer, ReferenceSet, TtfReference};
pub use truetype::{GlyphArena, TrueTypeFont};
pub use type1::Type1Font;
pub use value::{PdfDict, PdfStream, PdfValue};
