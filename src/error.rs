use std::fmt::Formatter;

use thiserror::Error;

/// Failures raised while building or decoding a font.
///
/// Glyph-level variants never abort a font: the decoder logs them and leaves
/// the glyph unmapped. Font-level variants abort only that font.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A mandatory font dictionary field is missing or has the wrong type.
    #[error("malformed font dictionary: {0}")]
    MalformedFontDict(String),

    /// The embedded program container could not be parsed at all.
    #[error("malformed font program: {0}")]
    MalformedProgram(String),

    /// A program feature this decoder does not implement.
    #[error("unsupported font program variant: {0}")]
    UnsupportedProgramVariant(String),

    /// Bytecode or outline data for one glyph is malformed.
    #[error("failed to decode glyph {glyph}: {reason}")]
    GlyphDecodeFailure { glyph: u32, reason: String },
}

impl DecodeError {
    pub(crate) fn glyph(glyph: u32, reason: impl Into<String>) -> Self {
        DecodeError::GlyphDecodeFailure {
            glyph,
            reason: reason.into(),
        }
    }

    /// Whether this failure is confined to a single glyph.
    pub fn is_glyph_level(&self) -> bool {
        matches!(
            self,
            DecodeError::GlyphDecodeFailure { .. } | DecodeError::UnsupportedProgramVariant(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors from the `lopdf` boundary adapter.
#[derive(Debug)]
pub enum ExtractError {
    IoError(std::io::Error),
    PdfError(lopdf::Error),
    DecodeError(DecodeError),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            ExtractError::IoError(e) => write!(f, "IO error: {}", e),
            ExtractError::PdfError(e) => write!(f, "PDF error: {}", e),
            ExtractError::DecodeError(e) => write!(f, "Font error: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::IoError(e)
    }
}

impl From<lopdf::Error> for ExtractError {
    fn from(e: lopdf::Error) -> Self {
        ExtractError::PdfError(e)
    }
}

impl From<DecodeError> for ExtractError {
    fn from(e: DecodeError) -> Self {
        ExtractError::DecodeError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_level_classification() {
        assert!(DecodeError::glyph(3, "stack underflow").is_glyph_level());
        assert!(DecodeError::UnsupportedProgramVariant("cmap format 12".into()).is_glyph_level());
        assert!(!DecodeError::MalformedFontDict("no FontMatrix".into()).is_glyph_level());
        assert!(!DecodeError::MalformedProgram("bad header".into()).is_glyph_level());
    }

    #[test]
    fn display_names_the_glyph() {
        let e = DecodeError::glyph(42, "unexpected end of charstring");
        assert_eq!(
            e.to_string(),
            "failed to decode glyph 42: unexpected end of charstring"
        );
    }
}
