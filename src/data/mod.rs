mod cff_strings;
mod core_fonts;
mod encodings;
mod glyphnames;

pub(crate) use cff_strings::CFF_STANDARD_STRINGS;
pub(crate) use core_fonts::{CORE_FONT_METRICS, CoreFontMetrics, EXTRA_NAMES};
pub(crate) use encodings::*;
pub(crate) use glyphnames::GLYPH_NAMES;
