// Built-in metrics for the 14 standard PDF fonts.
//
// Widths cover codes 32..=126 of each font's built-in encoding plus a short
// list of common non-ASCII glyphs. Accented letters borrow the width of their
// base letter (see `fonts::base`).

#[derive(Debug)]
pub(crate) struct CoreFontMetrics {
    pub name: &'static str,
    pub bold: bool,
    pub italic: bool,
    pub serif: bool,
    pub fixed_pitch: bool,
    pub symbolic: bool,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub x_height: f32,
    /// Widths for codes 32..=126.
    pub ascii_widths: &'static [u16; 95],
    /// Glyph names for codes 32..=126 when the built-in encoding is not
    /// StandardEncoding.
    pub ascii_names: Option<&'static [&'static str; 95]>,
    /// Widths parallel to `EXTRA_NAMES`.
    pub extra_widths: Option<&'static [u16; 17]>,
    pub default_width: u16,
}

pub(crate) const EXTRA_NAMES: [&str; 17] = [
    "endash",
    "emdash",
    "bullet",
    "quotedblleft",
    "quotedblright",
    "quotesingle",
    "grave",
    "fi",
    "fl",
    "ellipsis",
    "dagger",
    "exclamdown",
    "questiondown",
    "quotesinglbase",
    "quotedblbase",
    "guillemotleft",
    "guillemotright",
];

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 222,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 278,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 333, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
    667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
    500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 832,
    667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889,
    722, 722, 611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611,
    333, 278, 333, 570, 500, 333,
    500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778,
    556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389,
    348, 220, 348, 570,
];

const COURIER: [u16; 95] = [600; 95];

#[rustfmt::skip]
const SYMBOL: [u16; 95] = [
    250, 333, 713, 500, 549, 833, 778, 439, 333, 333, 500, 549, 250, 549, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 549, 549, 549, 444, 549,
    722, 667, 722, 612, 611, 763, 603, 722, 333, 631, 722, 686, 889,
    722, 722, 768, 741, 556, 592, 611, 690, 439, 768, 645, 795, 611,
    333, 863, 333, 658, 500, 500,
    631, 549, 549, 494, 439, 521, 411, 603, 329, 603, 549, 549, 576,
    521, 549, 549, 521, 549, 603, 439, 576, 713, 686, 493, 686, 494,
    480, 200, 480, 549,
];

#[rustfmt::skip]
const SYMBOL_NAMES: [&str; 95] = [
    "space", "exclam", "universal", "numbersign", "existential", "percent", "ampersand",
    "suchthat", "parenleft", "parenright", "asteriskmath", "plus", "comma", "minus",
    "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question",
    "congruent", "Alpha", "Beta", "Chi", "Delta", "Epsilon", "Phi", "Gamma", "Eta",
    "Iota", "theta1", "Kappa", "Lambda", "Mu", "Nu", "Omicron", "Pi", "Theta", "Rho",
    "Sigma", "Tau", "Upsilon", "sigma1", "Omega", "Xi", "Psi", "Zeta", "bracketleft",
    "therefore", "bracketright", "perpendicular", "underscore", "radicalex", "alpha",
    "beta", "chi", "delta", "epsilon", "phi", "gamma", "eta", "iota", "phi1", "kappa",
    "lambda", "mu", "nu", "omicron", "pi", "theta", "rho", "sigma", "tau", "upsilon",
    "omega1", "omega", "xi", "psi", "zeta", "braceleft", "bar", "braceright", "similar",
];

// Dingbat advances vary between 0.5 and 1 em; an average stands in for them.
#[rustfmt::skip]
const ZAPF_DINGBATS: [u16; 95] = {
    let mut widths = [788; 95];
    widths[0] = 278;
    widths
};

#[rustfmt::skip]
const HELVETICA_EXTRA: [u16; 17] = [556, 1000, 350, 333, 333, 191, 333, 500, 500, 1000, 556, 333, 611, 222, 333, 556, 556];
#[rustfmt::skip]
const HELVETICA_BOLD_EXTRA: [u16; 17] = [556, 1000, 350, 500, 500, 238, 333, 611, 611, 1000, 556, 333, 611, 278, 500, 556, 556];
#[rustfmt::skip]
const TIMES_ROMAN_EXTRA: [u16; 17] = [500, 1000, 350, 444, 444, 180, 333, 556, 556, 1000, 500, 333, 444, 333, 444, 500, 500];
#[rustfmt::skip]
const TIMES_BOLD_EXTRA: [u16; 17] = [500, 1000, 350, 500, 500, 278, 333, 556, 556, 1000, 500, 333, 500, 333, 500, 500, 500];
#[rustfmt::skip]
const TIMES_ITALIC_EXTRA: [u16; 17] = [500, 889, 350, 556, 556, 214, 333, 500, 500, 889, 500, 389, 500, 333, 556, 500, 500];
#[rustfmt::skip]
const TIMES_BOLD_ITALIC_EXTRA: [u16; 17] = [500, 1000, 350, 500, 500, 278, 333, 556, 556, 1000, 500, 389, 500, 333, 500, 500, 500];
const COURIER_EXTRA: [u16; 17] = [600; 17];

macro_rules! core_font {
    ($name:expr, $bold:expr, $italic:expr, $serif:expr, $fixed:expr,
     [$ascent:expr, $descent:expr, $cap:expr, $x:expr], $widths:expr, $extra:expr) => {
        CoreFontMetrics {
            name: $name,
            bold: $bold,
            italic: $italic,
            serif: $serif,
            fixed_pitch: $fixed,
            symbolic: false,
            ascent: $ascent,
            descent: $descent,
            cap_height: $cap,
            x_height: $x,
            ascii_widths: $widths,
            ascii_names: None,
            extra_widths: Some($extra),
            default_width: 0,
        }
    };
}

pub(crate) const CORE_FONT_METRICS: [CoreFontMetrics; 14] = [
    core_font!("Helvetica", false, false, false, false, [718., -207., 718., 523.], &HELVETICA, &HELVETICA_EXTRA),
    core_font!("Helvetica-Bold", true, false, false, false, [718., -207., 718., 532.], &HELVETICA_BOLD, &HELVETICA_BOLD_EXTRA),
    core_font!("Helvetica-Oblique", false, true, false, false, [718., -207., 718., 523.], &HELVETICA, &HELVETICA_EXTRA),
    core_font!("Helvetica-BoldOblique", true, true, false, false, [718., -207., 718., 532.], &HELVETICA_BOLD, &HELVETICA_BOLD_EXTRA),
    core_font!("Times-Roman", false, false, true, false, [683., -217., 662., 450.], &TIMES_ROMAN, &TIMES_ROMAN_EXTRA),
    core_font!("Times-Bold", true, false, true, false, [683., -217., 676., 461.], &TIMES_BOLD, &TIMES_BOLD_EXTRA),
    core_font!("Times-Italic", false, true, true, false, [683., -217., 653., 441.], &TIMES_ITALIC, &TIMES_ITALIC_EXTRA),
    core_font!("Times-BoldItalic", true, true, true, false, [683., -217., 669., 462.], &TIMES_BOLD_ITALIC, &TIMES_BOLD_ITALIC_EXTRA),
    core_font!("Courier", false, false, true, true, [629., -157., 562., 426.], &COURIER, &COURIER_EXTRA),
    core_font!("Courier-Bold", true, false, true, true, [629., -157., 562., 439.], &COURIER, &COURIER_EXTRA),
    core_font!("Courier-Oblique", false, true, true, true, [629., -157., 562., 426.], &COURIER, &COURIER_EXTRA),
    core_font!("Courier-BoldOblique", true, true, true, true, [629., -157., 562., 439.], &COURIER, &COURIER_EXTRA),
    CoreFontMetrics {
        name: "Symbol",
        bold: false,
        italic: false,
        serif: true,
        fixed_pitch: false,
        symbolic: true,
        ascent: 1010.,
        descent: -293.,
        cap_height: 673.,
        x_height: 500.,
        ascii_widths: &SYMBOL,
        ascii_names: Some(&SYMBOL_NAMES),
        extra_widths: None,
        default_width: 500,
    },
    CoreFontMetrics {
        name: "ZapfDingbats",
        bold: false,
        italic: false,
        serif: false,
        fixed_pitch: false,
        symbolic: true,
        ascent: 820.,
        descent: -143.,
        cap_height: 700.,
        x_height: 500.,
        ascii_widths: &ZAPF_DINGBATS,
        ascii_names: None,
        extra_widths: None,
        default_width: 788,
    },
];
