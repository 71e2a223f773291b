mod common;

use common::session;
use pdf_glyphs::{DecoderConfig, FallbackStep, FontKind, PdfValue};

fn type0(widths: PdfValue) -> PdfValue {
    PdfValue::dict([
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type0")),
        ("BaseFont", PdfValue::name("ABCDEF+Blocks")),
        ("Encoding", PdfValue::name("Identity-H")),
        (
            "DescendantFonts",
            PdfValue::Array(vec![PdfValue::dict([
                ("Subtype", PdfValue::name("CIDFontType2")),
                ("BaseFont", PdfValue::name("ABCDEF+Blocks")),
                ("DW", PdfValue::number(750)),
                ("W", widths),
            ])]),
        ),
    ])
}

#[test_log::test]
fn identity_codes_are_two_bytes_wide() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&type0(PdfValue::Array(vec![
        PdfValue::number(1),
        PdfValue::numbers([500]),
    ])));
    assert_eq!(font.kind(), Some(FontKind::Type0));
    assert_eq!(font.char_codes(&[0, 1, 0, 2, 1, 0]), vec![1, 2, 256]);
    assert_eq!(font.resolve_width(1), 500.0);
    assert_eq!(font.resolve_width(2), 750.0);
    assert_eq!(font.missing_width(), 750.0);
}

#[test_log::test]
fn w_ranges_share_one_width() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&type0(PdfValue::numbers([10, 12, 400])));
    for cid in 10..=12 {
        assert_eq!(font.resolve_width(cid), 400.0);
    }
    assert_eq!(font.resolve_width(13), 750.0);
}

#[test_log::test]
fn inverted_w_range_is_malformed() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&type0(PdfValue::numbers([12, 10, 400])));
    assert!(font.error().is_some());
    assert!(!font.is_decoded());
}

#[test_log::test]
fn type3_widths_follow_the_font_matrix() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&PdfValue::dict([
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type3")),
        ("FontMatrix", PdfValue::numbers([0.002, 0., 0., 0.002, 0., 0.])),
        ("FontBBox", PdfValue::numbers([0, 0, 500, 500])),
        ("FirstChar", PdfValue::number(65)),
        ("LastChar", PdfValue::number(66)),
        ("Widths", PdfValue::numbers([250, 300])),
    ]));
    assert_eq!(font.resolve_width(65), 500.0);
    assert_eq!(font.resolve_width(66), 600.0);
    assert_eq!(font.nominal_width(), 550.0);
}

#[test_log::test]
fn subset_tags_fall_back_to_standard_metrics() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&PdfValue::dict([
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type1")),
        ("BaseFont", PdfValue::name("QRSTUV+Courier")),
    ]));
    assert_eq!(font.fallback_step(), FallbackStep::SubsetTag);
    assert_eq!(font.base_font().name(), "Courier");
    assert_eq!(font.resolve_width(u32::from(b'i')), 600.0);
    assert!(font.metrics().fixed_pitch);
}

#[test_log::test]
fn unknown_families_use_configured_fallbacks() {
    let config = DecoderConfig::builder()
        .fallback_font("blocks", "Courier")
        .build();
    let session = session(config);
    let font = session.build_font(&PdfValue::dict([
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type1")),
        ("BaseFont", PdfValue::name("Blocks")),
    ]));
    assert_eq!(font.fallback_step(), FallbackStep::FamilyTable);
    assert_eq!(font.base_font().name(), "Courier");
}

#[test_log::test]
fn unknown_names_default_to_times() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&PdfValue::dict([
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type1")),
        ("BaseFont", PdfValue::name("Zzyzx-Bold")),
    ]));
    assert_eq!(font.fallback_step(), FallbackStep::Default);
    assert_eq!(font.base_font().name(), "Times-Bold");
    assert!(font.metrics().bold);
}
