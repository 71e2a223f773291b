mod common;

use std::sync::Arc;

use common::*;
use pdf_glyphs::{
    CharCode, Confidence, DecodeError, DecodeSession, DecoderConfig, Family, FontModel, ReferenceSet,
    Style,
};

const NAMES: [&str; 4] = ["L", "T", "H", "E"];

fn mark_words(font: &FontModel, words: &[&[CharCode]]) {
    for word in words {
        for &code in *word {
            font.mark_used(code);
        }
        font.mark_word_boundary();
    }
}

fn strict() -> DecoderConfig {
    DecoderConfig::builder()
        .acceptance(vec![(0.9, 0.95)])
        .build()
}

#[test_log::test]
fn cff_glyphs_verify_their_names() {
    let session = session(DecoderConfig::default());
    let program = block_cff(&[("L", 'L'), ("T", 'T'), ("H", 'H'), ("E", 'E')]);
    let font = session.build_font(&type1c_font(program, &NAMES, None));
    mark_words(&font, &[&[1, 2, 3, 4]]);

    font.decode(None).unwrap();
    assert!(font.is_decoded());
    assert!(font.is_verified());
    for (code, name) in (1..).zip(NAMES) {
        assert_eq!(font.resolve_unicode(code), name);
        assert_eq!(font.resolve_width(code), 600.0);
        let resolution = font.resolution(code).unwrap();
        match resolution.confidence {
            Confidence::Verified(score) => assert!(score > 0.8, "{} scored {}", name, score),
            other => panic!("{} resolved as {:?}", name, other),
        }
        assert!(font.glyph_image(code).is_some());
        assert!(font.glyph_image_by_name(name).is_some());
    }
    assert!(!font.has_descent());
    assert_eq!(font.style(), (Family::Serif, Style::Regular));
    let cap = font.cap_height();
    assert!((650.0..=750.0).contains(&cap), "cap height {}", cap);
}

#[test_log::test]
fn rendering_the_same_outline_twice_scores_near_one() {
    let session = session(DecoderConfig::default());
    let program = block_cff(&[("H", 'H')]);
    let font = session.build_font(&type1c_font(program, &["H"], None));
    font.mark_used(1);
    let image = font.glyph_image(1).unwrap();
    let reference = session.matcher().renderer().render('H', Family::Serif, Style::Regular).unwrap();
    let score = pdf_glyphs::similarity(&image, &reference);
    assert!(score >= 0.9, "{}", score);
    assert!(pdf_glyphs::similarity(&image, &image) > 0.999);
}

#[test_log::test]
fn shuffled_names_are_recognized_from_shapes() {
    let session = session(strict());
    let program = block_cff(&[("L", 'T'), ("T", 'H'), ("H", 'E'), ("E", 'L')]);
    let font = session.build_font(&type1c_font(program, &NAMES, None));
    mark_words(&font, &[&[1, 2, 3, 4]]);

    font.decode(None).unwrap();
    assert!(!font.is_verified());
    for (code, shape) in (1..).zip(["T", "H", "E", "L"]) {
        assert_eq!(font.resolve_unicode(code), shape);
        let confidence = font.resolution(code).unwrap().confidence;
        assert!(
            matches!(confidence, Confidence::Recognized(_) | Confidence::BelowConfidence(_)),
            "{:?}",
            confidence
        );
    }
}

#[test_log::test]
fn rejected_fonts_keep_to_unicode_text() {
    let config = DecoderConfig::builder()
        .acceptance(vec![(0.9, 0.95)])
        .removal_score(0.0)
        .build();
    let session = session(config);
    let program = block_cff(&[("L", 'T'), ("T", 'H'), ("H", 'E'), ("E", 'L')]);
    let cmap = to_unicode(&[(1, "L"), (2, "T"), (3, "H"), (4, "E")]);
    let font = session.build_font(&type1c_font(program, &NAMES, Some(cmap)));
    mark_words(&font, &[&[1, 2, 3, 4]]);

    font.decode(None).unwrap();
    for (code, name) in (1..).zip(NAMES) {
        assert_eq!(font.resolve_unicode(code), name);
        assert_eq!(font.resolution(code).unwrap().confidence, Confidence::Declared);
    }
}

#[test_log::test]
fn type1_programs_are_decoded() {
    let session = session(strict());
    let program = block_type1(&[("L", 'L'), ("T", 'H'), ("H", 'T'), ("E", 'E')]);
    let font = session.build_font(&type1_font(program, &NAMES, None));
    mark_words(&font, &[&[1, 2, 3, 4]]);

    font.decode(None).unwrap();
    for (code, shape) in (1..).zip(["L", "H", "T", "E"]) {
        assert_eq!(font.resolve_unicode(code), shape);
        assert_eq!(font.resolve_width(code), 600.0);
        assert!(font.glyph_image(code).is_some());
    }
    assert!(!matches!(
        font.resolution(2).unwrap().confidence,
        Confidence::Verified(_) | Confidence::Declared
    ));
}

#[test_log::test]
fn truetype_glyphs_through_the_unicode_cmap() {
    let session = session(DecoderConfig::default());
    let program = block_truetype(&[('L', 'L'), ('T', 'T'), ('H', 'H'), ('E', 'E')], 600);
    let font = session.build_font(&truetype_font(program, None));
    let codes: Vec<CharCode> = "LTHE".bytes().map(CharCode::from).collect();
    mark_words(&font, &[&codes]);

    font.decode(None).unwrap();
    assert!(font.is_verified());
    for &code in &codes {
        assert_eq!(font.resolve_unicode(code), char::from(code as u8).to_string());
        assert!(matches!(
            font.resolution(code).unwrap().confidence,
            Confidence::Verified(_)
        ));
        assert_eq!(font.resolve_width(code), 600.0);
    }
}

#[test_log::test]
fn charset_decodes_unused_codes() {
    let session = session(DecoderConfig::default());
    let program = block_truetype(&[('L', 'L'), ('T', 'T')], 600);
    let font = session.build_font(&truetype_font(program, None));
    font.mark_used(u32::from(b'L'));
    let extra = [u32::from(b'T')].into_iter().collect();
    font.decode(Some(&extra)).unwrap();
    assert!(font.glyph_image(u32::from(b'T')).is_some());
}

fn wide_font(session: &DecodeSession) -> Arc<FontModel> {
    let program = block_truetype(&[('E', 'E'), ('H', 'H'), ('L', 'L'), ('T', 'T')], 1500);
    session.build_font(&truetype_font(program, Some((69, vec![1500.0; 16]))))
}

#[test_log::test]
fn oversized_advances_with_short_words_are_implicit_spaces() {
    let session = session(DecoderConfig::default());
    let font = wide_font(&session);
    let (e, h, l, t) = (69, 72, 76, 84);
    mark_words(&font, &[&[l], &[e], &[t], &[h], &[l], &[e, t]]);

    font.decode(None).unwrap();
    assert!(font.has_implicit_spaces());
    let width = font.resolve_width(l);
    assert!(width < 1000.0, "{}", width);
}

#[test_log::test]
fn long_words_are_not_implicit_spaces() {
    let session = session(DecoderConfig::default());
    let font = wide_font(&session);
    let (e, h, l, t) = (69, 72, 76, 84);
    mark_words(&font, &[&[l, e, t, h, e], &[h, e, l, l, e, t]]);

    font.decode(None).unwrap();
    assert!(!font.has_implicit_spaces());
    assert_eq!(font.resolve_width(l), 1500.0);
}

#[test_log::test]
fn concurrent_decode_runs_once() {
    let session = session(DecoderConfig::default());
    let program = block_cff(&[("L", 'L'), ("T", 'T'), ("H", 'H'), ("E", 'E')]);
    let font = session.build_font(&type1c_font(program, &NAMES, None));
    mark_words(&font, &[&[1, 2, 3, 4]]);

    let texts: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let font = &font;
                s.spawn(move || {
                    font.decode(None).unwrap();
                    (1..=4).map(|c| font.resolve_unicode(c)).collect::<String>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(texts.iter().all(|t| t == "LTHE"), "{:?}", texts);
    assert!(font.decode(None).is_ok());
    assert!(font.is_decoded());
}

#[test_log::test]
fn batch_decode_matches_single_decode() {
    let config = DecoderConfig::builder().threads(3).build();
    let session = session(config);
    let fonts: Vec<Arc<FontModel>> = (0..6)
        .map(|_| {
            let program = block_cff(&[("L", 'L'), ("T", 'T'), ("H", 'H'), ("E", 'E')]);
            let font = session.build_font(&type1c_font(program, &NAMES, None));
            mark_words(&font, &[&[1, 2, 3, 4]]);
            font
        })
        .collect();
    let results = session.decode_all(&fonts);
    assert!(results.iter().all(Result::is_ok));
    for font in &fonts {
        assert_eq!(font.resolve_unicode(3), "H");
    }
}

#[test_log::test]
fn broken_program_keeps_declared_tables() {
    let session = session(DecoderConfig::default());
    let font = session.build_font(&type1c_font(b"not a font".to_vec(), &NAMES, None));
    font.mark_used(1);
    assert!(matches!(font.decode(None), Err(DecodeError::MalformedProgram(_))));
    assert!(matches!(font.error(), Some(DecodeError::MalformedProgram(_))));
    assert_eq!(font.resolve_unicode(1), "L");
    assert!(!font.is_decoded());
}

#[test_log::test]
fn glued_accents_become_combining_marks() {
    let session = DecodeSession::with_references(DecoderConfig::default(), ReferenceSet::new());
    let program = block_cff(&[("a", 'L'), ("acute", 'I')]);
    let font = session.build_font(&type1c_font(program, &["a", "acute"], None));
    mark_words(&font, &[&[1, 2], &[1, 2, 1], &[1, 2]]);

    font.decode(None).unwrap();
    assert_eq!(font.resolve_unicode(1), "a");
    assert_eq!(font.resolve_unicode(2), "\u{0301}");
    assert_eq!(
        font.resolution(2).map(|r| r.confidence),
        Some(Confidence::Declared)
    );
}

#[test_log::test]
fn free_standing_accents_stay_spacing() {
    let session = DecodeSession::with_references(DecoderConfig::default(), ReferenceSet::new());
    let program = block_cff(&[("a", 'L'), ("acute", 'I')]);
    let font = session.build_font(&type1c_font(program, &["a", "acute"], None));
    mark_words(&font, &[&[2, 1], &[1, 2]]);

    font.decode(None).unwrap();
    assert_eq!(font.resolve_unicode(2), "\u{00B4}");
}

#[test_log::test]
fn empty_usage_decodes_nothing() {
    let session = session(DecoderConfig::default());
    let program = block_cff(&[("L", 'L')]);
    let font = session.build_font(&type1c_font(program, &["L"], None));
    font.decode(None).unwrap();
    assert!(font.is_decoded());
    assert!(font.glyph_image(1).is_none());
    assert_eq!(font.resolve_unicode(1), "L");
}
