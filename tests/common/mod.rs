#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use pdf_glyphs::{
    DecodeSession, DecoderConfig, Family, PathSink, PdfValue, ReferenceFont, ReferenceSet, Style,
};

pub type Polygon = Vec<(i16, i16)>;

fn rect(x0: i16, y0: i16, x1: i16, y1: i16) -> Polygon {
    vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

/// Block capitals on a 1000-unit em: cap height 700, stems 100 wide.
pub fn letter(ch: char) -> Vec<Polygon> {
    match ch {
        'L' => vec![rect(100, 0, 200, 700), rect(200, 0, 550, 100)],
        'T' => vec![rect(50, 600, 550, 700), rect(250, 0, 350, 600)],
        'H' => vec![
            rect(100, 0, 200, 700),
            rect(450, 0, 550, 700),
            rect(200, 300, 450, 400),
        ],
        'E' => vec![
            rect(100, 0, 200, 700),
            rect(200, 600, 550, 700),
            rect(200, 300, 500, 400),
            rect(200, 0, 550, 100),
        ],
        'I' => vec![rect(250, 0, 350, 700)],
        _ => Vec::new(),
    }
}

pub const LETTERS: &str = "LTHEI";

/// Reference face drawing [`letter`] shapes.
pub struct PolygonFont {
    glyphs: HashMap<char, Vec<Polygon>>,
}

impl PolygonFont {
    pub fn new(chars: &str) -> Self {
        PolygonFont {
            glyphs: chars.chars().map(|c| (c, letter(c))).collect(),
        }
    }
}

impl ReferenceFont for PolygonFont {
    fn units_per_em(&self) -> f32 {
        1000.0
    }

    fn outline(&self, ch: char, sink: &mut dyn PathSink) -> bool {
        let Some(polygons) = self.glyphs.get(&ch) else {
            return false;
        };
        for polygon in polygons {
            let (x, y) = polygon[0];
            sink.move_to(x as f32, y as f32);
            for &(x, y) in &polygon[1..] {
                sink.line_to(x as f32, y as f32);
            }
            sink.close_path();
        }
        true
    }

    fn advance(&self, ch: char) -> Option<f32> {
        self.glyphs.contains_key(&ch).then_some(600.0)
    }
}

pub fn references() -> ReferenceSet {
    ReferenceSet::new().with(Family::Serif, Style::Regular, Arc::new(PolygonFont::new(LETTERS)))
}

pub fn session(config: DecoderConfig) -> DecodeSession {
    DecodeSession::with_references(config, references())
}

// CFF

fn push_int(out: &mut Vec<u8>, v: i32) {
    out.push(28);
    out.extend((v as i16).to_be_bytes());
}

fn push_int32(out: &mut Vec<u8>, v: i32) {
    out.push(29);
    out.extend(v.to_be_bytes());
}

/// Type 2 charstring drawing `polygons` with `rmoveto`/`rlineto`.
pub fn charstring(polygons: &[Polygon], width: i32) -> Vec<u8> {
    let mut out = Vec::new();
    let (mut px, mut py) = (0i32, 0i32);
    for (i, polygon) in polygons.iter().enumerate() {
        let (x, y) = (polygon[0].0 as i32, polygon[0].1 as i32);
        if i == 0 {
            push_int(&mut out, width);
        }
        push_int(&mut out, x - px);
        push_int(&mut out, y - py);
        out.push(21);
        (px, py) = (x, y);
        for &(x, y) in &polygon[1..] {
            let (x, y) = (x as i32, y as i32);
            push_int(&mut out, x - px);
            push_int(&mut out, y - py);
            (px, py) = (x, y);
        }
        out.push(5);
    }
    if polygons.is_empty() {
        push_int(&mut out, width);
    }
    out.push(14);
    out
}

fn encode_index(items: &[&[u8]]) -> Vec<u8> {
    if items.is_empty() {
        return vec![0, 0];
    }
    let mut out = (items.len() as u16).to_be_bytes().to_vec();
    out.push(4);
    let mut offset = 1u32;
    out.extend(offset.to_be_bytes());
    for item in items {
        offset += item.len() as u32;
        out.extend(offset.to_be_bytes());
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Bare CFF font: `.notdef` plus one named glyph per entry, every name
/// stored as a custom string, nominal width 0.
pub fn cff(glyphs: &[(&str, Vec<u8>)]) -> Vec<u8> {
    const STANDARD_STRINGS: u16 = 391;
    let notdef = vec![14u8];
    let mut programs: Vec<&[u8]> = vec![&notdef];
    programs.extend(glyphs.iter().map(|(_, p)| p.as_slice()));
    let names: Vec<&[u8]> = glyphs.iter().map(|(n, _)| n.as_bytes()).collect();

    let name_index = encode_index(&[b"Blocks".as_slice()]);
    let string_index = encode_index(&names);
    let gsubrs = encode_index(&[]);
    let charstrings = encode_index(&programs);
    let mut charset = vec![0u8];
    for i in 0..glyphs.len() as u16 {
        charset.extend((STANDARD_STRINGS + i).to_be_bytes());
    }
    let mut private = Vec::new();
    push_int32(&mut private, 0);
    private.push(20);
    push_int32(&mut private, 0);
    private.push(21);

    let top_len = 23;
    let top_index_len = 2 + 1 + 8 + top_len;
    let charset_at = 4 + name_index.len() + top_index_len + string_index.len() + gsubrs.len();
    let charstrings_at = charset_at + charset.len();
    let private_at = charstrings_at + charstrings.len();

    let mut top = Vec::new();
    push_int32(&mut top, charset_at as i32);
    top.push(15);
    push_int32(&mut top, charstrings_at as i32);
    top.push(17);
    push_int32(&mut top, private.len() as i32);
    push_int32(&mut top, private_at as i32);
    top.push(18);
    assert_eq!(top.len(), top_len);

    let mut out = vec![1, 0, 4, 4];
    out.extend(name_index);
    out.extend(encode_index(&[top.as_slice()]));
    out.extend(string_index);
    out.extend(gsubrs);
    out.extend(charset);
    out.extend(charstrings);
    out.extend(private);
    out
}

/// CFF font with one block letter per name, each drawn as `shapes[i]`.
pub fn block_cff(glyphs: &[(&str, char)]) -> Vec<u8> {
    let programs: Vec<(&str, Vec<u8>)> = glyphs
        .iter()
        .map(|&(name, shape)| (name, charstring(&letter(shape), 600)))
        .collect();
    cff(&programs)
}

// TrueType

fn simple_glyph(polygons: &[Polygon]) -> Vec<u8> {
    let points: Vec<(i16, i16)> = polygons.iter().flatten().copied().collect();
    let mut out = Vec::new();
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);
    for v in [polygons.len() as i16, x_min, y_min, x_max, y_max] {
        out.extend(v.to_be_bytes());
    }
    let mut end = -1i32;
    for polygon in polygons {
        end += polygon.len() as i32;
        out.extend((end as u16).to_be_bytes());
    }
    out.extend(0u16.to_be_bytes());
    out.extend(std::iter::repeat_n(1u8, points.len()));
    let mut prev = 0i16;
    for p in &points {
        out.extend((p.0 - prev).to_be_bytes());
        prev = p.0;
    }
    prev = 0;
    for p in &points {
        out.extend((p.1 - prev).to_be_bytes());
        prev = p.1;
    }
    out
}

fn cmap_format4(map: &[(u16, u16)]) -> Vec<u8> {
    let mut map = map.to_vec();
    map.sort();
    map.push((0xffff, 0));
    let seg_count = map.len() as u16;
    let mut out = Vec::new();
    for v in [4, 16 + 8 * seg_count, 0, seg_count * 2, 0, 0, 0] {
        out.extend(v.to_be_bytes());
    }
    for &(code, _) in &map {
        out.extend(code.to_be_bytes());
    }
    out.extend(0u16.to_be_bytes());
    for &(code, _) in &map {
        out.extend(code.to_be_bytes());
    }
    for &(code, gid) in &map {
        let delta = if code == 0xffff { 1 } else { gid.wrapping_sub(code) };
        out.extend(delta.to_be_bytes());
    }
    for _ in &map {
        out.extend(0u16.to_be_bytes());
    }
    out
}

fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(0x0001_0000u32.to_be_bytes());
    out.extend((tables.len() as u16).to_be_bytes());
    out.extend([0; 6]);
    let mut offset = 12 + 16 * tables.len() as u32;
    for (tag, data) in tables {
        out.extend(*tag);
        out.extend(0u32.to_be_bytes());
        out.extend(offset.to_be_bytes());
        out.extend((data.len() as u32).to_be_bytes());
        offset += data.len() as u32;
    }
    for (_, data) in tables {
        out.extend(data);
    }
    out
}

/// TrueType font whose glyph `i + 1` draws `glyphs[i].1` and is mapped from
/// the Unicode character `glyphs[i].0` in a (3, 1) cmap.
pub fn block_truetype(glyphs: &[(char, char)], advance: u16) -> Vec<u8> {
    let mut outlines = vec![Vec::new()];
    let mut map = Vec::new();
    for (i, &(ch, shape)) in glyphs.iter().enumerate() {
        outlines.push(simple_glyph(&letter(shape)));
        map.push((ch as u16, i as u16 + 1));
    }

    let mut head = vec![0u8; 54];
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    head[50..52].copy_from_slice(&1i16.to_be_bytes());
    let mut maxp = 0x0000_5000u32.to_be_bytes().to_vec();
    maxp.extend((outlines.len() as u16).to_be_bytes());
    let mut loca = Vec::new();
    let mut glyf = Vec::new();
    for g in &outlines {
        loca.extend((glyf.len() as u32).to_be_bytes());
        glyf.extend(g);
    }
    loca.extend((glyf.len() as u32).to_be_bytes());
    let mut hhea = vec![0u8; 36];
    hhea[34..36].copy_from_slice(&(outlines.len() as u16).to_be_bytes());
    let mut hmtx = Vec::new();
    for _ in &outlines {
        hmtx.extend(advance.to_be_bytes());
        hmtx.extend(0i16.to_be_bytes());
    }
    let subtable = cmap_format4(&map);
    let mut cmap = Vec::new();
    for v in [0u16, 1, 3, 1] {
        cmap.extend(v.to_be_bytes());
    }
    cmap.extend(12u32.to_be_bytes());
    cmap.extend(subtable);

    sfnt(&[
        (b"cmap", cmap),
        (b"glyf", glyf),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"loca", loca),
        (b"maxp", maxp),
    ])
}

// Type 1

fn push_t1_int(out: &mut Vec<u8>, v: i32) {
    out.push(255);
    out.extend(v.to_be_bytes());
}

/// Type 1 charstring drawing `polygons` after `hsbw 0 width`.
pub fn type1_charstring(polygons: &[Polygon], width: i32) -> Vec<u8> {
    let mut out = Vec::new();
    push_t1_int(&mut out, 0);
    push_t1_int(&mut out, width);
    out.push(13);
    let (mut px, mut py) = (0i32, 0i32);
    for polygon in polygons {
        for (i, &(x, y)) in polygon.iter().enumerate() {
            let (x, y) = (x as i32, y as i32);
            push_t1_int(&mut out, x - px);
            push_t1_int(&mut out, y - py);
            out.push(if i == 0 { 21 } else { 5 });
            (px, py) = (x, y);
        }
        out.push(9);
    }
    out.push(14);
    out
}

fn eexec_encrypt(plain: &[u8], seed: u16) -> Vec<u8> {
    let mut r = seed;
    plain
        .iter()
        .map(|&p| {
            let c = p ^ (r >> 8) as u8;
            r = (u16::from(c).wrapping_add(r)).wrapping_mul(52845).wrapping_add(22719);
            c
        })
        .collect()
}

/// Type 1 program with one block letter per glyph name.
pub fn block_type1(glyphs: &[(&str, char)]) -> Vec<u8> {
    let mut private = b"dup /Private 6 dict dup begin\n\
        /RD{string currentfile exch readstring pop}executeonly def\n\
        /ND{noaccess def}executeonly def\n\
        /NP{noaccess put}executeonly def\n\
        /lenIV 4 def\n\
        /Subrs 0 array\nND\n\
        2 index /CharStrings 8 dict dup begin\n"
        .to_vec();
    let notdef = type1_charstring(&[], 250);
    let programs: Vec<(&str, Vec<u8>)> = std::iter::once((".notdef", notdef))
        .chain(glyphs.iter().map(|&(name, shape)| (name, type1_charstring(&letter(shape), 600))))
        .collect();
    for (name, charstring) in programs {
        let mut plain = vec![0u8; 4];
        plain.extend(charstring);
        let cipher = eexec_encrypt(&plain, 4330);
        private.extend(format!("/{} {} RD ", name, cipher.len()).bytes());
        private.extend(cipher);
        private.extend(b" ND\n");
    }
    private.extend(b"end\nend\nmark currentfile closefile\n");

    let mut plain = vec![0u8; 4];
    plain.extend(private);
    let mut out = b"%!PS-AdobeFont-1.0: Blocks 001.000\n\
        11 dict begin\n\
        /FontType 1 def\n\
        /FontName /ABCDEF+Blocks def\n\
        /FontMatrix [0.001 0 0 0.001 0 0] readonly def\n\
        /Encoding StandardEncoding def\n\
        currentdict end\n\
        currentfile eexec\n"
        .to_vec();
    out.extend(eexec_encrypt(&plain, 55665));
    out.extend(b"\n0000000000000000000000000000000000000000000000000000000000000000\ncleartomark\n");
    out
}

// Font dictionaries

/// ToUnicode CMap mapping single-byte codes to text.
pub fn to_unicode(map: &[(u8, &str)]) -> Vec<u8> {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         1 begincodespacerange\n<00> <FF>\nendcodespacerange\n",
    );
    out.push_str(&format!("{} beginbfchar\n", map.len()));
    for (code, text) in map {
        let hex: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
        out.push_str(&format!("<{:02X}> <{}>\n", code, hex));
    }
    out.push_str("endbfchar\nendcmap\n");
    out.into_bytes()
}

pub fn descriptor(program_key: &str, program: PdfValue) -> PdfValue {
    PdfValue::dict([
        ("Type", PdfValue::name("FontDescriptor")),
        ("FontName", PdfValue::name("ABCDEF+Blocks")),
        ("Flags", PdfValue::number(32)),
        ("FontBBox", PdfValue::numbers([0, 0, 600, 700])),
        ("ItalicAngle", PdfValue::number(0)),
        ("Ascent", PdfValue::number(700)),
        ("Descent", PdfValue::number(0)),
        ("CapHeight", PdfValue::number(700)),
        ("StemV", PdfValue::number(80)),
        (program_key, program),
    ])
}

/// Type1 font over an embedded CFF program; `names` become `Differences`
/// starting at code 1.
pub fn type1c_font(program: Vec<u8>, names: &[&str], to_unicode: Option<Vec<u8>>) -> PdfValue {
    let mut differences = vec![PdfValue::number(1)];
    differences.extend(names.iter().map(|n| PdfValue::name(*n)));
    let mut entries = vec![
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type1")),
        ("BaseFont", PdfValue::name("ABCDEF+Blocks")),
        (
            "Encoding",
            PdfValue::dict([("Differences", PdfValue::Array(differences))]),
        ),
        (
            "FontDescriptor",
            descriptor(
                "FontFile3",
                PdfValue::stream([("Subtype", PdfValue::name("Type1C"))], program),
            ),
        ),
    ];
    if let Some(cmap) = to_unicode {
        entries.push(("ToUnicode", PdfValue::stream(Vec::<(&str, PdfValue)>::new(), cmap)));
    }
    PdfValue::dict(entries)
}

/// Type1 font over an embedded Type 1 program (`FontFile`); `names` become
/// `Differences` starting at code 1.
pub fn type1_font(program: Vec<u8>, names: &[&str], to_unicode: Option<Vec<u8>>) -> PdfValue {
    let mut differences = vec![PdfValue::number(1)];
    differences.extend(names.iter().map(|n| PdfValue::name(*n)));
    let mut entries = vec![
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("Type1")),
        ("BaseFont", PdfValue::name("ABCDEF+Blocks")),
        (
            "Encoding",
            PdfValue::dict([("Differences", PdfValue::Array(differences))]),
        ),
        (
            "FontDescriptor",
            descriptor("FontFile", PdfValue::stream(Vec::<(&str, PdfValue)>::new(), program)),
        ),
    ];
    if let Some(cmap) = to_unicode {
        entries.push(("ToUnicode", PdfValue::stream(Vec::<(&str, PdfValue)>::new(), cmap)));
    }
    PdfValue::dict(entries)
}

/// TrueType font with WinAnsi encoding over an embedded `glyf` program.
pub fn truetype_font(program: Vec<u8>, widths: Option<(u32, Vec<f32>)>) -> PdfValue {
    let mut entries = vec![
        ("Type", PdfValue::name("Font")),
        ("Subtype", PdfValue::name("TrueType")),
        ("BaseFont", PdfValue::name("ABCDEF+Blocks")),
        ("Encoding", PdfValue::name("WinAnsiEncoding")),
        (
            "FontDescriptor",
            descriptor("FontFile2", PdfValue::stream(Vec::<(&str, PdfValue)>::new(), program)),
        ),
    ];
    if let Some((first, widths)) = widths {
        entries.push(("FirstChar", PdfValue::number(first)));
        entries.push(("LastChar", PdfValue::number(first + widths.len() as u32 - 1)));
        entries.push(("Widths", PdfValue::numbers(widths)));
    }
    PdfValue::dict(entries)
}
