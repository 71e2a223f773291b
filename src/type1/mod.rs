//! Type 1 font programs: `FontFile` streams.
//!
//! The cleartext part supplies `FontMatrix`. The eexec-encrypted part holds
//! the private dictionary with `lenIV`, `Subrs` and `CharStrings`; each
//! charstring is encrypted once more and is decrypted up front.

mod charstring;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::data::STANDARD_ENCODING;
use crate::error::{DecodeError, Result};
use crate::path::{PathSink, TransformSink};

const EEXEC_SEED: u16 = 55665;
const CHARSTRING_SEED: u16 = 4330;
const PFB_TEXT: u8 = 1;
const PFB_BINARY: u8 = 2;

fn malformed(what: impl Into<String>) -> DecodeError {
    DecodeError::MalformedProgram(what.into())
}

fn decrypt(data: &[u8], seed: u16, skip: usize) -> Vec<u8> {
    let mut r = seed;
    let plain = data.iter().map(|&c| {
        let p = c ^ (r >> 8) as u8;
        r = (u16::from(c).wrapping_add(r)).wrapping_mul(52845).wrapping_add(22719);
        p
    });
    plain.skip(skip).collect()
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

/// Hex digits to bytes, skipping whitespace and stopping at anything else.
fn decode_hex(data: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = data
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace())
        .map_while(hex_value)
        .collect();
    digits
        .chunks(2)
        .map(|pair| pair[0] << 4 | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Splits a PFB container into its text and binary parts.
fn split_pfb(data: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let (mut text, mut binary) = (Vec::new(), Vec::new());
    let mut pos = 0;
    while let [0x80, kind, a, b, c, d, ..] = *data.get(pos..)? {
        let len = u32::from_le_bytes([a, b, c, d]) as usize;
        let start = pos + 6;
        let segment = data.get(start..start.checked_add(len)?)?;
        match kind {
            PFB_TEXT => text.extend_from_slice(segment),
            PFB_BINARY => binary.extend_from_slice(segment),
            _ => break,
        }
        pos = start + len;
    }
    Some((text, binary))
}

/// Offset of the encrypted data after the `eexec` token.
fn find_eexec(data: &[u8]) -> Option<usize> {
    let at = data.windows(5).position(|w| w == b"eexec")?;
    let start = at + 5;
    let skip = data[start..]
        .iter()
        .take_while(|c| matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    let start = start + skip;
    (start < data.len()).then_some(start)
}

/// Cleartext and decrypted private parts of a Type 1 program.
fn split_program(data: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if data.first() == Some(&0x80) {
        let (text, binary) = split_pfb(data).ok_or_else(|| malformed("Type1: truncated PFB segment"))?;
        return Ok((text, decrypt(&binary, EEXEC_SEED, 4)));
    }
    let start = find_eexec(data).ok_or_else(|| malformed("Type1: no eexec section"))?;
    let (clear, encrypted) = data.split_at(start);
    let private = if encrypted.len() >= 4 && encrypted[..4].iter().all(u8::is_ascii_hexdigit) {
        decrypt(&decode_hex(encrypted), EEXEC_SEED, 4)
    } else {
        decrypt(encrypted, EEXEC_SEED, 4)
    };
    Ok((clear.to_vec(), private))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Int(i64),
    Real(f64),
    Name(&'a [u8]),
    /// `n RD <n bytes>`: a charstring or subroutine.
    Binary(&'a [u8]),
    Open,
    Close,
    Other(&'a [u8]),
}

fn is_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// A PostScript tokenizer that knows just enough to walk font
/// dictionaries. Strings and procedures are skipped whole.
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn skip_space(&mut self) {
        while let Some(&c) = self.data.get(self.pos) {
            if c == b'%' {
                while self.data.get(self.pos).is_some_and(|&c| c != b'\n' && c != b'\r') {
                    self.pos += 1;
                }
            } else if c.is_ascii_whitespace() || c == 0 {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(|&c| !is_delimiter(c)) {
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    /// Skips a balanced `open ... close` run; the opener is already read.
    fn skip_balanced(&mut self, open: u8, close: u8) {
        let mut depth = 1;
        while let Some(&c) = self.data.get(self.pos) {
            self.pos += 1;
            if c == b'\\' && open == b'(' {
                self.pos += 1;
            } else if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// After an integer, `RD` or `-|` followed by one space introduces that
    /// many binary bytes.
    fn binary_after(&mut self, len: i64) -> Option<&'a [u8]> {
        let saved = self.pos;
        self.skip_space();
        let word = self.word();
        if word != b"RD" && word != b"-|" {
            self.pos = saved;
            return None;
        }
        let start = self.pos + 1;
        let end = usize::try_from(len).ok().and_then(|n| start.checked_add(n));
        match end.and_then(|end| self.data.get(start..end)) {
            Some(bytes) => {
                self.pos = start + bytes.len();
                Some(bytes)
            }
            None => {
                self.pos = saved;
                None
            }
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            self.skip_space();
            let c = *self.data.get(self.pos)?;
            match c {
                b'/' => {
                    self.pos += 1;
                    return Some(Token::Name(self.word()));
                }
                b'[' => {
                    self.pos += 1;
                    return Some(Token::Open);
                }
                b']' => {
                    self.pos += 1;
                    return Some(Token::Close);
                }
                b'{' | b'(' | b'<' => {
                    self.pos += 1;
                    let close = match c {
                        b'{' => b'}',
                        b'(' => b')',
                        _ => b'>',
                    };
                    self.skip_balanced(c, close);
                }
                // stray closers
                _ if is_delimiter(c) => self.pos += 1,
                _ => {
                    let word = self.word();
                    let text = std::str::from_utf8(word).unwrap_or("");
                    if let Ok(v) = text.parse::<i64>() {
                        if let Some(bytes) = self.binary_after(v) {
                            return Some(Token::Binary(bytes));
                        }
                        return Some(Token::Int(v));
                    }
                    if let Ok(v) = text.parse::<f64>() {
                        return Some(Token::Real(v));
                    }
                    return Some(Token::Other(word));
                }
            }
        }
    }
}

fn number(token: Token<'_>) -> Option<f32> {
    match token {
        Token::Int(v) => Some(v as f32),
        Token::Real(v) => Some(v as f32),
        _ => None,
    }
}

fn font_matrix(clear: &[u8]) -> Option<[f32; 6]> {
    let mut tokens = Tokens::new(clear);
    tokens.find(|t| *t == Token::Name(b"FontMatrix"))?;
    if tokens.next()? != Token::Open {
        return None;
    }
    let values: Vec<f32> = tokens.map_while(number).collect();
    values.try_into().ok()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Top,
    Subrs,
    CharStrings,
}

/// A parsed Type 1 program with decrypted glyph programs.
#[derive(Debug, Clone)]
pub struct Type1Font {
    font_matrix: [f32; 6],
    subrs: Vec<Vec<u8>>,
    names: Vec<String>,
    charstrings: Vec<Vec<u8>>,
    by_name: HashMap<String, u32>,
}

impl Type1Font {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (clear, private) = split_program(data)?;
        let font_matrix = font_matrix(&clear).unwrap_or([0.001, 0., 0., 0.001, 0., 0.]);

        let mut len_iv: i64 = 4;
        let mut subrs: Vec<Vec<u8>> = Vec::new();
        let mut names = Vec::new();
        let mut raw_charstrings: Vec<&[u8]> = Vec::new();
        let mut section = Section::Top;
        let mut last_int = None;
        let mut last_name: Option<&[u8]> = None;

        let mut tokens = Tokens::new(&private);
        while let Some(token) = tokens.next() {
            match token {
                Token::Name(b"lenIV") if section == Section::Top => {
                    if let Some(Token::Int(v)) = tokens.next() {
                        len_iv = v;
                    }
                }
                Token::Name(b"Subrs") => section = Section::Subrs,
                Token::Name(b"CharStrings") => section = Section::CharStrings,
                Token::Binary(bytes) => match section {
                    Section::Subrs => {
                        let Some(i) = last_int.and_then(|i: i64| usize::try_from(i).ok()) else {
                            continue;
                        };
                        if i >= subrs.len() {
                            subrs.resize(i + 1, Vec::new());
                        }
                        subrs[i] = bytes.to_vec();
                    }
                    Section::CharStrings => {
                        if let Some(name) = last_name.take() {
                            names.push(String::from_utf8_lossy(name).into_owned());
                            raw_charstrings.push(bytes);
                        }
                    }
                    Section::Top => trace!("binary data outside Subrs and CharStrings"),
                },
                Token::Int(v) => last_int = Some(v),
                Token::Name(name) if section == Section::CharStrings => last_name = Some(name),
                _ => {}
            }
        }
        if raw_charstrings.is_empty() {
            return Err(malformed("Type1: no CharStrings"));
        }

        let skip = usize::try_from(len_iv).ok();
        let plain = |bytes: &[u8]| match skip {
            Some(n) => decrypt(bytes, CHARSTRING_SEED, n),
            None => bytes.to_vec(),
        };
        let subrs: Vec<Vec<u8>> = subrs.iter().map(|s| plain(s)).collect();
        let charstrings: Vec<Vec<u8>> = raw_charstrings.into_iter().map(plain).collect();
        let by_name = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i as u32))
            .collect();
        debug!(
            "Type1 program: {} charstrings, {} subrs, lenIV {}",
            charstrings.len(),
            subrs.len(),
            len_iv
        );
        Ok(Type1Font {
            font_matrix,
            subrs,
            names,
            charstrings,
            by_name,
        })
    }

    pub fn num_glyphs(&self) -> usize {
        self.charstrings.len()
    }

    pub fn units_per_em(&self) -> f32 {
        let a = self.font_matrix[0];
        if a.is_finite() && a > 0. { (1. / a).round() } else { 1000. }
    }

    pub fn glyph_name(&self, gid: u32) -> Option<&str> {
        self.names.get(gid as usize).map(String::as_str)
    }

    pub fn gid_for_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Draws glyph `gid` into `sink` in font units and returns its advance.
    pub fn outline(&self, gid: u32, sink: &mut dyn PathSink) -> Result<f32> {
        self.outline_at(gid, sink, true)
    }

    fn outline_at(&self, gid: u32, sink: &mut dyn PathSink, allow_accent: bool) -> Result<f32> {
        let program = self
            .charstrings
            .get(gid as usize)
            .ok_or_else(|| DecodeError::glyph(gid, "glyph index out of range"))?;
        let outcome =
            charstring::execute(program, &self.subrs, sink).map_err(|e| DecodeError::glyph(gid, e))?;
        if let Some(seac) = outcome.seac {
            if !allow_accent {
                return Err(DecodeError::glyph(gid, "nested accented glyph"));
            }
            let base = self
                .standard_gid(seac.base)
                .ok_or_else(|| DecodeError::glyph(gid, "accent base not in font"))?;
            let accent = self
                .standard_gid(seac.accent)
                .ok_or_else(|| DecodeError::glyph(gid, "accent not in font"))?;
            trace!("glyph {} composes {} + {}", gid, base, accent);
            self.outline_at(base, sink, false)?;
            let mut shifted = TransformSink::offset(sink, seac.dx, seac.dy);
            self.outline_at(accent, &mut shifted, false)?;
        }
        Ok(outcome.advance)
    }

    fn standard_gid(&self, code: u8) -> Option<u32> {
        STANDARD_ENCODING[code as usize].and_then(|name| self.gid_for_name(name))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal Type 1 writer for tests.

    pub(crate) use super::charstring::testing::program;

    fn encrypt(plain: &[u8], seed: u16) -> Vec<u8> {
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

    fn entry(out: &mut Vec<u8>, head: &str, charstring: &[u8], tail: &str) {
        let mut plain = vec![0u8; 4];
        plain.extend_from_slice(charstring);
        let cipher = encrypt(&plain, super::CHARSTRING_SEED);
        out.extend(format!("{} {} RD ", head, cipher.len()).bytes());
        out.extend(cipher);
        out.extend(format!(" {}\n", tail).bytes());
    }

    /// A binary-eexec program with `.notdef` followed by `glyphs`.
    pub(crate) fn build_type1(glyphs: &[(&str, Vec<u8>)], subrs: &[Vec<u8>]) -> Vec<u8> {
        let mut private = b"dup /Private 8 dict dup begin\n\
            /RD{string currentfile exch readstring pop}executeonly def\n\
            /ND{noaccess def}executeonly def\n\
            /NP{noaccess put}executeonly def\n\
            /lenIV 4 def\n\
            /BlueValues [-15 0 700 715] ND\n"
            .to_vec();
        private.extend(format!("/Subrs {} array\n", subrs.len()).bytes());
        for (i, subr) in subrs.iter().enumerate() {
            entry(&mut private, &format!("dup {}", i), subr, "NP");
        }
        private.extend(b"ND\n2 index /CharStrings ");
        private.extend(format!("{} dict dup begin\n", glyphs.len() + 1).bytes());
        entry(&mut private, "/.notdef", &program(&[(&[0, 250], &[13]), (&[], &[14])]), "ND");
        for (name, charstring) in glyphs {
            entry(&mut private, &format!("/{}", name), charstring, "ND");
        }
        private.extend(b"end\nend\nreadonly put\nnoaccess put\ndup /FontName get exch definefont pop\nmark currentfile closefile\n");

        let mut plain = b"SEED".to_vec();
        plain.extend(private);
        let mut out = b"%!PS-AdobeFont-1.0: Test 001.000\n\
            12 dict begin\n\
            /FontType 1 def\n\
            /FontName /Test def\n\
            /FontMatrix [0.001 0 0 0.001 0 0] readonly def\n\
            /FontBBox {0 -200 1000 900} readonly def\n\
            /Encoding StandardEncoding def\n\
            currentdict end\n\
            currentfile eexec\n"
            .to_vec();
        out.extend(encrypt(&plain, super::EEXEC_SEED));
        out.extend(std::iter::repeat_n(b'0', 64));
        out.extend(b"\ncleartomark\n");
        out
    }
}
