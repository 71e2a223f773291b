//! Type 2 charstring interpreter.
//!
//! Executes a glyph program into a [`PathSink`]. Hint operators are only
//! counted: the count decides how many mask bytes follow `hintmask` and
//! `cntrmask`, and the first stack-clearing operator may carry the advance
//! width as an extra leading operand.

use crate::bytes::Reader;
use crate::path::PathSink;

use super::Index;

const MAX_STACK: usize = 48;
const MAX_SUBR_DEPTH: usize = 10;
const TRANSIENT_SIZE: usize = 32;

mod op {
    pub const HSTEM: u8 = 1;
    pub const VSTEM: u8 = 3;
    pub const VMOVETO: u8 = 4;
    pub const RLINETO: u8 = 5;
    pub const HLINETO: u8 = 6;
    pub const VLINETO: u8 = 7;
    pub const RRCURVETO: u8 = 8;
    pub const CALLSUBR: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ESCAPE: u8 = 12;
    pub const ENDCHAR: u8 = 14;
    pub const HSTEMHM: u8 = 18;
    pub const HINTMASK: u8 = 19;
    pub const CNTRMASK: u8 = 20;
    pub const RMOVETO: u8 = 21;
    pub const HMOVETO: u8 = 22;
    pub const VSTEMHM: u8 = 23;
    pub const RCURVELINE: u8 = 24;
    pub const RLINECURVE: u8 = 25;
    pub const VVCURVETO: u8 = 26;
    pub const HHCURVETO: u8 = 27;
    pub const SHORTINT: u8 = 28;
    pub const CALLGSUBR: u8 = 29;
    pub const VHCURVETO: u8 = 30;
    pub const HVCURVETO: u8 = 31;
    pub const FIXED: u8 = 255;

    pub const DOTSECTION: u8 = 0;
    pub const AND: u8 = 3;
    pub const OR: u8 = 4;
    pub const NOT: u8 = 5;
    pub const ABS: u8 = 9;
    pub const ADD: u8 = 10;
    pub const SUB: u8 = 11;
    pub const DIV: u8 = 12;
    pub const NEG: u8 = 14;
    pub const EQ: u8 = 15;
    pub const DROP: u8 = 18;
    pub const PUT: u8 = 20;
    pub const GET: u8 = 21;
    pub const IFELSE: u8 = 22;
    pub const RANDOM: u8 = 23;
    pub const MUL: u8 = 24;
    pub const SQRT: u8 = 26;
    pub const DUP: u8 = 27;
    pub const EXCH: u8 = 28;
    pub const INDEX: u8 = 29;
    pub const ROLL: u8 = 30;
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
}

/// Subroutines and width defaults in effect for one glyph.
pub(crate) struct Context<'a> {
    pub global_subrs: &'a Index<'a>,
    pub local_subrs: &'a Index<'a>,
    pub default_width_x: f32,
    pub nominal_width_x: f32,
}

/// Accented glyph built from two StandardEncoding glyphs (`endchar` with
/// four operands).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Seac {
    pub adx: f32,
    pub ady: f32,
    pub base: u8,
    pub accent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Outcome {
    pub advance: f32,
    pub seac: Option<Seac>,
}

pub(crate) fn subr_bias(count: usize) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

enum Flow {
    Continue,
    Return,
    End,
}

struct Machine<'s> {
    sink: &'s mut dyn PathSink,
    stack: Vec<f32>,
    x: f32,
    y: f32,
    hints: usize,
    width: Option<f32>,
    width_checked: bool,
    open: bool,
    transient: [f32; TRANSIENT_SIZE],
    seac: Option<Seac>,
}

pub(crate) fn execute(
    program: &[u8],
    ctx: &Context<'_>,
    sink: &mut dyn PathSink,
) -> Result<Outcome, String> {
    let mut m = Machine {
        sink,
        stack: Vec::with_capacity(MAX_STACK),
        x: 0.,
        y: 0.,
        hints: 0,
        width: None,
        width_checked: false,
        open: false,
        transient: [0.; TRANSIENT_SIZE],
        seac: None,
    };
    match m.run(program, ctx, 0)? {
        Flow::End => {}
        Flow::Continue | Flow::Return => return Err("charstring ended without endchar".into()),
    }
    let advance = match m.width {
        Some(w) => ctx.nominal_width_x + w,
        None => ctx.default_width_x,
    };
    Ok(Outcome {
        advance,
        seac: m.seac,
    })
}

impl Machine<'_> {
    fn push(&mut self, v: f32) -> Result<(), String> {
        if self.stack.len() >= MAX_STACK {
            return Err("operand stack overflow".into());
        }
        self.stack.push(v);
        Ok(())
    }

    fn pop(&mut self) -> Result<f32, String> {
        self.stack.pop().ok_or_else(|| "operand stack underflow".to_string())
    }

    /// The first stack-clearing operator may carry the width as an extra
    /// leading operand.
    fn check_width(&mut self, has_width: bool) {
        if !self.width_checked {
            self.width_checked = true;
            if has_width && !self.stack.is_empty() {
                self.width = Some(self.stack.remove(0));
            }
        }
    }

    fn take(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.stack)
    }

    fn move_to(&mut self, dx: f32, dy: f32) {
        if self.open {
            self.sink.close_path();
        }
        self.x += dx;
        self.y += dy;
        self.sink.move_to(self.x, self.y);
        self.open = true;
    }

    fn line_to(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        self.sink.line_to(self.x, self.y);
    }

    fn curve_to(&mut self, d: [f32; 6]) {
        let (x1, y1) = (self.x + d[0], self.y + d[1]);
        let (x2, y2) = (x1 + d[2], y1 + d[3]);
        let (x3, y3) = (x2 + d[4], y2 + d[5]);
        self.sink.curve_to(x1, y1, x2, y2, x3, y3);
        self.x = x3;
        self.y = y3;
    }

    fn stems(&mut self) {
        self.check_width(self.stack.len() % 2 == 1);
        self.hints += self.stack.len() / 2;
        self.stack.clear();
    }

    fn run(&mut self, program: &[u8], ctx: &Context<'_>, depth: usize) -> Result<Flow, String> {
        if depth > MAX_SUBR_DEPTH {
            return Err("subroutine nesting too deep".into());
        }
        let mut r = Reader::new(program);
        let eof = |_| "unexpected end of charstring".to_string();
        while !r.is_empty() {
            let b0 = r.read_u8().map_err(eof)?;
            match b0 {
                32..=246 => self.push(b0 as f32 - 139.)?,
                247..=250 => {
                    let b1 = r.read_u8().map_err(eof)?;
                    self.push((b0 as f32 - 247.) * 256. + b1 as f32 + 108.)?;
                }
                251..=254 => {
                    let b1 = r.read_u8().map_err(eof)?;
                    self.push(-(b0 as f32 - 251.) * 256. - b1 as f32 - 108.)?;
                }
                op::SHORTINT => {
                    let v = r.read_i16().map_err(eof)?;
                    self.push(v as f32)?;
                }
                op::FIXED => {
                    let v = r.read_i32().map_err(eof)?;
                    self.push(v as f32 / 65536.)?;
                }
                _ => match self.operator(b0, &mut r, ctx, depth)? {
                    Flow::Continue => {}
                    flow => return Ok(flow),
                },
            }
        }
        Ok(Flow::Continue)
    }

    fn operator(
        &mut self,
        b0: u8,
        r: &mut Reader<'_>,
        ctx: &Context<'_>,
        depth: usize,
    ) -> Result<Flow, String> {
        match b0 {
            op::HSTEM | op::VSTEM | op::HSTEMHM | op::VSTEMHM => self.stems(),
            op::HINTMASK | op::CNTRMASK => {
                // pending operands are an implicit vstem
                self.stems();
                let mask_len = self.hints.div_ceil(8);
                r.skip(mask_len)
                    .map_err(|_| "hint mask runs past end of charstring".to_string())?;
            }
            op::RMOVETO => {
                self.check_width(self.stack.len() > 2);
                let s = self.take();
                let [dx, dy] = last_n(&s)?;
                self.move_to(dx, dy);
            }
            op::HMOVETO => {
                self.check_width(self.stack.len() > 1);
                let s = self.take();
                let [dx] = last_n(&s)?;
                self.move_to(dx, 0.);
            }
            op::VMOVETO => {
                self.check_width(self.stack.len() > 1);
                let s = self.take();
                let [dy] = last_n(&s)?;
                self.move_to(0., dy);
            }
            op::RLINETO => {
                let s = self.take();
                if s.is_empty() || s.len() % 2 != 0 {
                    return Err(format!("rlineto with {} operands", s.len()));
                }
                for pair in s.chunks_exact(2) {
                    self.line_to(pair[0], pair[1]);
                }
            }
            op::HLINETO | op::VLINETO => {
                let s = self.take();
                if s.is_empty() {
                    return Err("line operator without operands".into());
                }
                let mut horizontal = b0 == op::HLINETO;
                for &d in &s {
                    if horizontal {
                        self.line_to(d, 0.);
                    } else {
                        self.line_to(0., d);
                    }
                    horizontal = !horizontal;
                }
            }
            op::RRCURVETO => {
                let s = self.take();
                if s.is_empty() || s.len() % 6 != 0 {
                    return Err(format!("rrcurveto with {} operands", s.len()));
                }
                for c in s.chunks_exact(6) {
                    self.curve_to([c[0], c[1], c[2], c[3], c[4], c[5]]);
                }
            }
            op::HHCURVETO => {
                let s = self.take();
                let (mut dy1, rest) = split_odd(&s);
                if rest.is_empty() || rest.len() % 4 != 0 {
                    return Err(format!("hhcurveto with {} operands", s.len()));
                }
                for c in rest.chunks_exact(4) {
                    self.curve_to([c[0], dy1, c[1], c[2], c[3], 0.]);
                    dy1 = 0.;
                }
            }
            op::VVCURVETO => {
                let s = self.take();
                let (mut dx1, rest) = split_odd(&s);
                if rest.is_empty() || rest.len() % 4 != 0 {
                    return Err(format!("vvcurveto with {} operands", s.len()));
                }
                for c in rest.chunks_exact(4) {
                    self.curve_to([dx1, c[0], c[1], c[2], 0., c[3]]);
                    dx1 = 0.;
                }
            }
            op::HVCURVETO | op::VHCURVETO => {
                let s = self.take();
                if s.len() < 4 {
                    return Err(format!("hv/vhcurveto with {} operands", s.len()));
                }
                let mut horizontal = b0 == op::HVCURVETO;
                let mut i = 0;
                while s.len() - i >= 4 {
                    let last = if s.len() - i == 5 { s[i + 4] } else { 0. };
                    if horizontal {
                        self.curve_to([s[i], 0., s[i + 1], s[i + 2], last, s[i + 3]]);
                    } else {
                        self.curve_to([0., s[i], s[i + 1], s[i + 2], s[i + 3], last]);
                    }
                    i += if s.len() - i == 5 { 5 } else { 4 };
                    horizontal = !horizontal;
                }
                if i != s.len() {
                    return Err(format!("hv/vhcurveto with {} operands", s.len()));
                }
            }
            op::RCURVELINE => {
                let s = self.take();
                if s.len() < 8 || (s.len() - 2) % 6 != 0 {
                    return Err(format!("rcurveline with {} operands", s.len()));
                }
                let (curves, line) = s.split_at(s.len() - 2);
                for c in curves.chunks_exact(6) {
                    self.curve_to([c[0], c[1], c[2], c[3], c[4], c[5]]);
                }
                self.line_to(line[0], line[1]);
            }
            op::RLINECURVE => {
                let s = self.take();
                if s.len() < 8 || (s.len() - 6) % 2 != 0 {
                    return Err(format!("rlinecurve with {} operands", s.len()));
                }
                let (lines, c) = s.split_at(s.len() - 6);
                for pair in lines.chunks_exact(2) {
                    self.line_to(pair[0], pair[1]);
                }
                self.curve_to([c[0], c[1], c[2], c[3], c[4], c[5]]);
            }
            op::CALLSUBR | op::CALLGSUBR => {
                let subrs = if b0 == op::CALLSUBR {
                    ctx.local_subrs
                } else {
                    ctx.global_subrs
                };
                let index = self.pop()? as i32 + subr_bias(subrs.len());
                let subr = usize::try_from(index)
                    .ok()
                    .and_then(|i| subrs.get(i))
                    .ok_or_else(|| format!("subroutine {} out of range", index))?;
                if let Flow::End = self.run(subr, ctx, depth + 1)? {
                    return Ok(Flow::End);
                }
            }
            op::RETURN => return Ok(Flow::Return),
            op::ENDCHAR => {
                self.check_width(self.stack.len() == 1 || self.stack.len() == 5);
                let s = self.take();
                if let [adx, ady, base, accent] = s[..] {
                    self.seac = Some(Seac {
                        adx,
                        ady,
                        base: base as u8,
                        accent: accent as u8,
                    });
                }
                if self.open {
                    self.sink.close_path();
                    self.open = false;
                }
                return Ok(Flow::End);
            }
            op::ESCAPE => {
                let b1 = r
                    .read_u8()
                    .map_err(|_| "unexpected end of charstring".to_string())?;
                self.escape(b1)?;
            }
            _ => return Err(format!("reserved operator {}", b0)),
        }
        Ok(Flow::Continue)
    }

    fn escape(&mut self, b1: u8) -> Result<(), String> {
        match b1 {
            op::DOTSECTION => self.stack.clear(),
            op::FLEX => {
                let s = self.take();
                let d: [f32; 13] = exact(&s, "flex")?;
                self.curve_to([d[0], d[1], d[2], d[3], d[4], d[5]]);
                self.curve_to([d[6], d[7], d[8], d[9], d[10], d[11]]);
            }
            op::HFLEX => {
                let s = self.take();
                let d: [f32; 7] = exact(&s, "hflex")?;
                self.curve_to([d[0], 0., d[1], d[2], d[3], 0.]);
                self.curve_to([d[4], 0., d[5], -d[2], d[6], 0.]);
            }
            op::HFLEX1 => {
                let s = self.take();
                let d: [f32; 9] = exact(&s, "hflex1")?;
                self.curve_to([d[0], d[1], d[2], d[3], d[4], 0.]);
                self.curve_to([d[5], 0., d[6], d[7], d[8], -(d[1] + d[3] + d[7])]);
            }
            op::FLEX1 => {
                let s = self.take();
                let d: [f32; 11] = exact(&s, "flex1")?;
                let dx: f32 = d[0] + d[2] + d[4] + d[6] + d[8];
                let dy: f32 = d[1] + d[3] + d[5] + d[7] + d[9];
                let (dx6, dy6) = if dx.abs() > dy.abs() {
                    (d[10], -dy)
                } else {
                    (-dx, d[10])
                };
                self.curve_to([d[0], d[1], d[2], d[3], d[4], d[5]]);
                self.curve_to([d[6], d[7], d[8], d[9], dx6, dy6]);
            }
            op::AND => {
                let (a, b) = self.pop2()?;
                self.push(bool_num(a != 0. && b != 0.))?;
            }
            op::OR => {
                let (a, b) = self.pop2()?;
                self.push(bool_num(a != 0. || b != 0.))?;
            }
            op::NOT => {
                let a = self.pop()?;
                self.push(bool_num(a == 0.))?;
            }
            op::ABS => {
                let a = self.pop()?;
                self.push(a.abs())?;
            }
            op::ADD => {
                let (a, b) = self.pop2()?;
                self.push(a + b)?;
            }
            op::SUB => {
                let (a, b) = self.pop2()?;
                self.push(a - b)?;
            }
            op::DIV => {
                let (a, b) = self.pop2()?;
                if b == 0. {
                    return Err("division by zero".into());
                }
                self.push(a / b)?;
            }
            op::NEG => {
                let a = self.pop()?;
                self.push(-a)?;
            }
            op::EQ => {
                let (a, b) = self.pop2()?;
                self.push(bool_num(a == b))?;
            }
            op::DROP => {
                self.pop()?;
            }
            op::PUT => {
                let (value, i) = self.pop2()?;
                let slot = transient_slot(i)?;
                self.transient[slot] = value;
            }
            op::GET => {
                let i = self.pop()?;
                let slot = transient_slot(i)?;
                self.push(self.transient[slot])?;
            }
            op::IFELSE => {
                let (v1, v2) = self.pop2()?;
                let (s1, s2) = self.pop2()?;
                self.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            // deterministic so repeated decodes agree
            op::RANDOM => self.push(0.5)?,
            op::MUL => {
                let (a, b) = self.pop2()?;
                self.push(a * b)?;
            }
            op::SQRT => {
                let a = self.pop()?;
                self.push(a.max(0.).sqrt())?;
            }
            op::DUP => {
                let a = self.pop()?;
                self.push(a)?;
                self.push(a)?;
            }
            op::EXCH => {
                let (a, b) = self.pop2()?;
                self.push(b)?;
                self.push(a)?;
            }
            op::INDEX => {
                let i = self.pop()?;
                let len = self.stack.len();
                if len == 0 {
                    return Err("index on empty stack".into());
                }
                let i = if i < 0. { 0 } else { i as usize };
                let v = len
                    .checked_sub(i.saturating_add(1))
                    .and_then(|k| self.stack.get(k).copied())
                    .ok_or_else(|| "index out of range".to_string())?;
                self.push(v)?;
            }
            op::ROLL => {
                let (n, j) = self.pop2()?;
                let n = n as i64;
                let len = self.stack.len() as i64;
                if n <= 0 || n > len {
                    return Err("roll out of range".into());
                }
                let start = (len - n) as usize;
                let shift = (j as i64).rem_euclid(n) as usize;
                self.stack[start..].rotate_right(shift);
            }
            _ => return Err(format!("reserved escape operator {}", b1)),
        }
        Ok(())
    }

    fn pop2(&mut self) -> Result<(f32, f32), String> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }
}

fn bool_num(b: bool) -> f32 {
    if b { 1. } else { 0. }
}

fn transient_slot(i: f32) -> Result<usize, String> {
    if i >= 0. && (i as usize) < TRANSIENT_SIZE {
        Ok(i as usize)
    } else {
        Err(format!("transient array index {} out of range", i))
    }
}

fn last_n<const N: usize>(s: &[f32]) -> Result<[f32; N], String> {
    if s.len() < N {
        return Err("operand stack underflow".into());
    }
    let mut out = [0.; N];
    out.copy_from_slice(&s[s.len() - N..]);
    Ok(out)
}

fn exact<const N: usize>(s: &[f32], name: &str) -> Result<[f32; N], String> {
    if s.len() != N {
        return Err(format!("{} with {} operands", name, s.len()));
    }
    last_n(s)
}

fn split_odd(s: &[f32]) -> (f32, &[f32]) {
    if s.len() % 2 == 1 {
        (s[0], &s[1..])
    } else {
        (0., s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cff::testing::encode_index;
    use crate::path::{GlyphOutline, PathSegment};

    fn run(program: &[u8]) -> (Result<Outcome, String>, GlyphOutline) {
        let empty = Index::default();
        let ctx = Context {
            global_subrs: &empty,
            local_subrs: &empty,
            default_width_x: 500.,
            nominal_width_x: 600.,
        };
        let mut outline = GlyphOutline::new();
        let result = execute(program, &ctx, &mut outline);
        (result, outline)
    }

    /// Encodes small integers the way compilers emit them.
    fn num(v: i32) -> Vec<u8> {
        match v {
            -107..=107 => vec![(v + 139) as u8],
            108..=1131 => {
                let v = v - 108;
                vec![(v / 256 + 247) as u8, (v % 256) as u8]
            }
            -1131..=-108 => {
                let v = -v - 108;
                vec![(v / 256 + 251) as u8, (v % 256) as u8]
            }
            _ => {
                let b = (v as i16).to_be_bytes();
                vec![28, b[0], b[1]]
            }
        }
    }

    fn program(parts: &[&[i32]], ops: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for (args, ops) in parts.iter().zip(ops) {
            for &a in *args {
                out.extend(num(a));
            }
            out.extend_from_slice(ops);
        }
        out
    }

    #[test_log::test]
    fn hintmask_skips_mask_bytes() {
        // two stems, then a mask byte that would read as an operand
        let p = program(
            &[&[10, 20, 300, 20], &[], &[100, 100], &[500, 0, 0, 500, -500, 0], &[]],
            &[&[op::HSTEMHM], &[op::HINTMASK, 0xc0], &[op::RMOVETO], &[op::RLINETO], &[op::ENDCHAR]],
        );
        let (result, outline) = run(&p);
        let outcome = result.unwrap();
        assert_eq!(outcome.advance, 500.);
        assert_eq!(outline.segments[0], PathSegment::MoveTo(100., 100.));
        assert_eq!(outline.segments[3], PathSegment::LineTo(100., 600.));
        assert_eq!(outline.segments.last(), Some(&PathSegment::Close));
    }

    #[test_log::test]
    fn hinted_square_rasterizes_filled() {
        let p = program(
            &[&[10, 20, 300, 20], &[], &[100, 100], &[500, 0, 0, 500, -500, 0, 0, -500], &[]],
            &[&[op::HSTEMHM], &[op::HINTMASK, 0xc0], &[op::RMOVETO], &[op::RLINETO], &[op::ENDCHAR]],
        );
        let (result, outline) = run(&p);
        result.unwrap();
        let image = crate::raster::render_outline(&outline, 0.04, 1000., 0).unwrap();
        let bitmap = &image.bitmap;
        assert_eq!((bitmap.width(), bitmap.height()), (21, 21));
        assert_eq!(bitmap.black_count(), 21 * 21);
        let b = image.bounds;
        for (got, want) in [(b.x_min, 0.1), (b.y_min, 0.1), (b.x_max, 0.6), (b.y_max, 0.6)] {
            assert!((got - want).abs() <= 0.03, "{} vs {}", got, want);
        }
    }

    #[test_log::test]
    fn leading_width_operand() {
        let p = program(&[&[-50, 10, 20], &[]], &[&[op::RMOVETO], &[op::ENDCHAR]]);
        let (result, outline) = run(&p);
        assert_eq!(result.unwrap().advance, 550.);
        assert_eq!(outline.segments[0], PathSegment::MoveTo(10., 20.));
    }

    #[test_log::test]
    fn hvcurveto_alternates_with_final_delta() {
        let p = program(
            &[&[0, 0], &[10, 5, 5, 10, 10, 5, 5, 10, 3], &[]],
            &[&[op::RMOVETO], &[op::HVCURVETO], &[op::ENDCHAR]],
        );
        let (result, outline) = run(&p);
        result.unwrap();
        assert_eq!(
            outline.segments[1],
            PathSegment::CurveTo(10., 0., 15., 5., 15., 15.)
        );
        assert_eq!(
            outline.segments[2],
            PathSegment::CurveTo(15., 25., 20., 30., 30., 33.)
        );
    }

    #[test_log::test]
    fn subroutine_calls_use_bias() {
        let subr = program(&[&[100, 0]], &[&[op::RLINETO, op::RETURN]]);
        let bytes = encode_index(&[&subr]);
        let (subrs, _) = Index::parse(&bytes, 0).unwrap();
        let empty = Index::default();
        let ctx = Context {
            global_subrs: &empty,
            local_subrs: &subrs,
            default_width_x: 0.,
            nominal_width_x: 0.,
        };
        let p = program(&[&[0, 0], &[-107], &[]], &[&[op::RMOVETO], &[op::CALLSUBR], &[op::ENDCHAR]]);
        let mut outline = GlyphOutline::new();
        execute(&p, &ctx, &mut outline).unwrap();
        assert_eq!(outline.segments[1], PathSegment::LineTo(100., 0.));
    }

    #[test_log::test]
    fn recursive_subroutine_is_rejected() {
        let subr = program(&[&[-107]], &[&[op::CALLSUBR]]);
        let bytes = encode_index(&[&subr]);
        let (subrs, _) = Index::parse(&bytes, 0).unwrap();
        let empty = Index::default();
        let ctx = Context {
            global_subrs: &empty,
            local_subrs: &subrs,
            default_width_x: 0.,
            nominal_width_x: 0.,
        };
        let p = program(&[&[-107]], &[&[op::CALLSUBR]]);
        let err = execute(&p, &ctx, &mut GlyphOutline::new()).unwrap_err();
        assert!(err.contains("too deep"));
    }

    #[test_log::test]
    fn truncated_program_is_an_error() {
        let p = program(&[&[0, 0], &[10, 10]], &[&[op::RMOVETO], &[op::RLINETO]]);
        assert!(run(&p).0.is_err());
        assert!(run(&[op::SHORTINT, 0x01]).0.is_err());
        assert!(run(&[2]).0.is_err());
    }

    #[test_log::test]
    fn arithmetic_escapes() {
        // 3 4 add 2 mul -> 14, used as an hmoveto delta
        let mut p = program(&[&[3, 4]], &[&[op::ESCAPE, op::ADD]]);
        p.extend(program(&[&[2]], &[&[op::ESCAPE, op::MUL]]));
        p.extend(program(&[&[], &[]], &[&[op::HMOVETO], &[op::ENDCHAR]]));
        let (result, outline) = run(&p);
        result.unwrap();
        assert_eq!(outline.segments[0], PathSegment::MoveTo(14., 0.));
    }

    #[test_log::test]
    fn endchar_with_four_operands_requests_accent() {
        let p = program(&[&[0, 0], &[50, 200, 65, 194]], &[&[op::RMOVETO], &[op::ENDCHAR]]);
        let outcome = run(&p).0.unwrap();
        assert_eq!(
            outcome.seac,
            Some(Seac {
                adx: 50.,
                ady: 200.,
                base: 65,
                accent: 194
            })
        );
    }
}
