//! Type 1 charstring interpreter.
//!
//! Hints are dropped. Flex and hint replacement arrive through
//! `callothersubr`; flex points are collected from the `rmoveto`s between
//! othersubrs 1 and 0 and drawn as two curves.

use crate::bytes::Reader;
use crate::path::PathSink;

const MAX_STACK: usize = 48;
const MAX_SUBR_DEPTH: usize = 10;

mod op {
    pub const HSTEM: u8 = 1;
    pub const VSTEM: u8 = 3;
    pub const VMOVETO: u8 = 4;
    pub const RLINETO: u8 = 5;
    pub const HLINETO: u8 = 6;
    pub const VLINETO: u8 = 7;
    pub const RRCURVETO: u8 = 8;
    pub const CLOSEPATH: u8 = 9;
    pub const CALLSUBR: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ESCAPE: u8 = 12;
    pub const HSBW: u8 = 13;
    pub const ENDCHAR: u8 = 14;
    pub const RMOVETO: u8 = 21;
    pub const HMOVETO: u8 = 22;
    pub const VHCURVETO: u8 = 30;
    pub const HVCURVETO: u8 = 31;
    pub const LONGINT: u8 = 255;

    pub const DOTSECTION: u8 = 0;
    pub const VSTEM3: u8 = 1;
    pub const HSTEM3: u8 = 2;
    pub const SEAC: u8 = 6;
    pub const SBW: u8 = 7;
    pub const DIV: u8 = 12;
    pub const CALLOTHERSUBR: u8 = 16;
    pub const POP: u8 = 17;
    pub const SETCURRENTPOINT: u8 = 33;
}

/// Accented glyph: `bchar` drawn at the origin, `achar` shifted by
/// `(adx - asb, ady)`. Both are StandardEncoding codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Seac {
    pub dx: f32,
    pub dy: f32,
    pub base: u8,
    pub accent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Outcome {
    pub advance: f32,
    pub seac: Option<Seac>,
}

enum Flow {
    Continue,
    Return,
    End,
}

struct Machine<'s> {
    sink: &'s mut dyn PathSink,
    stack: Vec<f32>,
    /// Results of the last `callothersubr`, read back by `pop`.
    ps_stack: Vec<f32>,
    x: f32,
    y: f32,
    advance: f32,
    open: bool,
    flex: Option<Vec<(f32, f32)>>,
    seac: Option<Seac>,
}

/// Runs one decrypted glyph program. `subrs` are decrypted too.
pub(crate) fn execute(
    program: &[u8],
    subrs: &[Vec<u8>],
    sink: &mut dyn PathSink,
) -> Result<Outcome, String> {
    let mut m = Machine {
        sink,
        stack: Vec::with_capacity(MAX_STACK),
        ps_stack: Vec::new(),
        x: 0.,
        y: 0.,
        advance: 0.,
        open: false,
        flex: None,
        seac: None,
    };
    match m.run(program, subrs, 0)? {
        Flow::End => {}
        Flow::Continue | Flow::Return => return Err("charstring ended without endchar".into()),
    }
    Ok(Outcome {
        advance: m.advance,
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

    fn args<const N: usize>(&mut self, name: &str) -> Result<[f32; N], String> {
        if self.stack.len() < N {
            return Err(format!("{} with {} operands", name, self.stack.len()));
        }
        let mut out = [0.; N];
        out.copy_from_slice(&self.stack[self.stack.len() - N..]);
        self.stack.clear();
        Ok(out)
    }

    fn move_to(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        if let Some(points) = &mut self.flex {
            points.push((self.x, self.y));
            return;
        }
        if self.open {
            self.sink.close_path();
        }
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

    fn close(&mut self) {
        if self.open {
            self.sink.close_path();
            self.open = false;
        }
    }

    fn run(&mut self, program: &[u8], subrs: &[Vec<u8>], depth: usize) -> Result<Flow, String> {
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
                op::LONGINT => {
                    let v = r.read_i32().map_err(eof)?;
                    self.push(v as f32)?;
                }
                op::ESCAPE => {
                    let b1 = r.read_u8().map_err(eof)?;
                    match self.escape(b1)? {
                        Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
                _ => match self.operator(b0, subrs, depth)? {
                    Flow::Continue => {}
                    flow => return Ok(flow),
                },
            }
        }
        Ok(Flow::Continue)
    }

    fn call(&mut self, index: f32, subrs: &[Vec<u8>], depth: usize) -> Result<Flow, String> {
        let subr = usize::try_from(index as i64)
            .ok()
            .and_then(|i| subrs.get(i))
            .ok_or_else(|| format!("subroutine {} out of range", index))?;
        match self.run(subr, subrs, depth + 1)? {
            Flow::End => Ok(Flow::End),
            Flow::Continue | Flow::Return => Ok(Flow::Continue),
        }
    }

    fn operator(&mut self, b0: u8, subrs: &[Vec<u8>], depth: usize) -> Result<Flow, String> {
        match b0 {
            op::HSTEM | op::VSTEM => self.stack.clear(),
            op::HSBW => {
                let [sbx, wx] = self.args("hsbw")?;
                self.x = sbx;
                self.y = 0.;
                self.advance = wx;
            }
            op::RMOVETO => {
                let [dx, dy] = self.args("rmoveto")?;
                self.move_to(dx, dy);
            }
            op::HMOVETO => {
                let [dx] = self.args("hmoveto")?;
                self.move_to(dx, 0.);
            }
            op::VMOVETO => {
                let [dy] = self.args("vmoveto")?;
                self.move_to(0., dy);
            }
            op::RLINETO => {
                let [dx, dy] = self.args("rlineto")?;
                self.line_to(dx, dy);
            }
            op::HLINETO => {
                let [dx] = self.args("hlineto")?;
                self.line_to(dx, 0.);
            }
            op::VLINETO => {
                let [dy] = self.args("vlineto")?;
                self.line_to(0., dy);
            }
            op::RRCURVETO => {
                let d = self.args("rrcurveto")?;
                self.curve_to(d);
            }
            op::VHCURVETO => {
                let [dy1, dx2, dy2, dx3] = self.args("vhcurveto")?;
                self.curve_to([0., dy1, dx2, dy2, dx3, 0.]);
            }
            op::HVCURVETO => {
                let [dx1, dx2, dy2, dy3] = self.args("hvcurveto")?;
                self.curve_to([dx1, 0., dx2, dy2, 0., dy3]);
            }
            op::CLOSEPATH => {
                self.stack.clear();
                self.close();
            }
            op::CALLSUBR => {
                let index = self.pop()?;
                return self.call(index, subrs, depth);
            }
            op::RETURN => return Ok(Flow::Return),
            op::ENDCHAR => {
                self.stack.clear();
                self.close();
                return Ok(Flow::End);
            }
            _ => return Err(format!("reserved operator {}", b0)),
        }
        Ok(Flow::Continue)
    }

    fn escape(&mut self, b1: u8) -> Result<Flow, String> {
        match b1 {
            op::DOTSECTION | op::VSTEM3 | op::HSTEM3 => self.stack.clear(),
            op::SBW => {
                let [sbx, sby, wx, _wy] = self.args("sbw")?;
                self.x = sbx;
                self.y = sby;
                self.advance = wx;
            }
            op::SEAC => {
                let [asb, adx, ady, base, accent] = self.args("seac")?;
                let code = |v: f32| u8::try_from(v as i64).map_err(|_| format!("seac code {}", v));
                self.seac = Some(Seac {
                    dx: adx - asb,
                    dy: ady,
                    base: code(base)?,
                    accent: code(accent)?,
                });
                self.close();
                return Ok(Flow::End);
            }
            op::DIV => {
                let b = self.pop()?;
                let a = self.pop()?;
                if b == 0. {
                    return Err("division by zero".into());
                }
                self.push(a / b)?;
            }
            op::CALLOTHERSUBR => self.other_subr()?,
            op::POP => {
                let v = self
                    .ps_stack
                    .pop()
                    .ok_or_else(|| "pop without othersubr result".to_string())?;
                self.push(v)?;
            }
            op::SETCURRENTPOINT => {
                let [x, y] = self.args("setcurrentpoint")?;
                self.x = x;
                self.y = y;
            }
            _ => return Err(format!("reserved escape operator {}", b1)),
        }
        Ok(Flow::Continue)
    }

    fn other_subr(&mut self) -> Result<(), String> {
        let number = self.pop()?;
        let count = self.pop()?;
        let count = usize::try_from(count as i64)
            .ok()
            .filter(|&n| n <= self.stack.len())
            .ok_or_else(|| format!("callothersubr with {} arguments", count))?;
        let args = self.stack.split_off(self.stack.len() - count);
        self.ps_stack.clear();
        match number as i64 {
            // end flex: reference point plus six curve points
            0 => {
                let points = self
                    .flex
                    .take()
                    .ok_or_else(|| "flex end without start".to_string())?;
                let [_, p1, p2, p3, p4, p5, p6] = <[(f32, f32); 7]>::try_from(points)
                    .map_err(|p| format!("flex with {} points", p.len()))?;
                self.sink.curve_to(p1.0, p1.1, p2.0, p2.1, p3.0, p3.1);
                self.sink.curve_to(p4.0, p4.1, p5.0, p5.1, p6.0, p6.1);
                self.x = p6.0;
                self.y = p6.1;
                self.ps_stack.extend([self.y, self.x]);
            }
            1 => {
                self.flex = Some(Vec::with_capacity(7));
            }
            2 => {}
            // hint replacement: the subr number comes back for `pop callsubr`
            _ => self.ps_stack.extend(args.iter().rev()),
        }
        Ok(())
    }
}
