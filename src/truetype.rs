//! TrueType programs (FontFile2 and OpenType containers). Tables and `cmap`
//! subtables come from `ttf-parser`; `glyf` outlines are executed here so
//! each used glyph decodes on its own.

use std::collections::HashMap;

use tracing::{debug, trace, warn};
use ttf_parser::{GlyphId, PlatformId, RawFace, Tag, cmap, head, hhea, hmtx, loca, maxp};

use crate::bytes::{ReadResult, Reader};
use crate::error::{DecodeError, Result};
use crate::path::PathSink;

const MAX_COMPONENT_DEPTH: usize = 8;

fn malformed(what: impl Into<String>) -> DecodeError {
    DecodeError::MalformedProgram(what.into())
}

fn raw_face(data: &[u8]) -> Result<RawFace<'_>> {
    RawFace::parse(data, 0).map_err(|e| malformed(format!("sfnt: {}", e)))
}

/// The `CFF ` table of an OpenType container with CFF outlines.
pub(crate) fn cff_table(data: &[u8]) -> Result<Option<&[u8]>> {
    Ok(raw_face(data)?.table(Tag::from_bytes(b"CFF ")))
}

/// Readable subtables with a format that maps single codes.
fn usable_subtables(table: cmap::Table<'_>) -> Vec<cmap::Subtable<'_>> {
    let subtables = table.subtables;
    (0..subtables.len())
        .filter_map(|i| {
            let sub = subtables.get(i);
            let unsupported = match &sub {
                None => Some(format!("cmap subtable {} is unreadable or of unknown format", i)),
                Some(s) => matches!(
                    s.format,
                    cmap::Format::MixedCoverage | cmap::Format::UnicodeVariationSequences(_)
                )
                .then(|| format!("cmap subtable ({:?}, {}) format", s.platform_id, s.encoding_id)),
            };
            if let Some(what) = unsupported {
                warn!("{}, skipped", DecodeError::UnsupportedProgramVariant(what));
                return None;
            }
            sub
        })
        .collect()
}

#[derive(Debug)]
pub struct TrueTypeFont<'a> {
    glyf: &'a [u8],
    loca: loca::Table<'a>,
    num_glyphs: u16,
    units_per_em: u16,
    hmtx: Option<hmtx::Table<'a>>,
    cmaps: Vec<cmap::Subtable<'a>>,
}

impl<'a> TrueTypeFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<TrueTypeFont<'a>> {
        let face = raw_face(data)?;
        let table = |tag: &[u8; 4]| face.table(Tag::from_bytes(tag));
        let head = table(b"head")
            .and_then(head::Table::parse)
            .ok_or_else(|| malformed("missing or malformed head table"))?;
        let maxp = table(b"maxp")
            .and_then(maxp::Table::parse)
            .ok_or_else(|| malformed("missing or malformed maxp table"))?;
        let loca = table(b"loca")
            .and_then(|data| {
                loca::Table::parse(maxp.number_of_glyphs, head.index_to_location_format, data)
            })
            .filter(|loca| loca.len() >= 2)
            .ok_or_else(|| malformed("missing or empty loca table"))?;
        let glyf = table(b"glyf").ok_or_else(|| malformed("no glyf table"))?;

        let hmtx = table(b"hhea").and_then(hhea::Table::parse).and_then(|hhea| {
            hmtx::Table::parse(hhea.number_of_metrics, maxp.number_of_glyphs, table(b"hmtx")?)
        });
        if hmtx.is_none() {
            debug!("no usable hhea/hmtx, advances unavailable");
        }
        let cmaps = table(b"cmap")
            .and_then(cmap::Table::parse)
            .map(usable_subtables)
            .unwrap_or_default();

        let num_glyphs = maxp.number_of_glyphs.get().min(loca.len() - 1);
        debug!(
            "parsed TrueType font: {} glyphs, {} units/em, {} cmap subtables",
            num_glyphs,
            head.units_per_em,
            cmaps.len()
        );
        Ok(TrueTypeFont {
            glyf,
            loca,
            num_glyphs,
            units_per_em: head.units_per_em,
            hmtx,
            cmaps,
        })
    }

    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs as usize
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em as f32
    }

    /// Advance width in font units from `hmtx`.
    pub fn advance(&self, gid: u16) -> Option<f32> {
        self.hmtx?.advance(GlyphId(gid)).map(f32::from)
    }

    pub(crate) fn has_cmap(&self, platform: PlatformId, encoding: u16) -> bool {
        self.cmaps
            .iter()
            .any(|s| s.platform_id == platform && s.encoding_id == encoding)
    }

    /// Looks `code` up in every (platform, encoding) subtable until one maps
    /// it. Missing subtables and unmapped codes give `None`.
    pub(crate) fn lookup(&self, platform: PlatformId, encoding: u16, code: u32) -> Option<u16> {
        self.cmaps
            .iter()
            .filter(|s| s.platform_id == platform && s.encoding_id == encoding)
            .find_map(|s| s.glyph_index(code))
            .map(|gid| gid.0)
            .filter(|&gid| gid != 0)
    }

    /// Glyph for a code of a simple (non-CID) font. The symbol cmap is
    /// tried with the code and its 0xF000 page, then the Unicode cmap
    /// through `unicode`, then the Macintosh cmap. Fonts without a usable
    /// cmap are indexed by code.
    pub(crate) fn gid_for_simple_code(&self, code: u8, unicode: Option<char>) -> Option<u16> {
        if self.cmaps.is_empty() {
            let gid = code as u16;
            return (gid < self.num_glyphs).then_some(gid);
        }
        if self.has_cmap(PlatformId::Windows, 0) {
            let symbol = [0, 0xf000, 0xf100, 0xf200]
                .into_iter()
                .find_map(|page| self.lookup(PlatformId::Windows, 0, page | code as u32));
            if symbol.is_some() {
                return symbol;
            }
        }
        unicode
            .and_then(|ch| self.lookup(PlatformId::Windows, 1, ch as u32))
            .or_else(|| self.lookup(PlatformId::Macintosh, 0, code as u32))
    }

    fn glyph_data(&self, gid: u16) -> Result<&'a [u8]> {
        if gid >= self.num_glyphs {
            return Err(DecodeError::glyph(gid as u32, "glyph index out of range"));
        }
        // equal offsets mark a glyph without contours
        match self.loca.glyph_range(GlyphId(gid)) {
            None => Ok(&[]),
            Some(range) => self
                .glyf
                .get(range)
                .ok_or_else(|| DecodeError::glyph(gid as u32, "glyph data past end of glyf")),
        }
    }

    /// Parses `gids` and every component they reference into an arena.
    pub fn load_glyphs(&self, gids: impl IntoIterator<Item = u16>) -> GlyphArena {
        let mut arena = GlyphArena::default();
        let mut pending: Vec<(u16, usize)> = gids.into_iter().map(|g| (g, 0)).collect();
        while let Some((gid, depth)) = pending.pop() {
            if arena.glyphs.contains_key(&gid) || arena.failed.contains_key(&gid) {
                continue;
            }
            match self.glyph_data(gid).and_then(|data| parse_glyph(gid, data)) {
                Ok(glyph) => {
                    if let Glyph::Compound(components) = &glyph {
                        if depth >= MAX_COMPONENT_DEPTH {
                            arena.failed.insert(
                                gid,
                                DecodeError::glyph(gid as u32, "compound glyph nesting too deep"),
                            );
                            continue;
                        }
                        pending.extend(components.iter().map(|c| (c.gid, depth + 1)));
                    }
                    arena.glyphs.insert(gid, glyph);
                }
                Err(e) => {
                    arena.failed.insert(gid, e);
                }
            }
        }
        trace!("loaded {} glyphs", arena.glyphs.len());
        arena
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
    on_curve: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Component {
    gid: u16,
    dx: f32,
    dy: f32,
    /// Scale or 2x2 matrix; parsed but not applied.
    matrix: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
enum Glyph {
    Empty,
    Simple(Vec<Vec<Point>>),
    Compound(Vec<Component>),
}

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

fn parse_glyph(gid: u16, data: &[u8]) -> Result<Glyph> {
    if data.is_empty() {
        return Ok(Glyph::Empty);
    }
    let fail = |what: &str| DecodeError::glyph(gid as u32, what);
    let mut r = Reader::new(data);
    let contours = r.read_i16().map_err(|_| fail("truncated glyph header"))?;
    r.skip(8).map_err(|_| fail("truncated glyph header"))?;
    if contours >= 0 {
        parse_simple(&mut r, contours as usize)
            .map_err(|_| fail("truncated simple glyph"))?
            .map(Glyph::Simple)
            .ok_or_else(|| fail("contour end points out of order"))
    } else {
        parse_compound(&mut r)
            .map(Glyph::Compound)
            .map_err(|_| fail("truncated compound glyph"))
    }
}

fn parse_simple(r: &mut Reader<'_>, contours: usize) -> ReadResult<Option<Vec<Vec<Point>>>> {
    let mut ends = Vec::with_capacity(contours);
    for _ in 0..contours {
        ends.push(r.read_u16()? as usize);
    }
    if ends.windows(2).any(|w| w[1] < w[0]) {
        return Ok(None);
    }
    let Some(&last) = ends.last() else {
        return Ok(Some(Vec::new()));
    };
    let num_points = last + 1;
    let instructions = r.read_u16()? as usize;
    r.skip(instructions)?;

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = r.read_u8()?;
        flags.push(flag);
        if flag & REPEAT != 0 {
            let repeat = r.read_u8()?;
            for _ in 0..repeat {
                flags.push(flag);
            }
        }
    }
    flags.truncate(num_points);

    let xs = read_coords(r, &flags, X_SHORT, X_SAME_OR_POSITIVE)?;
    let ys = read_coords(r, &flags, Y_SHORT, Y_SAME_OR_POSITIVE)?;

    let mut out = Vec::with_capacity(contours);
    let mut start = 0;
    for end in ends {
        let contour = (start..=end)
            .map(|i| Point {
                x: xs[i] as f32,
                y: ys[i] as f32,
                on_curve: flags[i] & ON_CURVE != 0,
            })
            .collect();
        out.push(contour);
        start = end + 1;
    }
    Ok(Some(out))
}

fn read_coords(r: &mut Reader<'_>, flags: &[u8], short: u8, same: u8) -> ReadResult<Vec<i32>> {
    let mut value = 0i32;
    let mut out = Vec::with_capacity(flags.len());
    for &flag in flags {
        if flag & short != 0 {
            let d = r.read_u8()? as i32;
            value += if flag & same != 0 { d } else { -d };
        } else if flag & same == 0 {
            value += r.read_i16()? as i32;
        }
        out.push(value);
    }
    Ok(out)
}

fn parse_compound(r: &mut Reader<'_>) -> ReadResult<Vec<Component>> {
    let mut components = Vec::new();
    loop {
        let flags = r.read_u16()?;
        let gid = r.read_u16()?;
        let (a, b) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            (r.read_i16()? as f32, r.read_i16()? as f32)
        } else {
            (r.read_i8()? as f32, r.read_i8()? as f32)
        };
        // point-matched components have no offset to apply
        let (dx, dy) = if flags & ARGS_ARE_XY_VALUES != 0 {
            (a, b)
        } else {
            (0., 0.)
        };
        let matrix = if flags & WE_HAVE_A_SCALE != 0 {
            let s = r.read_f2dot14()?;
            Some([s, 0., 0., s])
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            let (sx, sy) = (r.read_f2dot14()?, r.read_f2dot14()?);
            Some([sx, 0., 0., sy])
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            Some([
                r.read_f2dot14()?,
                r.read_f2dot14()?,
                r.read_f2dot14()?,
                r.read_f2dot14()?,
            ])
        } else {
            None
        };
        components.push(Component {
            gid,
            dx,
            dy,
            matrix,
        });
        if flags & MORE_COMPONENTS == 0 {
            return Ok(components);
        }
    }
}

/// Glyphs materialized for one decode, keyed by glyph index.
#[derive(Debug, Default)]
pub struct GlyphArena {
    glyphs: HashMap<u16, Glyph>,
    failed: HashMap<u16, DecodeError>,
}

impl GlyphArena {
    /// Draws `gid` into `sink`. Component matrices are not applied.
    pub fn outline(&self, gid: u16, sink: &mut dyn PathSink) -> Result<()> {
        let mut warned = false;
        self.outline_at(gid, gid, 0., 0., 0, sink, &mut warned)
    }

    #[allow(clippy::too_many_arguments)]
    fn outline_at(
        &self,
        root: u16,
        gid: u16,
        dx: f32,
        dy: f32,
        depth: usize,
        sink: &mut dyn PathSink,
        warned: &mut bool,
    ) -> Result<()> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(DecodeError::glyph(root as u32, "compound glyph nesting too deep"));
        }
        if let Some(e) = self.failed.get(&gid) {
            return Err(e.clone());
        }
        match self.glyphs.get(&gid) {
            None => Err(DecodeError::glyph(gid as u32, "glyph not loaded")),
            Some(Glyph::Empty) => Ok(()),
            Some(Glyph::Simple(contours)) => {
                for contour in contours {
                    emit_contour(contour, dx, dy, sink);
                }
                Ok(())
            }
            Some(Glyph::Compound(components)) => {
                for c in components {
                    if c.matrix.is_some() && !*warned {
                        *warned = true;
                        let e = DecodeError::UnsupportedProgramVariant(
                            "compound glyph transform matrix".into(),
                        );
                        warn!("glyph {}: {}, drawing offsets only", root, e);
                    }
                    self.outline_at(root, c.gid, dx + c.dx, dy + c.dy, depth + 1, sink, warned)?;
                }
                Ok(())
            }
        }
    }
}

fn midpoint(a: Point, b: Point) -> (f32, f32) {
    ((a.x + b.x) / 2., (a.y + b.y) / 2.)
}

/// Emits a quadratic contour, inserting the implied on-curve point between
/// consecutive off-curve points.
fn emit_contour(points: &[Point], dx: f32, dy: f32, sink: &mut dyn PathSink) {
    let n = points.len();
    if n == 0 {
        return;
    }
    let (start, first, count) = match points.iter().position(|p| p.on_curve) {
        Some(i) => ((points[i].x, points[i].y), i + 1, n - 1),
        None => (midpoint(points[n - 1], points[0]), 0, n),
    };
    sink.move_to(start.0 + dx, start.1 + dy);
    let mut control: Option<Point> = None;
    for k in 0..count {
        let p = points[(first + k) % n];
        if p.on_curve {
            match control.take() {
                Some(c) => sink.quad_to(c.x + dx, c.y + dy, p.x + dx, p.y + dy),
                None => sink.line_to(p.x + dx, p.y + dy),
            }
        } else {
            if let Some(c) = control {
                let (mx, my) = midpoint(c, p);
                sink.quad_to(c.x + dx, c.y + dy, mx + dx, my + dy);
            }
            control = Some(p);
        }
    }
    match control {
        Some(c) => sink.quad_to(c.x + dx, c.y + dy, start.0 + dx, start.1 + dy),
        None => sink.line_to(start.0 + dx, start.1 + dy),
    }
    sink.close_path();
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal sfnt writer for tests.

    /// A simple glyph from contours of (x, y, on-curve) points.
    pub(crate) fn simple_glyph(contours: &[&[(i16, i16, bool)]]) -> Vec<u8> {
        let points: Vec<_> = contours.iter().flat_map(|c| c.iter().copied()).collect();
        let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
        let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
        let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
        let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);
        let mut out = Vec::new();
        for v in [contours.len() as i16, x_min, y_min, x_max, y_max] {
            out.extend(v.to_be_bytes());
        }
        let mut end = 0i32 - 1;
        for c in contours {
            end += c.len() as i32;
            out.extend((end as u16).to_be_bytes());
        }
        out.extend(0u16.to_be_bytes());
        for p in &points {
            out.push(p.2 as u8);
        }
        let (mut px, mut py) = (0i16, 0i16);
        for p in &points {
            out.extend((p.0 - px).to_be_bytes());
            px = p.0;
        }
        for p in &points {
            out.extend((p.1 - py).to_be_bytes());
            py = p.1;
        }
        out
    }

    /// A compound glyph placing each (gid, dx, dy) component; `scale` adds
    /// a uniform scale to every component.
    pub(crate) fn compound_glyph(components: &[(u16, i16, i16)], scale: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [-1i16, 0, 0, 0, 0] {
            out.extend(v.to_be_bytes());
        }
        for (i, &(gid, dx, dy)) in components.iter().enumerate() {
            let mut flags = 0x0001 | 0x0002;
            if i + 1 < components.len() {
                flags |= 0x0020;
            }
            if scale {
                flags |= 0x0008;
            }
            out.extend((flags as u16).to_be_bytes());
            out.extend(gid.to_be_bytes());
            out.extend(dx.to_be_bytes());
            out.extend(dy.to_be_bytes());
            if scale {
                out.extend(0x2000u16.to_be_bytes());
            }
        }
        out
    }

    /// cmap format 4 subtable mapping single codes.
    pub(crate) fn cmap4(map: &[(u16, u16)]) -> Vec<u8> {
        let mut map = map.to_vec();
        map.sort();
        map.push((0xffff, 0));
        let seg_count = map.len() as u16;
        let mut out = Vec::new();
        let length = 16 + 8 * seg_count;
        for v in [4, length, 0, seg_count * 2, 0, 0, 0] {
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

    /// cmap table holding the given (platform, encoding, subtable) entries.
    pub(crate) fn cmap(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(0u16.to_be_bytes());
        out.extend((subtables.len() as u16).to_be_bytes());
        let mut offset = 4 + 8 * subtables.len() as u32;
        for (platform, encoding, data) in subtables {
            out.extend(platform.to_be_bytes());
            out.extend(encoding.to_be_bytes());
            out.extend(offset.to_be_bytes());
            offset += data.len() as u32;
        }
        for (_, _, data) in subtables {
            out.extend(data);
        }
        out
    }

    /// sfnt container; table records are sorted by tag as readers expect.
    pub(crate) fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut tables = tables.to_vec();
        tables.sort_by_key(|(tag, _)| **tag);
        let mut out = Vec::new();
        out.extend(0x0001_0000u32.to_be_bytes());
        out.extend((tables.len() as u16).to_be_bytes());
        out.extend([0; 6]);
        let mut offset = 12 + 16 * tables.len() as u32;
        for (tag, data) in &tables {
            out.extend(**tag);
            out.extend(0u32.to_be_bytes());
            out.extend(offset.to_be_bytes());
            out.extend((data.len() as u32).to_be_bytes());
            offset += data.len() as u32;
        }
        for (_, data) in &tables {
            out.extend(data);
        }
        out
    }

    /// A complete font with long loca offsets and 1000 units per em.
    pub(crate) fn font(glyphs: &[Vec<u8>], advances: &[u16], cmap_table: Option<Vec<u8>>) -> Vec<u8> {
        let mut head = vec![0u8; 54];
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        head[50..52].copy_from_slice(&1i16.to_be_bytes());
        let mut maxp = 0x0000_5000u32.to_be_bytes().to_vec();
        maxp.extend((glyphs.len() as u16).to_be_bytes());
        let mut loca = Vec::new();
        let mut glyf = Vec::new();
        for g in glyphs {
            loca.extend((glyf.len() as u32).to_be_bytes());
            glyf.extend(g);
        }
        loca.extend((glyf.len() as u32).to_be_bytes());
        let mut hhea = vec![0u8; 36];
        hhea[34..36].copy_from_slice(&(advances.len() as u16).to_be_bytes());
        let mut hmtx = Vec::new();
        for a in advances {
            hmtx.extend(a.to_be_bytes());
            hmtx.extend(0i16.to_be_bytes());
        }
        let mut tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
            (b"head", head),
            (b"maxp", maxp),
            (b"loca", loca),
            (b"glyf", glyf),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
        ];
        if let Some(c) = cmap_table {
            tables.push((b"cmap", c));
        }
        sfnt(&tables)
    }
}
