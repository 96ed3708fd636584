//! Terminal drawing surface: a braille dot canvas addressed in logical pixels,
//! a cell buffer for text, and diff-based presentation through crossterm.

use crate::math::Vec2;
use anyhow::Context;
use crossterm::{
    cursor,
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Braille resolution of one terminal cell.
pub const DOTS_X: u32 = 2;
pub const DOTS_Y: u32 = 4;

/// Dots fainter than this stay blank.
const INK_ALPHA: u8 = 6;

/// Logical viewport and its mapping onto the dot canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub width: f32,
    pub height: f32,
    /// Dots per logical pixel on each axis.
    pub scale: Vec2,
}

impl Viewport {
    pub fn from_cells(cols: u16, rows: u16, cell_width: f32, cell_height: f32) -> Self {
        Self {
            cols,
            rows,
            width: cols as f32 * cell_width,
            height: rows as f32 * cell_height,
            scale: Vec2::new(DOTS_X as f32 / cell_width, DOTS_Y as f32 / cell_height),
        }
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (self.cols as u32 * DOTS_X, self.rows as u32 * DOTS_Y)
    }

    /// Logical pixel at the centre of a terminal cell.
    pub fn cell_center(&self, col: u16, row: u16) -> Vec2 {
        let cw = DOTS_X as f32 / self.scale.x;
        let ch = DOTS_Y as f32 / self.scale.y;
        Vec2::new((col as f32 + 0.5) * cw, (row as f32 + 0.5) * ch)
    }

    /// Terminal cell containing a logical point (may be off-screen).
    pub fn cell_at(&self, p: Vec2) -> (i32, i32) {
        let cw = DOTS_X as f32 / self.scale.x;
        let ch = DOTS_Y as f32 / self.scale.y;
        ((p.x / cw).floor() as i32, (p.y / ch).floor() as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.w && y < self.h {
            Some(self.cells[self.idx(x, y)])
        } else {
            None
        }
    }
    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            ch: ' ',
            fg: Color::White,
            bg,
        });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with alpha scaled by `opacity` (0..=1).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0) + 0.5) as u8;
        Self { a, ..self }
    }

    /// Source-over compositing of `self` onto `dst`.
    fn over(self, dst: Pixel) -> Pixel {
        let sa = self.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0 * (1.0 - sa);
        let out_a = sa + da;
        if out_a <= 1e-6 {
            return Pixel::default();
        }
        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        let mix = |s: u8, d: u8| to_u8((s as f32 * sa + d as f32 * da) / out_a);
        Pixel {
            r: mix(self.r, dst.r),
            g: mix(self.g, dst.g),
            b: mix(self.b, dst.b),
            a: to_u8(out_a * 255.0),
        }
    }
}

/// Dot canvas. Drawing calls take logical coordinates and go through `scale`.
pub struct PixelCanvas {
    pub w: u32,
    pub h: u32,
    pub scale: Vec2,
    pub px: Vec<Pixel>,
    /// Vertical shift in logical pixels applied to every draw call.
    pub offset_y: f32,
}

impl PixelCanvas {
    pub fn new(viewport: &Viewport) -> Self {
        let (w, h) = viewport.backing_size();
        Self {
            w,
            h,
            scale: viewport.scale,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
            offset_y: 0.0,
        }
    }
    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
        self.offset_y = 0.0;
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.w && y < self.h {
            Some(self.px[self.idx(x, y)])
        } else {
            None
        }
    }

    fn to_dots(&self, p: Vec2) -> (f32, f32) {
        (p.x * self.scale.x, (p.y + self.offset_y) * self.scale.y)
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.px[i] = src.over(self.px[i]);
        }
    }

    pub fn plot(&mut self, p: Vec2, color: Pixel) {
        let (x, y) = self.to_dots(p);
        self.blend_over(x.floor() as i32, y.floor() as i32, color);
    }

    /// Straight line, one blend per dot along the major axis.
    pub fn line(&mut self, a: Vec2, b: Vec2, color: Pixel) {
        let (x0, y0) = self.to_dots(a);
        let (x1, y1) = self.to_dots(b);
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = (x0 + dx * t).floor() as i32;
            let y = (y0 + dy * t).floor() as i32;
            self.blend_over(x, y, color);
        }
    }

    pub fn stroke_rect(&mut self, origin: Vec2, w: f32, h: f32, color: Pixel) {
        let tl = origin;
        let tr = Vec2::new(origin.x + w, origin.y);
        let br = Vec2::new(origin.x + w, origin.y + h);
        let bl = Vec2::new(origin.x, origin.y + h);
        self.line(tl, tr, color);
        self.line(tr, br, color);
        self.line(br, bl, color);
        self.line(bl, tl, color);
    }

    /// Disc with a soft radial falloff; `ring` > 0 keeps only the outer band.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Pixel, ring: f32) {
        let (cx, cy) = self.to_dots(center);
        let rx = (radius * self.scale.x).max(0.5);
        let ry = (radius * self.scale.y).max(0.5);
        let inner = (1.0 - ring).clamp(0.0, 1.0);

        let minx = (cx - rx).floor() as i32;
        let maxx = (cx + rx).ceil() as i32;
        let miny = (cy - ry).floor() as i32;
        let maxy = (cy + ry).ceil() as i32;

        for y in miny..=maxy {
            for x in minx..=maxx {
                let nx = (x as f32 + 0.5 - cx) / rx;
                let ny = (y as f32 + 0.5 - cy) / ry;
                let d = (nx * nx + ny * ny).sqrt();
                if d > 1.0 || (ring > 0.0 && d < inner) {
                    continue;
                }
                let falloff = if ring > 0.0 { 1.0 } else { 0.55 + 0.45 * (1.0 - d) };
                self.blend_over(x, y, color.with_opacity(falloff));
            }
        }
    }
}

/// Dots 1-3 and 4-6 run down the two columns; dots 7 and 8 share the bottom row.
fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0..=1, 0..=2) => 1u8 << (dx * 3 + dy),
        (0..=1, 3) => 1u8 << (6 + dx),
        _ => 0,
    }
}

/// Encode the canvas into braille cells. Faint dots render as darker ink.
pub fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool, bg: Color) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * DOTS_X;
            let py0 = cy * DOTS_Y;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut sum_a: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..DOTS_Y {
                for dx in 0..DOTS_X {
                    let Some(p) = canvas.pixel(px0 + dx, py0 + dy) else {
                        continue;
                    };
                    if p.a >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        sum_a += p.a as u32;
                        ink_count += 1;
                    }
                }
            }

            if mask == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = if enable_color {
                let a = (sum_a / ink_count) as f32 / 255.0;
                let lift = 0.35 + 0.65 * a;
                let shade = |sum: u32| ((sum / ink_count) as f32 * lift) as u8;
                Color::Rgb {
                    r: shade(sum_r),
                    g: shade(sum_g),
                    b: shade(sum_b),
                }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x as usize + i;
        if xx >= buf.w as usize {
            break;
        }
        buf.set(xx as u16, y, Cell { ch, fg, bg });
    }
}

/// Screen rectangle in terminal cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.x as i32
            && row >= self.y as i32
            && col < (self.x + self.w) as i32
            && row < (self.y + self.h) as i32
    }
}

/// Filled box with a single-line border.
pub fn draw_frame(buf: &mut CellBuffer, r: Rect, fg: Color, bg: Color) {
    if r.w < 2 || r.h < 2 {
        return;
    }
    let (x1, y1) = (r.x + r.w - 1, r.y + r.h - 1);
    for y in r.y..=y1 {
        for x in r.x..=x1 {
            let ch = match (x == r.x, x == x1, y == r.y, y == y1) {
                (true, _, true, _) => '┌',
                (_, true, true, _) => '┐',
                (true, _, _, true) => '└',
                (_, true, _, true) => '┘',
                (_, _, true, _) | (_, _, _, true) => '─',
                (true, _, _, _) | (_, true, _, _) => '│',
                _ => ' ',
            };
            buf.set(x, y, Cell { ch, fg, bg });
        }
    }
}

pub struct Terminal {
    out: io::Stdout,
    pub viewport: Viewport,
    pub prev: CellBuffer,
    pub cur: CellBuffer,
    pub canvas: PixelCanvas,
    active: bool,
}

impl Terminal {
    pub fn begin(cell_width: f32, cell_height: f32) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            terminal::Clear(ClearType::All)
        )
        .context("failed to prepare terminal")?;
        terminal::enable_raw_mode().context("failed to enable raw mode")?;

        let (cols, rows) = terminal::size().context("failed to query terminal size")?;
        let viewport = Viewport::from_cells(cols, rows, cell_width, cell_height);

        Ok(Self {
            out,
            viewport,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(&viewport),
            active: true,
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Rebuild buffers for a new size; returns the new viewport.
    pub fn resize(&mut self, cols: u16, rows: u16) -> anyhow::Result<Viewport> {
        let cell_w = DOTS_X as f32 / self.viewport.scale.x;
        let cell_h = DOTS_Y as f32 / self.viewport.scale.y;
        self.viewport = Viewport::from_cells(cols, rows, cell_w, cell_h);
        self.prev = CellBuffer::new(cols, rows);
        self.cur = CellBuffer::new(cols, rows);
        self.canvas = PixelCanvas::new(&self.viewport);
        // Blank screen so the next diff repaints everything.
        execute!(self.out, Clear(ClearType::All))?;
        Ok(self.viewport)
    }

    pub fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let w = self.cur.w as usize;
        let mut pen: Option<(Color, Color)> = None;

        for (i, (c, old)) in self.cur.cells.iter().zip(&self.prev.cells).enumerate() {
            if diff_only && c == old {
                continue;
            }
            queue!(self.out, cursor::MoveTo((i % w) as u16, (i / w) as u16))?;
            if pen != Some((c.fg, c.bg)) {
                queue!(self.out, SetForegroundColor(c.fg), SetBackgroundColor(c.bg))?;
                pen = Some((c.fg, c.bg));
            }
            queue!(self.out, Print(c.ch))?;
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}
