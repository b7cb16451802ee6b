/// Presentation layer: double-buffered, diff-based terminal renderer.
///
///   1. Compose the next frame into `front` (a grid of `Cell`)
///   2. Compare with `back` (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with
///      `queue!` and flushed once
///   4. Swap front/back
///
/// A tile is drawn as two terminal columns by one row. Entities are drawn
/// from `WorldState::view()` by texture/animation key, so the renderer
/// never looks inside the player state machine.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::WorldPos;
use crate::sim::world::WorldState;

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Glyphs ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

/// Two-column glyph and color for a texture/animation key.
fn glyph(key: &str) -> ([char; 2], Color) {
    match key {
        "sidewall" => (['▓', '▓'], Color::DarkGrey),
        "needle" => (['▲', '▲'], Color::Red),
        "floor" => (['═', '═'], Color::Rgb { r: 170, g: 120, b: 60 }),
        "block_left" => (['◢', '█'], Color::Rgb { r: 200, g: 160, b: 90 }),
        "block_right" => (['█', '◣'], Color::Rgb { r: 200, g: 160, b: 90 }),
        "ivy" => (['§', '§'], Color::Green),
        "gate" => (['[', ']'], Color::Cyan),
        "indy_start" => (['*', '*'], Color::Yellow),
        "indy_up" => (['^', '^'], Color::Yellow),
        k if k.ends_with("_dead") => (['x', 'x'], Color::Red),
        k if k.starts_with("indy_left") => (['<', '@'], Color::Yellow),
        k if k.starts_with("indy_right") => (['@', '>'], Color::Yellow),
        _ => (['?', '?'], Color::Magenta),
    }
}

/// Terminal (column, row) of the tile-sized entity centered at `pos`.
fn to_cell(pos: WorldPos, tile: f64) -> Option<(usize, usize)> {
    let col = (pos.x / tile * CELL_W as f64).round();
    let row = (pos.y / tile).round();
    if col < 0.0 || row < 0.0 {
        return None;
    }
    Some((col as usize, row as usize + MAP_ROW))
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Set once the terminal accepted event-type reporting.
    key_release: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
            self.key_release = execute!(self.writer, PushKeyboardEnhancementFlags(flags)).is_ok();
        }
        log::debug!("key release events: {}", self.key_release);
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    /// Whether the terminal reports key Release events.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_release = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    /// Draw one frame. `banner` is shown under the map when set.
    pub fn render(&mut self, world: &WorldState, banner: Option<&str>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose(world, banner);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, w: &WorldState, banner: Option<&str>) {
        let hud = format!(" {:<16} {} ", w.level.name, w.power_text());
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let tile = w.level.tile_size as f64;
        for v in w.view() {
            let Some((col, row)) = to_cell(v.pos, tile) else { continue };
            let (chars, fg) = glyph(&v.key);
            for (i, ch) in chars.into_iter().enumerate() {
                self.front.set(col + i, row, Cell::new(ch, fg, Cell::BASE_BG));
            }
        }

        let below = MAP_ROW + w.level.floor_height as usize + 2;
        if let Some(text) = banner {
            self.front.put_str(0, below, text, Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });
        }
        self.front.put_str(0, below + 2, " ←/A  →/D: walk   Q/Esc: quit", Color::DarkGrey, Cell::BASE_BG);
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}
