use crate::bodies::BodySystem;
use crate::config::{BackdropKind, Settings};
use crate::content::{wrap, Block, ContentMap, Placement};
use crate::field::ParticleField;
use crate::grid::GridField;
use crate::input::{InputBridge, InputEvent, KeyAction, PointerState};
use crate::math::Vec2;
use crate::scheduler::FrameScheduler;
use crate::surface::{
    canvas_to_cells, draw_frame, draw_text, Cell, CellBuffer, Pixel, PixelCanvas, Rect, Terminal,
    Viewport,
};
use crate::trail::SparkSystem;
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

const BG: Color = Color::Black;
const TEXT: Color = Color::White;
const ACCENT: Color = Color::Rgb {
    r: 251,
    g: 191,
    b: 36,
};
const MUTED: Color = Color::Rgb {
    r: 148,
    g: 163,
    b: 184,
};

/// Ambient layer behind the bubbles.
pub enum Backdrop {
    Lattice(ParticleField),
    Grid(GridField),
}

impl Backdrop {
    pub fn build(kind: BackdropKind, settings: &Settings) -> Self {
        match kind {
            BackdropKind::Lattice => Backdrop::Lattice(ParticleField::new(settings.field.clone())),
            BackdropKind::Grid => Backdrop::Grid(GridField::new(settings.grid.clone())),
        }
    }

    pub fn kind(&self) -> BackdropKind {
        match self {
            Backdrop::Lattice(_) => BackdropKind::Lattice,
            Backdrop::Grid(_) => BackdropKind::Grid,
        }
    }

    pub fn initialize(&mut self, width: f32, height: f32, rng: &mut StdRng) {
        match self {
            Backdrop::Lattice(f) => f.initialize(width, height, rng),
            Backdrop::Grid(g) => g.initialize(width, height),
        }
    }

    pub fn update(&mut self, pointer: &PointerState) {
        match self {
            Backdrop::Lattice(f) => f.update(pointer),
            Backdrop::Grid(g) => {
                g.illuminate(pointer.pos);
                g.update();
            }
        }
    }

    pub fn render(&self, canvas: &mut PixelCanvas, pointer: Option<Vec2>) {
        match self {
            Backdrop::Lattice(f) => f.render(canvas),
            Backdrop::Grid(g) => g.render(canvas, pointer),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HudItem {
    pub key: String,
    pub label: String,
    /// First column of the block.
    pub col: u16,
    pub width: u16,
}

/// Top row: title plus clickable blocks for `hud` entries.
#[derive(Clone, Debug, Default)]
pub struct HudBar {
    items: Vec<HudItem>,
}

const HUD_TITLE: &str = " bubblefield ";

impl HudBar {
    pub fn layout(content: &ContentMap) -> Self {
        let mut col = HUD_TITLE.chars().count() as u16 + 1;
        let items = content
            .placed(Placement::Hud)
            .map(|(key, e)| {
                let label = format!("[{}]", e.label());
                let width = label.chars().count() as u16;
                let item = HudItem {
                    key: key.to_string(),
                    label,
                    col,
                    width,
                };
                col += width + 1;
                item
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[HudItem] {
        &self.items
    }

    pub fn end_col(&self) -> u16 {
        self.items
            .last()
            .map(|i| i.col + i.width + 1)
            .unwrap_or(HUD_TITLE.chars().count() as u16 + 1)
    }

    pub fn hit(&self, col: i32, row: i32) -> Option<&str> {
        if row != 0 {
            return None;
        }
        self.items
            .iter()
            .find(|i| col >= i.col as i32 && col < (i.col + i.width) as i32)
            .map(|i| i.key.as_str())
    }
}

/// Centered box used for the detail overlay.
pub fn detail_rect(cols: u16, rows: u16) -> Rect {
    let w = 64.min(cols.saturating_sub(4));
    let h = 20.min(rows.saturating_sub(4));
    Rect {
        x: (cols - w) / 2,
        y: (rows - h) / 2,
        w,
        h,
    }
}

/// What the frame loop should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    TogglePause,
    Quit,
}

/// Everything on screen, independent of the terminal it is drawn to.
pub struct Page {
    pub settings: Settings,
    viewport: Viewport,
    rng: StdRng,
    pointer: PointerState,
    backdrop: Backdrop,
    bodies: BodySystem,
    sparks: SparkSystem,
    content: ContentMap,
    hud: HudBar,
    detail: Option<String>,
    scroll: f32,
}

impl Page {
    pub fn new(settings: Settings, content: ContentMap, viewport: Viewport) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if content.is_empty() {
            log::warn!("content map is empty, no bubbles to show");
        }

        let mut bodies = BodySystem::new(settings.bodies.clone());
        for (key, _) in content.placed(Placement::Bubble) {
            bodies.spawn(key);
        }
        bodies.initialize(viewport.width, viewport.height, &mut rng);

        let mut backdrop = Backdrop::build(settings.backdrop, &settings);
        backdrop.initialize(viewport.width, viewport.height, &mut rng);

        Self {
            pointer: PointerState::new(settings.pointer_radius),
            sparks: SparkSystem::new(settings.sparks.clone()),
            hud: HudBar::layout(&content),
            settings,
            viewport,
            rng,
            backdrop,
            bodies,
            content,
            detail: None,
            scroll: 0.0,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }
    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }
    pub fn bodies(&self) -> &BodySystem {
        &self.bodies
    }
    pub fn bodies_mut(&mut self) -> &mut BodySystem {
        &mut self.bodies
    }
    pub fn sparks(&self) -> &SparkSystem {
        &self.sparks
    }
    pub fn hud(&self) -> &HudBar {
        &self.hud
    }
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Rebuild everything that depends on the viewport size.
    pub fn relayout(&mut self, viewport: Viewport) {
        log::debug!(
            "relayout to {}x{} cells ({:.0}x{:.0})",
            viewport.cols,
            viewport.rows,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.backdrop
            .initialize(viewport.width, viewport.height, &mut self.rng);
        self.bodies.resize(viewport.width, viewport.height);
        self.scroll = self.scroll.min(viewport.height);
    }

    pub fn reset(&mut self) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        self.backdrop.initialize(w, h, &mut self.rng);
        self.bodies.end_drag();
        self.bodies.initialize(w, h, &mut self.rng);
        self.sparks.clear();
    }

    /// Show the entry for `key`. Unknown keys are ignored.
    pub fn open_detail(&mut self, key: &str) -> bool {
        if self.content.get(key).is_none() {
            log::debug!("no content for {:?}", key);
            return false;
        }
        log::info!("opening detail {:?}", key);
        self.detail = Some(key.to_string());
        true
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn handle(&mut self, ev: InputEvent) -> Flow {
        match ev {
            InputEvent::PointerMoved(p) => {
                self.pointer.pos = Some(p);
                self.bodies.drag_to(p);
            }
            InputEvent::PointerLeft => self.pointer.pos = None,
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerUp(p) => {
                self.pointer.pos = Some(p);
                self.pointer_up();
            }
            InputEvent::Scrolled(delta) => {
                let cell_h = self.viewport.height / self.viewport.rows.max(1) as f32;
                self.scroll = (self.scroll + delta * cell_h).clamp(0.0, self.viewport.height);
            }
            InputEvent::Resized { .. } => {}
            InputEvent::Key(action) => return self.key(action),
        }
        Flow::Continue
    }

    fn pointer_down(&mut self, p: Vec2) {
        self.pointer.pos = Some(p);
        let (col, row) = self.viewport.cell_at(p);

        if self.detail.is_some() {
            if !detail_rect(self.viewport.cols, self.viewport.rows).contains(col, row) {
                self.close_detail();
            }
            return;
        }

        if let Some(key) = self.hud.hit(col, row).map(str::to_string) {
            self.open_detail(&key);
            return;
        }

        if let Some(id) = self.bodies.body_at(p) {
            self.bodies.begin_drag(id, p);
        }
    }

    fn pointer_up(&mut self) {
        let Some(release) = self.bodies.end_drag() else {
            return;
        };
        if !release.is_tap() {
            return;
        }
        let Some(body) = self.bodies.get(release.body) else {
            return;
        };
        let (key, center) = (body.key.clone(), body.pos);
        if self.open_detail(&key) && self.settings.bursts {
            self.sparks.burst(center);
        }
    }

    fn key(&mut self, action: KeyAction) -> Flow {
        match action {
            KeyAction::Quit => return Flow::Quit,
            KeyAction::CloseDetail => self.close_detail(),
            KeyAction::TogglePause => return Flow::TogglePause,
            KeyAction::CycleBackdrop => {
                let kind = self.backdrop.kind().next();
                self.backdrop = Backdrop::build(kind, &self.settings);
                self.backdrop
                    .initialize(self.viewport.width, self.viewport.height, &mut self.rng);
                log::debug!("backdrop now {:?}", kind);
            }
            KeyAction::Reset => self.reset(),
        }
        Flow::Continue
    }

    /// One fixed simulation step for every layer.
    pub fn step(&mut self) {
        self.bodies.tick(&mut self.rng);
        self.backdrop.update(&self.pointer);
        if self.settings.trail {
            self.sparks.emit_trail(self.pointer.pos, &mut self.rng);
        }
        self.sparks.update();
    }

    pub fn draw(&self, canvas: &mut PixelCanvas, cells: &mut CellBuffer, status: &str) {
        canvas.clear(Pixel::default());
        canvas.offset_y = self.scroll * self.settings.parallax;
        self.backdrop.render(canvas, self.pointer.pos);
        canvas.offset_y = 0.0;
        self.sparks.render(canvas);
        self.bodies.render(canvas);

        cells.clear(BG);
        canvas_to_cells(canvas, cells, self.settings.enable_color, BG);

        self.draw_labels(cells);
        self.draw_hud(cells, status);
        if let Some(key) = &self.detail {
            self.draw_detail(cells, key);
        }
    }

    fn draw_labels(&self, cells: &mut CellBuffer) {
        for b in self.bodies.bodies() {
            let Some(entry) = self.content.get(&b.key) else {
                continue;
            };
            let label = entry.label();
            let (col, row) = self.viewport.cell_at(b.pos);
            let x = col - label.chars().count() as i32 / 2;
            if row < 0 || x < 0 {
                continue;
            }
            let fg = if b.is_dragging() { ACCENT } else { TEXT };
            draw_text(cells, x as u16, row as u16, label, fg, BG);
        }
    }

    fn draw_hud(&self, cells: &mut CellBuffer, status: &str) {
        for x in 0..cells.w {
            cells.set(
                x,
                0,
                Cell {
                    ch: ' ',
                    fg: TEXT,
                    bg: BG,
                },
            );
        }
        draw_text(cells, 0, 0, HUD_TITLE, ACCENT, BG);
        for item in self.hud.items() {
            draw_text(cells, item.col, 0, &item.label, TEXT, BG);
        }
        draw_text(cells, self.hud.end_col() + 1, 0, status, MUTED, BG);
    }

    fn draw_detail(&self, cells: &mut CellBuffer, key: &str) {
        let Some(entry) = self.content.get(key) else {
            return;
        };
        let r = detail_rect(cells.w, cells.h);
        if r.w < 8 || r.h < 6 {
            return;
        }
        draw_frame(cells, r, TEXT, BG);

        let inner = (r.w - 4) as usize;
        let x = r.x + 2;
        let last = r.y + r.h - 1;
        draw_text(cells, x, r.y + 1, &entry.title, ACCENT, BG);
        draw_text(cells, x, r.y + 2, &entry.byline(), MUTED, BG);

        let tags = entry
            .tags
            .iter()
            .map(|t| format!("[{}]", t))
            .collect::<Vec<_>>()
            .join(" ");
        let tag_lines = wrap(&tags, inner);
        let body_end = last.saturating_sub(tag_lines.len() as u16 + 1);

        let mut y = r.y + 4;
        'blocks: for block in &entry.body {
            let (text, fg) = match block {
                Block::Heading(t) => (t, ACCENT),
                Block::Paragraph(t) => (t, TEXT),
            };
            for line in wrap(text, inner) {
                if y >= body_end {
                    break 'blocks;
                }
                draw_text(cells, x, y, &line, fg, BG);
                y += 1;
            }
        }

        let mut ty = body_end;
        for line in tag_lines {
            if ty >= last {
                break;
            }
            draw_text(cells, x, ty, &line, MUTED, BG);
            ty += 1;
        }
        draw_text(cells, r.x + r.w.saturating_sub(16), last, " Esc to close ", MUTED, BG);
    }
}

pub struct App {
    page: Page,
    term: Terminal,
    input: InputBridge,
    scheduler: FrameScheduler,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings, content: ContentMap) -> anyhow::Result<Self> {
        let term = Terminal::begin(settings.cell_width, settings.cell_height)?;
        let viewport = term.viewport;
        log::info!(
            "terminal {}x{} cells, viewport {:.0}x{:.0}",
            viewport.cols,
            viewport.rows,
            viewport.width,
            viewport.height
        );
        let scheduler = FrameScheduler::new(settings.fps_cap, Instant::now());
        Ok(Self {
            page: Page::new(settings, content, viewport),
            term,
            input: InputBridge::new(viewport),
            scheduler,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        self.scheduler.start(Instant::now());

        while !self.should_quit {
            let frame_start = Instant::now();

            self.input.poll(self.scheduler.frame_budget())?;
            let events: Vec<InputEvent> = self.input.drain().collect();
            for ev in events {
                if let InputEvent::Resized { cols, rows } = ev {
                    self.relayout(cols, rows)?;
                    continue;
                }
                match self.page.handle(ev) {
                    Flow::Continue => {}
                    Flow::TogglePause => self.scheduler.toggle(Instant::now()),
                    Flow::Quit => {
                        self.should_quit = true;
                        break;
                    }
                }
            }

            let steps = self.scheduler.advance(Instant::now());
            for _ in 0..steps {
                self.page.step();
            }

            self.render()?;
            self.scheduler.pace(frame_start);
        }

        self.term.end()?;
        Ok(())
    }

    fn relayout(&mut self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let viewport = self.term.resize(cols, rows)?;
        self.input.set_viewport(viewport);
        self.page.relayout(viewport);
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let status = format!(
            "drag to throw, click to open | b backdrop | space {} | q quit | {:>3.0} fps",
            if self.scheduler.is_running() { "pause" } else { "resume" },
            self.scheduler.fps()
        );
        let term = &mut self.term;
        self.page.draw(&mut term.canvas, &mut term.cur, &status);
        term.present(true)
    }
}

pub fn run(settings: Settings, content: ContentMap) -> anyhow::Result<()> {
    let mut app = App::init(settings, content)?;
    app.run()
}
