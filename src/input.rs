//! Turns terminal mouse/keyboard events into pointer events in logical pixels.

use crate::math::Vec2;
use crate::surface::Viewport;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;

/// Upper bound of events read in a single poll.
const MAX_EVENTS_PER_POLL: usize = 64;

/// Where the pointer is, if it is over the surface at all.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub pos: Option<Vec2>,
    /// Reach of the ambient repulsion field.
    pub radius: f32,
}

impl PointerState {
    pub fn new(radius: f32) -> Self {
        Self { pos: None, radius }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    CloseDetail,
    TogglePause,
    CycleBackdrop,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerMoved(Vec2),
    PointerLeft,
    PointerDown(Vec2),
    PointerUp(Vec2),
    /// Positive scrolls the page down.
    Scrolled(f32),
    Resized { cols: u16, rows: u16 },
    Key(KeyAction),
}

pub struct InputBridge {
    viewport: Viewport,
    queue: Vec<InputEvent>,
}

impl InputBridge {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            queue: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Map one terminal event; `None` for anything the page ignores.
    pub fn translate(&self, ev: &Event) -> Option<InputEvent> {
        match ev {
            Event::Mouse(m) => self.translate_mouse(m),
            Event::Key(k) => translate_key(k).map(InputEvent::Key),
            Event::FocusLost => Some(InputEvent::PointerLeft),
            Event::Resize(cols, rows) => Some(InputEvent::Resized {
                cols: *cols,
                rows: *rows,
            }),
            _ => None,
        }
    }

    fn translate_mouse(&self, m: &MouseEvent) -> Option<InputEvent> {
        let p = self.viewport.cell_center(m.column, m.row);
        match m.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                Some(InputEvent::PointerMoved(p))
            }
            MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown(p)),
            MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp(p)),
            MouseEventKind::ScrollDown => Some(InputEvent::Scrolled(1.0)),
            MouseEventKind::ScrollUp => Some(InputEvent::Scrolled(-1.0)),
            _ => None,
        }
    }

    pub fn push(&mut self, ev: InputEvent) {
        self.queue.push(ev);
    }

    /// Read whatever the terminal has buffered without blocking past `budget`.
    pub fn poll(&mut self, budget: Duration) -> anyhow::Result<()> {
        // poll with a tiny timeout so we stay responsive
        let timeout = std::cmp::min(Duration::from_millis(1), budget);
        let mut read = 0;
        while read < MAX_EVENTS_PER_POLL && event::poll(timeout)? {
            let ev = event::read()?;
            read += 1;
            if let Some(mapped) = self.translate(&ev) {
                self.queue.push(mapped);
            }
        }
        Ok(())
    }

    /// Hand over everything queued since the last frame.
    pub fn drain(&mut self) -> std::vec::Drain<'_, InputEvent> {
        self.queue.drain(..)
    }
}

fn translate_key(k: &KeyEvent) -> Option<KeyAction> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return match k.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(KeyAction::Quit),
            _ => None,
        };
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyAction::Quit),
        KeyCode::Esc => Some(KeyAction::CloseDetail),
        KeyCode::Char(' ') => Some(KeyAction::TogglePause),
        KeyCode::Char('b') | KeyCode::Char('B') => Some(KeyAction::CycleBackdrop),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyAction::Reset),
        _ => None,
    }
}
