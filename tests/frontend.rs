use bubblefield::app::{detail_rect, Backdrop, Flow, Page};
use bubblefield::content::{Block, Placement};
use bubblefield::surface::{canvas_to_cells, CellBuffer, Pixel, PixelCanvas};
use bubblefield::{
    load_settings, BackdropKind, Body, ConfigError, ContentMap, FrameScheduler, InputBridge,
    InputEvent, KeyAction, Settings, Vec2, Viewport,
};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::style::Color;
use std::io::Write;
use std::time::{Duration, Instant};

/// 100x40 cells at 8x16 logical px: an 800x640 page.
pub fn viewport() -> Viewport {
    Viewport::from_cells(100, 40, 8.0, 16.0)
}

pub fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

/// Seeded page with the built-in content and bubbles spread along y = 300.
pub fn page() -> Page {
    let settings = Settings {
        seed: Some(7),
        ..Settings::default()
    };
    let mut page = Page::new(settings, ContentMap::builtin(), viewport());
    for (i, b) in page.bodies_mut().bodies_mut().iter_mut().enumerate() {
        b.pos = Vec2::new(100.0 + 200.0 * i as f32, 300.0);
        b.vel = Vec2::ZERO;
    }
    page
}

// ==================================================================================
// Input
// ==================================================================================

#[test]
fn mouse_maps_to_cell_centres() {
    let bridge = InputBridge::new(viewport());
    let down = bridge.translate(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
    assert_eq!(down, Some(InputEvent::PointerDown(Vec2::new(84.0, 88.0))));

    let drag = bridge.translate(&mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0));
    assert_eq!(drag, Some(InputEvent::PointerMoved(Vec2::new(4.0, 8.0))));

    let up = bridge.translate(&mouse(MouseEventKind::Up(MouseButton::Left), 1, 1));
    assert_eq!(up, Some(InputEvent::PointerUp(Vec2::new(12.0, 24.0))));

    let right = bridge.translate(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
    assert_eq!(right, None);
}

#[test]
fn scroll_focus_and_resize_are_forwarded() {
    let bridge = InputBridge::new(viewport());
    assert_eq!(
        bridge.translate(&mouse(MouseEventKind::ScrollDown, 0, 0)),
        Some(InputEvent::Scrolled(1.0))
    );
    assert_eq!(
        bridge.translate(&mouse(MouseEventKind::ScrollUp, 0, 0)),
        Some(InputEvent::Scrolled(-1.0))
    );
    assert_eq!(bridge.translate(&Event::FocusLost), Some(InputEvent::PointerLeft));
    assert_eq!(bridge.translate(&Event::FocusGained), None);
    assert_eq!(
        bridge.translate(&Event::Resize(80, 24)),
        Some(InputEvent::Resized { cols: 80, rows: 24 })
    );
}

#[test]
fn keys_map_to_actions_on_press_only() {
    let bridge = InputBridge::new(viewport());
    let key = |code, mods| bridge.translate(&Event::Key(KeyEvent::new(code, mods)));

    assert_eq!(
        key(KeyCode::Char('q'), KeyModifiers::NONE),
        Some(InputEvent::Key(KeyAction::Quit))
    );
    assert_eq!(
        key(KeyCode::Char('c'), KeyModifiers::CONTROL),
        Some(InputEvent::Key(KeyAction::Quit))
    );
    assert_eq!(
        key(KeyCode::Esc, KeyModifiers::NONE),
        Some(InputEvent::Key(KeyAction::CloseDetail))
    );
    assert_eq!(
        key(KeyCode::Char(' '), KeyModifiers::NONE),
        Some(InputEvent::Key(KeyAction::TogglePause))
    );
    assert_eq!(
        key(KeyCode::Char('b'), KeyModifiers::NONE),
        Some(InputEvent::Key(KeyAction::CycleBackdrop))
    );
    assert_eq!(
        key(KeyCode::Char('r'), KeyModifiers::NONE),
        Some(InputEvent::Key(KeyAction::Reset))
    );
    assert_eq!(key(KeyCode::Char('x'), KeyModifiers::NONE), None);

    let release = KeyEvent::new_with_kind(
        KeyCode::Char('q'),
        KeyModifiers::NONE,
        KeyEventKind::Release,
    );
    assert_eq!(bridge.translate(&Event::Key(release)), None);
}

#[test]
fn queue_drains_in_order() {
    let mut bridge = InputBridge::new(viewport());
    bridge.push(InputEvent::PointerDown(Vec2::ZERO));
    bridge.push(InputEvent::PointerLeft);
    let got: Vec<_> = bridge.drain().collect();
    assert_eq!(
        got,
        vec![InputEvent::PointerDown(Vec2::ZERO), InputEvent::PointerLeft]
    );
    assert_eq!(bridge.drain().count(), 0);
}

#[test]
fn new_viewport_changes_the_mapping() {
    let mut bridge = InputBridge::new(viewport());
    bridge.set_viewport(Viewport::from_cells(100, 40, 4.0, 8.0));
    let ev = bridge.translate(&mouse(MouseEventKind::Moved, 1, 1));
    assert_eq!(ev, Some(InputEvent::PointerMoved(Vec2::new(6.0, 12.0))));
}

// ==================================================================================
// Scheduler
// ==================================================================================

#[test]
fn stopped_scheduler_owes_no_steps() {
    let t0 = Instant::now();
    let mut s = FrameScheduler::new(60, t0).with_step(Duration::from_millis(10));
    assert!(!s.is_running());
    assert_eq!(s.advance(t0 + Duration::from_millis(100)), 0);
}

#[test]
fn steps_accumulate_across_frames() {
    let t0 = Instant::now();
    let mut s = FrameScheduler::new(60, t0).with_step(Duration::from_millis(10));
    s.start(t0);
    assert_eq!(s.advance(t0 + Duration::from_millis(35)), 3);
    assert_eq!(s.advance(t0 + Duration::from_millis(40)), 1);
}

#[test]
fn long_frames_are_capped() {
    let t0 = Instant::now();
    let mut s = FrameScheduler::new(60, t0).with_step(Duration::from_millis(10));
    s.start(t0);
    assert_eq!(s.advance(t0 + Duration::from_secs(2)), 5);
}

#[test]
fn toggle_stops_and_restarts() {
    let t0 = Instant::now();
    let mut s = FrameScheduler::new(60, t0).with_step(Duration::from_millis(10));
    s.start(t0);
    s.toggle(t0);
    assert!(!s.is_running());
    assert_eq!(s.advance(t0 + Duration::from_millis(30)), 0);

    let t1 = t0 + Duration::from_millis(500);
    s.toggle(t1);
    assert!(s.is_running());
    // Time spent stopped is not replayed.
    assert_eq!(s.advance(t1 + Duration::from_millis(20)), 2);
}

#[test]
fn frame_budget_follows_the_cap() {
    let s = FrameScheduler::new(50, Instant::now());
    let ms = s.frame_budget().as_secs_f32() * 1000.0;
    assert!((ms - 20.0).abs() < 0.01);
}

// ==================================================================================
// Surface
// ==================================================================================

#[test]
fn viewport_scale_matches_braille_resolution() {
    let vp = Viewport::from_cells(80, 24, 8.0, 16.0);
    assert_eq!(vp.width, 640.0);
    assert_eq!(vp.height, 384.0);
    assert_eq!(vp.backing_size(), (160, 96));
    assert_eq!(vp.scale, Vec2::new(0.25, 0.25));
    assert_eq!(vp.cell_at(vp.cell_center(3, 4)), (3, 4));
}

#[test]
fn plotted_dot_becomes_a_braille_cell() {
    let vp = Viewport::from_cells(4, 2, 8.0, 16.0);
    let mut canvas = PixelCanvas::new(&vp);
    canvas.plot(Vec2::new(0.0, 0.0), Pixel::rgba(255, 255, 255, 255));
    // Second column dot, bottom row, of cell (1, 0).
    canvas.plot(Vec2::new(12.0, 12.0), Pixel::rgba(255, 0, 0, 255));

    let mut cells = CellBuffer::new(4, 2);
    canvas_to_cells(&canvas, &mut cells, false, Color::Black);

    assert_eq!(cells.get(0, 0).map(|c| c.ch), Some('\u{2801}'));
    assert_eq!(cells.get(1, 0).map(|c| c.ch), Some('\u{2880}'));
    assert_eq!(cells.get(0, 0).map(|c| c.fg), Some(Color::White));
    assert_eq!(cells.get(2, 1).map(|c| c.ch), Some(' '));
}

#[test]
fn parallax_offset_shifts_drawing() {
    let vp = Viewport::from_cells(4, 4, 8.0, 16.0);
    let mut canvas = PixelCanvas::new(&vp);
    canvas.offset_y = 16.0;
    canvas.plot(Vec2::ZERO, Pixel::rgba(255, 255, 255, 255));
    assert_eq!(canvas.pixel(0, 0), Some(Pixel::default()));
    assert_eq!(canvas.pixel(0, 4).map(|p| p.a), Some(255));
}

// ==================================================================================
// Content and settings
// ==================================================================================

#[test]
fn content_loads_from_json() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{
            "cv": {{
                "title": "Curriculum",
                "subtitle": "Work",
                "date": "2025",
                "body": [{{"heading": "Intro"}}, {{"paragraph": "Hello there."}}],
                "placement": "hud"
            }}
        }}"#
    )
    .expect("write content");

    let map = ContentMap::load(file.path()).expect("content parses");
    assert_eq!(map.len(), 1);
    let entry = map.get("cv").expect("entry present");
    assert_eq!(entry.label(), "Curriculum");
    assert_eq!(entry.byline(), "Work | 2025");
    assert_eq!(entry.placement, Placement::Hud);
    assert!(entry.tags.is_empty());
    assert_eq!(
        entry.body,
        vec![
            Block::Heading("Intro".into()),
            Block::Paragraph("Hello there.".into())
        ]
    );
    assert!(map.get("missing").is_none());
}

#[test]
fn missing_content_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(ContentMap::load(&dir.path().join("nope.json")).is_err());
}

#[test]
fn default_settings_validate() {
    assert_eq!(Settings::default().validate(), Ok(()));
    let loaded = load_settings(None).expect("defaults");
    assert_eq!(loaded, Settings::default());
}

#[test]
fn invalid_settings_are_rejected() {
    let mut s = Settings::default();
    s.fps_cap = 0;
    assert_eq!(s.validate(), Err(ConfigError::FpsOutOfRange(0)));

    let mut s = Settings::default();
    s.bodies.restitution = 1.5;
    assert!(matches!(
        s.validate(),
        Err(ConfigError::OutOfRange {
            name: "bodies.restitution",
            ..
        })
    ));

    let mut s = Settings::default();
    s.bodies.radius = 0.0;
    assert!(matches!(
        s.validate(),
        Err(ConfigError::NotPositive {
            name: "bodies.radius",
            ..
        })
    ));
}

#[test]
fn fps_cap_must_be_one_the_scheduler_honours() {
    for fps in [10, 60, 240] {
        let s = Settings {
            fps_cap: fps,
            ..Settings::default()
        };
        assert_eq!(s.validate(), Ok(()), "fps {}", fps);
        let budget = FrameScheduler::new(fps, Instant::now()).frame_budget();
        assert!((budget.as_secs_f32() - 1.0 / fps as f32).abs() < 1e-6);
    }
    for fps in [9, 241, 500] {
        let s = Settings {
            fps_cap: fps,
            ..Settings::default()
        };
        assert_eq!(s.validate(), Err(ConfigError::FpsOutOfRange(fps)));
    }
}

#[test]
fn partial_settings_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"fps_cap": 30, "backdrop": "grid", "bodies": {{"radius": 40}}}}"#
    )
    .expect("write settings");

    let s = load_settings(Some(file.path())).expect("settings parse");
    assert_eq!(s.fps_cap, 30);
    assert_eq!(s.backdrop, BackdropKind::Grid);
    assert_eq!(s.bodies.radius, 40.0);
    assert_eq!(s.bodies.restitution, 0.9);
    assert_eq!(s.field, Settings::default().field);
}

#[test]
fn unreadable_settings_are_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(load_settings(Some(dir.path().join("missing.json").as_path())).is_err());

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "not json").expect("write settings");
    assert!(load_settings(Some(file.path())).is_err());
}

// ==================================================================================
// Page
// ==================================================================================

#[test]
fn builtin_bubbles_are_spawned_inside_the_page() {
    let settings = Settings {
        seed: Some(1),
        ..Settings::default()
    };
    let page = Page::new(settings, ContentMap::builtin(), viewport());
    let bubbles = ContentMap::builtin().placed(Placement::Bubble).count();
    assert_eq!(page.bodies().len(), bubbles);
    for b in page.bodies().bodies() {
        assert!(b.pos.x >= b.radius() && b.pos.x <= 800.0 - b.radius());
        assert!(b.pos.y >= b.radius() && b.pos.y <= 640.0 - b.radius());
    }
}

#[test]
fn tapping_a_bubble_opens_its_detail_and_bursts() {
    let mut page = page();
    let (key, p) = {
        let b = &page.bodies().bodies()[1];
        (b.key.clone(), b.pos)
    };

    page.handle(InputEvent::PointerDown(p));
    page.handle(InputEvent::PointerUp(p));

    assert_eq!(page.detail(), Some(key.as_str()));
    assert_eq!(page.sparks().sparks().len(), 12);
}

#[test]
fn dragging_a_bubble_does_not_open_it() {
    let mut page = page();
    let p = page.bodies().bodies()[1].pos;
    let to = p.add(Vec2::new(50.0, 30.0));

    page.handle(InputEvent::PointerDown(p));
    page.handle(InputEvent::PointerMoved(to));
    page.handle(InputEvent::PointerUp(to));

    assert_eq!(page.detail(), None);
    let b = &page.bodies().bodies()[1];
    assert!((b.vel.x - 25.0).abs() < 1e-4 && (b.vel.y - 15.0).abs() < 1e-4);
    assert!(b.was_dragged());
}

#[test]
fn open_detail_blocks_drags_and_closes_on_outside_click() {
    let mut page = page();
    assert!(page.open_detail("lab"));

    let p = page.bodies().bodies()[0].pos;
    page.handle(InputEvent::PointerDown(p));
    assert!(page.bodies().session().is_none());

    let rect = detail_rect(100, 40);
    let (col, row) = viewport().cell_at(p);
    let inside = rect.contains(col, row);
    assert_eq!(page.detail().is_some(), inside);

    page.open_detail("lab");
    page.handle(InputEvent::PointerDown(Vec2::new(4.0, 630.0)));
    assert_eq!(page.detail(), None);
}

#[test]
fn escape_closes_the_detail() {
    let mut page = page();
    page.open_detail("skills");
    assert_eq!(page.handle(InputEvent::Key(KeyAction::CloseDetail)), Flow::Continue);
    assert_eq!(page.detail(), None);
}

#[test]
fn hud_blocks_open_their_entries() {
    let mut page = page();
    let item = page.hud().items()[0].clone();
    let p = viewport().cell_center(item.col, 0);
    page.handle(InputEvent::PointerDown(p));
    assert_eq!(page.detail(), Some(item.key.as_str()));
}

#[test]
fn unknown_keys_are_ignored() {
    let mut page = page();
    assert!(!page.open_detail("nope"));
    assert_eq!(page.detail(), None);

    let ghost = page
        .bodies_mut()
        .insert(Body::new("ghost", Vec2::new(700.0, 540.0), 70.0, 1.0));
    let p = page.bodies().get(ghost).map(|b| b.pos).unwrap_or_default();
    page.handle(InputEvent::PointerDown(p));
    page.handle(InputEvent::PointerUp(p));
    assert_eq!(page.detail(), None);
    assert!(page.sparks().sparks().is_empty());
}

#[test]
fn pointer_leaving_clears_the_pointer() {
    let mut page = page();
    page.handle(InputEvent::PointerMoved(Vec2::new(10.0, 10.0)));
    assert_eq!(page.pointer().pos, Some(Vec2::new(10.0, 10.0)));
    page.handle(InputEvent::PointerLeft);
    assert_eq!(page.pointer().pos, None);
}

#[test]
fn keys_drive_the_loop_and_backdrop() {
    let mut page = page();
    assert_eq!(page.handle(InputEvent::Key(KeyAction::Quit)), Flow::Quit);
    assert_eq!(
        page.handle(InputEvent::Key(KeyAction::TogglePause)),
        Flow::TogglePause
    );

    assert_eq!(page.backdrop().kind(), BackdropKind::Lattice);
    page.handle(InputEvent::Key(KeyAction::CycleBackdrop));
    assert_eq!(page.backdrop().kind(), BackdropKind::Grid);
    assert!(matches!(page.backdrop(), Backdrop::Grid(g) if !g.cells().is_empty()));
    page.handle(InputEvent::Key(KeyAction::CycleBackdrop));
    assert_eq!(page.backdrop().kind(), BackdropKind::Lattice);
}

#[test]
fn scrolling_is_clamped_to_the_page() {
    let mut page = page();
    page.handle(InputEvent::Scrolled(3.0));
    assert_eq!(page.scroll(), 48.0);
    page.handle(InputEvent::Scrolled(-10.0));
    assert_eq!(page.scroll(), 0.0);
}

#[test]
fn relayout_regenerates_the_backdrop_and_contains_bodies() {
    let mut page = page();
    let vp = Viewport::from_cells(50, 40, 8.0, 16.0);
    page.relayout(vp);

    let Backdrop::Lattice(field) = page.backdrop() else {
        panic!("lattice expected");
    };
    assert_eq!(
        field.particles().len(),
        bubblefield::field::particle_count(400.0, 640.0, field.params.density)
    );
    assert!(field
        .particles()
        .iter()
        .all(|p| p.pos.x <= 400.0 && p.pos.y <= 640.0));
    for b in page.bodies().bodies() {
        assert!(b.pos.x >= b.radius() && b.pos.x <= 400.0 - b.radius());
    }
}

#[test]
fn stepping_keeps_everything_finite_and_contained() {
    let mut page = page();
    page.handle(InputEvent::PointerMoved(Vec2::new(400.0, 300.0)));
    for _ in 0..300 {
        page.step();
    }
    for b in page.bodies().bodies() {
        assert!(b.pos.is_finite());
        assert!(b.pos.x >= b.radius() - 1e-3 && b.pos.x <= 800.0 - b.radius() + 1e-3);
        assert!(b.pos.y >= b.radius() - 1e-3 && b.pos.y <= 640.0 - b.radius() + 1e-3);
    }
}

#[test]
fn draw_puts_the_hud_on_the_top_row() {
    let mut page = page();
    page.open_detail("lab");
    let vp = viewport();
    let mut canvas = PixelCanvas::new(&vp);
    let mut cells = CellBuffer::new(vp.cols, vp.rows);
    page.draw(&mut canvas, &mut cells, "ok");

    let row: String = (0..12).filter_map(|x| cells.get(x, 0)).map(|c| c.ch).collect();
    assert_eq!(row, " bubblefield");

    let rect = detail_rect(vp.cols, vp.rows);
    assert_eq!(cells.get(rect.x, rect.y).map(|c| c.ch), Some('┌'));
}
