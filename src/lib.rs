//! Draggable bubbles with elastic collisions over an interactive particle
//! backdrop, drawn to the terminal with braille dots.

pub mod app;
pub mod bodies;
pub mod config;
pub mod content;
pub mod field;
pub mod grid;
pub mod input;
pub mod math;
pub mod scheduler;
pub mod surface;
pub mod trail;

pub use bodies::{Body, BodyId, BodyParams, BodySystem, DragRelease, DragState};
pub use config::{load_settings, BackdropKind, ConfigError, Settings};
pub use content::{ContentMap, Entry, Placement};
pub use field::{FieldParams, Particle, ParticleField};
pub use grid::{GridField, GridParams};
pub use input::{InputBridge, InputEvent, KeyAction, PointerState};
pub use math::Vec2;
pub use scheduler::FrameScheduler;
pub use surface::Viewport;
pub use trail::{SparkParams, SparkSystem};
