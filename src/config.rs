use crate::bodies::BodyParams;
use crate::field::FieldParams;
use crate::grid::GridParams;
use crate::scheduler::FPS_RANGE;
use crate::trail::SparkParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackdropKind {
    #[default]
    Lattice,
    Grid,
}

impl BackdropKind {
    pub fn next(self) -> Self {
        match self {
            BackdropKind::Lattice => BackdropKind::Grid,
            BackdropKind::Grid => BackdropKind::Lattice,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    /// Fixed seed for reproducible layouts; random when absent.
    pub seed: Option<u64>,
    pub backdrop: BackdropKind,
    pub enable_color: bool,
    /// Logical pixels covered by one terminal cell.
    pub cell_width: f32,
    pub cell_height: f32,
    pub pointer_radius: f32,
    pub trail: bool,
    pub bursts: bool,
    pub parallax: f32,
    pub content: Option<PathBuf>,
    pub field: FieldParams,
    pub grid: GridParams,
    pub bodies: BodyParams,
    pub sparks: SparkParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            seed: None,
            backdrop: BackdropKind::Lattice,
            enable_color: true,
            cell_width: 8.0,
            cell_height: 16.0,
            pointer_radius: 150.0,
            trail: true,
            bursts: true,
            parallax: 0.1,
            content: None,
            field: FieldParams::default(),
            grid: GridParams::default(),
            bodies: BodyParams::default(),
            sparks: SparkParams::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fps_cap must be between 10 and 240, got {0}")]
    FpsOutOfRange(u32),
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must lie in {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: f32,
    },
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !FPS_RANGE.contains(&self.fps_cap) {
            return Err(ConfigError::FpsOutOfRange(self.fps_cap));
        }
        positive("cell_width", self.cell_width)?;
        positive("cell_height", self.cell_height)?;
        positive("pointer_radius", self.pointer_radius)?;
        positive("bodies.radius", self.bodies.radius)?;
        positive("bodies.mass", self.bodies.mass)?;
        positive("grid.cell_size", self.grid.cell_size)?;
        positive("field.connection_distance", self.field.connection_distance)?;
        if self.field.density.is_nan() || self.field.density < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "field.density",
                range: "[0, inf)",
                value: self.field.density,
            });
        }
        if !(0.0..=1.0).contains(&self.bodies.restitution) {
            return Err(ConfigError::OutOfRange {
                name: "bodies.restitution",
                range: "[0, 1]",
                value: self.bodies.restitution,
            });
        }
        if !(self.bodies.friction > 0.0 && self.bodies.friction <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "bodies.friction",
                range: "(0, 1]",
                value: self.bodies.friction,
            });
        }
        Ok(())
    }
}

/// Defaults when no path is given; a given path must exist and parse.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let s = fs::read_to_string(path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&s)
        .with_context(|| format!("could not parse config {}", path.display()))?;
    log::info!("loaded settings from {}", path.display());
    Ok(settings)
}
