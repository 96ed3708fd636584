//! Short-lived sparks: a faint trail behind the pointer and radial bursts on tap.

use crate::math::{jitter, Vec2};
use crate::surface::{Pixel, PixelCanvas};
use rand::Rng;
use serde::{Deserialize, Serialize};

const TRAIL_COLOR: Pixel = Pixel::rgba(74, 144, 226, 255);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkParams {
    /// Chance per frame of dropping a trail spark at the pointer.
    pub spawn_chance: f64,
    pub trail_speed: f32,
    pub decay: f32,
    pub burst_count: usize,
    /// Distance a burst spark covers over its life.
    pub burst_reach: f32,
    pub burst_decay: f32,
    pub max_sparks: usize,
}

impl Default for SparkParams {
    fn default() -> Self {
        Self {
            spawn_chance: 0.3,
            trail_speed: 2.0,
            decay: 0.02,
            burst_count: 12,
            burst_reach: 100.0,
            burst_decay: 1.0 / 60.0,
            max_sparks: 512,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub decay: f32,
}

pub struct SparkSystem {
    pub params: SparkParams,
    sparks: Vec<Spark>,
}

impl SparkSystem {
    pub fn new(params: SparkParams) -> Self {
        Self {
            params,
            sparks: Vec::new(),
        }
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }

    fn push(&mut self, s: Spark) {
        if self.sparks.len() < self.params.max_sparks {
            self.sparks.push(s);
        }
    }

    pub fn emit_trail<R: Rng + ?Sized>(&mut self, pointer: Option<Vec2>, rng: &mut R) {
        let Some(at) = pointer else {
            return;
        };
        if !rng.gen_bool(self.params.spawn_chance.clamp(0.0, 1.0)) {
            return;
        }
        let speed = self.params.trail_speed;
        self.push(Spark {
            pos: at,
            vel: Vec2::new(jitter(rng, speed), jitter(rng, speed)),
            life: 1.0,
            decay: self.params.decay,
        });
    }

    /// Ring of sparks flying outward from `center`.
    pub fn burst(&mut self, center: Vec2) {
        let n = self.params.burst_count;
        let frames = (1.0 / self.params.burst_decay.max(1e-3)).max(1.0);
        let speed = self.params.burst_reach / frames;
        for i in 0..n {
            let angle = i as f32 / n as f32 * std::f32::consts::TAU;
            self.push(Spark {
                pos: center,
                vel: Vec2::new(angle.cos(), angle.sin()).mul(speed),
                life: 1.0,
                decay: self.params.burst_decay,
            });
        }
    }

    pub fn update(&mut self) {
        for s in &mut self.sparks {
            s.pos = s.pos.add(s.vel);
            s.life -= s.decay;
        }
        self.sparks.retain(|s| s.life > 0.0);
    }

    pub fn render(&self, canvas: &mut PixelCanvas) {
        for s in &self.sparks {
            canvas.plot(s.pos, TRAIL_COLOR.with_opacity(s.life * 0.5));
        }
    }
}
