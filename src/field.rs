//! Ambient "atomic lattice" backdrop: particles vibrating around fixed anchors,
//! pushed aside by the pointer and linked to near neighbours.

use crate::input::PointerState;
use crate::math::{jitter, Vec2, EPSILON};
use crate::surface::{Pixel, PixelCanvas};
use rand::Rng;
use serde::{Deserialize, Serialize};

const ATOM_COLOR: Pixel = Pixel::rgba(251, 191, 36, 102); // metallic gold, 0.4
const LINK_COLOR: Pixel = Pixel::rgba(148, 163, 184, 255); // slate

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Particles per square logical pixel.
    pub density: f32,
    pub connection_distance: f32,
    /// Fraction of the anchor offset recovered each frame.
    pub return_force: f32,
    pub repulsion_scale: f32,
    /// Offset from the anchor past which drift velocity flips.
    pub vibration_bound: f32,
    /// Full range of the initial drift velocity per axis.
    pub drift_speed: f32,
    pub min_size: f32,
    pub size_range: f32,
    /// Opacity of a link between two coincident particles.
    pub link_opacity: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            density: 0.0001,
            connection_distance: 130.0,
            return_force: 0.02,
            repulsion_scale: 5.0,
            vibration_bound: 10.0,
            drift_speed: 0.5,
            min_size: 1.0,
            size_range: 2.0,
            link_opacity: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub anchor: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl Particle {
    pub fn spawn<R: Rng + ?Sized>(at: Vec2, params: &FieldParams, rng: &mut R) -> Self {
        Self {
            pos: at,
            anchor: at,
            vel: Vec2::new(jitter(rng, params.drift_speed), jitter(rng, params.drift_speed)),
            size: params.min_size + rng.gen::<f32>() * params.size_range,
        }
    }

    /// One frame: repulsion, return to anchor, drift, then bounce the drift.
    pub fn update(&mut self, pointer: &PointerState, params: &FieldParams) {
        let push = repulsion(self.pos, self.size, pointer, params.repulsion_scale);
        self.pos = self.pos.sub(push);

        let home = self.anchor.sub(self.pos);
        self.pos = self.pos.add(home.mul(params.return_force));

        self.pos = self.pos.add(self.vel);

        if (self.pos.x - self.anchor.x).abs() > params.vibration_bound {
            self.vel.x = -self.vel.x;
        }
        if (self.pos.y - self.anchor.y).abs() > params.vibration_bound {
            self.vel.y = -self.vel.y;
        }
    }
}

/// Displacement toward the pointer that the particle should move *against*.
/// Zero when the pointer is absent, out of range, or exactly on the particle.
pub fn repulsion(pos: Vec2, size: f32, pointer: &PointerState, scale: f32) -> Vec2 {
    let Some(p) = pointer.pos else {
        return Vec2::ZERO;
    };
    let delta = p.sub(pos);
    let distance = delta.len();
    if distance >= pointer.radius || distance <= EPSILON {
        return Vec2::ZERO;
    }
    let force = (pointer.radius - distance) / pointer.radius;
    delta.mul(1.0 / distance).mul(force * size * scale)
}

pub fn particle_count(width: f32, height: f32, density: f32) -> usize {
    let n = (width.max(0.0) * height.max(0.0) * density.max(0.0)).ceil();
    n as usize
}

/// A line to draw between particles `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub opacity: f32,
}

pub struct ParticleField {
    pub params: FieldParams,
    width: f32,
    height: f32,
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new(params: FieldParams) -> Self {
        Self {
            params,
            width: 0.0,
            height: 0.0,
            particles: Vec::new(),
        }
    }

    /// Throw away every particle and scatter a fresh set over the viewport.
    pub fn initialize<R: Rng + ?Sized>(&mut self, width: f32, height: f32, rng: &mut R) {
        self.width = width;
        self.height = height;
        let n = particle_count(width, height, self.params.density);
        self.particles.clear();
        self.particles.reserve(n);
        for _ in 0..n {
            let at = Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height);
            self.particles.push(Particle::spawn(at, &self.params, rng));
        }
        log::debug!("lattice: {} particles for {:.0}x{:.0}", n, width, height);
    }

    pub fn update(&mut self, pointer: &PointerState) {
        for p in &mut self.particles {
            p.update(pointer, &self.params);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Unordered pairs closer than the connection distance, each reported once.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        let max = self.params.connection_distance;
        let k = self.params.link_opacity;
        self.particles.iter().enumerate().flat_map(move |(i, a)| {
            self.particles[i + 1..]
                .iter()
                .enumerate()
                .filter_map(move |(off, b)| {
                    let d = a.pos.distance(b.pos);
                    (d < max).then(|| Link {
                        a: i,
                        b: i + 1 + off,
                        opacity: k * (1.0 - d / max),
                    })
                })
        })
    }

    pub fn render(&self, canvas: &mut PixelCanvas) {
        for link in self.links() {
            let a = self.particles[link.a].pos;
            let b = self.particles[link.b].pos;
            canvas.line(a, b, LINK_COLOR.with_opacity(link.opacity));
        }
        for p in &self.particles {
            canvas.fill_circle(p.pos, p.size, ATOM_COLOR, 0.0);
        }
    }
}
