//! Floating navigation bubbles: circular bodies with mass that drift, bounce
//! off the viewport edges and each other, and can be grabbed and thrown.

use crate::math::{clamp_range, jitter, Vec2};
use crate::surface::{Pixel, PixelCanvas};
use rand::Rng;
use serde::{Deserialize, Serialize};

const BODY_FILL: Pixel = Pixel::rgba(30, 41, 59, 140);
const BODY_RIM: Pixel = Pixel::rgba(251, 191, 36, 230);
const BODY_RIM_HELD: Pixel = Pixel::rgba(253, 230, 138, 255);

/// Collision normal used when two centres coincide.
const FALLBACK_NORMAL: Vec2 = Vec2::new(1.0, 0.0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    pub radius: f32,
    pub mass: f32,
    /// Distance from the viewport edges kept clear when scattering bodies.
    pub spawn_padding: f32,
    /// Full range of the initial velocity per axis.
    pub initial_speed: f32,
    pub wall_damping: f32,
    pub friction: f32,
    /// Below this speed on both axes a body gets a random nudge.
    pub stall_speed: f32,
    pub stall_kick: f32,
    pub restitution: f32,
    pub correction_percent: f32,
    pub slop: f32,
    pub throw_damping: f32,
    /// Pointer travel that turns a press into a drag.
    pub drag_threshold: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            radius: 70.0,
            mass: 1.0,
            spawn_padding: 100.0,
            initial_speed: 2.0,
            wall_damping: 0.8,
            friction: 0.99,
            stall_speed: 0.1,
            stall_kick: 0.1,
            restitution: 0.9,
            correction_percent: 0.8,
            slop: 0.01,
            throw_damping: 0.5,
            drag_threshold: 5.0,
        }
    }
}

/// Stable handle to a body inside a [`BodySystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

impl BodyId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Content key opened when the body is tapped.
    pub key: String,
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    mass: f32,
    state: DragState,
    was_dragged: bool,
}

impl Body {
    pub fn new(key: impl Into<String>, pos: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            key: key.into(),
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
            state: DragState::Idle,
            was_dragged: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
    pub fn mass(&self) -> f32 {
        self.mass
    }
    pub fn state(&self) -> DragState {
        self.state
    }
    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }
    /// Set once the pointer travelled past the drag threshold during the last press.
    pub fn was_dragged(&self) -> bool {
        self.was_dragged
    }

    /// A held body behaves as infinitely heavy.
    fn inv_mass(&self) -> f32 {
        if self.is_dragging() || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Velocity seen by collisions. A held body is a static obstacle.
    fn contact_vel(&self) -> Vec2 {
        if self.is_dragging() {
            Vec2::ZERO
        } else {
            self.vel
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.pos.distance(p) <= self.radius
    }
}

/// Transient record of the pointer holding one body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub body: BodyId,
    pub grab_offset: Vec2,
    pub start: Vec2,
    pub last_pointer: Vec2,
    /// Pointer delta of the most recent move.
    pub throw: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragRelease {
    pub body: BodyId,
    pub velocity: Vec2,
    pub was_dragged: bool,
}

impl DragRelease {
    pub fn is_tap(&self) -> bool {
        !self.was_dragged
    }
}

fn reflect_axis(pos: f32, vel: f32, radius: f32, extent: f32, damping: f32) -> (f32, f32) {
    let (lo, hi) = (radius, extent - radius);
    if lo > hi {
        ((lo + hi) * 0.5, -vel * damping)
    } else if pos < lo {
        (lo, -vel * damping)
    } else if pos > hi {
        (hi, -vel * damping)
    } else {
        (pos, vel)
    }
}

/// Separate and bounce one overlapping pair. Returns whether they were in contact.
pub fn resolve_pair(a: &mut Body, b: &mut Body, params: &BodyParams) -> bool {
    let delta = b.pos.sub(a.pos);
    let min_dist = a.radius + b.radius;
    if delta.len_sq() > min_dist * min_dist {
        return false;
    }

    let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return true;
    }

    let distance = delta.len();
    let normal = delta.normalize_or(FALLBACK_NORMAL);

    let overlap = min_dist - distance;
    if overlap > params.slop {
        let correction = normal.mul(overlap * params.correction_percent / inv_sum);
        a.pos = a.pos.sub(correction.mul(inv_a));
        b.pos = b.pos.add(correction.mul(inv_b));
    }

    let vel_along_normal = b.contact_vel().sub(a.contact_vel()).dot(normal);
    if vel_along_normal > 0.0 {
        return true;
    }

    let j = -(1.0 + params.restitution) * vel_along_normal / inv_sum;
    let impulse = normal.mul(j);
    a.vel = a.vel.sub(impulse.mul(inv_a));
    b.vel = b.vel.add(impulse.mul(inv_b));
    true
}

fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

pub struct BodySystem {
    pub params: BodyParams,
    bodies: Vec<Body>,
    session: Option<DragSession>,
    width: f32,
    height: f32,
}

impl BodySystem {
    pub fn new(params: BodyParams) -> Self {
        Self {
            params,
            bodies: Vec::new(),
            session: None,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Register a body with the configured radius and mass; placed by `initialize`.
    pub fn spawn(&mut self, key: impl Into<String>) -> BodyId {
        let body = Body::new(key, Vec2::ZERO, self.params.radius, self.params.mass);
        self.insert(body)
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        BodyId(self.bodies.len() - 1)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Scatter every body inside the padded viewport with a small random velocity.
    pub fn initialize<R: Rng + ?Sized>(&mut self, width: f32, height: f32, rng: &mut R) {
        self.width = width;
        self.height = height;
        let pad = self.params.spawn_padding;
        let speed = self.params.initial_speed;
        for b in &mut self.bodies {
            let x = pad + rng.gen::<f32>() * (width - 2.0 * pad);
            let y = pad + rng.gen::<f32>() * (height - 2.0 * pad);
            b.pos = Vec2::new(
                clamp_range(x, b.radius, width - b.radius),
                clamp_range(y, b.radius, height - b.radius),
            );
            b.vel = Vec2::new(jitter(rng, speed), jitter(rng, speed));
        }
        log::debug!("bodies: {} placed in {:.0}x{:.0}", self.bodies.len(), width, height);
    }

    /// Adopt a new viewport, pulling every body back inside it.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.contain();
    }

    fn contain(&mut self) {
        let (w, h) = (self.width, self.height);
        for b in &mut self.bodies {
            b.pos.x = clamp_range(b.pos.x, b.radius, w - b.radius);
            b.pos.y = clamp_range(b.pos.y, b.radius, h - b.radius);
        }
    }

    /// Advance one frame: integrate, bounce off walls, apply friction,
    /// un-stall, then resolve body-body contacts.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (w, h) = (self.width, self.height);
        let p = &self.params;

        for b in self.bodies.iter_mut().filter(|b| !b.is_dragging()) {
            b.pos = b.pos.add(b.vel);

            (b.pos.x, b.vel.x) = reflect_axis(b.pos.x, b.vel.x, b.radius, w, p.wall_damping);
            (b.pos.y, b.vel.y) = reflect_axis(b.pos.y, b.vel.y, b.radius, h, p.wall_damping);

            b.vel = b.vel.mul(p.friction);

            if b.vel.x.abs() < p.stall_speed && b.vel.y.abs() < p.stall_speed {
                b.vel.x += jitter(rng, p.stall_kick);
                b.vel.y += jitter(rng, p.stall_kick);
            }
        }

        self.resolve_collisions();
        self.contain();
    }

    /// One pass over every unordered pair.
    pub fn resolve_collisions(&mut self) -> usize {
        let n = self.bodies.len();
        let mut contacts = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(&mut self.bodies, i, j);
                if resolve_pair(a, b, &self.params) {
                    contacts += 1;
                }
            }
        }
        contacts
    }

    /// Topmost body under `p`.
    pub fn body_at(&self, p: Vec2) -> Option<BodyId> {
        if let Some(s) = &self.session {
            if self.bodies[s.body.0].contains(p) {
                return Some(s.body);
            }
        }
        self.bodies.iter().rposition(|b| b.contains(p)).map(BodyId)
    }

    /// Grab `id` at `pointer`. Refused while another body is held.
    pub fn begin_drag(&mut self, id: BodyId, pointer: Vec2) -> bool {
        if self.session.is_some() {
            log::debug!("drag on {:?} ignored, a body is already held", id);
            return false;
        }
        let Some(b) = self.bodies.get_mut(id.0) else {
            return false;
        };
        b.state = DragState::Dragging;
        b.was_dragged = false;
        b.vel = Vec2::ZERO;
        self.session = Some(DragSession {
            body: id,
            grab_offset: pointer.sub(b.pos),
            start: pointer,
            last_pointer: pointer,
            throw: Vec2::ZERO,
        });
        log::debug!("drag start on {:?} ({})", id, b.key);
        true
    }

    pub fn drag_to(&mut self, pointer: Vec2) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        let (w, h) = (self.width, self.height);
        let b = &mut self.bodies[s.body.0];

        let target = pointer.sub(s.grab_offset);
        b.pos = Vec2::new(
            clamp_range(target.x, b.radius, w - b.radius),
            clamp_range(target.y, b.radius, h - b.radius),
        );

        s.throw = pointer.sub(s.last_pointer);
        s.last_pointer = pointer;
        b.vel = Vec2::ZERO;

        if pointer.distance(s.start) > self.params.drag_threshold {
            b.was_dragged = true;
        }
    }

    /// Let go of the held body, throwing it with the last pointer delta.
    pub fn end_drag(&mut self) -> Option<DragRelease> {
        let s = self.session.take()?;
        let b = &mut self.bodies[s.body.0];
        b.state = DragState::Idle;
        b.vel = s.throw.mul(self.params.throw_damping);
        log::debug!("drag end on {:?}, dragged={}", s.body, b.was_dragged);
        Some(DragRelease {
            body: s.body,
            velocity: b.vel,
            was_dragged: b.was_dragged,
        })
    }

    pub fn render(&self, canvas: &mut PixelCanvas) {
        let held = self.session.map(|s| s.body.0);
        for (i, b) in self.bodies.iter().enumerate() {
            if Some(i) == held {
                continue;
            }
            canvas.fill_circle(b.pos, b.radius, BODY_FILL, 0.0);
            canvas.fill_circle(b.pos, b.radius, BODY_RIM, 0.08);
        }
        // Held body last so it sits on top.
        if let Some(b) = held.and_then(|i| self.bodies.get(i)) {
            canvas.fill_circle(b.pos, b.radius, BODY_FILL, 0.0);
            canvas.fill_circle(b.pos, b.radius, BODY_RIM_HELD, 0.12);
        }
    }
}
