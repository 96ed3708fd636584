//! Small 2D vector helpers shared by every simulation.

use rand::Rng;

/// Distances at or below this are treated as coincident points.
pub const EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
    pub fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
    pub fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y
    }
    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }
    pub fn len(self) -> f32 {
        self.len_sq().sqrt()
    }
    pub fn distance(self, o: Self) -> f32 {
        o.sub(self).len()
    }

    /// Unit vector in the same direction, or `fallback` for a (near) zero vector.
    pub fn normalize_or(self, fallback: Self) -> Self {
        let l = self.len();
        if l > EPSILON {
            self.mul(1.0 / l)
        } else {
            fallback
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Clamp into `[lo, hi]`. An empty range (lo > hi) collapses to its midpoint.
pub fn clamp_range(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        (lo + hi) * 0.5
    } else {
        v.max(lo).min(hi)
    }
}

/// Uniform sample in `[-amplitude/2, amplitude/2)`.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_uses_fallback() {
        let n = Vec2::ZERO.normalize_or(Vec2::new(1.0, 0.0));
        assert_eq!(n, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn normalize_has_unit_length() {
        let n = Vec2::new(3.0, 4.0).normalize_or(Vec2::ZERO);
        assert!((n.len() - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn empty_range_collapses_to_midpoint() {
        assert_eq!(clamp_range(5.0, 70.0, 30.0), 50.0);
        assert_eq!(clamp_range(5.0, 10.0, 30.0), 10.0);
        assert_eq!(clamp_range(50.0, 10.0, 30.0), 30.0);
    }
}
