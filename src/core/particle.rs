//! Particle and pointer state

use super::config::POINTER_FAR_AWAY;

/// One point in the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Jittered-grid anchor the particle is pulled back toward
    pub home_x: f64,
    pub home_y: f64,
    /// Dot radius (drawing only)
    pub radius: f64,
    /// Dot alpha (drawing only)
    pub opacity: f64,
}

impl Particle {
    /// Particle at rest at its own home position
    pub fn at_rest(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            home_x: x,
            home_y: y,
            radius: 1.0,
            opacity: 0.5,
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    #[inline]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Last known pointer location.
///
/// When the pointer leaves the surface it is parked far outside the viewport
/// so every proximity check against it fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub const FAR_AWAY: Pointer = Pointer {
        x: POINTER_FAR_AWAY,
        y: POINTER_FAR_AWAY,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_far_away(&self) -> bool {
        *self == Self::FAR_AWAY
    }

    pub fn leave(&mut self) {
        *self = Self::FAR_AWAY;
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::FAR_AWAY
    }
}
