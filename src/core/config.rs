//! Tuning constants for the particle field
//!
//! Every value has a default matching the landing page look. Overrides come
//! from JSON (a file for the CLI, a window global in the browser).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::FieldError;

/// Default sentinel coordinate for "no pointer"
pub const POINTER_FAR_AWAY: f64 = -9999.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Viewport area (px²) per particle
    pub density: f64,
    /// Max distance at which two particles are joined (D)
    pub connection_distance: f64,
    /// Pointer repulsion and link radius (R)
    pub pointer_radius: f64,
    pub repulsion_strength: f64,
    /// Spring constant pulling particles back to their home
    pub homing_strength: f64,
    /// Full width of the per-axis random jitter
    pub drift: f64,
    pub damping: f64,
    pub max_speed: f64,
    /// Full width of the per-axis initial velocity range
    pub initial_speed: f64,
    /// Peak alpha of particle-to-particle lines
    pub edge_alpha: f64,
    /// Peak alpha of particle-to-pointer lines
    pub pointer_alpha: f64,
    /// Alpha multiplier for particle lines in light mode
    pub light_edge_scale: f64,
    /// Alpha multiplier for pointer lines in light mode
    pub light_pointer_scale: f64,
    pub edge_width: f64,
    pub pointer_width: f64,
    pub draw_particles: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            density: 4000.0,
            connection_distance: 120.0,
            pointer_radius: 200.0,
            repulsion_strength: 0.5,
            homing_strength: 0.0008,
            drift: 0.06,
            damping: 0.99,
            max_speed: 1.5,
            initial_speed: 1.2,
            edge_alpha: 0.2,
            pointer_alpha: 0.4,
            light_edge_scale: 0.5,
            light_pointer_scale: 0.5,
            edge_width: 0.5,
            pointer_width: 0.8,
            draw_particles: true,
        }
    }
}

impl FieldConfig {
    /// Parse a JSON override. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        debug!(?config, "Field config loaded");
        Ok(config)
    }

    /// Reject values that would break the simulation invariants.
    pub fn validate(&self) -> Result<(), FieldError> {
        fn positive(name: &'static str, value: f64) -> Result<(), FieldError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(FieldError::InvalidConfig { field: name, value })
            }
        }

        positive("density", self.density)?;
        positive("connection_distance", self.connection_distance)?;
        positive("pointer_radius", self.pointer_radius)?;
        positive("max_speed", self.max_speed)?;
        positive("edge_width", self.edge_width)?;
        positive("pointer_width", self.pointer_width)?;

        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(FieldError::InvalidConfig {
                field: "damping",
                value: self.damping,
            });
        }

        for (name, value) in [
            ("repulsion_strength", self.repulsion_strength),
            ("homing_strength", self.homing_strength),
            ("drift", self.drift),
            ("initial_speed", self.initial_speed),
            ("edge_alpha", self.edge_alpha),
            ("pointer_alpha", self.pointer_alpha),
            ("light_edge_scale", self.light_edge_scale),
            ("light_pointer_scale", self.light_pointer_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError::InvalidConfig { field: name, value });
            }
        }

        Ok(())
    }

    /// Number of particles for a viewport of the given size
    pub fn particle_count(&self, width: f64, height: f64) -> usize {
        let area = width * height;
        if !area.is_finite() || area <= 0.0 || width <= 0.0 {
            return 0;
        }
        (area / self.density).floor() as usize
    }
}
