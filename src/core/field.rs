//! Particle set: jittered-grid initialization and the per-frame physics step

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::config::FieldConfig;
use super::particle::{Particle, Pointer};

/// All particles for one viewport size.
///
/// The set is only ever replaced wholesale (on resize); particles are never
/// added or removed individually.
pub struct ParticleField {
    config: FieldConfig,
    width: f64,
    height: f64,
    particles: Vec<Particle>,
    rng: SmallRng,
}

impl ParticleField {
    /// Create a field seeded from OS entropy
    pub fn new(config: FieldConfig, width: f64, height: f64) -> Self {
        Self::with_rng(config, width, height, SmallRng::from_entropy())
    }

    /// Create a field with a fixed seed (reproducible runs and tests)
    pub fn with_seed(config: FieldConfig, width: f64, height: f64, seed: u64) -> Self {
        Self::with_rng(config, width, height, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: FieldConfig, width: f64, height: f64, mut rng: SmallRng) -> Self {
        let particles = create_particles(&config, width, height, &mut rng);
        debug!(width, height, count = particles.len(), "Particle field created");
        Self {
            config,
            width,
            height,
            particles,
            rng,
        }
    }

    /// Regenerate every particle for a new viewport size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.particles = create_particles(&self.config, width, height, &mut self.rng);
        debug!(width, height, count = self.particles.len(), "Particle field regenerated");
    }

    /// Advance every particle by one frame.
    pub fn step(&mut self, pointer: Pointer) {
        let (width, height) = (self.width, self.height);
        for p in &mut self.particles {
            step_particle(p, pointer, width, height, &self.config, &mut self.rng);
        }
        trace!(count = self.particles.len(), "Field stepped");
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Place `floor(area / density)` particles, one per cell of a jittered grid.
pub fn create_particles<R: Rng>(
    config: &FieldConfig,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Vec<Particle> {
    let count = config.particle_count(width, height);
    if count == 0 {
        return Vec::new();
    }

    let cols = ((count as f64 * (width / height)).sqrt().ceil() as usize).max(1);
    let rows = count.div_ceil(cols);
    let cell_w = width / cols as f64;
    let cell_h = height / rows as f64;
    let speed = config.initial_speed;

    (0..count)
        .map(|i| {
            let col = (i % cols) as f64;
            let row = (i / cols) as f64;
            let x = wrap(col * cell_w + rng.gen::<f64>() * cell_w, width);
            let y = wrap(row * cell_h + rng.gen::<f64>() * cell_h, height);
            Particle {
                x,
                y,
                vx: (rng.gen::<f64>() - 0.5) * speed,
                vy: (rng.gen::<f64>() - 0.5) * speed,
                home_x: x,
                home_y: y,
                radius: rng.gen::<f64>() * 1.5 + 0.5,
                opacity: rng.gen::<f64>() * 0.5 + 0.3,
            }
        })
        .collect()
}

/// One physics tick for a single particle.
///
/// Order: pointer repulsion, homing, drift, damping, speed clamp, integrate,
/// wrap.
pub fn step_particle<R: Rng>(
    p: &mut Particle,
    pointer: Pointer,
    width: f64,
    height: f64,
    config: &FieldConfig,
    rng: &mut R,
) {
    if !pointer.is_far_away() {
        let dx = p.x - pointer.x;
        let dy = p.y - pointer.y;
        let dist = dx.hypot(dy);
        if dist < config.pointer_radius && dist > 0.0 {
            let force = (config.pointer_radius - dist) / config.pointer_radius;
            p.vx += (dx / dist) * force * config.repulsion_strength;
            p.vy += (dy / dist) * force * config.repulsion_strength;
        }
    }

    p.vx += (p.home_x - p.x) * config.homing_strength;
    p.vy += (p.home_y - p.y) * config.homing_strength;

    p.vx += (rng.gen::<f64>() - 0.5) * config.drift;
    p.vy += (rng.gen::<f64>() - 0.5) * config.drift;

    p.vx *= config.damping;
    p.vy *= config.damping;

    let speed = p.speed();
    if speed > config.max_speed {
        p.vx = (p.vx / speed) * config.max_speed;
        p.vy = (p.vy / speed) * config.max_speed;
    }

    p.x = wrap(p.x + p.vx, width);
    p.y = wrap(p.y + p.vy, height);
}

/// Bring `v` back into `[0, dim)`.
///
/// Bounded velocity means one shift is enough for any sane viewport; the
/// fallback only matters for viewports narrower than the max speed.
#[inline]
pub fn wrap(v: f64, dim: f64) -> f64 {
    if dim <= 0.0 {
        return 0.0;
    }
    let mut v = v;
    if v < 0.0 {
        v += dim;
    } else if v >= dim {
        v -= dim;
    }
    if !(0.0..dim).contains(&v) {
        v = v.rem_euclid(dim);
        // rem_euclid rounds tiny negatives up to exactly `dim`
        if v >= dim {
            v = 0.0;
        }
    }
    v
}
