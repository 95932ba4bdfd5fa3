//! One running particle network: field, grid, pointer and color scheme
//!
//! Input handlers write into the scene; the frame loop calls [`tick`] once
//! per frame. Both run on the same thread.
//!
//! [`tick`]: ParticleScene::tick

use tracing::{debug, info};

use super::config::FieldConfig;
use super::field::ParticleField;
use super::grid::SpatialGrid;
use super::particle::Pointer;
use super::render::{draw_frame, Surface};
use super::stats::FrameStats;
use crate::theme::ColorScheme;

pub struct ParticleScene {
    field: ParticleField,
    grid: SpatialGrid,
    pointer: Pointer,
    scheme: ColorScheme,
    frame: u64,
}

impl ParticleScene {
    pub fn new(config: FieldConfig, width: f64, height: f64, scheme: ColorScheme) -> Self {
        let grid = SpatialGrid::new(config.connection_distance);
        Self::from_field(ParticleField::new(config, width, height), grid, scheme)
    }

    pub fn with_seed(
        config: FieldConfig,
        width: f64,
        height: f64,
        scheme: ColorScheme,
        seed: u64,
    ) -> Self {
        let grid = SpatialGrid::new(config.connection_distance);
        Self::from_field(ParticleField::with_seed(config, width, height, seed), grid, scheme)
    }

    fn from_field(field: ParticleField, grid: SpatialGrid, scheme: ColorScheme) -> Self {
        info!(
            width = field.width(),
            height = field.height(),
            particles = field.len(),
            ?scheme,
            "Particle scene created"
        );
        Self {
            field,
            grid,
            pointer: Pointer::FAR_AWAY,
            scheme,
            frame: 0,
        }
    }

    /// Step the physics, re-bucket, and paint one frame.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S) -> FrameStats {
        self.field.step(self.pointer);
        self.grid
            .rebuild(self.field.particles(), self.field.width(), self.field.height());
        self.frame += 1;
        draw_frame(surface, &self.field, &self.grid, self.pointer, self.scheme)
    }

    /// Throw away every particle and regenerate for the new size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.field.resize(width, height);
        info!(width, height, particles = self.field.len(), "Viewport resized");
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.pointer = Pointer::new(x, y);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.leave();
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        if scheme != self.scheme {
            debug!(?scheme, "Color scheme changed");
            self.scheme = scheme;
        }
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::RecordingSurface;

    #[test]
    fn test_tick_advances_and_draws() {
        let mut scene =
            ParticleScene::with_seed(FieldConfig::default(), 800.0, 600.0, ColorScheme::Dark, 1);
        let before: Vec<(f64, f64)> = scene.field().particles().iter().map(|p| (p.x, p.y)).collect();

        let mut surface = RecordingSurface::new();
        let stats = scene.tick(&mut surface);

        assert_eq!(scene.frame(), 1);
        assert_eq!(stats.particles, 120);
        assert_eq!(stats.pointer_links, 0);
        assert_eq!(surface.circles, 120);
        let after: Vec<(f64, f64)> = scene.field().particles().iter().map(|p| (p.x, p.y)).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn test_pointer_enter_and_leave() {
        let mut scene =
            ParticleScene::with_seed(FieldConfig::default(), 800.0, 600.0, ColorScheme::Dark, 2);
        let mut surface = RecordingSurface::counting();

        scene.pointer_moved(400.0, 300.0);
        let stats = scene.tick(&mut surface);
        assert!(stats.pointer_links > 0);

        scene.pointer_left();
        assert!(scene.pointer().is_far_away());
        let stats = scene.tick(&mut surface);
        assert_eq!(stats.pointer_links, 0);
    }

    #[test]
    fn test_resize_quadruples() {
        let mut scene =
            ParticleScene::with_seed(FieldConfig::default(), 800.0, 600.0, ColorScheme::Light, 3);
        assert_eq!(scene.field().len(), 120);
        scene.resize(1600.0, 1200.0);
        assert_eq!(scene.field().len(), 480);

        let mut surface = RecordingSurface::counting();
        let stats = scene.tick(&mut surface);
        assert_eq!(stats.particles, 480);
        for p in scene.field().particles() {
            assert!(p.x >= 0.0 && p.x < 1600.0 && p.y >= 0.0 && p.y < 1200.0);
        }
    }

    #[test]
    fn test_scheme_switch_changes_palette() {
        let mut scene =
            ParticleScene::with_seed(FieldConfig::default(), 400.0, 400.0, ColorScheme::Dark, 4);
        scene.set_color_scheme(ColorScheme::Light);
        assert_eq!(scene.color_scheme(), ColorScheme::Light);

        let mut surface = RecordingSurface::new();
        scene.tick(&mut surface);
        assert!(surface.lines().all(|(_, _, c)| (c.r, c.g, c.b) == (0, 0, 0)));
    }
}
