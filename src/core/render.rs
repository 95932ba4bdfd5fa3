//! Frame painting against an abstract 2D surface
//!
//! Draw order: clear, particle-to-particle lines, particle-to-pointer lines,
//! particle dots.

use tracing::trace;

use super::field::ParticleField;
use super::grid::SpatialGrid;
use super::particle::Pointer;
use super::stats::FrameStats;
use crate::theme::{ColorScheme, Rgba};

/// The drawing primitives the renderer needs.
///
/// Coordinates are CSS pixels; implementations apply device pixel scaling.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn set_line_width(&mut self, width: f64);
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgba);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba);
}

/// Linear fade from `peak` at distance 0 down to 0 at `range`.
///
/// Never negative; 0 for any distance at or beyond `range`.
#[inline]
pub fn fade_alpha(dist: f64, range: f64, peak: f64) -> f64 {
    if dist.is_nan() || dist >= range || range <= 0.0 {
        return 0.0;
    }
    ((1.0 - dist / range) * peak).max(0.0)
}

/// Paint one frame. The grid must have been rebuilt from the field's
/// current positions.
pub fn draw_frame<S: Surface + ?Sized>(
    surface: &mut S,
    field: &ParticleField,
    grid: &SpatialGrid,
    pointer: Pointer,
    scheme: ColorScheme,
) -> FrameStats {
    let config = field.config();
    let particles = field.particles();
    let mut stats = FrameStats {
        particles: particles.len(),
        ..Default::default()
    };

    surface.clear(field.width(), field.height());

    surface.set_line_width(config.edge_width);
    let max_dist = config.connection_distance;
    grid.for_each_pair(particles, max_dist, |i, j, dist| {
        let alpha = fade_alpha(dist, max_dist, config.edge_alpha);
        let (a, b) = (&particles[i], &particles[j]);
        surface.stroke_line((a.x, a.y), (b.x, b.y), scheme.edge_color(alpha, config));
        stats.edges += 1;
    });

    surface.set_line_width(config.pointer_width);
    // The sentinel links to nothing, whatever the configured radius
    if !pointer.is_far_away() {
        for p in particles {
            let dist = p.distance_to(pointer.x, pointer.y);
            if dist < config.pointer_radius {
                let alpha = fade_alpha(dist, config.pointer_radius, config.pointer_alpha);
                surface.stroke_line(
                    (p.x, p.y),
                    (pointer.x, pointer.y),
                    scheme.pointer_color(alpha, config),
                );
                stats.pointer_links += 1;
            }
        }
    }

    if config.draw_particles {
        for p in particles {
            surface.fill_circle(p.x, p.y, p.radius, scheme.dot_color(p.opacity));
        }
    }

    trace!(
        particles = stats.particles,
        edges = stats.edges,
        pointer_links = stats.pointer_links,
        "Frame drawn"
    );
    stats
}

/// A drawn primitive, as captured by [`RecordingSurface`]
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    LineWidth(f64),
    Line { from: (f64, f64), to: (f64, f64), color: Rgba },
    Circle { x: f64, y: f64, radius: f64, color: Rgba },
}

/// Surface that keeps every command instead of painting.
///
/// Used by the headless CLI and by tests. With `keep_commands` off it only
/// counts, so long runs do not grow memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    pub lines: usize,
    pub circles: usize,
    keep_commands: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            keep_commands: true,
            ..Default::default()
        }
    }

    pub fn counting() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> impl Iterator<Item = (&(f64, f64), &(f64, f64), &Rgba)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line { from, to, color } => Some((from, to, color)),
            _ => None,
        })
    }

    fn record(&mut self, command: DrawCommand) {
        if self.keep_commands {
            self.commands.push(command);
        }
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.commands.clear();
        self.lines = 0;
        self.circles = 0;
        self.record(DrawCommand::Clear { width, height });
    }

    fn set_line_width(&mut self, width: f64) {
        self.record(DrawCommand::LineWidth(width));
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgba) {
        self.lines += 1;
        self.record(DrawCommand::Line { from, to, color });
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.circles += 1;
        self.record(DrawCommand::Circle { x, y, radius, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldConfig, Particle};

    fn field_with(points: &[(f64, f64)], width: f64, height: f64) -> ParticleField {
        // Overwrite the first particles of a random field with hand-placed ones
        let mut field = ParticleField::with_seed(FieldConfig::default(), width, height, 0);
        let slots = field.particles_mut();
        for (slot, &(x, y)) in slots.iter_mut().zip(points) {
            *slot = Particle::at_rest(x, y);
        }
        field
    }

    fn render(field: &ParticleField, pointer: Pointer, scheme: ColorScheme) -> (RecordingSurface, FrameStats) {
        let mut grid = SpatialGrid::new(field.config().connection_distance);
        grid.rebuild(field.particles(), field.width(), field.height());
        let mut surface = RecordingSurface::new();
        let stats = draw_frame(&mut surface, field, &grid, pointer, scheme);
        (surface, stats)
    }

    #[test]
    fn test_fade_alpha_edges() {
        assert_eq!(fade_alpha(0.0, 120.0, 0.2), 0.2);
        assert!((fade_alpha(60.0, 120.0, 0.2) - 0.1).abs() < 1e-12);
        assert_eq!(fade_alpha(120.0, 120.0, 0.2), 0.0);
        assert_eq!(fade_alpha(200.0, 200.0, 0.4), 0.0);
        assert_eq!(fade_alpha(500.0, 200.0, 0.4), 0.0);
        assert_eq!(fade_alpha(f64::NAN, 200.0, 0.4), 0.0);
    }

    #[test]
    fn test_fade_alpha_monotonic() {
        let mut prev = f64::INFINITY;
        for step in 0..=250 {
            let alpha = fade_alpha(step as f64, 200.0, 0.4);
            assert!(alpha >= 0.0);
            assert!(alpha <= prev);
            prev = alpha;
        }
    }

    #[test]
    fn test_sentinel_pointer_draws_no_pointer_lines() {
        let field = ParticleField::with_seed(FieldConfig::default(), 1200.0, 900.0, 4);
        let (surface, stats) = render(&field, Pointer::FAR_AWAY, ColorScheme::Dark);
        assert_eq!(stats.pointer_links, 0);
        assert!(surface.lines().all(|(_, to, _)| *to != (-9999.0, -9999.0)));
        assert_eq!(surface.lines, stats.edges);
    }

    #[test]
    fn test_sentinel_ignored_with_huge_pointer_radius() {
        let config = FieldConfig::from_json(r#"{"pointer_radius": 20000}"#).unwrap();
        let field = ParticleField::with_seed(config, 800.0, 600.0, 9);
        let (_, stats) = render(&field, Pointer::FAR_AWAY, ColorScheme::Dark);
        assert_eq!(stats.particles, 120);
        assert_eq!(stats.pointer_links, 0);

        let (_, stats) = render(&field, Pointer::new(400.0, 300.0), ColorScheme::Dark);
        assert_eq!(stats.pointer_links, 120);
    }

    #[test]
    fn test_coincident_particles_draw_one_line() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 800.0, 600.0, 2);
        for (k, p) in field.particles_mut().iter_mut().enumerate() {
            *p = if k < 2 {
                Particle::at_rest(5.0, 5.0)
            } else {
                // Everything else stays far from the corner
                let x = 400.0 + (k as f64 * 131.0) % 390.0;
                let y = 300.0 + (k as f64 * 977.0) % 290.0;
                Particle::at_rest(x, y)
            };
        }

        let (surface, _) = render(&field, Pointer::FAR_AWAY, ColorScheme::Dark);
        let between: Vec<_> = surface
            .lines()
            .filter(|(from, to, _)| **from == (5.0, 5.0) && **to == (5.0, 5.0))
            .collect();
        assert_eq!(between.len(), 1);
        assert!((between[0].2.a - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_edge_and_pointer_lines() {
        let field = field_with(&[(100.0, 100.0), (160.0, 100.0)], 800.0, 800.0);
        let pointer = Pointer::new(100.0, 150.0);
        let (surface, stats) = render(&field, pointer, ColorScheme::Dark);

        let edge = surface
            .lines()
            .find(|(from, to, _)| **from == (100.0, 100.0) && **to == (160.0, 100.0))
            .expect("edge between placed particles");
        assert!((edge.2.a - 0.1).abs() < 1e-12);
        assert_eq!((edge.2.r, edge.2.g, edge.2.b), (255, 255, 255));

        let link = surface
            .lines()
            .find(|(from, to, _)| **from == (100.0, 100.0) && **to == (100.0, 150.0))
            .expect("pointer link");
        // (1 - 50/200) * 0.4
        assert!((link.2.a - 0.3).abs() < 1e-12);
        assert_eq!((link.2.r, link.2.g, link.2.b), (100, 180, 255));

        assert_eq!(stats.edges + stats.pointer_links, surface.lines);
        assert_eq!(stats.particles, surface.circles);
    }

    #[test]
    fn test_light_mode_colors() {
        let field = field_with(&[(100.0, 100.0), (160.0, 100.0)], 800.0, 800.0);
        let (surface, _) = render(&field, Pointer::new(100.0, 150.0), ColorScheme::Light);

        let edge = surface
            .lines()
            .find(|(from, to, _)| **from == (100.0, 100.0) && **to == (160.0, 100.0))
            .unwrap();
        assert_eq!((edge.2.r, edge.2.g, edge.2.b), (0, 0, 0));
        assert!((edge.2.a - 0.05).abs() < 1e-12);

        let link = surface
            .lines()
            .find(|(_, to, _)| **to == (100.0, 150.0))
            .unwrap();
        assert_eq!((link.2.r, link.2.g, link.2.b), (50, 100, 200));
    }

    #[test]
    fn test_draw_order_and_dots_toggle() {
        let field = ParticleField::with_seed(FieldConfig::default(), 400.0, 300.0, 8);
        let (surface, _) = render(&field, Pointer::new(200.0, 150.0), ColorScheme::Dark);
        assert!(matches!(surface.commands[0], DrawCommand::Clear { width, height } if width == 400.0 && height == 300.0));
        assert_eq!(surface.commands[1], DrawCommand::LineWidth(0.5));
        let first_circle = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Circle { .. }))
            .unwrap();
        let last_line = surface
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Line { .. }))
            .unwrap();
        assert!(last_line < first_circle);

        let config = FieldConfig {
            draw_particles: false,
            ..FieldConfig::default()
        };
        let field = ParticleField::with_seed(config, 400.0, 300.0, 8);
        let (surface, _) = render(&field, Pointer::FAR_AWAY, ColorScheme::Dark);
        assert_eq!(surface.circles, 0);
    }

    #[test]
    fn test_counting_surface_keeps_no_commands() {
        let field = ParticleField::with_seed(FieldConfig::default(), 800.0, 600.0, 1);
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(field.particles(), 800.0, 600.0);
        let mut surface = RecordingSurface::counting();
        let stats = draw_frame(&mut surface, &field, &grid, Pointer::FAR_AWAY, ColorScheme::Dark);
        assert!(surface.commands.is_empty());
        assert_eq!(surface.lines, stats.edges);
        assert_eq!(surface.circles, 120);
    }
}
