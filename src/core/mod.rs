//! Platform-agnostic core - shared between the browser renderer and the CLI

pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod particle;
pub mod render;
pub mod scene;
pub mod stats;

pub use config::{FieldConfig, POINTER_FAR_AWAY};
pub use error::FieldError;
pub use field::ParticleField;
pub use grid::SpatialGrid;
pub use particle::{Particle, Pointer};
pub use render::{draw_frame, fade_alpha, DrawCommand, RecordingSurface, Surface};
pub use scene::ParticleScene;
pub use stats::{FrameStats, IntervalStats};
