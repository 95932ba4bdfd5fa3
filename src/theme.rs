//! Light and dark palettes for the particle network
//!
//! Dark mode draws white lines on black; light mode draws black lines on a
//! pale background at reduced alpha so the network stays in the background.

use serde::{Deserialize, Serialize};

use crate::core::FieldConfig;

/// Straight (non-premultiplied) RGBA color with a float alpha in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba()` string for canvas stroke/fill styles
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.4})", self.r, self.g, self.b, self.a)
    }
}

/// Line palette
pub mod colors {
    use super::Rgba;

    // === Dark mode ===
    pub const DARK_EDGE: Rgba = Rgba::rgb(255, 255, 255);
    pub const DARK_ACCENT: Rgba = Rgba::rgb(100, 180, 255);
    pub const DARK_DOT: Rgba = Rgba::rgb(255, 255, 255);

    // === Light mode ===
    pub const LIGHT_EDGE: Rgba = Rgba::rgb(0, 0, 0);
    pub const LIGHT_ACCENT: Rgba = Rgba::rgb(50, 100, 200);
    pub const LIGHT_DOT: Rgba = Rgba::rgb(17, 17, 17);
}

/// Host color-scheme preference
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

impl ColorScheme {
    pub fn from_prefers_dark(dark: bool) -> Self {
        if dark {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    /// Particle-to-particle line color for a base alpha
    pub fn edge_color(self, alpha: f64, config: &FieldConfig) -> Rgba {
        match self {
            ColorScheme::Dark => colors::DARK_EDGE.with_alpha(alpha),
            ColorScheme::Light => colors::LIGHT_EDGE.with_alpha(alpha * config.light_edge_scale),
        }
    }

    /// Particle-to-pointer line color for a base alpha
    pub fn pointer_color(self, alpha: f64, config: &FieldConfig) -> Rgba {
        match self {
            ColorScheme::Dark => colors::DARK_ACCENT.with_alpha(alpha),
            ColorScheme::Light => {
                colors::LIGHT_ACCENT.with_alpha(alpha * config.light_pointer_scale)
            }
        }
    }

    pub fn dot_color(self, opacity: f64) -> Rgba {
        match self {
            ColorScheme::Dark => colors::DARK_DOT.with_alpha(opacity),
            ColorScheme::Light => colors::LIGHT_DOT.with_alpha(opacity),
        }
    }
}
