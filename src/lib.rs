//! Particle Field - animated particle network background
//!
//! A field of drifting particles joined by faint lines when close, pushed
//! away from the pointer and linked to it. The simulation and painting live
//! in [`core`] and draw through the [`core::Surface`] trait:
//! - `wasm` feature: mounts on an HTML canvas (see `mount`)
//! - `cli` feature: headless `field-cli` driver for profiling

pub mod core;
pub mod theme;
pub mod time;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use web::{mount, unmount, FieldHandle};
