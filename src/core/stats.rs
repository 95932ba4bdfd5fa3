//! Per-frame counters and their rolling aggregate

use serde::Serialize;

/// What one frame drew
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub particles: usize,
    /// Particle-to-particle lines
    pub edges: usize,
    /// Particle-to-pointer lines
    pub pointer_links: usize,
}

/// Aggregate over a reporting interval (CLI stats lines, browser debug logs)
#[derive(Clone, Debug, Default, Serialize)]
pub struct IntervalStats {
    pub frames: u64,
    pub particles: usize,
    pub avg_edges: f64,
    pub max_edges: usize,
    pub avg_pointer_links: f64,
    pub fps: f64,
    #[serde(skip)]
    edge_sum: u64,
    #[serde(skip)]
    link_sum: u64,
}

impl IntervalStats {
    pub fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.particles = frame.particles;
        self.edge_sum += frame.edges as u64;
        self.link_sum += frame.pointer_links as u64;
        self.max_edges = self.max_edges.max(frame.edges);
        self.avg_edges = self.edge_sum as f64 / self.frames as f64;
        self.avg_pointer_links = self.link_sum as f64 / self.frames as f64;
    }

    /// Return the finished interval and start a new one
    pub fn take(&mut self, fps: f64) -> IntervalStats {
        let mut done = std::mem::take(self);
        done.fps = fps;
        done
    }
}
