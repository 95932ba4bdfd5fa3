//! Headless driver for the particle field
//!
//! Runs the simulation on a fixed-interval timer against a counting surface
//! and reports frame statistics. The pointer follows a scripted path so the
//! repulsion and pointer links are exercised.
//!
//! Run with: cargo run --features cli --bin field-cli
//!
//! Environment:
//! - FIELD_WIDTH / FIELD_HEIGHT: viewport size (default 1920x1080)
//! - FIELD_FPS: ticks per second (default 60)
//! - FIELD_FRAMES: stop after this many frames (default: run until Ctrl-C)
//! - FIELD_SCHEME: "dark" or "light"
//! - FIELD_CONFIG: path to a JSON config override
//! - FIELD_JSON: print stats as JSON lines on stdout

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use particle_field::core::{FieldConfig, IntervalStats, ParticleScene, Pointer, RecordingSurface};
    use particle_field::theme::ColorScheme;
    use particle_field::time::FpsCounter;
    use std::str::FromStr;
    use std::time::Duration;
    use tokio::time::MissedTickBehavior;
    use tracing::{info, warn};
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,particle_field=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    fn env_or<T: FromStr>(name: &str, default: T) -> T {
        match std::env::var(name) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(name, value = %raw, "Ignoring unparsable environment value");
                default
            }),
            Err(_) => default,
        }
    }

    /// Lissajous sweep for four seconds, then one second off-screen
    fn scripted_pointer(frame: u64, fps: f64, width: f64, height: f64) -> Pointer {
        let t = frame as f64 / fps;
        if t % 5.0 >= 4.0 {
            return Pointer::FAR_AWAY;
        }
        Pointer::new(
            width * (0.5 + 0.4 * (t * 0.7).sin()),
            height * (0.5 + 0.4 * (t * 1.1).cos()),
        )
    }

    let width: f64 = env_or("FIELD_WIDTH", 1920.0);
    let height: f64 = env_or("FIELD_HEIGHT", 1080.0);
    let fps: f64 = env_or("FIELD_FPS", 60.0_f64).clamp(1.0, 1000.0);
    let max_frames: Option<u64> = std::env::var("FIELD_FRAMES").ok().and_then(|v| v.parse().ok());
    let json_output = std::env::var("FIELD_JSON").is_ok();
    let scheme: ColorScheme = match std::env::var("FIELD_SCHEME") {
        Ok(raw) => serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))?,
        Err(_) => ColorScheme::Dark,
    };
    let config = match std::env::var("FIELD_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading field config");
            FieldConfig::from_json(&std::fs::read_to_string(&path)?)?
        }
        Err(_) => FieldConfig::default(),
    };
    config.validate()?;

    let mut scene = ParticleScene::new(config, width, height, scheme);
    let mut surface = RecordingSurface::counting();
    let mut fps_counter = FpsCounter::new();
    let mut interval_stats = IntervalStats::default();
    let mut total_frames = 0u64;
    let mut stop = false;

    let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));
    stats_interval.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(width, height, fps, max_frames = ?max_frames, "Simulation started");

    let report = |stats: IntervalStats| -> Result<(), serde_json::Error> {
        if json_output {
            println!("{}", serde_json::to_string(&stats)?);
        } else {
            info!(
                frames = stats.frames,
                particles = stats.particles,
                avg_edges = format!("{:.1}", stats.avg_edges),
                max_edges = stats.max_edges,
                avg_pointer_links = format!("{:.1}", stats.avg_pointer_links),
                fps = format!("{:.1}", stats.fps),
                "stats"
            );
        }
        Ok(())
    };

    while !stop {
        tokio::select! {
            _ = frame_interval.tick() => {
                let pointer = scripted_pointer(total_frames, fps, width, height);
                if pointer.is_far_away() {
                    scene.pointer_left();
                } else {
                    scene.pointer_moved(pointer.x, pointer.y);
                }
                let stats = scene.tick(&mut surface);
                fps_counter.tick();
                interval_stats.record(&stats);
                total_frames += 1;
                if max_frames.is_some_and(|max| total_frames >= max) {
                    stop = true;
                }
            }
            _ = stats_interval.tick() => {
                report(interval_stats.take(fps_counter.fps()))?;
            }
            _ = &mut ctrl_c => {
                warn!("Interrupted");
                stop = true;
            }
        }
    }

    if interval_stats.frames > 0 {
        report(interval_stats.take(fps_counter.fps()))?;
    }
    info!(frames = total_frames, "Simulation stopped");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
