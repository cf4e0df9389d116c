//! # Frame Loop
//!
//! Stands in for the engine's per-frame callback: each frame moves the
//! viewer along a [`ViewerPath`], ticks the world, and now and then feeds
//! it a resource update the way the server's per-tick snapshots would.
//!
//! ```text
//! Frame N:
//!   1. viewer = path.position(N)
//!   2. world.tick(viewer)             (build <= 1 chunk, diff activation)
//!   3. every `resource_interval`:     (regrow/deplete decorations)
//!        world.apply_resource_update(..)
//!   4. record timing, warn on slow frames
//! ```

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terrastream_shared::Vec3;
use terrastream_terrain::{
    ChunkCoord, RenderBackend, StreamerStats, TileGrid, TileId, TileWorld,
};

use crate::error::ClientResult;

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Frame time above which a warning is logged.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Where the viewer is on a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewerPath {
    /// Never moves.
    Fixed(Vec3),
    /// Circles `center` once every `frames_per_turn` frames.
    Orbit {
        /// Circle center.
        center: Vec3,
        /// Circle radius in world units.
        radius: f32,
        /// Frames per full turn.
        frames_per_turn: u64,
    },
}

impl ViewerPath {
    /// Viewer position on `frame`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, frame: u64) -> Vec3 {
        match *self {
            Self::Fixed(p) => p,
            Self::Orbit { center, radius, frames_per_turn } => {
                let turns = (frame % frames_per_turn.max(1)) as f32 / frames_per_turn.max(1) as f32;
                let angle = turns * std::f32::consts::TAU;
                center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
            }
        }
    }
}

/// Frame loop settings.
#[derive(Clone, Debug)]
pub struct FrameLoopConfig {
    /// Frames to run.
    pub frames: u64,
    /// Viewer movement.
    pub path: ViewerPath,
    /// Send a resource update every this many frames.
    pub resource_interval: Option<u64>,
    /// Seed for resource updates.
    pub seed: u64,
    /// Log a progress line every this many frames (0 = never).
    pub log_every: u64,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            path: ViewerPath::Orbit {
                center: Vec3::new(40.0, 0.0, 40.0),
                radius: 25.0,
                frames_per_turn: 240,
            },
            resource_interval: Some(120),
            seed: 0,
            log_every: 60,
        }
    }
}

/// One frame's outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Chunk built this frame.
    pub built: Option<ChunkCoord>,
    /// Chunks switched on.
    pub activated: usize,
    /// Chunks switched off.
    pub deactivated: usize,
    /// Decorations changed by a resource update.
    pub decorations_changed: usize,
    /// Wall time spent in the frame, in microseconds.
    pub elapsed_us: u64,
}

/// Totals after [`FrameLoop::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frames run.
    pub frames: u64,
    /// Frames slower than [`MAX_FRAME_TIME`].
    pub slow_frames: u64,
    /// Slowest frame, in microseconds.
    pub max_frame_us: u64,
    /// Streaming totals at the end.
    pub streaming: StreamerStats,
}

/// Drives a [`TileWorld`] frame by frame.
pub struct FrameLoop<B: RenderBackend> {
    world: TileWorld<B>,
    config: FrameLoopConfig,
    rng: ChaCha8Rng,
    frame: u64,
    summary: FrameSummary,
}

impl<B: RenderBackend> FrameLoop<B> {
    /// Wraps an initialized world.
    #[must_use]
    pub fn new(world: TileWorld<B>, config: FrameLoopConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { world, config, rng, frame: 0, summary: FrameSummary::default() }
    }

    /// Runs a single frame.
    ///
    /// # Errors
    ///
    /// Propagates terrain failures.
    pub fn step(&mut self) -> ClientResult<FrameStats> {
        let start = Instant::now();
        let viewer = self.config.path.position(self.frame);
        let report = self.world.tick(viewer)?;

        let mut decorations_changed = 0;
        if let Some(interval) = self.config.resource_interval.filter(|&i| i > 0) {
            if self.frame > 0 && self.frame % interval == 0 {
                let update = self.resource_update();
                decorations_changed = self.world.apply_resource_update(update)?;
            }
        }

        let elapsed = start.elapsed();
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let stats = FrameStats {
            frame: self.frame,
            built: report.built,
            activated: report.activated,
            deactivated: report.deactivated,
            decorations_changed,
            elapsed_us,
        };

        if elapsed > MAX_FRAME_TIME {
            self.summary.slow_frames += 1;
            tracing::warn!(
                frame = self.frame,
                elapsed_us,
                budget_ms = TARGET_FRAME_TIME.as_secs_f64() * 1000.0,
                "frame exceeded budget"
            );
        }
        self.summary.max_frame_us = self.summary.max_frame_us.max(elapsed_us);
        if self.config.log_every > 0 && self.frame % self.config.log_every == 0 {
            let streaming = self.world.stats();
            tracing::info!(
                frame = self.frame,
                built = streaming.chunks_built,
                pending = streaming.pending_loads,
                active = self.world.grid().active_chunks().len(),
                "frame"
            );
        }

        self.frame += 1;
        self.summary.frames = self.frame;
        Ok(stats)
    }

    /// Runs the configured number of frames.
    ///
    /// # Errors
    ///
    /// Stops at the first failing frame.
    pub fn run(&mut self) -> ClientResult<FrameSummary> {
        while self.frame < self.config.frames {
            self.step()?;
        }
        self.summary.streaming = self.world.stats();
        Ok(self.summary)
    }

    /// Every decorated tile of the base grid becomes a random decorated
    /// type, so foliage is depleted and regrows across updates.
    fn resource_update(&mut self) -> TileGrid {
        let catalog = self.world.builder().catalog();
        let tiles = self.world.builder().tiles();
        let mut decorated: Vec<TileId> = tiles
            .iter()
            .map(|(_, _, id)| id)
            .filter(|&id| catalog.tile_type(id).is_ok_and(|ty| ty.decoration.is_some()))
            .collect();
        decorated.sort_unstable();
        decorated.dedup();

        let rng = &mut self.rng;
        TileGrid::from_fn(tiles.size(), |row, col| match tiles.get(row, col) {
            Some(id) if decorated.contains(&id) => decorated[rng.gen_range(0..decorated.len())],
            Some(id) => id,
            None => TileId::default(),
        })
    }

    /// The driven world.
    #[must_use]
    pub const fn world(&self) -> &TileWorld<B> {
        &self.world
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrastream_terrain::{
        CatalogManifest, HeadlessBackend, ProceduralPrototypes, TileCatalog, WorldConfig,
    };

    use crate::snapshot::synthetic_tiles;

    fn world() -> TileWorld<HeadlessBackend> {
        let manifest = CatalogManifest::default();
        let catalog =
            TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::for_manifest(&manifest))
                .unwrap();
        TileWorld::initialize(
            WorldConfig::default(),
            catalog,
            synthetic_tiles(80, 5),
            HeadlessBackend::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_orbit_path() {
        let path = ViewerPath::Orbit { center: Vec3::new(40.0, 0.0, 40.0), radius: 10.0, frames_per_turn: 4 };
        let p0 = path.position(0);
        assert!((p0.x - 50.0).abs() < 1e-4 && (p0.z - 40.0).abs() < 1e-4);
        let p1 = path.position(1);
        assert!((p1.x - 40.0).abs() < 1e-4 && (p1.z - 50.0).abs() < 1e-4);
        assert_eq!(path.position(4), p0);
        assert_eq!(ViewerPath::Fixed(Vec3::ONE).position(99), Vec3::ONE);
    }

    #[test]
    fn test_run_loads_whole_world() {
        let config = FrameLoopConfig { frames: 100, log_every: 0, ..FrameLoopConfig::default() };
        let mut frame_loop = FrameLoop::new(world(), config);
        let summary = frame_loop.run().unwrap();

        assert_eq!(summary.frames, 100);
        assert_eq!(summary.streaming.chunks_built, 64);
        assert!(!frame_loop.world().is_loading());
        assert!(!frame_loop.world().grid().active_chunks().is_empty());
    }

    #[test]
    fn test_resource_update_keeps_terrain_ids() {
        let mut frame_loop = FrameLoop::new(world(), FrameLoopConfig::default());
        let update = frame_loop.resource_update();
        let base = frame_loop.world().builder().tiles();
        for ((_, _, old), (_, _, new)) in base.iter().zip(update.iter()) {
            let decorated = |id: TileId| id == TileId(3) || id == TileId(4);
            if decorated(old) {
                assert!(decorated(new));
            } else {
                assert_eq!(old, new);
            }
        }
    }
}
