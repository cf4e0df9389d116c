//! # Chunk Streamer
//!
//! Runs once per frame:
//!
//! 1. build at most one chunk from the load queue (seeded once, in a
//!    spiral from the grid center),
//! 2. find the viewer's chunk,
//! 3. activate every built chunk in `[v - r, v + r)` on both axes, clipped
//!    to the grid,
//! 4. deactivate every other active chunk.
//!
//! Activation always runs before deactivation. Built chunks are never freed.

use std::collections::{HashSet, VecDeque};
use std::ops::Range;

use terrastream_shared::Vec3;

use crate::builder::ChunkMeshBuilder;
use crate::chunk::ChunkCoord;
use crate::config::WorldConfig;
use crate::error::TerrainResult;
use crate::grid::ChunkGrid;
use crate::render::RenderBackend;

/// Every in-bounds chunk of a `chunks_per_side` grid, ordered in square
/// rings of growing distance around the center chunk.
#[must_use]
pub fn spiral_order(chunks_per_side: usize) -> Vec<ChunkCoord> {
    let Ok(side) = i32::try_from(chunks_per_side) else {
        return Vec::new();
    };
    let center = side / 2;
    let mut order = Vec::with_capacity(chunks_per_side * chunks_per_side);

    for dist in 0..=center.max(side - center) {
        for dr in -dist..=dist {
            for dc in -dist..=dist {
                if dr.abs() != dist && dc.abs() != dist {
                    continue;
                }
                let coord = ChunkCoord::new(center + dr, center + dc);
                if coord.in_bounds(chunks_per_side) {
                    order.push(coord);
                }
            }
        }
    }
    order
}

/// Running totals, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Ticks run.
    pub ticks: u64,
    /// Chunks built so far.
    pub chunks_built: usize,
    /// Chunks still waiting in the load queue.
    pub pending_loads: usize,
    /// Chunk activations performed.
    pub activations: usize,
    /// Chunk deactivations performed.
    pub deactivations: usize,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunk built this tick, if any.
    pub built: Option<ChunkCoord>,
    /// Chunk the viewer stands in.
    pub viewer_chunk: ChunkCoord,
    /// Chunks switched on.
    pub activated: usize,
    /// Chunks switched off.
    pub deactivated: usize,
}

impl TickReport {
    /// True when the tick changed nothing.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.built.is_none() && self.activated == 0 && self.deactivated == 0
    }
}

/// Load queue plus the per-frame activation diff.
#[derive(Clone, Debug)]
pub struct ChunkStreamer {
    load_queue: VecDeque<ChunkCoord>,
    loaded: Vec<ChunkCoord>,
    radius: i32,
    side: i32,
    chunk_world_size: f32,
    stats: StreamerStats,
}

impl ChunkStreamer {
    /// Creates a streamer with every chunk of the configured grid queued.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        let load_queue: VecDeque<_> = spiral_order(config.chunks_per_side).into();
        let stats = StreamerStats { pending_loads: load_queue.len(), ..StreamerStats::default() };
        Self {
            load_queue,
            loaded: Vec::new(),
            radius: config.chunk_radius,
            side: i32::try_from(config.chunks_per_side).unwrap_or(i32::MAX),
            chunk_world_size: config.chunk_world_size(),
            stats,
        }
    }

    /// Chunk containing world position `viewer`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn viewer_chunk(&self, viewer: Vec3) -> ChunkCoord {
        ChunkCoord::new(
            (viewer.x / self.chunk_world_size).floor() as i32,
            (viewer.z / self.chunk_world_size).floor() as i32,
        )
    }

    /// Built chunks inside the streaming window around `center`.
    ///
    /// The window is clipped to the grid first, so a far-away center or a
    /// huge radius never visits more than the grid's own chunks.
    #[must_use]
    pub fn desired_chunks(&self, center: ChunkCoord, grid: &ChunkGrid) -> HashSet<ChunkCoord> {
        let mut desired = HashSet::new();
        for row in self.window(center.row) {
            for col in self.window(center.col) {
                let coord = ChunkCoord::new(row, col);
                if grid.contains_chunk(coord) {
                    desired.insert(coord);
                }
            }
        }
        desired
    }

    fn window(&self, center: i32) -> Range<i32> {
        let start = center.saturating_sub(self.radius).max(0);
        let end = center.saturating_add(self.radius).min(self.side);
        start..end
    }

    /// Runs one frame of streaming.
    ///
    /// # Errors
    ///
    /// Propagates build failures. The failed chunk stays dequeued.
    pub fn tick(
        &mut self,
        viewer: Vec3,
        grid: &mut ChunkGrid,
        builder: &mut ChunkMeshBuilder,
        backend: &mut impl RenderBackend,
    ) -> TerrainResult<TickReport> {
        let mut report = TickReport::default();
        self.stats.ticks += 1;

        if let Some(coord) = self.load_queue.pop_front() {
            self.stats.pending_loads = self.load_queue.len();
            let chunk = builder.build(coord, backend)?;
            grid.set_chunk(coord, chunk);
            self.loaded.push(coord);
            self.stats.chunks_built += 1;
            report.built = Some(coord);
            if self.load_queue.is_empty() {
                tracing::info!(chunks = self.loaded.len(), "initial chunk load complete");
            }
        }

        report.viewer_chunk = self.viewer_chunk(viewer);
        let desired = if viewer.x.is_finite() && viewer.z.is_finite() {
            self.desired_chunks(report.viewer_chunk, grid)
        } else {
            tracing::warn!(x = viewer.x, z = viewer.z, "non-finite viewer position");
            HashSet::new()
        };

        for &coord in &desired {
            if grid.set_active(coord, true, backend)? {
                report.activated += 1;
            }
        }

        let stale: Vec<ChunkCoord> =
            grid.active_chunks().iter().filter(|c| !desired.contains(*c)).copied().collect();
        for coord in stale {
            if grid.set_active(coord, false, backend)? {
                report.deactivated += 1;
            }
        }

        self.stats.activations += report.activated;
        self.stats.deactivations += report.deactivated;
        Ok(report)
    }

    /// Whether chunks are still waiting to be built.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.load_queue.is_empty()
    }

    /// Chunks built so far, in build order.
    #[must_use]
    pub fn loaded(&self) -> &[ChunkCoord] {
        &self.loaded
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> StreamerStats {
        self.stats
    }
}
