//! # Streaming Integration Tests
//!
//! Drives a full 80x80 world through `TileWorld::tick` and checks load
//! throttling, activation idempotence and convergence of the active set.

use std::collections::HashSet;

use terrastream_shared::Vec3;
use terrastream_terrain::{
    CatalogManifest, ChunkCoord, ChunkGrid, HeadlessBackend, ProceduralPrototypes, RenderBackend,
    TileCatalog, TileGrid, TileId, TileWorld, WorldConfig,
};

fn catalog() -> TileCatalog {
    let manifest = CatalogManifest::default();
    TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::for_manifest(&manifest))
        .unwrap()
}

/// Stripes of every tile type so all code paths are hit.
#[allow(clippy::cast_possible_truncation)]
fn striped_tiles(size: usize) -> TileGrid {
    TileGrid::from_fn(size, |r, c| TileId(((r / 3 + c / 7) % 6) as u16))
}

fn world() -> TileWorld<HeadlessBackend> {
    TileWorld::initialize(
        WorldConfig::default(),
        catalog(),
        striped_tiles(80),
        HeadlessBackend::new(),
    )
    .unwrap()
}

fn window(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
    let mut out = HashSet::new();
    for row in center.row - radius..center.row + radius {
        for col in center.col - radius..center.col + radius {
            let coord = ChunkCoord::new(row, col);
            if coord.in_bounds(8) {
                out.insert(coord);
            }
        }
    }
    out
}

#[test]
fn test_one_chunk_per_tick() {
    let mut world = world();
    let viewer = Vec3::new(40.0, 0.0, 40.0);
    let mut built = HashSet::new();

    for tick in 1..=64 {
        let report = world.tick(viewer).unwrap();
        let coord = report.built.expect("a chunk is built every tick while loading");
        assert!(built.insert(coord), "chunk {coord} built twice");
        assert_eq!(world.grid().chunk_count(), tick);
    }
    assert!(!world.is_loading());

    let report = world.tick(viewer).unwrap();
    assert_eq!(report.built, None);
    assert_eq!(world.grid().chunk_count(), 64);
    assert_eq!(world.stats().chunks_built, 64);
    assert_eq!(world.stats().pending_loads, 0);
}

#[test]
fn test_first_chunk_is_the_center() {
    let mut world = world();
    let report = world.tick(Vec3::ZERO).unwrap();
    assert_eq!(report.built, Some(ChunkCoord::new(4, 4)));
}

#[test]
fn test_active_set_converges_and_stays_stable() {
    let mut world = world();
    while world.is_loading() {
        world.tick(Vec3::new(5.0, 0.0, 5.0)).unwrap();
    }

    // Viewer in chunk (3, 4)
    let viewer = Vec3::new(35.0, 0.0, 45.0);
    let report = world.tick(viewer).unwrap();
    assert_eq!(report.viewer_chunk, ChunkCoord::new(3, 4));

    let expected = window(ChunkCoord::new(3, 4), 2);
    assert_eq!(expected.len(), 16);
    assert_eq!(world.grid().active_chunks(), &expected);
    for chunk in world.grid().chunks() {
        assert_eq!(chunk.is_active(), expected.contains(&chunk.coord));
        assert_eq!(world.backend().is_visible(chunk.terrain), chunk.is_active());
        assert_eq!(world.backend().is_visible(chunk.overlay), chunk.is_active());
    }

    let changes = world.backend().visibility_changes();
    for _ in 0..5 {
        let report = world.tick(viewer).unwrap();
        assert!(report.is_idle());
    }
    assert_eq!(world.backend().visibility_changes(), changes);
}

#[test]
fn test_window_at_grid_corner_is_clipped() {
    let mut world = world();
    while world.is_loading() {
        world.tick(Vec3::ZERO).unwrap();
    }
    let expected = window(ChunkCoord::new(0, 0), 2);
    assert_eq!(expected.len(), 4);
    assert_eq!(world.grid().active_chunks(), &expected);

    // Viewer outside the world: nothing is desired
    world.tick(Vec3::new(-500.0, 0.0, -500.0)).unwrap();
    assert!(world.grid().active_chunks().is_empty());
    assert_eq!(world.backend().visible_count(), 0);
}

#[test]
fn test_far_viewer_deactivates_everything() {
    let mut world = world();
    while world.is_loading() {
        world.tick(Vec3::new(40.0, 0.0, 40.0)).unwrap();
    }
    assert_eq!(world.grid().active_chunks().len(), 16);

    for viewer in [
        Vec3::new(1.0e12, 0.0, 0.0),
        Vec3::new(-1.0e12, 0.0, 1.0e12),
        Vec3::new(f32::INFINITY, 0.0, 40.0),
        Vec3::new(40.0, 0.0, f32::NEG_INFINITY),
        Vec3::new(f32::NAN, 0.0, f32::NAN),
    ] {
        world.tick(viewer).unwrap();
        assert!(world.grid().active_chunks().is_empty(), "{viewer:?}");
        assert_eq!(world.backend().visible_count(), 0);

        // Back near the grid, the window is restored
        world.tick(Vec3::new(40.0, 0.0, 40.0)).unwrap();
        assert_eq!(world.grid().active_chunks(), &window(ChunkCoord::new(4, 4), 2));
    }
}

#[test]
fn test_huge_radius_activates_whole_grid() {
    let config = WorldConfig { chunk_radius: i32::MAX, ..WorldConfig::default() };
    let mut world =
        TileWorld::initialize(config, catalog(), striped_tiles(80), HeadlessBackend::new())
            .unwrap();
    while world.is_loading() {
        world.tick(Vec3::new(40.0, 0.0, 40.0)).unwrap();
    }
    assert_eq!(world.grid().active_chunks().len(), 64);

    // Still covers the grid from far away
    let report = world.tick(Vec3::new(1.0e9, 0.0, 1.0e9)).unwrap();
    assert!(report.is_idle());
    assert_eq!(world.grid().active_chunks().len(), 64);

    let report = world.tick(Vec3::new(f32::NAN, 0.0, 0.0)).unwrap();
    assert_eq!(report.deactivated, 64);
    assert!(world.grid().active_chunks().is_empty());
}

#[test]
fn test_moving_viewer_swaps_chunks() {
    let mut world = world();
    while world.is_loading() {
        world.tick(Vec3::new(15.0, 0.0, 15.0)).unwrap();
    }
    let before = world.grid().active_chunks().clone();

    let report = world.tick(Vec3::new(25.0, 0.0, 15.0)).unwrap();
    let after = world.grid().active_chunks().clone();

    assert_eq!(report.activated, after.difference(&before).count());
    assert_eq!(report.deactivated, before.difference(&after).count());
    assert_eq!(after, window(ChunkCoord::new(2, 1), 2));
}

#[test]
fn test_set_active_is_idempotent() {
    let mut world = world();
    world.tick(Vec3::new(-100.0, 0.0, -100.0)).unwrap();
    let coord = ChunkCoord::new(4, 4);

    // Re-run activation on a private grid copy to observe side effects
    let mut grid: ChunkGrid = world.grid().clone();
    let backend = world.backend_mut();

    assert!(grid.set_active(coord, true, backend).unwrap());
    let changes = backend.visibility_changes();
    let visible = backend.visible_count();

    assert!(!grid.set_active(coord, true, backend).unwrap());
    assert_eq!(backend.visibility_changes(), changes);
    assert_eq!(backend.visible_count(), visible);

    assert!(grid.set_active(coord, false, backend).unwrap());
    assert!(!grid.set_active(coord, false, backend).unwrap());
    assert_eq!(backend.visible_count(), 0);
}

#[test]
fn test_forest_decorations_follow_chunk_visibility() {
    let tiles = TileGrid::filled(80, TileId(4));
    let mut world =
        TileWorld::initialize(WorldConfig::default(), catalog(), tiles, HeadlessBackend::new())
            .unwrap();
    let report = world.tick(Vec3::new(45.0, 0.0, 45.0)).unwrap();
    let coord = report.built.unwrap();

    let chunk = world.grid().get_chunk(coord).unwrap();
    assert_eq!(chunk.decorations.len(), 100);
    assert!(chunk.is_active());
    let all_visible = chunk.decorations.values().all(|d| world.backend().is_visible(d.handle));
    assert!(all_visible);

    world.tick(Vec3::new(-100.0, 0.0, -100.0)).unwrap();
    assert_eq!(world.backend().visible_count(), 0);
}

#[test]
fn test_custom_backend_sees_every_object() {
    #[derive(Default)]
    struct Counting {
        next: u32,
        shown: HashSet<u32>,
    }

    impl RenderBackend for Counting {
        fn create_batch(
            &mut self,
            _mesh: std::sync::Arc<terrastream_terrain::Mesh>,
            _pass: terrastream_terrain::RenderPass,
            _origin: Vec3,
        ) -> terrastream_terrain::RenderHandle {
            self.next += 1;
            terrastream_terrain::RenderHandle(self.next)
        }

        fn create_decoration(
            &mut self,
            _prototype: &std::sync::Arc<terrastream_terrain::Mesh>,
            _transform: &terrastream_shared::Transform,
        ) -> terrastream_terrain::RenderHandle {
            self.next += 1;
            terrastream_terrain::RenderHandle(self.next)
        }

        fn set_visible(&mut self, handle: terrastream_terrain::RenderHandle, visible: bool) {
            if visible {
                self.shown.insert(handle.0);
            } else {
                self.shown.remove(&handle.0);
            }
        }
    }

    let mut world = TileWorld::initialize(
        WorldConfig::default(),
        catalog(),
        TileGrid::filled(80, TileId(2)),
        Counting::default(),
    )
    .unwrap();
    world.tick(Vec3::new(45.0, 0.0, 45.0)).unwrap();
    // Terrain and overlay batches of the one built chunk
    assert_eq!(world.backend().next, 2);
    assert_eq!(world.backend().shown.len(), 2);
}
