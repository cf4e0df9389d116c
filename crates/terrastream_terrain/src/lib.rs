//! # Terrastream Terrain
//!
//! Chunked tile-world streaming with neighbor-aware autotiling.
//!
//! ## Design Principles
//!
//! 1. **Built once**: the autotile table and tile catalog are assembled at
//!    startup; chunk geometry is built at most once per session
//! 2. **Chunked**: the square tile grid is split into fixed-size chunks
//! 3. **Streamable**: chunks are shown/hidden around the viewer, never freed
//! 4. **Throttled**: at most one chunk is built per frame
//!
//! ## Core Components
//!
//! - `AutotileTable`: 8-neighbor bitmask -> (mesh variant, rotation, flip)
//! - `TileCatalog`: tile-type ids and variant names -> mesh prototypes
//! - `ChunkGrid`: chunk storage, decoration lookup, activation state
//! - `ChunkStreamer`: spiral load queue and per-frame activation diff
//! - `ChunkMeshBuilder`: resolves variants and batches a chunk's geometry
//! - `TileWorld`: owns all of the above plus the injected `RenderBackend`
//!
//! ## Example
//!
//! ```rust,ignore
//! use terrastream_terrain::{
//!     CatalogManifest, HeadlessBackend, ProceduralPrototypes, TileCatalog, TileWorld, WorldConfig,
//! };
//!
//! let manifest = CatalogManifest::default();
//! let mut prototypes = ProceduralPrototypes::for_manifest(&manifest);
//! let catalog = TileCatalog::from_manifest(&manifest, &mut prototypes)?;
//! let mut world =
//!     TileWorld::initialize(WorldConfig::default(), catalog, tiles, HeadlessBackend::new())?;
//!
//! // Once per frame
//! world.tick(camera_position)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod autotile;
pub mod builder;
pub mod catalog;
pub mod chunk;
pub mod config;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod overlay;
pub mod render;
pub mod streamer;
pub mod tile;
pub mod world;

pub use autotile::{AutotileTable, NeighborBitmask, Rotation, Template, TileVariant, TEMPLATES};
pub use builder::ChunkMeshBuilder;
pub use catalog::{
    CatalogManifest, ProceduralPrototypes, PrototypeSource, TileCatalog, TileType, TileTypeDef,
};
pub use chunk::{Chunk, ChunkCoord, Decoration, TileCoord};
pub use config::WorldConfig;
pub use error::{TerrainError, TerrainResult};
pub use grid::ChunkGrid;
pub use mesh::{Mesh, Vertex};
pub use overlay::OverlayField;
pub use render::{HeadlessBackend, RenderBackend, RenderHandle, RenderPass};
pub use streamer::{spiral_order, ChunkStreamer, StreamerStats, TickReport};
pub use tile::{TileGrid, TileId};
pub use world::TileWorld;
