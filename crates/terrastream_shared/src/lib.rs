//! # Terrastream Shared
//!
//! Common types used by the terrain core and by whatever host drives it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a renderer, window or asset crate.
//! If you need a visible object, go through `terrastream_terrain::render`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{CHUNKS_PER_SIDE, CHUNK_RADIUS, CHUNK_SIZE, MAP_SIZE, TILE_SIZE};
pub use math::{Quaternion, Transform, Vec3};
