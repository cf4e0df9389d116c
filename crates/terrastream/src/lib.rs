//! # Terrastream
//!
//! Host-side glue around `terrastream_terrain`:
//!
//! - [`snapshot`]: decodes the connect-time world snapshot into a tile grid
//! - [`frame_loop`]: drives a `TileWorld` frame by frame with a moving viewer
//! - [`logging`]: `tracing` subscriber setup for binaries
//!
//! The `headless_client` binary wires all three together.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod frame_loop;
pub mod logging;
pub mod snapshot;

pub use error::{ClientError, ClientResult};
pub use frame_loop::{FrameLoop, FrameLoopConfig, FrameStats, FrameSummary, ViewerPath};
pub use snapshot::{synthetic_tiles, WorldSnapshot};

/// Re-export of the terrain core.
pub use terrastream_terrain as terrain;
