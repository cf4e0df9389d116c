//! # Terrastream Headless Client
//!
//! Runs the full terrain pipeline without a GPU: loads config, catalog and
//! snapshot, then drives the world through a simulated frame loop with the
//! in-memory render backend.
//!
//! ```bash
//! # Synthetic 80x80 world, default settings
//! headless_client
//!
//! # Everything from files
//! headless_client --config world.toml --manifest tiles.toml \
//!     --snapshot connect.json --frames 1200
//!
//! # See every chunk build
//! RUST_LOG=terrastream_terrain=debug headless_client
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use terrastream::terrain::{
    CatalogManifest, HeadlessBackend, ProceduralPrototypes, TileCatalog, TileWorld, WorldConfig,
};
use terrastream::{
    logging, synthetic_tiles, ClientError, ClientResult, FrameLoop, FrameLoopConfig, WorldSnapshot,
};

const USAGE: &str =
    "headless_client [--config PATH] [--manifest PATH] [--snapshot PATH] [--frames N] [--seed N]";

/// Command-line options.
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    manifest: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    frames: Option<u64>,
    seed: Option<u64>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> ClientResult<Self> {
        let mut options = Self::default();
        while let Some(flag) = args.next() {
            let mut value = || args.next().ok_or_else(|| ClientError::Usage(USAGE.to_string()));
            match flag.as_str() {
                "--config" => options.config = Some(value()?.into()),
                "--manifest" => options.manifest = Some(value()?.into()),
                "--snapshot" => options.snapshot = Some(value()?.into()),
                "--frames" => options.frames = Some(parse_number(&value()?)?),
                "--seed" => options.seed = Some(parse_number(&value()?)?),
                _ => return Err(ClientError::Usage(USAGE.to_string())),
            }
        }
        Ok(options)
    }
}

fn parse_number(text: &str) -> ClientResult<u64> {
    text.parse().map_err(|_| ClientError::Usage(format!("{text} is not a number; {USAGE}")))
}

fn run(options: Options) -> ClientResult<()> {
    let config = match &options.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let manifest = match &options.manifest {
        Some(path) => CatalogManifest::load(path)?,
        None => CatalogManifest::default(),
    };
    let seed = options.seed.unwrap_or(config.decoration_seed);
    let tiles = match &options.snapshot {
        Some(path) => WorldSnapshot::load(path)?.into_grid(config.map_size)?,
        None => synthetic_tiles(config.map_size, seed),
    };

    let mut prototypes = ProceduralPrototypes::for_manifest(&manifest);
    let catalog = TileCatalog::from_manifest(&manifest, &mut prototypes)?;
    let world = TileWorld::initialize(config, catalog, tiles, HeadlessBackend::new())?;

    let mut loop_config = FrameLoopConfig { seed, ..FrameLoopConfig::default() };
    if let Some(frames) = options.frames {
        loop_config.frames = frames;
    }
    let mut frame_loop = FrameLoop::new(world, loop_config);
    let summary = frame_loop.run()?;

    let backend = frame_loop.world().backend();
    tracing::info!(
        frames = summary.frames,
        slow_frames = summary.slow_frames,
        max_frame_us = summary.max_frame_us,
        chunks_built = summary.streaming.chunks_built,
        activations = summary.streaming.activations,
        deactivations = summary.streaming.deactivations,
        objects = backend.object_count(),
        visible = backend.visible_count(),
        uploaded_bytes = backend.uploaded_bytes(),
        "session finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = logging::init_logging() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = Options::parse(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "headless client failed");
            ExitCode::FAILURE
        }
    }
}
