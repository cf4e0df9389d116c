//! # Render Interface
//!
//! The terrain core never talks to a graphics API. It hands meshes to a
//! [`RenderBackend`] and gets opaque [`RenderHandle`]s back; showing and
//! hiding chunks is then just `set_visible` on those handles.
//!
//! [`HeadlessBackend`] keeps everything in memory and counts what happened,
//! for the demo binary and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use terrastream_shared::{Transform, Vec3};

use crate::mesh::Mesh;
use crate::overlay::OverlayField;

/// Opaque reference to a visible object owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(pub u32);

/// Which material pass a batch is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Base terrain material.
    Terrain,
    /// Overlay/decal material sampling the per-tile overlay field.
    Overlay,
}

/// Host-side scene layer.
///
/// Every object starts hidden; the streamer decides visibility.
pub trait RenderBackend {
    /// Registers a combined chunk batch placed at `origin` in world space.
    fn create_batch(&mut self, mesh: Arc<Mesh>, pass: RenderPass, origin: Vec3) -> RenderHandle;

    /// Registers one decoration instance of `prototype` at `transform`.
    fn create_decoration(&mut self, prototype: &Arc<Mesh>, transform: &Transform) -> RenderHandle;

    /// Shows or hides an object.
    fn set_visible(&mut self, handle: RenderHandle, visible: bool);

    /// Replaces the overlay field sampled by the overlay pass; `None` clears it.
    fn set_overlay(&mut self, _overlay: Option<&OverlayField>) {}
}

/// A batch or decoration as the headless backend stores it.
#[derive(Clone, Debug)]
pub struct HeadlessObject {
    /// Pass, or `None` for decorations.
    pub pass: Option<RenderPass>,
    /// World transform.
    pub transform: Transform,
    /// Geometry.
    pub mesh: Arc<Mesh>,
    /// Current visibility.
    pub visible: bool,
}

/// In-memory backend with upload and visibility bookkeeping.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    objects: HashMap<RenderHandle, HeadlessObject>,
    next_handle: u32,
    uploaded_bytes: usize,
    visibility_changes: usize,
    overlay: Option<OverlayField>,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, object: HeadlessObject) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(handle, object);
        handle
    }

    /// Stored object for `handle`.
    #[must_use]
    pub fn object(&self, handle: RenderHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    /// Whether `handle` is currently shown. Unknown handles are hidden.
    #[must_use]
    pub fn is_visible(&self, handle: RenderHandle) -> bool {
        self.objects.get(&handle).is_some_and(|o| o.visible)
    }

    /// Number of objects created so far.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of currently visible objects.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.objects.values().filter(|o| o.visible).count()
    }

    /// Bytes of vertex and index data uploaded by batch creation.
    #[must_use]
    pub const fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Number of `set_visible` calls that changed something.
    #[must_use]
    pub const fn visibility_changes(&self) -> usize {
        self.visibility_changes
    }

    /// Overlay field last set, if any.
    #[must_use]
    pub const fn overlay(&self) -> Option<&OverlayField> {
        self.overlay.as_ref()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_batch(&mut self, mesh: Arc<Mesh>, pass: RenderPass, origin: Vec3) -> RenderHandle {
        // Passes sharing one Arc share one upload
        if pass == RenderPass::Terrain {
            self.uploaded_bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
        }
        self.insert(HeadlessObject {
            pass: Some(pass),
            transform: Transform::from_position(origin),
            mesh,
            visible: false,
        })
    }

    fn create_decoration(&mut self, prototype: &Arc<Mesh>, transform: &Transform) -> RenderHandle {
        self.insert(HeadlessObject {
            pass: None,
            transform: *transform,
            mesh: Arc::clone(prototype),
            visible: false,
        })
    }

    fn set_visible(&mut self, handle: RenderHandle, visible: bool) {
        match self.objects.get_mut(&handle) {
            Some(object) if object.visible != visible => {
                object.visible = visible;
                self.visibility_changes += 1;
            }
            Some(_) => {}
            None => tracing::warn!(handle = handle.0, "set_visible on unknown handle"),
        }
    }

    fn set_overlay(&mut self, overlay: Option<&OverlayField>) {
        self.overlay = overlay.cloned();
    }
}
