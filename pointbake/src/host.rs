//! Host application capabilities
//!
//! The encoder and decoder never talk to a 3D application directly. The host
//! hands them an object implementing [`BakeSource`] (export) or [`BakeSink`]
//! (import); tests use plain in-memory structs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use crate::error::{HostError, InputError, ResolveError};
use crate::points::FramePoints;

pub type HostResult<T> = Result<T, HostError>;

/// Turns a user-facing mesh identifier into a host mesh handle
pub trait MeshResolver {
    type Mesh;

    /// Resolve `identifier` to a polygonal mesh.
    ///
    /// Fails with [`InputError::MeshNotFound`] or [`InputError::NotAMesh`].
    fn resolve_mesh(&mut self, identifier: &str) -> Result<Self::Mesh, ResolveError>;
}

/// Read side of a host, sampled by the exporter
pub trait BakeSource: MeshResolver {
    fn vertex_count(&self, mesh: &Self::Mesh) -> HostResult<usize>;

    /// World-space position of `vertex` at `frame`
    fn world_position(&mut self, mesh: &Self::Mesh, vertex: usize, frame: i32)
    -> HostResult<Vec3>;

    /// Move the host's time cursor to `frame`
    fn set_current_time(&mut self, frame: i32) -> HostResult<()>;

    /// Polled once after every exported frame
    fn is_cancellation_requested(&self) -> bool {
        false
    }
}

/// Write side of a host, driven by the importer
pub trait BakeSink: MeshResolver {
    /// Channel-system imports only: one channel per vertex
    fn set_channel_count(&mut self, _count: usize) -> HostResult<()> {
        Ok(())
    }

    /// Channel-system imports only: shape of channel `index`
    fn set_channel_layout(
        &mut self,
        _index: usize,
        _components: usize,
        _name: &str,
    ) -> HostResult<()> {
        Ok(())
    }

    fn set_animation_range(&mut self, start: i32, end: i32) -> HostResult<()>;

    fn set_current_time(&mut self, frame: i32) -> HostResult<()>;

    /// Apply one frame's positions to the mesh in a single batch
    fn set_mesh_points(&mut self, mesh: &Self::Mesh, points: &FramePoints) -> HostResult<()>;

    /// Key the mesh state at the current time
    fn record_keyframe(&mut self, frame: i32) -> HostResult<()>;
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so one half can live in the UI while the
/// other is polled by a [`BakeSource`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Pick the single selected object, as the export dialog requires
pub fn select_single<S: AsRef<str>>(selection: &[S]) -> Result<&str, InputError> {
    match selection {
        [] => Err(InputError::NothingSelected),
        [one] => Ok(one.as_ref()),
        many => Err(InputError::MultipleSelected(many.len())),
    }
}
