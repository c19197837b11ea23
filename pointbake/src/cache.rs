//! In-memory point bake
//!
//! Loads a whole bake for playback: look up a frame, copy it onto a mesh.
//! Also works as a [`BakeSource`], so a cached bake (or a sub-range of it)
//! can be written back out.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::Vec3;
use hashbrown::HashMap;

use crate::decoder::{ImportTarget, decode_bake};
use crate::error::{DecodeError, HostError, InputError, ResolveError};
use crate::host::{BakeSink, BakeSource, CancelToken, HostResult, MeshResolver};
use crate::metadata::BakeMetadata;
use crate::points::FramePoints;

#[derive(Debug, Clone)]
struct CachedFrame {
    frame: i32,
    positions: Vec<Vec3>,
}

/// Every frame of a bake, held in memory
#[derive(Debug, Clone, Default)]
pub struct PointCache {
    metadata: BakeMetadata,
    frames: Vec<CachedFrame>,
    /// frame number -> index into `frames`
    index: HashMap<i32, usize>,
    current_time: i32,
    pending: Vec<Vec3>,
    /// Positions of the last keyframe recorded as a sink
    last_applied: Vec<Vec3>,
    cancel: CancelToken,
}

impl PointCache {
    /// Empty cache for `mesh_name`, filled with [`push_frame`](Self::push_frame)
    pub fn new(mesh_name: impl Into<String>) -> Self {
        Self {
            metadata: BakeMetadata {
                mesh_name: mesh_name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Decode a bake file
    pub fn load(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)?;
        let cache = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            "Loaded point bake {:?}: '{}', {} vertices, {} frames",
            path,
            cache.metadata.mesh_name,
            cache.metadata.num_verts,
            cache.frames.len()
        );
        Ok(cache)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DecodeError> {
        let mut cache = Self::default();
        let summary = decode_bake(reader, &mut cache, "", ImportTarget::PointArray)?;
        cache.metadata = summary.metadata;
        Ok(cache)
    }

    /// Append a frame. Replaces an earlier frame with the same number.
    pub fn push_frame(&mut self, frame: i32, positions: Vec<Vec3>) {
        if self.frames.is_empty() {
            self.metadata.num_verts = positions.len();
            self.metadata.start_frame = frame;
        }
        self.metadata.end_frame = self.metadata.end_frame.max(frame + 1);
        self.metadata.num_frames = self.metadata.end_frame - self.metadata.start_frame;

        let cached = CachedFrame { frame, positions };
        match self.index.get(&frame) {
            Some(&i) => self.frames[i] = cached,
            None => {
                self.index.insert(frame, self.frames.len());
                self.frames.push(cached);
            }
        }
    }

    /// Share a cancellation flag with whoever drives an export from this cache
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn metadata(&self) -> &BakeMetadata {
        &self.metadata
    }

    /// Number of frames actually held (not the `NumFrames` field)
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Last frame the cache was moved to, as a sink or as a source
    pub fn current_time(&self) -> i32 {
        self.current_time
    }

    /// Frame numbers in the order they were loaded
    pub fn frame_numbers(&self) -> impl Iterator<Item = i32> + '_ {
        self.frames.iter().map(|f| f.frame)
    }

    /// True if every frame of `start..end` is cached
    pub fn covers(&self, start: i32, end: i32) -> bool {
        let span = i64::from(end) - i64::from(start);
        span <= self.frames.len() as i64 && (start..end).all(|f| self.index.contains_key(&f))
    }

    /// Raw positions of `frame`
    pub fn positions(&self, frame: i32) -> Option<&[Vec3]> {
        self.index
            .get(&frame)
            .map(|&i| self.frames[i].positions.as_slice())
    }

    /// Positions of the `n`th loaded frame, for looping playback
    pub fn nth_frame(&self, n: usize) -> Option<(i32, &[Vec3])> {
        self.frames
            .get(n)
            .map(|f| (f.frame, f.positions.as_slice()))
    }

    /// Copy `frame` onto `mesh`. Returns false if the frame is not cached.
    ///
    /// Only the overlapping vertex range is written.
    pub fn apply_to(&self, frame: i32, mesh: &mut [Vec3]) -> bool {
        let Some(positions) = self.positions(frame) else {
            return false;
        };
        let n = positions.len().min(mesh.len());
        mesh[..n].copy_from_slice(&positions[..n]);
        true
    }
}

impl MeshResolver for PointCache {
    type Mesh = ();

    /// The cache is its own mesh. An empty identifier always matches.
    fn resolve_mesh(&mut self, identifier: &str) -> Result<(), ResolveError> {
        if identifier.is_empty() || identifier == self.metadata.mesh_name {
            Ok(())
        } else {
            Err(InputError::MeshNotFound(identifier.to_string()).into())
        }
    }
}

impl BakeSink for PointCache {
    fn set_animation_range(&mut self, start: i32, end: i32) -> HostResult<()> {
        self.metadata.start_frame = start;
        self.metadata.end_frame = end;
        Ok(())
    }

    fn set_current_time(&mut self, frame: i32) -> HostResult<()> {
        self.current_time = frame;
        Ok(())
    }

    fn set_mesh_points(&mut self, _mesh: &(), points: &FramePoints) -> HostResult<()> {
        // Vertices missing from this frame keep their previous position
        self.pending.clone_from(&self.last_applied);
        if self.pending.len() < points.len() {
            self.pending.resize(points.len(), Vec3::ZERO);
        }
        for (i, position) in points.iter() {
            self.pending[i] = position;
        }
        Ok(())
    }

    fn record_keyframe(&mut self, frame: i32) -> HostResult<()> {
        let positions = std::mem::take(&mut self.pending);
        self.last_applied.clone_from(&positions);
        let cached = CachedFrame { frame, positions };
        match self.index.get(&frame) {
            Some(&i) => self.frames[i] = cached,
            None => {
                self.index.insert(frame, self.frames.len());
                self.frames.push(cached);
            }
        }
        Ok(())
    }
}

impl BakeSource for PointCache {
    fn vertex_count(&self, _mesh: &()) -> HostResult<usize> {
        Ok(self.metadata.num_verts)
    }

    fn world_position(&mut self, _mesh: &(), vertex: usize, frame: i32) -> HostResult<Vec3> {
        let positions = self
            .positions(frame)
            .ok_or_else(|| HostError::msg(format!("Frame {} is not in the cache", frame)))?;
        positions.get(vertex).copied().ok_or_else(|| {
            HostError::msg(format!("Frame {} has no vertex {}", frame, vertex))
        })
    }

    fn set_current_time(&mut self, frame: i32) -> HostResult<()> {
        self.current_time = frame;
        Ok(())
    }

    fn is_cancellation_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAKE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<NCCAPointBake>
	<MeshName> cloth </MeshName>
	<NumVerts> 2 </NumVerts>
	<StartFrame> 5 </StartFrame>
	<EndFrame> 8 </EndFrame>
	<NumFrames> 3 </NumFrames>
	<TranslateMode> absolute </TranslateMode>
	<Frame number="5">
		<Vertex number="0" attrib="translate"> 0 0 0 </Vertex>
		<Vertex number="1" attrib="translate"> 1 0 0 </Vertex>
	</Frame>
	<Frame number="6">
		<Vertex number="0" attrib="translate"> 0 1 0 </Vertex>
		<Vertex number="1" attrib="translate"> 1 1 </Vertex>
	</Frame>
	<Frame number="7">
		<Vertex number="0" attrib="translate"> 0 2 0 </Vertex>
		<Vertex number="1" attrib="translate"> 1 2 0 </Vertex>
	</Frame>
</NCCAPointBake>
"#;

    #[test]
    fn test_load_and_lookup() {
        let cache = PointCache::from_reader(BAKE.as_bytes()).unwrap();

        assert_eq!(cache.metadata().mesh_name, "cloth");
        assert_eq!(cache.metadata().start_frame, 5);
        assert_eq!(cache.metadata().end_frame, 8);
        assert_eq!(cache.num_frames(), 3);
        assert_eq!(cache.frame_numbers().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(
            cache.positions(7).unwrap(),
            &[Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 2.0, 0.0)]
        );
        assert!(cache.positions(8).is_none());
        assert_eq!(cache.nth_frame(0).unwrap().0, 5);
    }

    #[test]
    fn test_skipped_vertex_holds_previous_position() {
        let cache = PointCache::from_reader(BAKE.as_bytes()).unwrap();
        assert_eq!(cache.positions(6).unwrap()[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_repeated_frame_number_carries_latest_positions() {
        let bake = BAKE
            .replace(
                "<Frame number=\"7\">",
                "<Frame number=\"5\">\n\t\t<Vertex number=\"0\" attrib=\"translate\"> 0 9 0 </Vertex>\n\t\t<Vertex number=\"1\" attrib=\"translate\"> 1 9 0 </Vertex>\n\t</Frame>\n\t<Frame number=\"7\">",
            )
            .replace("> 1 2 0 <", "> 1 2 <");
        let cache = PointCache::from_reader(bake.as_bytes()).unwrap();

        assert_eq!(cache.frame_numbers().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(cache.positions(5).unwrap()[1], Vec3::new(1.0, 9.0, 0.0));
        // Frame 7 skips vertex 1, which holds the re-keyed frame 5 value
        assert_eq!(cache.positions(7).unwrap()[1], Vec3::new(1.0, 9.0, 0.0));
    }

    #[test]
    fn test_covers_range() {
        let cache = PointCache::from_reader(BAKE.as_bytes()).unwrap();
        assert!(cache.covers(5, 8));
        assert!(cache.covers(6, 7));
        assert!(cache.covers(7, 7));
        assert!(!cache.covers(4, 6));
        assert!(!cache.covers(6, 10));
        assert!(!cache.covers(i32::MIN, i32::MAX));
    }

    #[test]
    fn test_apply_to_mesh() {
        let cache = PointCache::from_reader(BAKE.as_bytes()).unwrap();
        let mut mesh = vec![Vec3::splat(9.0); 3];

        assert!(cache.apply_to(7, &mut mesh));
        assert_eq!(
            mesh,
            vec![Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 2.0, 0.0), Vec3::splat(9.0)]
        );
        assert!(!cache.apply_to(42, &mut mesh));
    }

    #[test]
    fn test_push_frame_updates_metadata() {
        let mut cache = PointCache::new("blob");
        cache.push_frame(3, vec![Vec3::X]);
        cache.push_frame(4, vec![Vec3::Y]);
        cache.push_frame(3, vec![Vec3::Z]);

        let meta = cache.metadata();
        assert_eq!((meta.start_frame, meta.end_frame, meta.num_frames), (3, 5, 2));
        assert_eq!(meta.num_verts, 1);
        assert_eq!(cache.num_frames(), 2);
        assert_eq!(cache.positions(3).unwrap(), &[Vec3::Z]);
    }

    #[test]
    fn test_resolve_by_name() {
        let mut cache = PointCache::new("blob");
        assert!(cache.resolve_mesh("blob").is_ok());
        assert!(cache.resolve_mesh("").is_ok());
        assert!(matches!(
            cache.resolve_mesh("other"),
            Err(ResolveError::Input(InputError::MeshNotFound(_)))
        ));
    }

    #[test]
    fn test_source_reports_missing_frame() {
        let mut cache = PointCache::new("blob");
        cache.push_frame(0, vec![Vec3::X]);
        assert_eq!(cache.world_position(&(), 0, 0).unwrap(), Vec3::X);
        assert!(cache.world_position(&(), 0, 1).is_err());
        assert!(cache.world_position(&(), 1, 0).is_err());
    }
}
