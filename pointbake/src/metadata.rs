//! Global bake metadata (everything written before the first frame)

use std::ops::Range;

use crate::format::TranslateMode;

/// Mesh-level metadata of a point bake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeMetadata {
    /// Name of the baked mesh as known to the exporting host
    pub mesh_name: String,
    /// Number of vertices sampled per frame
    pub num_verts: usize,
    /// First frame written
    pub start_frame: i32,
    /// Frame bound as chosen by the user (exclusive, never written)
    pub end_frame: i32,
    /// `end_frame - start_frame`
    pub num_frames: i32,
    pub translate_mode: TranslateMode,
}

impl BakeMetadata {
    /// Metadata for a bake of `start..end`.
    ///
    /// `num_frames` is `end - start`: the end frame itself is not sampled.
    pub fn new(mesh_name: impl Into<String>, num_verts: usize, start: i32, end: i32) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            num_verts,
            start_frame: start,
            end_frame: end,
            num_frames: end - start,
            translate_mode: TranslateMode::Absolute,
        }
    }

    /// Half-open range of frames the exporter samples
    pub fn frame_range(&self) -> Range<i32> {
        self.start_frame..self.end_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_frames_excludes_end() {
        let meta = BakeMetadata::new("pSphere1", 382, 1, 25);
        assert_eq!(meta.num_frames, 24);
        assert_eq!(meta.frame_range().len(), 24);
        assert!(!meta.frame_range().contains(&25));
    }

    #[test]
    fn test_default_is_empty() {
        let meta = BakeMetadata::default();
        assert!(meta.mesh_name.is_empty());
        assert_eq!(meta.num_verts, 0);
        assert_eq!(meta.num_frames, 0);
        assert_eq!(meta.translate_mode, TranslateMode::Absolute);
    }
}
