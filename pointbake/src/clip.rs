//! Channel clip import target
//!
//! Collects an [`ImportTarget::Channels`](crate::decoder::ImportTarget)
//! import as one 3-component `t` channel per vertex, keyed once per frame.
//! Serializes to JSON for hosts that load animation channels from disk.

use std::path::Path;

use glam::Vec3;
use serde::Serialize;

use crate::decoder::{DecodeSummary, ImportTarget, import_bake};
use crate::error::{DecodeError, HostError, ResolveError};
use crate::host::{BakeSink, HostResult, MeshResolver};
use crate::points::FramePoints;

/// One key on a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelKey {
    pub frame: i32,
    pub value: [f32; 3],
}

/// Animation channel driving one vertex
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channel {
    pub index: usize,
    pub name: String,
    pub components: usize,
    pub keys: Vec<ChannelKey>,
}

impl Channel {
    /// Value keyed at `frame`, if any
    pub fn value_at(&self, frame: i32) -> Option<Vec3> {
        self.keys
            .iter()
            .find(|k| k.frame == frame)
            .map(|k| Vec3::from_array(k.value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelClip {
    pub start: i32,
    pub end: i32,
    pub channels: Vec<Channel>,
    #[serde(skip)]
    pending: Vec<(usize, Vec3)>,
}

impl ChannelClip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import the bake at `path` as channels
    pub fn import(path: &Path) -> Result<(Self, DecodeSummary), DecodeError> {
        let mut clip = Self::new();
        let summary = import_bake(path, &mut clip, "", ImportTarget::Channels)?;
        Ok((clip, summary))
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Total keys across all channels
    pub fn key_count(&self) -> usize {
        self.channels.iter().map(|c| c.keys.len()).sum()
    }
}

impl MeshResolver for ChannelClip {
    type Mesh = ();

    fn resolve_mesh(&mut self, _identifier: &str) -> Result<(), ResolveError> {
        Ok(())
    }
}

impl BakeSink for ChannelClip {
    fn set_channel_count(&mut self, count: usize) -> HostResult<()> {
        let mut channels = Vec::new();
        channels.try_reserve_exact(count).map_err(HostError::new)?;
        channels.extend((0..count).map(|index| Channel {
            index,
            ..Default::default()
        }));
        self.channels = channels;
        Ok(())
    }

    fn set_channel_layout(
        &mut self,
        index: usize,
        components: usize,
        name: &str,
    ) -> HostResult<()> {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.components = components;
            channel.name = name.to_string();
        }
        Ok(())
    }

    fn set_animation_range(&mut self, start: i32, end: i32) -> HostResult<()> {
        self.start = start;
        self.end = end;
        Ok(())
    }

    fn set_current_time(&mut self, _frame: i32) -> HostResult<()> {
        Ok(())
    }

    fn set_mesh_points(&mut self, _mesh: &(), points: &FramePoints) -> HostResult<()> {
        self.pending.clear();
        self.pending.extend(points.iter());
        Ok(())
    }

    fn record_keyframe(&mut self, frame: i32) -> HostResult<()> {
        for (index, value) in self.pending.drain(..) {
            // Vertices past the declared count get no channel
            let Some(channel) = self.channels.get_mut(index) else {
                tracing::debug!("No channel for vertex {} at frame {}", index, frame);
                continue;
            };
            channel.keys.push(ChannelKey {
                frame,
                value: value.to_array(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_bake;

    const BAKE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<NCCAPointBake>
	<MeshName> tri </MeshName>
	<NumVerts> 3 </NumVerts>
	<StartFrame> 1 </StartFrame>
	<EndFrame> 3 </EndFrame>
	<NumFrames> 2 </NumFrames>
	<TranslateMode> absolute </TranslateMode>
	<Frame number="1">
		<Vertex number="0" attrib="translate"> 0 0 0 </Vertex>
		<Vertex number="1" attrib="translate"> 1 0 0 </Vertex>
		<Vertex number="2" attrib="translate"> 0 1 0 </Vertex>
	</Frame>
	<Frame number="2">
		<Vertex number="0" attrib="translate"> 0 0 1 </Vertex>
		<Vertex number="1" attrib="translate"> 1 0 </Vertex>
		<Vertex number="2" attrib="translate"> 0 1 1 </Vertex>
	</Frame>
</NCCAPointBake>
"#;

    #[test]
    fn test_channels_declared_and_keyed() {
        let mut clip = ChannelClip::new();
        let summary =
            decode_bake(BAKE.as_bytes(), &mut clip, "", ImportTarget::Channels).unwrap();

        assert_eq!(summary.frames_applied, 2);
        assert_eq!((clip.start, clip.end), (1, 3));
        assert_eq!(clip.channels.len(), 3);
        assert!(clip.channels.iter().all(|c| c.name == "t" && c.components == 3));

        let ch0 = clip.channel(0).unwrap();
        assert_eq!(ch0.value_at(1), Some(Vec3::ZERO));
        assert_eq!(ch0.value_at(2), Some(Vec3::Z));
        // Malformed vertex 1 of frame 2 leaves that key out
        assert_eq!(clip.channel(1).unwrap().keys.len(), 1);
        assert_eq!(clip.key_count(), 5);
    }

    #[test]
    fn test_point_array_import_declares_no_channels() {
        let mut clip = ChannelClip::new();
        decode_bake(BAKE.as_bytes(), &mut clip, "", ImportTarget::PointArray).unwrap();
        assert!(clip.channels.is_empty());
        assert_eq!(clip.key_count(), 0);
    }

    #[test]
    fn test_impossible_channel_count_fails() {
        let mut clip = ChannelClip::new();
        assert!(clip.set_channel_count(usize::MAX).is_err());
        assert!(clip.channels.is_empty());

        clip.set_channel_count(2).unwrap();
        assert_eq!(clip.channels.len(), 2);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut clip = ChannelClip::new();
        decode_bake(BAKE.as_bytes(), &mut clip, "", ImportTarget::Channels).unwrap();

        let json: serde_json::Value = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["start"], 1);
        assert_eq!(json["channels"][2]["name"], "t");
        assert_eq!(
            json["channels"][2]["keys"][1],
            serde_json::json!({ "frame": 2, "value": [0.0, 1.0, 1.0] })
        );
        assert!(json.get("pending").is_none());
    }
}
