//! Import state machine
//!
//! Fed one tokenizer event at a time. Metadata is pushed to the sink as soon
//! as each field closes; vertex triples are collected per frame and handed to
//! the sink in one batch when the frame closes.

use std::str::FromStr;

use glam::Vec3;

use crate::error::DecodeError;
use crate::format::{
    ATTR_NUMBER, END_FRAME, FRAME, MAX_VERTS, MESH_NAME, NUM_FRAMES, NUM_VERTS, START_FRAME,
    TRANSLATE_CHANNEL, TRANSLATE_COMPONENTS, TRANSLATE_MODE, VERTEX,
};
use crate::host::BakeSink;
use crate::metadata::BakeMetadata;
use crate::points::FramePoints;

/// What the import writes into on the host side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportTarget {
    /// Assign mesh points directly and key them
    #[default]
    PointArray,
    /// Animation channels: one 3-component `t` channel per vertex is
    /// declared as soon as the vertex count is known
    Channels,
}

/// Element the decoder is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Outside any frame (metadata, or between frames)
    Idle,
    InFrame,
    InVertex,
}

/// Result of a completed import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeSummary {
    pub metadata: BakeMetadata,
    /// Frames applied to the sink
    pub frames_applied: usize,
    /// Vertices dropped because their text was not exactly three values or
    /// their number was past `NumVerts`
    pub skipped_vertices: usize,
}

/// Streaming decoder bound to one sink and one resolved mesh
pub struct BakeDecoder<'s, S: BakeSink> {
    sink: &'s mut S,
    mesh: S::Mesh,
    target: ImportTarget,
    metadata: BakeMetadata,
    text: String,
    phase: Phase,
    current_frame: i32,
    vertex_offset: usize,
    points: FramePoints,
    depth: usize,
    frames_applied: usize,
    skipped_vertices: usize,
}

impl<'s, S: BakeSink> BakeDecoder<'s, S> {
    pub fn new(sink: &'s mut S, mesh: S::Mesh, target: ImportTarget) -> Self {
        Self {
            sink,
            mesh,
            target,
            metadata: BakeMetadata::default(),
            text: String::new(),
            phase: Phase::Idle,
            current_frame: 0,
            vertex_offset: 0,
            points: FramePoints::new(),
            depth: 0,
            frames_applied: 0,
            skipped_vertices: 0,
        }
    }

    /// Metadata captured so far
    pub fn metadata(&self) -> &BakeMetadata {
        &self.metadata
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_frame(&self) -> i32 {
        self.current_frame
    }

    pub fn on_element_start(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), DecodeError> {
        // Text may arrive in several chunks; it belongs to the element opened last
        self.text.clear();
        self.depth += 1;

        match name {
            VERTEX => {
                self.vertex_offset = parse_number(VERTEX, attributes)?;
                self.phase = Phase::InVertex;
            }
            FRAME => {
                let frame = parse_number(FRAME, attributes)?;
                tracing::trace!("Processing frame {}", frame);
                self.current_frame = frame;
                self.sink.set_current_time(frame)?;
                self.points.clear();
                self.phase = Phase::InFrame;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn on_text(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub fn on_element_end(&mut self, name: &str) -> Result<(), DecodeError> {
        self.depth = self.depth.saturating_sub(1);

        match name {
            MESH_NAME => {
                self.metadata.mesh_name = self.text.trim().to_string();
            }
            NUM_VERTS => {
                let count: usize = parse_int(NUM_VERTS, &self.text)?;
                if count > MAX_VERTS {
                    return Err(DecodeError::TooManyVertices {
                        count,
                        max: MAX_VERTS,
                    });
                }
                self.metadata.num_verts = count;
                if self.target == ImportTarget::Channels {
                    self.sink.set_channel_count(count)?;
                    for index in 0..count {
                        self.sink.set_channel_layout(
                            index,
                            TRANSLATE_COMPONENTS,
                            TRANSLATE_CHANNEL,
                        )?;
                    }
                }
            }
            START_FRAME => {
                self.metadata.start_frame = parse_int(START_FRAME, &self.text)?;
            }
            END_FRAME => {
                self.metadata.end_frame = parse_int(END_FRAME, &self.text)?;
                self.sink
                    .set_animation_range(self.metadata.start_frame, self.metadata.end_frame)?;
            }
            NUM_FRAMES => {
                self.metadata.num_frames = parse_int(NUM_FRAMES, &self.text)?;
            }
            TRANSLATE_MODE => {
                self.metadata.translate_mode = self.text.parse()?;
            }
            VERTEX => {
                self.commit_vertex()?;
                self.phase = Phase::InFrame;
            }
            FRAME => {
                if self.points.committed() != self.metadata.num_verts {
                    tracing::debug!(
                        "Frame {} has {} of {} vertices",
                        self.current_frame,
                        self.points.committed(),
                        self.metadata.num_verts
                    );
                }
                self.sink.set_mesh_points(&self.mesh, &self.points)?;
                self.sink.record_keyframe(self.current_frame)?;
                self.points.clear();
                self.frames_applied += 1;
                self.phase = Phase::Idle;
            }
            _ => {}
        }
        Ok(())
    }

    /// Vertex text must be exactly three values and its number below
    /// `NumVerts`; anything else is dropped
    fn commit_vertex(&mut self) -> Result<(), DecodeError> {
        let mut tokens = self.text.split_whitespace();
        let (Some(x), Some(y), Some(z), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            tracing::trace!(
                "Skipping vertex {} of frame {}: {:?}",
                self.vertex_offset,
                self.current_frame,
                self.text
            );
            self.skipped_vertices += 1;
            return Ok(());
        };

        let position = Vec3::new(parse_float(x)?, parse_float(y)?, parse_float(z)?);
        if self.vertex_offset >= self.metadata.num_verts
            || !self.points.set(self.vertex_offset, position)
        {
            tracing::trace!(
                "Skipping vertex {} of frame {}: only {} vertices declared",
                self.vertex_offset,
                self.current_frame,
                self.metadata.num_verts
            );
            self.skipped_vertices += 1;
        }
        Ok(())
    }

    /// End-of-document cleanup
    pub fn finish(self) -> Result<DecodeSummary, DecodeError> {
        if self.depth != 0 {
            return Err(DecodeError::UnexpectedEof(self.depth));
        }
        Ok(DecodeSummary {
            metadata: self.metadata,
            frames_applied: self.frames_applied,
            skipped_vertices: self.skipped_vertices,
        })
    }
}

fn parse_int<T: FromStr>(element: &str, text: &str) -> Result<T, DecodeError> {
    text.trim()
        .parse()
        .map_err(|_| DecodeError::InvalidInteger {
            element: element.to_string(),
            text: text.to_string(),
        })
}

fn parse_float(token: &str) -> Result<f32, DecodeError> {
    token.parse().map_err(|_| DecodeError::InvalidFloat {
        element: VERTEX.to_string(),
        text: token.to_string(),
    })
}

/// Required integer `number` attribute of `element`
fn parse_number<T: FromStr>(
    element: &'static str,
    attributes: &[(&str, &str)],
) -> Result<T, DecodeError> {
    let value = attributes
        .iter()
        .find(|(key, _)| *key == ATTR_NUMBER)
        .map(|(_, value)| *value)
        .ok_or(DecodeError::MissingAttribute {
            element,
            attribute: ATTR_NUMBER,
        })?;
    parse_int(element, value)
}
