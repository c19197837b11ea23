//! Streaming point bake writer
//!
//! Writes the document line by line as the exporter walks the frames; nothing
//! is buffered beyond what the underlying writer does. The output is
//! byte-compatible with the files existing importers were written against.

use std::fmt::{self, Display};
use std::io::{self, Write};

use glam::Vec3;
use quick_xml::escape::escape;

use crate::format::{
    ATTR_KIND, ATTR_NUMBER, END_FRAME, FRAME, KIND_TRANSLATE, MESH_NAME, NUM_FRAMES, NUM_VERTS,
    ROOT, START_FRAME, TRANSLATE_MODE, VERTEX, XML_DECLARATION,
};
use crate::metadata::BakeMetadata;

/// Writer for a single point bake document.
///
/// Call order: [`new`](Self::new), [`write_metadata`](Self::write_metadata),
/// then any number of [`begin_frame`](Self::begin_frame) /
/// [`write_vertex`](Self::write_vertex) / [`end_frame`](Self::end_frame)
/// groups, then [`finish`](Self::finish).
pub struct BakeWriter<W: Write> {
    inner: W,
    depth: usize,
    frame_open: bool,
    frames_written: usize,
}

impl<W: Write> BakeWriter<W> {
    /// Write the XML declaration and open the root element
    pub fn new(mut inner: W) -> io::Result<Self> {
        writeln!(inner, "{XML_DECLARATION}")?;
        writeln!(inner, "<{ROOT}>")?;
        Ok(Self {
            inner,
            depth: 1,
            frame_open: false,
            frames_written: 0,
        })
    }

    fn line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        for _ in 0..self.depth {
            self.inner.write_all(b"\t")?;
        }
        self.inner.write_fmt(args)?;
        self.inner.write_all(b"\n")
    }

    fn field(&mut self, name: &str, value: impl Display) -> io::Result<()> {
        self.line(format_args!("<{name}> {value} </{name}>"))
    }

    /// Write the metadata block. Must come before the first frame.
    pub fn write_metadata(&mut self, meta: &BakeMetadata) -> io::Result<()> {
        debug_assert_eq!(self.frames_written, 0, "metadata after frame data");
        self.field(MESH_NAME, escape(meta.mesh_name.as_str()))?;
        self.field(NUM_VERTS, meta.num_verts)?;
        self.field(START_FRAME, meta.start_frame)?;
        self.field(END_FRAME, meta.end_frame)?;
        self.field(NUM_FRAMES, meta.num_frames)?;
        self.field(TRANSLATE_MODE, meta.translate_mode)
    }

    pub fn begin_frame(&mut self, frame: i32) -> io::Result<()> {
        debug_assert!(!self.frame_open, "nested <Frame>");
        self.line(format_args!(r#"<{FRAME} {ATTR_NUMBER}="{frame}">"#))?;
        self.depth += 1;
        self.frame_open = true;
        Ok(())
    }

    pub fn write_vertex(&mut self, index: usize, position: Vec3) -> io::Result<()> {
        self.line(format_args!(
            r#"<{VERTEX} {ATTR_NUMBER}="{index}" {ATTR_KIND}="{KIND_TRANSLATE}"> {} {} {} </{VERTEX}>"#,
            position.x, position.y, position.z
        ))
    }

    pub fn end_frame(&mut self) -> io::Result<()> {
        debug_assert!(self.frame_open, "</Frame> without <Frame>");
        self.depth -= 1;
        self.frame_open = false;
        self.frames_written += 1;
        self.line(format_args!("</{FRAME}>"))
    }

    /// Number of completed frames so far
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Close any open frame and the root element, flush, and hand back the writer
    pub fn finish(mut self) -> io::Result<W> {
        if self.frame_open {
            self.end_frame()?;
        }
        self.depth = 0;
        self.line(format_args!("</{ROOT}>"))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}
