//! Point bake exporter
//!
//! Samples world-space vertex positions from a [`BakeSource`] over a
//! half-open frame range and streams them through a [`BakeWriter`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ExportError, InputError};
use crate::host::BakeSource;
use crate::metadata::BakeMetadata;
use crate::writer::BakeWriter;

/// How an export ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// Every frame in the range was written
    Completed { frames: usize },
    /// The host asked to stop; the document is well-formed but truncated
    Cancelled { frames_written: usize },
}

impl ExportStatus {
    pub fn frames_written(self) -> usize {
        match self {
            ExportStatus::Completed { frames } => frames,
            ExportStatus::Cancelled { frames_written } => frames_written,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, ExportStatus::Cancelled { .. })
    }
}

fn check_range(start: i32, end: i32) -> Result<(), InputError> {
    if start >= end {
        return Err(InputError::InvalidFrameRange { start, end });
    }
    Ok(())
}

/// Bake `mesh_identifier` over `start..end` into the file at `output`.
///
/// The range and the mesh are validated before the file is created, so a
/// rejected export leaves nothing behind. A host or I/O failure during the
/// frame loop removes the partial file. The frame `end` itself is not
/// sampled.
pub fn export_bake<S: BakeSource>(
    output: &Path,
    source: &mut S,
    mesh_identifier: &str,
    start: i32,
    end: i32,
) -> Result<ExportStatus, ExportError> {
    if output.as_os_str().is_empty() {
        return Err(InputError::NoOutputPath.into());
    }
    check_range(start, end)?;
    let mesh = source.resolve_mesh(mesh_identifier)?;

    let file = File::create(output)?;
    let status = match write_frames(
        BufWriter::new(file),
        source,
        &mesh,
        mesh_identifier,
        start,
        end,
    ) {
        Ok(status) => status,
        Err(err) => {
            if let Err(e) = std::fs::remove_file(output) {
                tracing::warn!("Failed to remove partial bake {:?}: {}", output, e);
            }
            return Err(err);
        }
    };

    tracing::info!(
        "Exported point bake '{}' -> {:?}: {} frames{}",
        mesh_identifier,
        output,
        status.frames_written(),
        if status.is_cancelled() { " (cancelled)" } else { "" }
    );
    Ok(status)
}

/// Same as [`export_bake`] but streams into any writer
pub fn export_bake_to_writer<W: Write, S: BakeSource>(
    writer: W,
    source: &mut S,
    mesh_identifier: &str,
    start: i32,
    end: i32,
) -> Result<ExportStatus, ExportError> {
    check_range(start, end)?;
    let mesh = source.resolve_mesh(mesh_identifier)?;
    write_frames(writer, source, &mesh, mesh_identifier, start, end)
}

fn write_frames<W: Write, S: BakeSource>(
    writer: W,
    source: &mut S,
    mesh: &S::Mesh,
    mesh_name: &str,
    start: i32,
    end: i32,
) -> Result<ExportStatus, ExportError> {
    let num_verts = source.vertex_count(mesh)?;
    let meta = BakeMetadata::new(mesh_name, num_verts, start, end);

    let mut out = BakeWriter::new(writer)?;
    out.write_metadata(&meta)?;

    for frame in meta.frame_range() {
        tracing::debug!("Doing frame {:04}", frame);
        source.set_current_time(frame)?;

        out.begin_frame(frame)?;
        for vertex in 0..num_verts {
            let position = source.world_position(mesh, vertex, frame)?;
            out.write_vertex(vertex, position)?;
        }
        out.end_frame()?;

        if source.is_cancellation_requested() {
            let frames_written = out.frames_written();
            out.finish()?;
            tracing::info!("Export interrupted after frame {}", frame);
            return Ok(ExportStatus::Cancelled { frames_written });
        }
    }

    let frames = out.frames_written();
    out.finish()?;
    Ok(ExportStatus::Completed { frames })
}
