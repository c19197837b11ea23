//! Bake conversions behind the CLI subcommands

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use pointbake::{
    BakeMetadata, ChannelClip, DecodeSummary, ExportStatus, ImportTarget, InputError, PointCache,
    export_bake, import_bake, read_metadata,
};

use crate::obj::{FramePattern, ObjSequence, ObjWriter};

fn report(status: ExportStatus, output: &Path) {
    match status {
        ExportStatus::Completed { frames } => {
            tracing::info!("Wrote {} frames to {:?}", frames, output)
        }
        ExportStatus::Cancelled { frames_written } => {
            tracing::warn!(
                "Export cancelled, {:?} holds the first {} frames",
                output,
                frames_written
            )
        }
    }
}

/// Bake an OBJ frame sequence over `start..end`
pub fn export_sequence(
    frames: &str,
    output: &Path,
    start: i32,
    end: i32,
    mesh_name: &str,
) -> Result<ExportStatus> {
    let pattern = FramePattern::parse(frames)?;
    let mut source = ObjSequence::new(pattern, start);
    let status = export_bake(output, &mut source, mesh_name, start, end)
        .with_context(|| format!("Failed to export {:?}", frames))?;
    report(status, output);
    Ok(status)
}

/// Apply a bake to a template OBJ, writing one OBJ per frame
pub fn import_to_obj(bake: &Path, template: &Path, output: &str) -> Result<DecodeSummary> {
    if output.is_empty() {
        return Err(InputError::NoOutputPath.into());
    }
    let pattern = FramePattern::parse(output)?;
    if let Some(parent) = pattern.path(0).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let mut sink = ObjWriter::new(template, pattern);
    let mesh_name = template.display().to_string();
    let summary = import_bake(bake, &mut sink, &mesh_name, ImportTarget::PointArray)
        .with_context(|| format!("Failed to import {:?}", bake))?;

    if summary.skipped_vertices > 0 {
        tracing::warn!("Skipped {} malformed vertices", summary.skipped_vertices);
    }
    tracing::info!("Wrote {} OBJ files", sink.written().len());
    Ok(summary)
}

/// Import a bake as per-vertex channels and write the clip as JSON
pub fn export_channels(bake: &Path, output: &Path) -> Result<ChannelClip> {
    if output.as_os_str().is_empty() {
        return Err(InputError::NoOutputPath.into());
    }
    let (clip, summary) =
        ChannelClip::import(bake).with_context(|| format!("Failed to import {:?}", bake))?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &clip)?;
    writer.flush()?;

    tracing::info!(
        "Wrote {} channels, {} frames -> {:?}",
        clip.channels.len(),
        summary.frames_applied,
        output
    );
    Ok(clip)
}

/// Metadata of a bake, plus the number of frames it actually holds unless
/// `header_only` is set
pub fn describe(bake: &Path, header_only: bool) -> Result<(BakeMetadata, Option<usize>)> {
    if header_only {
        let file = File::open(bake).with_context(|| format!("Failed to open bake: {:?}", bake))?;
        let header = read_metadata(BufReader::new(file))
            .with_context(|| format!("Failed to read bake header: {:?}", bake))?;
        return Ok((header, None));
    }
    let cache =
        PointCache::load(bake).with_context(|| format!("Failed to read bake: {:?}", bake))?;
    Ok((cache.metadata().clone(), Some(cache.num_frames())))
}

/// Re-export `start..end` of an existing bake
pub fn trim(bake: &Path, output: &Path, start: i32, end: i32) -> Result<ExportStatus> {
    let mut cache =
        PointCache::load(bake).with_context(|| format!("Failed to read bake: {:?}", bake))?;
    if start < end && !cache.covers(start, end) {
        return Err(InputError::FramesNotInBake { start, end })
            .with_context(|| format!("Failed to trim {:?}", bake));
    }
    let mesh_name = cache.metadata().mesh_name.clone();
    let status = export_bake(output, &mut cache, &mesh_name, start, end)
        .with_context(|| format!("Failed to trim {:?}", bake))?;
    report(status, output);
    Ok(status)
}
