//! Point bake importer
//!
//! [`BakeDecoder`] is the state machine; the functions here pump `quick-xml`
//! pull events into it. The document is read once, top to bottom, without
//! building a tree.

mod machine;


use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

pub use machine::{BakeDecoder, DecodeSummary, ImportTarget, Phase};

use crate::error::{DecodeError, ResolveError};
use crate::host::{BakeSink, HostResult, MeshResolver};
use crate::metadata::BakeMetadata;
use crate::points::FramePoints;

/// Decode a whole document from `reader` into `sink`.
///
/// The mesh is resolved before the first byte is read. On error, frames
/// applied before the failure stay applied.
pub fn decode_bake<R: BufRead, S: BakeSink>(
    reader: R,
    sink: &mut S,
    mesh_identifier: &str,
    target: ImportTarget,
) -> Result<DecodeSummary, DecodeError> {
    let mesh = sink.resolve_mesh(mesh_identifier)?;
    let mut decoder = BakeDecoder::new(sink, mesh, target);
    let mut xml = Reader::from_reader(reader);
    pump(&mut xml, &mut decoder, false)?;
    decoder.finish()
}

/// Open `path` and decode it into `sink`
pub fn import_bake<S: BakeSink>(
    path: &Path,
    sink: &mut S,
    mesh_identifier: &str,
    target: ImportTarget,
) -> Result<DecodeSummary, DecodeError> {
    let file = File::open(path)?;
    let summary = decode_bake(BufReader::new(file), sink, mesh_identifier, target)?;
    tracing::info!(
        "Imported {:?} onto '{}': {} frames",
        path,
        mesh_identifier,
        summary.frames_applied
    );
    Ok(summary)
}

/// Read only the metadata block, stopping at the first frame
pub fn read_metadata<R: BufRead>(reader: R) -> Result<BakeMetadata, DecodeError> {
    let mut sink = MetadataOnly;
    let mut decoder = BakeDecoder::new(&mut sink, (), ImportTarget::PointArray);
    let mut xml = Reader::from_reader(reader);
    pump(&mut xml, &mut decoder, true)?;
    Ok(decoder.metadata().clone())
}

/// Feed events until end of document, or until the first `Frame` opens when
/// `header_only` is set
fn pump<R: BufRead, S: BakeSink>(
    xml: &mut Reader<R>,
    decoder: &mut BakeDecoder<'_, S>,
    header_only: bool,
) -> Result<(), DecodeError> {
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => {
                start_element(decoder, &e)?;
                if header_only && decoder.phase() == Phase::InFrame {
                    return Ok(());
                }
            }
            Event::Empty(e) => {
                start_element(decoder, &e)?;
                if header_only && decoder.phase() == Phase::InFrame {
                    return Ok(());
                }
                decoder.on_element_end(std::str::from_utf8(e.name().as_ref())?)?;
            }
            Event::Text(t) => decoder.on_text(&t.unescape()?),
            Event::CData(t) => decoder.on_text(std::str::from_utf8(&t)?),
            Event::End(e) => decoder.on_element_end(std::str::from_utf8(e.name().as_ref())?)?,
            Event::Eof => return Ok(()),
            _ => {}
        }
        buf.clear();
    }
}

fn start_element<S: BakeSink>(
    decoder: &mut BakeDecoder<'_, S>,
    e: &BytesStart<'_>,
) -> Result<(), DecodeError> {
    let mut owned = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        owned.push((key, attr.unescape_value()?.into_owned()));
    }
    let attributes: Vec<(&str, &str)> = owned
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    decoder.on_element_start(std::str::from_utf8(e.name().as_ref())?, &attributes)
}

/// Sink for header-only reads; never sees frame data
struct MetadataOnly;

impl MeshResolver for MetadataOnly {
    type Mesh = ();

    fn resolve_mesh(&mut self, _identifier: &str) -> Result<(), ResolveError> {
        Ok(())
    }
}

impl BakeSink for MetadataOnly {
    fn set_animation_range(&mut self, _start: i32, _end: i32) -> HostResult<()> {
        Ok(())
    }

    fn set_current_time(&mut self, _frame: i32) -> HostResult<()> {
        Ok(())
    }

    fn set_mesh_points(&mut self, _mesh: &(), _points: &FramePoints) -> HostResult<()> {
        Ok(())
    }

    fn record_keyframe(&mut self, _frame: i32) -> HostResult<()> {
        Ok(())
    }
}
