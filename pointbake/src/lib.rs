//! NCCA point bake codec
//!
//! Reads and writes `NCCAPointBake` XML: the world-space position of every
//! vertex of one mesh, sampled once per frame over a frame range.
//!
//! The codec is host-agnostic. An exporter samples a [`BakeSource`], an
//! importer drives a [`BakeSink`]; both are implemented by whatever
//! application owns the mesh.
//!
//! # Modules
//!
//! - [`format`] - Element names and the translate mode
//! - [`writer`] - Streaming document writer
//! - [`encoder`] - Export over a frame range, with cancellation
//! - [`decoder`] - Streaming import state machine
//! - [`host`] - Host capability traits
//! - [`cache`] - Whole bake held in memory for playback
//! - [`clip`] - Per-vertex animation channels

pub mod cache;
pub mod clip;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod host;
pub mod metadata;
pub mod points;
pub mod writer;

pub use cache::PointCache;
pub use clip::{Channel, ChannelClip, ChannelKey};
pub use decoder::{
    BakeDecoder, DecodeSummary, ImportTarget, decode_bake, import_bake, read_metadata,
};
pub use encoder::{ExportStatus, export_bake, export_bake_to_writer};
pub use error::{DecodeError, ExportError, HostError, InputError, ResolveError};
pub use format::TranslateMode;
pub use host::{BakeSink, BakeSource, CancelToken, HostResult, MeshResolver, select_single};
pub use metadata::BakeMetadata;
pub use points::FramePoints;
pub use writer::BakeWriter;
