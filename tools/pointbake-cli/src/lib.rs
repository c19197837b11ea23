//! pointbake-cli library
//!
//! File-backed host and batch tooling for the `pointbake` binary.

pub mod convert;
pub mod manifest;
pub mod obj;

/// Extension of bakes written by `build`
pub const BAKE_EXT: &str = "xml";

pub use convert::{describe, export_channels, export_sequence, import_to_obj, trim};
pub use obj::{FramePattern, ObjSequence, ObjWriter};
