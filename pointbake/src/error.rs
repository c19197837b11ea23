//! Error types for export and import
//!
//! - [`InputError`]: rejected before any I/O happens (bad selection, bad range)
//! - [`ExportError`]: anything that stops an export
//! - [`DecodeError`]: fatal for the current import; frames already applied stay applied
//!
//! Malformed vertex triples are not errors at all, they are skipped.

use std::error::Error as StdError;
use std::io;

/// Invalid export/import parameters, reported before touching any file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid frame range: start {start} >= end {end}")]
    InvalidFrameRange { start: i32, end: i32 },

    #[error("No mesh selected")]
    NothingSelected,

    #[error("Only one mesh may be exported at a time ({0} selected)")]
    MultipleSelected(usize),

    #[error("Mesh '{0}' not found")]
    MeshNotFound(String),

    #[error("'{0}' is not a polygonal mesh")]
    NotAMesh(String),

    #[error("No output file selected")]
    NoOutputPath,

    #[error("Frames {start}..{end} are not all in the bake")]
    FramesNotInBake { start: i32, end: i32 },
}

/// Failure reported by a host application binding
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HostError(Box<dyn StdError + Send + Sync>);

impl HostError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        Self::new(err)
    }
}

/// Mesh lookup failure: either a user-facing input problem or a host failure
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors that abort an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to write point bake: {0}")]
    Io(#[from] io::Error),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Errors that abort an import
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid UTF-8 in element or attribute name")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid integer in <{element}>: {text:?}")]
    InvalidInteger { element: String, text: String },

    #[error("Invalid float in <{element}>: {text:?}")]
    InvalidFloat { element: String, text: String },

    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<NumVerts> {count} exceeds the limit of {max}")]
    TooManyVertices { count: usize, max: usize },

    #[error("Unknown translate mode: {0:?}")]
    UnknownTranslateMode(String),

    #[error("Document ended with {0} element(s) still open")]
    UnexpectedEof(usize),

    #[error("Failed to read point bake: {0}")]
    Io(#[from] io::Error),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl From<ResolveError> for ExportError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Input(e) => ExportError::Input(e),
            ResolveError::Host(e) => ExportError::Host(e),
        }
    }
}

impl From<ResolveError> for DecodeError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Input(e) => DecodeError::Input(e),
            ResolveError::Host(e) => DecodeError::Host(e),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for DecodeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DecodeError::Xml(err.into())
    }
}
