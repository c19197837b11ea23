//! NCCA point bake wire format (.xml)
//!
//! Plain XML, one element per line, indented with one tab per nesting level.
//! Metadata always precedes the first frame.
//!
//! # Layout
//! ```text
//! <?xml version="1.0" encoding="UTF-8" ?>
//! <NCCAPointBake>
//!     <MeshName> name </MeshName>
//!     <NumVerts> int </NumVerts>
//!     <StartFrame> int </StartFrame>
//!     <EndFrame> int </EndFrame>
//!     <NumFrames> int </NumFrames>
//!     <TranslateMode> absolute </TranslateMode>
//!     <Frame number="int">
//!         <Vertex number="int" attrib="translate"> x y z </Vertex>
//!         ...
//!     </Frame>
//!     ...
//! </NCCAPointBake>
//! ```
//!
//! Whitespace around text values is insignificant.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// XML declaration written as the first line of every bake.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

/// Root element wrapping the whole document.
pub const ROOT: &str = "NCCAPointBake";

pub const MESH_NAME: &str = "MeshName";
pub const NUM_VERTS: &str = "NumVerts";
pub const START_FRAME: &str = "StartFrame";
pub const END_FRAME: &str = "EndFrame";
pub const NUM_FRAMES: &str = "NumFrames";
pub const TRANSLATE_MODE: &str = "TranslateMode";
pub const FRAME: &str = "Frame";
pub const VERTEX: &str = "Vertex";

/// Attribute carrying the frame number on `Frame` and the vertex index on `Vertex`.
pub const ATTR_NUMBER: &str = "number";

/// Attribute carrying the attribute kind on `Vertex`.
pub const ATTR_KIND: &str = "attrib";

/// The only attribute kind ever written.
pub const KIND_TRANSLATE: &str = "translate";

/// Component count of a translate sample.
pub const TRANSLATE_COMPONENTS: usize = 3;

/// Channel name used for per-vertex translate channels.
pub const TRANSLATE_CHANNEL: &str = "t";

/// Largest `NumVerts` a bake may declare.
pub const MAX_VERTS: usize = 1 << 24;

/// How vertex positions in the bake relate to the rest pose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TranslateMode {
    /// Positions are absolute world-space coordinates
    #[default]
    Absolute,
}

impl TranslateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TranslateMode::Absolute => "absolute",
        }
    }
}

impl fmt::Display for TranslateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslateMode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "absolute" => Ok(TranslateMode::Absolute),
            other => Err(DecodeError::UnknownTranslateMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_mode_text() {
        assert_eq!(TranslateMode::Absolute.to_string(), "absolute");
        assert_eq!(
            " absolute ".parse::<TranslateMode>().unwrap(),
            TranslateMode::Absolute
        );
    }

    #[test]
    fn test_translate_mode_unknown() {
        let err = "relative".parse::<TranslateMode>().unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTranslateMode(mode) if mode == "relative"));
    }
}
