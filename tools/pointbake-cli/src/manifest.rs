//! Manifest parsing and batch export
//!
//! Parses bake.toml and exports every listed OBJ sequence.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::BAKE_EXT;
use crate::obj::FramePattern;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    /// Keyed by bake name; sorted so batch output is deterministic
    #[serde(default)]
    pub bakes: BTreeMap<String, BakeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("bakes/")
}

#[derive(Debug, Deserialize)]
pub struct BakeEntry {
    /// OBJ frame pattern, e.g. `cache/shark.####.obj`
    pub frames: String,
    pub start: i32,
    /// Exclusive
    pub end: i32,
    /// Mesh name written into the bake (defaults to the entry key)
    #[serde(default)]
    pub name: Option<String>,
}

impl BakeEntry {
    pub fn mesh_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Validate a manifest without exporting anything
pub fn validate(manifest: &Manifest) -> Result<()> {
    for (name, entry) in &manifest.bakes {
        if entry.start >= entry.end {
            anyhow::bail!(
                "Bake '{}' has an empty frame range: start {} >= end {}",
                name,
                entry.start,
                entry.end
            );
        }
        let pattern = FramePattern::parse(&entry.frames)
            .with_context(|| format!("Bake '{}' has a bad frame pattern", name))?;
        let first = pattern.path(entry.start);
        if !first.exists() {
            anyhow::bail!("Bake '{}' first frame not found: {:?}", name, first);
        }
    }
    Ok(())
}

/// Export every bake in the manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<()> {
    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    for (name, entry) in &manifest.bakes {
        let output = output_dir.join(format!("{}.{}", name, BAKE_EXT));
        tracing::info!("Baking: {} -> {:?}", name, output);
        crate::convert::export_sequence(
            &entry.frames,
            &output,
            entry.start,
            entry.end,
            entry.mesh_name(name),
        )
        .with_context(|| format!("Failed to bake '{}'", name))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [output]
            dir = "out/"

            [bakes.shark]
            frames = "cache/shark.####.obj"
            start = 0
            end = 100

            [bakes.cloth]
            frames = "cache/cloth.#.obj"
            start = 10
            end = 20
            name = "clothShape1"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("out/"));
        assert_eq!(manifest.bakes.len(), 2);
        assert_eq!(manifest.bakes["shark"].mesh_name("shark"), "shark");
        assert_eq!(manifest.bakes["cloth"].mesh_name("cloth"), "clothShape1");
        assert_eq!(manifest.bakes.keys().collect::<Vec<_>>(), vec!["cloth", "shark"]);
    }

    #[test]
    fn test_default_output_dir() {
        let manifest: Manifest = toml::from_str("").unwrap();
        assert_eq!(manifest.output.dir, PathBuf::from("bakes/"));
        assert!(manifest.bakes.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let frames = dir.path().join("f.##.obj");
        let frames = frames.to_str().unwrap();

        let empty_range: Manifest = toml::from_str(&format!(
            "[bakes.a]\nframes = '{frames}'\nstart = 5\nend = 5\n"
        ))
        .unwrap();
        assert!(validate(&empty_range).is_err());

        let missing: Manifest = toml::from_str(&format!(
            "[bakes.a]\nframes = '{frames}'\nstart = 0\nend = 5\n"
        ))
        .unwrap();
        assert!(validate(&missing).is_err());

        std::fs::write(dir.path().join("f.00.obj"), "v 0 0 0\n").unwrap();
        assert!(validate(&missing).is_ok());

        let no_placeholder: Manifest =
            toml::from_str("[bakes.a]\nframes = 'f.obj'\nstart = 0\nend = 5\n").unwrap();
        assert!(validate(&no_placeholder).is_err());
    }
}
