//! OBJ-backed host
//!
//! Stands in for a 3D application on the command line: an OBJ file per frame
//! is the animated mesh. [`ObjSequence`] is read when exporting,
//! [`ObjWriter`] is written when importing.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::Vec3;
use pointbake::{
    BakeSink, BakeSource, FramePoints, HostError, HostResult, InputError, MeshResolver,
    ResolveError,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Frame pattern {0:?} has no '#' placeholder for the frame number")]
    NoPlaceholder(String),
}

/// File name pattern with a run of `#` standing for the frame number,
/// e.g. `shark.####.obj` -> `shark.0012.obj`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    prefix: String,
    width: usize,
    suffix: String,
}

impl FramePattern {
    /// Parse `pattern`. The last run of `#` is the placeholder.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let end = pattern
            .rfind('#')
            .ok_or_else(|| PatternError::NoPlaceholder(pattern.to_string()))?
            + 1;
        let start = pattern[..end].trim_end_matches('#').len();
        Ok(Self {
            prefix: pattern[..start].to_string(),
            width: end - start,
            suffix: pattern[end..].to_string(),
        })
    }

    pub fn path(&self, frame: i32) -> PathBuf {
        PathBuf::from(format!(
            "{}{:0width$}{}",
            self.prefix,
            frame,
            self.suffix,
            width = self.width
        ))
    }
}

fn parse_vertex(parts: &[&str]) -> Vec3 {
    let x: f32 = parts[1].parse().unwrap_or(0.0);
    let y: f32 = parts[2].parse().unwrap_or(0.0);
    let z: f32 = parts[3].parse().unwrap_or(0.0);
    Vec3::new(x, y, z)
}

/// Vertex positions (`v` lines) of an OBJ file, in file order
pub fn read_positions(path: &Path) -> io::Result<Vec<Vec3>> {
    let reader = BufReader::new(File::open(path)?);
    let mut positions = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 4 && parts[0] == "v" {
            positions.push(parse_vertex(&parts));
        }
    }
    Ok(positions)
}

/// Load the first frame of a sequence or a template, mapping failures to
/// the resolve errors an application reports for a bad mesh
fn resolve_obj(path: &Path) -> Result<Vec<Vec3>, ResolveError> {
    if !path.exists() {
        return Err(InputError::MeshNotFound(path.display().to_string()).into());
    }
    let positions = read_positions(path).map_err(HostError::from)?;
    if positions.is_empty() {
        return Err(InputError::NotAMesh(path.display().to_string()).into());
    }
    Ok(positions)
}

/// Resolved OBJ mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjMesh {
    pub vertex_count: usize,
}

/// One OBJ file per frame, read as world-space positions
pub struct ObjSequence {
    pattern: FramePattern,
    first_frame: i32,
    /// Positions of the frame the time cursor is on
    loaded: Option<(i32, Vec<Vec3>)>,
}

impl ObjSequence {
    /// Sequence whose mesh is resolved from `first_frame`
    pub fn new(pattern: FramePattern, first_frame: i32) -> Self {
        Self {
            pattern,
            first_frame,
            loaded: None,
        }
    }

    fn load_frame(&mut self, frame: i32) -> HostResult<&[Vec3]> {
        if !matches!(&self.loaded, Some((f, _)) if *f == frame) {
            let path = self.pattern.path(frame);
            let positions = read_positions(&path).map_err(|e| {
                HostError::msg(format!("Failed to read frame {}: {:?}: {}", frame, path, e))
            })?;
            self.loaded = Some((frame, positions));
        }
        match &self.loaded {
            Some((_, positions)) => Ok(positions.as_slice()),
            None => Err(HostError::msg(format!("Frame {} not loaded", frame))),
        }
    }
}

impl MeshResolver for ObjSequence {
    type Mesh = ObjMesh;

    fn resolve_mesh(&mut self, _identifier: &str) -> Result<ObjMesh, ResolveError> {
        let positions = resolve_obj(&self.pattern.path(self.first_frame))?;
        let mesh = ObjMesh {
            vertex_count: positions.len(),
        };
        self.loaded = Some((self.first_frame, positions));
        Ok(mesh)
    }
}

impl BakeSource for ObjSequence {
    fn vertex_count(&self, mesh: &ObjMesh) -> HostResult<usize> {
        Ok(mesh.vertex_count)
    }

    fn world_position(&mut self, _mesh: &ObjMesh, vertex: usize, frame: i32) -> HostResult<Vec3> {
        let positions = self.load_frame(frame)?;
        positions.get(vertex).copied().ok_or_else(|| {
            HostError::msg(format!(
                "Frame {} has {} vertices, vertex {} requested",
                frame,
                positions.len(),
                vertex
            ))
        })
    }

    fn set_current_time(&mut self, frame: i32) -> HostResult<()> {
        let expected = self.loaded.as_ref().map(|(_, p)| p.len());
        let count = self.load_frame(frame)?.len();
        if expected.is_some_and(|n| n != count) {
            tracing::warn!(
                "Frame {} has {} vertices, previous frame had {:?}",
                frame,
                count,
                expected
            );
        }
        Ok(())
    }
}

/// Template OBJ: all lines kept verbatim except the `v` lines
#[derive(Debug, Clone)]
struct Template {
    lines: Vec<String>,
    /// Indices into `lines` of the `v` lines, in vertex order
    vertex_lines: Vec<usize>,
}

impl Template {
    fn load(path: &Path) -> Result<(Self, Vec<Vec3>), ResolveError> {
        resolve_obj(path)?;
        let reader = BufReader::new(File::open(path).map_err(HostError::from)?);

        let mut lines = Vec::new();
        let mut vertex_lines = Vec::new();
        let mut positions = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(HostError::from)?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 && parts[0] == "v" {
                vertex_lines.push(lines.len());
                positions.push(parse_vertex(&parts));
            }
            lines.push(line);
        }
        Ok((Self { lines, vertex_lines }, positions))
    }

    fn write(&self, out: &mut impl Write, positions: &[Vec3]) -> io::Result<()> {
        let mut vertices = self.vertex_lines.iter().zip(positions).peekable();
        for (i, line) in self.lines.iter().enumerate() {
            match vertices.peek() {
                Some(&(&v, p)) if v == i => {
                    writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
                    vertices.next();
                }
                _ => writeln!(out, "{}", line)?,
            }
        }
        Ok(())
    }
}

/// Writes one OBJ per imported frame, based on a template mesh
pub struct ObjWriter {
    template_path: PathBuf,
    output: FramePattern,
    template: Option<Template>,
    /// Current mesh state; vertices absent from a frame keep their position
    positions: Vec<Vec3>,
    range: Option<(i32, i32)>,
    written: Vec<PathBuf>,
}

impl ObjWriter {
    pub fn new(template_path: impl Into<PathBuf>, output: FramePattern) -> Self {
        Self {
            template_path: template_path.into(),
            output,
            template: None,
            positions: Vec::new(),
            range: None,
            written: Vec::new(),
        }
    }

    /// Files written so far, in frame order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Animation range announced by the bake
    pub fn range(&self) -> Option<(i32, i32)> {
        self.range
    }
}

impl MeshResolver for ObjWriter {
    type Mesh = ObjMesh;

    fn resolve_mesh(&mut self, _identifier: &str) -> Result<ObjMesh, ResolveError> {
        let (template, positions) = Template::load(&self.template_path)?;
        self.template = Some(template);
        self.positions = positions;
        Ok(ObjMesh {
            vertex_count: self.positions.len(),
        })
    }
}

impl BakeSink for ObjWriter {
    fn set_animation_range(&mut self, start: i32, end: i32) -> HostResult<()> {
        self.range = Some((start, end));
        Ok(())
    }

    fn set_current_time(&mut self, _frame: i32) -> HostResult<()> {
        Ok(())
    }

    fn set_mesh_points(&mut self, mesh: &ObjMesh, points: &FramePoints) -> HostResult<()> {
        if points.len() > mesh.vertex_count {
            tracing::warn!(
                "Bake frame has {} vertices, template mesh has {}; extra vertices ignored",
                points.len(),
                mesh.vertex_count
            );
        }
        for (i, position) in points.iter() {
            if let Some(slot) = self.positions.get_mut(i) {
                *slot = position;
            }
        }
        Ok(())
    }

    fn record_keyframe(&mut self, frame: i32) -> HostResult<()> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| HostError::msg("No template mesh loaded"))?;
        let path = self.output.path(frame);
        let mut out = BufWriter::new(File::create(&path)?);
        template.write(&mut out, &self.positions)?;
        out.flush()?;
        tracing::debug!("Wrote frame {} -> {:?}", frame, path);
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "# triangle\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

    fn pattern_in(dir: &Path, pattern: &str) -> FramePattern {
        FramePattern::parse(dir.join(pattern).to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_frame_pattern() {
        let p = FramePattern::parse("cache/shark.####.obj").unwrap();
        assert_eq!(p.path(12), PathBuf::from("cache/shark.0012.obj"));
        assert_eq!(p.path(12345), PathBuf::from("cache/shark.12345.obj"));

        // Only the last run is the frame number
        let p = FramePattern::parse("take#2/f#.obj").unwrap();
        assert_eq!(p.path(7), PathBuf::from("take#2/f7.obj"));

        assert_eq!(
            FramePattern::parse("shark.obj"),
            Err(PatternError::NoPlaceholder("shark.obj".into()))
        );
    }

    #[test]
    fn test_sequence_resolve_errors() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pattern = pattern_in(dir.path(), "f.##.obj");

        let mut seq = ObjSequence::new(pattern.clone(), 0);
        assert!(matches!(
            seq.resolve_mesh("f"),
            Err(ResolveError::Input(InputError::MeshNotFound(_)))
        ));

        std::fs::write(pattern.path(0), "# no vertices\n").unwrap();
        assert!(matches!(
            seq.resolve_mesh("f"),
            Err(ResolveError::Input(InputError::NotAMesh(_)))
        ));

        std::fs::write(pattern.path(0), TRIANGLE).unwrap();
        assert_eq!(seq.resolve_mesh("f").unwrap(), ObjMesh { vertex_count: 3 });
    }

    #[test]
    fn test_sequence_reads_each_frame() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pattern = pattern_in(dir.path(), "f.##.obj");
        std::fs::write(pattern.path(0), TRIANGLE).unwrap();
        std::fs::write(pattern.path(1), "v 0 0 2\nv 1 0 2\nv 0 1 2\n").unwrap();

        let mut seq = ObjSequence::new(pattern, 0);
        let mesh = seq.resolve_mesh("f").unwrap();
        seq.set_current_time(1).unwrap();
        assert_eq!(seq.world_position(&mesh, 2, 1).unwrap(), Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(seq.world_position(&mesh, 1, 0).unwrap(), Vec3::X);
        assert!(seq.world_position(&mesh, 3, 0).is_err());
        assert!(seq.world_position(&mesh, 0, 5).is_err());
    }

    #[test]
    fn test_writer_replaces_vertex_lines_only() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let template = dir.path().join("tri.obj");
        std::fs::write(&template, TRIANGLE).unwrap();

        let mut writer = ObjWriter::new(&template, pattern_in(dir.path(), "out.###.obj"));
        let mesh = writer.resolve_mesh("tri").unwrap();

        let mut points = FramePoints::new();
        points.set(1, Vec3::new(5.0, 0.5, 0.0));
        points.set(3, Vec3::ONE);
        writer.set_mesh_points(&mesh, &points).unwrap();
        writer.record_keyframe(4).unwrap();

        let out = std::fs::read_to_string(dir.path().join("out.004.obj")).unwrap();
        assert_eq!(
            out,
            "# triangle\nv 0 0 0\nv 5 0.5 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n"
        );
        assert_eq!(writer.written().len(), 1);
    }

    #[test]
    fn test_writer_without_resolve_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut writer =
            ObjWriter::new(dir.path().join("tri.obj"), pattern_in(dir.path(), "o#.obj"));
        assert!(writer.record_keyframe(0).is_err());
        assert!(matches!(
            writer.resolve_mesh("tri"),
            Err(ResolveError::Input(InputError::MeshNotFound(_)))
        ));
    }
}
