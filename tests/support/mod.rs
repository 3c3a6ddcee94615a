//! Test support library
//! Provides mesh builders, a scripted stand-in for the unwrapper and a few helpers.
#![allow(dead_code)]

use autouv_bridge::{
    BridgeSettings,
    config::EXECUTABLE_NAME,
    errors::UnwrapError,
    external::ExternalTool,
    float_types::Real,
    io::{read_obj, write_obj},
    mesh::{Mesh, UvLayer},
};
use nalgebra::{Point2, Point3};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Returns the bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]` of a mesh.
pub fn bounding_box(mesh: &Mesh) -> [Real; 6] {
    let mut bb = [
        Real::MAX,
        Real::MAX,
        Real::MAX,
        Real::MIN,
        Real::MIN,
        Real::MIN,
    ];
    for v in &mesh.vertices {
        let p = v.pos;
        bb[0] = bb[0].min(p.x);
        bb[1] = bb[1].min(p.y);
        bb[2] = bb[2].min(p.z);
        bb[3] = bb[3].max(p.x);
        bb[4] = bb[4].max(p.y);
        bb[5] = bb[5].max(p.z);
    }
    bb
}

/// `nx` by `ny` unit quads in the XY plane, rows of vertices along X.
pub fn grid(name: &str, nx: usize, ny: usize) -> Mesh {
    let mut points = Vec::new();
    for j in 0..=ny {
        for i in 0..=nx {
            points.push(Point3::new(i as Real, j as Real, 0.0));
        }
    }
    let row = nx + 1;
    let mut faces = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let a = j * row + i;
            faces.push(vec![a, a + 1, a + row + 1, a + row]);
        }
    }
    Mesh::from_polygons(name, &points, &faces).expect("valid grid")
}

/// Closed unit cube with outward facing quads.
pub fn cube(name: &str) -> Mesh {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = [
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![1, 2, 6, 5],
        vec![2, 3, 7, 6],
        vec![3, 0, 4, 7],
    ];
    Mesh::from_polygons(name, &points, &faces).expect("valid cube")
}

/// Append a layer named `name` whose loop `l` holds `uv(l)`.
pub fn add_uv_layer(mesh: &mut Mesh, name: &str, uv: impl Fn(usize) -> Point2<Real>) -> usize {
    let mut layer = UvLayer::new(name, mesh.loop_count());
    for (l, slot) in layer.data.iter_mut().enumerate() {
        *slot = uv(l);
    }
    mesh.uv_layers.push(layer)
}

/// What the scripted unwrapper does with its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    /// Write the input back with a fresh `UVMap` layer, loop `l` at `(l / 100, 0.5)`
    Unwrap,
    /// Like `Unwrap`, plus one extra triangle
    AddPolygon,
    /// Like `Unwrap`, with the polygons written in reverse order
    ReversePolygons,
    /// Like `Unwrap`, then swaps the input file for a directory of the same name
    InputAsDirectory,
    /// Exit with this status and write nothing
    Fail(i32),
    /// Report success without writing anything
    NoOutput,
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub executable: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub args: Vec<String>,
}

/// Stand-in for the unwrapper: reads the exported OBJ with the crate's own reader and writes
/// a scripted result.
#[derive(Debug)]
pub struct FakeTool {
    pub behavior: Behavior,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeTool {
    pub fn new(behavior: Behavior) -> Self {
        FakeTool {
            behavior,
            calls: RefCell::new(Vec::new()),
        }
    }
}

/// UV the scripted unwrapper gives loop `l`.
pub fn unwrapped_uv(l: usize) -> Point2<Real> {
    Point2::new(l as Real / 100.0, 0.5)
}

impl ExternalTool for FakeTool {
    fn run(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<(), UnwrapError> {
        self.calls.borrow_mut().push(Call {
            executable: executable.to_path_buf(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            args: args.to_vec(),
        });

        match self.behavior {
            Behavior::Fail(code) => Err(UnwrapError::ExternalToolFailed { code: Some(code) }),
            Behavior::NoOutput => Ok(()),
            behavior => {
                let mut mesh = read_obj(input, "unwrapped")?;
                let mut faces: Vec<Vec<usize>> = mesh
                    .polygons
                    .iter()
                    .map(|p| mesh.polygon_vertices(p).collect())
                    .collect();
                match behavior {
                    Behavior::AddPolygon => faces.push(vec![0, 1, 2]),
                    Behavior::ReversePolygons => faces.reverse(),
                    _ => {},
                }
                let points: Vec<_> = mesh.vertices.iter().map(|v| v.pos).collect();
                mesh = Mesh::from_polygons("unwrapped", &points, &faces).expect("valid mesh");
                add_uv_layer(&mut mesh, "UVMap", unwrapped_uv);
                write_obj(&mesh, output)?;

                if behavior == Behavior::InputAsDirectory {
                    std::fs::remove_file(input).expect("input removed");
                    std::fs::create_dir(input).expect("directory in its place");
                }
                Ok(())
            },
        }
    }
}

/// A tool directory holding an empty stand-in executable, and a directory for temp files.
pub struct Workspace {
    pub tool_dir: tempfile::TempDir,
    pub temp_dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let tool_dir = tempfile::tempdir().expect("tool dir");
        std::fs::write(tool_dir.path().join(EXECUTABLE_NAME), b"").expect("stand-in executable");
        Workspace {
            tool_dir,
            temp_dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings::new(self.tool_dir.path()).with_temp_dir(self.temp_dir.path())
    }

    /// Files left in the temp dir
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
