//! Wavefront OBJ export and import.
//!
//! Export writes one `vt` per loop from the active UV layer and one `vn` per loop (custom
//! normals) or per vertex (computed normals), so faces always come out as `f v/vt/vn` or
//! `f v//vn`. Import goes through `tobj` without triangulation, which keeps the polygon and
//! loop order the transfer step relies on.

use super::IoError;
use crate::float_types::Real;
use crate::mesh::{Loop, Mesh, Polygon, UvLayer, Vertex};
use nalgebra::{Point2, Point3};
use std::fmt::Write as _;
use std::path::Path;

/// Name of the UV layer created for imported texture coordinates.
pub const IMPORTED_UV_LAYER: &str = "UVMap";

/// Export to an OBJ string.
///
/// ```rust
/// # use autouv_bridge::Mesh;
/// # use nalgebra::Point3;
/// let mesh = Mesh::from_polygons(
///     "tri",
///     &[Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     &[vec![0, 1, 2]],
/// ).unwrap();
/// let text = autouv_bridge::io::to_obj_string(&mesh);
/// assert!(text.contains("f 1//1 2//2 3//3"));
/// ```
pub fn to_obj_string(mesh: &Mesh) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# autouv-bridge");
    let _ = writeln!(out, "o {}", object_name(&mesh.name));

    for v in &mesh.vertices {
        let p = v.pos;
        let _ = writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z);
    }

    let uvs = mesh.uv_layers.active().filter(|layer| layer.len() == mesh.loop_count());
    if let Some(layer) = uvs {
        for uv in &layer.data {
            let _ = writeln!(out, "vt {:.6} {:.6}", uv.x, uv.y);
        }
    }

    let per_loop_normals = mesh
        .custom_normals
        .as_ref()
        .filter(|normals| normals.len() == mesh.loop_count());
    match per_loop_normals {
        Some(normals) => {
            for n in normals {
                let _ = writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z);
            }
        },
        None => {
            for v in &mesh.vertices {
                let n = v.normal;
                let _ = writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z);
            }
        },
    }

    let _ = writeln!(out, "s off");
    for polygon in &mesh.polygons {
        out.push('f');
        for l in polygon.loop_indices() {
            let v = mesh.loops[l].vertex + 1;
            let vn = if per_loop_normals.is_some() { l + 1 } else { v };
            if uvs.is_some() {
                let _ = write!(out, " {v}/{}/{vn}", l + 1);
            } else {
                let _ = write!(out, " {v}//{vn}");
            }
        }
        out.push('\n');
    }
    out
}

/// Write `mesh` to `path` as OBJ.
pub fn write_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    std::fs::write(path, to_obj_string(mesh))?;
    tracing::debug!(mesh = %mesh.name, path = %path.display(), "exported OBJ");
    Ok(())
}

/// Read an OBJ file into a single mesh named `name`.
///
/// All objects and groups in the file are merged. Polygons keep their arity and file order.
/// When any face carries texture coordinates the mesh gets one active layer named
/// [`IMPORTED_UV_LAYER`]; faces without them read as `(0, 0)`.
pub fn read_obj(path: impl AsRef<Path>, name: &str) -> Result<Mesh, IoError> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: false,
            triangulate: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|source| IoError::ObjLoad {
        path: path.to_path_buf(),
        source,
    })?;

    if models.iter().all(|m| m.mesh.indices.is_empty()) {
        return Err(IoError::MalformedInput(format!(
            "{} contains no faces",
            path.display()
        )));
    }

    let mut mesh = Mesh::new(name);
    let mut uvs: Vec<Point2<Real>> = Vec::new();
    let mut has_uvs = false;

    for model in &models {
        let obj = &model.mesh;
        let offset = mesh.vertices.len();
        let vertex_count = obj.positions.len() / 3;

        #[allow(clippy::unnecessary_cast)]
        mesh.vertices.extend(
            obj.positions
                .chunks_exact(3)
                .map(|c| Vertex::at(Point3::new(c[0] as Real, c[1] as Real, c[2] as Real))),
        );

        let with_uvs = !obj.texcoord_indices.is_empty()
            && obj.texcoord_indices.len() == obj.indices.len();
        has_uvs |= with_uvs;

        let arities: Vec<usize> = if obj.face_arities.is_empty() {
            vec![3; obj.indices.len() / 3]
        } else {
            obj.face_arities.iter().map(|&a| a as usize).collect()
        };

        let mut cursor = 0;
        for arity in arities {
            if arity < 3 || cursor + arity > obj.indices.len() {
                return Err(IoError::MalformedInput(format!(
                    "model '{}' has a face with {arity} corners",
                    model.name
                )));
            }
            mesh.polygons
                .push(Polygon::new(mesh.loops.len(), arity));
            for i in cursor..cursor + arity {
                let index = obj.indices[i] as usize;
                if index >= vertex_count {
                    return Err(IoError::MalformedInput(format!(
                        "model '{}' references vertex {index} of {vertex_count}",
                        model.name
                    )));
                }
                mesh.loops.push(Loop {
                    vertex: offset + index,
                });
                uvs.push(if with_uvs {
                    texcoord(&obj.texcoords, obj.texcoord_indices[i] as usize)?
                } else {
                    Point2::origin()
                });
            }
            cursor += arity;
        }
    }

    if has_uvs {
        let mut layer = UvLayer::new(IMPORTED_UV_LAYER, 0);
        layer.data = uvs;
        mesh.uv_layers.push(layer);
    }
    mesh.rebuild_edges();
    mesh.compute_normals();
    mesh.validate()
        .map_err(|err| IoError::MalformedInput(err.to_string()))?;

    tracing::debug!(
        mesh = %mesh.name,
        path = %path.display(),
        vertices = mesh.vertices.len(),
        polygons = mesh.polygons.len(),
        "imported OBJ"
    );
    Ok(mesh)
}

#[allow(clippy::unnecessary_cast)]
fn texcoord(texcoords: &[f32], index: usize) -> Result<Point2<Real>, IoError> {
    match texcoords.get(2 * index..2 * index + 2) {
        Some(&[u, v]) => Ok(Point2::new(u as Real, v as Real)),
        _ => Err(IoError::MalformedInput(format!(
            "texture coordinate {index} out of range"
        ))),
    }
}

/// OBJ object names cannot contain whitespace.
fn object_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "mesh".to_string()
    } else {
        cleaned
    }
}
