//! `Mesh` struct: vertices, edges, loops and polygons with per-loop UV layers

use crate::collections::{Entry, HashMap};
use crate::errors::MeshError;
use crate::float_types::{Real, tolerance};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};

pub mod edge;
pub mod polygon;
pub mod uv;
pub mod vertex;

pub use edge::{Edge, EdgeKey, edge_key};
pub use polygon::Polygon;
pub use uv::{UvLayer, UvLayers};
pub use vertex::Vertex;

/// A polygon corner: references one vertex and owns the per-loop attributes stored in
/// [`UvLayers`] and [`Mesh::custom_normals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loop {
    pub vertex: usize,
}

/// A material slot entry. Only the identity matters to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Material {
    pub name: String,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Material { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,

    pub vertices: Vec<Vertex>,

    /// Unique unordered vertex pairs, including loose (wire) edges
    pub edges: Vec<Edge>,

    pub loops: Vec<Loop>,

    /// Each polygon owns the loops `loop_start..loop_start + loop_total`
    pub polygons: Vec<Polygon>,

    pub uv_layers: UvLayers,

    pub materials: Vec<Material>,

    /// Per-loop split normal overrides
    pub custom_normals: Option<Vec<Vector3<Real>>>,

    /// Maximum angle between adjacent face normals that is still shaded smooth
    pub auto_smooth_angle: Option<Real>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Mesh {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a mesh from positions and faces given as vertex index lists.
    ///
    /// Loops are laid out face after face, edges are derived in first-use order and normals
    /// are computed.
    pub fn from_polygons(
        name: impl Into<String>,
        positions: &[Point3<Real>],
        faces: &[Vec<usize>],
    ) -> Result<Self, MeshError> {
        let mut mesh = Mesh::new(name);
        mesh.vertices = positions.iter().copied().map(Vertex::at).collect();

        for (polygon, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(MeshError::DegeneratePolygon {
                    polygon,
                    loops: face.len(),
                });
            }
            let loop_start = mesh.loops.len();
            for &vertex in face {
                if vertex >= positions.len() {
                    return Err(MeshError::InvalidIndex {
                        index: vertex,
                        vertex_count: positions.len(),
                    });
                }
                mesh.loops.push(Loop { vertex });
            }
            mesh.polygons.push(Polygon::new(loop_start, face.len()));
        }

        mesh.rebuild_edges();
        mesh.compute_normals();
        Ok(mesh)
    }

    #[inline]
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Vertex indices of `polygon`, in winding order
    pub fn polygon_vertices(&self, polygon: &Polygon) -> impl Iterator<Item = usize> + '_ {
        self.loops[polygon.loop_indices()].iter().map(|l| l.vertex)
    }

    /// Corner positions of `polygon`
    pub fn polygon_points(&self, polygon: &Polygon) -> Vec<Point3<Real>> {
        self.polygon_vertices(polygon)
            .map(|v| self.vertices[v].pos)
            .collect()
    }

    /// Canonical keys of the edges bounding `polygon`
    pub fn polygon_edge_keys(&self, polygon: &Polygon) -> impl Iterator<Item = EdgeKey> + '_ {
        let corners = &self.loops[polygon.loop_indices()];
        corners
            .iter()
            .zip(corners.iter().cycle().skip(1))
            .map(|(a, b)| edge_key(a.vertex, b.vertex))
    }

    /// Centroid of `polygon`'s corners
    pub fn polygon_centroid(&self, polygon: &Polygon) -> Point3<Real> {
        polygon::centroid(&self.polygon_points(polygon))
    }

    /// Index of each edge by its canonical key
    pub fn edge_index(&self) -> HashMap<EdgeKey, usize> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect()
    }

    /// Check that every index points somewhere and per-loop data covers every loop
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        let loop_count = self.loops.len();

        for (i, polygon) in self.polygons.iter().enumerate() {
            if polygon.loop_total < 3 {
                return Err(MeshError::DegeneratePolygon {
                    polygon: i,
                    loops: polygon.loop_total,
                });
            }
            if polygon.loop_end() > loop_count {
                return Err(MeshError::LoopRange {
                    polygon: i,
                    start: polygon.loop_start,
                    end: polygon.loop_end(),
                    loop_count,
                });
            }
        }

        let loop_vertices = self.loops.iter().map(|l| l.vertex);
        let edge_vertices = self.edges.iter().flat_map(|e| e.vertices);
        if let Some(index) = loop_vertices.chain(edge_vertices).find(|&v| v >= vertex_count) {
            return Err(MeshError::InvalidIndex {
                index,
                vertex_count,
            });
        }

        for layer in self.uv_layers.iter() {
            if layer.len() != loop_count {
                return Err(MeshError::LoopDataLength {
                    name: layer.name.clone(),
                    len: layer.len(),
                    loop_count,
                });
            }
        }
        if let Some(normals) = &self.custom_normals {
            if normals.len() != loop_count {
                return Err(MeshError::LoopDataLength {
                    name: "custom normals".to_string(),
                    len: normals.len(),
                    loop_count,
                });
            }
        }
        Ok(())
    }

    /// Make the edge list consistent with the polygons.
    ///
    /// Existing edges keep their order and flags; degenerate ones are dropped and duplicates
    /// are folded into their first occurrence (sharp if any copy was sharp). Polygon edges that
    /// were missing are appended in first-use order.
    pub fn rebuild_edges(&mut self) {
        let polygon_keys: Vec<EdgeKey> = self
            .polygons
            .iter()
            .flat_map(|p| self.polygon_edge_keys(p))
            .collect();

        let mut seen: HashMap<EdgeKey, usize> = HashMap::with_capacity(polygon_keys.len());
        let mut edges: Vec<Edge> = Vec::with_capacity(self.edges.len().max(polygon_keys.len()));

        for edge in self.edges.iter().filter(|e| !e.is_degenerate()) {
            match seen.entry(edge.key()) {
                Entry::Occupied(e) => edges[*e.get()].sharp |= edge.sharp,
                Entry::Vacant(e) => {
                    e.insert(edges.len());
                    edges.push(*edge);
                },
            }
        }

        for (a, b) in polygon_keys {
            if a == b {
                continue;
            }
            if let Entry::Vacant(e) = seen.entry((a, b)) {
                e.insert(edges.len());
                edges.push(Edge::new(a, b));
            }
        }

        self.edges = edges;
    }

    /// Recompute polygon normals (Newell) and area-weighted vertex normals from the current
    /// positions. Custom normals are not touched.
    pub fn compute_normals(&mut self) {
        // polygons thinner than the coordinate tolerance get a placeholder normal and no weight
        let min_twice_area = tolerance() * tolerance();
        let face_normals: Vec<(Vector3<Real>, Real)> = self
            .polygons
            .iter()
            .map(|p| {
                let newell = polygon::newell_normal(&self.polygon_points(p));
                let twice_area = newell.norm();
                if twice_area > min_twice_area {
                    (newell / twice_area, twice_area * 0.5)
                } else {
                    (Vector3::z(), 0.0)
                }
            })
            .collect();

        self.vertices
            .iter_mut()
            .for_each(|vertex| vertex.normal = Vector3::zeros());

        for (polygon, &(normal, area)) in self.polygons.iter_mut().zip(&face_normals) {
            polygon.normal = normal;
            for l in &self.loops[polygon.loop_indices()] {
                self.vertices[l.vertex].normal += normal * area;
            }
        }

        self.vertices.iter_mut().for_each(|vertex| {
            let norm = vertex.normal.norm();
            if norm > Real::EPSILON {
                vertex.normal /= norm;
            } else {
                // Default normal for loose or degenerate cases
                vertex.normal = Vector3::z();
            }
        });
    }

    /// Apply a homogeneous transform to positions; normals use the inverse transpose.
    pub fn transform(&mut self, mat: &Matrix4<Real>) {
        let linear: Matrix3<Real> = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);

        let orient = |n: Vector3<Real>| {
            let m = normal_matrix * n;
            let len = m.norm();
            if len > Real::EPSILON { m / len } else { n }
        };

        for vertex in &mut self.vertices {
            vertex.pos = mat.transform_point(&vertex.pos);
            vertex.normal = orient(vertex.normal);
        }
        for polygon in &mut self.polygons {
            polygon.normal = orient(polygon.normal);
        }
        if let Some(normals) = &mut self.custom_normals {
            normals.iter_mut().for_each(|n| *n = orient(*n));
        }
    }

    /// Renumber vertices so that vertex `i` becomes vertex `new_index[i]`.
    ///
    /// `new_index` must be a permutation of `0..vertices.len()`; the mesh is left untouched
    /// otherwise.
    pub fn renumber_vertices(&mut self, new_index: &[usize]) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        let mut placed: Vec<Option<Vertex>> = vec![None; vertex_count];
        for (old, &new) in new_index.iter().enumerate() {
            let slot = placed.get_mut(new).filter(|slot| slot.is_none() && old < vertex_count);
            match slot {
                Some(slot) => *slot = Some(self.vertices[old]),
                None => {
                    return Err(MeshError::InvalidIndex {
                        index: new,
                        vertex_count,
                    });
                },
            }
        }
        let vertices: Option<Vec<Vertex>> = placed.into_iter().collect();
        let Some(vertices) = vertices else {
            return Err(MeshError::InvalidIndex {
                index: new_index.len(),
                vertex_count,
            });
        };

        self.vertices = vertices;
        for l in &mut self.loops {
            l.vertex = new_index[l.vertex];
        }
        for e in &mut self.edges {
            e.vertices = e.vertices.map(|v| new_index[v]);
        }
        Ok(())
    }

    /// Rotate about the X axis by `degrees` (right-handed)
    pub fn rotate_x(&mut self, degrees: Real) {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), degrees.to_radians());
        self.transform(&rotation.to_homogeneous());
    }

    /// Edge indices where smooth shading splits: sharp edges, edges without exactly two
    /// adjacent polygons, edges next to flat polygons, and (with an auto smooth angle) edges
    /// whose adjacent face normals differ by more than that angle.
    pub fn shading_boundaries(&self) -> Vec<usize> {
        let mut faces_of_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        for (face, polygon) in self.polygons.iter().enumerate() {
            for key in self.polygon_edge_keys(polygon) {
                faces_of_edge.entry(key).or_default().push(face);
            }
        }

        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| {
                if edge.sharp {
                    return true;
                }
                let Some(faces) = faces_of_edge.get(&edge.key()) else {
                    return false;
                };
                let [a, b] = faces.as_slice() else {
                    return true;
                };
                let (pa, pb) = (&self.polygons[*a], &self.polygons[*b]);
                if !pa.smooth || !pb.smooth {
                    return true;
                }
                self.auto_smooth_angle
                    .is_some_and(|limit| dihedral_angle(&pa.normal, &pb.normal) > limit)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Angle between two face normals, in radians
pub fn dihedral_angle(n1: &Vector3<Real>, n2: &Vector3<Real>) -> Real {
    let denom = n1.norm() * n2.norm();
    if denom <= Real::EPSILON {
        return 0.0;
    }
    (n1.dot(n2) / denom).clamp(-1.0, 1.0).acos()
}
