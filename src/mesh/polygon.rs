use crate::float_types::Real;
use nalgebra::{Point3, Vector3};
use std::ops::Range;

/// A polygon, defined by a contiguous run of loops in the mesh's loop array.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Index of the polygon's first loop
    pub loop_start: usize,

    /// Number of loops (and corners) of the polygon
    pub loop_total: usize,

    /// Slot in the mesh's material list
    pub material_index: usize,

    /// Smooth (interpolated) or flat shading
    pub smooth: bool,

    /// Face normal, recomputed by [`Mesh::compute_normals`](super::Mesh::compute_normals)
    pub normal: Vector3<Real>,
}

impl Polygon {
    pub const fn new(loop_start: usize, loop_total: usize) -> Self {
        Polygon {
            loop_start,
            loop_total,
            material_index: 0,
            smooth: false,
            normal: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    /// Indices of this polygon's loops, in winding order
    #[inline]
    pub const fn loop_indices(&self) -> Range<usize> {
        self.loop_start..self.loop_start + self.loop_total
    }

    #[inline]
    pub const fn loop_end(&self) -> usize {
        self.loop_start + self.loop_total
    }
}

/// Newell's method: robust normal for planar and slightly non-planar polygons.
///
/// Returns the zero vector for degenerate input.
pub fn newell_normal(points: &[Point3<Real>]) -> Vector3<Real> {
    let n = points.len();
    if n < 3 {
        return Vector3::zeros();
    }

    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = points[i];
        let next = points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Arithmetic mean of the corner positions.
pub fn centroid(points: &[Point3<Real>]) -> Point3<Real> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum: Vector3<Real> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as Real)
}
