use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// A mesh vertex: a position plus the normal derived from the surrounding polygons.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    /// Create a new Vertex with sanitized coordinates
    #[inline]
    pub const fn new(mut pos: Point3<Real>, mut normal: Vector3<Real>) -> Self {
        // Sanitise position - const-compatible loop unrolling
        let [[x, y, z]]: &mut [[_; 3]; 1] = &mut pos.coords.data.0;
        if !x.is_finite() {
            *x = 0.0;
        }
        if !y.is_finite() {
            *y = 0.0;
        }
        if !z.is_finite() {
            *z = 0.0;
        }

        // Sanitise normal
        let [[nx, ny, nz]]: &mut [[_; 3]; 1] = &mut normal.data.0;
        if !nx.is_finite() {
            *nx = 0.0;
        }
        if !ny.is_finite() {
            *ny = 0.0;
        }
        if !nz.is_finite() {
            *nz = 0.0;
        }

        Vertex { pos, normal }
    }

    /// Vertex at `pos` with a +Z placeholder normal, until normals are recomputed
    #[inline]
    pub const fn at(pos: Point3<Real>) -> Self {
        Self::new(pos, Vector3::new(0.0, 0.0, 1.0))
    }
}
