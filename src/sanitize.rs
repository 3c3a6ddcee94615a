//! Mesh cleanup before and after the round trip through the unwrapper.
//!
//! [`sanitize`] is the full pass for the original mesh: loose geometry removal, welding by
//! distance, dropping custom normals, recomputing normals and turning on auto smooth.
//! [`sanitize_processed`] is the light pass for the imported mesh, which must keep its
//! topology exactly as the transfer step expects it.

use crate::collections::{HashMap, HashSet};
use crate::errors::SanitizeError;
use crate::float_types::{FRAC_PI_6, MERGE_DISTANCE, Real};
use crate::mesh::{EdgeKey, Mesh};
use nalgebra::Point3;

/// Parameters of the full sanitizing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizeParams {
    /// Vertices closer than this are welded together.
    /// Default: `1e-4`
    pub merge_distance: Real,

    /// Largest angle between adjacent face normals that is still shaded smooth, in radians.
    /// Default: 30°
    pub auto_smooth_angle: Real,
}

impl Default for SanitizeParams {
    fn default() -> Self {
        Self {
            merge_distance: MERGE_DISTANCE,
            auto_smooth_angle: FRAC_PI_6,
        }
    }
}

impl SanitizeParams {
    pub fn apply(&self, mesh: &mut Mesh) -> Result<SanitizeStats, SanitizeError> {
        sanitize(mesh, self.merge_distance, self.auto_smooth_angle)
    }
}

/// What a full pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub loose_vertices: usize,
    pub loose_edges: usize,
    pub merged_vertices: usize,
    pub removed_polygons: usize,
}

/// Full sanitizing pass, in this order:
///
/// 1. remove vertices and edges not used by any polygon
/// 2. weld vertices within `merge_distance` of each other
/// 3. drop custom normals
/// 4. recompute face and vertex normals
/// 5. shade smooth with `auto_smooth_angle` as the auto smooth limit
///
/// Works on a copy; `mesh` is only replaced when every step succeeded.
pub fn sanitize(
    mesh: &mut Mesh,
    merge_distance: Real,
    auto_smooth_angle: Real,
) -> Result<SanitizeStats, SanitizeError> {
    if !merge_distance.is_finite() || merge_distance < 0.0 {
        return Err(SanitizeError::InvalidDistance(merge_distance));
    }
    mesh.validate()?;

    let mut work = mesh.clone();
    let mut stats = SanitizeStats::default();

    let (loose_vertices, loose_edges) = remove_loose(&mut work);
    stats.loose_vertices += loose_vertices;
    stats.loose_edges += loose_edges;

    let (merged, removed_polygons) = merge_by_distance(&mut work, merge_distance);
    stats.merged_vertices = merged;
    stats.removed_polygons = removed_polygons;
    if work.polygons.is_empty() && !mesh.polygons.is_empty() {
        return Err(SanitizeError::Collapsed {
            distance: merge_distance,
            polygons: mesh.polygons.len(),
        });
    }

    // Polygons dropped by the weld can strand edges and vertices
    let (loose_vertices, loose_edges) = remove_loose(&mut work);
    stats.loose_vertices += loose_vertices;
    stats.loose_edges += loose_edges;

    work.custom_normals = None;
    work.compute_normals();
    work.auto_smooth_angle = Some(auto_smooth_angle);
    work.polygons.iter_mut().for_each(|p| p.smooth = true);

    tracing::debug!(mesh = %mesh.name, ?stats, "sanitized");
    *mesh = work;
    Ok(stats)
}

/// Light pass for an imported mesh: drop custom normals and clear every sharp flag.
///
/// Vertex, edge, loop and polygon counts are never changed.
pub fn sanitize_processed(mesh: &mut Mesh) {
    mesh.custom_normals = None;
    mesh.edges.iter_mut().for_each(|e| e.sharp = false);
    tracing::debug!(mesh = %mesh.name, "cleared custom normals and sharp edges");
}

/// Remove edges that bound no polygon, then vertices no loop references.
/// Returns `(vertices, edges)` removed.
fn remove_loose(mesh: &mut Mesh) -> (usize, usize) {
    let face_edges: HashSet<EdgeKey> = mesh
        .polygons
        .iter()
        .flat_map(|p| mesh.polygon_edge_keys(p))
        .collect();

    let edges_before = mesh.edges.len();
    mesh.edges.retain(|e| face_edges.contains(&e.key()));
    let loose_edges = edges_before - mesh.edges.len();

    let mut used = vec![false; mesh.vertices.len()];
    for l in &mesh.loops {
        used[l.vertex] = true;
    }
    let loose_vertices = used.iter().filter(|&&u| !u).count();
    if loose_vertices > 0 {
        let mut remap = vec![usize::MAX; mesh.vertices.len()];
        let mut next = 0;
        for (old, _) in used.iter().enumerate().filter(|(_, u)| **u) {
            remap[old] = next;
            next += 1;
        }
        let mut flags = used.iter();
        mesh.vertices
            .retain(|_| flags.next().copied().unwrap_or(false));
        remap_vertices(mesh, &remap);
    }

    (loose_vertices, loose_edges)
}

fn remap_vertices(mesh: &mut Mesh, remap: &[usize]) {
    for l in &mut mesh.loops {
        l.vertex = remap[l.vertex];
    }
    for e in &mut mesh.edges {
        e.vertices = e.vertices.map(|v| remap[v]);
    }
}

/// Weld vertices within `distance`, transitively, keeping the lowest index of each cluster
/// and its position. Collapsed loops, polygons left with fewer than three corners and
/// polygons duplicating an earlier one are removed, along with their per-loop data.
/// Returns `(vertices merged away, polygons removed)`.
fn merge_by_distance(mesh: &mut Mesh, distance: Real) -> (usize, usize) {
    let positions: Vec<Point3<Real>> = mesh.vertices.iter().map(|v| v.pos).collect();
    let mut clusters = DisjointSet::new(positions.len());
    for (a, b) in proximity_pairs(&positions, distance) {
        clusters.union(a, b);
    }

    let mut remap = vec![0; positions.len()];
    let mut keep_vertex = vec![false; positions.len()];
    let mut next = 0;
    for i in 0..positions.len() {
        let root = clusters.find(i);
        if root == i {
            keep_vertex[i] = true;
            remap[i] = next;
            next += 1;
        } else {
            // roots are always the smallest member, so already numbered
            remap[i] = remap[root];
        }
    }
    let merged = positions.len() - next;
    if merged == 0 {
        return (0, 0);
    }

    let mut flags = keep_vertex.iter();
    mesh.vertices
        .retain(|_| flags.next().copied().unwrap_or(false));
    remap_vertices(mesh, &remap);

    let mut keep_loop = vec![false; mesh.loops.len()];
    let mut polygons = Vec::with_capacity(mesh.polygons.len());
    let mut seen: HashSet<Vec<usize>> = HashSet::with_capacity(mesh.polygons.len());
    let mut loop_start = 0;

    for polygon in &mesh.polygons {
        let corners: Vec<usize> = polygon
            .loop_indices()
            .filter(|&l| {
                let prev = if l == polygon.loop_start { polygon.loop_end() - 1 } else { l - 1 };
                mesh.loops[l].vertex != mesh.loops[prev].vertex
            })
            .collect();

        let mut signature: Vec<usize> = corners.iter().map(|&l| mesh.loops[l].vertex).collect();
        signature.sort_unstable();
        let distinct = {
            let mut d = signature.clone();
            d.dedup();
            d.len()
        };
        if distinct < 3 || !seen.insert(signature) {
            continue;
        }

        for &l in &corners {
            keep_loop[l] = true;
        }
        let mut kept = polygon.clone();
        kept.loop_start = loop_start;
        kept.loop_total = corners.len();
        loop_start += corners.len();
        polygons.push(kept);
    }

    let removed_polygons = mesh.polygons.len() - polygons.len();
    let mut flags = keep_loop.iter();
    mesh.loops.retain(|_| flags.next().copied().unwrap_or(false));
    mesh.uv_layers.retain_loops(&keep_loop);
    if let Some(normals) = &mut mesh.custom_normals {
        let mut flags = keep_loop.iter();
        normals.retain(|_| flags.next().copied().unwrap_or(false));
    }
    mesh.polygons = polygons;
    mesh.rebuild_edges();

    (merged, removed_polygons)
}

/// All pairs `(j, i)` with `j < i` whose positions are within `distance`, found through a
/// uniform grid with cell size `distance`.
///
/// Cell indices saturate at the `i64` range. Far-out points then share the outermost cells
/// and the exact distance test decides.
fn proximity_pairs(positions: &[Point3<Real>], distance: Real) -> Vec<(usize, usize)> {
    let cell = if distance > 0.0 { distance } else { 1.0 };
    let limit = distance * distance;
    let cell_of = |p: &Point3<Real>| {
        (
            (p.x / cell).floor() as i64,
            (p.y / cell).floor() as i64,
            (p.z / cell).floor() as i64,
        )
    };

    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    let mut pairs = Vec::new();
    for (i, p) in positions.iter().enumerate() {
        let (cx, cy, cz) = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                    let Some(bucket) = grid.get(&key) else {
                        continue;
                    };
                    pairs.extend(
                        bucket
                            .iter()
                            .filter(|&&j| (positions[j] - p).norm_squared() <= limit)
                            .map(|&j| (j, i)),
                    );
                }
            }
        }
        grid.entry((cx, cy, cz)).or_default().push(i);
    }
    // saturated neighbours can name the same cell twice
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Union-find whose representative is always the smallest index of its set.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
