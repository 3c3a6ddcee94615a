//! Correspondence between an original mesh and its re-imported copy.
//!
//! The external unwrapper is expected to keep polygon order and the loop order inside each
//! polygon, so polygon and loop alignment is positional: this module *verifies* that the
//! counts line up rather than searching for a matching. Edges are matched by their canonical
//! endpoint pair instead, since the tool is free to renumber them.

use crate::collections::HashMap;
use crate::errors::MatchError;
use crate::float_types::Real;
use crate::mesh::{EdgeKey, Mesh};
use std::ops::Range;

/// Positional polygon/loop alignment between two meshes.
///
/// Only obtainable through [`match_polygons`], so holding one means polygon counts and every
/// per-polygon loop count agreed when it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correspondence {
    /// Loop ranges of each polygon pair, `(from, to)`
    pairs: Vec<(Range<usize>, Range<usize>)>,
}

impl Correspondence {
    /// Number of matched polygon pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Loop ranges `(from, to)` of every matched polygon pair
    pub fn polygon_pairs(&self) -> &[(Range<usize>, Range<usize>)] {
        &self.pairs
    }

    /// Every matched `(from_loop, to_loop)` pair, polygon after polygon
    pub fn loop_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs
            .iter()
            .flat_map(|(from, to)| from.clone().zip(to.clone()))
    }

    /// Number of matched loops
    pub fn loop_count(&self) -> usize {
        self.pairs.iter().map(|(from, _)| from.len()).sum()
    }

    /// Swap the roles of the two meshes
    pub fn reversed(&self) -> Correspondence {
        Correspondence {
            pairs: self
                .pairs
                .iter()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect(),
        }
    }
}

/// Sharp flags of one mesh keyed by canonical edge, for lookup from another mesh.
#[derive(Debug, Clone, Default)]
pub struct EdgeCorrespondence {
    sharp: HashMap<EdgeKey, bool>,
}

impl EdgeCorrespondence {
    /// Sharp flag of the edge with key `key`, if the source mesh has such an edge
    pub fn sharp(&self, key: EdgeKey) -> Option<bool> {
        self.sharp.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.sharp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sharp.is_empty()
    }
}

/// Align the polygons and loops of `from` and `to` by position.
///
/// Fails with [`MatchError::PolygonCountMismatch`] when the polygon counts differ and with
/// [`MatchError::LoopCountMismatch`] naming the first polygon whose loop counts differ.
pub fn match_polygons(from: &Mesh, to: &Mesh) -> Result<Correspondence, MatchError> {
    if from.polygons.len() != to.polygons.len() {
        return Err(MatchError::PolygonCountMismatch {
            from: from.polygons.len(),
            to: to.polygons.len(),
        });
    }

    from.polygons
        .iter()
        .zip(&to.polygons)
        .enumerate()
        .map(|(polygon, (a, b))| {
            if a.loop_total == b.loop_total {
                Ok((a.loop_indices(), b.loop_indices()))
            } else {
                Err(MatchError::LoopCountMismatch {
                    polygon,
                    from: a.loop_total,
                    to: b.loop_total,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|pairs| Correspondence { pairs })
}

/// Key the sharp flags of `from` by canonical edge.
///
/// The edge counts of both meshes must agree; that is only a cheap sanity check, keys that
/// do not exist in `from` are simply absent from the result.
pub fn match_edges(from: &Mesh, to: &Mesh) -> Result<EdgeCorrespondence, MatchError> {
    if from.edges.len() != to.edges.len() {
        return Err(MatchError::EdgeCountMismatch {
            from: from.edges.len(),
            to: to.edges.len(),
        });
    }

    Ok(EdgeCorrespondence {
        sharp: from.edges.iter().map(|e| (e.key(), e.sharp)).collect(),
    })
}

/// For every vertex of `to`, the vertex of `from` that the aligned loops put in its place.
///
/// `None` when the vertex counts differ or the loops disagree, e.g. when the other side split
/// or welded vertices. Renumbering `to` with the result makes edge keys comparable across
/// both meshes.
pub fn vertex_map(from: &Mesh, to: &Mesh, correspondence: &Correspondence) -> Option<Vec<usize>> {
    if from.vertices.len() != to.vertices.len() {
        return None;
    }
    let mut map: Vec<Option<usize>> = vec![None; to.vertices.len()];
    let mut taken = vec![false; from.vertices.len()];
    for (from_loop, to_loop) in correspondence.loop_pairs() {
        let source = from.loops.get(from_loop)?.vertex;
        let target = to.loops.get(to_loop)?.vertex;
        match map.get(target).copied()? {
            Some(known) if known != source => return None,
            Some(_) => {},
            None => {
                if std::mem::replace(taken.get_mut(source)?, true) {
                    return None;
                }
                map[target] = Some(source);
            },
        }
    }
    map.into_iter().collect()
}

/// Optional geometric check on top of [`match_polygons`]: every aligned polygon pair must
/// have centroids within `tolerance` of each other.
///
/// This catches a tool that reorders polygons while keeping the counts intact, which the
/// count checks alone cannot see. Returns the first offending pair.
pub fn verify_centroids(
    from: &Mesh,
    to: &Mesh,
    correspondence: &Correspondence,
    tolerance: Real,
) -> Result<(), MatchError> {
    for (polygon, (a, b)) in from.polygons.iter().zip(&to.polygons).enumerate() {
        if polygon >= correspondence.len() {
            break;
        }
        let distance = (from.polygon_centroid(a) - to.polygon_centroid(b)).norm();
        if distance > tolerance {
            return Err(MatchError::CentroidMismatch { polygon, distance });
        }
    }
    Ok(())
}
