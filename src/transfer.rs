//! Copy UV layers and sharp-edge flags between two meshes along a verified correspondence.
//!
//! Only the destination is ever mutated, and only additively for UVs: every copy lands in a
//! freshly appended layer.

use crate::errors::{MatchError, TransferError};
use crate::mesh::Mesh;
use crate::topology::{Correspondence, EdgeCorrespondence};

/// Name of the layer holding the unwrapper's result.
///
/// Layers whose name contains it are never copied as a source, so a second run does not
/// duplicate derived data.
pub const INTERNAL_LAYER: &str = "mof_uv_layer";

#[inline]
pub fn is_internal_layer(name: &str) -> bool {
    name.contains(INTERNAL_LAYER)
}

/// Copy layer `from_layer` of `from` into a new layer `to_layer` appended to `to`.
///
/// Returns the index of the new layer. Fails without touching `to` if the named layer is
/// missing or `correspondence` does not describe the polygons and loops of both meshes.
pub fn transfer_uv(
    from: &Mesh,
    from_layer: &str,
    to: &mut Mesh,
    correspondence: &Correspondence,
    to_layer: &str,
) -> Result<usize, TransferError> {
    let source = from
        .uv_layers
        .by_name(from_layer)
        .ok_or_else(|| TransferError::MissingLayer(from_layer.to_string()))?;
    check_fit(from, to, correspondence)?;

    let loop_count = to.loop_count();
    let index = to.uv_layers.append(to_layer, loop_count);
    if let Some(target) = to.uv_layers.get_mut(index) {
        for (from_loop, to_loop) in correspondence.loop_pairs() {
            let slots = (source.data.get(from_loop), target.data.get_mut(to_loop));
            if let (Some(uv), Some(slot)) = slots {
                *slot = *uv;
            }
        }
    }
    Ok(index)
}

/// Copy every layer of `from` except the internal one onto `to`, keeping names.
///
/// Returns the indices of the new layers on `to`.
pub fn transfer_uv_layers(
    from: &Mesh,
    to: &mut Mesh,
    correspondence: &Correspondence,
) -> Result<Vec<usize>, TransferError> {
    check_fit(from, to, correspondence)?;
    let names: Vec<&str> = from
        .uv_layers
        .iter()
        .map(|layer| layer.name.as_str())
        .filter(|name| !is_internal_layer(name))
        .collect();

    names
        .into_iter()
        .map(|name| transfer_uv(from, name, to, correspondence, name))
        .collect()
}

/// Overwrite the sharp flag of every edge of `to` whose canonical key the source knows.
///
/// Edges the source does not have keep their flag. Returns the number of edges looked up
/// successfully.
pub fn transfer_sharp_edges(to: &mut Mesh, edges: &EdgeCorrespondence) -> usize {
    let mut hits = 0;
    for edge in &mut to.edges {
        if let Some(sharp) = edges.sharp(edge.key()) {
            edge.sharp = sharp;
            hits += 1;
        }
    }
    hits
}

/// Move the first layer named `name` to the end of `mesh`'s layer list, content unchanged.
///
/// Returns its new index, or `None` if there is no such layer.
pub fn move_layer_to_end(mesh: &mut Mesh, name: &str) -> Option<usize> {
    let index = mesh.uv_layers.find(name)?;
    mesh.uv_layers.move_to_end(index);
    Some(mesh.uv_layers.len() - 1)
}

fn check_fit(from: &Mesh, to: &Mesh, correspondence: &Correspondence) -> Result<(), TransferError> {
    for count in [from.polygons.len(), to.polygons.len()] {
        if count != correspondence.len() {
            return Err(MatchError::PolygonCountMismatch {
                from: from.polygons.len(),
                to: to.polygons.len(),
            }
            .into());
        }
    }

    let polygons = from.polygons.iter().zip(&to.polygons);
    for (polygon, ((a, b), (from_loops, to_loops))) in
        polygons.zip(correspondence.polygon_pairs()).enumerate()
    {
        if a.loop_total != b.loop_total {
            return Err(MatchError::LoopCountMismatch {
                polygon,
                from: a.loop_total,
                to: b.loop_total,
            }
            .into());
        }
        if *from_loops != a.loop_indices() || *to_loops != b.loop_indices() {
            return Err(TransferError::StaleCorrespondence { polygon });
        }
    }
    Ok(())
}
