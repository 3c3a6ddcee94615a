//! Reconciliation, sanitizing, configuration and workflow errors

use crate::float_types::Real;
use crate::io::IoError;
use std::path::PathBuf;

/// Reasons two meshes cannot be aligned for an attribute transfer.
///
/// `from` counts belong to the mesh attributes are copied from, `to` counts to the mesh
/// receiving them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    /// (PolygonCountMismatch) The meshes have a different number of polygons
    #[error("(PolygonCountMismatch) source has {from} polygons, destination has {to}")]
    PolygonCountMismatch { from: usize, to: usize },
    /// (LoopCountMismatch) An aligned polygon pair has a different number of loops
    #[error(
        "(LoopCountMismatch) polygon {polygon} has {from} loops in the source and {to} in the \
         destination"
    )]
    LoopCountMismatch { polygon: usize, from: usize, to: usize },
    /// (EdgeCountMismatch) The meshes have a different number of edges
    #[error("(EdgeCountMismatch) source has {from} edges, destination has {to}")]
    EdgeCountMismatch { from: usize, to: usize },
    /// (CentroidMismatch) An aligned polygon pair sits too far apart in space
    #[error("(CentroidMismatch) polygon {polygon} centroids are {distance} apart")]
    CentroidMismatch { polygon: usize, distance: Real },
}

/// Errors raised while copying attributes between two meshes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Mismatch(#[from] MatchError),
    /// The named source UV layer does not exist
    #[error("UV layer '{0}' not found on the source mesh")]
    MissingLayer(String),
    /// The correspondence's loop ranges for a polygon pair are not the meshes' own
    #[error("correspondence does not describe the loops of polygon {polygon}")]
    StaleCorrespondence { polygon: usize },
}

/// Structural problems in a mesh's index data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// A loop or edge references a vertex that does not exist
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex { index: usize, vertex_count: usize },
    /// A polygon's loop range runs past the loop array
    #[error("polygon {polygon} spans loops {start}..{end} but the mesh has {loop_count} loops")]
    LoopRange {
        polygon: usize,
        start: usize,
        end: usize,
        loop_count: usize,
    },
    /// A polygon has fewer than three loops
    #[error("polygon {polygon} has only {loops} loops")]
    DegeneratePolygon { polygon: usize, loops: usize },
    /// A per-loop attribute does not cover every loop
    #[error("'{name}' holds {len} values for {loop_count} loops")]
    LoopDataLength {
        name: String,
        len: usize,
        loop_count: usize,
    },
}

/// Errors raised by the mesh sanitizer. The mesh is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SanitizeError {
    /// Welding would have removed every polygon
    #[error("merging vertices within {distance} collapses all {polygons} polygons")]
    Collapsed { distance: Real, polygons: usize },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// The merge distance is negative or not finite
    #[error("merge distance {0} must be finite and non-negative")]
    InvalidDistance(Real),
}

/// Out-of-range unwrap parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("resolution {0} must be a power of two between 32 and 4096")]
    Resolution(u32),
    #[error("aspect ratio {0} must lie between 0.001 and 1000")]
    AspectRatio(Real),
    #[error("UDIM count {0} must lie between 1 and 100")]
    Udims(u32),
    #[error("texture density {0} must be at least 1")]
    TextureDensity(u32),
    #[error("seam center must be finite, got {0:?}")]
    SeamCenter([Real; 3]),
}

/// Errors that stop the pipeline for one mesh.
#[derive(Debug, thiserror::Error)]
pub enum UnwrapError {
    /// The unwrapper is missing from the configured directory
    #[error("MOF executable not found at {}", .0.display())]
    ExecutableNotFound(PathBuf),
    /// Nothing in the request refers to a mesh
    #[error("no eligible mesh in the selection")]
    NoEligibleInput,
    /// The target mesh's index data is inconsistent
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
    /// The unwrapper could not be started
    #[error("failed to launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The unwrapper ran but reported failure
    #[error("external tool exited with status {code:?}")]
    ExternalToolFailed { code: Option<i32> },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
