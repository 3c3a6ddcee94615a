//! Interchange with the external unwrapper.

pub mod obj;

pub use obj::{read_obj, to_obj_string, write_obj};

/// Generic I/O and format‑conversion errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),

    /// Error bubbled up from `tobj` while reading an OBJ file.
    #[error("OBJ loading error in {}: {source}", .path.display())]
    ObjLoad {
        path: std::path::PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Input is malformed: {0}")]
    MalformedInput(String),
    #[error("The path is malformed: {0}")]
    MalformedPath(String),
}
