//! A bridge between a mesh owner and **Ministry of Flat**, an external automatic UV unwrapper.
//!
//! Each target mesh is exported to OBJ, handed to `UnWrapConsole3.exe`, re-imported, and the
//! processed copy is reconciled with the original: UV layers, sharp edges and materials are
//! transplanted between the two without disturbing unrelated data.
//!
//! # Modules
//! - [`topology`]: verifies that two meshes line up polygon by polygon and loop by loop
//! - [`transfer`]: copies UV layers and sharp flags along a verified correspondence
//! - [`sanitize`]: loose-geometry removal, vertex welding, normal and smoothing reset
//! - [`unwrap`]: the per-mesh pipeline driving the external tool over a [`scene::Scene`]
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **hashmap**: use hashbrown for edge maps and vertex welding
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod collections;
pub mod config;
pub mod errors;
pub mod external;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod report;
pub mod sanitize;
pub mod scene;
pub mod topology;
pub mod transfer;
pub mod unwrap;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use config::{BridgeSettings, UnwrapConfig};
pub use mesh::Mesh;
pub use report::{Report, Reporter, Severity};
pub use scene::Scene;
pub use unwrap::Unwrapper;
