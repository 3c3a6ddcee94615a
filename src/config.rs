//! Unwrap parameters and bridge settings.
//!
//! [`UnwrapConfig`] is captured once per run and never changes while meshes are processed.
//! It both feeds the unwrapper's command line and decides which reconciliation steps run.

use crate::errors::ConfigError;
use crate::float_types::Real;
use crate::sanitize::SanitizeParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of Ministry of Flat's command-line unwrapper.
pub const EXECUTABLE_NAME: &str = "UnWrapConsole3.exe";

/// Resolutions the unwrapper accepts: powers of two from 32 to 4096.
pub const RESOLUTIONS: [u32; 8] = [32, 64, 128, 256, 512, 1024, 2048, 4096];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnwrapConfig {
    /// Texture resolution, which determines island spacing
    pub resolution: u32,
    /// Width/height ratio for non-square textures
    pub aspect_ratio: Real,
    /// Guarantee hard edges are separated for baking
    pub separate_hard_edges: bool,
    /// Use mesh normals for polygon classification
    pub use_normals: bool,
    /// Number of UDIM tiles
    pub udims: u32,
    /// Overlap identical parts in UV space
    pub overlap_identical: bool,
    /// Overlap mirrored parts in UV space
    pub overlap_mirrored: bool,
    /// Scale UVs to real-world dimensions
    pub world_scale: bool,
    /// Pixels per unit in world scale mode
    pub texture_density: u32,
    /// World-space point that orients seams
    pub seam_center: [Real; 3],

    /// Run the full sanitizer on the original mesh before exporting it
    pub sanitize_original: bool,
    /// Clear custom normals and sharp flags on the imported mesh
    pub sanitize_processed: bool,
    /// Swap the object's mesh for the processed one
    pub replace_original: bool,
    /// Copy the original's UV layers onto the processed mesh
    pub copy_source_uvs: bool,
    /// Copy the unwrapped layer back onto the original and make it the active layer
    pub copy_processed_uvs: bool,
    /// Copy sharp edges from the processed mesh onto the original
    pub copy_processed_sharps: bool,

    /// Weld distance of the full sanitizer
    pub merge_distance: Real,
    /// Auto smooth limit of the full sanitizer, in degrees
    pub auto_smooth_degrees: Real,
    /// When set, aligned polygons whose centroids are further apart than this abort UV
    /// transfers. Off by default: the unwrapper only guarantees matching counts.
    pub centroid_tolerance: Option<Real>,
}

impl Default for UnwrapConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            aspect_ratio: 1.0,
            separate_hard_edges: false,
            use_normals: false,
            udims: 1,
            overlap_identical: false,
            overlap_mirrored: false,
            world_scale: false,
            texture_density: 1024,
            seam_center: [0.0; 3],
            sanitize_original: false,
            sanitize_processed: false,
            replace_original: false,
            copy_source_uvs: false,
            copy_processed_uvs: false,
            copy_processed_sharps: false,
            merge_distance: crate::float_types::MERGE_DISTANCE,
            auto_smooth_degrees: 30.0,
            centroid_tolerance: None,
        }
    }
}

/// Boolean literal the unwrapper parses.
#[inline]
pub const fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

impl UnwrapConfig {
    /// Read a JSON configuration; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !RESOLUTIONS.contains(&self.resolution) {
            return Err(ConfigError::Resolution(self.resolution));
        }
        if !(0.001..=1000.0).contains(&self.aspect_ratio) {
            return Err(ConfigError::AspectRatio(self.aspect_ratio));
        }
        if !(1..=100).contains(&self.udims) {
            return Err(ConfigError::Udims(self.udims));
        }
        if self.texture_density < 1 {
            return Err(ConfigError::TextureDensity(self.texture_density));
        }
        if self.seam_center.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::SeamCenter(self.seam_center));
        }
        Ok(())
    }

    /// The ten positional flags following the input and output paths, one process argument
    /// per token.
    ///
    /// ```
    /// # use autouv_bridge::UnwrapConfig;
    /// let args = UnwrapConfig::default().tool_arguments();
    /// assert_eq!(args[..4], ["-separate", "False", "-resolution", "1024"]);
    /// assert_eq!(args[5], "1.000000");
    /// ```
    pub fn tool_arguments(&self) -> Vec<String> {
        let [cx, cy, cz] = self.seam_center;
        [
            ("-separate", vec![flag(self.separate_hard_edges).to_string()]),
            ("-resolution", vec![self.resolution.to_string()]),
            ("-aspect", vec![format!("{:.6}", self.aspect_ratio)]),
            ("-normals", vec![flag(self.use_normals).to_string()]),
            ("-udims", vec![self.udims.to_string()]),
            ("-overlap", vec![flag(self.overlap_identical).to_string()]),
            ("-mirror", vec![flag(self.overlap_mirrored).to_string()]),
            ("-worldscale", vec![flag(self.world_scale).to_string()]),
            ("-density", vec![self.texture_density.to_string()]),
            (
                "-center",
                vec![format!("{cx:.6}"), format!("{cy:.6}"), format!("{cz:.6}")],
            ),
        ]
        .into_iter()
        .flat_map(|(name, values)| std::iter::once(name.to_string()).chain(values))
        .collect()
    }

    pub fn sanitize_params(&self) -> SanitizeParams {
        SanitizeParams {
            merge_distance: self.merge_distance,
            auto_smooth_angle: self.auto_smooth_degrees.to_radians(),
        }
    }
}

/// Where the unwrapper lives and where interchange files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Directory containing [`EXECUTABLE_NAME`]
    pub tool_dir: PathBuf,
    /// Directory for the temporary OBJ files
    #[serde(default = "std::env::temp_dir")]
    pub temp_dir: PathBuf,
}

impl BridgeSettings {
    pub fn new(tool_dir: impl Into<PathBuf>) -> Self {
        BridgeSettings {
            tool_dir: tool_dir.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir(mut self, temp_dir: impl AsRef<Path>) -> Self {
        self.temp_dir = temp_dir.as_ref().to_path_buf();
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.tool_dir.join(EXECUTABLE_NAME)
    }
}
