//! The unwrap workflow: export, run the unwrapper, import and reconcile.
//!
//! Every target goes through the [`Phase`]s in declaration order, strictly one after the
//! other. A phase returning an error stops that target (cleanup still runs); failed transfers
//! and sanitizer runs are reported as warnings and the target carries on.

use crate::config::{BridgeSettings, UnwrapConfig};
use crate::errors::{MatchError, TransferError, UnwrapError};
use crate::external::{ExternalTool, ProcessTool};
use crate::io::{read_obj, write_obj};
use crate::mesh::Mesh;
use crate::report::Reporter;
use crate::sanitize::sanitize_processed;
use crate::scene::{MeshId, ObjectId, Scene};
use crate::topology::{self, Correspondence};
use crate::transfer::{self, INTERNAL_LAYER};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rotation about X, in degrees, applied to an imported mesh that replaces the original.
pub const REPLACE_ROTATION_X: crate::float_types::Real = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Validate,
    SanitizeOriginal,
    Export,
    InvokeExternalTool,
    Import,
    TransferSharpToOriginal,
    SanitizeProcessed,
    TransferUvToOriginal,
    TransferUvToProcessed,
    ReplaceOrKeep,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::SanitizeOriginal => "sanitize original",
            Phase::Export => "export",
            Phase::InvokeExternalTool => "invoke external tool",
            Phase::Import => "import",
            Phase::TransferSharpToOriginal => "transfer sharp edges to original",
            Phase::SanitizeProcessed => "sanitize processed",
            Phase::TransferUvToOriginal => "transfer UVs to original",
            Phase::TransferUvToProcessed => "transfer UVs to processed",
            Phase::ReplaceOrKeep => "replace or keep",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// What happened to one target.
#[derive(Debug)]
pub struct TargetOutcome {
    pub object: ObjectId,
    /// Phases that ran, in order
    pub phases: Vec<Phase>,
    /// Set when the object now uses the processed mesh
    pub replaced: bool,
    /// The error that stopped this target
    pub error: Option<UnwrapError>,
}

impl TargetOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Interchange files of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TempPaths {
    /// `<index>_<name>.obj` and `<index>_<name>_unpacked.obj` in `dir`, with `name` reduced to
    /// file-name-safe characters
    pub fn new(dir: &Path, index: usize, name: &str) -> Self {
        let stem: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        TempPaths {
            input: dir.join(format!("{index}_{stem}.obj")),
            output: dir.join(format!("{index}_{stem}_unpacked.obj")),
        }
    }
}

pub struct Unwrapper<T: ExternalTool = ProcessTool> {
    config: UnwrapConfig,
    settings: BridgeSettings,
    tool: T,
}

impl Unwrapper<ProcessTool> {
    pub fn new(config: UnwrapConfig, settings: BridgeSettings) -> Self {
        Self::with_tool(config, settings, ProcessTool)
    }
}

impl<T: ExternalTool> Unwrapper<T> {
    pub fn with_tool(config: UnwrapConfig, settings: BridgeSettings, tool: T) -> Self {
        Unwrapper {
            config,
            settings,
            tool,
        }
    }

    pub fn config(&self) -> &UnwrapConfig {
        &self.config
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Unwrap every target that has mesh data, one after the other.
    ///
    /// Fails before touching anything when the configuration is out of range, the executable
    /// is missing or no target has a mesh; each of those is also reported as an error.
    /// Otherwise returns one outcome per eligible target and reports progress after each.
    pub fn run(
        &self,
        scene: &mut Scene,
        targets: &[ObjectId],
        reporter: &mut dyn Reporter,
    ) -> Result<Vec<TargetOutcome>, UnwrapError> {
        let executable = self.preflight(scene, targets).inspect_err(|err| {
            reporter.error(&err.to_string());
        })?;

        let eligible: Vec<ObjectId> = targets
            .iter()
            .copied()
            .filter(|&id| scene.object_mesh(id).is_some())
            .collect();
        let total = eligible.len();
        tracing::info!(targets = total, executable = %executable.display(), "starting unwrap");

        let mut outcomes = Vec::with_capacity(total);
        for (index, object) in eligible.into_iter().enumerate() {
            let outcome = self.process(scene, index, object, &executable, reporter);
            outcomes.push(outcome);
            reporter.progress(index + 1, total);
        }
        Ok(outcomes)
    }

    fn preflight(&self, scene: &Scene, targets: &[ObjectId]) -> Result<PathBuf, UnwrapError> {
        self.config.validate()?;
        let executable = self.settings.locate_executable()?;
        if !targets.iter().any(|&id| scene.object_mesh(id).is_some()) {
            return Err(UnwrapError::NoEligibleInput);
        }
        Ok(executable)
    }

    fn process(
        &self,
        scene: &mut Scene,
        index: usize,
        object: ObjectId,
        executable: &Path,
        reporter: &mut dyn Reporter,
    ) -> TargetOutcome {
        let name = scene
            .object(object)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        let span = tracing::info_span!("unwrap", object = %name, index);
        let _guard = span.enter();

        let paths = TempPaths::new(&self.settings.temp_dir, index, &name);
        let mut phases = Vec::new();
        let result = self.pipeline(scene, object, &paths, executable, &mut phases, reporter);

        phases.push(Phase::Cleanup);
        for path in [&paths.input, &paths.output] {
            match std::fs::remove_file(path) {
                Ok(()) => {},
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
                Err(err) => {
                    reporter.warning(&format!("could not remove {}: {err}", path.display()));
                },
            }
        }

        let (replaced, error) = match result {
            Ok(replaced) => {
                reporter.info(&format!("{name}: unwrapped"));
                (replaced, None)
            },
            Err(err) => {
                reporter.error(&format!("{name}: {err}"));
                (false, Some(err))
            },
        };
        TargetOutcome {
            object,
            phases,
            replaced,
            error,
        }
    }

    /// Everything up to and including [`Phase::ReplaceOrKeep`]. Returns whether the object's
    /// mesh was replaced.
    fn pipeline(
        &self,
        scene: &mut Scene,
        object: ObjectId,
        paths: &TempPaths,
        executable: &Path,
        phases: &mut Vec<Phase>,
        reporter: &mut dyn Reporter,
    ) -> Result<bool, UnwrapError> {
        let config = &self.config;

        phases.push(Phase::Validate);
        let mesh_id = scene
            .object(object)
            .and_then(|o| o.mesh)
            .ok_or(UnwrapError::NoEligibleInput)?;
        let original = scene.mesh_mut(mesh_id).ok_or(UnwrapError::NoEligibleInput)?;
        original.validate()?;

        if config.sanitize_original {
            phases.push(Phase::SanitizeOriginal);
            if let Err(err) = config.sanitize_params().apply(original) {
                reporter.warning(&format!("{}: not sanitized: {err}", original.name));
            }
        }

        phases.push(Phase::Export);
        write_obj(original, &paths.input)?;

        phases.push(Phase::InvokeExternalTool);
        self.tool.run(
            executable,
            &paths.input,
            &paths.output,
            &config.tool_arguments(),
        )?;

        phases.push(Phase::Import);
        let mut processed = read_obj(&paths.output, &format!("{}_unpacked", original.name))?;
        if processed.uv_layers.promote_active(INTERNAL_LAYER).is_none() {
            reporter.warning(&format!("{}: unwrapper output has no UV layer", original.name));
        }
        let aligned = self.align(original, &mut processed);

        if config.copy_processed_sharps {
            phases.push(Phase::TransferSharpToOriginal);
            match topology::match_edges(&processed, original) {
                Ok(edges) => {
                    let hits = transfer::transfer_sharp_edges(original, &edges);
                    tracing::debug!(hits, "copied sharp edges to original");
                },
                Err(err) => reporter.warning(&format!(
                    "sharp edges not copied to '{}': {err}",
                    original.name
                )),
            }
        }

        if config.sanitize_processed {
            phases.push(Phase::SanitizeProcessed);
            sanitize_processed(&mut processed);
        }

        if config.copy_processed_uvs {
            phases.push(Phase::TransferUvToOriginal);
            let copied = aligned
                .as_ref()
                .map_err(|err| TransferError::from(err.clone()))
                .and_then(|c| {
                    transfer::transfer_uv(
                        &processed,
                        INTERNAL_LAYER,
                        original,
                        &c.reversed(),
                        INTERNAL_LAYER,
                    )
                });
            match copied {
                Ok(index) => original.uv_layers.set_active(index),
                Err(err) => reporter.warning(&format!(
                    "unwrapped UVs not copied to '{}': {err}",
                    original.name
                )),
            }
        }

        if config.copy_source_uvs {
            phases.push(Phase::TransferUvToProcessed);
            let copied = aligned
                .as_ref()
                .map_err(|err| TransferError::from(err.clone()))
                .and_then(|c| transfer::transfer_uv_layers(original, &mut processed, c));
            match copied {
                Ok(layers) => {
                    transfer::move_layer_to_end(&mut processed, INTERNAL_LAYER);
                    tracing::debug!(layers = layers.len(), "copied source UVs to processed");
                },
                Err(err) => reporter.warning(&format!(
                    "source UVs of '{}' not copied: {err}",
                    original.name
                )),
            }
        }

        phases.push(Phase::ReplaceOrKeep);
        if config.replace_original {
            processed.rotate_x(REPLACE_ROTATION_X);
            processed.materials.clone_from(&original.materials);
            replace_mesh(scene, object, mesh_id, processed);
            Ok(true)
        } else {
            tracing::debug!(mesh = %processed.name, "discarding processed mesh");
            Ok(false)
        }
    }

    /// Align `processed` to `original` polygon by polygon, renumbering its vertices to match
    /// when the loops allow it.
    fn align(&self, original: &Mesh, processed: &mut Mesh) -> Result<Correspondence, MatchError> {
        let correspondence = topology::match_polygons(original, processed)?;
        if let Some(tolerance) = self.config.centroid_tolerance {
            topology::verify_centroids(original, processed, &correspondence, tolerance)?;
        }
        if let Some(map) = topology::vertex_map(original, processed, &correspondence) {
            if let Err(err) = processed.renumber_vertices(&map) {
                tracing::warn!(%err, "vertex renumbering failed");
            }
        }
        Ok(correspondence)
    }
}

/// Make `object` use `processed` and drop the mesh it used before if nothing else does.
fn replace_mesh(scene: &mut Scene, object: ObjectId, old: MeshId, processed: Mesh) {
    let new = scene.add_mesh(processed);
    if let Some(o) = scene.object_mut(object) {
        o.mesh = Some(new);
    }
    if scene.remove_mesh_if_unused(old) {
        tracing::debug!(?old, "removed original mesh");
    }
}
