//! Command-line front end for the Ministry of Flat bridge.
//!
//! # Commands
//!
//! - `autouv-bridge unwrap <OBJ>... --tool-dir <DIR>` - unwrap meshes and write the results
//! - `autouv-bridge args` - print the arguments the unwrapper would receive

use anyhow::{Context, Result, bail};
use autouv_bridge::config::EXECUTABLE_NAME;
use autouv_bridge::float_types::Real;
use autouv_bridge::io::{read_obj, write_obj};
use autouv_bridge::{BridgeSettings, Report, Scene, UnwrapConfig, Unwrapper};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autouv-bridge")]
#[command(about = "Round-trip meshes through Ministry of Flat", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unwrap OBJ meshes and write the reconciled meshes
    Unwrap {
        /// Meshes to unwrap, one scene object each
        #[arg(name = "OBJ", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory containing UnWrapConsole3.exe
        #[arg(long)]
        tool_dir: PathBuf,

        /// Directory for the interchange files (defaults to the system temp dir)
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Where the resulting meshes are written
        #[arg(long, default_value = "unwrapped")]
        out_dir: PathBuf,

        #[command(flatten)]
        options: ConfigArgs,
    },

    /// Print the command line the unwrapper would be started with
    Args {
        #[command(flatten)]
        options: ConfigArgs,
    },
}

/// Unwrap parameters: a JSON file, then individual overrides
#[derive(Args)]
struct ConfigArgs {
    /// JSON file with unwrap parameters
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    resolution: Option<u32>,

    #[arg(long)]
    aspect: Option<Real>,

    #[arg(long)]
    udims: Option<u32>,

    #[arg(long)]
    density: Option<u32>,

    /// Seam center as three coordinates
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    seam_center: Option<Vec<Real>>,

    #[arg(long)]
    separate_hard_edges: bool,

    #[arg(long)]
    use_normals: bool,

    #[arg(long)]
    overlap_identical: bool,

    #[arg(long)]
    overlap_mirrored: bool,

    #[arg(long)]
    world_scale: bool,

    #[arg(long)]
    sanitize_original: bool,

    #[arg(long)]
    sanitize_processed: bool,

    /// Replace each mesh by the unwrapper's output
    #[arg(long)]
    replace: bool,

    #[arg(long)]
    copy_source_uvs: bool,

    #[arg(long)]
    copy_processed_uvs: bool,

    #[arg(long)]
    copy_processed_sharps: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<UnwrapConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                UnwrapConfig::from_json(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            },
            None => UnwrapConfig::default(),
        };

        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(aspect) = self.aspect {
            config.aspect_ratio = aspect;
        }
        if let Some(udims) = self.udims {
            config.udims = udims;
        }
        if let Some(density) = self.density {
            config.texture_density = density;
        }
        if let Some([x, y, z]) = self.seam_center.as_deref() {
            config.seam_center = [*x, *y, *z];
        }
        config.separate_hard_edges |= self.separate_hard_edges;
        config.use_normals |= self.use_normals;
        config.overlap_identical |= self.overlap_identical;
        config.overlap_mirrored |= self.overlap_mirrored;
        config.world_scale |= self.world_scale;
        config.sanitize_original |= self.sanitize_original;
        config.sanitize_processed |= self.sanitize_processed;
        config.replace_original |= self.replace;
        config.copy_source_uvs |= self.copy_source_uvs;
        config.copy_processed_uvs |= self.copy_processed_uvs;
        config.copy_processed_sharps |= self.copy_processed_sharps;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Unwrap {
            inputs,
            tool_dir,
            temp_dir,
            out_dir,
            options,
        } => {
            let config = options.load()?;
            let mut settings = BridgeSettings::new(tool_dir);
            if let Some(temp_dir) = temp_dir {
                settings = settings.with_temp_dir(temp_dir);
            }
            unwrap(&inputs, &out_dir, config, settings)
        },
        Commands::Args { options } => {
            let config = options.load()?;
            println!(
                "{EXECUTABLE_NAME} <input.obj> <output.obj> {}",
                config.tool_arguments().join(" ")
            );
            Ok(())
        },
    }
}

fn unwrap(
    inputs: &[PathBuf],
    out_dir: &Path,
    config: UnwrapConfig,
    settings: BridgeSettings,
) -> Result<()> {
    let mut scene = Scene::new();
    let mut targets = Vec::with_capacity(inputs.len());
    for path in inputs {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_string());
        let mesh = read_obj(path, &name).with_context(|| format!("loading {}", path.display()))?;
        targets.push(scene.add_mesh_object(mesh));
    }

    let mut report = Report::new();
    let outcomes = Unwrapper::new(config, settings).run(&mut scene, &targets, &mut report)?;

    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for outcome in outcomes.iter().filter(|o| o.is_ok()) {
        let Some(object) = scene.object(outcome.object) else {
            continue;
        };
        if let Some(mesh) = scene.object_mesh(outcome.object) {
            let path = out_dir.join(format!("{}.obj", object.name));
            write_obj(mesh, &path).with_context(|| format!("writing {}", path.display()))?;
            println!("{} -> {}", object.name, path.display());
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} meshes failed", outcomes.len());
    }
    Ok(())
}
