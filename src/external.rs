//! Launching the external unwrapper.

use crate::config::{BridgeSettings, EXECUTABLE_NAME};
use crate::errors::UnwrapError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One blocking invocation of an unwrapper: `<executable> <input> <output> <args...>`.
///
/// Implementations must return only after `output` has been written or the run has failed.
pub trait ExternalTool {
    fn run(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<(), UnwrapError>;
}

/// Runs the unwrapper as a child process and waits for it.
///
/// Each flag and value is passed as its own argument, no shell is involved. A non-zero exit
/// status is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTool;

impl ExternalTool for ProcessTool {
    fn run(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<(), UnwrapError> {
        tracing::info!(
            executable = %executable.display(),
            input = %input.display(),
            output = %output.display(),
            "running unwrapper"
        );
        let status = Command::new(executable)
            .arg(input)
            .arg(output)
            .args(args)
            .status()
            .map_err(|source| UnwrapError::Launch {
                path: executable.to_path_buf(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(UnwrapError::ExternalToolFailed {
                code: status.code(),
            })
        }
    }
}

/// Path of the unwrapper inside `dir`, if it is a regular file there.
pub fn locate_executable(dir: &Path) -> Result<PathBuf, UnwrapError> {
    let path = dir.join(EXECUTABLE_NAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(UnwrapError::ExecutableNotFound(path))
    }
}

impl BridgeSettings {
    /// [`locate_executable`] in the configured tool directory
    pub fn locate_executable(&self) -> Result<PathBuf, UnwrapError> {
        locate_executable(&self.tool_dir)
    }
}
