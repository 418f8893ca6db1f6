//! Densification of a single-hemisphere grid file into the template's full
//! column space with Connectome Workbench (`wb_command`).

use log::{error, info};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ConvertError, ConvertResult};
use crate::util::with_replaced_suffix;

/// Suffix of the files written by the conversion.
pub const DSCALAR_SUFFIX: &str = ".dscalar.nii";
/// Suffix of the densified files.
pub const FULL_DSCALAR_SUFFIX: &str = "_Full.dscalar.nii";

/// Something that can run an external program to completion.
pub trait ToolRunner {
    /// Run `program` with `args` and wait for it. Returns the exit code,
    /// or `None` if the process was ended by a signal.
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>>;
}

/// Runs programs as child processes, inheriting the standard streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.code())
    }
}

/// Result of one densification.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DensifyOutcome {
    /// The tool succeeded and wrote this file.
    Densified(PathBuf),
    /// The tool could not run or reported failure.
    Failed,
}

impl DensifyOutcome {
    /// Whether the densification succeeded.
    pub fn is_densified(&self) -> bool {
        matches!(self, DensifyOutcome::Densified(_))
    }
}

/// Invokes `wb_command -cifti-create-dense-from-template` against a fixed
/// template.
#[derive(Debug, Clone)]
pub struct Expander<R = CommandRunner> {
    tool_path: PathBuf,
    template_path: PathBuf,
    runner: R,
}

impl Expander<CommandRunner> {
    /// An expander that spawns `tool_path` as a child process.
    pub fn new<P, Q>(tool_path: P, template_path: Q) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Expander::with_runner(tool_path, template_path, CommandRunner)
    }
}

impl<R: ToolRunner> Expander<R> {
    /// An expander that runs the tool through `runner`.
    pub fn with_runner<P, Q>(tool_path: P, template_path: Q, runner: R) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Expander {
            tool_path: tool_path.into(),
            template_path: template_path.into(),
            runner,
        }
    }

    /// The path of the densified file for a grid file:
    /// `x.dscalar.nii` becomes `x_Full.dscalar.nii`.
    pub fn full_output_path(grid_path: &Path) -> Option<PathBuf> {
        with_replaced_suffix(grid_path, DSCALAR_SUFFIX, FULL_DSCALAR_SUFFIX)
    }

    /// Densify one grid file. Failures are logged and reported through the
    /// outcome; a partially written output is left in place.
    pub fn densify(&self, grid_path: &Path) -> DensifyOutcome {
        match self.try_densify(grid_path) {
            Ok(full_path) => {
                info!(
                    "Successfully created full dscalar file: {}",
                    full_path.display()
                );
                DensifyOutcome::Densified(full_path)
            }
            Err(e) => {
                error!("Densifying {} failed: {}", grid_path.display(), e);
                DensifyOutcome::Failed
            }
        }
    }

    fn try_densify(&self, grid_path: &Path) -> ConvertResult<PathBuf> {
        let input = if grid_path.is_absolute() {
            grid_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(grid_path)
        };
        let output = Self::full_output_path(&input)
            .ok_or_else(|| ConvertError::InvalidFileName(input.clone()))?;

        let args: Vec<OsString> = vec![
            "-cifti-create-dense-from-template".into(),
            self.template_path.clone().into(),
            output.clone().into(),
            "-cifti".into(),
            input.into(),
        ];
        match self.runner.run(&self.tool_path, &args) {
            Ok(Some(0)) => Ok(output),
            Ok(Some(code)) => Err(ConvertError::ExternalTool(format!(
                "{} exited with status {}",
                self.tool_path.display(),
                code
            ))),
            Ok(None) => Err(ConvertError::ExternalTool(format!(
                "{} was terminated by a signal",
                self.tool_path.display()
            ))),
            Err(e) => Err(ConvertError::ExternalTool(format!(
                "cannot launch {}: {}",
                self.tool_path.display(),
                e
            ))),
        }
    }
}
