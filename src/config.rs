//! Run configuration.

use std::path::{Path, PathBuf};

/// Everything a conversion run needs. The template is used both to map
/// ROI vertices and to densify the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Reference dense CIFTI-2 file.
    pub template_path: PathBuf,
    /// Directory scanned for `.func.gii` files.
    pub input_dir: PathBuf,
    /// Directory receiving the `.dscalar.nii` files. Created if missing.
    pub output_dir: PathBuf,
    /// The `wb_command` executable.
    pub tool_path: PathBuf,
}

impl Config {
    /// A configuration reading from and writing to the current directory.
    pub fn new<P, Q>(template_path: P, tool_path: Q) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Config {
            template_path: template_path.into(),
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            tool_path: tool_path.into(),
        }
    }

    /// Set the input directory.
    pub fn input_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Set the output directory.
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Path of the template.
    pub fn template(&self) -> &Path {
        &self.template_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_default_to_current() {
        let config = Config::new("t.dscalar.nii", "wb_command");
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("."));

        let config = config.input_dir("in").output_dir("out");
        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.template(), Path::new("t.dscalar.nii"));
    }
}
