//! Conversion of one ROI file into a dense scalar file, followed by its
//! densification.

use log::{debug, info};
use ndarray::Axis;
use std::path::{Path, PathBuf};

use crate::cifti::{BrainModelAxis, CiftiHeader, CiftiImage, ScalarAxis};
use crate::error::{ConvertError, ConvertResult, Result};
use crate::expander::{CommandRunner, DensifyOutcome, Expander, ToolRunner, DSCALAR_SUFFIX};
use crate::gifti::{read_gifti, VertexData};
use crate::mapper::{map_roi_to_indices, mask_row, Hemisphere, RoiMembership};
use crate::Config;

/// Suffix of the ROI files picked up for conversion.
pub const FUNC_GII_SUFFIX: &str = ".func.gii";
/// Name of the single map of every written file.
pub const ROI_MAP_NAME: &str = "ROI_Mask";

/// Source of per-vertex surface values.
pub trait SurfaceSource {
    /// Load the vertices-by-columns values of a surface file.
    fn load_surface_data(&self, path: &Path) -> Result<VertexData>;
}

/// Source of the template's brain model axis.
pub trait TemplateSource {
    /// Load the brain model axis (matrix dimension 1) of a template.
    fn load_template(&self, path: &Path) -> Result<BrainModelAxis>;
}

/// Destination of the converted grid files.
pub trait GridSink {
    /// Write a grid file.
    fn write_grid(&self, path: &Path, image: &CiftiImage) -> Result<()>;
}

/// GIFTI and CIFTI-2 files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemIo;

impl SurfaceSource for FileSystemIo {
    fn load_surface_data(&self, path: &Path) -> Result<VertexData> {
        read_gifti(path)?.vertex_data()
    }
}

impl TemplateSource for FileSystemIo {
    fn load_template(&self, path: &Path) -> Result<BrainModelAxis> {
        let header = CiftiImage::read_header(path)?;
        Ok(header.brain_model_axis(1)?.clone())
    }
}

impl GridSink for FileSystemIo {
    fn write_grid(&self, path: &Path, image: &CiftiImage) -> Result<()> {
        image.write(path)
    }
}

/// A file that made it through conversion.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Processed {
    /// The written dense scalar file.
    pub output: PathBuf,
    /// What became of its densification.
    pub densify: DensifyOutcome,
}

/// Converts single ROI files against a fixed template.
#[derive(Debug)]
pub struct FileProcessor<IO = FileSystemIo, R = CommandRunner> {
    template_path: PathBuf,
    output_dir: PathBuf,
    io: IO,
    expander: Expander<R>,
}

impl FileProcessor<FileSystemIo, CommandRunner> {
    /// A processor working on the file system and spawning the configured tool.
    pub fn new(config: &Config) -> Self {
        FileProcessor::with_parts(config, FileSystemIo, CommandRunner)
    }
}

impl<IO, R> FileProcessor<IO, R>
where
    IO: SurfaceSource + TemplateSource + GridSink,
    R: ToolRunner,
{
    /// A processor with the given collaborators. The densification tool is
    /// run through `runner` against the same template that is mapped on.
    pub fn with_parts(config: &Config, io: IO, runner: R) -> Self {
        FileProcessor {
            template_path: config.template_path.clone(),
            output_dir: config.output_dir.clone(),
            io,
            expander: Expander::with_runner(
                config.tool_path.clone(),
                config.template_path.clone(),
                runner,
            ),
        }
    }

    /// The output path for an input file: its name with the trailing
    /// `.func.gii` replaced by `.dscalar.nii`, inside the output directory.
    pub fn output_path(&self, input: &Path) -> ConvertResult<PathBuf> {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConvertError::InvalidFileName(input.to_path_buf()))?;
        let out_name = crate::util::replace_suffix(name, FUNC_GII_SUFFIX, DSCALAR_SUFFIX)
            .ok_or_else(|| ConvertError::InvalidFileName(input.to_path_buf()))?;
        Ok(self.output_dir.join(out_name))
    }

    /// Convert one ROI file and densify the result.
    ///
    /// # Errors
    ///
    /// Anything that stops the grid file from being written. A failed
    /// densification is not an error; it is reported in the result.
    pub fn process(&self, input: &Path) -> ConvertResult<Processed> {
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConvertError::InvalidFileName(input.to_path_buf()))?;
        let hemisphere = Hemisphere::from_file_name(file_name)?;
        let output = self.output_path(input)?;

        let data = self
            .io
            .load_surface_data(input)
            .map_err(|e| ConvertError::SourceLoad(input.to_path_buf(), e))?;
        let roi = RoiMembership::from_vertex_data(&data);

        let template = self
            .io
            .load_template(&self.template_path)
            .map_err(|e| ConvertError::TemplateLoad(self.template_path.clone(), e))?;

        let structure = hemisphere.cortex_structure();
        let (restricted, positions) = map_roi_to_indices(hemisphere, &template, &roi);
        if restricted.is_empty() {
            return Err(ConvertError::HemisphereAbsent(structure));
        }
        if let Some(n) = restricted.surface_vertex_count(structure) {
            let ignored = roi.count_at_or_above(n);
            if ignored > 0 {
                debug!(
                    "{}: {} ROI vertices beyond the {} template vertices ignored",
                    file_name, ignored, n
                );
            }
        }
        debug!(
            "{}: {} of {} {} positions in ROI",
            file_name,
            positions.len(),
            restricted.len(),
            structure
        );

        let row = mask_row(restricted.len(), &positions).insert_axis(Axis(0));
        let header = CiftiHeader::dense_scalar(ScalarAxis::new(vec![ROI_MAP_NAME]), restricted);
        let image = CiftiImage::new(header, row)
            .map_err(|e| ConvertError::OutputWrite(output.clone(), e))?;
        self.io
            .write_grid(&output, &image)
            .map_err(|e| ConvertError::OutputWrite(output.clone(), e))?;
        info!("Processed: {}", file_name);

        let densify = self.expander.densify(&output);
        Ok(Processed { output, densify })
    }
}
