use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndarray::Array2;
use roicifti::cifti::{
    BrainModelAxis, BrainStructure, CiftiHeader, CiftiImage, ScalarAxis, VolumeGeometry,
};
use roicifti::ToolRunner;

/// A GIFTI document with one ASCII float32 data array per column.
pub fn gifti_document(columns: &[Vec<f64>]) -> String {
    let arrays: String = columns
        .iter()
        .map(|c| {
            let values: Vec<String> = c.iter().map(|v| v.to_string()).collect();
            format!(
                r#"  <DataArray Intent="NIFTI_INTENT_NONE" DataType="NIFTI_TYPE_FLOAT32"
             ArrayIndexingOrder="RowMajorOrder" Dimensionality="1" Dim0="{}"
             Encoding="ASCII" Endian="LittleEndian" ExternalFileName="" ExternalFileOffset="">
    <MetaData/>
    <Data>{}</Data>
  </DataArray>
"#,
                c.len(),
                values.join(" ")
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<GIFTI Version="1.0" NumberOfDataArrays="{}">
  <MetaData/>
  <LabelTable/>
{}</GIFTI>
"#,
        columns.len(),
        arrays
    )
}

/// Write a GIFTI file into `dir`.
pub fn write_gifti(dir: &Path, name: &str, columns: &[Vec<f64>]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, gifti_document(columns)).unwrap();
    path
}

/// Brain models of the test template: 5 left cortex vertices, 3 of the 4
/// right cortex vertices and 2 thalamus voxels.
pub fn template_axis() -> BrainModelAxis {
    let volume = VolumeGeometry {
        dimensions: [3, 3, 3],
        meter_exponent: -3,
        affine: [
            [2., 0., 0., -3.],
            [0., 2., 0., -3.],
            [0., 0., 2., -3.],
            [0., 0., 0., 1.],
        ],
    };
    let mut axis = BrainModelAxis::new(Some(volume));
    axis.add_surface(BrainStructure::CortexLeft, 5, &[0, 1, 2, 3, 4])
        .unwrap();
    axis.add_surface(BrainStructure::CortexRight, 4, &[0, 2, 3])
        .unwrap();
    axis.add_voxels(BrainStructure::ThalamusLeft, &[[1, 1, 1], [1, 2, 1]])
        .unwrap();
    axis
}

/// Write the test template (one map of zeros) into `dir` under `name`.
pub fn write_template(dir: &Path, name: &str) -> PathBuf {
    let axis = template_axis();
    let data = Array2::zeros((1, axis.len()));
    let header = CiftiHeader::dense_scalar(ScalarAxis::new(vec!["template"]), axis);
    let path = dir.join(name);
    CiftiImage::new(header, data).unwrap().write(&path).unwrap();
    path
}

/// A tool runner that records its arguments and exits with a fixed code.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    pub exit: i32,
    pub calls: Rc<RefCell<Vec<Vec<OsString>>>>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn exiting_with(exit: i32) -> Self {
        RecordingRunner {
            exit,
            ..RecordingRunner::default()
        }
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, _program: &Path, args: &[OsString]) -> io::Result<Option<i32>> {
        self.calls.borrow_mut().push(args.to_vec());
        Ok(Some(self.exit))
    }
}
