//! An application for writing a small bilateral dense scalar template,
//! handy for trying out the converter without real data.

use std::env;

use ndarray::Array2;
use roicifti::cifti::{BrainModelAxis, BrainStructure, CiftiHeader, CiftiImage, ScalarAxis};

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to the output file is required");
    let vertices: usize = args
        .next()
        .map(|n| n.parse().expect("Vertex count must be a number"))
        .unwrap_or(32);

    // every other vertex, as if the medial wall was left out
    let kept: Vec<usize> = (0..vertices).step_by(2).collect();
    let mut axis = BrainModelAxis::new(None);
    axis.add_surface(BrainStructure::CortexLeft, vertices, &kept)
        .unwrap();
    axis.add_surface(BrainStructure::CortexRight, vertices, &kept)
        .unwrap();

    let data = Array2::zeros((1, axis.len()));
    let header = CiftiHeader::dense_scalar(ScalarAxis::new(vec!["template"]), axis);
    CiftiImage::new(header, data)
        .unwrap()
        .write(&filename)
        .expect("Failed to write the template");
}
