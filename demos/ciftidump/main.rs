//! An application for reading CIFTI-2 file meta-data.

use std::env;
use std::fs::File;

use roicifti::cifti::CiftiAxis;
use roicifti::{CiftiImage, Nifti2Header};

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to CIFTI-2 file is required");
    let file = File::open(&filename).expect("Failed to open CIFTI-2 file");
    let header = Nifti2Header::from_reader(file).expect("Failed to read NIfTI-2 header");
    println!("{:#?}", &header);

    let cifti = CiftiImage::read_header(&filename).expect("Failed to read CIFTI-2 header");
    for (dim, axis) in cifti.axes().iter().enumerate() {
        match axis {
            CiftiAxis::Scalars(scalars) => {
                println!("dimension {}: {} named maps", dim, scalars.len());
                for name in scalars.names() {
                    println!("  {}", name);
                }
            }
            CiftiAxis::BrainModels(models) => {
                println!("dimension {}: {} brain model indices", dim, models.len());
                for m in models.models() {
                    println!(
                        "  {:<40} offset {:>7} count {:>7} {:?}",
                        m.structure.cifti_name(),
                        m.index_offset,
                        m.index_count,
                        m.surface_vertex_count
                    );
                }
            }
            CiftiAxis::Unsupported(kind) => println!("dimension {}: {}", dim, kind),
        }
    }
}
