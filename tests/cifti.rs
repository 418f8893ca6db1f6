mod util;

use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

use roicifti::cifti::{BrainStructure, CiftiImage, ModelIndex, ModelType};
use roicifti::header::Nifti2Header;
use roicifti::processor::{FileSystemIo, TemplateSource};
use roicifti::typedef::Intent;
use roicifti::FormatError;

use util::{template_axis, write_template};

#[test]
fn template_header_reads_back() {
    let dir = tempdir().unwrap();
    let path = write_template(dir.path(), "template.dscalar.nii");

    let header = CiftiImage::read_header(&path).unwrap();
    let axis = header.brain_model_axis(1).unwrap();
    assert_eq!(axis, &template_axis());
    assert_eq!(
        axis.structures(),
        vec![
            BrainStructure::CortexLeft,
            BrainStructure::CortexRight,
            BrainStructure::ThalamusLeft
        ]
    );

    let models = axis.models();
    assert_eq!(models.len(), 3);
    assert_eq!(models[1].index_offset, 5);
    assert_eq!(models[1].surface_vertex_count, Some(4));
    assert_eq!(models[2].model_type, ModelType::Voxels);
    assert_eq!(models[2].indices[1], ModelIndex::Voxel([1, 2, 1]));
}

#[test]
fn compressed_template_is_accepted() {
    let dir = tempdir().unwrap();
    let path = write_template(dir.path(), "template.dscalar.nii.gz");
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let axis = FileSystemIo.load_template(&path).unwrap();
    assert_eq!(axis.len(), 10);
}

#[test]
fn nifti2_fields_of_written_file() {
    let dir = tempdir().unwrap();
    let path = write_template(dir.path(), "template.dscalar.nii");
    let nifti = Nifti2Header::from_reader(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(nifti.dim().unwrap(), &[1, 1, 1, 1, 1, 10]);
    assert_eq!(nifti.intent(), Some(Intent::ConnDenseScalar));
    assert_eq!(nifti.bitpix, 32);
    assert_eq!(nifti.vox_offset % 16, 0);

    let len = fs::metadata(&path).unwrap().len() as i64;
    assert_eq!(len, nifti.vox_offset + 10 * 4);
}

#[test]
fn not_a_cifti_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.nii");
    let mut bytes = Vec::new();
    Nifti2Header::default().write_to(&mut bytes).unwrap();
    bytes.extend_from_slice(&[0; 4]);
    fs::write(&path, &bytes).unwrap();

    match CiftiImage::read_header(&path) {
        Err(FormatError::MissingCiftiExtension) => {}
        other => panic!("unexpected {:?}", other),
    }

    fs::write(&path, b"definitely not a header").unwrap();
    assert!(CiftiImage::read_header(&path).is_err());
}
