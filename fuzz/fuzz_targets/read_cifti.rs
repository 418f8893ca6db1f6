#![no_main]
use libfuzzer_sys::fuzz_target;
use roicifti::CiftiImage;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = CiftiImage::from_reader(data) {
        let header = image.header();
        if let Ok(axis) = header.brain_model_axis(1) {
            let _ = axis.models();
            let _ = axis.restrict_to(roicifti::BrainStructure::CortexLeft);
        }
        let _ = header.to_xml();
    }
});
