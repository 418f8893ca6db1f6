#![no_main]
use libfuzzer_sys::fuzz_target;
use roicifti::GiftiImage;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = GiftiImage::from_reader(data) {
        for array in &image.data_arrays {
            let _ = array.as_matrix();
        }
        let _ = image.vertex_data();
    }
});
