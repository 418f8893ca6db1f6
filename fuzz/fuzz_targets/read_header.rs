#![no_main]
use libfuzzer_sys::fuzz_target;
use roicifti::Nifti2Header;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = Nifti2Header::from_reader(data) {
        let _ = header.dim();
        let _ = header.data_type();
        let _ = header.intent();
        let _ = header.intent_name_str();
        let mut out = Vec::new();
        let _ = header.write_to(&mut out);
    }
});
