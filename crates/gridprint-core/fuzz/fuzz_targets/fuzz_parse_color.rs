#![no_main]
use gridprint_core::color::Color;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any JSON document either parses into an in-range color or errors.
    if let Ok(color) = serde_json::from_slice::<Color>(data) {
        assert!(color.check().is_ok());
    }
});
