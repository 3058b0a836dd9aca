#![no_main]
use gridprint_core::codec;
use gridprint_core::data::GameData;
use gridprint_core::validation::ValidationMode;
use gridprint_spatial::Blueprint;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whatever decodes must import, validate and export without panicking.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = codec::decode(text) else {
        return;
    };
    for mode in [ValidationMode::Minimum, ValidationMode::Pedantic] {
        let Ok((bp, _)) = Blueprint::from_value_with(&value, GameData::vanilla(), mode) else {
            continue;
        };
        let _ = bp.validate(ValidationMode::Strict);
        if let Ok(exported) = bp.to_value() {
            // A successful export must import again.
            assert!(Blueprint::from_value_with(&exported, GameData::vanilla(), ValidationMode::None).is_ok());
        }
    }
});
