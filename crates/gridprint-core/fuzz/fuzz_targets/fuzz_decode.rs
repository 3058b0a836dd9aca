#![no_main]
use gridprint_core::codec;
use gridprint_core::data::GameData;
use gridprint_core::record::{EntityRecord, ScheduleRecord, TileRecord, parse_root};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text through the string codec and record parsers must not panic.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = codec::decode(text) else {
        return;
    };
    let Ok(root) = parse_root(&value, "blueprint") else {
        return;
    };
    let game = GameData::vanilla();
    for raw in &root.blueprint.entities {
        if let Ok(record) = EntityRecord::parse(raw, "entity") {
            let _ = record.into_parts(&game);
        }
    }
    for raw in &root.blueprint.tiles {
        let _ = TileRecord::parse(raw, "tile").map(TileRecord::into_tile);
    }
    for raw in &root.blueprint.schedules {
        let _ = ScheduleRecord::parse(raw, "schedule");
    }
});
