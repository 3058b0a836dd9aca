//! End-to-end blueprint scenarios across the core, spatial and data crates.
//!
//! Each test builds or imports a blueprint the way a user would, then checks
//! the exported document, the string form, or the reported problems.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use gridprint_core::color::Color;
use gridprint_core::data::GameData;
use gridprint_core::entity::{CircuitPoint, CircuitSide, Entity, Group, WireColor};
use gridprint_core::error::BlueprintError;
use gridprint_core::geometry::{Aabb, Vector};
use gridprint_core::test_utils::*;
use gridprint_core::tile::Tile;
use gridprint_core::validation::ValidationMode;
use gridprint_core::version::Version;
use gridprint_core::warning::Warning;
use gridprint_data::load_game_data;
use gridprint_spatial::{Blueprint, Placement};
use serde_json::json;

// ============================================================================
// Shared helpers
// ============================================================================

/// A blueprint book holding nothing, as exported by the game.
const EMPTY_BOOK: &str = "0eNqrVkrKKU0tKMrMK4lPys/PVrKqVsosSc1VskJI6IIldJQSk0syy1LjM/NSUiuUrAx0lMpSi4oz8/OUrIwsDE3MTSzNzcwNDcxMzWprAVWGHQI=";

fn wired_pair() -> Blueprint {
    let mut bp = Blueprint::new();
    let a = bp.add_entity(chest_at(0, 0), false).unwrap().key();
    let b = bp.add_entity(chest_at(5, 0), false).unwrap().key();
    bp.add_circuit_connection(WireColor::Red, a, b, CircuitSide::Input, CircuitSide::Input)
        .unwrap();
    bp
}

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridprint_it_{suffix}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================================
// Test 1: Wired pair survives the string form
// ============================================================================

#[test]
fn wired_pair_through_string() {
    let bp = wired_pair();
    let s = bp.to_blueprint_string().unwrap();
    assert!(s.starts_with('0'));

    let again = Blueprint::from_string(&s).unwrap();
    assert_eq!(again, bp);

    let keys = again.entities().leaves();
    assert_eq!(keys.len(), 2);
    let first = again.entity(keys[0]).unwrap();
    let red = first.connections.circuit(CircuitSide::Input, WireColor::Red);
    assert_eq!(red.len(), 1);
    assert!(red[0].target.points_to(keys[1]));
    assert_eq!(red[0].circuit_id, None);
}

// ============================================================================
// Test 2: Removing a wired entity breaks export, not editing
// ============================================================================

#[test]
fn removing_wire_target_reports_dangling_reference() {
    let mut bp = wired_pair();
    bp.remove_entity(1).unwrap();
    assert_eq!(bp.entities().len(), 1);

    match bp.to_blueprint_string() {
        Err(BlueprintError::InvalidAssociation { name, position }) => {
            assert_eq!(name, "wooden-chest");
            assert_eq!(position, Vector::new(0.5, 0.5));
        }
        other => panic!("expected InvalidAssociation, got {other:?}"),
    }

    let report = bp.validate(ValidationMode::Minimum);
    assert!(matches!(report.errors.as_slice(), [BlueprintError::InvalidAssociation { .. }]));

    // Dropping the wire makes the blueprint exportable again.
    let a = bp.entities().leaves()[0];
    bp.modify_entity(a, |e| e.connections = Default::default()).unwrap();
    assert!(bp.to_value().is_ok());
}

// ============================================================================
// Test 3: Label color in the 0..=255 scale
// ============================================================================

#[test]
fn label_color_keeps_scale_and_omits_alpha() {
    let mut bp = Blueprint::new();
    bp.set_label_color(Some(Color::rgb(127.0, 127.0, 127.0).unwrap())).unwrap();
    let again = Blueprint::from_string(&bp.to_blueprint_string().unwrap()).unwrap();

    let color = again.label_color().unwrap();
    assert_eq!((color.r, color.g, color.b, color.a), (127.0, 127.0, 127.0, None));
    assert_eq!(color.alpha(), 255.0);
    assert_eq!(
        again.to_value().unwrap()["blueprint"]["label_color"],
        json!({"r": 127.0, "g": 127.0, "b": 127.0})
    );

    assert!(bp.set_label_color(Some(Color { r: 300.0, g: 0.0, b: 0.0, a: None })).is_err());
    assert_eq!(bp.label_color(), Some(color));
}

// ============================================================================
// Test 4: Merging the same entity repeatedly
// ============================================================================

#[test]
fn repeated_merge_is_idempotent() {
    let mut bp = Blueprint::new();
    let first = bp.add_entity(chest_at(3, 3).with_item("iron-plate", 10), true).unwrap();
    let key = first.key();

    let second = bp.add_entity(chest_at(3, 3).with_item("iron-plate", 50), true).unwrap();
    assert!(matches!(second, Placement::Merged { into, .. } if into == key));
    assert_eq!(bp.entities().len(), 1);
    assert_eq!(bp.entity(key).unwrap().items["iron-plate"], 50);

    let before = bp.to_value().unwrap();
    bp.add_entity(chest_at(3, 3).with_item("iron-plate", 50), true).unwrap();
    assert_eq!(bp.to_value().unwrap(), before);
}

#[test]
fn merge_unions_wires() {
    let mut bp = wired_pair();
    let b = bp.entities().leaves()[1];
    let c = bp.add_entity(chest_at(5, 3), false).unwrap().key();

    // A second copy of the chest at (5, 0), carrying its own wire to the
    // third chest.
    let mut copy = chest_at(5, 0);
    copy.connections.add_circuit(
        CircuitSide::Input,
        WireColor::Green,
        CircuitPoint {
            target: bp.entities().associate(c),
            circuit_id: None,
        },
    );
    let placement = bp.add_entity(copy, true).unwrap();
    assert!(matches!(placement, Placement::Merged { into, .. } if into == b));

    let merged = bp.entity(b).unwrap();
    assert_eq!(merged.connections.circuit(CircuitSide::Input, WireColor::Red).len(), 1);
    let green = merged.connections.circuit(CircuitSide::Input, WireColor::Green);
    assert_eq!(green.len(), 1);
    assert!(green[0].target.points_to(c));
}

// ============================================================================
// Test 5: Overlap without merging
// ============================================================================

#[test]
fn overlap_without_merge_warns() {
    let mut bp = Blueprint::new();
    bp.add_entity(chest_at(0, 0), false).unwrap();
    let placement = bp.add_entity(chest_at(0, 0), false).unwrap();
    assert!(matches!(placement.warnings(), [Warning::OverlappingObjects { .. }]));
    assert_eq!(bp.entities().len(), 2);

    let strict = bp.validate(ValidationMode::Strict);
    assert!(strict.is_valid());
    assert!(
        strict
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::OverlappingObjects { .. }))
    );

    let pedantic = bp.validate(ValidationMode::Pedantic);
    assert!(!pedantic.is_valid());
    assert!(bp.validate(ValidationMode::Minimum).warnings.is_empty());
}

#[test]
fn grouped_entities_overlap_top_level() {
    let mut bp = Blueprint::new();
    bp.add_entity(chest_at(2, 0), false).unwrap();
    let group = Group::new()
        .with_id("row")
        .with_position((2.0, 0.0))
        .with(chest_at(0, 0).with_id("left"))
        .with(chest_at(1, 0).with_id("right"));
    let placement = bp.add_entity(group, false).unwrap();
    assert_eq!(placement.warnings().len(), 1);

    let left = bp.find_entity_by_id("row.left").unwrap();
    assert_eq!(bp.entities().world_position(left), Some(Vector::new(2.5, 0.5)));
}

// ============================================================================
// Test 6: Size limit
// ============================================================================

#[test]
fn oversized_addition_rejected_and_rolled_back() {
    let mut bp = Blueprint::new();
    bp.add_entity(chest_at(0, 0), false).unwrap();
    let before = bp.to_value().unwrap();

    let far = Entity::new("wooden-chest", (10_001.5, 0.5));
    assert!(matches!(
        bp.add_entity(far, false),
        Err(BlueprintError::UnreasonablySized { .. })
    ));
    assert_eq!(bp.entities().len(), 1);
    assert_eq!(bp.tile_width(), 1);
    assert_eq!(bp.to_value().unwrap(), before);

    // Just inside the limit is fine.
    bp.add_entity(chest_at(9_999, 0), false).unwrap();
    assert_eq!(bp.tile_width(), 10_000);
}

// ============================================================================
// Test 7: Importing the wrong blueprintable
// ============================================================================

#[test]
fn book_string_is_not_a_blueprint() {
    match Blueprint::from_string(EMPTY_BOOK) {
        Err(BlueprintError::IncorrectBlueprintType { expected, found }) => {
            assert_eq!(expected, "blueprint");
            assert_eq!(found, "blueprint_book");
        }
        other => panic!("expected IncorrectBlueprintType, got {other:?}"),
    }
}

#[test]
fn malformed_strings_rejected() {
    assert!(matches!(
        Blueprint::from_string(""),
        Err(BlueprintError::MalformedString(_))
    ));
    assert!(matches!(
        Blueprint::from_string("1abc"),
        Err(BlueprintError::MalformedString(_))
    ));
    assert!(matches!(
        Blueprint::from_string("0not base64!"),
        Err(BlueprintError::MalformedString(_))
    ));
}

// ============================================================================
// Test 8: Sample document
// ============================================================================

#[test]
fn sample_document_round_trips() {
    let sample = sample_blueprint_value();
    let bp = Blueprint::from_value(&sample).unwrap();
    assert_eq!(bp.to_value().unwrap(), sample);
    assert_eq!(bp.schedules().len(), 1);
    assert_eq!(bp.tiles().len(), 1);

    let again = Blueprint::from_string(&bp.to_blueprint_string().unwrap()).unwrap();
    assert_eq!(again.to_value().unwrap(), sample);
}

#[test]
fn area_search_finds_chests() {
    let bp = Blueprint::from_value(&sample_blueprint_value()).unwrap();
    let near_origin = bp.find_entities_filtered(Some("wooden-chest"), Some(Aabb::new(-1.0, -1.0, 2.0, 2.0)));
    assert_eq!(near_origin.len(), 1);
    assert_eq!(bp.find_entities_filtered(Some("wooden-chest"), None).len(), 2);
    assert!(bp.find_entities_filtered(Some("iron-chest"), None).is_empty());
}

// ============================================================================
// Test 9: Game data loaded from disk
// ============================================================================

#[test]
fn custom_game_data_drives_validation() {
    let dir = make_test_dir("custom_data");
    fs::write(
        dir.join("entities.json"),
        r#"[
            {"name": "crate", "kind": "container", "collision_box": [-0.4, -0.4, 0.4, 0.4], "circuit_wire_max_distance": 3.0},
            {"name": "pylon", "kind": "electric_pole", "collision_box": [-0.2, -0.2, 0.2, 0.2], "maximum_wire_distance": 4.0}
        ]"#,
    )
    .unwrap();
    let data = Arc::new(load_game_data(&dir).unwrap());
    let _ = fs::remove_dir_all(&dir);

    let mut bp = Blueprint::with_data(Arc::clone(&data));
    let a = bp.add_entity(Entity::new("crate", (0.5, 0.5)), false).unwrap().key();
    let b = bp.add_entity(Entity::new("crate", (5.5, 0.5)), false).unwrap().key();
    let warnings = bp
        .add_circuit_connection(WireColor::Red, a, b, CircuitSide::Input, CircuitSide::Input)
        .unwrap();
    assert!(matches!(warnings.as_slice(), [Warning::ConnectionDistance { reach, .. }] if *reach == 3.0));

    let p = bp.add_entity(Entity::new("pylon", (0.5, 3.5)), false).unwrap().key();
    let q = bp.add_entity(Entity::new("pylon", (3.5, 3.5)), false).unwrap().key();
    assert!(bp.add_power_connection(p, q).unwrap().is_empty());

    // Vanilla does not know these names.
    let s = bp.to_blueprint_string().unwrap();
    let (_, vanilla_warnings) = Blueprint::from_string_with(&s, GameData::vanilla(), ValidationMode::Strict).unwrap();
    assert!(
        vanilla_warnings
            .iter()
            .any(|w| matches!(w, Warning::UnknownEntity(name) if name == "crate"))
    );
    let (_, custom_warnings) = Blueprint::from_string_with(&s, data, ValidationMode::Strict).unwrap();
    assert!(custom_warnings.is_empty(), "{custom_warnings:?}");
}

// ============================================================================
// Test 10: References carried between blueprints
// ============================================================================

#[test]
fn wired_entity_copied_into_another_blueprint_dangles() {
    let source = wired_pair();
    let a = source.entities().leaves()[0];

    let mut target = Blueprint::new();
    target.add_entity(source.entity(a).unwrap().clone(), false).unwrap();
    target.add_entity(chest_at(9, 9), false).unwrap();

    match target.to_value() {
        Err(BlueprintError::InvalidAssociation { name, position }) => {
            assert_eq!(name, "wooden-chest");
            assert_eq!(position, Vector::new(0.5, 0.5));
        }
        other => panic!("expected InvalidAssociation, got {other:?}"),
    }
    assert!(source.to_value().is_ok());
}

#[test]
fn cloned_blueprint_wires_resolve_in_the_clone() {
    let mut original = wired_pair();
    let copy = original.clone();
    let keys = copy.entities().leaves();
    let wire = copy.entity(keys[0]).unwrap().connections.circuit(CircuitSide::Input, WireColor::Red)[0];
    assert!(wire.target.is_live(copy.entities()));
    assert!(!wire.target.is_live(original.entities()));

    original.remove_entity(1).unwrap();
    original.add_entity(chest_at(7, 7), false).unwrap();
    assert!(original.to_value().is_err());
    assert_eq!(copy.to_value().unwrap(), wired_pair().to_value().unwrap());
}

// ============================================================================
// Test 11: Whole-number positions
// ============================================================================

#[test]
fn integer_positions_round_trip_exactly() {
    let value = json!({"blueprint": {
        "item": "blueprint",
        "version": Version::CURRENT.packed(),
        "entities": [
            {"entity_number": 1, "name": "small-electric-pole", "position": {"x": 1, "y": 1}},
            {"entity_number": 2, "name": "wooden-chest", "position": {"x": -3.5, "y": 2.5}}
        ]
    }});
    let bp = Blueprint::from_value(&value).unwrap();
    assert_eq!(bp.to_value().unwrap(), value);

    let again = Blueprint::from_string(&bp.to_blueprint_string().unwrap()).unwrap();
    assert_eq!(again.to_value().unwrap(), value);
}

// ============================================================================
// Test 12: Warnings raised while placing
// ============================================================================

#[test]
fn placement_reports_entity_warnings() {
    let mut bp = Blueprint::new();
    let placement = bp.add_entity(Entity::new("mystery-machine", (0.5, 0.5)), false).unwrap();
    assert!(
        placement
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::UnknownEntity(name) if name == "mystery-machine"))
    );

    bp.set_validate_assignment(ValidationMode::Minimum);
    let quiet = bp.add_entity(Entity::new("mystery-machine", (5.5, 0.5)), false).unwrap();
    assert!(quiet.warnings().is_empty());
}

#[test]
fn pedantic_assignment_rejects_overlap() {
    let mut bp = Blueprint::new();
    bp.add_entity(chest_at(0, 0), false).unwrap();
    bp.set_validate_assignment(ValidationMode::Pedantic);
    let before = bp.to_value().unwrap();

    let result = bp.add_entity(chest_at(0, 0), false);
    assert!(matches!(
        result,
        Err(BlueprintError::Pedantic(Warning::OverlappingObjects { .. }))
    ));
    assert_eq!(bp.entities().len(), 1);
    assert_eq!(bp.to_value().unwrap(), before);

    bp.set_validate_assignment(ValidationMode::Minimum);
    let quiet = bp.add_entity(chest_at(0, 0), false).unwrap();
    assert!(quiet.warnings().is_empty());
    assert_eq!(bp.entities().len(), 2);
}

// ============================================================================
// Test 13: Bulk replacement is all or nothing
// ============================================================================

#[test]
fn failed_set_entities_keeps_previous_entities() {
    let mut bp = wired_pair();
    bp.add_tile(Tile::new("concrete", (0, 2)), false).unwrap();
    let before = bp.to_value().unwrap();
    let (width, height) = (bp.tile_width(), bp.tile_height());

    let result = bp.set_entities(vec![chest_at(0, 0), chest_at(20_000, 0)]);
    assert!(matches!(result, Err(BlueprintError::UnreasonablySized { .. })));
    assert_eq!(bp.entities().len(), 2);
    assert_eq!((bp.tile_width(), bp.tile_height()), (width, height));
    assert_eq!(bp.to_value().unwrap(), before);

    let warnings = bp.set_entities(vec![chest_at(1, 1), chest_at(1, 1)]).unwrap();
    assert!(matches!(warnings.as_slice(), [Warning::OverlappingObjects { .. }]));
    assert_eq!(bp.entities().len(), 2);
}

#[test]
fn failed_set_tiles_keeps_previous_tiles() {
    let mut bp = Blueprint::new();
    bp.add_tile(Tile::new("concrete", (0, 0)), false).unwrap();
    bp.add_tile(Tile::new("concrete", (1, 0)), false).unwrap();
    let before = bp.to_value().unwrap();

    let result = bp.set_tiles(vec![Tile::new("landfill", (0, 0)), Tile::new("landfill", (15_000, 0))]);
    assert!(result.is_err());
    assert_eq!(bp.tiles().len(), 2);
    assert_eq!(bp.tile_width(), 2);
    assert_eq!(bp.to_value().unwrap(), before);
}
