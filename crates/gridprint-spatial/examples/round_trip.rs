//! Round-trip example: build a small blueprint, export it as a string, and
//! read it back.
//!
//! Run with: `RUST_LOG=debug cargo run -p gridprint-spatial --example round_trip`

use gridprint_core::entity::{CircuitSide, Entity, Group, WireColor};
use gridprint_core::geometry::IntPosition;
use gridprint_core::tile::Tile;
use gridprint_core::validation::ValidationMode;
use gridprint_spatial::Blueprint;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut bp = Blueprint::new();
    bp.set_label(Some("Wired chests"));
    bp.set_icons_by_name(&["wooden-chest", "signal-A"])?;

    // --- Two chests and a pole pair inside a group ---

    let a = bp.add_entity(Entity::new("wooden-chest", (0.5, 0.5)), false)?.key();
    let b = bp.add_entity(Entity::new("wooden-chest", (5.5, 0.5)), false)?.key();
    bp.add_circuit_connection(WireColor::Red, a, b, CircuitSide::Input, CircuitSide::Input)?;

    let poles = Group::new()
        .with_id("poles")
        .with_position((0.0, 3.0))
        .with(Entity::new("small-electric-pole", (0.5, 0.5)).with_id("west"))
        .with(Entity::new("small-electric-pole", (6.5, 0.5)).with_id("east"));
    bp.add_entity(poles, false)?;
    if let (Some(west), Some(east)) = (bp.find_entity_by_id("poles.west"), bp.find_entity_by_id("poles.east")) {
        bp.add_power_connection(west, east)?;
    }

    for y in 5..8 {
        for x in 0..3 {
            bp.add_tile(Tile::new("concrete", IntPosition::new(x, y)), false)?;
        }
    }

    println!("{} x {} tiles", bp.tile_width(), bp.tile_height());

    // --- Export and re-import ---

    let s = bp.to_blueprint_string()?;
    println!("{s}");

    let again = Blueprint::from_string(&s)?;
    println!("round trip equal: {}", again == bp);

    let report = again.validate(ValidationMode::Strict);
    println!("errors: {}, warnings: {}", report.errors.len(), report.warnings.len());
    Ok(())
}
