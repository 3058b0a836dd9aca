//! Serde data file structs for prototype definitions.
//!
//! These define the on-disk format for entities, tiles and signals. They are
//! deserialized from RON, JSON, or TOML files and then resolved into
//! prototypes by the loader.

use gridprint_core::signal::SignalType;
use serde::Deserialize;

// ===========================================================================
// Entities
// ===========================================================================

/// An entity prototype definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityData {
    pub name: String,
    /// Snake-case kind name, e.g. `"assembling_machine"`.
    pub kind: String,
    /// `[min_x, min_y, max_x, max_y]`, relative to the entity centre.
    pub collision_box: [f64; 4],
    /// Collision layers. Defaults by kind when omitted.
    #[serde(default)]
    pub collision_mask: Option<Vec<String>>,
    /// Footprint in tiles. Defaults to the collision box rounded up.
    #[serde(default)]
    pub footprint: Option<FootprintData>,
    #[serde(default)]
    pub circuit_wire_max_distance: Option<f64>,
    #[serde(default)]
    pub maximum_wire_distance: Option<f64>,
    #[serde(default)]
    pub inventory_size: Option<u16>,
    #[serde(default)]
    pub double_grid_aligned: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FootprintData {
    pub width: u32,
    pub height: u32,
}

// ===========================================================================
// Tiles and signals
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TileData {
    pub name: String,
    #[serde(default)]
    pub collision_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalData {
    pub name: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

/// TOML has no top-level arrays, so lists live under a named key.
#[derive(Debug, Deserialize)]
pub struct TomlEntities {
    pub entities: Vec<EntityData>,
}

#[derive(Debug, Deserialize)]
pub struct TomlTiles {
    pub tiles: Vec<TileData>,
}

#[derive(Debug, Deserialize)]
pub struct TomlSignals {
    pub signals: Vec<SignalData>,
}
