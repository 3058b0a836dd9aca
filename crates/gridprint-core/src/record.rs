//! The external dictionary form of a blueprint.
//!
//! Records mirror the JSON a game client produces. Cross-references in the
//! external form are 1-based positions in the flattened entity list
//! (`entity_number`); records keep them as plain integers and leave the
//! mapping onto arena keys to the collection layer.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::color::Color;
use crate::data::GameData;
use crate::entity::{Direction, Entity};
use crate::error::{BlueprintError, FormatError};
use crate::geometry::{IntPosition, Vector};
use crate::schedule::Stop;
use crate::signal::Icon;
use crate::tile::Tile;
use crate::version::Version;

/// Deserialize `value`, reporting failures at `path`.
pub fn deserialize_at<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T, FormatError> {
    T::deserialize(value).map_err(|e| FormatError::new(path, e.to_string()))
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// The outer `{"<kind>": {...}, "index": n}` wrapper.
#[derive(Debug)]
pub struct RootRecord {
    pub blueprint: BlueprintRecord,
    pub index: Option<u16>,
}

/// Unwrap the outer object, checking that it holds a blueprintable of kind
/// `expected`.
pub fn parse_root(value: &Value, expected: &str) -> Result<RootRecord, BlueprintError> {
    let Value::Object(root) = value else {
        return Err(FormatError::new("<root>", "expected an object").into());
    };
    let Some(inner) = root.get(expected) else {
        let found = root
            .keys()
            .find(|k| k.as_str() != "index")
            .cloned()
            .unwrap_or_else(|| "nothing".to_string());
        return Err(BlueprintError::IncorrectBlueprintType {
            expected: expected.to_string(),
            found,
        });
    };
    let index = match root.get("index") {
        None => None,
        Some(v) => Some(
            v.as_u64()
                .and_then(|i| u16::try_from(i).ok())
                .ok_or_else(|| FormatError::new("index", "expected an integer in 0..=65535"))?,
        ),
    };
    let blueprint: BlueprintRecord = deserialize_at(inner, expected)?;
    if blueprint.item != expected {
        return Err(FormatError::new(
            format!("{expected}.item"),
            format!("expected '{expected}', found '{}'", blueprint.item),
        )
        .into());
    }
    Ok(RootRecord { blueprint, index })
}

/// Blueprint metadata plus raw object lists.
#[derive(Debug, Deserialize)]
pub struct BlueprintRecord {
    pub item: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub label_color: Option<Color>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icons: Option<Vec<Icon>>,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(rename = "snap-to-grid", default)]
    pub snap_to_grid: Option<IntPosition>,
    #[serde(rename = "absolute-snapping", default)]
    pub absolute_snapping: Option<bool>,
    #[serde(rename = "position-relative-to-grid", default)]
    pub position_relative_to_grid: Option<IntPosition>,
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub tiles: Vec<Value>,
    #[serde(default)]
    pub schedules: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitPointRecord {
    pub entity_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopperPointRecord {
    pub entity_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_id: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<Vec<CircuitPointRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green: Option<Vec<CircuitPointRecord>>,
}

/// Wire connections keyed by terminal: `"1"`/`"2"` for circuit sides,
/// `"Cu0"`/`"Cu1"` for power switch copper terminals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsRecord {
    #[serde(rename = "1", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<CircuitRecord>,
    #[serde(rename = "2", default, skip_serializing_if = "Option::is_none")]
    pub output: Option<CircuitRecord>,
    #[serde(rename = "Cu0", default, skip_serializing_if = "Option::is_none")]
    pub copper_left: Option<Vec<CopperPointRecord>>,
    #[serde(rename = "Cu1", default, skip_serializing_if = "Option::is_none")]
    pub copper_right: Option<Vec<CopperPointRecord>>,
}

impl ConnectionsRecord {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none() && self.copper_left.is_none() && self.copper_right.is_none()
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(default)]
    pub entity_number: Option<u64>,
    pub position: Vector,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub connections: Option<ConnectionsRecord>,
    #[serde(default)]
    pub neighbours: Option<Vec<u64>>,
    #[serde(default)]
    pub items: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub tags: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// An entity whose references are still external integers.
#[derive(Debug)]
pub struct ParsedEntity {
    pub entity: Entity,
    pub connections: Option<ConnectionsRecord>,
    pub neighbours: Vec<u64>,
}

impl EntityRecord {
    pub fn parse(value: &Value, path: &str) -> Result<Self, FormatError> {
        deserialize_at(value, path)
    }

    /// Split the record into an entity value and its pending references.
    /// Keys known for the prototype's kind become fields, the rest extras.
    pub fn into_parts(self, data: &GameData) -> ParsedEntity {
        let mut entity = Entity::new(&self.name, self.position);
        entity.direction = self.direction.unwrap_or_default();
        entity.items = self.items.unwrap_or_default();
        entity.tags = self.tags.unwrap_or_default();

        let known = data.entity(&self.name).map(|p| p.kind.known_fields()).unwrap_or(&[]);
        for (key, value) in self.rest {
            if known.contains(&key.as_str()) {
                entity.fields.insert(key, value);
            } else {
                entity.extra.insert(key, value);
            }
        }

        ParsedEntity {
            entity,
            connections: self.connections,
            neighbours: self.neighbours.unwrap_or_default(),
        }
    }
}

/// Whole coordinates are written as integers, as the game writes them.
fn coordinate(value: f64) -> Value {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < EXACT {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Write one entity in external form. Defaults are omitted.
pub fn write_entity(
    entity: &Entity,
    entity_number: u64,
    position: Vector,
    connections: &ConnectionsRecord,
    neighbours: &[u64],
) -> Map<String, Value> {
    let mut out = entity.extra.clone();
    for (key, value) in &entity.fields {
        out.insert(key.clone(), value.clone());
    }
    out.insert("name".into(), json!(entity.name));
    out.insert(
        "position".into(),
        json!({"x": coordinate(position.x), "y": coordinate(position.y)}),
    );
    if entity.direction != Direction::North {
        out.insert("direction".into(), json!(u8::from(entity.direction)));
    }
    if !entity.items.is_empty() {
        out.insert("items".into(), json!(entity.items));
    }
    if !entity.tags.is_empty() {
        out.insert("tags".into(), Value::Object(entity.tags.clone()));
    }
    if !connections.is_empty() {
        out.insert("connections".into(), json!(connections));
    }
    if !neighbours.is_empty() {
        out.insert("neighbours".into(), json!(neighbours));
    }
    out.insert("entity_number".into(), json!(entity_number));
    out
}

// ---------------------------------------------------------------------------
// Tiles and schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct TileRecord {
    pub name: String,
    pub position: IntPosition,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TileRecord {
    pub fn parse(value: &Value, path: &str) -> Result<Self, FormatError> {
        deserialize_at(value, path)
    }

    pub fn into_tile(self) -> Tile {
        Tile {
            name: self.name,
            position: self.position,
            extra: self.extra,
        }
    }

    /// External form of `tile`, shifted by `offset`.
    pub fn write(tile: &Tile, offset: IntPosition) -> Value {
        let mut out = tile.extra.clone();
        out.insert("name".into(), json!(tile.name));
        let position = tile.position - offset;
        out.insert(
        "position".into(),
        json!({"x": coordinate(f64::from(position.x)), "y": coordinate(f64::from(position.y))}),
    );
        Value::Object(out)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(default)]
    pub schedule: Vec<Stop>,
    #[serde(default)]
    pub locomotives: Vec<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScheduleRecord {
    pub fn parse(value: &Value, path: &str) -> Result<Self, FormatError> {
        deserialize_at(value, path)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
