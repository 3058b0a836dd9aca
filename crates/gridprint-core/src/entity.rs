//! Entities, groups of entities, and the wires between them.
//!
//! An [`Entity`] is a plain value. Once stored in a collection its wire
//! connections and power neighbours point at other stored entities through
//! [`Association`]s; before that they are usually empty.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::{CollisionMask, EntityKind, GameData};
use crate::error::BlueprintError;
use crate::geometry::{Aabb, IntPosition, Vector};
use crate::id::{Association, EntityId};
use crate::validation::ValidationContext;
use crate::warning::Warning;

/// Collision box assumed for entities missing from the data table.
pub const UNKNOWN_COLLISION_BOX: Aabb = Aabb::square(0.5);

/// Key of the one kind-specific field that merging replaces rather than
/// requiring to be equal.
pub const CONTROL_BEHAVIOR: &str = "control_behavior";

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    #[default]
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub fn is_cardinal(self) -> bool {
        (self as u8) % 2 == 0
    }

    /// True for the two directions that turn a footprint on its side.
    pub fn is_sideways(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Direction::*;
        Ok(match value {
            0 => North,
            1 => NorthEast,
            2 => East,
            3 => SouthEast,
            4 => South,
            5 => SouthWest,
            6 => West,
            7 => NorthWest,
            other => return Err(format!("direction must be within 0..=7, found {other}")),
        })
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> u8 {
        d as u8
    }
}

// ---------------------------------------------------------------------------
// Wires
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireColor {
    Red,
    Green,
}

impl WireColor {
    pub fn as_str(self) -> &'static str {
        match self {
            WireColor::Red => "red",
            WireColor::Green => "green",
        }
    }
}

impl fmt::Display for WireColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circuit terminal of an entity. Only combinators have an output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CircuitSide {
    Input = 1,
    Output = 2,
}

impl CircuitSide {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(CircuitSide::Input),
            2 => Some(CircuitSide::Output),
            _ => None,
        }
    }
}

/// Copper terminal of a power switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CopperSide {
    Left = 0,
    Right = 1,
}

impl CopperSide {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(CopperSide::Left),
            1 => Some(CopperSide::Right),
            _ => None,
        }
    }
}

/// The far end of a red or green wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitPoint {
    pub target: Association,
    /// Side of the target the wire lands on, for dual-sided targets.
    pub circuit_id: Option<u8>,
}

/// The far end of a copper wire attached to a power switch terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopperPoint {
    pub target: Association,
    pub wire_id: Option<u8>,
}

/// All wire connections leaving one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connections {
    circuit: BTreeMap<(CircuitSide, WireColor), Vec<CircuitPoint>>,
    copper: BTreeMap<CopperSide, Vec<CopperPoint>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.circuit.is_empty() && self.copper.is_empty()
    }

    pub fn circuit(&self, side: CircuitSide, color: WireColor) -> &[CircuitPoint] {
        self.circuit.get(&(side, color)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn copper(&self, side: CopperSide) -> &[CopperPoint] {
        self.copper.get(&side).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_circuit(&mut self, side: CircuitSide, color: WireColor, point: CircuitPoint) {
        let points = self.circuit.entry((side, color)).or_default();
        if !points.contains(&point) {
            points.push(point);
        }
    }

    pub fn remove_circuit(&mut self, side: CircuitSide, color: WireColor, target: EntityId, circuit_id: Option<u8>) {
        if let Some(points) = self.circuit.get_mut(&(side, color)) {
            points.retain(|p| !(p.target.points_to(target) && p.circuit_id == circuit_id));
            if points.is_empty() {
                self.circuit.remove(&(side, color));
            }
        }
    }

    pub fn add_copper(&mut self, side: CopperSide, point: CopperPoint) {
        let points = self.copper.entry(side).or_default();
        if !points.contains(&point) {
            points.push(point);
        }
    }

    pub fn remove_copper(&mut self, side: CopperSide, target: EntityId) {
        if let Some(points) = self.copper.get_mut(&side) {
            points.retain(|p| !p.target.points_to(target));
            if points.is_empty() {
                self.copper.remove(&side);
            }
        }
    }

    /// Circuit wires grouped by side then color, in export order.
    pub fn circuit_entries(&self) -> impl Iterator<Item = (CircuitSide, WireColor, &[CircuitPoint])> {
        self.circuit
            .iter()
            .map(|(&(side, color), points)| (side, color, points.as_slice()))
    }

    pub fn copper_entries(&self) -> impl Iterator<Item = (CopperSide, &[CopperPoint])> {
        self.copper.iter().map(|(&side, points)| (side, points.as_slice()))
    }

    /// Every wire end, circuit then copper.
    pub fn targets_mut(&mut self) -> impl Iterator<Item = &mut Association> {
        let circuit = self.circuit.values_mut().flatten().map(|p| &mut p.target);
        let copper = self.copper.values_mut().flatten().map(|p| &mut p.target);
        circuit.chain(copper)
    }

    /// Union with `other`, keeping existing points first.
    pub fn merge(&mut self, other: &Connections) {
        for (side, color, points) in other.circuit_entries() {
            for point in points {
                self.add_circuit(side, color, *point);
            }
        }
        for (side, points) in other.copper_entries() {
            for point in points {
                self.add_copper(side, *point);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Caller-chosen lookup key; never exported.
    pub id: Option<String>,
    pub name: String,
    /// Centre of the entity, relative to its parent group if it has one.
    pub position: Vector,
    pub direction: Direction,
    pub connections: Connections,
    /// Copper-wire neighbours of an electric pole.
    pub neighbours: Vec<Association>,
    pub items: BTreeMap<String, u32>,
    pub tags: Map<String, Value>,
    /// Kind-specific fields recognised for this entity's prototype.
    pub fields: Map<String, Value>,
    /// Unrecognised keys, carried through to export untouched.
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(name: &str, position: impl Into<Vector>) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            position: position.into(),
            direction: Direction::North,
            connections: Connections::new(),
            neighbours: Vec::new(),
            items: BTreeMap::new(),
            tags: Map::new(),
            fields: Map::new(),
            extra: Map::new(),
        }
    }

    /// Place with the top-left corner of the footprint on `tile`.
    pub fn at_tile(name: &str, tile: IntPosition, data: &GameData) -> Self {
        let (w, h) = data
            .entity(name)
            .map(|p| (p.tile_width, p.tile_height))
            .unwrap_or((1, 1));
        let centre = Vector::from(tile) + Vector::new(w as f64 / 2.0, h as f64 / 2.0);
        Self::new(name, centre)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_item(mut self, item: &str, count: u32) -> Self {
        self.items.insert(item.to_string(), count);
        self
    }

    pub fn with_tag(mut self, key: &str, value: Value) -> Self {
        self.tags.insert(key.to_string(), value);
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn kind(&self, data: &GameData) -> EntityKind {
        data.entity(&self.name).map(|p| p.kind).unwrap_or(EntityKind::Generic)
    }

    pub fn control_behavior(&self) -> Option<&Value> {
        self.fields.get(CONTROL_BEHAVIOR)
    }

    /// Collision box relative to the entity centre, turned for its direction.
    pub fn collision_box(&self, data: &GameData) -> Aabb {
        let Some(proto) = data.entity(&self.name) else {
            return UNKNOWN_COLLISION_BOX;
        };
        if self.direction.is_sideways() && !proto.kind.is_rolling_stock() {
            proto.collision_box.rotated_quarter()
        } else {
            proto.collision_box
        }
    }

    /// Collision box in blueprint space, given the offset of the parent group.
    pub fn world_box(&self, data: &GameData, offset: Vector) -> Aabb {
        self.collision_box(data).translated(self.position + offset)
    }

    pub fn collision_mask(&self, data: &GameData) -> CollisionMask {
        data.entity(&self.name)
            .map(|p| p.collision_mask.clone())
            .unwrap_or_else(CollisionMask::default_entity)
    }

    /// Same prototype, direction, and fixed fields. Position is compared by
    /// the caller, which knows both world offsets.
    pub fn mergeable_with(&self, other: &Entity) -> bool {
        let fixed = |e: &Entity| {
            e.fields
                .iter()
                .filter(|(k, _)| k.as_str() != CONTROL_BEHAVIOR)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        self.name == other.name
            && self.direction == other.direction
            && self.extra == other.extra
            && fixed(self) == fixed(other)
    }

    /// Wire ends and copper neighbours.
    pub fn associations_mut(&mut self) -> impl Iterator<Item = &mut Association> {
        self.connections.targets_mut().chain(self.neighbours.iter_mut())
    }

    /// Fold `other` into this entity: wires and neighbours are unioned, item
    /// requests and tags are overwritten per key, control behaviour replaced.
    pub fn merge(&mut self, other: &Entity) {
        self.connections.merge(&other.connections);
        for neighbour in &other.neighbours {
            if !self.neighbours.contains(neighbour) {
                self.neighbours.push(*neighbour);
            }
        }
        for (item, count) in &other.items {
            self.items.insert(item.clone(), *count);
        }
        for (key, value) in &other.tags {
            self.tags.insert(key.clone(), value.clone());
        }
        if let Some(behavior) = other.control_behavior() {
            self.fields.insert(CONTROL_BEHAVIOR.to_string(), behavior.clone());
        }
    }

    /// Semantic checks against the data table.
    pub fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
        if !ctx.wants_warnings() {
            return Ok(());
        }
        let Some(proto) = ctx.data().entity(&self.name) else {
            return ctx.warn(Warning::UnknownEntity(self.name.clone()));
        };
        if !self.extra.is_empty() {
            ctx.warn(Warning::UnknownKeyword {
                object: self.name.clone(),
                keys: self.extra.keys().cloned().collect(),
            })?;
        }
        if !self.direction.is_cardinal() && !proto.kind.allows_diagonal() {
            ctx.warn(Warning::Direction {
                name: self.name.clone(),
                direction: self.direction.into(),
            })?;
        }
        if let (Some(bar), Some(inventory_size)) = (self.fields.get("bar").and_then(Value::as_u64), proto.inventory_size)
            && bar > inventory_size as u64
        {
            ctx.warn(Warning::Bar { bar, inventory_size })?;
        }
        for item in self.items.keys() {
            if ctx.data().signal_type(item).is_none() {
                ctx.warn(Warning::UnknownSignal(item.clone()))?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A composite of entities and nested groups sharing an origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub id: Option<String>,
    pub position: Vector,
    pub entities: Vec<EntityLike>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_position(mut self, position: impl Into<Vector>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with(mut self, item: impl Into<EntityLike>) -> Self {
        self.entities.push(item.into());
        self
    }

    pub fn push(&mut self, item: impl Into<EntityLike>) {
        self.entities.push(item.into());
    }
}

/// Anything that can live in an entity collection.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityLike {
    Entity(Entity),
    Group(Group),
}

impl EntityLike {
    pub fn id(&self) -> Option<&str> {
        match self {
            EntityLike::Entity(e) => e.id.as_deref(),
            EntityLike::Group(g) => g.id.as_deref(),
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            EntityLike::Entity(e) => Some(e),
            EntityLike::Group(_) => None,
        }
    }
}

impl From<Entity> for EntityLike {
    fn from(e: Entity) -> Self {
        EntityLike::Entity(e)
    }
}

impl From<Group> for EntityLike {
    fn from(g: Group) -> Self {
        EntityLike::Group(g)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
