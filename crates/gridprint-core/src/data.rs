//! Prototype data: what entities, tiles, and signals exist and how big they are.
//!
//! A [`GameData`] table is immutable once built. Blueprints share one behind
//! an `Arc`, so lookups never copy prototypes. Build custom tables with
//! [`GameDataBuilder`]; the default table comes from [`GameData::vanilla`].

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::signal::SignalType;

// ---------------------------------------------------------------------------
// Collision masks
// ---------------------------------------------------------------------------

/// The set of collision layers an object occupies. Two objects collide only
/// if their boxes overlap and their masks share a layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(BTreeSet<String>);

impl CollisionMask {
    pub fn new<I, S>(layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(layers.into_iter().map(Into::into).collect())
    }

    /// Layers occupied by ordinary buildings.
    pub fn default_entity() -> Self {
        Self::new(["item-layer", "object-layer", "player-layer", "water-tile"])
    }

    /// Layers occupied by rails.
    pub fn rail() -> Self {
        Self::new(["item-layer", "object-layer", "floor-layer", "water-tile"])
    }

    /// Layers occupied by placeable floor tiles.
    pub fn ground_tile() -> Self {
        Self::new(["ground-tile"])
    }

    pub fn intersects(&self, other: &CollisionMask) -> bool {
        self.0.iter().any(|layer| other.0.contains(layer))
    }

    pub fn contains(&self, layer: &str) -> bool {
        self.0.contains(layer)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// Broad category of an entity prototype. Decides which extra keys an entity
/// record may carry and which wire operations it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Container,
    LogisticContainer,
    StorageTank,
    AssemblingMachine,
    Furnace,
    Inserter,
    TransportBelt,
    UndergroundBelt,
    Splitter,
    LinkedBelt,
    ElectricPole,
    PowerSwitch,
    ConstantCombinator,
    ArithmeticCombinator,
    DeciderCombinator,
    Lamp,
    Locomotive,
    CargoWagon,
    FluidWagon,
    ArtilleryWagon,
    StraightRail,
    CurvedRail,
    TrainStop,
    RailSignal,
    Turret,
    Radar,
    OffshorePump,
    RocketSilo,
    Generator,
    PlayerPort,
    SimpleEntityWithOwner,
    Generic,
}

impl EntityKind {
    /// Kind-specific keys an entity record of this kind may carry, beyond
    /// the keys every entity shares.
    pub fn known_fields(self) -> &'static [&'static str] {
        use EntityKind::*;
        match self {
            Container => &["bar"],
            LogisticContainer => &["bar", "request_filters", "request_from_buffers", "control_behavior"],
            AssemblingMachine => &["recipe"],
            Inserter => &[
                "control_behavior",
                "override_stack_size",
                "drop_position",
                "pickup_position",
                "filters",
                "filter_mode",
            ],
            TransportBelt | ConstantCombinator | ArithmeticCombinator | DeciderCombinator | Lamp
            | RailSignal | OffshorePump => &["control_behavior"],
            UndergroundBelt => &["type"],
            Splitter => &["input_priority", "output_priority", "filter"],
            LinkedBelt => &["type", "link_id"],
            PowerSwitch => &["switch_state", "control_behavior"],
            Locomotive => &["orientation", "color"],
            CargoWagon => &["orientation", "inventory"],
            FluidWagon => &["orientation"],
            ArtilleryWagon => &["orientation", "artillery_auto_targeting"],
            TrainStop => &["station", "color", "manual_trains_limit", "control_behavior"],
            RocketSilo => &["recipe", "auto_launch"],
            SimpleEntityWithOwner | PlayerPort => &["variation"],
            StorageTank | Furnace | ElectricPole | StraightRail | CurvedRail | Turret | Radar
            | Generator | Generic => &[],
        }
    }

    pub fn is_rolling_stock(self) -> bool {
        matches!(
            self,
            EntityKind::Locomotive | EntityKind::CargoWagon | EntityKind::FluidWagon | EntityKind::ArtilleryWagon
        )
    }

    /// Kinds whose direction may be any of the eight compass points.
    pub fn allows_diagonal(self) -> bool {
        matches!(self, EntityKind::StraightRail | EntityKind::CurvedRail | EntityKind::RailSignal)
            || self.is_rolling_stock()
    }

    /// Kinds with separate input and output circuit sides.
    pub fn has_dual_circuit_sides(self) -> bool {
        matches!(self, EntityKind::ArithmeticCombinator | EntityKind::DeciderCombinator)
    }

    /// Kinds with the two copper terminals of a power switch.
    pub fn has_copper_sides(self) -> bool {
        matches!(self, EntityKind::PowerSwitch)
    }
}

// ---------------------------------------------------------------------------
// Prototypes
// ---------------------------------------------------------------------------

/// Static description of a placeable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPrototype {
    pub name: String,
    pub kind: EntityKind,
    /// Collision box relative to the entity centre, facing north.
    pub collision_box: Aabb,
    pub collision_mask: CollisionMask,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Reach of red/green wires, `None` if not circuit connectable.
    pub circuit_wire_max_distance: Option<f64>,
    /// Reach of copper wires, only meaningful for electric poles.
    pub maximum_wire_distance: Option<f64>,
    pub inventory_size: Option<u16>,
    /// Must be placed on the 2x2 rail grid.
    pub double_grid_aligned: bool,
}

impl EntityPrototype {
    /// A prototype whose tile footprint is its collision box rounded up.
    pub fn new(name: &str, kind: EntityKind, collision_box: Aabb) -> Self {
        let (w, h) = collision_box.dimensions();
        Self {
            name: name.to_string(),
            kind,
            collision_box,
            collision_mask: CollisionMask::default_entity(),
            tile_width: w.max(1),
            tile_height: h.max(1),
            circuit_wire_max_distance: None,
            maximum_wire_distance: None,
            inventory_size: None,
            double_grid_aligned: false,
        }
    }

    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_mask(mut self, mask: CollisionMask) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn with_circuit_reach(mut self, distance: f64) -> Self {
        self.circuit_wire_max_distance = Some(distance);
        self
    }

    pub fn with_wire_reach(mut self, distance: f64) -> Self {
        self.maximum_wire_distance = Some(distance);
        self
    }

    pub fn with_inventory(mut self, slots: u16) -> Self {
        self.inventory_size = Some(slots);
        self
    }

    pub fn on_rail_grid(mut self) -> Self {
        self.double_grid_aligned = true;
        self
    }

    pub fn is_circuit_connectable(&self) -> bool {
        self.circuit_wire_max_distance.is_some()
    }

    pub fn is_power_connectable(&self) -> bool {
        self.kind == EntityKind::ElectricPole
    }
}

/// Static description of a floor tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePrototype {
    pub name: String,
    pub collision_mask: CollisionMask,
}

impl TilePrototype {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collision_mask: CollisionMask::ground_tile(),
        }
    }
}

// ---------------------------------------------------------------------------
// GameData
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("duplicate {table} prototype '{name}'")]
    Duplicate { table: &'static str, name: String },
}

/// Builder for an immutable [`GameData`] table.
#[derive(Debug, Default)]
pub struct GameDataBuilder {
    data: GameData,
}

impl GameDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing table, e.g. to layer mod data over vanilla.
    pub fn from_data(data: &GameData) -> Self {
        Self { data: data.clone() }
    }

    pub fn register_entity(&mut self, prototype: EntityPrototype) -> Result<(), DataError> {
        if self.data.entities.contains_key(&prototype.name) {
            return Err(DataError::Duplicate {
                table: "entity",
                name: prototype.name,
            });
        }
        self.data.entities.insert(prototype.name.clone(), prototype);
        Ok(())
    }

    pub fn register_tile(&mut self, prototype: TilePrototype) -> Result<(), DataError> {
        if self.data.tiles.contains_key(&prototype.name) {
            return Err(DataError::Duplicate {
                table: "tile",
                name: prototype.name,
            });
        }
        self.data.tiles.insert(prototype.name.clone(), prototype);
        Ok(())
    }

    pub fn register_signal(&mut self, name: &str, signal_type: SignalType) -> Result<(), DataError> {
        if self.data.signals.contains_key(name) {
            return Err(DataError::Duplicate {
                table: "signal",
                name: name.to_string(),
            });
        }
        self.data.signals.insert(name.to_string(), signal_type);
        Ok(())
    }

    /// Replace or add an entity prototype without a duplicate check.
    pub fn override_entity(&mut self, prototype: EntityPrototype) {
        self.data.entities.insert(prototype.name.clone(), prototype);
    }

    pub fn build(self) -> GameData {
        self.data
    }
}

/// Immutable prototype table. Thread-safe to share.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    entities: HashMap<String, EntityPrototype>,
    tiles: HashMap<String, TilePrototype>,
    signals: HashMap<String, SignalType>,
}

impl GameData {
    /// The built-in vanilla table, constructed once per process.
    pub fn vanilla() -> Arc<GameData> {
        static VANILLA: OnceLock<Arc<GameData>> = OnceLock::new();
        VANILLA.get_or_init(|| Arc::new(crate::data::vanilla::build())).clone()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityPrototype> {
        self.entities.get(name)
    }

    pub fn tile(&self, name: &str) -> Option<&TilePrototype> {
        self.tiles.get(name)
    }

    pub fn signal_type(&self, name: &str) -> Option<SignalType> {
        self.signals.get(name).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Entity prototype names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

mod vanilla;

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_is_shared() {
        let a = GameData::vanilla();
        let b = GameData::vanilla();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn vanilla_has_core_prototypes() {
        let data = GameData::vanilla();
        let chest = data.entity("wooden-chest").unwrap();
        assert_eq!(chest.kind, EntityKind::Container);
        assert_eq!((chest.tile_width, chest.tile_height), (1, 1));
        assert_eq!(chest.inventory_size, Some(16));

        let pole = data.entity("small-electric-pole").unwrap();
        assert!(pole.is_power_connectable());
        assert!(pole.is_circuit_connectable());

        assert!(data.tile("landfill").is_some());
        assert_eq!(data.signal_type("signal-A"), Some(SignalType::Virtual));
        assert_eq!(data.signal_type("water"), Some(SignalType::Fluid));
        assert_eq!(data.signal_type("iron-plate"), Some(SignalType::Item));
    }

    #[test]
    fn derived_tile_size() {
        let data = GameData::vanilla();
        let assembler = data.entity("assembling-machine-1").unwrap();
        assert_eq!((assembler.tile_width, assembler.tile_height), (3, 3));
        let combinator = data.entity("decider-combinator").unwrap();
        assert_eq!((combinator.tile_width, combinator.tile_height), (1, 2));
    }

    #[test]
    fn builder_rejects_duplicates() {
        let mut builder = GameDataBuilder::new();
        let proto = EntityPrototype::new("crate", EntityKind::Container, Aabb::square(0.35));
        builder.register_entity(proto.clone()).unwrap();
        let result = builder.register_entity(proto);
        assert!(matches!(result, Err(DataError::Duplicate { table: "entity", .. })));

        builder.register_signal("signal-X", SignalType::Virtual).unwrap();
        assert!(builder.register_signal("signal-X", SignalType::Virtual).is_err());
    }

    #[test]
    fn builder_layers_over_existing_table() {
        let vanilla = GameData::vanilla();
        let mut builder = GameDataBuilder::from_data(&vanilla);
        builder
            .register_entity(EntityPrototype::new("mod-chest", EntityKind::Container, Aabb::square(0.35)))
            .unwrap();
        let data = builder.build();
        assert_eq!(data.entity_count(), vanilla.entity_count() + 1);
        assert!(data.entity("wooden-chest").is_some());
    }

    #[test]
    fn mask_intersection() {
        let entity = CollisionMask::default_entity();
        let rail = CollisionMask::rail();
        let floor = CollisionMask::ground_tile();
        assert!(entity.intersects(&rail));
        assert!(!entity.intersects(&floor));
        assert!(rail.contains("floor-layer"));
    }

    #[test]
    fn kind_field_tables() {
        assert!(EntityKind::Container.known_fields().contains(&"bar"));
        assert!(EntityKind::DeciderCombinator.known_fields().contains(&"control_behavior"));
        assert!(EntityKind::Generic.known_fields().is_empty());
        assert!(EntityKind::CargoWagon.is_rolling_stock());
        assert!(EntityKind::StraightRail.allows_diagonal());
        assert!(!EntityKind::Inserter.allows_diagonal());
    }
}
