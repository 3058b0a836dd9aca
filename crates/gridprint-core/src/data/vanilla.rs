//! The built-in prototype table.

use crate::data::{CollisionMask, EntityKind, EntityPrototype, GameData, TilePrototype};
use crate::geometry::Aabb;
use crate::signal::SignalType;

use EntityKind::*;

const CHEST: Aabb = Aabb::square(0.35);
const SMALL: Aabb = Aabb::square(0.15);
const BELT: Aabb = Aabb::square(0.4);
const MACHINE_3X3: Aabb = Aabb::square(1.2);
const COMBINATOR: Aabb = Aabb::new(-0.35, -0.65, 0.35, 0.65);
const LOCOMOTIVE: Aabb = Aabb::new(-0.6, -2.6, 0.6, 2.6);
const WAGON: Aabb = Aabb::new(-0.6, -2.4, 0.6, 2.4);

fn entities() -> Vec<EntityPrototype> {
    let mut out = vec![
        EntityPrototype::new("wooden-chest", Container, CHEST).with_inventory(16).with_circuit_reach(9.0),
        EntityPrototype::new("iron-chest", Container, CHEST).with_inventory(32).with_circuit_reach(9.0),
        EntityPrototype::new("steel-chest", Container, CHEST).with_inventory(48).with_circuit_reach(9.0),
        EntityPrototype::new("storage-tank", StorageTank, Aabb::square(1.3)).with_circuit_reach(9.0),
        EntityPrototype::new("assembling-machine-1", AssemblingMachine, MACHINE_3X3),
        EntityPrototype::new("assembling-machine-2", AssemblingMachine, MACHINE_3X3),
        EntityPrototype::new("assembling-machine-3", AssemblingMachine, MACHINE_3X3),
        EntityPrototype::new("stone-furnace", Furnace, Aabb::square(0.8)),
        EntityPrototype::new("steel-furnace", Furnace, Aabb::square(0.875)),
        EntityPrototype::new("electric-furnace", Furnace, MACHINE_3X3),
        EntityPrototype::new("linked-belt", LinkedBelt, BELT),
        EntityPrototype::new("small-electric-pole", ElectricPole, SMALL)
            .with_wire_reach(7.5)
            .with_circuit_reach(7.5),
        EntityPrototype::new("medium-electric-pole", ElectricPole, SMALL)
            .with_wire_reach(9.0)
            .with_circuit_reach(9.0),
        EntityPrototype::new("big-electric-pole", ElectricPole, Aabb::square(0.65))
            .with_wire_reach(30.0)
            .with_circuit_reach(30.0),
        EntityPrototype::new("substation", ElectricPole, Aabb::square(0.7))
            .with_wire_reach(18.0)
            .with_circuit_reach(18.0),
        EntityPrototype::new("power-switch", PowerSwitch, Aabb::square(0.7)).with_circuit_reach(10.0),
        EntityPrototype::new("constant-combinator", ConstantCombinator, CHEST).with_circuit_reach(9.0),
        EntityPrototype::new("arithmetic-combinator", ArithmeticCombinator, COMBINATOR).with_circuit_reach(9.0),
        EntityPrototype::new("decider-combinator", DeciderCombinator, COMBINATOR).with_circuit_reach(9.0),
        EntityPrototype::new("small-lamp", Lamp, SMALL).with_circuit_reach(9.0),
        EntityPrototype::new("locomotive", Locomotive, LOCOMOTIVE).with_tile_size(2, 6),
        EntityPrototype::new("cargo-wagon", CargoWagon, WAGON)
            .with_tile_size(2, 6)
            .with_inventory(40),
        EntityPrototype::new("fluid-wagon", FluidWagon, WAGON).with_tile_size(2, 6),
        EntityPrototype::new("artillery-wagon", ArtilleryWagon, WAGON).with_tile_size(2, 6),
        EntityPrototype::new("straight-rail", StraightRail, Aabb::new(-0.7, -0.99, 0.7, 0.99))
            .with_mask(CollisionMask::rail())
            .on_rail_grid(),
        EntityPrototype::new("curved-rail", CurvedRail, Aabb::new(-0.75, -0.55, 0.75, 1.6))
            .with_mask(CollisionMask::rail())
            .with_tile_size(4, 8)
            .on_rail_grid(),
        EntityPrototype::new("train-stop", TrainStop, Aabb::square(0.5))
            .with_tile_size(2, 2)
            .with_circuit_reach(9.0)
            .on_rail_grid(),
        EntityPrototype::new("rail-signal", RailSignal, Aabb::square(0.2)).with_circuit_reach(9.0),
        EntityPrototype::new("rail-chain-signal", RailSignal, Aabb::square(0.2)).with_circuit_reach(9.0),
        EntityPrototype::new("gun-turret", Turret, Aabb::square(0.9)),
        EntityPrototype::new("laser-turret", Turret, Aabb::square(0.9)),
        EntityPrototype::new("flamethrower-turret", Turret, Aabb::new(-0.7, -1.2, 0.7, 1.2)).with_tile_size(2, 3),
        EntityPrototype::new("radar", Radar, Aabb::square(1.4)),
        EntityPrototype::new("offshore-pump", OffshorePump, Aabb::new(-0.6, -1.05, 0.6, 0.3))
            .with_tile_size(1, 2)
            .with_circuit_reach(9.0),
        EntityPrototype::new("rocket-silo", RocketSilo, Aabb::square(4.4)),
        EntityPrototype::new("steam-engine", Generator, Aabb::new(-1.35, -2.35, 1.35, 2.35)),
        EntityPrototype::new("player-port", PlayerPort, Aabb::square(0.3)).with_tile_size(2, 2),
        EntityPrototype::new("simple-entity-with-owner", SimpleEntityWithOwner, Aabb::square(0.3)),
    ];

    for name in [
        "logistic-chest-passive-provider",
        "logistic-chest-active-provider",
        "logistic-chest-storage",
        "logistic-chest-requester",
        "logistic-chest-buffer",
    ] {
        out.push(
            EntityPrototype::new(name, LogisticContainer, CHEST)
                .with_inventory(48)
                .with_circuit_reach(9.0),
        );
    }

    for name in [
        "burner-inserter",
        "inserter",
        "long-handed-inserter",
        "fast-inserter",
        "filter-inserter",
        "stack-inserter",
        "stack-filter-inserter",
    ] {
        out.push(EntityPrototype::new(name, Inserter, SMALL).with_circuit_reach(9.0));
    }

    for tier in ["", "fast-", "express-"] {
        out.push(EntityPrototype::new(&format!("{tier}transport-belt"), TransportBelt, BELT).with_circuit_reach(9.0));
        out.push(EntityPrototype::new(&format!("{tier}underground-belt"), UndergroundBelt, BELT));
        out.push(EntityPrototype::new(
            &format!("{tier}splitter"),
            Splitter,
            Aabb::new(-0.9, -0.4, 0.9, 0.4),
        ));
    }

    out
}

const TILES: &[&str] = &[
    "stone-path",
    "concrete",
    "hazard-concrete-left",
    "hazard-concrete-right",
    "refined-concrete",
    "refined-hazard-concrete-left",
    "refined-hazard-concrete-right",
    "landfill",
];

const ITEMS: &[&str] = &[
    "wood",
    "coal",
    "stone",
    "iron-ore",
    "copper-ore",
    "uranium-ore",
    "iron-plate",
    "copper-plate",
    "steel-plate",
    "stone-brick",
    "plastic-bar",
    "sulfur",
    "iron-gear-wheel",
    "copper-cable",
    "electronic-circuit",
    "advanced-circuit",
    "processing-unit",
    "engine-unit",
    "electric-engine-unit",
    "battery",
    "rail",
    "landfill",
    "concrete",
    "refined-concrete",
    "automation-science-pack",
    "logistic-science-pack",
    "military-science-pack",
    "chemical-science-pack",
    "production-science-pack",
    "utility-science-pack",
    "space-science-pack",
];

const FLUIDS: &[&str] = &[
    "water",
    "steam",
    "crude-oil",
    "heavy-oil",
    "light-oil",
    "petroleum-gas",
    "lubricant",
    "sulfuric-acid",
];

const VIRTUAL_SPECIAL: &[&str] = &[
    "signal-red",
    "signal-green",
    "signal-blue",
    "signal-yellow",
    "signal-pink",
    "signal-cyan",
    "signal-white",
    "signal-grey",
    "signal-black",
    "signal-check",
    "signal-info",
    "signal-dot",
    "signal-everything",
    "signal-anything",
    "signal-each",
];

pub(crate) fn build() -> GameData {
    let mut data = GameData::default();

    for proto in entities() {
        // Placeable entities are also item signals, except rails which share "rail".
        if !matches!(proto.kind, StraightRail | CurvedRail) {
            data.signals.insert(proto.name.clone(), SignalType::Item);
        }
        data.entities.insert(proto.name.clone(), proto);
    }

    for name in TILES {
        data.tiles.insert((*name).to_string(), TilePrototype::new(name));
    }

    for name in ITEMS {
        data.signals.insert((*name).to_string(), SignalType::Item);
    }
    for name in FLUIDS {
        data.signals.insert((*name).to_string(), SignalType::Fluid);
    }
    for c in ('A'..='Z').chain('0'..='9') {
        data.signals.insert(format!("signal-{c}"), SignalType::Virtual);
    }
    for name in VIRTUAL_SPECIAL {
        data.signals.insert((*name).to_string(), SignalType::Virtual);
    }

    data
}
