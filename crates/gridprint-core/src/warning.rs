//! Non-fatal problems found while building or validating a blueprint.
//!
//! A blueprint carrying warnings still imports in-game, but probably not the
//! way its author intended. Warnings are returned to callers alongside the
//! result and logged at `warn` level as they are recorded.

use crate::geometry::Vector;
use crate::signal::SignalType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("'{object}' object has no attribute(s) {keys:?}; allowed fields are ignored in-game")]
    UnknownKeyword { object: String, keys: Vec<String> },
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("unknown tile '{0}'")]
    UnknownTile(String),
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),
    #[error("known signal '{name}' was given a mismatching type (expected '{expected}', found '{found}')")]
    MalformedSignal {
        name: String,
        expected: SignalType,
        found: SignalType,
    },
    #[error("'{name}' at {position} intersects '{other}'")]
    OverlappingObjects {
        name: String,
        other: String,
        position: Vector,
    },
    #[error("'{name}' only supports cardinal directions, found {direction}")]
    Direction { name: String, direction: u8 },
    #[error("bar index {bar} exceeds inventory size {inventory_size}")]
    Bar { bar: u64, inventory_size: u16 },
    #[error("wire distance {distance:.2} exceeds reach {reach}")]
    ConnectionDistance { distance: f64, reach: f64 },
    #[error("'{name}' has {count} power connections; only 5 are permitted in-game")]
    TooManyConnections { name: String, count: usize },
    #[error("{0}")]
    Value(String),
}
