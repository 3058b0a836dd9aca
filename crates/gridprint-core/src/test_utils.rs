//! Shared fixtures for tests, benches, and fuzz targets.

use serde_json::{Value, json};

use crate::entity::Entity;
use crate::geometry::IntPosition;

/// A wooden chest whose footprint starts at tile `(x, y)`.
pub fn chest_at(x: i32, y: i32) -> Entity {
    Entity::new("wooden-chest", (x as f64 + 0.5, y as f64 + 0.5))
}

/// A small electric pole whose footprint starts at tile `(x, y)`.
pub fn pole_at(x: i32, y: i32) -> Entity {
    Entity::new("small-electric-pole", (x as f64 + 0.5, y as f64 + 0.5))
}

/// A decider combinator occupying tiles `(x, y)` and `(x, y + 1)`.
pub fn decider_at(x: i32, y: i32) -> Entity {
    Entity::new("decider-combinator", (x as f64 + 0.5, y as f64 + 1.0))
}

/// A row of `n` wooden chests along the x axis, one tile apart.
pub fn chest_row(n: usize) -> Vec<Entity> {
    (0..n as i32).map(|x| chest_at(x, 0)).collect()
}

/// Coordinates of a `side` by `side` square of tiles starting at `origin`.
pub fn tile_square(side: i32, origin: IntPosition) -> Vec<(i32, i32)> {
    (0..side)
        .flat_map(|y| (0..side).map(move |x| (origin.x + x, origin.y + y)))
        .collect()
}

/// The external form of a blueprint with two wired chests, a tile, and a
/// one-stop schedule for a locomotive.
pub fn sample_blueprint_value() -> Value {
    json!({
        "blueprint": {
            "item": "blueprint",
            "label": "Sample",
            "label_color": {"r": 0.5, "g": 0.25, "b": 1.0},
            "icons": [{"signal": {"name": "wooden-chest", "type": "item"}, "index": 1}],
            "version": 281479278886912u64,
            "entities": [
                {
                    "entity_number": 1,
                    "name": "wooden-chest",
                    "position": {"x": 0.5, "y": 0.5},
                    "connections": {"1": {"red": [{"entity_id": 2}]}}
                },
                {
                    "entity_number": 2,
                    "name": "wooden-chest",
                    "position": {"x": 5.5, "y": 0.5},
                    "connections": {"1": {"red": [{"entity_id": 1}]}}
                },
                {
                    "entity_number": 3,
                    "name": "locomotive",
                    "position": {"x": 10, "y": 3},
                    "orientation": 0.25
                }
            ],
            "tiles": [
                {"name": "concrete", "position": {"x": 0, "y": 2}}
            ],
            "schedules": [
                {
                    "schedule": [
                        {"station": "Iron", "wait_conditions": [{"type": "full", "compare_type": "or"}]}
                    ],
                    "locomotives": [3]
                }
            ]
        }
    })
}
