use serde_json::{Map, Value};

use crate::data::{CollisionMask, GameData};
use crate::error::BlueprintError;
use crate::geometry::{Aabb, IntPosition, Vector};
use crate::validation::ValidationContext;
use crate::warning::Warning;

/// A floor tile occupying one grid square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub name: String,
    /// Top-left corner of the square.
    pub position: IntPosition,
    /// Unrecognised keys, carried through to export.
    pub extra: Map<String, Value>,
}

impl Tile {
    pub fn new(name: &str, position: impl Into<IntPosition>) -> Self {
        Self {
            name: name.to_string(),
            position: position.into(),
            extra: Map::new(),
        }
    }

    pub fn world_box(&self) -> Aabb {
        let min = Vector::from(self.position);
        Aabb::new(min.x, min.y, min.x + 1.0, min.y + 1.0)
    }

    pub fn collision_mask(&self, data: &GameData) -> CollisionMask {
        data.tile(&self.name)
            .map(|p| p.collision_mask.clone())
            .unwrap_or_else(CollisionMask::ground_tile)
    }

    /// Tiles only merge when they are the same tile on the same square.
    pub fn mergeable_with(&self, other: &Tile) -> bool {
        self.name == other.name && self.position == other.position
    }

    pub fn merge(&mut self, other: &Tile) {
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
        if !ctx.wants_warnings() {
            return Ok(());
        }
        if ctx.data().tile(&self.name).is_none() {
            ctx.warn(Warning::UnknownTile(self.name.clone()))?;
        }
        if !self.extra.is_empty() {
            ctx.warn(Warning::UnknownKeyword {
                object: self.name.clone(),
                keys: self.extra.keys().cloned().collect(),
            })?;
        }
        Ok(())
    }
}
