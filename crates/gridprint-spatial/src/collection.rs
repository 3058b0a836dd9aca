//! Ordered, spatially indexed collections of entities and tiles.
//!
//! Each collection owns an arena of its objects, a separate order vector for
//! the top-level sequence, and a [`SpatialIndex`] over primitive objects.
//! Groups live in the same arena as their members: a group slot lists its
//! children and every child records its parent, so membership can be walked
//! in either direction without ownership cycles.
//!
//! Mutations take the blueprint's running [`Extent`] and a
//! [`ValidationContext`] explicitly. Overlap warnings go through the context,
//! so under pedantic validation they fail the mutation. A mutation that fails
//! that way, or would push the blueprint past the size limit, is rolled back
//! before the error is returned, leaving both the collection and the extent
//! as they were.

use std::collections::HashMap;

use gridprint_core::data::GameData;
use gridprint_core::entity::{Entity, EntityLike, Group};
use gridprint_core::error::BlueprintError;
use gridprint_core::geometry::{Aabb, Extent, Vector};
use gridprint_core::id::{Association, AssociationScope, EntityId, ListId, TileId};
use gridprint_core::tile::Tile;
use gridprint_core::validation::ValidationContext;
use gridprint_core::warning::Warning;
use slotmap::SlotMap;

use crate::{Decomposable, Overlap, SpatialIndex, SpatialLike};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A group as stored in the arena: its metadata and its member keys.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub id: Option<String>,
    pub position: Vector,
    pub children: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityNode {
    Entity(Entity),
    Group(GroupNode),
}

/// One arena slot of an [`EntityList`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySlot {
    pub parent: Option<EntityId>,
    /// Sum of the positions of every enclosing group.
    pub offset: Vector,
    pub node: EntityNode,
}

impl EntitySlot {
    pub fn entity(&self) -> Option<&Entity> {
        match &self.node {
            EntityNode::Entity(e) => Some(e),
            EntityNode::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&GroupNode> {
        match &self.node {
            EntityNode::Group(g) => Some(g),
            EntityNode::Entity(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.node {
            EntityNode::Entity(e) => e.id.as_deref(),
            EntityNode::Group(g) => g.id.as_deref(),
        }
    }

    pub fn world_position(&self) -> Vector {
        match &self.node {
            EntityNode::Entity(e) => self.offset + e.position,
            EntityNode::Group(g) => self.offset + g.position,
        }
    }

    pub fn world_box(&self, data: &GameData) -> Option<Aabb> {
        self.entity().map(|e| e.world_box(data, self.offset))
    }
}

impl SpatialLike for EntitySlot {
    fn name(&self) -> &str {
        match &self.node {
            EntityNode::Entity(e) => &e.name,
            EntityNode::Group(_) => "group",
        }
    }

    fn world_position(&self) -> Vector {
        EntitySlot::world_position(self)
    }

    fn collides_with(&self, other: &Self, data: &GameData) -> bool {
        match (self.entity(), other.entity()) {
            (Some(a), Some(b)) => a.collision_mask(data).intersects(&b.collision_mask(data)),
            _ => false,
        }
    }

    fn mergeable_with(&self, other: &Self) -> bool {
        match (self.entity(), other.entity()) {
            (Some(a), Some(b)) => {
                EntitySlot::world_position(self).approx_eq(EntitySlot::world_position(other)) && a.mergeable_with(b)
            }
            _ => false,
        }
    }

    fn merge(&mut self, other: &Self) {
        if let (EntityNode::Entity(a), Some(b)) = (&mut self.node, other.entity()) {
            a.merge(b);
        }
    }
}

impl Decomposable<EntityId> for SlotMap<EntityId, EntitySlot> {
    fn primitives(&self, key: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        collect_leaves(self, key, &mut out);
        out
    }

    fn world_box(&self, key: EntityId, data: &GameData) -> Option<Aabb> {
        self.get(key)?.world_box(data)
    }
}

fn collect_leaves(arena: &SlotMap<EntityId, EntitySlot>, key: EntityId, out: &mut Vec<EntityId>) {
    match arena.get(key).map(|slot| &slot.node) {
        Some(EntityNode::Entity(_)) => out.push(key),
        Some(EntityNode::Group(g)) => {
            for child in &g.children {
                collect_leaves(arena, *child, out);
            }
        }
        None => {}
    }
}

impl SpatialLike for Tile {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_position(&self) -> Vector {
        Vector::from(self.position)
    }

    fn collides_with(&self, other: &Self, data: &GameData) -> bool {
        self.collision_mask(data).intersects(&other.collision_mask(data))
    }

    fn mergeable_with(&self, other: &Self) -> bool {
        Tile::mergeable_with(self, other)
    }

    fn merge(&mut self, other: &Self) {
        Tile::merge(self, other)
    }
}

impl Decomposable<TileId> for SlotMap<TileId, Tile> {
    fn primitives(&self, key: TileId) -> Vec<TileId> {
        if self.contains_key(key) { vec![key] } else { Vec::new() }
    }

    fn world_box(&self, key: TileId, _data: &GameData) -> Option<Aabb> {
        self.get(key).map(Tile::world_box)
    }
}

/// What happened to an object handed to a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement<K> {
    /// Stored under `key`; `warnings` lists what was found on the way in.
    Inserted { key: K, warnings: Vec<Warning> },
    /// Folded into the existing object `into`; nothing new was stored.
    Merged { into: K, warnings: Vec<Warning> },
}

impl<K: Copy> Placement<K> {
    /// Key of the object that now represents the placed value.
    pub fn key(&self) -> K {
        match self {
            Placement::Inserted { key, .. } => *key,
            Placement::Merged { into, .. } => *into,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Placement::Merged { .. })
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Placement::Inserted { warnings, .. } | Placement::Merged { warnings, .. } => warnings,
        }
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        match self {
            Placement::Inserted { warnings, .. } | Placement::Merged { warnings, .. } => warnings,
        }
    }

    /// The same placement reporting `warnings` instead.
    pub fn with_warnings(self, warnings: Vec<Warning>) -> Self {
        match self {
            Placement::Inserted { key, .. } => Placement::Inserted { key, warnings },
            Placement::Merged { into, .. } => Placement::Merged { into, warnings },
        }
    }
}

/// Pass overlap warnings through `ctx`, keeping only those the mode reports.
fn vet(warnings: Vec<Warning>, ctx: &mut ValidationContext<'_>) -> Result<Vec<Warning>, BlueprintError> {
    if !ctx.wants_warnings() {
        return Ok(Vec::new());
    }
    ctx.extend(warnings.iter().cloned())?;
    Ok(warnings)
}

fn check_index(index: usize, len: usize) -> Result<(), BlueprintError> {
    if index > len {
        return Err(BlueprintError::IndexOutOfRange { index, len });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// EntityList
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EntityList {
    id: ListId,
    arena: SlotMap<EntityId, EntitySlot>,
    order: Vec<EntityId>,
    index: SpatialIndex<EntityId>,
}

impl Default for EntityList {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationScope for EntityList {
    fn list_id(&self) -> ListId {
        self.id
    }

    fn holds(&self, id: EntityId) -> bool {
        self.arena.contains_key(id)
    }
}

impl EntityList {
    pub fn new() -> Self {
        Self {
            id: ListId::fresh(),
            arena: SlotMap::with_key(),
            order: Vec::new(),
            index: SpatialIndex::new(),
        }
    }

    pub fn list_id(&self) -> ListId {
        self.id
    }

    /// An association to `id` that resolves in this list only.
    pub fn associate(&self, id: EntityId) -> Association {
        Association::new(self.id, id)
    }

    /// Number of top-level members.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Top-level members in order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    pub fn get(&self, id: EntityId) -> Option<&EntitySlot> {
        self.arena.get(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)?.entity()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.order.iter().position(|k| *k == id)
    }

    pub fn at(&self, index: usize) -> Option<EntityId> {
        self.order.get(index).copied()
    }

    pub fn spatial_index(&self) -> &SpatialIndex<EntityId> {
        &self.index
    }

    pub fn world_position(&self, id: EntityId) -> Option<Vector> {
        self.arena.get(id).map(EntitySlot::world_position)
    }

    /// Every primitive entity, depth-first in top-level order. This is the
    /// order entities are numbered in on export.
    pub fn leaves(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        for key in &self.order {
            collect_leaves(&self.arena, *key, &mut out);
        }
        out
    }

    /// World boxes of every primitive entity.
    pub fn leaf_boxes(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.index.boxes()
    }

    pub fn append(
        &mut self,
        item: impl Into<EntityLike>,
        merge: bool,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        self.insert(self.order.len(), item, merge, ctx, extent)
    }

    /// Insert at `index`, merging into an existing entity if allowed.
    pub fn insert(
        &mut self,
        index: usize,
        item: impl Into<EntityLike>,
        merge: bool,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        check_index(index, self.order.len())?;
        let (key, warnings) = match self.place(item.into(), None, Vector::ZERO, merge, ctx.data()) {
            Placement::Inserted { key, warnings } => (key, warnings),
            merged => return Ok(merged),
        };
        let warnings = match vet(warnings, ctx) {
            Ok(warnings) => warnings,
            Err(e) => {
                self.discard(key);
                return Err(e);
            }
        };

        let bounds = self
            .arena
            .primitives(key)
            .into_iter()
            .filter_map(|leaf| self.index.bounding_box(leaf))
            .reduce(|a, b| a.union(&b));
        if let Some(bounds) = bounds {
            if let Err(e) = extent.extend(bounds) {
                tracing::debug!(?key, "insertion exceeds size limit, rolling back");
                self.discard(key);
                return Err(e);
            }
        }

        self.order.insert(index, key);
        Ok(Placement::Inserted { key, warnings })
    }

    /// Replace the member at `index`. The replacement never merges.
    ///
    /// The extent is recomputed from the remaining entities plus `others`
    /// (the boxes of whatever else shares the blueprint).
    pub fn set(
        &mut self,
        index: usize,
        item: impl Into<EntityLike>,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
        others: impl IntoIterator<Item = Aabb>,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        let Some(&old) = self.order.get(index) else {
            return Err(BlueprintError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        };
        let old_leaves: Vec<(EntityId, Aabb)> = self
            .arena
            .primitives(old)
            .into_iter()
            .filter_map(|leaf| self.index.remove(leaf).map(|b| (leaf, b)))
            .collect();

        let placement = self.place(item.into(), None, Vector::ZERO, false, ctx.data());
        let key = placement.key();
        let recomputed = Extent::from_boxes(self.index.boxes().chain(others));
        let checked = vet(placement.into_warnings(), ctx).and_then(|w| recomputed.check().map(|()| w));
        let warnings = match checked {
            Ok(warnings) => warnings,
            Err(e) => {
                tracing::debug!(?key, "replacement rejected, rolling back");
                self.discard(key);
                for (leaf, aabb) in old_leaves {
                    self.index.add(leaf, aabb);
                }
                return Err(e);
            }
        };

        self.order[index] = key;
        self.take_subtree(old);
        *extent = recomputed;
        Ok(Placement::Inserted { key, warnings })
    }

    /// Remove the member at `index`. The extent is not shrunk.
    pub fn remove(&mut self, index: usize) -> Result<EntityLike, BlueprintError> {
        let Some(&key) = self.order.get(index) else {
            return Err(BlueprintError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        };
        self.remove_id(key).ok_or(BlueprintError::EntityNotFound)
    }

    /// Remove any member, top-level or nested, together with its subtree.
    pub fn remove_id(&mut self, id: EntityId) -> Option<EntityLike> {
        let parent = self.arena.get(id)?.parent;
        match parent {
            None => self.order.retain(|k| *k != id),
            Some(parent) => {
                if let Some(EntitySlot {
                    node: EntityNode::Group(g),
                    ..
                }) = self.arena.get_mut(parent)
                {
                    g.children.retain(|k| *k != id);
                }
            }
        }
        self.index.recursive_remove(&self.arena, id);
        self.take_subtree(id)
    }

    /// Edit an entity in place and re-index it.
    pub fn modify<F>(&mut self, id: EntityId, data: &GameData, f: F) -> Result<(), BlueprintError>
    where
        F: FnOnce(&mut Entity),
    {
        let Some(EntitySlot {
            node: EntityNode::Entity(entity),
            offset,
            ..
        }) = self.arena.get_mut(id)
        else {
            return Err(BlueprintError::EntityNotFound);
        };
        f(entity);
        let area = entity.world_box(data, *offset);
        self.index.add(id, area);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
        self.index.clear();
    }

    /// Resolve a dotted id path such as `"station.inserter"`.
    pub fn find_by_id(&self, path: &str) -> Option<EntityId> {
        let mut candidates: &[EntityId] = &self.order;
        let mut found = None;
        for segment in path.split('.') {
            let key = *candidates
                .iter()
                .find(|k| self.arena.get(**k).and_then(EntitySlot::id) == Some(segment))?;
            candidates = match &self.arena[key].node {
                EntityNode::Group(g) => &g.children,
                EntityNode::Entity(_) => &[],
            };
            found = Some(key);
        }
        found
    }

    /// Primitive entities matching `name` whose boxes overlap `area`.
    pub fn find_filtered(&self, name: Option<&str>, area: Option<Aabb>) -> Vec<EntityId> {
        self.leaves()
            .into_iter()
            .filter(|k| match name {
                Some(name) => self.entity(*k).is_some_and(|e| e.name == name),
                None => true,
            })
            .filter(|k| match area {
                Some(area) => self.index.bounding_box(*k).is_some_and(|b| b.overlaps(&area)),
                None => true,
            })
            .collect()
    }

    /// One warning per pair of colliding primitive entities.
    pub fn overlap_warnings(&self, data: &GameData) -> Vec<Warning> {
        let leaves = self.leaves();
        let rank: HashMap<EntityId, usize> = leaves.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        let mut warnings = Vec::new();
        for (i, key) in leaves.iter().enumerate() {
            let (Some(slot), Some(area)) = (self.arena.get(*key), self.index.bounding_box(*key)) else {
                continue;
            };
            for other in self.index.query(area) {
                if rank.get(&other).is_none_or(|j| *j <= i) {
                    continue;
                }
                let other_slot = &self.arena[other];
                if other_slot.collides_with(slot, data) {
                    warnings.push(Warning::OverlappingObjects {
                        name: other_slot.name().to_string(),
                        other: slot.name().to_string(),
                        position: other_slot.world_position(),
                    });
                }
            }
        }
        warnings
    }

    /// Deep copy with a freshly built spatial index. The copy is a new list:
    /// keys are preserved and associations between members are moved over
    /// to it, so they resolve in the copy and not in the original.
    pub fn duplicate(&self, data: &GameData) -> Self {
        let mut copy = Self {
            id: ListId::fresh(),
            arena: self.arena.clone(),
            order: self.order.clone(),
            index: SpatialIndex::new(),
        };
        for slot in copy.arena.values_mut() {
            if let EntityNode::Entity(entity) = &mut slot.node {
                for target in entity.associations_mut() {
                    target.rescope(self.id, copy.id);
                }
            }
        }
        for key in &copy.order {
            copy.index.recursive_add(&copy.arena, *key, data);
        }
        copy
    }

    fn place(
        &mut self,
        item: EntityLike,
        parent: Option<EntityId>,
        offset: Vector,
        merge: bool,
        data: &GameData,
    ) -> Placement<EntityId> {
        match item {
            EntityLike::Entity(entity) => {
                let area = entity.world_box(data, offset);
                let slot = EntitySlot {
                    parent,
                    offset,
                    node: EntityNode::Entity(entity),
                };
                match self.index.handle_overlapping(&mut self.arena, &slot, area, merge, data) {
                    Overlap::Merged(into) => Placement::Merged {
                        into,
                        warnings: Vec::new(),
                    },
                    Overlap::Clear(warnings) => {
                        let key = self.arena.insert(slot);
                        self.index.add(key, area);
                        Placement::Inserted { key, warnings }
                    }
                }
            }
            EntityLike::Group(Group { id, position, entities }) => {
                let key = self.arena.insert(EntitySlot {
                    parent,
                    offset,
                    node: EntityNode::Group(GroupNode {
                        id,
                        position,
                        children: Vec::new(),
                    }),
                });
                let child_offset = offset + position;
                let mut children = Vec::with_capacity(entities.len());
                let mut warnings = Vec::new();
                for child in entities {
                    match self.place(child, Some(key), child_offset, merge, data) {
                        Placement::Inserted { key: child, warnings: w } => {
                            children.push(child);
                            warnings.extend(w);
                        }
                        Placement::Merged { into, .. } => {
                            tracing::debug!(?into, "group member merged away");
                        }
                    }
                }
                if let Some(EntityNode::Group(g)) = self.arena.get_mut(key).map(|s| &mut s.node) {
                    g.children = children;
                }
                Placement::Inserted { key, warnings }
            }
        }
    }

    /// Unindex and drop a subtree that is not referenced from `order`.
    fn discard(&mut self, key: EntityId) {
        self.index.recursive_remove(&self.arena, key);
        self.take_subtree(key);
    }

    /// Remove a subtree from the arena and rebuild it as a value.
    fn take_subtree(&mut self, key: EntityId) -> Option<EntityLike> {
        let slot = self.arena.remove(key)?;
        match slot.node {
            EntityNode::Entity(entity) => Some(entity.into()),
            EntityNode::Group(g) => {
                let entities = g.children.into_iter().filter_map(|c| self.take_subtree(c)).collect();
                Some(
                    Group {
                        id: g.id,
                        position: g.position,
                        entities,
                    }
                    .into(),
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TileList
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TileList {
    arena: SlotMap<TileId, Tile>,
    order: Vec<TileId>,
    index: SpatialIndex<TileId>,
}

impl TileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &Tile)> + '_ {
        self.order.iter().map(|k| (*k, &self.arena[*k]))
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.arena.get(id)
    }

    pub fn at(&self, index: usize) -> Option<TileId> {
        self.order.get(index).copied()
    }

    pub fn boxes(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.index.boxes()
    }

    pub fn append(
        &mut self,
        tile: Tile,
        merge: bool,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
    ) -> Result<Placement<TileId>, BlueprintError> {
        self.insert(self.order.len(), tile, merge, ctx, extent)
    }

    pub fn insert(
        &mut self,
        index: usize,
        tile: Tile,
        merge: bool,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
    ) -> Result<Placement<TileId>, BlueprintError> {
        check_index(index, self.order.len())?;
        let area = tile.world_box();
        let warnings = match self.index.handle_overlapping(&mut self.arena, &tile, area, merge, ctx.data()) {
            Overlap::Merged(into) => {
                return Ok(Placement::Merged {
                    into,
                    warnings: Vec::new(),
                });
            }
            Overlap::Clear(warnings) => vet(warnings, ctx)?,
        };
        extent.extend(area)?;
        let key = self.arena.insert(tile);
        self.index.add(key, area);
        self.order.insert(index, key);
        Ok(Placement::Inserted { key, warnings })
    }

    pub fn set(
        &mut self,
        index: usize,
        tile: Tile,
        ctx: &mut ValidationContext<'_>,
        extent: &mut Extent,
        others: impl IntoIterator<Item = Aabb>,
    ) -> Result<Placement<TileId>, BlueprintError> {
        let Some(&old) = self.order.get(index) else {
            return Err(BlueprintError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        };
        let old_box = self.index.remove(old);
        let area = tile.world_box();
        let warnings = match self.index.handle_overlapping(&mut self.arena, &tile, area, false, ctx.data()) {
            Overlap::Clear(warnings) => warnings,
            Overlap::Merged(_) => Vec::new(),
        };
        let recomputed = Extent::from_boxes(self.index.boxes().chain(std::iter::once(area)).chain(others));
        let checked = vet(warnings, ctx).and_then(|w| recomputed.check().map(|()| w));
        let warnings = match checked {
            Ok(warnings) => warnings,
            Err(e) => {
                if let Some(b) = old_box {
                    self.index.add(old, b);
                }
                return Err(e);
            }
        };

        self.arena.remove(old);
        let key = self.arena.insert(tile);
        self.index.add(key, area);
        self.order[index] = key;
        *extent = recomputed;
        Ok(Placement::Inserted { key, warnings })
    }

    /// Remove the tile at `index`. The extent is not shrunk.
    pub fn remove(&mut self, index: usize) -> Result<Tile, BlueprintError> {
        if index >= self.order.len() {
            return Err(BlueprintError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        }
        let key = self.order.remove(index);
        self.index.remove(key);
        self.arena.remove(key).ok_or(BlueprintError::IndexOutOfRange {
            index,
            len: self.order.len(),
        })
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
        self.index.clear();
    }

    pub fn overlap_warnings(&self, data: &GameData) -> Vec<Warning> {
        let rank: HashMap<TileId, usize> = self.order.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        let mut warnings = Vec::new();
        for (i, (key, tile)) in self.iter().enumerate() {
            for other in self.index.query(tile.world_box()) {
                if other == key || rank.get(&other).is_none_or(|j| *j <= i) {
                    continue;
                }
                let other_tile = &self.arena[other];
                if other_tile.collides_with(tile, data) {
                    warnings.push(Warning::OverlappingObjects {
                        name: other_tile.name.clone(),
                        other: tile.name.clone(),
                        position: SpatialLike::world_position(other_tile),
                    });
                }
            }
        }
        warnings
    }

    pub fn duplicate(&self, data: &GameData) -> Self {
        let mut copy = Self {
            arena: self.arena.clone(),
            order: self.order.clone(),
            index: SpatialIndex::new(),
        };
        for key in &copy.order {
            copy.index.recursive_add(&copy.arena, *key, data);
        }
        copy
    }
}

// ===========================================================================
// Tests
// ===========================================================================
