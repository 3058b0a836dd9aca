//! Spatial bookkeeping for blueprints: the overlap index, the ordered
//! entity / tile / schedule collections built on it, and the [`Blueprint`]
//! aggregate that ties them to metadata and import / export.
//!
//! The index is a spatial hash over fixed-size cells. Every primitive object
//! (entity or tile) is registered with its world-space bounding box; groups
//! are never indexed themselves, only their leaves. Candidate lookup is
//! cell-based and answers are filtered against the exact boxes, so callers
//! only ever see objects whose boxes truly intersect the query.

use std::collections::{HashMap, HashSet};

use gridprint_core::data::GameData;
use gridprint_core::geometry::{Aabb, Vector};
use gridprint_core::warning::Warning;
use slotmap::{Key, SecondaryMap, SlotMap};

pub mod association;
pub mod blueprint;
pub mod collection;
pub mod schedule_list;

pub use blueprint::Blueprint;
pub use collection::{EntityList, EntityNode, EntitySlot, GroupNode, Placement, TileList};
pub use schedule_list::ScheduleList;

/// Side length of a hash cell, in tiles.
pub const CELL_SIZE: f64 = 8.0;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An object the index can detect overlaps and merges for.
pub trait SpatialLike {
    fn name(&self) -> &str;

    /// World position used in overlap warnings.
    fn world_position(&self) -> Vector;

    /// True if the two objects occupy a common collision layer.
    fn collides_with(&self, other: &Self, data: &GameData) -> bool;

    /// True if `other` can be folded into `self` instead of placed beside it.
    fn mergeable_with(&self, other: &Self) -> bool;

    fn merge(&mut self, other: &Self);
}

/// A store whose entries may be composites of other entries.
pub trait Decomposable<K: Key> {
    /// The primitive entries reachable from `key`, or `key` itself.
    fn primitives(&self, key: K) -> Vec<K>;

    /// World-space box of a primitive entry.
    fn world_box(&self, key: K, data: &GameData) -> Option<Aabb>;
}

/// Outcome of checking a candidate against the current population.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlap<K> {
    /// The candidate was folded into an existing object.
    Merged(K),
    /// The candidate should be placed; these objects overlap it.
    Clear(Vec<Warning>),
}

// ---------------------------------------------------------------------------
// SpatialIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SpatialIndex<K: Key> {
    cells: HashMap<(i32, i32), Vec<K>>,
    boxes: SecondaryMap<K, Aabb>,
}

impl<K: Key> Default for SpatialIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_of(point: Vector) -> (i32, i32) {
    ((point.x / CELL_SIZE).floor() as i32, (point.y / CELL_SIZE).floor() as i32)
}

fn cells_covering(area: Aabb) -> impl Iterator<Item = (i32, i32)> {
    let (x0, y0) = cell_of(area.min);
    let (x1, y1) = cell_of(area.max);
    (y0..=y1).flat_map(move |cy| (x0..=x1).map(move |cx| (cx, cy)))
}

impl<K: Key> SpatialIndex<K> {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            boxes: SecondaryMap::new(),
        }
    }

    /// Register `key` with its world-space box, replacing any previous box.
    pub fn add(&mut self, key: K, aabb: Aabb) {
        if self.boxes.contains_key(key) {
            self.remove(key);
        }
        for cell in cells_covering(aabb) {
            self.cells.entry(cell).or_default().push(key);
        }
        self.boxes.insert(key, aabb);
        tracing::trace!(?key, ?aabb, "indexed");
    }

    /// Unregister `key`, returning the box it had.
    pub fn remove(&mut self, key: K) -> Option<Aabb> {
        let aabb = self.boxes.remove(key)?;
        for cell in cells_covering(aabb) {
            if let Some(members) = self.cells.get_mut(&cell) {
                members.retain(|k| *k != key);
                if members.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        tracing::trace!(?key, "unindexed");
        Some(aabb)
    }

    pub fn contains(&self, key: K) -> bool {
        self.boxes.contains_key(key)
    }

    pub fn bounding_box(&self, key: K) -> Option<Aabb> {
        self.boxes.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.boxes.clear();
    }

    /// Every indexed box, in no particular order.
    pub fn boxes(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.boxes.values().copied()
    }

    /// Keys whose boxes strictly overlap `area`. Lazy and duplicate-free.
    pub fn query(&self, area: Aabb) -> impl Iterator<Item = K> + '_ {
        let mut seen = HashSet::new();
        cells_covering(area)
            .filter_map(move |cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .filter(move |key| seen.insert(*key))
            .filter(move |key| self.boxes.get(*key).is_some_and(|b| b.overlaps(&area)))
    }

    /// Index every primitive reachable from `key`.
    pub fn recursive_add<S: Decomposable<K>>(&mut self, store: &S, key: K, data: &GameData) {
        for leaf in store.primitives(key) {
            if let Some(aabb) = store.world_box(leaf, data) {
                self.add(leaf, aabb);
            }
        }
    }

    /// Unindex every primitive reachable from `key`.
    pub fn recursive_remove<S: Decomposable<K>>(&mut self, store: &S, key: K) {
        for leaf in store.primitives(key) {
            self.remove(leaf);
        }
    }

    /// Check `candidate` against everything overlapping `area`.
    ///
    /// With `merge` set, the first mergeable object found absorbs the
    /// candidate. Otherwise every colliding object produces an overlap
    /// warning and the caller goes on to place the candidate.
    pub fn handle_overlapping<T: SpatialLike>(
        &self,
        arena: &mut SlotMap<K, T>,
        candidate: &T,
        area: Aabb,
        merge: bool,
        data: &GameData,
    ) -> Overlap<K> {
        let mut warnings = Vec::new();
        let overlapping: Vec<K> = self.query(area).collect();
        for key in overlapping {
            let Some(existing) = arena.get_mut(key) else {
                continue;
            };
            if merge && existing.mergeable_with(candidate) {
                existing.merge(candidate);
                tracing::debug!(name = candidate.name(), ?key, "merged into existing object");
                return Overlap::Merged(key);
            }
            if existing.collides_with(candidate, data) {
                warnings.push(Warning::OverlappingObjects {
                    name: candidate.name().to_string(),
                    other: existing.name().to_string(),
                    position: candidate.world_position(),
                });
            }
        }
        Overlap::Clear(warnings)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gridprint_core::id::TileId;

    #[derive(Debug)]
    struct Crate {
        name: &'static str,
        at: Vector,
        stock: u32,
    }

    impl SpatialLike for Crate {
        fn name(&self) -> &str {
            self.name
        }

        fn world_position(&self) -> Vector {
            self.at
        }

        fn collides_with(&self, _other: &Self, _data: &GameData) -> bool {
            true
        }

        fn mergeable_with(&self, other: &Self) -> bool {
            self.name == other.name && self.at.approx_eq(other.at)
        }

        fn merge(&mut self, other: &Self) {
            self.stock = other.stock;
        }
    }

    fn unit_at(x: f64, y: f64) -> Aabb {
        Aabb::new(x, y, x + 1.0, y + 1.0)
    }

    fn make_keys(n: usize) -> (SlotMap<TileId, ()>, Vec<TileId>) {
        let mut arena = SlotMap::with_key();
        let keys = (0..n).map(|_| arena.insert(())).collect();
        (arena, keys)
    }

    // -----------------------------------------------------------------------
    // Test 1: add / query / remove
    // -----------------------------------------------------------------------
    #[test]
    fn query_finds_overlapping_only() {
        let (_, keys) = make_keys(3);
        let mut index = SpatialIndex::new();
        index.add(keys[0], unit_at(0.0, 0.0));
        index.add(keys[1], unit_at(1.0, 0.0));
        index.add(keys[2], unit_at(20.0, 20.0));

        let hits: Vec<_> = index.query(Aabb::new(0.25, 0.25, 0.75, 0.75)).collect();
        assert_eq!(hits, vec![keys[0]]);

        let hits: HashSet<_> = index.query(Aabb::new(0.5, 0.5, 1.5, 0.75)).collect();
        assert_eq!(hits, HashSet::from([keys[0], keys[1]]));
    }

    #[test]
    fn remove_unindexes() {
        let (_, keys) = make_keys(1);
        let mut index = SpatialIndex::new();
        index.add(keys[0], unit_at(0.0, 0.0));
        assert_eq!(index.remove(keys[0]), Some(unit_at(0.0, 0.0)));
        assert!(index.is_empty());
        assert_eq!(index.query(unit_at(0.0, 0.0)).count(), 0);
        assert_eq!(index.remove(keys[0]), None);
    }

    // -----------------------------------------------------------------------
    // Test 2: boxes spanning several cells are reported once
    // -----------------------------------------------------------------------
    #[test]
    fn large_box_deduplicated() {
        let (_, keys) = make_keys(1);
        let mut index = SpatialIndex::new();
        index.add(keys[0], Aabb::new(-10.0, -10.0, 30.0, 30.0));
        assert_eq!(index.query(Aabb::new(-20.0, -20.0, 40.0, 40.0)).count(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn readd_replaces_box() {
        let (_, keys) = make_keys(1);
        let mut index = SpatialIndex::new();
        index.add(keys[0], unit_at(0.0, 0.0));
        index.add(keys[0], unit_at(50.0, 50.0));
        assert_eq!(index.query(unit_at(0.0, 0.0)).count(), 0);
        assert_eq!(index.query(unit_at(50.0, 50.0)).count(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn negative_coordinates() {
        let (_, keys) = make_keys(1);
        let mut index = SpatialIndex::new();
        index.add(keys[0], unit_at(-9.0, -1.0));
        assert_eq!(index.query(Aabb::new(-8.5, -0.5, -8.4, -0.4)).count(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 3: handle_overlapping
    // -----------------------------------------------------------------------
    #[test]
    fn merge_absorbs_candidate() {
        let data = GameData::default();
        let mut arena: SlotMap<TileId, Crate> = SlotMap::with_key();
        let mut index = SpatialIndex::new();
        let existing = arena.insert(Crate { name: "crate", at: Vector::new(0.5, 0.5), stock: 1 });
        index.add(existing, unit_at(0.0, 0.0));

        let candidate = Crate { name: "crate", at: Vector::new(0.5, 0.5), stock: 9 };
        let outcome = index.handle_overlapping(&mut arena, &candidate, unit_at(0.0, 0.0), true, &data);
        assert_eq!(outcome, Overlap::Merged(existing));
        assert_eq!(arena[existing].stock, 9);
    }

    #[test]
    fn no_merge_reports_overlap() {
        let data = GameData::default();
        let mut arena: SlotMap<TileId, Crate> = SlotMap::with_key();
        let mut index = SpatialIndex::new();
        let existing = arena.insert(Crate { name: "crate", at: Vector::new(0.5, 0.5), stock: 1 });
        index.add(existing, unit_at(0.0, 0.0));

        let candidate = Crate { name: "crate", at: Vector::new(0.5, 0.5), stock: 9 };
        let outcome = index.handle_overlapping(&mut arena, &candidate, unit_at(0.0, 0.0), false, &data);
        let Overlap::Clear(warnings) = outcome else {
            panic!("expected no merge");
        };
        assert_eq!(warnings.len(), 1);
        assert_eq!(arena[existing].stock, 1);
    }

    #[test]
    fn clear_space_no_warnings() {
        let data = GameData::default();
        let mut arena: SlotMap<TileId, Crate> = SlotMap::with_key();
        let index = SpatialIndex::new();
        let candidate = Crate { name: "crate", at: Vector::new(0.5, 0.5), stock: 1 };
        let outcome = index.handle_overlapping(&mut arena, &candidate, unit_at(0.0, 0.0), true, &data);
        assert_eq!(outcome, Overlap::Clear(Vec::new()));
    }
}
