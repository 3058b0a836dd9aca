use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::new_key_type;

new_key_type! {
    /// Identifies an entity or group stored in an entity collection.
    pub struct EntityId;

    /// Identifies a tile stored in a tile collection.
    pub struct TileId;
}

/// Identifies one entity collection. Arena keys are only meaningful inside
/// the collection that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(u64);

impl ListId {
    /// A list id no other collection in this process has.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Anything an [`Association`] can be resolved against.
pub trait AssociationScope {
    fn list_id(&self) -> ListId;

    /// True if `id` is currently stored here.
    fn holds(&self, id: EntityId) -> bool;
}

/// A non-owning reference from one entity to another.
///
/// The target is identified by the collection it was made in and its arena
/// key there. Keys carry a generation, so an association whose target has
/// been removed never resolves to whatever later reuses the slot; it simply
/// stops resolving. An association carried into another collection never
/// resolves there either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Association {
    list: ListId,
    target: EntityId,
}

impl Association {
    pub fn new(list: ListId, target: EntityId) -> Self {
        Self { list, target }
    }

    /// The collection this association was made in.
    pub fn list(self) -> ListId {
        self.list
    }

    /// The arena key this association points at, live or not.
    pub fn target(self) -> EntityId {
        self.target
    }

    /// Compares the arena key only.
    pub fn points_to(self, id: EntityId) -> bool {
        self.target == id
    }

    /// True if the target is still stored in `scope` and `scope` is the
    /// collection this association was made in.
    pub fn is_live<S: AssociationScope + ?Sized>(self, scope: &S) -> bool {
        self.list == scope.list_id() && scope.holds(self.target)
    }

    /// Move the association to `to` if it belongs to `from`.
    pub fn rescope(&mut self, from: ListId, to: ListId) {
        if self.list == from {
            self.list = to;
        }
    }
}
