//! Conversion between in-memory associations and external entity numbers.
//!
//! On export the entity list is flattened depth-first and every primitive
//! entity gets a 1-based number equal to its place in that sequence. Wire,
//! neighbour and locomotive references are rewritten to those numbers. A
//! reference whose target is no longer in the list, or that was made in a
//! different list, is only detected here.
//!
//! On import the mapping runs the other way: the flat list has already been
//! built, so number `n` is the key stored at position `n - 1`.

use std::collections::HashMap;

use gridprint_core::entity::{CircuitPoint, CircuitSide, Connections, CopperPoint, CopperSide, WireColor};
use gridprint_core::error::{BlueprintError, FormatError};
use gridprint_core::geometry::{IntPosition, Vector};
use gridprint_core::id::{Association, EntityId, ListId};
use gridprint_core::record::{
    CircuitPointRecord, CircuitRecord, ConnectionsRecord, CopperPointRecord, TileRecord, write_entity,
};
use serde_json::{Value, json};

use crate::collection::{EntityList, TileList};
use crate::schedule_list::ScheduleList;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Entity numbers for one export pass.
#[derive(Debug)]
pub struct Numbering {
    list: ListId,
    leaves: Vec<EntityId>,
    numbers: HashMap<EntityId, u64>,
}

impl Numbering {
    pub fn of(list: &EntityList) -> Self {
        Self::from_leaves(list.list_id(), list.leaves())
    }

    fn from_leaves(list: ListId, leaves: Vec<EntityId>) -> Self {
        let numbers = leaves.iter().zip(1u64..).map(|(k, n)| (*k, n)).collect();
        Self { list, leaves, numbers }
    }

    /// The flattened entity order.
    pub fn leaves(&self) -> &[EntityId] {
        &self.leaves
    }

    /// `None` if the target is gone or belongs to another list.
    pub fn number(&self, target: Association) -> Option<u64> {
        if target.list() != self.list {
            return None;
        }
        self.numbers.get(&target.target()).copied()
    }
}

fn export_circuit(points: &[CircuitPoint], numbering: &Numbering) -> Option<Vec<CircuitPointRecord>> {
    points
        .iter()
        .map(|p| {
            Some(CircuitPointRecord {
                entity_id: numbering.number(p.target)?,
                circuit_id: p.circuit_id,
            })
        })
        .collect()
}

fn export_copper(points: &[CopperPoint], numbering: &Numbering) -> Option<Vec<CopperPointRecord>> {
    points
        .iter()
        .map(|p| {
            Some(CopperPointRecord {
                entity_id: numbering.number(p.target)?,
                wire_id: p.wire_id,
            })
        })
        .collect()
}

/// Rewrite `connections` with entity numbers. `None` if any target is gone.
pub fn export_connections(connections: &Connections, numbering: &Numbering) -> Option<ConnectionsRecord> {
    let mut record = ConnectionsRecord::default();
    for (side, color, points) in connections.circuit_entries() {
        let points = export_circuit(points, numbering)?;
        let circuit = match side {
            CircuitSide::Input => record.input.get_or_insert_with(CircuitRecord::default),
            CircuitSide::Output => record.output.get_or_insert_with(CircuitRecord::default),
        };
        match color {
            WireColor::Red => circuit.red = Some(points),
            WireColor::Green => circuit.green = Some(points),
        }
    }
    for (side, points) in connections.copper_entries() {
        let points = export_copper(points, numbering)?;
        match side {
            CopperSide::Left => record.copper_left = Some(points),
            CopperSide::Right => record.copper_right = Some(points),
        }
    }
    Some(record)
}

/// External entity records, positions shifted by `-offset`.
pub fn export_entities(list: &EntityList, numbering: &Numbering, offset: Vector) -> Result<Vec<Value>, BlueprintError> {
    let mut out = Vec::with_capacity(numbering.leaves.len());
    for (key, number) in numbering.leaves.iter().zip(1u64..) {
        let (Some(slot), Some(entity)) = (list.get(*key), list.entity(*key)) else {
            continue;
        };
        let world = slot.world_position();
        let dangling = || BlueprintError::InvalidAssociation {
            name: entity.name.clone(),
            position: world,
        };

        let connections = export_connections(&entity.connections, numbering).ok_or_else(dangling)?;
        let neighbours = entity
            .neighbours
            .iter()
            .map(|n| numbering.number(*n))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(dangling)?;

        out.push(Value::Object(write_entity(entity, number, world - offset, &connections, &neighbours)));
    }
    Ok(out)
}

pub fn export_tiles(list: &TileList, offset: IntPosition) -> Vec<Value> {
    list.iter().map(|(_, tile)| TileRecord::write(tile, offset)).collect()
}

pub fn export_schedules(list: &ScheduleList, numbering: &Numbering) -> Result<Vec<Value>, BlueprintError> {
    let mut out = Vec::with_capacity(list.len());
    for (i, schedule) in list.iter().enumerate() {
        let mut locomotives = Vec::with_capacity(schedule.locomotives.len());
        for (slot, locomotive) in schedule.locomotives.iter().enumerate() {
            let number = numbering
                .number(*locomotive)
                .ok_or(BlueprintError::InvalidLocomotive { schedule: i, slot })?;
            locomotives.push(number);
        }
        let mut record = schedule.extra.clone();
        record.insert("schedule".into(), json!(schedule.stops));
        record.insert("locomotives".into(), json!(locomotives));
        out.push(Value::Object(record));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// The keys an import placed, in entity-number order, and the list holding them.
#[derive(Debug, Clone, Copy)]
pub struct Imported<'a> {
    pub list: ListId,
    pub ids: &'a [EntityId],
}

/// Map a 1-based entity number onto the flat list built during import.
pub fn resolve(number: u64, imported: Imported<'_>, path: &str) -> Result<Association, FormatError> {
    let ids = imported.ids;
    number
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| ids.get(i))
        .map(|id| Association::new(imported.list, *id))
        .ok_or_else(|| {
            FormatError::new(
                path,
                format!("entity number {number} does not refer to an entity (1..={})", ids.len()),
            )
        })
}

pub fn resolve_references(
    numbers: &[u64],
    imported: Imported<'_>,
    path: &str,
) -> Result<Vec<Association>, FormatError> {
    numbers
        .iter()
        .enumerate()
        .map(|(i, n)| resolve(*n, imported, &format!("{path}[{i}]")))
        .collect()
}

fn resolve_circuit(
    out: &mut Connections,
    side: CircuitSide,
    record: &CircuitRecord,
    imported: Imported<'_>,
    path: &str,
) -> Result<(), FormatError> {
    for (color, points) in [(WireColor::Red, &record.red), (WireColor::Green, &record.green)] {
        for (i, point) in points.iter().flatten().enumerate() {
            let target = resolve(point.entity_id, imported, &format!("{path}.{color}[{i}]"))?;
            out.add_circuit(
                side,
                color,
                CircuitPoint {
                    target,
                    circuit_id: point.circuit_id,
                },
            );
        }
    }
    Ok(())
}

/// Rebuild in-memory connections from their external form.
pub fn resolve_connections(
    record: &ConnectionsRecord,
    imported: Imported<'_>,
    path: &str,
) -> Result<Connections, FormatError> {
    let mut out = Connections::new();
    if let Some(input) = &record.input {
        resolve_circuit(&mut out, CircuitSide::Input, input, imported, &format!("{path}.1"))?;
    }
    if let Some(output) = &record.output {
        resolve_circuit(&mut out, CircuitSide::Output, output, imported, &format!("{path}.2"))?;
    }
    for (side, key, points) in [
        (CopperSide::Left, "Cu0", &record.copper_left),
        (CopperSide::Right, "Cu1", &record.copper_right),
    ] {
        for (i, point) in points.iter().flatten().enumerate() {
            let target = resolve(point.entity_id, imported, &format!("{path}.{key}[{i}]"))?;
            out.add_copper(
                side,
                CopperPoint {
                    target,
                    wire_id: point.wire_id,
                },
            );
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridprint_core::data::GameData;
    use gridprint_core::geometry::Extent;
    use gridprint_core::test_utils::*;
    use gridprint_core::validation::{ValidationContext, ValidationMode};
    use slotmap::SlotMap;

    fn two_keys() -> Vec<EntityId> {
        let mut arena: SlotMap<EntityId, ()> = SlotMap::with_key();
        vec![arena.insert(()), arena.insert(())]
    }

    #[test]
    fn numbering_is_dense_and_depth_first() {
        let data = GameData::vanilla();
        let mut ctx = ValidationContext::new(ValidationMode::Strict, &data);
        let mut extent = Extent::new();
        let mut list = EntityList::new();
        let a = list.append(chest_at(0, 0), false, &mut ctx, &mut extent).unwrap().key();
        let group = gridprint_core::entity::Group::new().with(chest_at(1, 0)).with(chest_at(2, 0));
        list.append(group, false, &mut ctx, &mut extent).unwrap();
        let d = list.append(chest_at(3, 0), false, &mut ctx, &mut extent).unwrap().key();

        let numbering = Numbering::of(&list);
        assert_eq!(numbering.leaves().len(), 4);
        assert_eq!(numbering.number(list.associate(a)), Some(1));
        assert_eq!(numbering.number(list.associate(d)), Some(4));
    }

    #[test]
    fn foreign_association_has_no_number() {
        let data = GameData::vanilla();
        let mut ctx = ValidationContext::new(ValidationMode::Strict, &data);
        let mut extent = Extent::new();
        let mut list = EntityList::new();
        let key = list.append(chest_at(0, 0), false, &mut ctx, &mut extent).unwrap().key();
        let other = EntityList::new();

        let numbering = Numbering::of(&list);
        assert_eq!(numbering.number(list.associate(key)), Some(1));
        assert_eq!(numbering.number(other.associate(key)), None);
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let ids = two_keys();
        let imported = Imported {
            list: ListId::fresh(),
            ids: &ids,
        };
        assert_eq!(resolve(2, imported, "x").unwrap(), Association::new(imported.list, ids[1]));
        let err = resolve(3, imported, "blueprint.entities[0].neighbours[1]").unwrap_err();
        assert_eq!(err.path, "blueprint.entities[0].neighbours[1]");
        assert!(resolve(0, imported, "x").is_err());
    }

    #[test]
    fn connections_round_trip_through_numbers() {
        let ids = two_keys();
        let list = ListId::fresh();
        let raw: ConnectionsRecord = serde_json::from_value(json!({
            "1": {"red": [{"entity_id": 2}]},
            "2": {"green": [{"entity_id": 1, "circuit_id": 1}]}
        }))
        .unwrap();
        let connections = resolve_connections(&raw, Imported { list, ids: &ids }, "c").unwrap();
        assert_eq!(
            connections.circuit(CircuitSide::Input, WireColor::Red)[0].target,
            Association::new(list, ids[1])
        );

        let numbering = Numbering::from_leaves(list, ids.clone());
        assert_eq!(export_connections(&connections, &numbering), Some(raw));
    }

    #[test]
    fn dangling_connection_fails_export() {
        let ids = two_keys();
        let list = ListId::fresh();
        let mut connections = Connections::new();
        connections.add_circuit(
            CircuitSide::Input,
            WireColor::Red,
            CircuitPoint {
                target: Association::new(list, ids[0]),
                circuit_id: None,
            },
        );
        let numbering = Numbering::from_leaves(list, Vec::new());
        assert_eq!(export_connections(&connections, &numbering), None);
    }
}
