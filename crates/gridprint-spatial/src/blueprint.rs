//! The blueprint aggregate.
//!
//! A [`Blueprint`] owns its metadata, the entity / tile / schedule
//! collections and the running extent of everything placed in it. It is
//! built empty, from a blueprint string, or from the external dictionary
//! form, mutated any number of times, and exported back to either form.

use std::sync::Arc;

use gridprint_core::codec;
use gridprint_core::color::Color;
use gridprint_core::data::{EntityKind, GameData};
use gridprint_core::entity::{
    CircuitPoint, CircuitSide, CopperPoint, CopperSide, Entity, EntityLike, WireColor,
};
use gridprint_core::error::{BlueprintError, FormatError};
use gridprint_core::geometry::{Aabb, Extent, IntPosition, Vector};
use gridprint_core::id::{Association, EntityId, TileId};
use gridprint_core::record::{EntityRecord, ScheduleRecord, TileRecord, parse_root};
use gridprint_core::schedule::Schedule;
use gridprint_core::signal::{Icon, icons_from_names, validate_icons};
use gridprint_core::tile::Tile;
use gridprint_core::validation::{ValidationContext, ValidationMode, ValidationResult};
use gridprint_core::version::Version;
use gridprint_core::warning::Warning;
use serde_json::{Map, Value, json};

use crate::association::{
    Imported, Numbering, export_entities, export_schedules, export_tiles, resolve_connections, resolve_references,
};
use crate::collection::{EntityList, Placement, TileList};
use crate::schedule_list::ScheduleList;

/// Key of the blueprint object in the external form, and its `item` tag.
pub const BLUEPRINT_KIND: &str = "blueprint";

/// Most copper wires a pole may carry before the game refuses more.
pub const MAX_POLE_CONNECTIONS: usize = 5;

pub struct Blueprint {
    data: Arc<GameData>,
    label: Option<String>,
    label_color: Option<Color>,
    description: Option<String>,
    icons: Vec<Icon>,
    version: Version,
    snapping_grid_size: Option<IntPosition>,
    /// Export-time offset subtracted from every position. Never exported.
    snapping_grid_position: Option<IntPosition>,
    absolute_snapping: bool,
    position_relative_to_grid: Option<IntPosition>,
    index: Option<u16>,
    extra: Map<String, Value>,
    entities: EntityList,
    tiles: TileList,
    schedules: ScheduleList,
    extent: Extent,
    validate_assignment: ValidationMode,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("label", &self.label)
            .field("version", &self.version)
            .field("entities", &self.entities.leaves().len())
            .field("tiles", &self.tiles.len())
            .field("schedules", &self.schedules.len())
            .field("extent", &self.extent)
            .finish_non_exhaustive()
    }
}

fn validate_entity_like(item: &EntityLike, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
    match item {
        EntityLike::Entity(entity) => entity.validate(ctx),
        EntityLike::Group(group) => {
            for child in &group.entities {
                validate_entity_like(child, ctx)?;
            }
            Ok(())
        }
    }
}

impl Blueprint {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// An empty blueprint over the built-in game data.
    pub fn new() -> Self {
        Self::with_data(GameData::vanilla())
    }

    pub fn with_data(data: Arc<GameData>) -> Self {
        Self {
            data,
            label: None,
            label_color: None,
            description: None,
            icons: Vec::new(),
            version: Version::CURRENT,
            snapping_grid_size: None,
            snapping_grid_position: None,
            absolute_snapping: true,
            position_relative_to_grid: None,
            index: None,
            extra: Map::new(),
            entities: EntityList::new(),
            tiles: TileList::new(),
            schedules: ScheduleList::new(),
            extent: Extent::new(),
            validate_assignment: ValidationMode::Strict,
        }
    }

    /// Import the external form with strict validation, discarding warnings
    /// after logging them.
    pub fn from_value(value: &Value) -> Result<Self, BlueprintError> {
        Self::from_value_with(value, GameData::vanilla(), ValidationMode::Strict).map(|(bp, _)| bp)
    }

    /// Import the external form.
    ///
    /// Entities are placed first without merging, then their numeric wire,
    /// neighbour and locomotive references are mapped onto the keys of the
    /// freshly built list.
    pub fn from_value_with(
        value: &Value,
        data: Arc<GameData>,
        mode: ValidationMode,
    ) -> Result<(Self, Vec<Warning>), BlueprintError> {
        let root = parse_root(value, BLUEPRINT_KIND)?;
        let record = root.blueprint;
        let mut bp = Self::with_data(Arc::clone(&data));
        let mut ctx = ValidationContext::new(mode, &data);

        bp.label = record.label;
        bp.label_color = record.label_color;
        bp.description = record.description;
        bp.icons = record.icons.unwrap_or_default();
        validate_icons(&bp.icons, &mut ctx)?;
        bp.version = record.version.unwrap_or(Version::CURRENT);
        bp.snapping_grid_size = record.snap_to_grid;
        bp.absolute_snapping = record.absolute_snapping.unwrap_or(true);
        bp.position_relative_to_grid = record.position_relative_to_grid;
        bp.index = root.index;
        if ctx.wants_warnings() && !record.extra.is_empty() {
            ctx.warn(Warning::UnknownKeyword {
                object: BLUEPRINT_KIND.to_string(),
                keys: record.extra.keys().cloned().collect(),
            })?;
        }
        bp.extra = record.extra;

        let mut ids = Vec::with_capacity(record.entities.len());
        let mut pending = Vec::new();
        for (i, raw) in record.entities.iter().enumerate() {
            let path = format!("{BLUEPRINT_KIND}.entities[{i}]");
            let parsed = EntityRecord::parse(raw, &path)?.into_parts(&data);
            parsed.entity.validate(&mut ctx)?;
            let key = bp.entities.append(parsed.entity, false, &mut ctx, &mut bp.extent)?.key();
            ids.push(key);
            if parsed.connections.is_some() || !parsed.neighbours.is_empty() {
                pending.push((key, parsed.connections, parsed.neighbours, path));
            }
        }

        let imported = Imported {
            list: bp.entities.list_id(),
            ids: &ids,
        };
        for (key, connections, neighbours, path) in pending {
            let connections = match connections {
                Some(raw) => resolve_connections(&raw, imported, &format!("{path}.connections"))?,
                None => Default::default(),
            };
            let neighbours = resolve_references(&neighbours, imported, &format!("{path}.neighbours"))?;
            bp.entities.modify(key, &data, |e| {
                e.connections = connections;
                e.neighbours = neighbours;
            })?;
        }

        for (i, raw) in record.tiles.iter().enumerate() {
            let path = format!("{BLUEPRINT_KIND}.tiles[{i}]");
            let tile = TileRecord::parse(raw, &path)?.into_tile();
            tile.validate(&mut ctx)?;
            bp.tiles.append(tile, false, &mut ctx, &mut bp.extent)?;
        }

        for (i, raw) in record.schedules.iter().enumerate() {
            let path = format!("{BLUEPRINT_KIND}.schedules[{i}]");
            let parsed = ScheduleRecord::parse(raw, &path)?;
            let schedule = Schedule {
                stops: parsed.schedule,
                locomotives: resolve_references(&parsed.locomotives, imported, &format!("{path}.locomotives"))?,
                extra: parsed.extra,
            };
            schedule.validate(&mut ctx)?;
            bp.schedules.append(schedule);
        }

        tracing::debug!(
            entities = ids.len(),
            tiles = bp.tiles.len(),
            schedules = bp.schedules.len(),
            "imported blueprint"
        );
        Ok((bp, ctx.into_warnings()))
    }

    pub fn from_string(s: &str) -> Result<Self, BlueprintError> {
        Self::from_value(&codec::decode(s)?)
    }

    pub fn from_string_with(
        s: &str,
        data: Arc<GameData>,
        mode: ValidationMode,
    ) -> Result<(Self, Vec<Warning>), BlueprintError> {
        Self::from_value_with(&codec::decode(s)?, data, mode)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// The external dictionary form. Fails if any association dangles.
    pub fn to_value(&self) -> Result<Value, BlueprintError> {
        let numbering = Numbering::of(&self.entities);
        let offset = self.snapping_grid_position.unwrap_or_default();
        let entities = export_entities(&self.entities, &numbering, Vector::from(offset))?;
        let tiles = export_tiles(&self.tiles, offset);
        let schedules = export_schedules(&self.schedules, &numbering)?;

        let mut out = self.extra.clone();
        out.insert("item".into(), json!(BLUEPRINT_KIND));
        if let Some(label) = &self.label {
            out.insert("label".into(), json!(label));
        }
        if let Some(color) = &self.label_color {
            out.insert("label_color".into(), json!(color));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if !self.icons.is_empty() {
            out.insert("icons".into(), json!(self.icons));
        }
        out.insert("version".into(), json!(self.version));
        if let Some(size) = self.snapping_grid_size {
            out.insert("snap-to-grid".into(), json!(size));
        }
        if !self.absolute_snapping {
            out.insert("absolute-snapping".into(), json!(false));
        }
        if let Some(position) = self.position_relative_to_grid.filter(|p| !p.is_zero()) {
            out.insert("position-relative-to-grid".into(), json!(position));
        }
        if !entities.is_empty() {
            out.insert("entities".into(), Value::Array(entities));
        }
        if !tiles.is_empty() {
            out.insert("tiles".into(), Value::Array(tiles));
        }
        if !schedules.is_empty() {
            out.insert("schedules".into(), Value::Array(schedules));
        }

        let mut root = Map::new();
        root.insert(BLUEPRINT_KIND.into(), Value::Object(out));
        if let Some(index) = self.index {
            root.insert("index".into(), json!(index));
        }
        Ok(Value::Object(root))
    }

    pub fn to_blueprint_string(&self) -> Result<String, BlueprintError> {
        Ok(codec::encode(&self.to_value()?)?)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Inspect the current state. Never mutates the blueprint.
    pub fn validate(&self, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::default();
        if mode == ValidationMode::None {
            return result;
        }
        let mut ctx = ValidationContext::new(mode, &self.data);

        if let Some(color) = &self.label_color {
            result.absorb(color.check().map_err(|e| e.within(BLUEPRINT_KIND).into()));
        }
        result.absorb(validate_icons(&self.icons, &mut ctx));
        result.absorb(self.extent.check());
        if ctx.wants_warnings() && !self.extra.is_empty() {
            result.absorb(ctx.warn(Warning::UnknownKeyword {
                object: BLUEPRINT_KIND.to_string(),
                keys: self.extra.keys().cloned().collect(),
            }));
        }

        for key in self.entities.leaves() {
            if let Some(entity) = self.entities.entity(key) {
                result.absorb(entity.validate(&mut ctx));
            }
        }
        for (_, tile) in self.tiles.iter() {
            result.absorb(tile.validate(&mut ctx));
        }
        for schedule in &self.schedules {
            result.absorb(schedule.validate(&mut ctx));
        }
        if ctx.wants_warnings() {
            result.absorb(ctx.extend(self.entities.overlap_warnings(&self.data)));
            result.absorb(ctx.extend(self.tiles.overlap_warnings(&self.data)));
        }

        let numbering = Numbering::of(&self.entities);
        result.absorb(export_entities(&self.entities, &numbering, Vector::ZERO).map(|_| ()));
        result.absorb(export_schedules(&self.schedules, &numbering).map(|_| ()));

        result.warnings = ctx.into_warnings();
        result
    }

    /// Mode used by setters and insertions on this blueprint.
    pub fn validate_assignment(&self) -> ValidationMode {
        self.validate_assignment
    }

    pub fn set_validate_assignment(&mut self, mode: ValidationMode) {
        self.validate_assignment = mode;
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<&str>) {
        self.label = label.map(str::to_string);
    }

    pub fn label_color(&self) -> Option<Color> {
        self.label_color
    }

    pub fn set_label_color(&mut self, color: Option<Color>) -> Result<(), BlueprintError> {
        if let Some(c) = &color
            && self.validate_assignment != ValidationMode::None
        {
            c.check().map_err(|e| e.within("label_color"))?;
        }
        self.label_color = color;
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_string);
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn set_icons(&mut self, icons: Vec<Icon>) -> Result<(), BlueprintError> {
        let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
        validate_icons(&icons, &mut ctx)?;
        self.icons = icons;
        Ok(())
    }

    /// Set icons from signal names, numbering them 1.. in order.
    pub fn set_icons_by_name(&mut self, names: &[&str]) -> Result<(), BlueprintError> {
        let icons = icons_from_names(names, &self.data)?;
        self.set_icons(icons)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: impl Into<Version>) {
        self.version = version.into();
    }

    /// Set the version from one to four components.
    pub fn set_version_parts(&mut self, parts: &[u64]) -> Result<(), BlueprintError> {
        self.version = Version::from_slice(parts).map_err(|message| FormatError::new("version", message))?;
        Ok(())
    }

    pub fn version_tuple(&self) -> (u16, u16, u16, u16) {
        self.version.parts()
    }

    pub fn version_string(&self) -> String {
        self.version.to_string()
    }

    pub fn snapping_grid_size(&self) -> Option<IntPosition> {
        self.snapping_grid_size
    }

    pub fn set_snapping_grid_size(&mut self, size: Option<IntPosition>) {
        self.snapping_grid_size = size;
    }

    pub fn snapping_grid_position(&self) -> Option<IntPosition> {
        self.snapping_grid_position
    }

    pub fn set_snapping_grid_position(&mut self, position: Option<IntPosition>) {
        self.snapping_grid_position = position;
    }

    pub fn absolute_snapping(&self) -> bool {
        self.absolute_snapping
    }

    pub fn set_absolute_snapping(&mut self, absolute: bool) {
        self.absolute_snapping = absolute;
    }

    pub fn position_relative_to_grid(&self) -> Option<IntPosition> {
        self.position_relative_to_grid
    }

    pub fn set_position_relative_to_grid(&mut self, position: Option<IntPosition>) {
        self.position_relative_to_grid = position;
    }

    pub fn index(&self) -> Option<u16> {
        self.index
    }

    pub fn set_index(&mut self, index: Option<u16>) {
        self.index = index;
    }

    /// Unrecognized top-level keys, kept for re-export.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    pub fn area(&self) -> Option<Aabb> {
        self.extent.area()
    }

    pub fn tile_width(&self) -> u32 {
        self.extent.tile_width()
    }

    pub fn tile_height(&self) -> u32 {
        self.extent.tile_height()
    }

    /// Recompute the extent from every entity then every tile.
    ///
    /// Removals never shrink the extent, so call this after a batch of them.
    pub fn recalculate_area(&mut self) -> Result<(), BlueprintError> {
        let extent = Extent::from_boxes(self.entities.leaf_boxes().chain(self.tiles.boxes()));
        self.extent = extent;
        tracing::debug!(width = extent.tile_width(), height = extent.tile_height(), "recalculated area");
        extent.check()
    }

    /// True if anything placed must sit on the 2x2 rail grid.
    pub fn double_grid_aligned(&self) -> bool {
        self.entities.leaves().into_iter().any(|key| {
            self.entities
                .entity(key)
                .and_then(|e| self.data.entity(&e.name))
                .is_some_and(|p| p.double_grid_aligned)
        })
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.entity(id)
    }

    pub fn add_entity(
        &mut self,
        item: impl Into<EntityLike>,
        merge: bool,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        self.insert_entity(self.entities.len(), item, merge)
    }

    /// Insert at `index`. The placement reports every warning raised on the
    /// way in, from the entity itself and from overlaps; under pedantic
    /// validation any of them rejects the insertion.
    pub fn insert_entity(
        &mut self,
        index: usize,
        item: impl Into<EntityLike>,
        merge: bool,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        let item = item.into();
        let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
        validate_entity_like(&item, &mut ctx)?;
        let placement = self.entities.insert(index, item, merge, &mut ctx, &mut self.extent)?;
        Ok(placement.with_warnings(ctx.into_warnings()))
    }

    /// Replace the entity at `index`. Replacements never merge.
    pub fn set_entity(
        &mut self,
        index: usize,
        item: impl Into<EntityLike>,
    ) -> Result<Placement<EntityId>, BlueprintError> {
        let item = item.into();
        let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
        validate_entity_like(&item, &mut ctx)?;
        let tile_boxes: Vec<Aabb> = self.tiles.boxes().collect();
        let placement = self.entities.set(index, item, &mut ctx, &mut self.extent, tile_boxes)?;
        Ok(placement.with_warnings(ctx.into_warnings()))
    }

    /// Remove the top-level entity or group at `index`.
    ///
    /// References to it from other entities or schedules are left in place
    /// and reported when exporting.
    pub fn remove_entity(&mut self, index: usize) -> Result<EntityLike, BlueprintError> {
        self.entities.remove(index)
    }

    pub fn remove_entity_id(&mut self, id: EntityId) -> Result<EntityLike, BlueprintError> {
        self.entities.remove_id(id).ok_or(BlueprintError::EntityNotFound)
    }

    /// Edit an entity in place. If the edit would grow the blueprint past
    /// the size limit the entity is restored and the error returned.
    pub fn modify_entity<F>(&mut self, id: EntityId, f: F) -> Result<(), BlueprintError>
    where
        F: FnOnce(&mut Entity),
    {
        let before = self.entities.entity(id).cloned().ok_or(BlueprintError::EntityNotFound)?;
        self.entities.modify(id, &self.data, f)?;
        let Some(area) = self.entities.spatial_index().bounding_box(id) else {
            return Ok(());
        };
        if let Err(err) = self.extent.extend(area) {
            self.entities.modify(id, &self.data, |e| *e = before)?;
            return Err(err);
        }
        Ok(())
    }

    /// Replace every entity. On error the previous entities and extent are
    /// restored.
    pub fn set_entities<I, T>(&mut self, items: I) -> Result<Vec<Warning>, BlueprintError>
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityLike>,
    {
        let previous = std::mem::take(&mut self.entities);
        let extent = self.extent;
        let result = self.recalculate_area().and_then(|()| {
            let mut warnings = Vec::new();
            for item in items {
                warnings.extend(self.add_entity(item, false)?.into_warnings());
            }
            Ok(warnings)
        });
        if result.is_err() {
            tracing::debug!("entity replacement failed, restoring previous entities");
            self.entities = previous;
            self.extent = extent;
        }
        result
    }

    pub fn clear_entities(&mut self) {
        self.entities.clear();
        self.extent = Extent::from_boxes(self.tiles.boxes());
    }

    /// Resolve a dotted group path such as `"station.inserter"`.
    pub fn find_entity_by_id(&self, path: &str) -> Option<EntityId> {
        self.entities.find_by_id(path)
    }

    pub fn find_entities_filtered(&self, name: Option<&str>, area: Option<Aabb>) -> Vec<EntityId> {
        self.entities.find_filtered(name, area)
    }

    // -----------------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------------

    pub fn tiles(&self) -> &TileList {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn add_tile(&mut self, tile: Tile, merge: bool) -> Result<Placement<TileId>, BlueprintError> {
        self.insert_tile(self.tiles.len(), tile, merge)
    }

    pub fn insert_tile(&mut self, index: usize, tile: Tile, merge: bool) -> Result<Placement<TileId>, BlueprintError> {
        let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
        tile.validate(&mut ctx)?;
        let placement = self.tiles.insert(index, tile, merge, &mut ctx, &mut self.extent)?;
        Ok(placement.with_warnings(ctx.into_warnings()))
    }

    pub fn set_tile(&mut self, index: usize, tile: Tile) -> Result<Placement<TileId>, BlueprintError> {
        let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
        tile.validate(&mut ctx)?;
        let entity_boxes: Vec<Aabb> = self.entities.leaf_boxes().collect();
        let placement = self.tiles.set(index, tile, &mut ctx, &mut self.extent, entity_boxes)?;
        Ok(placement.with_warnings(ctx.into_warnings()))
    }

    pub fn remove_tile(&mut self, index: usize) -> Result<Tile, BlueprintError> {
        self.tiles.remove(index)
    }

    /// Replace every tile. On error the previous tiles and extent are
    /// restored.
    pub fn set_tiles(&mut self, tiles: impl IntoIterator<Item = Tile>) -> Result<Vec<Warning>, BlueprintError> {
        let previous = std::mem::take(&mut self.tiles);
        let extent = self.extent;
        let result = self.recalculate_area().and_then(|()| {
            let mut warnings = Vec::new();
            for tile in tiles {
                warnings.extend(self.add_tile(tile, false)?.into_warnings());
            }
            Ok(warnings)
        });
        if result.is_err() {
            tracing::debug!("tile replacement failed, restoring previous tiles");
            self.tiles = previous;
            self.extent = extent;
        }
        result
    }

    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
        self.extent = Extent::from_boxes(self.entities.leaf_boxes());
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    pub fn schedules(&self) -> &ScheduleList {
        &self.schedules
    }

    pub fn schedules_mut(&mut self) -> &mut ScheduleList {
        &mut self.schedules
    }

    /// Attach a locomotive to the schedule at `schedule`.
    pub fn add_locomotive(&mut self, schedule: usize, locomotive: EntityId) -> Result<(), BlueprintError> {
        let entity = self.entities.entity(locomotive).ok_or(BlueprintError::EntityNotFound)?;
        if entity.kind(&self.data) != EntityKind::Locomotive {
            return Err(BlueprintError::NotConnectable {
                name: entity.name.clone(),
                reason: "only locomotives can run a schedule".into(),
            });
        }
        let len = self.schedules.len();
        let target = self
            .schedules
            .get_mut(schedule)
            .ok_or(BlueprintError::IndexOutOfRange { index: schedule, len })?;
        target.add_locomotive(self.entities.associate(locomotive));
        Ok(())
    }

    pub fn remove_locomotive(&mut self, schedule: usize, locomotive: EntityId) -> Result<(), BlueprintError> {
        let len = self.schedules.len();
        let target = self
            .schedules
            .get_mut(schedule)
            .ok_or(BlueprintError::IndexOutOfRange { index: schedule, len })?;
        target.remove_locomotive(locomotive);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------------

    fn endpoint(&self, id: EntityId) -> Result<(&Entity, Vector), BlueprintError> {
        let entity = self.entities.entity(id).ok_or(BlueprintError::EntityNotFound)?;
        let position = self.entities.world_position(id).ok_or(BlueprintError::EntityNotFound)?;
        Ok((entity, position))
    }

    fn circuit_reach(&self, entity: &Entity, side: CircuitSide) -> Result<(f64, bool), BlueprintError> {
        let not_connectable = |reason: &str| BlueprintError::NotConnectable {
            name: entity.name.clone(),
            reason: reason.to_string(),
        };
        let proto = self
            .data
            .entity(&entity.name)
            .ok_or_else(|| not_connectable("unknown entity"))?;
        let reach = proto
            .circuit_wire_max_distance
            .ok_or_else(|| not_connectable("not circuit connectable"))?;
        let dual = proto.kind.has_dual_circuit_sides();
        if side == CircuitSide::Output && !dual {
            return Err(not_connectable("has no output side"));
        }
        Ok((reach, dual))
    }

    fn check_distance(&self, a: Vector, b: Vector, reach: f64, warnings: &mut Vec<Warning>) -> Result<(), BlueprintError> {
        let distance = a.distance(b);
        if distance > reach {
            let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
            ctx.warn(Warning::ConnectionDistance { distance, reach })?;
            warnings.extend(ctx.into_warnings());
        }
        Ok(())
    }

    /// Connect a red or green wire between `side_a` of `a` and `side_b` of
    /// `b`. Both ends record the wire.
    pub fn add_circuit_connection(
        &mut self,
        color: WireColor,
        a: EntityId,
        b: EntityId,
        side_a: CircuitSide,
        side_b: CircuitSide,
    ) -> Result<Vec<Warning>, BlueprintError> {
        let (entity_a, pos_a) = self.endpoint(a)?;
        let (entity_b, pos_b) = self.endpoint(b)?;
        if a == b && side_a == side_b {
            return Err(BlueprintError::NotConnectable {
                name: entity_a.name.clone(),
                reason: "cannot wire a terminal to itself".into(),
            });
        }
        let (reach_a, dual_a) = self.circuit_reach(entity_a, side_a)?;
        let (reach_b, dual_b) = self.circuit_reach(entity_b, side_b)?;

        let mut warnings = Vec::new();
        self.check_distance(pos_a, pos_b, reach_a.min(reach_b), &mut warnings)?;

        let to_b = CircuitPoint {
            target: self.entities.associate(b),
            circuit_id: dual_b.then_some(side_b.id()),
        };
        let to_a = CircuitPoint {
            target: self.entities.associate(a),
            circuit_id: dual_a.then_some(side_a.id()),
        };
        self.entities
            .modify(a, &self.data, |e| e.connections.add_circuit(side_a, color, to_b))?;
        self.entities
            .modify(b, &self.data, |e| e.connections.add_circuit(side_b, color, to_a))?;
        Ok(warnings)
    }

    pub fn remove_circuit_connection(
        &mut self,
        color: WireColor,
        a: EntityId,
        b: EntityId,
        side_a: CircuitSide,
        side_b: CircuitSide,
    ) -> Result<(), BlueprintError> {
        let (entity_a, _) = self.endpoint(a)?;
        let (entity_b, _) = self.endpoint(b)?;
        let dual = |e: &Entity| e.kind(&self.data).has_dual_circuit_sides();
        let id_a = dual(entity_a).then_some(side_a.id());
        let id_b = dual(entity_b).then_some(side_b.id());
        self.entities
            .modify(a, &self.data, |e| e.connections.remove_circuit(side_a, color, b, id_b))?;
        self.entities
            .modify(b, &self.data, |e| e.connections.remove_circuit(side_b, color, a, id_a))?;
        Ok(())
    }

    /// Connect two electric poles with copper wire.
    pub fn add_power_connection(&mut self, a: EntityId, b: EntityId) -> Result<Vec<Warning>, BlueprintError> {
        let (entity_a, pos_a) = self.endpoint(a)?;
        let (entity_b, pos_b) = self.endpoint(b)?;
        if a == b {
            return Err(BlueprintError::NotConnectable {
                name: entity_a.name.clone(),
                reason: "cannot wire a pole to itself".into(),
            });
        }
        let mut reaches = [0.0; 2];
        for (slot, entity) in reaches.iter_mut().zip([entity_a, entity_b]) {
            let proto = self.data.entity(&entity.name).filter(|p| p.is_power_connectable());
            let Some(reach) = proto.and_then(|p| p.maximum_wire_distance) else {
                return Err(BlueprintError::NotConnectable {
                    name: entity.name.clone(),
                    reason: "only electric poles take copper wire".into(),
                });
            };
            *slot = reach;
        }

        let mut warnings = Vec::new();
        self.check_distance(pos_a, pos_b, reaches[0].min(reaches[1]), &mut warnings)?;

        let link = |e: &mut Entity, other: Association| {
            if !e.neighbours.contains(&other) {
                e.neighbours.push(other);
            }
        };
        let (to_a, to_b) = (self.entities.associate(a), self.entities.associate(b));
        self.entities.modify(a, &self.data, |e| link(e, to_b))?;
        self.entities.modify(b, &self.data, |e| link(e, to_a))?;

        for id in [a, b] {
            if let Some(entity) = self.entities.entity(id) {
                if entity.neighbours.len() > MAX_POLE_CONNECTIONS {
                    let mut ctx = ValidationContext::new(self.validate_assignment, &self.data);
                    ctx.warn(Warning::TooManyConnections {
                        name: entity.name.clone(),
                        count: entity.neighbours.len(),
                    })?;
                    warnings.extend(ctx.into_warnings());
                }
            }
        }
        Ok(warnings)
    }

    pub fn remove_power_connection(&mut self, a: EntityId, b: EntityId) -> Result<(), BlueprintError> {
        self.entities.modify(a, &self.data, |e| e.neighbours.retain(|n| !n.points_to(b)))?;
        self.entities.modify(b, &self.data, |e| e.neighbours.retain(|n| !n.points_to(a)))?;
        Ok(())
    }

    /// Remove every copper wire between `id` and other poles.
    pub fn remove_power_connections(&mut self, id: EntityId) -> Result<(), BlueprintError> {
        let neighbours: Vec<Association> = self
            .entities
            .entity(id)
            .ok_or(BlueprintError::EntityNotFound)?
            .neighbours
            .clone();
        for neighbour in neighbours {
            if neighbour.is_live(&self.entities) {
                self.entities
                    .modify(neighbour.target(), &self.data, |e| e.neighbours.retain(|n| !n.points_to(id)))?;
            }
        }
        self.entities.modify(id, &self.data, |e| e.neighbours.clear())
    }

    /// Wire one copper terminal of a power switch to an electric pole.
    pub fn add_copper_connection(
        &mut self,
        switch: EntityId,
        side: CopperSide,
        pole: EntityId,
    ) -> Result<(), BlueprintError> {
        let (entity_s, _) = self.endpoint(switch)?;
        let (entity_p, _) = self.endpoint(pole)?;
        if !entity_s.kind(&self.data).has_copper_sides() {
            return Err(BlueprintError::NotConnectable {
                name: entity_s.name.clone(),
                reason: "has no copper terminals".into(),
            });
        }
        if entity_p.kind(&self.data) != EntityKind::ElectricPole {
            return Err(BlueprintError::NotConnectable {
                name: entity_p.name.clone(),
                reason: "only electric poles take copper wire".into(),
            });
        }
        let to_pole = CopperPoint {
            target: self.entities.associate(pole),
            wire_id: Some(0),
        };
        let to_switch = CopperPoint {
            target: self.entities.associate(switch),
            wire_id: Some(side.id()),
        };
        self.entities
            .modify(switch, &self.data, |e| e.connections.add_copper(side, to_pole))?;
        self.entities
            .modify(pole, &self.data, |e| e.connections.add_copper(CopperSide::Left, to_switch))?;
        Ok(())
    }

    pub fn remove_copper_connection(
        &mut self,
        switch: EntityId,
        side: CopperSide,
        pole: EntityId,
    ) -> Result<(), BlueprintError> {
        self.entities
            .modify(switch, &self.data, |e| e.connections.remove_copper(side, pole))?;
        self.entities
            .modify(pole, &self.data, |e| e.connections.remove_copper(CopperSide::Left, switch))?;
        Ok(())
    }
}

/// Deep copy: arenas are cloned and both spatial indexes rebuilt.
impl Clone for Blueprint {
    fn clone(&self) -> Self {
        tracing::debug!("rebuilding spatial indexes for copy");
        let entities = self.entities.duplicate(&self.data);
        let mut schedules = self.schedules.clone();
        schedules.rescope(self.entities.list_id(), entities.list_id());
        Self {
            data: Arc::clone(&self.data),
            label: self.label.clone(),
            label_color: self.label_color,
            description: self.description.clone(),
            icons: self.icons.clone(),
            version: self.version,
            snapping_grid_size: self.snapping_grid_size,
            snapping_grid_position: self.snapping_grid_position,
            absolute_snapping: self.absolute_snapping,
            position_relative_to_grid: self.position_relative_to_grid,
            index: self.index,
            extra: self.extra.clone(),
            entities,
            tiles: self.tiles.duplicate(&self.data),
            schedules,
            extent: self.extent,
            validate_assignment: self.validate_assignment,
        }
    }
}

/// Blueprints are equal when they export to the same document.
impl PartialEq for Blueprint {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
