//! Resolution pipeline: reads data files, resolves kind names, builds the
//! prototype table.
//!
//! A data directory holds `entities.{ron,json,toml}` (required) and
//! optionally `tiles.*` and `signals.*`. Exactly one format may exist per
//! base name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gridprint_core::data::{CollisionMask, DataError, EntityKind, EntityPrototype, GameData, GameDataBuilder, TilePrototype};
use gridprint_core::geometry::Aabb;
use serde::de::DeserializeOwned;

use crate::schema::{EntityData, SignalData, TileData};

// ===========================================================================
// Errors
// ===========================================================================

/// Failures while turning a data directory into a prototype table.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no '{file}' data file (ron, toml or json) in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file}: expected a .ron, .toml or .json extension")]
    UnsupportedFormat { file: PathBuf },

    /// `entities.ron` and `entities.json` side by side, for example.
    #[error("{a} and {b} describe the same table; keep one")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("{file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("{file}: '{name}' is not a known {expected_kind}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("{file}: prototype '{name}' defined twice")]
    DuplicateName { file: PathBuf, name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` and `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats { a: existing, b: candidate });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize a list from a file. TOML files keep the array under
/// `toml_key` in a top-level table; RON and JSON hold the list directly.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array.try_into().map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution
// ===========================================================================

/// Resolve a snake-case kind name such as `"electric_pole"`.
pub fn resolve_kind(name: &str, file: &Path) -> Result<EntityKind, DataLoadError> {
    serde_json::from_value(serde_json::Value::String(name.replace('_', "-"))).map_err(|_| {
        DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind: "entity kind",
        }
    })
}

/// Record `name` as seen in `file`, failing if it already was.
pub fn check_duplicate(seen: &mut HashMap<String, ()>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if seen.insert(name.to_string(), ()).is_some() {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn duplicate_in(file: &Path) -> impl Fn(DataError) -> DataLoadError + '_ {
    move |e| match e {
        DataError::Duplicate { name, .. } => DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name,
        },
    }
}

/// Turn one entity entry into a prototype.
pub fn resolve_entity(data: EntityData, file: &Path) -> Result<EntityPrototype, DataLoadError> {
    let kind = resolve_kind(&data.kind, file)?;
    let [min_x, min_y, max_x, max_y] = data.collision_box;
    if min_x > max_x || min_y > max_y {
        return Err(parse_error(file, format!("collision box of '{}' is inverted", data.name)));
    }
    let mut proto = EntityPrototype::new(&data.name, kind, Aabb::new(min_x, min_y, max_x, max_y));
    proto.collision_mask = match data.collision_mask {
        Some(layers) => CollisionMask::new(layers),
        None if matches!(kind, EntityKind::StraightRail | EntityKind::CurvedRail) => CollisionMask::rail(),
        None => CollisionMask::default_entity(),
    };
    if let Some(footprint) = data.footprint {
        proto = proto.with_tile_size(footprint.width, footprint.height);
    }
    proto.circuit_wire_max_distance = data.circuit_wire_max_distance;
    proto.maximum_wire_distance = data.maximum_wire_distance;
    proto.inventory_size = data.inventory_size;
    proto.double_grid_aligned = data.double_grid_aligned;
    Ok(proto)
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load a fresh table from `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut builder = GameDataBuilder::new();
    load_into(dir, &mut builder)?;
    Ok(builder.build())
}

/// Load `dir` on top of `builder`.
///
/// Entities replace same-named prototypes already in the builder, so a
/// directory can patch the vanilla table. Tiles and signals must be new.
pub fn load_into(dir: &Path, builder: &mut GameDataBuilder) -> Result<(), DataLoadError> {
    let path = require_data_file(dir, "entities")?;
    let entities: Vec<EntityData> = deserialize_list(&path, "entities")?;
    let mut seen = HashMap::new();
    let count = entities.len();
    for entry in entities {
        check_duplicate(&mut seen, &entry.name, &path)?;
        builder.override_entity(resolve_entity(entry, &path)?);
    }
    tracing::debug!(file = %path.display(), count, "loaded entity prototypes");

    if let Some(path) = find_data_file(dir, "tiles")? {
        let tiles: Vec<TileData> = deserialize_list(&path, "tiles")?;
        for entry in tiles {
            let mut proto = TilePrototype::new(&entry.name);
            if let Some(layers) = entry.collision_mask {
                proto.collision_mask = CollisionMask::new(layers);
            }
            builder.register_tile(proto).map_err(duplicate_in(&path))?;
        }
    }

    if let Some(path) = find_data_file(dir, "signals")? {
        let signals: Vec<SignalData> = deserialize_list(&path, "signals")?;
        for entry in signals {
            builder
                .register_signal(&entry.name, entry.signal_type)
                .map_err(duplicate_in(&path))?;
        }
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gridprint_core::signal::SignalType;
    use std::fs;

    /// Fresh scratch directory, unique per process.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridprint_data_test_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const CRATE_RON: &str = r#"[
        (name: "crate", kind: "container", collision_box: (-0.35, -0.35, 0.35, 0.35), inventory_size: Some(8)),
        (name: "pylon", kind: "electric_pole", collision_box: (-0.15, -0.15, 0.15, 0.15), maximum_wire_distance: Some(12.0)),
    ]"#;

    // -----------------------------------------------------------------------
    // detect_format / find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("entities.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("entities.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("entities.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("entities.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("entities")).is_err());
    }

    #[test]
    fn find_data_file_missing_and_found() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "tiles").unwrap(), None);
        fs::write(dir.join("tiles.json"), "[]").unwrap();
        assert_eq!(find_data_file(&dir, "tiles").unwrap(), Some(dir.join("tiles.json")));
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("entities.ron"), "[]").unwrap();
        fs::write(dir.join("entities.json"), "[]").unwrap();
        assert!(matches!(
            find_data_file(&dir, "entities"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");
        let result = require_data_file(&dir, "entities");
        assert!(matches!(result, Err(DataLoadError::MissingRequired { ref file, .. }) if file == "entities"));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_toml() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("tiles.toml");
        fs::write(
            &path,
            r#"
[[tiles]]
name = "glass"

[[tiles]]
name = "grate"
collision_mask = ["ground-tile", "floor-layer"]
"#,
        )
        .unwrap();
        let tiles: Vec<TileData> = deserialize_list(&path, "tiles").unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1].collision_mask.as_ref().unwrap().len(), 2);
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("list_toml_missing");
        let path = dir.join("tiles.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();
        let result: Result<Vec<TileData>, _> = deserialize_list(&path, "tiles");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_parse_error() {
        let dir = make_test_dir("list_parse_err");
        let path = dir.join("entities.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();
        let result: Result<Vec<EntityData>, _> = deserialize_list(&path, "entities");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_kind_snake_case() {
        let file = Path::new("entities.ron");
        assert_eq!(resolve_kind("electric_pole", file).unwrap(), EntityKind::ElectricPole);
        assert_eq!(resolve_kind("container", file).unwrap(), EntityKind::Container);
        assert!(matches!(
            resolve_kind("warp_drive", file),
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "entity kind", .. }) if name == "warp_drive"
        ));
    }

    #[test]
    fn check_duplicate_detects_repeat() {
        let mut seen = HashMap::new();
        let file = Path::new("entities.ron");
        assert!(check_duplicate(&mut seen, "crate", file).is_ok());
        assert!(matches!(
            check_duplicate(&mut seen, "crate", file),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "crate"
        ));
    }

    #[test]
    fn rail_kinds_default_to_rail_mask() {
        let data = EntityData {
            name: "monorail".into(),
            kind: "straight_rail".into(),
            collision_box: [-0.7, -0.99, 0.7, 0.99],
            collision_mask: None,
            footprint: Some(crate::schema::FootprintData { width: 2, height: 2 }),
            circuit_wire_max_distance: None,
            maximum_wire_distance: None,
            inventory_size: None,
            double_grid_aligned: true,
        };
        let proto = resolve_entity(data, Path::new("entities.json")).unwrap();
        assert_eq!(proto.collision_mask, CollisionMask::rail());
        assert_eq!((proto.tile_width, proto.tile_height), (2, 2));
        assert!(proto.double_grid_aligned);
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    #[test]
    fn load_full_directory() {
        let dir = make_test_dir("load_full");
        fs::write(dir.join("entities.ron"), CRATE_RON).unwrap();
        fs::write(dir.join("tiles.json"), r#"[{"name": "glass"}]"#).unwrap();
        fs::write(
            dir.join("signals.toml"),
            "[[signals]]\nname = \"crate\"\ntype = \"item\"\n",
        )
        .unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.entity_count(), 2);
        assert_eq!(data.entity("crate").unwrap().inventory_size, Some(8));
        assert_eq!(data.entity("pylon").unwrap().kind, EntityKind::ElectricPole);
        assert!(data.tile("glass").is_some());
        assert_eq!(data.signal_type("crate"), Some(SignalType::Item));
        cleanup(&dir);
    }

    #[test]
    fn load_requires_entities() {
        let dir = make_test_dir("load_no_entities");
        fs::write(dir.join("tiles.json"), "[]").unwrap();
        assert!(matches!(load_game_data(&dir), Err(DataLoadError::MissingRequired { .. })));
        cleanup(&dir);
    }

    #[test]
    fn load_rejects_duplicate_entities() {
        let dir = make_test_dir("load_dup");
        fs::write(
            dir.join("entities.json"),
            r#"[
                {"name": "crate", "kind": "container", "collision_box": [-0.35, -0.35, 0.35, 0.35]},
                {"name": "crate", "kind": "container", "collision_box": [-0.35, -0.35, 0.35, 0.35]}
            ]"#,
        )
        .unwrap();
        assert!(matches!(load_game_data(&dir), Err(DataLoadError::DuplicateName { .. })));
        cleanup(&dir);
    }

    #[test]
    fn load_into_vanilla_patches_entities() {
        let dir = make_test_dir("load_patch");
        fs::write(
            dir.join("entities.json"),
            r#"[{"name": "wooden-chest", "kind": "container", "collision_box": [-0.35, -0.35, 0.35, 0.35], "inventory_size": 99}]"#,
        )
        .unwrap();
        fs::write(dir.join("tiles.json"), r#"[{"name": "concrete"}]"#).unwrap();

        let vanilla = GameData::vanilla();
        let mut builder = GameDataBuilder::from_data(&vanilla);
        // Vanilla already has concrete.
        assert!(matches!(
            load_into(&dir, &mut builder),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "concrete"
        ));

        fs::remove_file(dir.join("tiles.json")).unwrap();
        let mut builder = GameDataBuilder::from_data(&vanilla);
        load_into(&dir, &mut builder).unwrap();
        let data = builder.build();
        assert_eq!(data.entity("wooden-chest").unwrap().inventory_size, Some(99));
        assert_eq!(data.entity_count(), vanilla.entity_count());
        cleanup(&dir);
    }

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "entities".into(),
            dir: PathBuf::from("/data"),
        };
        assert!(e.to_string().contains("entities"));
        assert!(e.to_string().contains("/data"));

        let e = DataLoadError::UnresolvedRef {
            file: PathBuf::from("entities.ron"),
            name: "warp_drive".into(),
            expected_kind: "entity kind",
        };
        assert_eq!(e.to_string(), "entities.ron: 'warp_drive' is not a known entity kind");
    }
}
