//! Data-driven game tables: load entity, tile and signal prototypes from
//! RON, JSON or TOML files into a [`GameData`] table.

pub mod loader;
pub mod schema;

pub use gridprint_core::data::GameData;
pub use loader::{DataLoadError, load_game_data, load_into};
