//! Gridprint Core -- the object model behind factory-game blueprints.
//!
//! This crate holds everything a blueprint is made of that does not need a
//! spatial index: prototype data, geometry, entity / tile / schedule values,
//! metadata types (colors, versions, signals, icons), the warning and error
//! taxonomy, validation modes, the external record schema, and the
//! blueprint-string codec.
//!
//! # Layering
//!
//! - [`data::GameData`] is an immutable table of prototypes, built once and
//!   shared behind an `Arc`. [`data::GameData::vanilla`] provides the
//!   built-in table; the `gridprint-data` crate loads others from disk.
//! - [`entity`], [`tile`] and [`schedule`] are plain values. They hold
//!   cross-references as [`id::Association`]s into an arena owned by the
//!   containing collection (see `gridprint-spatial`).
//! - [`record`] maps the external dictionary form onto these values and
//!   back, reporting structural problems as [`error::FormatError`]s with
//!   a dotted path.
//! - [`codec`] converts between the external dictionary form and the
//!   `'0'`-prefixed, zlib-compressed, base64 blueprint string.
//!
//! # Warnings vs errors
//!
//! Problems that leave a blueprint importable in-game are [`warning::Warning`]s.
//! They are collected through a [`validation::ValidationContext`] and handed
//! back to the caller; under [`validation::ValidationMode::Pedantic`] they are
//! promoted to [`error::BlueprintError::Pedantic`].

pub mod codec;
pub mod color;
pub mod data;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod id;
pub mod record;
pub mod schedule;
pub mod signal;
pub mod tile;
pub mod validation;
pub mod version;
pub mod warning;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
