//! deck_records
//!
//! Normalizes map layer styling parameters and serializes layer data to JSON
//! for a separate rendering layer. Pairs with the `deckrec` CLI.
//!
//! ### Features
//! - Fill defaults for every visual attribute of a layer (position, elevation, radius, colours)
//! - Accept per-attribute overrides as a scalar, a per-row sequence, or a data column
//! - Map data-driven colours through a palette and describe them in a legend
//! - Serialize the merged table as row-oriented JSON with a stable key order
//!
//! ### Example
//! ```
//! use deck_records::{DataTable, MaterializeOptions};
//! use serde_json::json;
//!
//! let table = DataTable::with_rows(3);
//! let payload = deck_records::pointcloud_json(
//!     &table,
//!     &json!({"radius": 50}),
//!     &MaterializeOptions::default(),
//! )?;
//! let rows: serde_json::Value = serde_json::from_str(&payload.data)?;
//! assert_eq!(rows.as_array().unwrap().len(), 3);
//! assert_eq!(payload.legend, "{}");
//! # Ok::<(), deck_records::MaterializeError>(())
//! ```

pub mod attributes;
pub mod colour;
pub mod error;
pub mod materialize;
pub mod models;
pub mod params;
pub mod serialize;
pub mod storage;

pub use attributes::{Attribute, Layer};
pub use error::MaterializeError;
pub use materialize::{
    ColourFormat, Legend, MaterializeOptions, Materialized, MergedTable, column_json, layer_json,
    materialize, pointcloud_json,
};
pub use models::{Cell, Column, DataTable, ValueKind};
pub use serialize::RenderPayload;
