//! JSON output for the rendering layer.
//!
//! `data` is an array of row objects with keys in attribute declaration
//! order; `legend` is an object keyed by attribute name.

use crate::attributes::{Attribute, Layer};
use crate::colour::Rgba;
use crate::error::{MaterializeError, Result};
use crate::materialize::{ColourFormat, Legend, MergedTable};
use crate::models::{Column, ValueKind};
use crate::params::describe;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// The two JSON blobs handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub data: String,
    pub legend: String,
}

impl RenderPayload {
    /// Both blobs embedded in one `{"data": [...], "legend": {...}}` document.
    pub fn to_document(&self) -> String {
        format!("{{\"data\":{},\"legend\":{}}}", self.data, self.legend)
    }
}

struct Rows<'a> {
    table: &'a MergedTable,
    format: ColourFormat,
}

struct Row<'a> {
    table: &'a MergedTable,
    index: usize,
    format: ColourFormat,
}

impl Serialize for Rows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.nrows()))?;
        for index in 0..self.table.nrows() {
            seq.serialize_element(&Row {
                table: self.table,
                index,
                format: self.format,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = self.table.columns();
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for (attribute, column) in columns {
            let key = attribute.name();
            match column {
                Column::Number(v) => {
                    let x = v[self.index];
                    // JSON has no NaN/inf
                    map.serialize_entry(key, &x.is_finite().then_some(x))?
                }
                Column::Text(v) => map.serialize_entry(key, &v[self.index])?,
                Column::Rgba(v) => match self.format {
                    ColourFormat::Hex => map.serialize_entry(key, &v[self.index].to_hex())?,
                    ColourFormat::Rgba => map.serialize_entry(key, &v[self.index].to_array())?,
                },
            }
        }
        map.end()
    }
}

/// Row-oriented JSON for a merged table.
pub fn data_to_json(table: &MergedTable, format: ColourFormat) -> Result<String> {
    Ok(serde_json::to_string(&Rows { table, format })?)
}

pub fn legend_to_json(legend: &Legend) -> Result<String> {
    Ok(serde_json::to_string(legend)?)
}

/// Parse a `data` blob for `layer` back into a merged table.
///
/// Accepts both colour formats. `null` numbers come back as NaN.
pub fn data_from_json(layer: Layer, json: &str) -> Result<MergedTable> {
    let rows: Vec<Map<String, Value>> = serde_json::from_str(json)?;
    let columns = layer
        .attributes()
        .iter()
        .map(|&attribute| Ok((attribute, read_column(attribute, &rows)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(MergedTable::from_parts(layer, rows.len(), columns))
}

fn read_column(attribute: Attribute, rows: &[Map<String, Value>]) -> Result<Column> {
    let name = attribute.name();
    let kind = attribute.kind();
    let values = rows.iter().map(|row| {
        row.get(name)
            .ok_or_else(|| MaterializeError::type_mismatch(name, kind, "missing key"))
    });
    let mismatch = |v: &Value| MaterializeError::type_mismatch(name, kind, describe(v));

    Ok(match kind {
        ValueKind::Number => Column::Number(
            values
                .map(|v| match v? {
                    Value::Null => Ok(f64::NAN),
                    v => v.as_f64().ok_or_else(|| mismatch(v)),
                })
                .collect::<Result<_>>()?,
        ),
        ValueKind::Text => Column::Text(
            values
                .map(|v| match v? {
                    Value::String(s) => Ok(s.clone()),
                    v => Err(mismatch(v)),
                })
                .collect::<Result<_>>()?,
        ),
        ValueKind::Colour => Column::Rgba(
            values
                .map(|v| {
                    let v = v?;
                    parse_colour(v).ok_or_else(|| mismatch(v))
                })
                .collect::<Result<_>>()?,
        ),
    })
}

fn parse_colour(v: &Value) -> Option<Rgba> {
    match v {
        Value::String(s) => Rgba::parse_hex(s),
        Value::Array(items) if items.len() == 4 => {
            let mut c = [0u8; 4];
            for (slot, item) in c.iter_mut().zip(items) {
                *slot = u8::try_from(item.as_u64()?).ok()?;
            }
            Some(Rgba::new(c[0], c[1], c[2], c[3]))
        }
        _ => None,
    }
}
