//! Record materialization: overrides over defaults, one column per attribute.
//!
//! ```
//! use deck_records::{DataTable, MaterializeOptions, materialize};
//! use deck_records::params::{Override, PointcloudParams};
//!
//! let table = DataTable::with_rows(3);
//! let params = PointcloudParams {
//!     radius: Some(Override::Scalar(50.0)),
//!     ..Default::default()
//! };
//! let out = materialize(&table, &params, &MaterializeOptions::default())?;
//! assert_eq!(out.data.nrows(), 3);
//! # Ok::<(), deck_records::MaterializeError>(())
//! ```

use crate::attributes::{Attribute, Layer};
use crate::colour::{self, ColourScale, LegendEntry, Palette};
use crate::error::{MaterializeError, Result};
use crate::models::{Cell, Column, DataTable};
use crate::params::{AttributeOverride, ColumnParams, LayerParams, Override, PointcloudParams};
use crate::serialize::{self, RenderPayload};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How colour columns are written to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourFormat {
    /// `"#RRGGBBAA"` strings.
    #[default]
    Hex,
    /// `[r, g, b, a]` arrays.
    Rgba,
}

/// Options shared by every layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    pub palette: Palette,
    pub colour_format: ColourFormat,
    /// Alpha for data-mapped colours; literal hex colours keep their own.
    pub opacity: Option<u8>,
}

impl MaterializeOptions {
    fn colour_scale(&self) -> ColourScale {
        ColourScale {
            palette: self.palette,
            opacity: self.opacity,
        }
    }
}

/// Fully populated table: exactly the layer's attributes, each with `nrows` values.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    layer: Layer,
    nrows: usize,
    columns: Vec<(Attribute, Column)>,
}

impl MergedTable {
    /// Callers guarantee `columns` follows `layer.attributes()` and every
    /// column has `nrows` values.
    pub(crate) fn from_parts(layer: Layer, nrows: usize, columns: Vec<(Attribute, Column)>) -> Self {
        debug_assert!(columns.iter().map(|(a, _)| *a).eq(layer.attributes().iter().copied()));
        debug_assert!(columns.iter().all(|(_, c)| c.len() == nrows));
        Self { layer, nrows, columns }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[(Attribute, Column)] {
        &self.columns
    }

    pub fn column(&self, attribute: Attribute) -> Option<&Column> {
        self.columns.iter().find(|(a, _)| *a == attribute).map(|(_, c)| c)
    }
}

/// Legend entries keyed by attribute name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Legend(BTreeMap<String, LegendEntry>);

impl Legend {
    pub fn get(&self, attribute: &str) -> Option<&LegendEntry> {
        self.0.get(attribute)
    }

    pub fn insert(&mut self, attribute: Attribute, entry: LegendEntry) {
        self.0.insert(attribute.name().to_string(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LegendEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of one materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub data: MergedTable,
    pub legend: Legend,
}

impl Materialized {
    /// Serialize both halves to JSON text.
    pub fn to_payload(&self, format: ColourFormat) -> Result<RenderPayload> {
        Ok(RenderPayload {
            data: serialize::data_to_json(&self.data, format)?,
            legend: serialize::legend_to_json(&self.legend)?,
        })
    }
}

/// Resolve every attribute of the params' layer against `table`.
///
/// The row count is `table.nrows()`. For each attribute, in declaration
/// order, the user's override wins; otherwise the default rule fills the
/// column. The first error aborts the call.
pub fn materialize<P: LayerParams>(
    table: &DataTable,
    params: &P,
    options: &MaterializeOptions,
) -> Result<Materialized> {
    let layer = params.layer();
    let n = table.nrows();
    debug!("materializing {} layer with {} rows", layer.name(), n);

    let legend_wanted = params.legend();
    let mut columns = Vec::with_capacity(layer.attributes().len());
    let mut legend = Legend::default();

    for &attribute in layer.attributes() {
        let mut column = match params.override_for(attribute) {
            None => {
                trace!("{attribute}: default");
                attribute.default_column(n)
            }
            Some(AttributeOverride::Number(o)) => {
                trace!("{attribute}: override");
                Column::Number(o.expand(attribute, table)?)
            }
            Some(AttributeOverride::Text(o)) => {
                trace!("{attribute}: override");
                Column::Text(o.expand(attribute, table)?)
            }
            Some(AttributeOverride::Colour(o)) => {
                trace!("{attribute}: colour override");
                let (colours, entry) = resolve_colour(attribute, o, table, options)?;
                if let Some(entry) = entry
                    && legend_wanted
                    && layer.legend_attributes().contains(&attribute)
                {
                    legend.insert(attribute, entry);
                }
                colours
            }
        };
        if let Some(o) = params.opacity_for(attribute) {
            trace!("{attribute}: opacity override");
            column = apply_opacity(layer, attribute, column, o, table)?;
        }
        columns.push((attribute, column));
    }

    Ok(Materialized {
        data: MergedTable::from_parts(layer, n, columns),
        legend,
    })
}

fn resolve_colour(
    attribute: Attribute,
    o: &Override<Cell>,
    table: &DataTable,
    options: &MaterializeOptions,
) -> Result<(Column, Option<LegendEntry>)> {
    if let Override::Scalar(cell) = o {
        let c = colour::scalar_colour(attribute.name(), cell)?;
        return Ok((Column::Rgba(vec![c; table.nrows()]), None));
    }
    let title = match o {
        Override::Column(name) => name.as_str(),
        _ => attribute.name(),
    };
    let cells = o.expand(attribute, table)?;
    let mapping = colour::map_cells(attribute.name(), title, &cells, options.colour_scale())?;
    Ok((Column::Rgba(mapping.colours), mapping.legend))
}

/// Replace the alpha channel of a colour column, row by row.
fn apply_opacity(
    layer: Layer,
    attribute: Attribute,
    column: Column,
    o: &Override<f64>,
    table: &DataTable,
) -> Result<Column> {
    let key = layer.opacity_param(attribute).unwrap_or(attribute.name());
    let alphas = o.expand_key(key, table)?;
    let Column::Rgba(colours) = column else {
        return Ok(column);
    };
    colours
        .into_iter()
        .zip(alphas)
        .map(|(c, a)| {
            if (0.0..=255.0).contains(&a) {
                Ok(c.with_alpha(a.round() as u8))
            } else {
                Err(MaterializeError::type_mismatch(
                    key,
                    "opacity between 0 and 255",
                    format!("number {a}"),
                ))
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Column::Rgba)
}

/// Parse point cloud params, materialize against `table`, and serialize.
pub fn pointcloud_json(
    table: &DataTable,
    params: &Value,
    options: &MaterializeOptions,
) -> Result<RenderPayload> {
    let params = PointcloudParams::from_json(params)?;
    materialize(table, &params, options)?.to_payload(options.colour_format)
}

/// Parse column layer params, materialize against `table`, and serialize.
pub fn column_json(table: &DataTable, params: &Value, options: &MaterializeOptions) -> Result<RenderPayload> {
    let params = ColumnParams::from_json(params)?;
    materialize(table, &params, options)?.to_payload(options.colour_format)
}

/// Dispatch on a layer chosen at runtime.
pub fn layer_json(
    layer: Layer,
    table: &DataTable,
    params: &Value,
    options: &MaterializeOptions,
) -> Result<RenderPayload> {
    match layer {
        Layer::Pointcloud => pointcloud_json(table, params, options),
        Layer::Column => column_json(table, params, options),
    }
}
