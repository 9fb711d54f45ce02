//! User styling parameters.
//!
//! Each layer has a params struct with one optional [`Override`] per attribute.
//! Hosts that hold parameters as a loose key-value structure go through
//! `from_json`, which type-checks every declared key and ignores the rest.

use crate::attributes::{Attribute, Layer};
use crate::error::{MaterializeError, Result};
use crate::models::{Cell, Column, DataTable, ValueKind};
use serde_json::{Map, Value};

/// A user-supplied value for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Override<T> {
    /// Broadcast to every row.
    Scalar(T),
    /// One value per row.
    Sequence(Vec<T>),
    /// Take the values from a column of the base table.
    Column(String),
}

/// Values an override can carry.
pub trait OverrideValue: Sized + Clone {
    const KIND: ValueKind;

    fn from_json(attribute: &str, value: &Value) -> Result<Self>;

    fn from_column(attribute: &str, column: &Column) -> Result<Vec<Self>>;

    /// Reject values that cannot be represented in the output.
    fn check(_attribute: &str, _value: &Self) -> Result<()> {
        Ok(())
    }
}

impl OverrideValue for f64 {
    const KIND: ValueKind = ValueKind::Number;

    fn from_json(attribute: &str, value: &Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| MaterializeError::type_mismatch(attribute, Self::KIND, describe(value)))
    }

    fn from_column(attribute: &str, column: &Column) -> Result<Vec<Self>> {
        match column {
            Column::Number(v) => Ok(v.clone()),
            other => Err(column_mismatch(attribute, Self::KIND, other)),
        }
    }

    // JSON has no NaN or infinity, so they would not survive serialization.
    fn check(attribute: &str, value: &Self) -> Result<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(MaterializeError::type_mismatch(
                attribute,
                "finite number",
                format!("number {value}"),
            ))
        }
    }
}

impl OverrideValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_json(attribute: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(MaterializeError::type_mismatch(attribute, Self::KIND, describe(other))),
        }
    }

    fn from_column(attribute: &str, column: &Column) -> Result<Vec<Self>> {
        match column {
            Column::Text(v) => Ok(v.clone()),
            other => Err(column_mismatch(attribute, Self::KIND, other)),
        }
    }
}

impl OverrideValue for Cell {
    const KIND: ValueKind = ValueKind::Colour;

    fn from_json(attribute: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Cell::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Cell::Number)
                .ok_or_else(|| MaterializeError::type_mismatch(attribute, Self::KIND, describe(value))),
            other => Err(MaterializeError::type_mismatch(attribute, Self::KIND, describe(other))),
        }
    }

    fn from_column(_attribute: &str, column: &Column) -> Result<Vec<Self>> {
        Ok(column.cells())
    }
}

fn column_mismatch(attribute: &str, expected: ValueKind, column: &Column) -> MaterializeError {
    MaterializeError::type_mismatch(attribute, expected, format!("{} column", column.kind()))
}

/// Short description of a JSON value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
    }
}

impl<T: OverrideValue> Override<T> {
    /// Parse one parameter value.
    ///
    /// A scalar JSON value is a [`Override::Scalar`], an array is a
    /// [`Override::Sequence`], and `{"column": "<name>"}` is a
    /// [`Override::Column`].
    pub fn from_json(attribute: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|v| T::from_json(attribute, v))
                .collect::<Result<Vec<_>>>()
                .map(Override::Sequence),
            Value::Object(map) => match (map.len(), map.get("column")) {
                (1, Some(Value::String(name))) => Ok(Override::Column(name.clone())),
                _ => Err(MaterializeError::type_mismatch(
                    attribute,
                    format!("{} or {{\"column\": <name>}}", T::KIND),
                    "object",
                )),
            },
            other => T::from_json(attribute, other).map(Override::Scalar),
        }
    }

    /// Expand to exactly one value per row of `table`.
    pub fn expand(&self, attribute: Attribute, table: &DataTable) -> Result<Vec<T>> {
        self.expand_key(attribute.name(), table)
    }

    /// Like [`Override::expand`], for parameters that are not output attributes.
    pub fn expand_key(&self, key: &str, table: &DataTable) -> Result<Vec<T>> {
        let n = table.nrows();
        let values = match self {
            Override::Scalar(v) => vec![v.clone(); n],
            Override::Sequence(values) if values.len() != n => {
                return Err(MaterializeError::shape_mismatch(key, n, values.len()));
            }
            Override::Sequence(values) => values.clone(),
            Override::Column(name) => {
                let column = table.column(name).ok_or_else(|| MaterializeError::MissingColumn {
                    attribute: key.to_string(),
                    column: name.clone(),
                })?;
                T::from_column(key, column)?
            }
        };
        values.iter().try_for_each(|v| T::check(key, v))?;
        Ok(values)
    }
}

/// A borrowed override, tagged with the value type of its attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttributeOverride<'a> {
    Number(&'a Override<f64>),
    Text(&'a Override<String>),
    Colour(&'a Override<Cell>),
}

/// Parameters for one layer.
pub trait LayerParams {
    fn layer(&self) -> Layer;

    /// The user's override for `attribute`, if any.
    fn override_for(&self, attribute: Attribute) -> Option<AttributeOverride<'_>>;

    /// Per-row opacity (0-255) paired with a colour attribute.
    fn opacity_for(&self, colour: Attribute) -> Option<&Override<f64>>;

    /// Whether data-mapped colours should be described in the legend.
    fn legend(&self) -> bool;
}

/// Parameters for a point cloud layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointcloudParams {
    pub polyline: Option<Override<String>>,
    pub elevation: Option<Override<f64>>,
    pub radius: Option<Override<f64>>,
    pub fill_colour: Option<Override<Cell>>,
    pub fill_opacity: Option<Override<f64>>,
    pub legend: bool,
}

impl PointcloudParams {
    pub fn from_json(params: &Value) -> Result<Self> {
        let map = as_object(params)?;
        Ok(Self {
            polyline: field(map, Attribute::Polyline)?,
            elevation: field(map, Attribute::Elevation)?,
            radius: field(map, Attribute::Radius)?,
            fill_colour: field(map, Attribute::FillColour)?,
            fill_opacity: opacity_field(map, Layer::Pointcloud, Attribute::FillColour)?,
            legend: legend_flag(map)?,
        })
    }
}

impl LayerParams for PointcloudParams {
    fn layer(&self) -> Layer {
        Layer::Pointcloud
    }

    fn override_for(&self, attribute: Attribute) -> Option<AttributeOverride<'_>> {
        match attribute {
            Attribute::Polyline => self.polyline.as_ref().map(AttributeOverride::Text),
            Attribute::Elevation => self.elevation.as_ref().map(AttributeOverride::Number),
            Attribute::Radius => self.radius.as_ref().map(AttributeOverride::Number),
            Attribute::FillColour => self.fill_colour.as_ref().map(AttributeOverride::Colour),
            Attribute::StrokeColour | Attribute::StrokeWidth => None,
        }
    }

    fn opacity_for(&self, colour: Attribute) -> Option<&Override<f64>> {
        match colour {
            Attribute::FillColour => self.fill_opacity.as_ref(),
            _ => None,
        }
    }

    fn legend(&self) -> bool {
        self.legend
    }
}

/// Parameters for an extruded column layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnParams {
    pub polyline: Option<Override<String>>,
    pub elevation: Option<Override<f64>>,
    pub fill_colour: Option<Override<Cell>>,
    pub stroke_colour: Option<Override<Cell>>,
    pub stroke_width: Option<Override<f64>>,
    pub fill_opacity: Option<Override<f64>>,
    pub stroke_opacity: Option<Override<f64>>,
    pub legend: bool,
}

impl ColumnParams {
    pub fn from_json(params: &Value) -> Result<Self> {
        let map = as_object(params)?;
        Ok(Self {
            polyline: field(map, Attribute::Polyline)?,
            elevation: field(map, Attribute::Elevation)?,
            fill_colour: field(map, Attribute::FillColour)?,
            stroke_colour: field(map, Attribute::StrokeColour)?,
            stroke_width: field(map, Attribute::StrokeWidth)?,
            fill_opacity: opacity_field(map, Layer::Column, Attribute::FillColour)?,
            stroke_opacity: opacity_field(map, Layer::Column, Attribute::StrokeColour)?,
            legend: legend_flag(map)?,
        })
    }
}

impl LayerParams for ColumnParams {
    fn layer(&self) -> Layer {
        Layer::Column
    }

    fn override_for(&self, attribute: Attribute) -> Option<AttributeOverride<'_>> {
        match attribute {
            Attribute::Polyline => self.polyline.as_ref().map(AttributeOverride::Text),
            Attribute::Elevation => self.elevation.as_ref().map(AttributeOverride::Number),
            Attribute::FillColour => self.fill_colour.as_ref().map(AttributeOverride::Colour),
            Attribute::StrokeColour => self.stroke_colour.as_ref().map(AttributeOverride::Colour),
            Attribute::StrokeWidth => self.stroke_width.as_ref().map(AttributeOverride::Number),
            Attribute::Radius => None,
        }
    }

    fn opacity_for(&self, colour: Attribute) -> Option<&Override<f64>> {
        match colour {
            Attribute::FillColour => self.fill_opacity.as_ref(),
            Attribute::StrokeColour => self.stroke_opacity.as_ref(),
            _ => None,
        }
    }

    fn legend(&self) -> bool {
        self.legend
    }
}

fn as_object(params: &Value) -> Result<Option<&Map<String, Value>>> {
    match params {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(MaterializeError::type_mismatch("params", "object", describe(other))),
    }
}

// Null is treated like an absent key.
fn field<T: OverrideValue>(
    map: Option<&Map<String, Value>>,
    attribute: Attribute,
) -> Result<Option<Override<T>>> {
    match map.and_then(|m| m.get(attribute.name())) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Override::from_json(attribute.name(), v).map(Some),
    }
}

fn opacity_field(
    map: Option<&Map<String, Value>>,
    layer: Layer,
    colour: Attribute,
) -> Result<Option<Override<f64>>> {
    let Some(key) = layer.opacity_param(colour) else {
        return Ok(None);
    };
    match map.and_then(|m| m.get(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Override::from_json(key, v).map(Some),
    }
}

fn legend_flag(map: Option<&Map<String, Value>>) -> Result<bool> {
    match map.and_then(|m| m.get("legend")) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(MaterializeError::type_mismatch("legend", "boolean", describe(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_scalar_sequence_and_column() {
        let p = PointcloudParams::from_json(&json!({
            "radius": 50,
            "elevation": [1, 2.5],
            "fill_colour": {"column": "value"},
            "legend": true,
            "tooltip": "ignored"
        }))
        .unwrap();
        assert_eq!(p.radius, Some(Override::Scalar(50.0)));
        assert_eq!(p.elevation, Some(Override::Sequence(vec![1.0, 2.5])));
        assert_eq!(p.fill_colour, Some(Override::Column("value".into())));
        assert_eq!(p.polyline, None);
        assert!(p.legend);
    }

    #[test]
    fn opacity_params_pair_with_their_layer() {
        let p = ColumnParams::from_json(&json!({
            "fill_opacity": 128,
            "stroke_opacity": {"column": "alpha"}
        }))
        .unwrap();
        assert_eq!(p.opacity_for(Attribute::FillColour), Some(&Override::Scalar(128.0)));
        assert_eq!(
            p.opacity_for(Attribute::StrokeColour),
            Some(&Override::Column("alpha".into()))
        );

        // a point cloud has no stroke, so its stroke opacity is ignored
        let p = PointcloudParams::from_json(&json!({"stroke_opacity": 3, "fill_opacity": [1, 2]}))
            .unwrap();
        assert_eq!(p.fill_opacity, Some(Override::Sequence(vec![1.0, 2.0])));
        assert_eq!(p.opacity_for(Attribute::StrokeColour), None);

        assert!(matches!(
            PointcloudParams::from_json(&json!({"fill_opacity": "half"})),
            Err(MaterializeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn null_params_mean_no_overrides() {
        assert_eq!(PointcloudParams::from_json(&Value::Null).unwrap(), PointcloudParams::default());
        assert_eq!(ColumnParams::from_json(&json!({})).unwrap(), ColumnParams::default());
    }

    #[test]
    fn wrong_kinds_are_type_mismatches() {
        for bad in [
            json!({"radius": "big"}),
            json!({"radius": [1, "x"]}),
            json!({"polyline": 3}),
            json!({"fill_colour": true}),
            json!({"elevation": {"col": "x"}}),
            json!({"legend": "yes"}),
            json!([1, 2]),
        ] {
            let err = PointcloudParams::from_json(&bad).unwrap_err();
            assert!(
                matches!(err, MaterializeError::TypeMismatch { .. }),
                "{bad} gave {err}"
            );
        }
    }

    #[test]
    fn keys_outside_the_layer_are_ignored() {
        let p = PointcloudParams::from_json(&json!({"stroke_width": "not checked"})).unwrap();
        assert_eq!(p, PointcloudParams::default());
    }

    #[test]
    fn expand_broadcasts_and_checks_length() {
        let table = DataTable::with_rows(3);
        let scalar: Override<f64> = Override::Scalar(2.0);
        assert_eq!(scalar.expand(Attribute::Radius, &table).unwrap(), vec![2.0; 3]);

        let short: Override<f64> = Override::Sequence(vec![1.0, 2.0]);
        let err = short.expand(Attribute::Radius, &table).unwrap_err();
        assert!(matches!(
            err,
            MaterializeError::ShapeMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn expand_reads_columns() {
        let table = DataTable::new(vec![
            ("h".into(), Column::Number(vec![1.0, 2.0])),
            ("name".into(), Column::Text(vec!["a".into(), "b".into()])),
        ])
        .unwrap();
        let ok: Override<f64> = Override::Column("h".into());
        assert_eq!(ok.expand(Attribute::Elevation, &table).unwrap(), vec![1.0, 2.0]);

        let wrong: Override<f64> = Override::Column("name".into());
        assert!(matches!(
            wrong.expand(Attribute::Elevation, &table),
            Err(MaterializeError::TypeMismatch { .. })
        ));

        let table_inf = DataTable::new(vec![("x".into(), Column::Number(vec![1.0, f64::INFINITY]))])
            .unwrap();
        let non_finite: Override<f64> = Override::Column("x".into());
        assert!(matches!(
            non_finite.expand(Attribute::Elevation, &table_inf),
            Err(MaterializeError::TypeMismatch { .. })
        ));
        let nan_seq: Override<f64> = Override::Sequence(vec![f64::NAN, 1.0]);
        assert!(matches!(
            nan_seq.expand(Attribute::Elevation, &table),
            Err(MaterializeError::TypeMismatch { .. })
        ));
        // colour cells keep NaN; it maps to the NA colour
        let cells: Override<Cell> = Override::Column("x".into());
        assert_eq!(cells.expand(Attribute::FillColour, &table_inf).unwrap().len(), 2);

        let missing: Override<f64> = Override::Column("nope".into());
        assert!(matches!(
            missing.expand(Attribute::Elevation, &table),
            Err(MaterializeError::MissingColumn { .. })
        ));
    }
}
