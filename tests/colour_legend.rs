use deck_records::colour::{LegendKind, NA_COLOUR, Palette};
use deck_records::params::{ColumnParams, Override, PointcloudParams};
use deck_records::{
    Attribute, Cell, Column, ColourFormat, DataTable, MaterializeOptions, column_json, materialize,
};
use serde_json::{Value, json};

fn data() -> DataTable {
    DataTable::new(vec![
        ("value".into(), Column::Number(vec![0.0, 50.0, 100.0])),
        (
            "group".into(),
            Column::Text(vec!["north".into(), "south".into(), "north".into()]),
        ),
    ])
    .unwrap()
}

#[test]
fn numeric_column_produces_gradient_legend() {
    let params = PointcloudParams {
        fill_colour: Some(Override::Column("value".into())),
        legend: true,
        ..Default::default()
    };
    let out = materialize(&data(), &params, &MaterializeOptions::default()).unwrap();
    let entry = out.legend.get("fill_colour").expect("legend entry");
    assert_eq!(entry.kind, LegendKind::Gradient);
    assert_eq!(entry.title, "value");
    assert_eq!(entry.variable.first().map(String::as_str), Some("0"));
    assert_eq!(entry.variable.last().map(String::as_str), Some("100"));
    assert_eq!(entry.colour.first().map(String::as_str), Some("#440154FF"));
    assert_eq!(entry.colour.last().map(String::as_str), Some("#FDE725FF"));
}

#[test]
fn legend_is_omitted_unless_requested() {
    let params = PointcloudParams {
        fill_colour: Some(Override::Column("value".into())),
        legend: false,
        ..Default::default()
    };
    let out = materialize(&data(), &params, &MaterializeOptions::default()).unwrap();
    assert!(out.legend.is_empty());
    // colours are still data-mapped
    let Some(Column::Rgba(colours)) = out.data.column(Attribute::FillColour) else {
        panic!("fill_colour should be a colour column");
    };
    assert_ne!(colours[0], colours[2]);
}

#[test]
fn categorical_sequence_with_office_palette() {
    let params = ColumnParams {
        stroke_colour: Some(Override::Column("group".into())),
        legend: true,
        ..Default::default()
    };
    let options = MaterializeOptions {
        palette: Palette::Office,
        ..Default::default()
    };
    let out = materialize(&data(), &params, &options).unwrap();
    let entry = out.legend.get("stroke_colour").unwrap();
    assert_eq!(entry.kind, LegendKind::Category);
    assert_eq!(entry.variable, vec!["north", "south"]);
    assert_eq!(entry.colour, vec!["#4472C4FF", "#ED7D31FF"]);
    assert!(out.legend.get("fill_colour").is_none());
}

#[test]
fn literal_hex_sequence_has_no_legend() {
    let params = PointcloudParams {
        fill_colour: Some(Override::Sequence(vec![
            Cell::from("#000000"),
            Cell::from("#FFFFFF"),
            Cell::from("#123456"),
        ])),
        legend: true,
        ..Default::default()
    };
    let out = materialize(&data(), &params, &MaterializeOptions::default()).unwrap();
    assert!(out.legend.is_empty());
}

#[test]
fn non_finite_values_get_na_colour() {
    let table = DataTable::new(vec![(
        "v".into(),
        Column::Number(vec![1.0, f64::NAN, 3.0]),
    )])
    .unwrap();
    let params = PointcloudParams {
        fill_colour: Some(Override::Column("v".into())),
        ..Default::default()
    };
    let out = materialize(&table, &params, &MaterializeOptions::default()).unwrap();
    let Some(Column::Rgba(colours)) = out.data.column(Attribute::FillColour) else {
        panic!("fill_colour should be a colour column");
    };
    assert_eq!(colours[1], NA_COLOUR);
}

#[test]
fn opacity_applies_to_mapped_colours_only() {
    let options = MaterializeOptions {
        opacity: Some(0x80),
        ..Default::default()
    };
    let payload = column_json(
        &data(),
        &json!({
            "fill_colour": {"column": "value"},
            "stroke_colour": "#FF0000",
            "legend": true
        }),
        &options,
    )
    .unwrap();
    let rows: Vec<Value> = serde_json::from_str(&payload.data).unwrap();
    assert!(rows[0]["fill_colour"].as_str().unwrap().ends_with("80"));
    assert_eq!(rows[0]["stroke_colour"], json!("#FF0000FF"));

    let legend: Value = serde_json::from_str(&payload.legend).unwrap();
    assert_eq!(legend["fill_colour"]["type"], json!("gradient"));
    assert_eq!(legend["fill_colour"]["title"], json!("value"));
}

#[test]
fn rgba_format_emits_nested_arrays() {
    let options = MaterializeOptions {
        colour_format: ColourFormat::Rgba,
        ..Default::default()
    };
    let payload = column_json(&DataTable::with_rows(2), &Value::Null, &options).unwrap();
    let rows: Vec<Value> = serde_json::from_str(&payload.data).unwrap();
    assert_eq!(rows[1]["fill_colour"], json!([68, 1, 84, 255]));
    assert_eq!(rows[1]["stroke_colour"], json!([68, 1, 84, 255]));
}
