use deck_records::params::{ColumnParams, Override, PointcloudParams};
use deck_records::serialize::{data_from_json, data_to_json};
use deck_records::storage::read_csv;
use deck_records::{
    Cell, Column, ColourFormat, DataTable, Layer, MaterializeOptions, materialize,
};
use serde_json::Value;

fn sample() -> DataTable {
    DataTable::new(vec![
        ("h".into(), Column::Number(vec![1.5, 2.0, 8.25])),
        ("kind".into(), Column::Text(vec!["a".into(), "b".into(), "c".into()])),
    ])
    .unwrap()
}

#[test]
fn data_json_round_trips_value_for_value() {
    let params = PointcloudParams {
        elevation: Some(Override::Column("h".into())),
        radius: Some(Override::Sequence(vec![3.0, 4.0, 5.0])),
        polyline: Some(Override::Scalar("_p~iF~ps|U".into())),
        fill_colour: Some(Override::Column("kind".into())),
        fill_opacity: Some(Override::Scalar(200.0)),
        legend: true,
    };
    let out = materialize(&sample(), &params, &MaterializeOptions::default()).unwrap();

    for format in [ColourFormat::Hex, ColourFormat::Rgba] {
        let json = data_to_json(&out.data, format).unwrap();
        let back = data_from_json(Layer::Pointcloud, &json).unwrap();
        assert_eq!(back, out.data);
        assert_eq!(data_to_json(&back, format).unwrap(), json);
    }
}

#[test]
fn rows_are_objects_keyed_in_declaration_order() {
    let out = materialize(
        &DataTable::with_rows(2),
        &ColumnParams::default(),
        &MaterializeOptions::default(),
    )
    .unwrap();
    let json = data_to_json(&out.data, ColourFormat::Hex).unwrap();
    let first = json.find('{').unwrap();
    let obj_end = json.find('}').unwrap();
    let first_row = &json[first..=obj_end];
    let positions: Vec<usize> = Layer::Column
        .attributes()
        .iter()
        .map(|a| first_row.find(&format!("\"{}\"", a.name())).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{first_row}");
}

#[test]
fn legend_json_is_an_object_keyed_by_attribute() {
    let params = PointcloudParams {
        fill_colour: Some(Override::Sequence(vec![
            Cell::from(1.0),
            Cell::from(2.0),
            Cell::from(3.0),
        ])),
        legend: true,
        ..Default::default()
    };
    let out = materialize(&sample(), &params, &MaterializeOptions::default()).unwrap();
    let payload = out.to_payload(ColourFormat::Hex).unwrap();
    let legend: Value = serde_json::from_str(&payload.legend).unwrap();
    let obj = legend.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    let entry = &obj["fill_colour"];
    assert_eq!(entry["title"], "fill_colour");
    assert_eq!(entry["colour"].as_array().unwrap().len(), 5);

    // the legend is self-describing enough to read back
    let back: deck_records::Legend = serde_json::from_str(&payload.legend).unwrap();
    assert_eq!(back, out.legend);
}

#[test]
fn empty_legend_serializes_as_empty_object() {
    let out = materialize(
        &DataTable::with_rows(1),
        &PointcloudParams::default(),
        &MaterializeOptions::default(),
    )
    .unwrap();
    let payload = out.to_payload(ColourFormat::Hex).unwrap();
    assert_eq!(payload.legend, "{}");
}

#[test]
fn csv_with_non_finite_fields_round_trips() {
    let table = read_csv("h,label\ninf,x\n2,NaN\n".as_bytes()).unwrap();
    assert!(matches!(table.column("h"), Some(Column::Text(_))));

    let params = PointcloudParams {
        polyline: Some(Override::Column("h".into())),
        fill_colour: Some(Override::Column("label".into())),
        ..Default::default()
    };
    let out = materialize(&table, &params, &MaterializeOptions::default()).unwrap();
    let json = data_to_json(&out.data, ColourFormat::Hex).unwrap();
    let back = data_from_json(Layer::Pointcloud, &json).unwrap();
    assert_eq!(back, out.data);
}
