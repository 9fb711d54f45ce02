use crate::models::{Column, DataTable};
use crate::serialize::RenderPayload;
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Read a table from CSV with a header row.
///
/// A column is numeric when every field parses as a finite `f64`; otherwise
/// it is text. `inf` and `NaN` stay text because JSON cannot carry them.
pub fn read_csv<R: Read>(reader: R) -> Result<DataTable> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("CSV record {}", i + 1))?;
        for (col, field) in raw.iter_mut().zip(record.iter()) {
            col.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, fields)| (name, infer_column(fields)))
        .collect();
    Ok(DataTable::new(columns)?)
}

fn infer_column(fields: Vec<String>) -> Column {
    let numbers: Option<Vec<f64>> = fields
        .iter()
        .map(|f| f.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();
    match numbers {
        Some(v) if !v.is_empty() => Column::Number(v),
        _ => Column::Text(fields),
    }
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_csv(f).with_context(|| format!("read {}", path.display()))
}

/// Parse a JSON array of row objects into a table.
///
/// Columns come out sorted by name. Every row must carry every
/// column, each value a number or a string, and a column must not mix both.
pub fn parse_json_records(json: &str) -> Result<DataTable> {
    let rows: Vec<Map<String, Value>> = serde_json::from_str(json).context("decode json records")?;

    let names: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();

    let mut table = DataTable::with_rows(rows.len());
    for name in names {
        let mut values = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            match row.get(name) {
                Some(v) => values.push(v),
                None => bail!("row {} has no value for `{}`", i, name),
            }
        }
        table.insert(name, json_column(name, &values)?)?;
    }
    Ok(table)
}

fn json_column(name: &str, values: &[&Value]) -> Result<Column> {
    if values.iter().all(|v| v.is_number()) {
        return Ok(Column::Number(values.iter().filter_map(|v| v.as_f64()).collect()));
    }
    let texts: Option<Vec<String>> = values.iter().map(|v| v.as_str().map(str::to_string)).collect();
    match texts {
        Some(t) => Ok(Column::Text(t)),
        None => bail!("column `{}` must hold only numbers or only strings", name),
    }
}

pub fn load_json<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_json_records(&s).with_context(|| format!("parse {}", path.display()))
}

/// Load a table, choosing the reader from the file extension.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => bail!("unsupported data format: {:?}", other),
    }
}

/// Save a payload as one `{"data": ..., "legend": ...}` document.
pub fn save_payload<P: AsRef<Path>>(payload: &RenderPayload, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    f.write_all(payload.to_document().as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
