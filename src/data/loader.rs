use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{BattedBallDataset, BattedBallEvent, Hand, Handedness};

/// Home plate position in the raw Statcast `hc_x` / `hc_y` frame.
pub const STATCAST_PLATE_X: f64 = 125.42;
pub const STATCAST_PLATE_Y: f64 = 198.27;

const EXIT_VELOCITY_COLUMNS: &[&str] = &["exit_velocity", "launch_speed"];
const LAUNCH_ANGLE_COLUMNS: &[&str] = &["launch_angle"];
const HANDEDNESS_COLUMNS: &[&str] = &["batter_handedness", "stand"];
const PITCHER_THROWS_COLUMNS: &[&str] = &["pitcher_throws", "p_throws"];
const BATTER_COLUMNS: &[&str] = &["batter"];
const BATTER_NAME_COLUMNS: &[&str] = &["batter_name", "player_name"];

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, the common currency of all loaders.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Numeric view of the cell.  NaN counts as absent.
    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a batted-ball dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – e.g. a `pybaseball` Statcast export (recommended)
/// * `.json`    – `[{ "launch_speed": 101.2, "launch_angle": 24, ... }, ...]`
/// * `.csv`     – header row plus one event per line
pub fn load_file(path: &Path) -> Result<BattedBallDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "loaded {} batted-ball events ({} batters) from {}",
        dataset.len(),
        dataset.batters().len(),
        path.display()
    );
    Ok(dataset)
}

/// Build a dataset from an in-memory table: column names plus rows of cells.
pub fn load_table<S: AsRef<str>>(
    headers: &[S],
    rows: impl IntoIterator<Item = Vec<CellValue>>,
) -> Result<BattedBallDataset> {
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
    let columns = ColumnIndex::resolve(&headers)?;
    let events = rows
        .into_iter()
        .enumerate()
        .map(|(row, cells)| columns.event_from_row(row, &cells))
        .collect();
    Ok(BattedBallDataset::from_events(events))
}

// ---------------------------------------------------------------------------
// Column resolution and row conversion (shared by every format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Coordinates {
    /// Already relative to home plate.
    PlateRelative { x: usize, y: usize },
    /// Raw Statcast `hc_x` / `hc_y` pixels.
    Statcast { x: usize, y: usize },
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    exit_velocity: usize,
    launch_angle: usize,
    coordinates: Option<Coordinates>,
    handedness: Option<usize>,
    pitcher_throws: Option<usize>,
    batter: Option<usize>,
    batter_name: Option<usize>,
}

fn position_of(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self> {
        let exit_velocity = position_of(headers, EXIT_VELOCITY_COLUMNS)
            .context("missing exit velocity column ('exit_velocity' or 'launch_speed')")?;
        let launch_angle = position_of(headers, LAUNCH_ANGLE_COLUMNS)
            .context("missing 'launch_angle' column")?;

        let plate = position_of(headers, &["hit_coordinate_x"])
            .zip(position_of(headers, &["hit_coordinate_y"]))
            .map(|(x, y)| Coordinates::PlateRelative { x, y });
        let statcast = position_of(headers, &["hc_x"])
            .zip(position_of(headers, &["hc_y"]))
            .map(|(x, y)| Coordinates::Statcast { x, y });

        Ok(ColumnIndex {
            exit_velocity,
            launch_angle,
            coordinates: plate.or(statcast),
            handedness: position_of(headers, HANDEDNESS_COLUMNS),
            pitcher_throws: position_of(headers, PITCHER_THROWS_COLUMNS),
            batter: position_of(headers, BATTER_COLUMNS),
            batter_name: position_of(headers, BATTER_NAME_COLUMNS),
        })
    }

    fn event_from_row(&self, row: usize, cells: &[CellValue]) -> BattedBallEvent {
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i));
        let number = |idx: usize, col: &str| {
            let c = cells.get(idx)?;
            let v = c.as_f64();
            if v.is_none() && !c.is_null() {
                warn!("row {row}: non-numeric {col} value {c:?} treated as absent");
            }
            v
        };

        let (hit_coordinate_x, hit_coordinate_y) = match self.coordinates {
            Some(Coordinates::PlateRelative { x, y }) => (
                number(x, "hit_coordinate_x"),
                number(y, "hit_coordinate_y"),
            ),
            Some(Coordinates::Statcast { x, y }) => (
                number(x, "hc_x").map(|hc_x| hc_x - STATCAST_PLATE_X),
                number(y, "hc_y").map(|hc_y| STATCAST_PLATE_Y - hc_y),
            ),
            None => (None, None),
        };

        let batter_handedness = cell(self.handedness)
            .and_then(CellValue::as_text)
            .and_then(|s| match s.parse::<Handedness>() {
                Ok(h) => Some(h),
                Err(e) => {
                    warn!("row {row}: {e}, spray angle will be absent");
                    None
                }
            });
        if self.handedness.is_some()
            && batter_handedness.is_none()
            && cell(self.handedness).is_some_and(CellValue::is_null)
        {
            warn!("row {row}: missing batter handedness, spray angle will be absent");
        }

        BattedBallEvent {
            exit_velocity: number(self.exit_velocity, "exit_velocity"),
            launch_angle: number(self.launch_angle, "launch_angle"),
            hit_coordinate_x,
            hit_coordinate_y,
            batter_handedness,
            pitcher_throws: cell(self.pitcher_throws)
                .and_then(CellValue::as_text)
                .and_then(|s| s.parse::<Hand>().ok()),
            batter: cell(self.batter).and_then(CellValue::as_i64),
            batter_name: cell(self.batter_name)
                .and_then(CellValue::as_text)
                .map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "launch_speed": 101.3, "launch_angle": 22.0, "hc_x": 95.1, "hc_y": 80.4, "stand": "R" },
///   { "launch_speed": null,  "launch_angle": 15.0, "hc_x": null, "hc_y": null, "stand": "L" }
/// ]
/// ```
fn load_json(path: &Path) -> Result<BattedBallDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<BattedBallDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    if objects.is_empty() {
        return Ok(BattedBallDataset::default());
    }

    let rows: Vec<Vec<CellValue>> = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    load_table(&headers, rows)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, empty cells for absent values.
fn load_csv(path: &Path) -> Result<BattedBallDataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<BattedBallDataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    load_table(&headers, rows)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of batted-ball events.
///
/// Numeric columns of any integer or float width are accepted, as are plain,
/// large, view and dictionary-encoded string columns (pandas categoricals).
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<BattedBallDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| {
                normalize_column(col).with_context(|| format!("column '{name}'"))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }

    load_table(&headers, rows)
}

// -- Parquet / Arrow helpers --

/// Cast a column to one of the few types [`extract_cell`] understands.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Int64 | DataType::Float64 | DataType::Utf8 | DataType::Boolean => {
            return Ok(col.clone());
        }
        dt if dt.is_integer() => DataType::Int64,
        dt if dt.is_floating() || matches!(dt, DataType::Decimal128(..)) => DataType::Float64,
        DataType::LargeUtf8 | DataType::Utf8View | DataType::Dictionary(..) => DataType::Utf8,
        // Dates, lists etc. are irrelevant to batted-ball metrics.
        _ => return Ok(col.clone()),
    };
    Ok(cast(col, &target)?)
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => CellValue::Null,
    }
}
