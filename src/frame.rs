use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;

use encoding_rs::Encoding;
use polars::prelude::*;
use tracing::warn;

use crate::error::BnfError;

/// Helper column carrying the presentation order in reindexing joins.
pub const ORDER: &str = "_order";

const MATCH_COUNT: &str = "_match_count";

// ── Reading ─────────────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
///
/// The file is decoded from `encoding` before parsing (FAOSTAT bulk files
/// are windows-1252, the reference tables UTF-8). Malformed sequences become
/// U+FFFD with a warning. Column names are trimmed.
pub fn read_csv_as_strings(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<DataFrame, BnfError> {
    let bytes = fs::read(path).map_err(|e| BnfError::InputFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = used.name(),
            "Malformed bytes replaced while decoding"
        );
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .into_reader_with_file_handle(Cursor::new(text.into_owned().into_bytes()))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), BnfError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(BnfError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Parse a string column to Float64. Unparsable or empty cells become null.
pub fn parse_float(column: &str) -> Expr {
    col(column)
        .str()
        .strip_chars(lit(" \t\r\n"))
        .cast(DataType::Float64)
}

/// Parse a string column to Int64. Unparsable or empty cells become null.
pub fn parse_int(column: &str) -> Expr {
    col(column)
        .str()
        .strip_chars(lit(" \t\r\n"))
        .cast(DataType::Int64)
}

// ── Key checks ──────────────────────────────────────────────────────────────

/// Fail with `NonUniqueKey` if any combination of `keys` occurs more than once.
pub fn ensure_unique(df: &DataFrame, keys: &[&str], table: &str) -> Result<(), BnfError> {
    let dups = df
        .clone()
        .lazy()
        .group_by(keys.iter().map(|k| col(*k)).collect::<Vec<_>>())
        .agg([len().alias(MATCH_COUNT)])
        .filter(col(MATCH_COUNT).gt(lit(1)))
        .collect()?;

    if dups.height() == 0 {
        return Ok(());
    }

    let mut example = Vec::with_capacity(keys.len());
    for key in keys {
        let value = dups.column(key)?.get(0)?;
        example.push(format!("{key}={value}"));
    }
    Err(BnfError::NonUniqueKey(format!(
        "{} duplicated ({}) keys in {table}, e.g. ({})",
        dups.height(),
        keys.join(", "),
        example.join(", ")
    )))
}

// ── Aggregation ─────────────────────────────────────────────────────────────

/// Group sum that skips NaN and null. A group with no finite-or-infinite
/// value left yields null instead of 0.
pub fn nan_aware_sum(column: &str) -> Expr {
    let values = col(column).fill_nan(lit(NULL));
    when(values.clone().count().gt(lit(0)))
        .then(values.sum())
        .otherwise(lit(NULL).cast(DataType::Float64))
        .alias(column)
}

// ── Eager column maps ───────────────────────────────────────────────────────

/// Apply `f` to every non-null value of a Float64 column and store the result
/// under `target` (replacing it if present).
pub fn map_f64<F>(df: &mut DataFrame, source: &str, target: &str, f: F) -> Result<(), BnfError>
where
    F: Fn(f64) -> f64,
{
    let mapped: Float64Chunked = df
        .column(source)?
        .f64()?
        .into_iter()
        .map(|v| v.map(&f))
        .collect();
    df.with_column(mapped.with_name(target.into()).into_series())?;
    Ok(())
}

/// Round half to even at `decimals` places.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

pub fn round_columns(df: &mut DataFrame, columns: &[&str], decimals: i32) -> Result<(), BnfError> {
    for name in columns {
        map_f64(df, name, name, |v| round_half_even(v, decimals))?;
    }
    Ok(())
}

/// Two-column frame `(column, _order)` used to reindex a table to a fixed
/// label order.
pub fn order_frame(column: &str, labels: &[&str]) -> Result<DataFrame, BnfError> {
    let order: Vec<i64> = (0..labels.len() as i64).collect();
    let df = DataFrame::new(vec![
        Column::new(column.into(), labels),
        Column::new(ORDER.into(), &order),
    ])?;
    Ok(df)
}

// ── Writing ─────────────────────────────────────────────────────────────────

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), BnfError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
