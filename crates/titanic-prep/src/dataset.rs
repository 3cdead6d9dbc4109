//! Loading, validating and writing the passenger table.
//!
//! Every stage reloads the source table through [`load_table`] and reads
//! columns through the typed accessors below, which turn a missing or
//! mistyped column into a schema error.

use crate::error::{PrepError, Result};
use crate::utils::{dtype_name, is_numeric_dtype};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load the source table, failing with [`PrepError::MissingInput`] when the
/// file is absent and [`PrepError::Parse`] when any row cannot be read.
///
/// The file is read in a single pass with `"` as the quote character, and
/// column types are inferred from every row.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PrepError::MissingInput(path.to_path_buf()));
    }

    info!("Loading dataset from: {}", path.display());
    let parse_err = |e: PolarsError| PrepError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let df = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .map_err(parse_err)?
        .finish()
        .map_err(parse_err)?;
    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

/// Write a table as CSV with a header row, creating parent directories.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!(
        "Wrote {} rows x {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(())
}

/// Fail with [`PrepError::ColumnNotFound`] for the first absent column.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<()> {
    for column in columns {
        let name = column.as_ref();
        if df.column(name).is_err() {
            return Err(PrepError::ColumnNotFound(name.to_string()));
        }
    }
    Ok(())
}

/// Look up a column as a materialized series.
pub fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PrepError::ColumnNotFound(name.to_string()))
}

/// Read a numeric column as `f64` values. Nulls and NaN both come back as
/// `None`, so a `NaN` cell in the file counts as missing.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = column_series(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(PrepError::WrongColumnType {
            column: name.to_string(),
            expected: "numeric".to_string(),
            actual: dtype_name(series.dtype()),
        });
    }
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| !v.is_nan()))
        .collect())
}

/// Read a column as category labels. Numeric columns are rendered as text,
/// so `Pclass` yields `"1"`, `"2"`, `"3"`.
pub fn category_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column_series(df, name)?;
    let labels = if is_numeric_dtype(series.dtype()) {
        numeric_values(df, name)?
            .into_iter()
            .map(|v| v.map(format_category_number))
            .collect()
    } else {
        let string_series = series.cast(&DataType::String)?;
        string_series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    };
    Ok(labels)
}

/// Integers print without a decimal point so class labels read `1`, not `1.0`.
fn format_category_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Per-row missing flags of a column. Numeric columns also treat NaN as
/// missing.
pub fn missing_mask(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
    let series = column_series(df, name)?;
    if is_numeric_dtype(series.dtype()) {
        return Ok(numeric_values(df, name)?
            .iter()
            .map(Option::is_none)
            .collect());
    }
    Ok(series
        .is_null()
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect())
}

/// Keep only the non-null values.
pub fn non_null(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}
