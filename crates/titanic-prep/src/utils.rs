//! Shared helpers: dtype checks, cell formatting and file naming.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Short dtype name used in reports (`i64`, `f64`, `str`, ...).
pub fn dtype_name(dtype: &DataType) -> String {
    dtype.to_string()
}

// =============================================================================
// Formatting
// =============================================================================

/// Marker printed for missing cells.
pub const MISSING_MARKER: &str = "NaN";

/// Format a float column with one shared precision, the way tables print
/// them: enough decimals for the most precise value, between 1 and 6.
pub fn format_float_column(values: &[Option<f64>]) -> Vec<String> {
    let decimals = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .map(|v| {
            let text = format!("{v}");
            text.split_once('.').map_or(0, |(_, frac)| frac.len())
        })
        .max()
        .unwrap_or(1)
        .clamp(1, 6);

    values
        .iter()
        .map(|v| match v {
            Some(v) if v.is_nan() => MISSING_MARKER.to_string(),
            Some(v) => format!("{v:.decimals$}"),
            None => MISSING_MARKER.to_string(),
        })
        .collect()
}

/// Render every cell of a series as report text.
pub fn series_cells(series: &Series) -> PolarsResult<Vec<String>> {
    let dtype = series.dtype();
    let cells = if is_float_dtype(dtype) {
        let values: Vec<Option<f64>> = series.cast(&DataType::Float64)?.f64()?.into_iter().collect();
        format_float_column(&values)
    } else if is_numeric_dtype(dtype) {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| {
                v.map(|i| i.to_string())
                    .unwrap_or_else(|| MISSING_MARKER.to_string())
            })
            .collect()
    } else {
        series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or(MISSING_MARKER).to_string())
            .collect()
    };
    Ok(cells)
}

/// Replace characters that are unsafe in file names.
///
/// Column names such as `Siblings/Spouses Aboard` become
/// `Siblings_Spouses_Aboard`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ' ' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}
