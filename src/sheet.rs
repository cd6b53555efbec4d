use crate::error::{AnnotError, Result};
use polars::prelude::*;

fn is_numeric_dtype(dtype: &DataType) -> bool {
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

/// Reads a sample sheet from a CSV file and trims it to the gene data region.
///
/// Sheets exported from assay software are often not aligned to the left:
/// label and numeric index columns precede the gene columns. This locates the
/// first column with numeric data, takes the data length from that column's
/// first missing value, then drops every column up to and including it:
///
/// ```text
///   | label | 0 | GeneA | GeneB | ...        | GeneA | GeneB | ...
///   | label | 1 | GeneC | GeneD | ...   ->   | GeneC | GeneD | ...
/// ```
///
/// # Arguments
/// * `filename` - Path to the CSV file to read
///
/// # Returns
/// * `Result<DataFrame>` - Gene-name columns only, truncated at the first
///   fully-missing row of the index column
///
/// # Errors
/// * Returns `AnnotError::InvalidSheetFormat` if no numeric index column is
///   found, the data region is empty, or no gene columns follow the index
/// * Returns `AnnotError::DataError` for CSV reading issues
pub fn read_sample_sheet(filename: &str) -> Result<DataFrame> {
    let df = LazyCsvReader::new(filename)
        .with_has_header(true)
        .finish()?
        .collect()?;

    let columns = df.get_columns();

    // First column with numeric data marks the end of the leading
    // label/index region
    let mut start = None;
    for (idx, col) in columns.iter().enumerate() {
        if is_numeric_dtype(col.dtype()) && col.null_count() < col.len() {
            let length = col
                .as_materialized_series()
                .is_null()
                .into_iter()
                .position(|missing| missing == Some(true))
                .unwrap_or(col.len());
            start = Some((idx, length));
            break;
        }
    }

    let (start_idx, length) = start.ok_or_else(|| {
        AnnotError::invalid_sheet_format("no numeric index column found in sample sheet")
    })?;
    if length == 0 {
        return Err(AnnotError::invalid_sheet_format(
            "sample sheet data region is empty",
        ));
    }
    if start_idx + 1 >= columns.len() {
        return Err(AnnotError::invalid_sheet_format(
            "no gene columns found after the index column",
        ));
    }

    let trimmed: Vec<Column> = columns[start_idx + 1..]
        .iter()
        .map(|col| col.slice(0, length))
        .collect();

    Ok(DataFrame::new(trimmed)?)
}

/// Reads a reference sheet from a CSV file.
///
/// The reference sheet interleaves each cell type's ranked marker list with
/// an "ordering metadata" sub-column:
///
/// ```text
/// | Cell type 1       | Cell type 1    | Cell type 2       | ...
/// | Wilcoxon Ordering | Other ordering | Wilcoxon Ordering | ...
/// ```
///
/// Only every other column, starting from the first, is kept.
///
/// # Arguments
/// * `filename` - Path to the CSV file to read
///
/// # Returns
/// * `Result<DataFrame>` - One ranked marker gene column per cell type
///
/// # Errors
/// * Returns `AnnotError::InvalidSheetFormat` if the sheet has no columns
/// * Returns `AnnotError::DataError` for CSV reading issues
pub fn read_reference_sheet(filename: &str) -> Result<DataFrame> {
    let df = LazyCsvReader::new(filename)
        .with_has_header(true)
        .finish()?
        .collect()?;

    let columns: Vec<Column> = df.get_columns().iter().step_by(2).cloned().collect();
    if columns.is_empty() {
        return Err(AnnotError::invalid_sheet_format(
            "no cell type columns found in reference sheet",
        ));
    }

    Ok(DataFrame::new(columns)?)
}
