use crate::error::Result;
use crate::types::{WeightingMatrix, MATCH_CAP, SCORE_CUTOFF};
use polars::prelude::*;
use std::cmp::Ordering;

/// Number of rows every display column is padded to
const DISPLAY_ROWS: usize = MATCH_CAP;

/// Formats the top matching cell types per sample column for display
///
/// Per sample column, reference cell types are sorted by weighting score
/// descending (ties keep original table order), kept while their score is at
/// least `level`, truncated to the top 5 and formatted as
/// `"<cell type> (<pct>%)"` with two decimals. Every column is padded with
/// empty strings to exactly 5 rows. The weighting matrix is not modified.
///
/// # Arguments
/// * `weightings` - Weighting matrix from [`crate::annotate::match_weightings`]
/// * `level` - Minimum score for a cell type to be shown, normally
///   [`SCORE_CUTOFF`]
///
/// # Returns
/// * `Result<DataFrame>` - One string column per sample column, 5 rows each
pub fn display_matrix(weightings: &WeightingMatrix, level: f64) -> Result<DataFrame> {
    let reference = weightings.reference_categories();

    let columns: Vec<Column> = weightings
        .sample_categories()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let scores = weightings.sample_column(j);
            let mut order: Vec<usize> = (0..scores.len()).collect();
            order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

            let mut formatted: Vec<String> = order
                .into_iter()
                .filter(|&r| scores[r] >= level)
                .take(DISPLAY_ROWS)
                .map(|r| format!("{} ({:.2}%)", reference[r], scores[r]))
                .collect();
            formatted.resize(DISPLAY_ROWS, String::new());

            Column::new(name.as_str().into(), formatted)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Same as [`display_matrix`] with the default score cutoff
pub fn display_matrix_default(weightings: &WeightingMatrix) -> Result<DataFrame> {
    display_matrix(weightings, SCORE_CUTOFF)
}
