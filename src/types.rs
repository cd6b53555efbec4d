use ndarray::{Array2, ArrayView1};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum weighting score a cell type must reach to count as a match
pub const SCORE_CUTOFF: f64 = 0.1;

/// Maximum number of matched cell types kept per sample column
pub const MATCH_CAP: usize = 5;

/// Default maximum number of contributing genes kept per matched cell type
pub const DEFAULT_GENE_LIMIT: usize = 10;

/// Occurrence counts of every gene across one source table
pub type GeneCounts = HashMap<String, u32>;

/// Top contributing genes for each matched cell type, one entry per sample
/// column, kept in original column order
pub type TopGeneCollection = Vec<(String, DataFrame)>;

/// Thresholds and caps applied during top-k selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionOptions {
    /// Maximum number of gene entries kept per matched cell type
    pub limit: usize,
    /// Gene contribution scores must be strictly greater than this to be kept
    pub level: f64,
    /// Minimum weighting score for a cell type to be selected
    pub cutoff: f64,
    /// Maximum number of cell types selected per sample column
    pub cap: usize,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        SelectionOptions {
            limit: DEFAULT_GENE_LIMIT,
            level: 0.0,
            cutoff: SCORE_CUTOFF,
            cap: MATCH_CAP,
        }
    }
}

/// Per-gene, per-category marker potential scores
///
/// Rows follow the gene universe the matrix was built over, columns follow
/// the source table's column order. A cell is nonzero only where the gene
/// actually appears in that category's ranked list.
#[derive(Debug, Clone)]
pub struct MarkerPotentialMatrix {
    genes: Vec<String>,
    categories: Vec<String>,
    values: Array2<f64>,
    gene_index: HashMap<String, usize>,
}

impl MarkerPotentialMatrix {
    pub fn new(genes: Vec<String>, categories: Vec<String>, values: Array2<f64>) -> Self {
        let gene_index = genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i))
            .collect();
        MarkerPotentialMatrix {
            genes,
            categories,
            values,
            gene_index,
        }
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Potential score for one (gene, category) cell, 0.0 when either
    /// label is unknown
    pub fn potential(&self, gene: &str, category: &str) -> f64 {
        let row = self.gene_index.get(gene);
        let col = self.categories.iter().position(|c| c == category);
        match (row, col) {
            (Some(&r), Some(c)) => self.values[[r, c]],
            _ => 0.0,
        }
    }

    /// Potential scores of every gene for one category column
    pub fn category_column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(idx)
    }
}

/// Normalized percentage match scores, reference cell types as rows and
/// sample columns as columns
///
/// Scores are kept at full precision; rounding to two decimals happens only
/// when formatting for display or export.
#[derive(Debug, Clone)]
pub struct WeightingMatrix {
    reference_categories: Vec<String>,
    sample_categories: Vec<String>,
    values: Array2<f64>,
}

impl WeightingMatrix {
    pub fn new(
        reference_categories: Vec<String>,
        sample_categories: Vec<String>,
        values: Array2<f64>,
    ) -> Self {
        WeightingMatrix {
            reference_categories,
            sample_categories,
            values,
        }
    }

    pub fn reference_categories(&self) -> &[String] {
        &self.reference_categories
    }

    pub fn sample_categories(&self) -> &[String] {
        &self.sample_categories
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Match score for one (reference, sample) pair, 0.0 when either label
    /// is unknown
    pub fn score(&self, reference: &str, sample: &str) -> f64 {
        let row = self
            .reference_categories
            .iter()
            .position(|c| c == reference);
        let col = self.sample_categories.iter().position(|c| c == sample);
        match (row, col) {
            (Some(r), Some(c)) => self.values[[r, c]],
            _ => 0.0,
        }
    }

    /// Scores of every reference cell type for one sample column
    pub fn sample_column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(idx)
    }

    /// Exports the matrix as a DataFrame with a leading "cell_type" label
    /// column, scores rounded to two decimals
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.sample_categories.len() + 1);
        columns.push(Column::new(
            "cell_type".into(),
            self.reference_categories.clone(),
        ));
        for (j, name) in self.sample_categories.iter().enumerate() {
            let rounded: Vec<f64> = self
                .values
                .column(j)
                .iter()
                .map(|v| (v * 100.0).round() / 100.0)
                .collect();
            columns.push(Column::new(name.as_str().into(), rounded));
        }
        DataFrame::new(columns)
    }
}
