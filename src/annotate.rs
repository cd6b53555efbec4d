use crate::error::{AnnotError, Result};
use crate::types::*;
use ndarray::{Array2, Axis};
use polars::prelude::*;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Extracts one table column as gene cells, None for null or empty cells
fn column_cells(col: &Column) -> Result<Vec<Option<String>>> {
    let casted;
    let strings = if col.dtype() == &DataType::String {
        col.str()?
    } else {
        casted = col.cast(&DataType::String)?;
        casted.str()?
    };

    Ok(strings
        .into_iter()
        .map(|cell| match cell {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        })
        .collect())
}

/// Appends genes from a table in first-seen order, skipping ones already seen
fn collect_genes(df: &DataFrame, seen: &mut HashSet<String>, genes: &mut Vec<String>) -> Result<()> {
    for col in df.get_columns() {
        for cell in column_cells(col)? {
            if let Some(gene) = cell {
                if seen.insert(gene.clone()) {
                    genes.push(gene);
                }
            }
        }
    }
    Ok(())
}

/// Counts occurrences of every gene across all cells of a table
///
/// Counts the whole grid, not per column: a gene listed under several cell
/// types is counted once per listing. Null and empty cells are skipped.
/// An empty table yields an empty map.
///
/// # Arguments
/// * `df` - Table of gene-name cells, one column per category
///
/// # Returns
/// * `Result<GeneCounts>` - Map from gene to its occurrence count
pub fn gene_counts(df: &DataFrame) -> Result<GeneCounts> {
    let mut counts = GeneCounts::new();
    for col in df.get_columns() {
        for cell in column_cells(col)? {
            if let Some(gene) = cell {
                *counts.entry(gene).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

/// Counts map giving every gene a denominator of exactly 1
///
/// Used for the sample-side potential matrix, where scores are purely
/// rank-based rather than frequency-weighted.
pub fn unit_counts(genes: &[String]) -> GeneCounts {
    genes.iter().map(|g| (g.clone(), 1)).collect()
}

/// Builds the marker potential matrix for one table
///
/// For each category column and each 0-based row index `i` holding gene `g`,
/// the potential is `1 / (1 + i) / counts[g]`: genes ranked earlier in a
/// column and genes rarer across the whole corpus score higher. Rows with
/// null or empty cells keep their index but contribute nothing, so every
/// other (gene, category) cell is exactly 0. A gene listed twice in one
/// column keeps the score of its last listing.
///
/// # Arguments
/// * `df` - Table mapping category columns to ranked gene lists
/// * `counts` - Frequency denominator for every gene in `df`
/// * `genes` - Gene universe defining the row axis; must cover every gene in `df`
///
/// # Returns
/// * `Result<MarkerPotentialMatrix>` - Matrix of genes x categories
///
/// # Errors
/// * `AnnotError::ZeroFrequency` - A gene in `df` has a zero or missing
///   count; its potential would be infinite, which is a data-integrity
///   violation rather than a value to propagate
/// * `AnnotError::DataError` - A gene in `df` is missing from `genes`
pub fn marker_potential_matrix(
    df: &DataFrame,
    counts: &GeneCounts,
    genes: &[String],
) -> Result<MarkerPotentialMatrix> {
    let gene_index: HashMap<&str, usize> = genes
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();

    let categories: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut values = Array2::<f64>::zeros((genes.len(), categories.len()));
    for (c, col) in df.get_columns().iter().enumerate() {
        for (i, cell) in column_cells(col)?.into_iter().enumerate() {
            if let Some(gene) = cell {
                let n = counts.get(&gene).copied().unwrap_or(0);
                if n == 0 {
                    return Err(AnnotError::zero_frequency(gene));
                }
                let row = *gene_index.get(gene.as_str()).ok_or_else(|| {
                    AnnotError::DataError(format!("gene {:?} missing from gene universe", gene))
                })?;
                values[[row, c]] = 1.0 / (1.0 + i as f64) / n as f64;
            }
        }
    }

    Ok(MarkerPotentialMatrix::new(
        genes.to_vec(),
        categories,
        values,
    ))
}

/// Scores every reference cell type against every sample column
///
/// Computes the matrix product of the transposed reference potential and the
/// sample potential over the shared gene axis, then normalizes each sample
/// column into percentages summing to 100. A sample column whose raw scores
/// sum to zero shares no genes with any reference cell type and is left
/// all-zero, never NaN; downstream selection treats it as "no matches".
///
/// # Arguments
/// * `reference` - Potential matrix built from the reference table
/// * `sample` - Potential matrix built from the sample table, same gene universe
///
/// # Returns
/// * `Result<WeightingMatrix>` - Full-precision percentage scores
///
/// # Errors
/// * `AnnotError::DataError` - The two matrices were built over different
///   gene universes
pub fn match_weightings(
    reference: &MarkerPotentialMatrix,
    sample: &MarkerPotentialMatrix,
) -> Result<WeightingMatrix> {
    if reference.genes() != sample.genes() {
        return Err(AnnotError::DataError(
            "reference and sample potential matrices have different gene universes".into(),
        ));
    }

    let mut raw = reference.values().t().dot(sample.values());
    for mut column in raw.axis_iter_mut(Axis(1)) {
        let sum = column.sum();
        if sum > 0.0 {
            column.mapv_inplace(|v| v / sum * 100.0);
        }
    }

    Ok(WeightingMatrix::new(
        reference.categories().to_vec(),
        sample.categories().to_vec(),
        raw,
    ))
}

/// Indices of one weighting column sorted descending, filtered by `cutoff`
/// and truncated to `cap`; ties keep original table order
fn select_categories(
    scores: ndarray::ArrayView1<'_, f64>,
    cutoff: f64,
    cap: usize,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    order
        .into_iter()
        .filter(|&r| scores[r] >= cutoff)
        .take(cap)
        .collect()
}

/// Builds the top-gene table for one sample column
fn top_genes_for_column(
    weightings: &WeightingMatrix,
    reference: &MarkerPotentialMatrix,
    sample: &MarkerPotentialMatrix,
    col: usize,
    options: &SelectionOptions,
) -> Result<DataFrame> {
    let selected = select_categories(weightings.sample_column(col), options.cutoff, options.cap);
    if selected.is_empty() {
        return Ok(DataFrame::empty());
    }

    let sample_potential = sample.category_column(col);
    let genes = reference.genes();

    let mut lists: Vec<(String, Vec<String>)> = Vec::with_capacity(selected.len());
    for r in selected {
        let reference_potential = reference.category_column(r);
        let mut contributions: Vec<(usize, f64)> = (0..genes.len())
            .map(|g| (g, reference_potential[g] * sample_potential[g] * 100.0))
            .collect();
        contributions
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let formatted: Vec<String> = contributions
            .into_iter()
            .filter(|&(_, score)| score > options.level)
            .take(options.limit)
            .map(|(g, score)| format!("{} ({:.2})", genes[g], score))
            .collect();
        lists.push((weightings.reference_categories()[r].clone(), formatted));
    }

    // Pad every list to the tallest one so the table is rectangular
    let max_genes = lists.iter().map(|(_, l)| l.len()).max().unwrap_or(0);
    let columns: Vec<Column> = lists
        .into_iter()
        .map(|(name, mut list)| {
            list.resize(max_genes, String::new());
            Column::new(name.as_str().into(), list)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Selects the top matching cell types and their top contributing genes
///
/// For every sample column, keeps the reference cell types whose weighting
/// score clears `options.cutoff` (at most `options.cap` of them), then for
/// each kept cell type ranks per-gene contributions
/// (`reference potential x sample potential x 100`), keeping up to
/// `options.limit` scores strictly above `options.level`, formatted as
/// `"<gene> (<score>)"` with two decimals. Columns are processed in
/// parallel; each column's scores are computed independently so results
/// match the sequential order.
///
/// # Arguments
/// * `weightings` - Weighting matrix from [`match_weightings`]
/// * `reference` - Reference-side potential matrix
/// * `sample` - Sample-side potential matrix
/// * `options` - Selection thresholds and caps
///
/// # Returns
/// * `Result<TopGeneCollection>` - Per sample column, a table with one
///   string column per matched cell type, padded with empty strings to a
///   common height; an empty table when nothing clears the cutoff
pub fn top_gene_scores(
    weightings: &WeightingMatrix,
    reference: &MarkerPotentialMatrix,
    sample: &MarkerPotentialMatrix,
    options: &SelectionOptions,
) -> Result<TopGeneCollection> {
    weightings
        .sample_categories()
        .par_iter()
        .enumerate()
        .map(|(col, name)| {
            let table = top_genes_for_column(weightings, reference, sample, col, options)?;
            Ok((name.clone(), table))
        })
        .collect()
}

/// Runs the full annotation pipeline over a reference and a sample table
///
/// Gene frequencies are counted across the reference table; genes that
/// appear only in the sample are seeded with a count of 0 so the two
/// potential matrices share one gene universe. The reference potential is
/// frequency-weighted while the sample potential uses unit denominators,
/// making sample-side scores purely rank-based.
///
/// # Arguments
/// * `reference` - Reference table, one ranked marker gene list per cell type
/// * `sample` - Sample table, one ranked gene list per experimental column
/// * `options` - Selection thresholds and caps, see [`SelectionOptions`]
///
/// # Returns
/// * `Result<(WeightingMatrix, TopGeneCollection)>` - Percentage match
///   scores plus the per-column top contributing genes
///
/// # Example
/// ```ignore
/// use cell_annot_rs::annotate::create_annotations;
/// use cell_annot_rs::types::SelectionOptions;
///
/// let (weightings, top_genes) =
///     create_annotations(&reference, &sample, &SelectionOptions::default()).unwrap();
/// ```
pub fn create_annotations(
    reference: &DataFrame,
    sample: &DataFrame,
    options: &SelectionOptions,
) -> Result<(WeightingMatrix, TopGeneCollection)> {
    let mut counts = gene_counts(reference)?;

    let mut seen = HashSet::new();
    let mut genes = Vec::with_capacity(counts.len());
    collect_genes(reference, &mut seen, &mut genes)?;
    collect_genes(sample, &mut seen, &mut genes)?;

    // Genes seen only in the sample get a zero count so the universe stays
    // aligned; they never divide anything on the reference side
    for gene in &genes {
        counts.entry(gene.clone()).or_insert(0);
    }

    let reference_potential = marker_potential_matrix(reference, &counts, &genes)?;
    let sample_potential = marker_potential_matrix(sample, &unit_counts(&genes), &genes)?;

    let weightings = match_weightings(&reference_potential, &sample_potential)?;
    let top_genes = top_gene_scores(&weightings, &reference_potential, &sample_potential, options)?;

    Ok((weightings, top_genes))
}
