use cell_annot_rs::annotate::create_annotations;
use cell_annot_rs::display::display_matrix_default;
use cell_annot_rs::sheet::{read_reference_sheet, read_sample_sheet};
use cell_annot_rs::types::{SelectionOptions, TopGeneCollection};
use clap::Parser;
use polars::prelude::*;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum AnnotatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Annotation error: {0}")]
    Annotation(#[from] cell_annot_rs::error::AnnotError),

    #[error("Unsupported output format: {0} (use .csv or .parquet)")]
    UnsupportedOutputFormat(String),
}

#[derive(Parser)]
#[command(
    name = "cell-annotator",
    about = "Scores known cell types against experimental gene panels and reports the marker genes behind each match",
    long_about = "A tool for annotating experimental gene panels with candidate cell types. \
                  It compares a reference sheet of ranked marker genes per cell type against \
                  a sample sheet of genes observed per experimental column, and outputs a \
                  percentage-weighted match matrix together with the top contributing genes \
                  for each match.",
    version,
    after_help = "Example usage:\n    \
                  cell-annotator reference.csv sample.csv weightings.parquet --limit 10 --level 0.5\n    \
                  cell-annotator markers.csv panel.csv weightings.csv --genes-dir top_genes",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Path to the reference sheet (CSV format)
    /// One ranked marker gene column per cell type, interleaved with
    /// ordering metadata sub-columns
    #[arg(value_name = "REFERENCE_FILE")]
    reference_file: String,

    /// Path to the sample sheet (CSV format)
    /// Gene columns preceded by a numeric index column
    #[arg(value_name = "DATA_FILE")]
    data_file: String,

    /// Path for the weighting matrix output (supports .csv or .parquet)
    /// Will create output directory if it doesn't exist
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: String,

    /// Maximum number of contributing genes reported per matched cell type
    #[arg(long, default_value = "10")]
    limit: usize,

    /// Minimum gene contribution score to report
    /// Only genes scoring strictly above this value are included
    #[arg(long, default_value = "0")]
    level: f64,

    /// Minimum match percentage for a cell type to count as a match
    #[arg(long, default_value = "0.1")]
    cutoff: f64,

    /// Maximum number of matched cell types kept per sample column
    #[arg(long, default_value = "5")]
    top: usize,

    /// Directory for the per-column top gene score tables
    /// One CSV per sample column; skipped when not set
    #[arg(long, value_name = "DIR")]
    genes_dir: Option<PathBuf>,
}

fn write_table(df: &mut DataFrame, path: &Path) -> Result<(), AnnotatorError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            let file = File::create(path)?;
            CsvWriter::new(file).finish(df)?;
        }
        Some("parquet") => {
            let file = File::create(path)?;
            ParquetWriter::new(file).finish(df)?;
        }
        other => {
            return Err(AnnotatorError::UnsupportedOutputFormat(
                other.unwrap_or("<none>").to_string(),
            ))
        }
    }
    Ok(())
}

fn write_top_genes(top_genes: &TopGeneCollection, dir: &Path) -> Result<(), AnnotatorError> {
    fs::create_dir_all(dir)?;
    for (column, table) in top_genes {
        if table.width() == 0 {
            println!("\tno matches for column {}", column);
            continue;
        }
        let name: String = column
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let path = dir.join(format!("{}_top_genes.csv", name));
        let mut table = table.clone();
        write_table(&mut table, &path)?;
    }
    Ok(())
}

fn main() -> Result<(), AnnotatorError> {
    let start_time = std::time::Instant::now();

    let args = Args::parse();

    // Create output directory if it doesn't exist
    if let Some(parent) = Path::new(&args.output_file).parent() {
        fs::create_dir_all(parent)?;
    }

    let reference = read_reference_sheet(&args.reference_file)?;
    let sample = read_sample_sheet(&args.data_file)?;
    println!(
        "{} cell types x {} sample columns to score",
        reference.width(),
        sample.width()
    );

    let options = SelectionOptions {
        limit: args.limit,
        level: args.level,
        cutoff: args.cutoff,
        cap: args.top,
    };
    let (weightings, top_genes) = create_annotations(&reference, &sample, &options)?;

    let mut weightings_df = weightings.to_dataframe()?;
    write_table(&mut weightings_df, Path::new(&args.output_file))?;

    if let Some(dir) = &args.genes_dir {
        write_top_genes(&top_genes, dir)?;
    }

    let display = display_matrix_default(&weightings)?;
    println!("{:?}", display);

    let elapsed = start_time.elapsed();
    println!("Total execution time: {:.4} seconds", elapsed.as_secs_f64());

    Ok(())
}
