//! Marker-gene based cell type annotation scoring for spreadsheet-derived gene panels

pub mod annotate;
pub mod display;
pub mod error;
pub mod sheet;
pub mod types;
