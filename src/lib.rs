//! Farm economics dashboard core.
//!
//! - [`loader`] turns crop budget exports into a [`types::CropDataset`],
//!   falling back to built-in sample data when a file cannot be used.
//! - [`model`] and [`advisor`] compute per-acre and total results, category
//!   rollups, cost-reduction sensitivity, scenario comparisons and advisory
//!   text.
//! - [`reports`] and [`output`] shape those results into CSV, JSON, workbook
//!   and rendered-report exports.
pub mod advisor;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod loader;
pub mod model;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
