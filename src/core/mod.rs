//! Core business logic abstractions

pub mod cache;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod fund;
pub mod log;
pub mod resolver;
pub mod returns;
pub mod series;

// Re-export main types for cleaner imports
pub use compare::{ChartOutcome, Comparison, ComparisonRequest, compare};
pub use dataset::{DataSource, Dataset, SharedDataset};
pub use returns::SimulationOutcome;
pub use series::DateRange;
