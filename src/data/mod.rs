//! Dataset handling: the tabular container, CSV ingestion, and splitting

pub mod csv;
pub mod dataset;
pub mod split;

pub use dataset::Dataset;
pub use split::StratifiedSplit;
