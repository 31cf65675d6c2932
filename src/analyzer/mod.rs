// Analyzer module: calculators, reconciliation and summary for the labor report.

pub mod timeseries;
pub mod county;
pub mod sectors;
pub mod national;
pub mod resilience;
pub mod granular;
pub mod comparison;
pub mod projection;
pub mod summary;

// Re-export the report assembly entry points for ease of use.
pub use summary::{SourceOutcomes, compose_report};
