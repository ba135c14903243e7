//! # Completeness & Reliability Scorers
//!
//! Pure functions over a work record and historical aggregates. These are
//! the leaf inputs to the decision engine and never touch the store.

use crate::models::WorkRecord;

/// Weight table over the expected record fields. Weights sum to 1.0, so
/// the sum of present-field weights is already a normalized score.
pub const COMPLETENESS_WEIGHTS: [(&str, f64); 7] = [
    ("part_number", 0.30),
    ("manufacturer", 0.20),
    ("category", 0.10),
    ("description", 0.10),
    ("specs", 0.15),
    ("documents", 0.10),
    ("images", 0.05),
];

/// Historical automation outcome counts for one manufacturer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManufacturerStats {
    pub successes: u64,
    pub failures: u64,
}

impl ManufacturerStats {
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Weighted fraction of expected fields present on a record, in [0, 1].
///
/// A field counts as present when it is a non-empty string or a non-empty
/// collection.
pub fn data_completeness(record: &WorkRecord) -> f64 {
    COMPLETENESS_WEIGHTS
        .iter()
        .filter(|(field, _)| field_present(record, field))
        .map(|(_, weight)| weight)
        .sum()
}

fn field_present(record: &WorkRecord, field: &str) -> bool {
    match field {
        "part_number" => !record.part_number.trim().is_empty(),
        "manufacturer" => !record.manufacturer.trim().is_empty(),
        "category" => !record.categories.is_empty(),
        "description" => !record.description.trim().is_empty(),
        "specs" => !record.specs.is_empty(),
        "documents" => !record.documents.is_empty(),
        "images" => !record.images.is_empty(),
        _ => false,
    }
}

/// Smoothed historical automation success rate for a manufacturer.
///
/// `None` means the manufacturer has never been seen (0.5). A known
/// manufacturer with no automation history scores 0.6. Otherwise the
/// Laplace-smoothed success rate `(s + 1) / (s + f + 2)`, clamped to
/// [0, 1].
pub fn manufacturer_reliability(stats: Option<ManufacturerStats>) -> f64 {
    match stats {
        None => 0.5,
        Some(stats) if stats.total() == 0 => 0.6,
        Some(stats) => {
            let rate = (stats.successes as f64 + 1.0) / (stats.total() as f64 + 2.0);
            rate.clamp(0.0, 1.0)
        }
    }
}
