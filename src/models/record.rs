//! # Work Record Model
//!
//! External candidate records as delivered by the record source. Loosely
//! structured input is resolved into explicit-optional structs once at the
//! boundary; downstream code never probes for field presence ad hoc.

use serde::{Deserialize, Serialize};

/// A candidate record to classify, read-only input to the decision engine.
///
/// Completeness is derived by the scorers and never stored on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkRecord {
    /// Part number identifying the subject this record describes
    pub part_number: String,
    pub manufacturer: String,
    /// Ordered category hints, most specific last
    pub categories: Vec<String>,
    pub description: String,
    pub specs: Vec<SpecEntry>,
    pub documents: Vec<DocumentRef>,
    pub images: Vec<ImageRef>,
    /// Externally assigned priority in [0, 1]
    pub priority_score: f64,
}

/// A structured specification entry (attribute name/value pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub name: String,
    pub value: String,
    pub note: Option<String>,
    pub source: Option<String>,
}

/// Document classification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Datasheet,
    Manual,
    Certificate,
    Other,
}

/// Reference to an external document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub url: String,
    pub kind: DocumentKind,
    pub note: Option<String>,
    pub source: Option<String>,
}

/// Reference to an external image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub note: Option<String>,
    pub source: Option<String>,
}

impl WorkRecord {
    pub fn new(part_number: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            manufacturer: manufacturer.into(),
            ..Self::default()
        }
    }
}
