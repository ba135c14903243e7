//! # External Collaborator Services
//!
//! Traits for the collaborators the orchestration core consumes: the
//! record source feeding candidate work records, and the automation
//! backend performing extraction. Concrete implementations (query
//! construction, scraping) live outside this crate.

pub mod automation_backend;
pub mod record_source;

pub use automation_backend::{AutomationBackend, ExtractionResult};
pub use record_source::RecordSource;
