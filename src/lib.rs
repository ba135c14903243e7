#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Imputer Core Rust
//!
//! Workflow orchestration core for the product-data imputation pipeline.
//!
//! ## Overview
//!
//! The core decides, per candidate work record, whether an automated
//! extraction backend or a human editor should fill in the missing product
//! data, then executes both streams and tracks every task through a shared
//! persisted lifecycle.
//!
//! ## Architecture
//!
//! A batch run flows through four components, all behind the
//! [`orchestration::WorkflowOrchestrator`]:
//!
//! - **Decision engine**: classifies each record onto the automation or
//!   manual path from data completeness, manufacturer reliability,
//!   priority and recent failure history
//! - **Executor**: runs automation under a configurable concurrency bound
//!   with a per-task timeout; creates manual tasks for human review
//! - **Fallback handler**: reroutes automation failures into manual tasks
//!   in a dedicated fallback batch
//! - **Status aggregator**: computes batch rollup status on demand from
//!   the persisted tasks
//!
//! ## Module Organization
//!
//! - [`models`] - Work records, decisions and the two task variants
//! - [`state_machine`] - The shared task lifecycle state machine
//! - [`orchestration`] - Decision engine, executor, fallback, aggregator
//! - [`repository`] - Persistence seam with in-memory and PostgreSQL stores
//! - [`scoring`] - Completeness and manufacturer reliability scoring
//! - [`services`] - Record source and automation backend seams
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imputer_core::config::WorkflowConfig;
//! use imputer_core::orchestration::{RunOptions, WorkflowOrchestrator};
//! use imputer_core::repository::InMemoryTaskRepository;
//! use imputer_core::services::{AutomationBackend, RecordSource};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     source: Arc<dyn RecordSource>,
//! #     backend: Arc<dyn AutomationBackend>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkflowConfig::load()?;
//! let repository = Arc::new(InMemoryTaskRepository::new());
//! let orchestrator = WorkflowOrchestrator::new(config, repository, source, backend);
//!
//! let result = orchestrator.run(RunOptions::with_limit(50)).await?;
//! println!("batch {} processed {} records", result.batch_id, result.total_records);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod repository;
pub mod scoring;
pub mod services;
pub mod state_machine;

pub use config::WorkflowConfig;
pub use error::{Result, WorkflowError};
pub use models::{TaskDecision, TaskPriority, TaskType, WorkRecord};
pub use orchestration::{BatchResult, RunOptions, WorkflowOrchestrator};
pub use state_machine::{TaskLifecycle, TaskStatus};
