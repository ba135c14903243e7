//! # Orchestration Core
//!
//! The batch pipeline: decision engine, concurrency-bounded executor,
//! automation-failure fallback, batch status aggregation and the
//! top-level orchestrator that wires them together.

pub mod aggregator;
pub mod decision_engine;
pub mod executor;
pub mod fallback;
pub mod orchestrator;
pub mod types;

pub use aggregator::BatchStatusAggregator;
pub use decision_engine::DecisionEngine;
pub use executor::TaskExecutor;
pub use fallback::FallbackHandler;
pub use orchestrator::WorkflowOrchestrator;
pub use types::{
    BatchResult, BatchStatus, DecisionCounts, ExecutionFailure, FallbackSummary, OverallStatus,
    PendingManualTask, RunOptions, StatusBreakdown, StreamSummary,
};
