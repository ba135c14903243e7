// State machine module for the task lifecycle
//
// Status definitions, lifecycle events and the shared transition logic
// used by both task variants. The state machine owns status transitions
// and the timestamped step metadata recorded alongside them.

pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::TaskEvent;
pub use lifecycle::{target_state, ProcessingInfo, TaskLifecycle};
pub use states::TaskStatus;
