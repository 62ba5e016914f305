//! Recovery orchestration
//!
//! Given a fault and a [`RecoveryContext`], the [`RecoveryOrchestrator`]
//! dispatches to the strategy-specific handler and produces a
//! [`RecoveryResult`]:
//!
//! ```text
//! raw fault ──▶ FaultNormalizer ──▶ ClassifiedError ──▶ strategy dispatch ──▶ RecoveryResult
//! ```

pub mod context;
pub mod orchestrator;
pub mod result;

pub use context::{Operation, OperationContext, RecoveryContext};
pub use orchestrator::RecoveryOrchestrator;
pub use result::{ErrorSummary, RecoveryMetadata, RecoveryOutcome, RecoveryResult};
