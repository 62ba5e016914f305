//! Faultline - error classification and recovery orchestration
//!
//! Turns raw operation failures into typed, severity-ranked errors and routes
//! each one to a bounded remediation behavior: retry with backoff, fallback,
//! graceful degradation, a request for user intervention, or abort.
//!
//! ```no_run
//! use faultline::config::RecoveryConfig;
//! use faultline::error::Fault;
//! use faultline::recovery::{OperationContext, RecoveryContext, RecoveryOrchestrator};
//! use faultline::safety::with_error_handling;
//!
//! # async fn run() {
//! let orchestrator = RecoveryOrchestrator::new(&RecoveryConfig::default());
//! let result = with_error_handling(
//!     &orchestrator,
//!     |ctx: OperationContext| async move {
//!         if ctx.attempt == 0 {
//!             Err(Fault::raw("Request timed out"))
//!         } else {
//!             Ok(serde_json::json!({ "answer": 42 }))
//!         }
//!     },
//!     RecoveryContext::new(),
//! )
//! .await;
//! assert!(result.success);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod recovery;
pub mod retry;
pub mod safety;
pub mod timeout;

pub use error::{ClassifiedError, ErrorKind, Fault, Severity, Strategy};
pub use recovery::{RecoveryContext, RecoveryOrchestrator, RecoveryResult};
