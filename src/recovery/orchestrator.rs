//! Recovery orchestrator
//!
//! `handle_error` normalizes a fault, reports it to the log sink, and dispatches
//! on the error's strategy until a terminal [`RecoveryResult`] is reached.
//! RETRY runs as a bounded loop with a local attempt counter; a retried
//! operation that fails with a different kind of error is handed to that
//! error's own strategy.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};

use super::{Operation, RecoveryContext, RecoveryResult};
use crate::config::RecoveryConfig;
use crate::error::{ClassifiedError, ErrorKind, Fault, FaultNormalizer, Severity, Strategy};
use crate::logging::{BufferedSink, LogSink, TracingSink};
use crate::retry::{saturating_millis, RetryPolicy};

/// Routes classified errors to their remediation behavior.
///
/// Construct one explicitly and share it (by reference or `Arc`) with the call
/// sites that need it; there is no process-wide instance.
pub struct RecoveryOrchestrator {
    policy: RetryPolicy,
    normalizer: FaultNormalizer,
    sink: Arc<dyn LogSink>,
    log_buffer: Arc<BufferedSink>,
    log_errors: bool,
}

impl Default for RecoveryOrchestrator {
    fn default() -> Self {
        Self::new(&RecoveryConfig::default())
    }
}

impl RecoveryOrchestrator {
    /// Creates an orchestrator reporting to [`TracingSink`] and to an in-memory
    /// buffer of `config.log_buffer_capacity` entries.
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            policy: RetryPolicy::from(config),
            normalizer: FaultNormalizer::new(),
            sink: Arc::new(TracingSink),
            log_buffer: Arc::new(BufferedSink::new(config.log_buffer_capacity)),
            log_errors: config.log_errors,
        }
    }

    /// Replaces the primary sink. The in-memory buffer keeps receiving entries.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_normalizer(mut self, normalizer: FaultNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn normalizer(&self) -> &FaultNormalizer {
        &self.normalizer
    }

    /// The most recent handled errors, oldest first.
    pub fn log_buffer(&self) -> &BufferedSink {
        &self.log_buffer
    }

    /// Classifies a fault without handling it.
    pub fn normalize(&self, fault: impl Into<Fault>) -> ClassifiedError {
        self.normalizer.normalize(fault.into())
    }

    /// Handles one fault to completion. Never panics and never returns an error:
    /// every path ends in a [`RecoveryResult`].
    pub async fn handle_error(
        &self,
        fault: impl Into<Fault>,
        context: RecoveryContext,
    ) -> RecoveryResult {
        let mut error = self.normalizer.normalize(fault.into());
        let mut attempt = context.attempt;

        loop {
            self.report(&error, attempt);

            if error.strategy() != Strategy::Retry {
                return self.resolve(error, context).await;
            }

            let Some(operation) = context.operation.clone() else {
                tracing::debug!(kind = %error.kind(), "no operation to retry");
                return RecoveryResult::failure(&error);
            };

            if !self.policy.should_retry(attempt) {
                tracing::warn!(
                    kind = %error.kind(),
                    attempts = attempt,
                    max_retries = self.policy.max_retries,
                    "retries exhausted"
                );
                return RecoveryResult::retries_exhausted(&error, attempt);
            }

            let delay = self.policy.delay_for(attempt);
            tracing::debug!(
                kind = %error.kind(),
                attempt = attempt + 1,
                delay_ms = saturating_millis(delay),
                "retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;

            match self
                .invoke(operation.as_ref(), &context, attempt)
                .await
            {
                Ok(data) => {
                    tracing::info!(attempts = attempt, "operation recovered by retry");
                    return RecoveryResult::success(data, attempt);
                }
                Err(fault) => error = self.normalizer.normalize(fault),
            }
        }
    }

    /// Runs an operation, turning a panic into a critical system error.
    pub(crate) async fn invoke(
        &self,
        operation: &dyn Operation,
        context: &RecoveryContext,
        attempt: u32,
    ) -> Result<Value, Fault> {
        let run = operation.run(context.operation_context(attempt));
        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(panic_fault(panic.as_ref())),
        }
    }

    /// Dispatches every strategy other than a retry that can still proceed.
    async fn resolve(&self, error: ClassifiedError, context: RecoveryContext) -> RecoveryResult {
        match error.strategy() {
            Strategy::Fallback => self.fallback(error, context).await,
            Strategy::GracefulDegradation => {
                RecoveryResult::degraded(&error, context.partial_result)
            }
            Strategy::UserIntervention => {
                RecoveryResult::user_intervention(&error, context.user_context)
            }
            Strategy::Abort => {
                tracing::error!(kind = %error.kind(), "aborting after critical error");
                RecoveryResult::aborted(&error)
            }
            Strategy::Retry => RecoveryResult::failure(&error),
        }
    }

    async fn fallback(&self, error: ClassifiedError, context: RecoveryContext) -> RecoveryResult {
        let Some(fallback) = context.fallback_operation.clone() else {
            return RecoveryResult::degraded(&error, context.partial_result);
        };

        match self
            .invoke(fallback.as_ref(), &context, context.attempt)
            .await
        {
            Ok(data) => {
                tracing::info!(kind = %error.kind(), "recovered using fallback");
                RecoveryResult::fallback_success(data)
            }
            Err(fault) => {
                // Degrade on the original error so the user sees the root cause.
                let fallback_error = self.normalizer.normalize(fault);
                tracing::warn!(
                    kind = %error.kind(),
                    fallback_kind = %fallback_error.kind(),
                    "fallback failed, degrading"
                );
                RecoveryResult::degraded(&error, context.partial_result)
            }
        }
    }

    /// Fire-and-forget report to the sink; sink failures and panics are dropped.
    fn report(&self, error: &ClassifiedError, attempt: u32) {
        if !self.log_errors {
            return;
        }
        let payload = log_payload(error, attempt);
        deliver(self.sink.as_ref(), error.severity(), &payload);
        deliver(self.log_buffer.as_ref(), error.severity(), &payload);
    }
}

fn deliver(sink: &dyn LogSink, severity: Severity, payload: &Value) {
    match std::panic::catch_unwind(AssertUnwindSafe(|| sink.record(severity, payload))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "log sink failed, entry dropped"),
        Err(_) => tracing::debug!("log sink panicked, entry dropped"),
    }
}

fn log_payload(error: &ClassifiedError, attempt: u32) -> Value {
    json!({
        "kind": error.kind(),
        "category": error.category(),
        "severity": error.severity(),
        "strategy": error.strategy(),
        "recoverable": error.is_recoverable(),
        "message": error.message(),
        "attempt": attempt,
        "metadata": error.metadata(),
        "timestamp": error.timestamp().to_rfc3339(),
    })
}

fn panic_fault(panic: &(dyn Any + Send)) -> Fault {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ClassifiedError::new(
        ErrorKind::System,
        Severity::Critical,
        format!("operation panicked: {detail}"),
    )
    .with_metadata("panicked", true)
    .into()
}
