//! Operation contract and per-call recovery context.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Fault;

/// What an operation sees when it is (re)invoked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContext {
    /// 0 for the first call, incremented for every retry.
    pub attempt: u32,
    pub user_context: Map<String, Value>,
}

impl OperationContext {
    pub fn new(attempt: u32, user_context: Map<String, Value>) -> Self {
        Self {
            attempt,
            user_context,
        }
    }
}

/// An asynchronous operation that either produces a payload or raises a fault.
///
/// Implemented for async closures `Fn(OperationContext) -> impl Future`, so most
/// callers never implement it by hand.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn run(&self, context: OperationContext) -> Result<Value, Fault>;
}

#[async_trait]
impl<F, Fut> Operation for F
where
    F: Fn(OperationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, Fault>> + Send + 'static,
{
    async fn run(&self, context: OperationContext) -> Result<Value, Fault> {
        (self)(context).await
    }
}

/// Everything the orchestrator may use while handling one fault.
///
/// Scoped to a single top-level call: `handle_error` takes it by value and
/// drops it when the cycle ends.
#[derive(Clone, Default)]
pub struct RecoveryContext {
    /// Re-invoked by the RETRY strategy.
    pub operation: Option<Arc<dyn Operation>>,
    /// Invoked at most once by the FALLBACK strategy, never retried.
    pub fallback_operation: Option<Arc<dyn Operation>>,
    /// Retries already spent on this logical operation.
    pub attempt: u32,
    /// Progress to hand back when degrading.
    pub partial_result: Option<Value>,
    pub user_context: Option<Map<String, Value>>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation<O: Operation + 'static>(self, operation: O) -> Self {
        self.with_shared_operation(Arc::new(operation))
    }

    pub fn with_shared_operation(mut self, operation: Arc<dyn Operation>) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_fallback<O: Operation + 'static>(mut self, fallback: O) -> Self {
        self.fallback_operation = Some(Arc::new(fallback));
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn with_partial_result(mut self, partial: impl Into<Value>) -> Self {
        self.partial_result = Some(partial.into());
        self
    }

    pub fn with_user_context(mut self, user_context: Map<String, Value>) -> Self {
        self.user_context = Some(user_context);
        self
    }

    /// The context handed to an operation invoked at `attempt`.
    pub fn operation_context(&self, attempt: u32) -> OperationContext {
        OperationContext::new(attempt, self.user_context.clone().unwrap_or_default())
    }
}

impl fmt::Debug for RecoveryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryContext")
            .field("operation", &self.operation.is_some())
            .field("fallback_operation", &self.fallback_operation.is_some())
            .field("attempt", &self.attempt)
            .field("partial_result", &self.partial_result)
            .field("user_context", &self.user_context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_closure_is_an_operation() {
        let op = |ctx: OperationContext| async move {
            Ok::<_, Fault>(json!({ "attempt": ctx.attempt }))
        };
        let result = op.run(OperationContext::new(2, Map::new())).await;
        assert_eq!(result, Ok(json!({"attempt": 2})));
    }

    #[test]
    fn test_builder_and_operation_context() {
        let mut user = Map::new();
        user.insert("sessionId".into(), json!("abc"));

        let ctx = RecoveryContext::new()
            .with_attempt(1)
            .with_partial_result(json!(["step-1"]))
            .with_user_context(user);

        assert!(ctx.operation.is_none());
        assert_eq!(ctx.attempt, 1);

        let op_ctx = ctx.operation_context(2);
        assert_eq!(op_ctx.attempt, 2);
        assert_eq!(op_ctx.user_context.get("sessionId"), Some(&json!("abc")));
    }

    #[test]
    fn test_debug_hides_callables() {
        let ctx = RecoveryContext::new()
            .with_operation(|_: OperationContext| async { Ok::<_, Fault>(Value::Null) });
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("operation: true"));
        assert!(debug.contains("fallback_operation: false"));
    }
}
