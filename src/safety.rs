//! Small safety combinators built on the orchestrator.

use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{ClassifiedError, ErrorKind, Severity};
use crate::recovery::{Operation, RecoveryContext, RecoveryOrchestrator, RecoveryResult};

/// Metadata key listing the fields [`validate_required`] found missing.
pub const MISSING_FIELDS_KEY: &str = "missingFields";

/// Runs `operation` once and routes any fault through `orchestrator`, with the
/// same operation registered as the one to retry.
pub async fn with_error_handling<O>(
    orchestrator: &RecoveryOrchestrator,
    operation: O,
    context: RecoveryContext,
) -> RecoveryResult
where
    O: Operation + 'static,
{
    let operation: Arc<dyn Operation> = Arc::new(operation);
    match orchestrator
        .invoke(operation.as_ref(), &context, context.attempt)
        .await
    {
        Ok(data) => RecoveryResult::success(data, context.attempt),
        Err(fault) => {
            orchestrator
                .handle_error(fault, context.with_shared_operation(operation))
                .await
        }
    }
}

/// Calls `f`, returning `fallback` if it fails or panics.
pub fn make_safe<T, E, F>(f: F, fallback: T) -> T
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "operation failed, using fallback value");
            fallback
        }
        Err(_) => {
            tracing::warn!("operation panicked, using fallback value");
            fallback
        }
    }
}

/// Checks that each named field is present, non-null and not an empty string.
///
/// Returns a PARAMETER_VALIDATION_ERROR whose `metadata.missingFields` lists
/// the missing names in the order given. A non-object `input` is missing
/// every field.
pub fn validate_required(input: &Value, required: &[&str]) -> Result<(), ClassifiedError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| is_missing(input.get(field)))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(ClassifiedError::new(
        ErrorKind::ParameterValidation,
        Severity::Medium,
        format!("Missing required fields: {}", missing.join(", ")),
    )
    .with_metadata(MISSING_FIELDS_KEY, json!(missing)))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Fault, Strategy};
    use crate::recovery::OperationContext;

    #[test]
    fn test_validate_required_lists_missing_in_order() {
        let input = json!({"a": 1, "b": null, "c": ""});
        let error = validate_required(&input, &["a", "b", "c", "d"]).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ParameterValidation);
        assert_eq!(error.strategy(), Strategy::UserIntervention);
        assert_eq!(
            error.metadata().get(MISSING_FIELDS_KEY),
            Some(&json!(["b", "c", "d"]))
        );
    }

    #[test]
    fn test_validate_required_accepts_falsy_values() {
        let input = json!({"zero": 0, "no": false, "empty_list": [], "blank": " "});
        assert!(validate_required(&input, &["zero", "no", "empty_list", "blank"]).is_ok());
    }

    #[test]
    fn test_validate_required_non_object() {
        let error = validate_required(&json!("text"), &["x", "y"]).unwrap_err();
        assert_eq!(error.metadata().get(MISSING_FIELDS_KEY), Some(&json!(["x", "y"])));
    }

    #[test]
    fn test_make_safe() {
        assert_eq!(make_safe(|| Ok::<_, String>(5), 0), 5);
        assert_eq!(make_safe(|| Err::<i32, _>("bad"), 7), 7);
        assert_eq!(
            make_safe(
                || -> Result<i32, String> {
                    if true {
                        panic!("boom");
                    }
                    Ok(1)
                },
                9
            ),
            9
        );
    }

    #[tokio::test]
    async fn test_with_error_handling_success_first_try() {
        let orchestrator = RecoveryOrchestrator::default();
        let result = with_error_handling(
            &orchestrator,
            |_: OperationContext| async { Ok::<_, Fault>(json!("done")) },
            RecoveryContext::new(),
        )
        .await;

        assert!(result.success);
        assert_eq!(result.data, Some(json!("done")));
        assert_eq!(result.message, "Operation succeeded");
    }

    #[tokio::test]
    async fn test_with_error_handling_routes_faults() {
        let orchestrator = RecoveryOrchestrator::default();
        let result = with_error_handling(
            &orchestrator,
            |_: OperationContext| async {
                Err::<Value, _>(Fault::from(ClassifiedError::of(ErrorKind::UserInput, "huh")))
            },
            RecoveryContext::new(),
        )
        .await;

        assert!(!result.success);
        assert!(result.requires_user_response());
    }
}
