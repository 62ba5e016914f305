//! Recovery results returned to callers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{suggestions, user_message, ClassifiedError, ErrorKind, Severity, Strategy};

/// The classified error as reported inside a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub recoverable: bool,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
}

impl From<&ClassifiedError> for ErrorSummary {
    fn from(error: &ClassifiedError) -> Self {
        Self {
            kind: error.kind(),
            severity: error.severity(),
            recoverable: error.is_recoverable(),
            strategy: error.strategy(),
            timestamp: error.timestamp(),
            metadata: error.metadata().clone(),
        }
    }
}

/// Flags describing how a result was reached. Unset fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_error: Option<ErrorKind>,
    /// `Some(Value::Null)` when degrading without partial progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries_exhausted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

/// Terminal state of a handling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Success,
    FallbackSuccess,
    Degraded,
    Aborted,
    UserIntervention,
    /// The classified error is returned as-is (retry unavailable or exhausted).
    Failed,
}

/// What `handle_error` hands back. Never an exception; always one of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_user_response: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecoveryMetadata>,
}

impl RecoveryResult {
    /// The operation produced `data` after `attempts` retries.
    pub fn success(data: Value, attempts: u32) -> Self {
        let message = match attempts {
            0 => "Operation succeeded".to_string(),
            1 => "Operation succeeded after 1 retry".to_string(),
            n => format!("Operation succeeded after {n} retries"),
        };
        Self {
            success: true,
            message,
            data: Some(data),
            error: None,
            requires_user_response: None,
            metadata: Some(RecoveryMetadata {
                attempts: Some(attempts),
                ..RecoveryMetadata::default()
            }),
        }
    }

    /// The fallback operation produced `data`; its shape is whatever it returned.
    pub fn fallback_success(data: Value) -> Self {
        Self {
            success: true,
            message: "Recovered using fallback".to_string(),
            data: Some(data),
            error: None,
            requires_user_response: None,
            metadata: Some(RecoveryMetadata {
                fallback_used: Some(true),
                ..RecoveryMetadata::default()
            }),
        }
    }

    /// The classified error itself, with no remediation applied.
    pub fn failure(error: &ClassifiedError) -> Self {
        Self {
            success: false,
            message: user_message(error),
            data: None,
            error: Some(ErrorSummary::from(error)),
            requires_user_response: None,
            metadata: None,
        }
    }

    /// Every allowed retry was spent.
    pub fn retries_exhausted(error: &ClassifiedError, attempts: u32) -> Self {
        Self {
            metadata: Some(RecoveryMetadata {
                retries_exhausted: Some(true),
                attempts: Some(attempts),
                error_type: Some(error.kind()),
                ..RecoveryMetadata::default()
            }),
            ..Self::failure(error)
        }
    }

    /// An explicitly degraded result, preserving any partial progress.
    pub fn degraded(error: &ClassifiedError, partial_result: Option<Value>) -> Self {
        Self {
            metadata: Some(RecoveryMetadata {
                degraded: Some(true),
                original_error: Some(error.kind()),
                partial_result: Some(partial_result.unwrap_or(Value::Null)),
                ..RecoveryMetadata::default()
            }),
            ..Self::failure(error)
        }
    }

    /// Automated processing must stop until the user responds.
    pub fn user_intervention(
        error: &ClassifiedError,
        user_context: Option<Map<String, Value>>,
    ) -> Self {
        let data = json!({
            "type": "user_intervention_required",
            "errorType": error.kind(),
            "suggestions": suggestions(error.kind()),
            "context": Value::Object(user_context.unwrap_or_default()),
        });
        Self {
            data: Some(data),
            requires_user_response: Some(true),
            ..Self::failure(error)
        }
    }

    /// Stopped without invoking anything further.
    pub fn aborted(error: &ClassifiedError) -> Self {
        Self {
            metadata: Some(RecoveryMetadata {
                aborted: Some(true),
                critical_error: Some(true),
                error_type: Some(error.kind()),
                ..RecoveryMetadata::default()
            }),
            ..Self::failure(error)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.flag(|m| m.degraded)
    }

    pub fn is_aborted(&self) -> bool {
        self.flag(|m| m.aborted)
    }

    pub fn requires_user_response(&self) -> bool {
        self.requires_user_response.unwrap_or(false)
    }

    /// Classifies this result into its terminal outcome.
    pub fn outcome(&self) -> RecoveryOutcome {
        if self.success {
            if self.flag(|m| m.fallback_used) {
                RecoveryOutcome::FallbackSuccess
            } else {
                RecoveryOutcome::Success
            }
        } else if self.requires_user_response() {
            RecoveryOutcome::UserIntervention
        } else if self.is_aborted() {
            RecoveryOutcome::Aborted
        } else if self.is_degraded() {
            RecoveryOutcome::Degraded
        } else {
            RecoveryOutcome::Failed
        }
    }

    fn flag(&self, get: impl Fn(&RecoveryMetadata) -> Option<bool>) -> bool {
        self.metadata.as_ref().and_then(get).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_serializes_null_partial_result() {
        let error = ClassifiedError::of(ErrorKind::ToolNotFound, "no tool");
        let result = RecoveryResult::degraded(&error, None);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], json!(false));
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["metadata"]["degraded"], json!(true));
        assert_eq!(json["metadata"]["originalError"], json!("TOOL_NOT_FOUND"));
        assert!(json["metadata"].as_object().unwrap().contains_key("partialResult"));
        assert_eq!(json["metadata"]["partialResult"], Value::Null);
        assert!(json["metadata"].get("aborted").is_none());
        assert_eq!(result.outcome(), RecoveryOutcome::Degraded);
    }

    #[test]
    fn test_user_intervention_shape() {
        let error = ClassifiedError::of(ErrorKind::UserInput, "what?");
        let result = RecoveryResult::user_intervention(&error, None);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["requiresUserResponse"], json!(true));
        assert_eq!(json["data"]["type"], json!("user_intervention_required"));
        assert_eq!(json["data"]["errorType"], json!("USER_INPUT_ERROR"));
        assert!(!json["data"]["suggestions"].as_array().unwrap().is_empty());
        assert_eq!(json["data"]["context"], json!({}));
        assert_eq!(result.outcome(), RecoveryOutcome::UserIntervention);
    }

    #[test]
    fn test_aborted_flags() {
        let error = ClassifiedError::new(ErrorKind::System, Severity::Critical, "down");
        let result = RecoveryResult::aborted(&error);
        let metadata = result.metadata.clone().unwrap();
        assert_eq!(metadata.aborted, Some(true));
        assert_eq!(metadata.critical_error, Some(true));
        assert_eq!(metadata.error_type, Some(ErrorKind::System));
        assert_eq!(result.outcome(), RecoveryOutcome::Aborted);
    }

    #[test]
    fn test_success_messages_and_outcomes() {
        assert_eq!(RecoveryResult::success(json!(1), 0).message, "Operation succeeded");
        assert_eq!(
            RecoveryResult::success(json!(1), 2).message,
            "Operation succeeded after 2 retries"
        );
        assert_eq!(
            RecoveryResult::success(json!(1), 1).outcome(),
            RecoveryOutcome::Success
        );
        assert_eq!(
            RecoveryResult::fallback_success(json!("cached")).outcome(),
            RecoveryOutcome::FallbackSuccess
        );
    }

    #[test]
    fn test_failure_carries_error_summary() {
        let error = ClassifiedError::of(ErrorKind::Timeout, "slow");
        let result = RecoveryResult::retries_exhausted(&error, 3);
        let summary = result.error.clone().unwrap();
        assert_eq!(summary.kind, ErrorKind::Timeout);
        assert_eq!(summary.strategy, Strategy::Retry);
        assert!(summary.recoverable);
        assert_eq!(result.outcome(), RecoveryOutcome::Failed);
        assert_eq!(result.metadata.unwrap().attempts, Some(3));
    }
}
