//! Error taxonomy and classified error values.
//!
//! Every fault the recovery engine handles ends up as a [`ClassifiedError`]:
//! an immutable value carrying its kind, severity, recoverability and the
//! single remediation [`Strategy`] chosen for it. Recoverability and strategy
//! are computed once, at construction, from `(kind, severity)` via [`classify`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The group an [`ErrorKind`] belongs to. Each kind is in exactly one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or missing input data.
    Validation,
    /// Credentials and permissions.
    Authentication,
    /// Remote API and transport failures.
    NetworkApi,
    /// Failures while interpreting model or service output.
    Processing,
    /// Tool lookup and tool execution failures.
    ToolExecution,
    /// Failures inside a specific agent component.
    Component,
    /// Host, runtime and configuration failures.
    System,
    /// Conditions that need a decision from the user.
    UserInteraction,
}

/// Closed set of error kinds.
///
/// Serialized with the upper-snake tags (`TIMEOUT_ERROR`, `TOOL_NOT_FOUND`, ...)
/// so results exchanged with callers keep a stable vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    // Validation
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "PARAMETER_VALIDATION_ERROR")]
    ParameterValidation,
    #[serde(rename = "SCHEMA_VALIDATION_ERROR")]
    SchemaValidation,

    // Authentication
    #[serde(rename = "API_KEY_ERROR")]
    ApiKey,
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,

    // Network / API
    #[serde(rename = "API_ERROR")]
    Api,
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimit,

    // Processing
    #[serde(rename = "JSON_PARSE_ERROR")]
    JsonParse,
    #[serde(rename = "RESPONSE_PARSE_ERROR")]
    ResponseParse,
    #[serde(rename = "CONTEXT_LENGTH_ERROR")]
    ContextLength,

    // Tool execution
    #[serde(rename = "TOOL_NOT_FOUND")]
    ToolNotFound,
    #[serde(rename = "TOOL_EXECUTION_ERROR")]
    ToolExecution,
    #[serde(rename = "TOOL_TIMEOUT")]
    ToolTimeout,

    // Component specific
    #[serde(rename = "PLANNER_ERROR")]
    Planner,
    #[serde(rename = "MEMORY_ERROR")]
    Memory,
    #[serde(rename = "TRANSACTION_ERROR")]
    Transaction,

    // System
    #[serde(rename = "SYSTEM_ERROR")]
    System,
    #[serde(rename = "CONFIGURATION_ERROR")]
    Configuration,
    #[serde(rename = "RESOURCE_EXHAUSTED")]
    ResourceExhausted,

    // User interaction
    #[serde(rename = "USER_INPUT_ERROR")]
    UserInput,
    #[serde(rename = "USER_CANCELLED")]
    UserCancelled,
    #[serde(rename = "AMBIGUOUS_REQUEST")]
    AmbiguousRequest,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 25] = [
        ErrorKind::Validation,
        ErrorKind::ParameterValidation,
        ErrorKind::SchemaValidation,
        ErrorKind::ApiKey,
        ErrorKind::Authentication,
        ErrorKind::Permission,
        ErrorKind::Api,
        ErrorKind::Network,
        ErrorKind::Timeout,
        ErrorKind::RateLimit,
        ErrorKind::JsonParse,
        ErrorKind::ResponseParse,
        ErrorKind::ContextLength,
        ErrorKind::ToolNotFound,
        ErrorKind::ToolExecution,
        ErrorKind::ToolTimeout,
        ErrorKind::Planner,
        ErrorKind::Memory,
        ErrorKind::Transaction,
        ErrorKind::System,
        ErrorKind::Configuration,
        ErrorKind::ResourceExhausted,
        ErrorKind::UserInput,
        ErrorKind::UserCancelled,
        ErrorKind::AmbiguousRequest,
    ];

    /// Returns the category this kind belongs to.
    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            Validation | ParameterValidation | SchemaValidation => ErrorCategory::Validation,
            ApiKey | Authentication | Permission => ErrorCategory::Authentication,
            Api | Network | Timeout | RateLimit => ErrorCategory::NetworkApi,
            JsonParse | ResponseParse | ContextLength => ErrorCategory::Processing,
            ToolNotFound | ToolExecution | ToolTimeout => ErrorCategory::ToolExecution,
            Planner | Memory | Transaction => ErrorCategory::Component,
            System | Configuration | ResourceExhausted => ErrorCategory::System,
            UserInput | UserCancelled | AmbiguousRequest => ErrorCategory::UserInteraction,
        }
    }

    /// The wire tag, e.g. `"TIMEOUT_ERROR"`.
    pub fn as_str(self) -> &'static str {
        use ErrorKind::*;
        match self {
            Validation => "VALIDATION_ERROR",
            ParameterValidation => "PARAMETER_VALIDATION_ERROR",
            SchemaValidation => "SCHEMA_VALIDATION_ERROR",
            ApiKey => "API_KEY_ERROR",
            Authentication => "AUTHENTICATION_ERROR",
            Permission => "PERMISSION_ERROR",
            Api => "API_ERROR",
            Network => "NETWORK_ERROR",
            Timeout => "TIMEOUT_ERROR",
            RateLimit => "RATE_LIMIT_ERROR",
            JsonParse => "JSON_PARSE_ERROR",
            ResponseParse => "RESPONSE_PARSE_ERROR",
            ContextLength => "CONTEXT_LENGTH_ERROR",
            ToolNotFound => "TOOL_NOT_FOUND",
            ToolExecution => "TOOL_EXECUTION_ERROR",
            ToolTimeout => "TOOL_TIMEOUT",
            Planner => "PLANNER_ERROR",
            Memory => "MEMORY_ERROR",
            Transaction => "TRANSACTION_ERROR",
            System => "SYSTEM_ERROR",
            Configuration => "CONFIGURATION_ERROR",
            ResourceExhausted => "RESOURCE_EXHAUSTED",
            UserInput => "USER_INPUT_ERROR",
            UserCancelled => "USER_CANCELLED",
            AmbiguousRequest => "AMBIGUOUS_REQUEST",
        }
    }

    /// Parses a wire tag (case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
    }

    /// Severity assumed when a caller builds an error from the kind alone.
    pub fn default_severity(self) -> Severity {
        use ErrorKind::*;
        match self {
            UserCancelled | AmbiguousRequest => Severity::Low,
            Validation | ParameterValidation | SchemaValidation | UserInput => Severity::Medium,
            Api | Network | Timeout | RateLimit | JsonParse | ResponseParse => Severity::Medium,
            ToolNotFound | ToolExecution | ToolTimeout | Planner | Memory => Severity::Medium,
            ContextLength | Transaction | Permission | Authentication => Severity::High,
            ApiKey | Configuration | ResourceExhausted => Severity::High,
            System => Severity::Critical,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totally ordered severity: `Low < Medium < High < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parses `low`/`medium`/`high`/`critical` in any case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remediation behavior assigned to a classified error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Re-run the operation after an exponential backoff delay.
    Retry,
    /// Run the alternate operation once.
    Fallback,
    /// Return an explicitly degraded result, keeping any partial progress.
    GracefulDegradation,
    /// Stop automated processing and ask the user.
    UserIntervention,
    /// Stop without invoking anything further.
    Abort,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Retry => "RETRY",
            Strategy::Fallback => "FALLBACK",
            Strategy::GracefulDegradation => "GRACEFUL_DEGRADATION",
            Strategy::UserIntervention => "USER_INTERVENTION",
            Strategy::Abort => "ABORT",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const NON_RECOVERABLE_KINDS: &[ErrorKind] = &[
    ErrorKind::ApiKey,
    ErrorKind::Configuration,
    ErrorKind::System,
];

const RETRYABLE_KINDS: &[ErrorKind] = &[
    ErrorKind::Api,
    ErrorKind::Network,
    ErrorKind::Timeout,
    ErrorKind::RateLimit,
    ErrorKind::ToolTimeout,
    ErrorKind::JsonParse,
];

const FALLBACK_KINDS: &[ErrorKind] = &[
    ErrorKind::ToolNotFound,
    ErrorKind::ToolExecution,
    ErrorKind::ResponseParse,
    ErrorKind::Planner,
    ErrorKind::Memory,
];

const USER_INTERVENTION_KINDS: &[ErrorKind] = &[
    ErrorKind::UserInput,
    ErrorKind::AmbiguousRequest,
    ErrorKind::Validation,
    ErrorKind::ParameterValidation,
    ErrorKind::SchemaValidation,
    ErrorKind::ApiKey,
    ErrorKind::Authentication,
    ErrorKind::Permission,
];

/// Outcome of [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub recoverable: bool,
    pub strategy: Strategy,
}

/// Table-driven classification of a `(kind, severity)` pair.
///
/// Total and deterministic: kind tables are consulted before severity, so a
/// CRITICAL timeout is still retried (though it is not recoverable).
pub fn classify(kind: ErrorKind, severity: Severity) -> Classification {
    let recoverable = severity != Severity::Critical && !NON_RECOVERABLE_KINDS.contains(&kind);

    let strategy = if RETRYABLE_KINDS.contains(&kind) {
        Strategy::Retry
    } else if FALLBACK_KINDS.contains(&kind) {
        Strategy::Fallback
    } else if USER_INTERVENTION_KINDS.contains(&kind) {
        Strategy::UserIntervention
    } else if severity == Severity::Critical {
        Strategy::Abort
    } else {
        Strategy::GracefulDegradation
    };

    Classification {
        recoverable,
        strategy,
    }
}

/// An immutable, classified error.
///
/// There are no `&mut` accessors; the `with_*` helpers consume the value and
/// return a new one, so an error handed to the orchestrator cannot change
/// underneath it.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ClassifiedError {
    message: String,
    kind: ErrorKind,
    severity: Severity,
    metadata: HashMap<String, Value>,
    timestamp: DateTime<Utc>,
    recoverable: bool,
    strategy: Strategy,
}

impl ClassifiedError {
    /// Creates a classified error; recoverability and strategy are derived here.
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Self {
        Self::with_metadata_map(kind, severity, message, HashMap::new())
    }

    /// Creates a classified error using the kind's default severity.
    pub fn of(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, kind.default_severity(), message)
    }

    /// Creates a classified error with a metadata map.
    pub fn with_metadata_map(
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> Self {
        let Classification {
            recoverable,
            strategy,
        } = classify(kind, severity);
        Self {
            message: message.into(),
            kind,
            severity,
            metadata,
            timestamp: Utc::now(),
            recoverable,
            strategy,
        }
    }

    /// Returns a copy with one more metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns true if this error is handled by retrying.
    pub fn should_retry(&self) -> bool {
        self.strategy == Strategy::Retry
    }
}

/// A failure as raised by an operation, before or after classification.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Fault {
    /// Already classified at the point it was caught.
    #[error(transparent)]
    Classified(ClassifiedError),
    /// Anything else; only its message is available for classification.
    #[error("{message}")]
    Raw { message: String },
}

impl Fault {
    /// Creates an unclassified fault from any displayable value.
    pub fn raw(message: impl fmt::Display) -> Self {
        Fault::Raw {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Fault::Classified(error) => error.message(),
            Fault::Raw { message } => message,
        }
    }
}

impl From<ClassifiedError> for Fault {
    fn from(error: ClassifiedError) -> Self {
        Fault::Classified(error)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::Raw { message }
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Fault::raw(message)
    }
}

impl From<std::io::Error> for Fault {
    fn from(error: std::io::Error) -> Self {
        Fault::raw(error)
    }
}

impl From<serde_json::Error> for Fault {
    fn from(error: serde_json::Error) -> Self {
        Fault::raw(format!("JSON parse failure: {error}"))
    }
}

impl From<tokio::time::error::Elapsed> for Fault {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Fault::raw("operation timed out")
    }
}
