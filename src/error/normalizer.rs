//! Fault normalizer
//!
//! Turns an arbitrary [`Fault`] into a [`ClassifiedError`]. Already-classified
//! faults pass through untouched; raw faults are classified by matching their
//! message against an ordered table of case-insensitive patterns.
//!
//! Text matching is fragile (it depends on message wording and locale). Whether
//! upstream layers should hand over pre-classified faults instead is still an
//! open product question, so the default table keeps the established heuristic.

use regex::Regex;

use super::{ClassifiedError, ErrorKind, Fault, Severity};

/// Metadata key holding the raw message of a normalized fault.
pub const ORIGINAL_MESSAGE_KEY: &str = "originalMessage";

/// A message pattern and the kind assigned when it matches.
#[derive(Debug, Clone)]
pub struct FaultPattern {
    regex: Regex,
    kind: ErrorKind,
    description: String,
}

impl FaultPattern {
    /// Creates a pattern from a regex string.
    ///
    /// # Errors
    /// Returns the regex compile error if `pattern` is invalid.
    pub fn new(
        pattern: &str,
        kind: ErrorKind,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::with_regex(Regex::new(pattern)?, kind, description))
    }

    /// Creates a pattern from a pre-compiled regex.
    pub fn with_regex(regex: Regex, kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            regex,
            kind,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Classifies raw faults by message, first matching pattern wins.
#[derive(Debug, Clone)]
pub struct FaultNormalizer {
    patterns: Vec<FaultPattern>,
    fallback_kind: ErrorKind,
    severity: Severity,
}

impl Default for FaultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultNormalizer {
    /// Creates a normalizer with the default pattern table.
    pub fn new() -> Self {
        Self::with_patterns(Self::default_patterns())
    }

    /// Creates a normalizer with a custom, ordered pattern table.
    pub fn with_patterns(patterns: Vec<FaultPattern>) -> Self {
        Self {
            patterns,
            fallback_kind: ErrorKind::System,
            severity: Severity::Medium,
        }
    }

    /// The default table, in precedence order:
    /// api, timeout, network/DNS, json/parse, validation.
    pub fn default_patterns() -> Vec<FaultPattern> {
        // Literal alternations only; none of these can fail to compile.
        [
            (r"(?i)api", ErrorKind::Api, "API failure"),
            (r"(?i)time(out|d out)", ErrorKind::Timeout, "Timeout"),
            (
                r"(?i)network|enotfound|eai_again|getaddrinfo|dns",
                ErrorKind::Network,
                "Network or DNS failure",
            ),
            (r"(?i)json|parse", ErrorKind::JsonParse, "Malformed JSON"),
            (r"(?i)validation", ErrorKind::Validation, "Validation failure"),
        ]
        .into_iter()
        .filter_map(|(pattern, kind, description)| {
            FaultPattern::new(pattern, kind, description).ok()
        })
        .collect()
    }

    pub fn patterns(&self) -> &[FaultPattern] {
        &self.patterns
    }

    /// Infers the kind for a raw message.
    pub fn infer_kind(&self, message: &str) -> ErrorKind {
        self.patterns
            .iter()
            .find(|pattern| pattern.matches(message))
            .map(FaultPattern::kind)
            .unwrap_or(self.fallback_kind)
    }

    /// Returns the fault as a classified error. Never fails.
    pub fn normalize(&self, fault: Fault) -> ClassifiedError {
        match fault {
            Fault::Classified(error) => error,
            Fault::Raw { message } => {
                let kind = self.infer_kind(&message);
                ClassifiedError::new(kind, self.severity, message.clone())
                    .with_metadata(ORIGINAL_MESSAGE_KEY, message)
            }
        }
    }
}
