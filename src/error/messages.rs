//! User-facing text for classified errors.

use super::{ClassifiedError, ErrorKind, Strategy};

/// A friendly, strategy-aware message for an error.
pub fn user_message(error: &ClassifiedError) -> String {
    let base = kind_message(error.kind());
    match error.strategy() {
        Strategy::UserIntervention => format!("{base} Your input is needed to continue."),
        Strategy::Abort => format!("{base} The operation was stopped."),
        Strategy::GracefulDegradation => {
            format!("{base} Some results may be incomplete.")
        }
        Strategy::Retry | Strategy::Fallback => base.to_string(),
    }
}

/// Short description of what went wrong, keyed by kind.
pub fn kind_message(kind: ErrorKind) -> &'static str {
    use ErrorKind::*;
    match kind {
        Validation => "Some of the provided information is not valid.",
        ParameterValidation => "Some required parameters are missing or empty.",
        SchemaValidation => "The data does not match the expected format.",
        ApiKey => "The API key is missing or invalid.",
        Authentication => "Authentication failed.",
        Permission => "You do not have permission to perform this action.",
        Api => "The AI service returned an error.",
        Network => "A network problem prevented the request from completing.",
        Timeout => "The request took too long to complete.",
        RateLimit => "Too many requests were sent in a short time.",
        JsonParse => "The response could not be read.",
        ResponseParse => "The response was not in the expected shape.",
        ContextLength => "The conversation is too long to process in one request.",
        ToolNotFound => "The requested tool is not available.",
        ToolExecution => "A tool failed while running.",
        ToolTimeout => "A tool took too long to respond.",
        Planner => "The plan for this request could not be built.",
        Memory => "Conversation memory could not be accessed.",
        Transaction => "The change could not be recorded.",
        System => "An unexpected system error occurred.",
        Configuration => "The application is not configured correctly.",
        ResourceExhausted => "The system ran out of resources.",
        UserInput => "The request could not be understood.",
        UserCancelled => "The operation was cancelled.",
        AmbiguousRequest => "The request could mean more than one thing.",
    }
}

/// Canned suggestions shown when user intervention is required. Never empty.
pub fn suggestions(kind: ErrorKind) -> Vec<String> {
    use ErrorKind::*;
    let items: &[&str] = match kind {
        UserInput => &[
            "Rephrase the request in a single sentence",
            "Check for typos in names or values",
            "Provide an example of the expected result",
        ],
        AmbiguousRequest => &[
            "Say which of the possible meanings you intended",
            "Add more detail about the goal",
        ],
        Validation | SchemaValidation => &[
            "Review the highlighted values",
            "Check the expected format and try again",
        ],
        ParameterValidation => &[
            "Fill in the missing fields",
            "Make sure no required value is empty",
        ],
        ApiKey => &[
            "Set a valid API key in the configuration",
            "Check that the key has not expired or been revoked",
        ],
        Authentication => &["Sign in again", "Verify your credentials"],
        Permission => &[
            "Ask an administrator for access",
            "Try a different account",
        ],
        _ => &[
            "Try the request again",
            "Simplify the request",
            "Contact support if the problem persists",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;

    #[test]
    fn test_suggestions_never_empty() {
        for kind in ErrorKind::ALL {
            assert!(!suggestions(kind).is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_user_message_is_strategy_aware() {
        let user = ClassifiedError::of(ErrorKind::UserInput, "bad");
        assert!(user_message(&user).contains("input is needed"));

        let abort = ClassifiedError::new(ErrorKind::System, Severity::Critical, "oops");
        assert!(user_message(&abort).contains("stopped"));

        let fallback = ClassifiedError::new(ErrorKind::Memory, Severity::Low, "lost");
        assert_eq!(user_message(&fallback), "Conversation memory could not be accessed.");

        let degraded = ClassifiedError::new(ErrorKind::ContextLength, Severity::High, "big");
        assert!(user_message(&degraded).contains("incomplete"));
    }

    #[test]
    fn test_user_message_does_not_leak_raw_text() {
        let error = ClassifiedError::of(ErrorKind::Api, "HTTP 500 from upstream: secret-token");
        assert!(!user_message(&error).contains("secret-token"));
    }
}
