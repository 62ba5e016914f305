//! Error taxonomy, classification and normalization
//!
//! This module turns raw operation failures into typed, severity-ranked
//! [`ClassifiedError`] values, each carrying exactly one remediation strategy.

pub mod classification;
pub mod messages;
pub mod normalizer;

pub use classification::{
    classify, Classification, ClassifiedError, ErrorCategory, ErrorKind, Fault, Severity, Strategy,
};
pub use messages::{kind_message, suggestions, user_message};
pub use normalizer::{FaultNormalizer, FaultPattern, ORIGINAL_MESSAGE_KEY};
