//! Error types for resolution, member invocation and mock synthesis

use thiserror::Error;

/// Errors raised while resolving a component graph
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unresolved dependency: {type_name} ({reason})")]
    UnresolvedDependency { type_name: String, reason: String },

    #[error("Ambiguous constructor for {type_name}: {candidates} candidates")]
    AmbiguousConstructor { type_name: String, candidates: usize },

    #[error("Configuration conflict for {type_name}: {reason}")]
    ConfigurationConflict { type_name: String, reason: String },

    #[error("Injection into {type_name}::{member} failed: {source}")]
    MemberInvocationFailure {
        type_name: String,
        member: String,
        #[source]
        source: InvocationError,
    },

    #[error("Unexpected interactions on {proxy} ({type_name}): {}", .interactions.join(", "))]
    VerificationFailure {
        type_name: String,
        proxy: String,
        interactions: Vec<String>,
    },

    #[error("Cached component is not a {type_name}")]
    TypeMismatch { type_name: String },

    #[error("Mock backend error: {0}")]
    Mock(#[from] MockError),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Failures inside constructor, setter and method closures
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("argument {index} is missing")]
    MissingArgument { index: usize },

    #[error("argument {index} is not a {expected}")]
    ArgumentType { index: usize, expected: &'static str },

    #[error("receiver is not a {expected}")]
    ReceiverType { expected: &'static str },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl InvocationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors reported by a mock-synthesis backend
#[derive(Debug, Error)]
pub enum MockError {
    #[error("cannot synthesize a proxy for {type_name}: no binding")]
    Unmockable { type_name: String },

    #[error("value is not a proxy created by this backend")]
    NotAProxy,

    #[error("{proxy} received unverified calls: {}", .calls.join(", "))]
    UnexpectedInteractions { proxy: String, calls: Vec<String> },
}

pub type MockResult<T> = Result<T, MockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failure_lists_calls() {
        let err = ResolveError::VerificationFailure {
            type_name: "Arc<dyn Store>".to_string(),
            proxy: "mock[Arc<dyn Store>]#0".to_string(),
            interactions: vec!["add(\"oops\")".to_string(), "len()".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unexpected interactions on mock[Arc<dyn Store>]#0 (Arc<dyn Store>): add(\"oops\"), len()"
        );
    }

    #[test]
    fn test_member_failure_keeps_source() {
        use std::error::Error;

        let err = ResolveError::MemberInvocationFailure {
            type_name: "Subject".to_string(),
            member: "set_store".to_string(),
            source: InvocationError::failed("boom"),
        };
        assert_eq!(err.to_string(), "Injection into Subject::set_store failed: boom");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
