pub mod application;
pub mod audit_log;
pub mod evaluation;
pub mod event;
pub mod hospital;
pub mod principal;
pub mod resume;
pub mod vacancy;

/// Raised when a stored or submitted string does not belong to a closed value set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl From<UnknownVariant> for crate::error::Error {
    fn from(err: UnknownVariant) -> Self {
        crate::error::Error::Validation(err.to_string())
    }
}
