use thiserror::Error;

/// Per-request failures. None of these are fatal to the process and none
/// roll back a classification that already succeeded.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Too few reported symptoms or an intensity outside the 0-10 scale.
    #[error("invalid symptom record: {0}")]
    Validation(String),

    /// Symptom name outside the fixed vocabulary.
    #[error("unknown symptom {0:?}")]
    UnknownSymptom(String),

    /// The prediction log could not be written or read.
    #[error("prediction log failure: {0}")]
    Persistence(#[from] std::io::Error),
}
