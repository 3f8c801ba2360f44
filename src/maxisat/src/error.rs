use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Misuse of the solver or of a MaxSAT configuration.
///
/// Unsatisfiability and cancellation are results, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("solver state {0} is not valid anymore")]
    InvalidState(u32),
    #[error("a solve call is already running on this solver")]
    SolveInProgress,
    #[error("unsupported configuration: {0}")]
    UnsupportedConfig(String),
    #[error("invalid soft clause weight {0}, weights must be positive")]
    InvalidWeight(i64),
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
    #[error("0 is not a literal")]
    InvalidLiteral,
    #[error("a literal occurs twice in a cardinality constraint")]
    DuplicateLiteral,
    #[error("cardinality constraints cannot be added while a proof is recorded")]
    ProofUnsupported,
    #[error("encoding failed: {0}")]
    Encoding(#[from] crate::encodings::EncodingError),
}
