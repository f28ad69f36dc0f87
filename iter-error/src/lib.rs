use thiserror::Error;

pub type Result<T> = std::result::Result<T, IteratorError>;

#[derive(Error, Debug)]
pub enum IteratorError {
    #[error("No more elements in iterator")]
    Exhausted,
    #[error("Stale or unknown iterator handle: {0:#x}")]
    StaleHandle(u64),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IteratorError {
    /// Whether this is the expected end-of-iteration signal
    /// rather than a misuse or a fault.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl From<std::num::TryFromIntError> for IteratorError {
    fn from(e: std::num::TryFromIntError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}
