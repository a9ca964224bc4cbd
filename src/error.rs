use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AhtableError {
    #[error("key of `{0}` bytes exceeds the encodable maximum")]
    OversizeKey(usize),
    #[error("zero-length keys cannot be stored")]
    EmptyKey,
}

pub type Result<T> = std::result::Result<T, AhtableError>;
