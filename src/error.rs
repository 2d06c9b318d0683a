//! Error types for sampler operations

/// Errors raised by the sampler core
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Sample '{0}' is not loaded")]
    SampleNotFound(String),

    #[error("Sample '{0}' is already loaded")]
    SampleAlreadyLoaded(String),

    #[error("No free sample slots (capacity {0})")]
    SampleCapacity(usize),

    #[error("No idle voices in the pool (capacity {0})")]
    PoolExhausted(usize),

    #[error("Note {0} is already playing")]
    NoteActive(String),

    #[error("Invalid note name '{0}'")]
    InvalidNote(String),

    #[error("Unknown scale '{0}'")]
    UnknownScale(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for sampler operations
pub type Result<T> = std::result::Result<T, SamplerError>;
