/// Convenience result type used across nsf2wav.
pub type Nsf2WavResult<T> = Result<T, Nsf2WavError>;

/// Exit status for malformed invocations (`EX_USAGE` from `sysexits.h`).
pub const EXIT_USAGE: u8 = 64;
/// Exit status for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Top-level error taxonomy used by the render pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Nsf2WavError {
    /// Malformed or out-of-range user input, reported before any output is produced.
    #[error("usage error: {0}")]
    Usage(String),

    /// The source file or playlist entry could not be loaded.
    #[error("input error: {0}")]
    Input(String),

    /// The synthesis engine rejected the session or was driven out of order.
    #[error("engine error: {0}")]
    Engine(String),

    /// Internally inconsistent data (header overflow, buffer size mismatch, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The output sink could not be opened or accepted fewer bytes than requested.
    #[error("io error: {context}: {source}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Nsf2WavError {
    /// Build a [`Nsf2WavError::Usage`] value.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Build a [`Nsf2WavError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`Nsf2WavError::Engine`] value.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Build a [`Nsf2WavError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`Nsf2WavError::Io`] value.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
