/// Convenience result type used across blitkit.
pub type BlitResult<T> = Result<T, BlitError>;

/// Top-level error taxonomy used by decoder, cache, mask and draw APIs.
#[derive(thiserror::Error, Debug)]
pub enum BlitError {
    /// No registered decoder recognized the source.
    #[error("no decoder found: {0}")]
    NoDecoder(String),

    /// A decoder recognized the source but could not open it (missing file, corrupt header).
    #[error("decode open failed: {0}")]
    DecodeOpenFailed(String),

    /// A scanline read failed mid-image.
    #[error("read line failed: {0}")]
    ReadLineFailed(String),

    /// Host or GPU memory for a buffer/texture could not be obtained.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    /// The backend cannot represent the requested mask format.
    #[error("invalid mask format: {0}")]
    InvalidMaskFormat(String),

    /// A transform matrix has no inverse.
    #[error("non-invertible transform")]
    NonInvertibleTransform,

    /// Invalid user-provided data (descriptor fields, buffer sizes, slot exhaustion).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlitError {
    /// Build a [`BlitError::NoDecoder`] value.
    pub fn no_decoder(msg: impl Into<String>) -> Self {
        Self::NoDecoder(msg.into())
    }

    /// Build a [`BlitError::DecodeOpenFailed`] value.
    pub fn decode_open(msg: impl Into<String>) -> Self {
        Self::DecodeOpenFailed(msg.into())
    }

    /// Build a [`BlitError::ReadLineFailed`] value.
    pub fn read_line(msg: impl Into<String>) -> Self {
        Self::ReadLineFailed(msg.into())
    }

    /// Build a [`BlitError::AllocationFailed`] value.
    pub fn alloc(msg: impl Into<String>) -> Self {
        Self::AllocationFailed(msg.into())
    }

    /// Build a [`BlitError::InvalidMaskFormat`] value.
    pub fn mask_format(msg: impl Into<String>) -> Self {
        Self::InvalidMaskFormat(msg.into())
    }

    /// Build a [`BlitError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BlitError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Integer-style code for this error, as stored in a renderer's last-error slot.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoDecoder(_) => ErrorCode::NoDecoder,
            Self::DecodeOpenFailed(_) => ErrorCode::DecodeOpenFailed,
            Self::ReadLineFailed(_) => ErrorCode::ReadLineFailed,
            Self::AllocationFailed(_) => ErrorCode::AllocationFailed,
            Self::InvalidMaskFormat(_) => ErrorCode::InvalidMaskFormat,
            Self::NonInvertibleTransform => ErrorCode::NonInvertibleTransform,
            Self::Validation(_) | Self::Serde(_) => ErrorCode::Validation,
            Self::Other(_) => ErrorCode::Other,
        }
    }
}

/// Pollable error code mirroring [`BlitError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// See [`BlitError::NoDecoder`].
    NoDecoder = 1,
    /// See [`BlitError::DecodeOpenFailed`].
    DecodeOpenFailed = 2,
    /// See [`BlitError::ReadLineFailed`].
    ReadLineFailed = 3,
    /// See [`BlitError::AllocationFailed`].
    AllocationFailed = 4,
    /// See [`BlitError::InvalidMaskFormat`].
    InvalidMaskFormat = 5,
    /// See [`BlitError::NonInvertibleTransform`].
    NonInvertibleTransform = 6,
    /// See [`BlitError::Validation`].
    Validation = 7,
    /// Anything else.
    Other = 255,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
