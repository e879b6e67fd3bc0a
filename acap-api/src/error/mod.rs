//! Error handling for the ACAP loaders
//!
//! Every failure carries a stable numeric code and a short fixed label.
//! Success is code 0 and is never represented as an `Error` value; use
//! [`status_code`] to fold a `Result` into the numeric convention.

use core::fmt;

/// Loader error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Recognized but unimplemented container variant, or an unavailable
    /// firmware feature
    NotSupported,
    /// Header shorter than the minimum word count, or a read past the end
    /// of the buffer
    InvalidLength,
    /// Recomputed checksum does not match the stored checksum word
    InvalidChecksum,
    /// Magic bytes mismatch
    InvalidHeader,
    /// Identity marker mismatch
    InvalidIdent,
    /// Section count/size mismatch or aperture total out of bounds
    InvalidFormat,
    /// Aperture table exhausted
    OutOfSpace,
    /// Requested section is not present
    NotFound,
    /// Storage for a slot could not be reserved
    NoMemory,
    /// Request out of range or malformed
    InvalidArgument,
    /// The container is already loaded in the slot
    AlreadyLoaded,
    /// The caller's output buffer cannot hold the response
    BufferTooSmall,

    /// Firmware reported failures
    NoAccess,
    Conflict,
    Internal,
    Aborted,

    /// Buffer read failure
    Io,
}

impl Error {
    /// Convert to the numeric status surfaced to callers
    pub fn as_error_code(&self) -> u32 {
        match self {
            Error::NotSupported => 1,
            Error::InvalidLength => 2,
            Error::InvalidChecksum => 3,
            Error::InvalidHeader => 4,
            Error::InvalidIdent => 5,
            Error::InvalidFormat => 6,
            Error::OutOfSpace => 7,
            Error::NotFound => 8,
            Error::NoMemory => 9,
            Error::InvalidArgument => 10,
            Error::AlreadyLoaded => 11,
            Error::BufferTooSmall => 12,
            Error::NoAccess => 13,
            Error::Conflict => 14,
            Error::Internal => 15,
            Error::Aborted => 16,
            Error::Io => 17,
        }
    }

    /// Get the short human-readable label of the error
    pub fn description(&self) -> &'static str {
        match self {
            Error::NotSupported => "not supported",
            Error::InvalidLength => "invalid header length",
            Error::InvalidChecksum => "invalid header checksum",
            Error::InvalidHeader => "invalid header",
            Error::InvalidIdent => "invalid header identification",
            Error::InvalidFormat => "invalid format",
            Error::OutOfSpace => "no space",
            Error::NotFound => "not found",
            Error::NoMemory => "no memory",
            Error::InvalidArgument => "invalid argument",
            Error::AlreadyLoaded => "already loaded",
            Error::BufferTooSmall => "buffer too small",
            Error::NoAccess => "no access",
            Error::Conflict => "conflict",
            Error::Internal => "internal firmware error",
            Error::Aborted => "aborted",
            Error::Io => "i/o error",
        }
    }

    /// Look an error up by its numeric code. Code 0 is success and has no
    /// error value.
    pub fn from_error_code(code: u32) -> Option<Error> {
        ALL_ERRORS.iter().copied().find(|e| e.as_error_code() == code)
    }

    /// Check if the error was reported by firmware rather than detected
    /// locally
    pub fn is_firmware_reported(&self) -> bool {
        matches!(
            self,
            Error::NoAccess | Error::Conflict | Error::Internal | Error::Aborted
        )
    }
}

const ALL_ERRORS: [Error; 17] = [
    Error::NotSupported,
    Error::InvalidLength,
    Error::InvalidChecksum,
    Error::InvalidHeader,
    Error::InvalidIdent,
    Error::InvalidFormat,
    Error::OutOfSpace,
    Error::NotFound,
    Error::NoMemory,
    Error::InvalidArgument,
    Error::AlreadyLoaded,
    Error::BufferTooSmall,
    Error::NoAccess,
    Error::Conflict,
    Error::Internal,
    Error::Aborted,
    Error::Io,
];

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.description(), self.as_error_code())
    }
}

/// Result type used throughout the loaders
pub type Result<T = ()> = core::result::Result<T, Error>;

/// Numeric status of a result: 0 on success, the error code otherwise
pub fn status_code<T>(result: &Result<T>) -> u32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.as_error_code(),
    }
}

/// Label of a result: "success" or the error description
pub fn status_label<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.description(),
    }
}
