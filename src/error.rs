use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::Display;
use std::result::Result as StdResult;

pub(crate) const WRONG_OFFSET: &str = "Wrong buffer offset detected";

/// Possible errors that can occur while decoding E57 files.
///
/// Parsing stops at the first error, no partial results are returned.
/// Binary errors carry the physical file offset, schema errors carry
/// the path of the offending XML element (like `/data3D/0/temperature`).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The first eight bytes of the file are not `ASTM-E57`.
    #[error("Invalid E57 file signature {found:?}, expected \"ASTM-E57\"")]
    BadSignature { found: [u8; 8] },

    /// Only E57 version 1.0 is supported.
    #[error("Unsupported E57 version {major}.{minor}, only 1.0 is supported")]
    UnsupportedVersion { major: u32, minor: u32 },

    /// Only pages of 1024 bytes are supported.
    #[error("Unsupported page size of {page_size} bytes, only 1024 is supported")]
    UnsupportedPageSize { page_size: u64 },

    /// The stream ended before the requested amount of logical bytes was read.
    #[error("Stream ended early at physical offset {offset}: expected {expected} logical bytes but got {actual}")]
    TruncatedStream {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    /// The physical file length is not a multiple of the page size.
    #[error("File size {length} is not a multiple of the page size")]
    InvalidFileSize { length: u64 },

    /// The CRC checksum of a page does not match its payload.
    #[error("Checksum mismatch for page at physical offset {offset} (expected: {expected:#010X}, actual: {actual:#010X})")]
    ChecksumMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    /// An XML element does not have the name, namespace or type required at its position.
    #[error("Schema mismatch at '{path}': expected {expected}, found {actual}")]
    SchemaMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A required XML child element or attribute is missing.
    #[error("Missing required element '{name}' in '{path}'")]
    MissingRequiredElement { path: String, name: String },

    /// The `type` attribute of an XML element names an unknown element type.
    #[error("Unknown element type '{type_name}' at '{path}'")]
    UnknownElementType { path: String, type_name: String },

    /// A value violates a numeric or enumerated constraint.
    #[error("Constraint violation for '{field}': expected {constraint}, found {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },

    /// Reserved bytes of a binary section or packet header are not zero.
    #[error("Reserved bytes of {section} at physical offset {offset} are not zero")]
    ReservedFieldNonZero { section: &'static str, offset: u64 },

    /// A bit buffer access exceeds the declared bit length.
    #[error("Bit range {start}..{end} is outside of the buffer with {length} bits")]
    OutOfBounds { start: u64, end: u64, length: u64 },

    /// Bit widths must be between 1 and 64 bits (or 32 bits for 32-bit accessors).
    #[error("Unsupported bit width {bits}")]
    UnsupportedBitWidth { bits: u32 },

    /// The file content is invalid and does not conform with the E57 format specification.
    #[error("Invalid E57 content: {reason}")]
    Invalid {
        reason: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    /// Something went wrong while reading data from an E57 file.
    /// Typically this is caused by an IO error outside the library or because of an incomplete file.
    #[error("Failed to read E57: {reason}")]
    Read {
        reason: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    /// An unexpected internal issue occured.
    /// Most likely this is a logic error inside the library.
    #[error("Internal error: {reason}")]
    Internal {
        reason: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    /// Some valid E57 feature is not supported by this decoder.
    #[error("Not implemented: {reason}")]
    NotImplemented { reason: String },
}

impl Error {
    /// Creates an invalid file error from text.
    pub fn invalid<T, C>(reason: C) -> Result<T>
    where
        C: Display,
    {
        Err(Error::Invalid {
            reason: reason.to_string(),
            source: None,
        })
    }

    /// Creates a not implemented error from text.
    pub fn not_implemented<T, C>(reason: C) -> Result<T>
    where
        C: Display,
    {
        Err(Error::NotImplemented {
            reason: reason.to_string(),
        })
    }

    /// Creates a constraint violation error.
    pub fn constraint<T>(
        field: impl Display,
        constraint: impl Display,
        actual: impl Display,
    ) -> Result<T> {
        Err(Error::ConstraintViolation {
            field: field.to_string(),
            constraint: constraint.to_string(),
            actual: actual.to_string(),
        })
    }

    /// Creates a missing required element error.
    pub fn missing<T>(path: &str, name: &str) -> Result<T> {
        Err(Error::MissingRequiredElement {
            path: path.to_string(),
            name: name.to_string(),
        })
    }

    /// Creates a schema mismatch error.
    pub fn mismatch<T>(path: &str, expected: impl Display, actual: impl Display) -> Result<T> {
        Err(Error::SchemaMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

pub type Result<T> = StdResult<T, Error>;

/// Helper trait for types that can be converted into an Error.
pub trait Converter<T, E> {
    fn read_err<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    fn invalid_err<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    fn internal_err<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

/// Create an library Error from std Error instances.
impl<T, E> Converter<T, E> for StdResult<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn read_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|error| Error::Read {
            reason: reason.to_string(),
            source: Some(Box::new(error)),
        })
    }

    fn invalid_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|error| Error::Invalid {
            reason: reason.to_string(),
            source: Some(Box::new(error)),
        })
    }

    fn internal_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|error| Error::Internal {
            reason: reason.to_string(),
            source: Some(Box::new(error)),
        })
    }
}

/// Create an library Error from Option instances.
impl<T> Converter<T, Infallible> for Option<T> {
    fn read_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::Read {
            reason: reason.to_string(),
            source: None,
        })
    }

    fn invalid_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::Invalid {
            reason: reason.to_string(),
            source: None,
        })
    }

    fn internal_err<C>(self, reason: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::Internal {
            reason: reason.to_string(),
            source: None,
        })
    }
}
