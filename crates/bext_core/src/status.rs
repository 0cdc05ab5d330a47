//! Status vocabulary shared by the Rust surface and the host ABI.
//!
//! # Responsibility
//! - Define the closed set of status codes an extension may return.
//! - Convert rich internal errors into that closed set at the boundary.
//!
//! # Invariants
//! - `Status` values map 1:1 onto stable HRESULT codes.
//! - Every `ExtensionError` collapses into exactly one non-success `Status`.

use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};

const S_OK: i32 = 0;
const E_NOTIMPL: i32 = 0x8000_4001_u32 as i32;
const E_NOINTERFACE: i32 = 0x8000_4002_u32 as i32;
const E_UNEXPECTED: i32 = 0x8000_FFFF_u32 as i32;
const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;
const E_OUTOFMEMORY: i32 = 0x8007_000E_u32 as i32;
const E_INVALIDDATA: i32 = 0x8007_000D_u32 as i32;

/// Closed status vocabulary returned through the host ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidArgument,
    NoSuchInterface,
    NotImplemented,
    AllocationFailure,
    CopyFailure,
    /// Call sequence violated the object contract (or a panic was caught).
    Unexpected,
}

impl Status {
    /// HRESULT wire value.
    pub fn as_hresult(self) -> i32 {
        match self {
            Self::Success => S_OK,
            Self::InvalidArgument => E_INVALIDARG,
            Self::NoSuchInterface => E_NOINTERFACE,
            Self::NotImplemented => E_NOTIMPL,
            Self::AllocationFailure => E_OUTOFMEMORY,
            Self::CopyFailure => E_INVALIDDATA,
            Self::Unexpected => E_UNEXPECTED,
        }
    }

    /// Maps a wire value back into the vocabulary.
    ///
    /// Returns `None` for codes outside the closed set.
    pub fn from_hresult(value: i32) -> Option<Self> {
        match value {
            S_OK => Some(Self::Success),
            E_INVALIDARG => Some(Self::InvalidArgument),
            E_NOINTERFACE => Some(Self::NoSuchInterface),
            E_NOTIMPL => Some(Self::NotImplemented),
            E_OUTOFMEMORY => Some(Self::AllocationFailure),
            E_INVALIDDATA => Some(Self::CopyFailure),
            E_UNEXPECTED => Some(Self::Unexpected),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Collapses an internal result into a boundary status.
    pub fn from_result<T>(result: &ExtensionResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => Self::from(err),
        }
    }

    /// Stable lowercase name used in log records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidArgument => "invalid_argument",
            Self::NoSuchInterface => "no_such_interface",
            Self::NotImplemented => "not_implemented",
            Self::AllocationFailure => "allocation_failure",
            Self::CopyFailure => "copy_failure",
            Self::Unexpected => "unexpected",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:08X})", self.as_str(), self.as_hresult() as u32)
    }
}

/// Result alias used across the extension surface.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Internal extension errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// Output slot or other pointer argument was null.
    NullArgument(&'static str),
    /// Requested interface id is not supported by this object.
    NoSuchInterface(String),
    /// Extension point has no implementation.
    NotImplemented(&'static str),
    /// Storage for an owned copy could not be reserved.
    AllocationFailed { what: &'static str, units: usize },
    /// Source value could not be copied (missing or malformed).
    CopyFailed { what: &'static str, reason: String },
    /// `initialize` was called on an already initialized object.
    AlreadyInitialized,
    /// A panic was caught before it could cross the ABI boundary.
    Panicked(String),
}

impl Display for ExtensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullArgument(name) => write!(f, "argument must not be null: {name}"),
            Self::NoSuchInterface(iid) => write!(f, "interface is not supported: {iid}"),
            Self::NotImplemented(operation) => write!(f, "operation is not implemented: {operation}"),
            Self::AllocationFailed { what, units } => {
                write!(f, "failed to allocate {what} ({units} code units)")
            }
            Self::CopyFailed { what, reason } => write!(f, "failed to copy {what}: {reason}"),
            Self::AlreadyInitialized => write!(f, "bundle extension is already initialized"),
            Self::Panicked(message) => write!(f, "bundle extension panicked: {message}"),
        }
    }
}

impl Error for ExtensionError {}

impl ExtensionError {
    pub(crate) fn from_reserve(what: &'static str, units: usize, _err: TryReserveError) -> Self {
        Self::AllocationFailed { what, units }
    }
}

impl From<&ExtensionError> for Status {
    fn from(err: &ExtensionError) -> Self {
        match err {
            ExtensionError::NullArgument(_) => Status::InvalidArgument,
            ExtensionError::NoSuchInterface(_) => Status::NoSuchInterface,
            ExtensionError::NotImplemented(_) => Status::NotImplemented,
            ExtensionError::AllocationFailed { .. } => Status::AllocationFailure,
            ExtensionError::CopyFailed { .. } => Status::CopyFailure,
            ExtensionError::AlreadyInitialized | ExtensionError::Panicked(_) => Status::Unexpected,
        }
    }
}

impl From<ExtensionError> for Status {
    fn from(err: ExtensionError) -> Self {
        Status::from(&err)
    }
}
