//! Host-supplied call payloads: create args, search requests and
//! extension-proc buffers.
//!
//! # Invariants
//! - `ProcCall` never outlives the host call that produced it; its buffers
//!   are borrowed for `'call` only and never handed out as raw pointers.
//! - `SearchRequest` decodes host strings only when asked, so an extension
//!   that ignores them never sees a decode error.
//! - Message discriminants unknown to this crate are preserved, not dropped.

use crate::status::{ExtensionError, ExtensionResult};
use std::borrow::Cow;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;

const MESSAGE_SEARCH: u32 = 0;

/// Message kinds routed to `BundleExtension::bundle_extension_proc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleExtensionMessage {
    Search,
    Unknown(u32),
}

impl BundleExtensionMessage {
    pub fn from_raw(value: u32) -> Self {
        match value {
            MESSAGE_SEARCH => Self::Search,
            other => Self::Unknown(other),
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            Self::Search => MESSAGE_SEARCH,
            Self::Unknown(value) => value,
        }
    }
}

/// Arguments the host passes once, right after construction.
///
/// Only the data path is consumed by the base object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleExtensionCreateArgs<'a> {
    /// Engine API version reported by the host.
    pub engine_api_version: u64,
    /// Data path as UTF-16 code units, without terminator. `None` when the
    /// host passed a null string.
    pub bundle_extension_data_path: Option<&'a [u16]>,
}

impl<'a> BundleExtensionCreateArgs<'a> {
    pub fn new(engine_api_version: u64, bundle_extension_data_path: Option<&'a [u16]>) -> Self {
        Self {
            engine_api_version,
            bundle_extension_data_path,
        }
    }
}

/// Encodes a Rust string into the wide form used by `BundleExtensionCreateArgs`.
pub fn encode_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchText<'a> {
    Utf8(&'a str),
    Wide(Option<&'a [u16]>),
}

impl<'a> SearchText<'a> {
    fn decode(self, what: &'static str) -> ExtensionResult<Cow<'a, str>> {
        match self {
            Self::Utf8(text) => Ok(Cow::Borrowed(text)),
            Self::Wide(None) => Err(ExtensionError::NullArgument(what)),
            Self::Wide(Some(units)) => String::from_utf16(units)
                .map(Cow::Owned)
                .map_err(|err| ExtensionError::CopyFailed {
                    what,
                    reason: err.to_string(),
                }),
        }
    }
}

/// Search id and variable name for one `search` call.
///
/// Host strings stay undecoded until `id()` or `variable()` is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest<'call> {
    id: SearchText<'call>,
    variable: SearchText<'call>,
}

impl<'call> SearchRequest<'call> {
    pub fn new(id: &'call str, variable: &'call str) -> Self {
        Self {
            id: SearchText::Utf8(id),
            variable: SearchText::Utf8(variable),
        }
    }

    /// Wraps host wide strings (without terminator); `None` is a null pointer.
    pub fn from_wide(id: Option<&'call [u16]>, variable: Option<&'call [u16]>) -> Self {
        Self {
            id: SearchText::Wide(id),
            variable: SearchText::Wide(variable),
        }
    }

    /// Search id. Fails with `NullArgument` for a null host string and
    /// `CopyFailed` for malformed UTF-16.
    pub fn id(&self) -> ExtensionResult<Cow<'call, str>> {
        self.id.decode("wzId")
    }

    /// Variable receiving the search result. Same failures as `id`.
    pub fn variable(&self) -> ExtensionResult<Cow<'call, str>> {
        self.variable.decode("wzVariable")
    }
}

/// Call-scoped argument, result and context buffers of one extension-proc call.
///
/// The buffer layouts are defined by the host per message.
#[derive(Debug)]
pub struct ProcCall<'call> {
    args: *const c_void,
    results: *mut c_void,
    context: *mut c_void,
    _scope: PhantomData<&'call mut c_void>,
}

impl<'call> ProcCall<'call> {
    /// Wraps raw host buffers.
    ///
    /// # Safety
    /// Non-null pointers must stay valid for `'call`, and `results` must not
    /// be aliased elsewhere during that time.
    pub unsafe fn from_raw(args: *const c_void, results: *mut c_void, context: *mut c_void) -> Self {
        Self {
            args,
            results,
            context,
            _scope: PhantomData,
        }
    }

    /// A call without buffers.
    pub fn empty() -> Self {
        Self {
            args: ptr::null(),
            results: ptr::null_mut(),
            context: ptr::null_mut(),
            _scope: PhantomData,
        }
    }

    /// Views the argument buffer as `T`.
    ///
    /// # Safety
    /// The host must have passed a `T` for this message.
    pub unsafe fn args_as<T>(&self) -> Option<&T> {
        self.args.cast::<T>().as_ref()
    }

    /// Views the result buffer as `T`.
    ///
    /// # Safety
    /// The host must have passed a `T` for this message.
    pub unsafe fn results_as<T>(&mut self) -> Option<&mut T> {
        self.results.cast::<T>().as_mut()
    }

    /// Views the host context as `T`.
    ///
    /// # Safety
    /// The host must have passed a `T` as context for this message.
    pub unsafe fn context_as<T>(&mut self) -> Option<&mut T> {
        self.context.cast::<T>().as_mut()
    }
}
