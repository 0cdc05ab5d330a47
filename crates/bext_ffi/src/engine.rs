//! Adapter from a host engine interface pointer to `BundleExtensionEngine`.

use crate::abi::RawInterface;
use bext_core::BundleExtensionEngine;
use std::ptr::NonNull;

/// Host engine reached through its `IUnknown` slots.
///
/// Holds no count of its own; `EngineRef` in the extension object does.
pub struct RawEngine {
    ptr: NonNull<RawInterface>,
}

// The host engine is free-threaded; count calls may come from any thread.
unsafe impl Send for RawEngine {}
unsafe impl Sync for RawEngine {}

impl RawEngine {
    /// Wraps a host engine pointer. Returns `None` for null.
    ///
    /// # Safety
    /// A non-null `ptr` must be a live COM object that outlives every
    /// count taken through this adapter.
    pub unsafe fn from_raw(ptr: *mut RawInterface) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    pub fn as_ptr(&self) -> *mut RawInterface {
        self.ptr.as_ptr()
    }
}

impl BundleExtensionEngine for RawEngine {
    fn add_ref(&self) -> u32 {
        unsafe { ((*(*self.ptr.as_ptr()).vtbl).add_ref)(self.ptr.as_ptr()) }
    }

    fn release(&self) -> u32 {
        unsafe { ((*(*self.ptr.as_ptr()).vtbl).release)(self.ptr.as_ptr()) }
    }
}
