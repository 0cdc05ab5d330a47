//! Host ABI layouts: GUIDs, vtables and create args.
//!
//! All structs are `#[repr(C)]` and mirror the host headers field for field.

use bext_core::InterfaceId;
use std::ffi::c_void;
use std::mem::{offset_of, size_of};

pub type HRESULT = i32;

/// Windows `GUID` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl From<&Guid> for InterfaceId {
    fn from(guid: &Guid) -> Self {
        InterfaceId::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
    }
}

impl From<InterfaceId> for Guid {
    fn from(iid: InterfaceId) -> Self {
        let (data1, data2, data3, data4) = iid.as_fields();
        Self {
            data1,
            data2,
            data3,
            data4: *data4,
        }
    }
}

/// `IBundleExtension` vtable, `IUnknown` slots first.
#[repr(C)]
pub struct IBundleExtensionVtbl {
    pub query_interface: unsafe extern "system" fn(
        this: *mut c_void,
        riid: *const Guid,
        ppv_object: *mut *mut c_void,
    ) -> HRESULT,
    pub add_ref: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub release: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub search: unsafe extern "system" fn(
        this: *mut c_void,
        wz_id: *const u16,
        wz_variable: *const u16,
    ) -> HRESULT,
    pub bundle_extension_proc: unsafe extern "system" fn(
        this: *mut c_void,
        message: u32,
        pv_args: *const c_void,
        pv_results: *mut c_void,
        pv_context: *mut c_void,
    ) -> HRESULT,
}

/// Leading `IUnknown` slots of the host engine interface. Later slots are
/// never called from this crate.
#[repr(C)]
pub struct IUnknownVtbl {
    pub query_interface: unsafe extern "system" fn(
        this: *mut RawInterface,
        riid: *const Guid,
        ppv_object: *mut *mut c_void,
    ) -> HRESULT,
    pub add_ref: unsafe extern "system" fn(this: *mut RawInterface) -> u32,
    pub release: unsafe extern "system" fn(this: *mut RawInterface) -> u32,
}

/// Any COM object: a pointer to its vtable pointer.
#[repr(C)]
pub struct RawInterface {
    pub vtbl: *const IUnknownVtbl,
}

/// Engine callback the host hands over in the create args.
pub type EngineProc = unsafe extern "system" fn(
    message: u32,
    pv_args: *const c_void,
    pv_results: *mut c_void,
    pv_context: *mut c_void,
) -> HRESULT;

/// `BUNDLE_EXTENSION_CREATE_ARGS`.
#[repr(C)]
pub struct RawCreateArgs {
    pub cb_size: u32,
    pub engine_api_version: u64,
    pub engine_proc: Option<EngineProc>,
    pub engine_proc_context: *mut c_void,
    pub bundle_extension_data_path: *const u16,
}

impl RawCreateArgs {
    /// Smallest `cb_size` that still covers the data path field.
    pub const MIN_SIZE: usize =
        offset_of!(RawCreateArgs, bundle_extension_data_path) + size_of::<*const u16>();

    /// Args with `cb_size` filled in for the current layout.
    pub fn new(engine_api_version: u64, bundle_extension_data_path: *const u16) -> Self {
        Self {
            cb_size: size_of::<Self>() as u32,
            engine_api_version,
            engine_proc: None,
            engine_proc_context: std::ptr::null_mut(),
            bundle_extension_data_path,
        }
    }
}

/// Reads a NUL-terminated wide string without the terminator.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated UTF-16 buffer that stays
/// valid for `'a`.
pub unsafe fn wide_slice<'a>(ptr: *const u16) -> Option<&'a [u16]> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    Some(std::slice::from_raw_parts(ptr, len))
}
