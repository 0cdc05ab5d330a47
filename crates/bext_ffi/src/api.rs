//! COM-compatible `IBundleExtension` surface for a Rust extension.
//!
//! # Responsibility
//! - Publish one static vtable per extension type.
//! - Translate raw host arguments into `bext_core` calls and back into
//!   HRESULTs.
//!
//! # Invariants
//! - Exported functions never unwind into the host; panics become
//!   `E_UNEXPECTED` (or a zero count for `Release`).
//! - The interface pointer handed out is the `ExtensionObject` itself, so
//!   both supported IIDs resolve to the same address.
//! - Null interface or output pointers are rejected with `E_INVALIDARG`.

use crate::abi::{wide_slice, Guid, IBundleExtensionVtbl, RawCreateArgs, HRESULT};
use bext_core::{
    describe_panic, init_logging_with_config, BundleExtension, BundleExtensionCreateArgs,
    BundleExtensionEngine, BundleExtensionMessage, ExtensionConfig, ExtensionError,
    ExtensionObject, ExtensionRef, ExtensionResult, InterfaceId, ProcCall, SearchRequest, Status,
};
use log::error;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

/// Loads `BEXT_*` settings from the environment and starts file logging
/// under `log_dir` at the configured level.
///
/// Call from the extension's entry point before `ComBundleExtension::create`.
///
/// # FFI contract
/// - Safe to call repeatedly with the same level and directory.
/// - A different level or directory after the first call is an error.
/// - Never panics; returns the loaded config or an error message.
pub fn init_extension_logging(log_dir: &str) -> Result<ExtensionConfig, String> {
    init_extension_logging_from(|key| std::env::var(key).ok(), log_dir)
}

/// Same as `init_extension_logging` with an injectable variable source.
pub fn init_extension_logging_from(
    lookup: impl Fn(&str) -> Option<String>,
    log_dir: &str,
) -> Result<ExtensionConfig, String> {
    let config = ExtensionConfig::from_lookup(lookup).map_err(|err| err.to_string())?;
    init_logging_with_config(&config, log_dir)?;
    Ok(config)
}

/// Binds extension type `E` to the host ABI.
pub struct ComBundleExtension<E: BundleExtension>(PhantomData<E>);

impl<E: BundleExtension> ComBundleExtension<E> {
    const VTBL: IBundleExtensionVtbl = IBundleExtensionVtbl {
        query_interface: query_interface::<E>,
        add_ref: add_ref::<E>,
        release: release::<E>,
        search: search::<E>,
        bundle_extension_proc: bundle_extension_proc::<E>,
    };

    pub fn vtable() -> &'static IBundleExtensionVtbl {
        &Self::VTBL
    }

    /// Allocates the object and returns its `IBundleExtension*` with count 1.
    pub fn create(
        engine: Arc<dyn BundleExtensionEngine>,
        extension: E,
        config: &ExtensionConfig,
    ) -> *mut c_void {
        let vtable = (Self::vtable() as *const IBundleExtensionVtbl).cast::<c_void>();
        let object = ExtensionObject::with_abi_vtable(vtable, engine, extension, config);
        ExtensionRef::into_raw(object).cast::<c_void>()
    }

    /// Runs `initialize` with the host's create args.
    ///
    /// # Safety
    /// `this` must be null or a pointer returned by `create` for this `E`.
    /// `args` must be null or point to a readable `RawCreateArgs` whose data
    /// path (if any) is NUL-terminated.
    pub unsafe fn initialize(this: *mut c_void, args: *const RawCreateArgs) -> HRESULT {
        guard("initialize", || {
            let object = borrow::<E>(this)?;
            let args = args
                .as_ref()
                .ok_or(ExtensionError::NullArgument("pCreateArgs"))?;
            if (args.cb_size as usize) < RawCreateArgs::MIN_SIZE {
                return Err(ExtensionError::CopyFailed {
                    what: "create args",
                    reason: format!("cb_size {} is too small", args.cb_size),
                });
            }
            let data_path = wide_slice(args.bundle_extension_data_path);
            object.initialize(&BundleExtensionCreateArgs::new(
                args.engine_api_version,
                data_path,
            ))
        })
    }

    /// Borrows the object behind an interface pointer without touching the
    /// count. Returns `None` for null.
    ///
    /// # Safety
    /// `this` must be null or a pointer returned by `create` for this `E`,
    /// and the returned handle must not outlive the caller's count.
    pub unsafe fn borrow(this: *mut c_void) -> Option<ManuallyDrop<ExtensionRef<E>>> {
        borrow::<E>(this).ok()
    }
}

unsafe fn borrow<E: BundleExtension>(
    this: *mut c_void,
) -> ExtensionResult<ManuallyDrop<ExtensionRef<E>>> {
    if this.is_null() {
        return Err(ExtensionError::NullArgument("this"));
    }
    Ok(ExtensionRef::borrow_raw(this.cast::<ExtensionObject<E>>()))
}

fn guard(operation: &'static str, f: impl FnOnce() -> ExtensionResult<()>) -> HRESULT {
    let status = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => Status::from_result(&result),
        Err(payload) => {
            let err = ExtensionError::Panicked(describe_panic(payload.as_ref()));
            error!("event=abi_panic module=ffi status=error operation={operation} error={err}");
            Status::from(err)
        }
    };
    status.as_hresult()
}

unsafe extern "system" fn query_interface<E: BundleExtension>(
    this: *mut c_void,
    riid: *const Guid,
    ppv_object: *mut *mut c_void,
) -> HRESULT {
    guard("query_interface", || {
        let ppv_object = ppv_object
            .as_mut()
            .ok_or(ExtensionError::NullArgument("ppvObject"))?;
        *ppv_object = ptr::null_mut();

        let object = borrow::<E>(this)?;
        let riid = riid.as_ref().ok_or(ExtensionError::NullArgument("riid"))?;
        let handle = object.query_interface(&InterfaceId::from(riid))?;
        *ppv_object = ExtensionRef::into_raw(handle).cast::<c_void>();
        Ok(())
    })
}

unsafe extern "system" fn add_ref<E: BundleExtension>(this: *mut c_void) -> u32 {
    match borrow::<E>(this) {
        Ok(object) => object.add_ref(),
        Err(_) => 0,
    }
}

unsafe extern "system" fn release<E: BundleExtension>(this: *mut c_void) -> u32 {
    let Ok(object) = borrow::<E>(this) else {
        return 0;
    };
    let owned = ManuallyDrop::into_inner(object);
    match catch_unwind(AssertUnwindSafe(|| ExtensionRef::release(owned))) {
        Ok(count) => count,
        Err(payload) => {
            error!(
                "event=abi_panic module=ffi status=error operation=release error={}",
                describe_panic(payload.as_ref())
            );
            0
        }
    }
}

unsafe extern "system" fn search<E: BundleExtension>(
    this: *mut c_void,
    wz_id: *const u16,
    wz_variable: *const u16,
) -> HRESULT {
    guard("search", || {
        let object = borrow::<E>(this)?;
        let request = SearchRequest::from_wide(wide_slice(wz_id), wide_slice(wz_variable));
        object.search(&request)
    })
}

unsafe extern "system" fn bundle_extension_proc<E: BundleExtension>(
    this: *mut c_void,
    message: u32,
    pv_args: *const c_void,
    pv_results: *mut c_void,
    pv_context: *mut c_void,
) -> HRESULT {
    guard("bundle_extension_proc", || {
        let object = borrow::<E>(this)?;
        let mut call = ProcCall::from_raw(pv_args, pv_results, pv_context);
        object.bundle_extension_proc(BundleExtensionMessage::from_raw(message), &mut call)
    })
}
