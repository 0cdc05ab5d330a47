//! Reference-counted bundle extension object.
//!
//! # Responsibility
//! - Own the identity, count, engine reference and data path of one extension.
//! - Answer capability queries for the object and bundle-extension interfaces.
//! - Route the two extension points to the concrete `BundleExtension`.
//!
//! # Invariants
//! - The count starts at 1 and changes only through atomic add/release.
//! - Exactly one release observes the 1 -> 0 transition and frees the object.
//! - The concrete extension is dropped before the engine reference and the
//!   data path (field order below).
//! - The data path is unset until `initialize` succeeds and immutable after.

use super::capability::{Capability, InterfaceId};
use super::engine::{BundleExtensionEngine, EngineRef};
use super::message::{BundleExtensionCreateArgs, BundleExtensionMessage, ProcCall, SearchRequest};
use crate::config::ExtensionConfig;
use crate::status::{ExtensionError, ExtensionResult, Status};
use log::{debug, trace};
use once_cell::sync::OnceCell;
use std::ffi::c_void;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::atomic::{self, AtomicU32, Ordering};
use std::sync::Arc;

const MAX_REFERENCES: u32 = i32::MAX as u32;

/// Behavior supplied by a concrete extension.
///
/// Every method has a default, so an empty impl is a valid (inert)
/// extension. Implementations that keep mutable state must synchronize it
/// themselves; the host may call from any thread.
pub trait BundleExtension: Send + Sync + 'static {
    /// Resolves a custom search variable. The default ignores `request`
    /// entirely, so malformed host strings still report `NotImplemented`.
    fn search(&self, _base: &ExtensionBase, _request: &SearchRequest<'_>) -> ExtensionResult<()> {
        Err(ExtensionError::NotImplemented("search"))
    }

    /// Handles one host message. `call` buffers must not be retained.
    fn bundle_extension_proc(
        &self,
        _base: &ExtensionBase,
        _message: BundleExtensionMessage,
        _call: &mut ProcCall<'_>,
    ) -> ExtensionResult<()> {
        Err(ExtensionError::NotImplemented("bundle_extension_proc"))
    }

    /// Runs after the base object stored the data path.
    fn on_initialize(
        &self,
        _base: &ExtensionBase,
        _args: &BundleExtensionCreateArgs<'_>,
    ) -> ExtensionResult<()> {
        Ok(())
    }
}

/// State every extension carries regardless of its concrete behavior.
pub struct ExtensionBase {
    engine: EngineRef,
    data_path: OnceCell<String>,
    max_data_path_units: usize,
}

impl ExtensionBase {
    fn new(engine: Arc<dyn BundleExtensionEngine>, config: &ExtensionConfig) -> Self {
        Self {
            engine: EngineRef::acquire(engine),
            data_path: OnceCell::new(),
            max_data_path_units: config.max_data_path_units,
        }
    }

    /// Data path copied by `initialize`; `None` before it succeeds.
    pub fn data_path(&self) -> Option<&str> {
        self.data_path.get().map(String::as_str)
    }

    fn initialize(&self, args: &BundleExtensionCreateArgs<'_>) -> ExtensionResult<()> {
        if self.data_path.get().is_some() {
            return Err(ExtensionError::AlreadyInitialized);
        }
        let source = args
            .bundle_extension_data_path
            .ok_or_else(|| ExtensionError::CopyFailed {
                what: "bundle extension data path",
                reason: "host passed a null string".to_string(),
            })?;
        let copied = copy_wide("bundle extension data path", source, self.max_data_path_units)?;
        self.data_path
            .set(copied)
            .map_err(|_| ExtensionError::AlreadyInitialized)
    }
}

impl Debug for ExtensionBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionBase")
            .field("data_path", &self.data_path())
            .finish_non_exhaustive()
    }
}

fn copy_wide(what: &'static str, source: &[u16], max_units: usize) -> ExtensionResult<String> {
    if source.len() > max_units {
        return Err(ExtensionError::AllocationFailed {
            what,
            units: source.len(),
        });
    }

    let mut owned = String::new();
    owned
        .try_reserve_exact(source.len())
        .map_err(|err| ExtensionError::from_reserve(what, source.len(), err))?;
    for decoded in char::decode_utf16(source.iter().copied()) {
        let ch = decoded.map_err(|err| ExtensionError::CopyFailed {
            what,
            reason: format!("unpaired surrogate 0x{:04X}", err.unpaired_surrogate()),
        })?;
        owned.push(ch);
    }
    Ok(owned)
}

/// Heap-allocated extension identity.
///
/// `#[repr(C)]` keeps `abi_vtable` at offset 0 so a pointer to the object
/// doubles as a COM interface pointer.
#[repr(C)]
pub struct ExtensionObject<E: BundleExtension> {
    abi_vtable: *const c_void,
    references: AtomicU32,
    extension: E,
    base: ExtensionBase,
}

// The vtable pointer targets immutable static data; everything else is
// already Send + Sync.
unsafe impl<E: BundleExtension> Send for ExtensionObject<E> {}
unsafe impl<E: BundleExtension> Sync for ExtensionObject<E> {}

impl<E: BundleExtension> ExtensionObject<E> {
    /// Constructs an object with default configuration. Count starts at 1.
    pub fn new(engine: Arc<dyn BundleExtensionEngine>, extension: E) -> ExtensionRef<E> {
        Self::with_config(engine, extension, &ExtensionConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn BundleExtensionEngine>,
        extension: E,
        config: &ExtensionConfig,
    ) -> ExtensionRef<E> {
        Self::with_abi_vtable(ptr::null(), engine, extension, config)
    }

    /// Constructs an object whose first word is `abi_vtable`.
    pub fn with_abi_vtable(
        abi_vtable: *const c_void,
        engine: Arc<dyn BundleExtensionEngine>,
        extension: E,
        config: &ExtensionConfig,
    ) -> ExtensionRef<E> {
        let object = Box::new(Self {
            abi_vtable,
            references: AtomicU32::new(1),
            extension,
            base: ExtensionBase::new(engine, config),
        });
        debug!(
            "event=extension_create module=extension status=ok type={}",
            std::any::type_name::<E>()
        );
        ExtensionRef {
            ptr: NonNull::from(Box::leak(object)),
            _owns: PhantomData,
        }
    }

    pub fn abi_vtable(&self) -> *const c_void {
        self.abi_vtable
    }

    pub fn base(&self) -> &ExtensionBase {
        &self.base
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    pub fn data_path(&self) -> Option<&str> {
        self.base.data_path()
    }

    /// Current count. Racy by nature; diagnostics and tests only.
    pub fn reference_count(&self) -> u32 {
        self.references.load(Ordering::Relaxed)
    }

    /// Increments the count and returns the new value.
    ///
    /// The caller owns the added count and must pair it with `release`.
    pub fn add_ref(&self) -> u32 {
        let previous = self.references.fetch_add(1, Ordering::Relaxed);
        if previous >= MAX_REFERENCES {
            // Overflow would let a later release free a live object.
            std::process::abort();
        }
        previous + 1
    }

    /// Decrements the count, destroying the object on the 1 -> 0 transition.
    ///
    /// Returns the new count; 0 means `this` is dangling.
    ///
    /// # Safety
    /// `this` must come from an `ExtensionRef` (or `into_raw`) of a live
    /// object, and the caller must own the count being released.
    pub unsafe fn release(this: NonNull<Self>) -> u32 {
        let previous = this.as_ref().references.fetch_sub(1, Ordering::Release);
        if previous != 1 {
            return previous - 1;
        }

        atomic::fence(Ordering::Acquire);
        drop(Box::from_raw(this.as_ptr()));
        0
    }

    /// Copies the host data path and runs the extension's `on_initialize`.
    pub fn initialize(&self, args: &BundleExtensionCreateArgs<'_>) -> ExtensionResult<()> {
        self.base.initialize(args)?;
        self.extension.on_initialize(&self.base, args)?;
        debug!(
            "event=extension_initialize module=extension status=ok engine_api_version={}",
            args.engine_api_version
        );
        Ok(())
    }

    pub fn search(&self, request: &SearchRequest<'_>) -> ExtensionResult<()> {
        self.extension.search(&self.base, request)
    }

    pub fn bundle_extension_proc(
        &self,
        message: BundleExtensionMessage,
        call: &mut ProcCall<'_>,
    ) -> ExtensionResult<()> {
        self.extension.bundle_extension_proc(&self.base, message, call)
    }
}

impl<E: BundleExtension> Drop for ExtensionObject<E> {
    fn drop(&mut self) {
        debug!(
            "event=extension_destroy module=extension status=ok type={}",
            std::any::type_name::<E>()
        );
    }
}

/// Owning handle to an `ExtensionObject`: one count per handle.
///
/// `Clone` adds a count, `Drop` releases it.
pub struct ExtensionRef<E: BundleExtension> {
    ptr: NonNull<ExtensionObject<E>>,
    _owns: PhantomData<ExtensionObject<E>>,
}

unsafe impl<E: BundleExtension> Send for ExtensionRef<E> {}
unsafe impl<E: BundleExtension> Sync for ExtensionRef<E> {}

impl<E: BundleExtension> ExtensionRef<E> {
    /// Capability query returning a new co-owning handle.
    ///
    /// Unsupported ids leave the count unchanged.
    pub fn query_interface(&self, iid: &InterfaceId) -> ExtensionResult<ExtensionRef<E>> {
        match Capability::from_interface_id(iid) {
            Some(capability) => {
                let handle = self.clone();
                trace!(
                    "event=query_interface module=extension status=ok capability={}",
                    capability.as_str()
                );
                Ok(handle)
            }
            None => Err(ExtensionError::NoSuchInterface(iid.to_string())),
        }
    }

    /// Capability query with host output-slot semantics.
    ///
    /// `None` slot fails with `InvalidArgument` and touches nothing.
    /// Otherwise the slot is cleared first and receives a handle on success.
    pub fn query_interface_into(
        &self,
        iid: &InterfaceId,
        slot: Option<&mut Option<ExtensionRef<E>>>,
    ) -> Status {
        let Some(slot) = slot else {
            return Status::InvalidArgument;
        };
        *slot = None;
        match self.query_interface(iid) {
            Ok(handle) => {
                *slot = Some(handle);
                Status::Success
            }
            Err(err) => Status::from(err),
        }
    }

    /// Releases this handle's count and returns the new value.
    pub fn release(this: Self) -> u32 {
        let ptr = Self::into_non_null(this);
        unsafe { ExtensionObject::release(ptr) }
    }

    /// Gives up ownership without releasing.
    pub fn into_raw(this: Self) -> *mut ExtensionObject<E> {
        Self::into_non_null(this).as_ptr()
    }

    /// Adopts one count previously leaked with `into_raw` or `add_ref`.
    ///
    /// # Safety
    /// `ptr` must point to a live object and the caller must own the count.
    pub unsafe fn from_raw(ptr: *mut ExtensionObject<E>) -> Self {
        Self {
            ptr: NonNull::new_unchecked(ptr),
            _owns: PhantomData,
        }
    }

    /// Borrows a raw pointer as a handle without taking or releasing a count.
    ///
    /// # Safety
    /// Same as `from_raw`; the count stays owned by whoever owned it before.
    pub unsafe fn borrow_raw(ptr: *mut ExtensionObject<E>) -> ManuallyDrop<Self> {
        ManuallyDrop::new(Self::from_raw(ptr))
    }

    pub fn as_non_null(this: &Self) -> NonNull<ExtensionObject<E>> {
        this.ptr
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.ptr == b.ptr
    }

    fn into_non_null(this: Self) -> NonNull<ExtensionObject<E>> {
        ManuallyDrop::new(this).ptr
    }
}

impl<E: BundleExtension> Clone for ExtensionRef<E> {
    fn clone(&self) -> Self {
        self.add_ref();
        Self {
            ptr: self.ptr,
            _owns: PhantomData,
        }
    }
}

impl<E: BundleExtension> Drop for ExtensionRef<E> {
    fn drop(&mut self) {
        unsafe {
            ExtensionObject::release(self.ptr);
        }
    }
}

impl<E: BundleExtension> Deref for ExtensionRef<E> {
    type Target = ExtensionObject<E>;

    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}

impl<E: BundleExtension> Debug for ExtensionRef<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRef")
            .field("ptr", &self.ptr)
            .field("references", &self.reference_count())
            .field("base", self.base())
            .finish()
    }
}
