//! Host ABI for bundle extensions written on top of `bext_core`.
//!
//! # Responsibility
//! - Expose a Rust `BundleExtension` to the installer engine as a COM-style
//!   `IBundleExtension` interface pointer.
//! - Adapt the engine's interface pointer to `BundleExtensionEngine`.
//!
//! # Invariants
//! - No Rust panic unwinds across an exported function.
//! - Status codes returned to the host come from `bext_core::Status` only.
//!
//! The plugin entry point (`BundleExtensionCreate`) belongs to each concrete
//! extension crate; it wraps `RawEngine` and calls `ComBundleExtension::create`
//! and `ComBundleExtension::initialize`, after `init_extension_logging`.

pub mod abi;
pub mod api;
pub mod engine;

pub use abi::{Guid, IBundleExtensionVtbl, RawCreateArgs, RawInterface, HRESULT};
pub use api::{init_extension_logging, init_extension_logging_from, ComBundleExtension};
pub use engine::RawEngine;
