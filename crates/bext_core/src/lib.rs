//! Core contract for installer bundle extensions.
//! This crate owns the lifetime and capability-query invariants that every
//! concrete extension inherits.

pub mod config;
pub mod extension;
pub mod logging;
pub mod status;

pub use config::{ConfigError, ExtensionConfig, DEFAULT_MAX_DATA_PATH_UNITS};
pub use extension::capability::{Capability, InterfaceId, IID_BUNDLE_EXTENSION, IID_OBJECT};
pub use extension::engine::{BundleExtensionEngine, EngineRef};
pub use extension::message::{
    encode_wide, BundleExtensionCreateArgs, BundleExtensionMessage, ProcCall, SearchRequest,
};
pub use extension::object::{BundleExtension, ExtensionBase, ExtensionObject, ExtensionRef};
pub use logging::{
    default_log_level, describe_panic, init_logging, init_logging_with_config, logging_status,
};
pub use status::{ExtensionError, ExtensionResult, Status};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
