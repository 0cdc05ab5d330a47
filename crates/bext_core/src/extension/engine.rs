//! Host engine handle owned by an extension object.
//!
//! # Invariants
//! - An `EngineRef` holds exactly one host count: acquired in `acquire`,
//!   returned in `Drop`.
//! - The base layer never calls any engine operation besides the count pair.

use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Reference-counted handle to the installer engine hosting the extension.
///
/// Implementations must be callable from any thread.
pub trait BundleExtensionEngine: Send + Sync {
    /// Increments the host count and returns the new value.
    fn add_ref(&self) -> u32;

    /// Decrements the host count and returns the new value.
    fn release(&self) -> u32;
}

/// Owned count on a host engine.
pub struct EngineRef {
    engine: Arc<dyn BundleExtensionEngine>,
}

impl EngineRef {
    /// Takes a count on `engine` for the lifetime of the returned value.
    pub fn acquire(engine: Arc<dyn BundleExtensionEngine>) -> Self {
        let count = engine.add_ref();
        trace!("event=engine_acquire module=engine status=ok count={count}");
        Self { engine }
    }
}

impl Drop for EngineRef {
    fn drop(&mut self) {
        let count = self.engine.release();
        trace!("event=engine_release module=engine status=ok count={count}");
    }
}

impl Debug for EngineRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRef").finish_non_exhaustive()
    }
}
