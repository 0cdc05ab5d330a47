#![allow(dead_code)]

use bext_core::{BundleExtension, BundleExtensionEngine};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Host engine double that only tracks its count.
pub struct CountingEngine {
    references: AtomicU32,
}

impl CountingEngine {
    pub fn with_count(initial: u32) -> Arc<Self> {
        Arc::new(Self {
            references: AtomicU32::new(initial),
        })
    }

    pub fn count(&self) -> u32 {
        self.references.load(Ordering::SeqCst)
    }
}

impl BundleExtensionEngine for CountingEngine {
    fn add_ref(&self) -> u32 {
        self.references.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        self.references.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

/// Extension with default behavior that records when it is dropped.
pub struct DropProbe {
    drops: Arc<AtomicUsize>,
}

impl DropProbe {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                drops: drops.clone(),
            },
            drops,
        )
    }
}

impl BundleExtension for DropProbe {}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
