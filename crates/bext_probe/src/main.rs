//! Lifecycle smoke probe.
//!
//! # Responsibility
//! - Verify `bext_core` linkage without a host engine.
//! - Walk one extension through create, query, initialize and release,
//!   printing deterministic counts.
//!
//! Usage: `bext_probe [log_dir]`. With `log_dir`, file logging starts at the
//! `BEXT_LOG_LEVEL` level before the walk.

use bext_core::{
    encode_wide, init_logging_with_config, logging_status, BundleExtension,
    BundleExtensionCreateArgs, BundleExtensionEngine, ExtensionConfig, ExtensionObject,
    ExtensionRef, SearchRequest, Status, IID_BUNDLE_EXTENSION,
};
use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct ProbeEngine(AtomicU32);

impl BundleExtensionEngine for ProbeEngine {
    fn add_ref(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        self.0.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

struct ProbeExtension;

impl BundleExtension for ProbeExtension {}

fn main() -> ExitCode {
    let config = match ExtensionConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bext_probe config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = std::env::args().nth(1) {
        if let Err(err) = init_logging_with_config(&config, &log_dir) {
            eprintln!("bext_probe logging error: {err}");
            return ExitCode::FAILURE;
        }
        if let Some((level, dir)) = logging_status() {
            println!("logging level={level} log_dir={}", dir.display());
        }
    }

    println!("bext_core version={}", bext_core::core_version());

    let engine = Arc::new(ProbeEngine(AtomicU32::new(1)));
    let object = ExtensionObject::with_config(engine.clone(), ProbeExtension, &config);
    println!(
        "create engine_refs={} extension_refs={}",
        engine.0.load(Ordering::SeqCst),
        object.reference_count()
    );

    let queried = match object.query_interface(&IID_BUNDLE_EXTENSION) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("query_interface failed: {}", Status::from(err));
            return ExitCode::FAILURE;
        }
    };
    println!("query extension_refs={}", object.reference_count());

    let data_path = std::env::temp_dir().join("bext_probe");
    let wide = encode_wide(&data_path.to_string_lossy());
    let status =
        Status::from_result(&object.initialize(&BundleExtensionCreateArgs::new(1, Some(&wide))));
    println!(
        "initialize status={status} data_path={}",
        object.data_path().unwrap_or("<unset>")
    );

    let search = Status::from_result(&object.search(&SearchRequest::new("probe", "ProbeVariable")));
    println!("search status={search}");

    println!("release extension_refs={}", ExtensionRef::release(queried));
    println!("release extension_refs={}", ExtensionRef::release(object));
    println!("destroy engine_refs={}", engine.0.load(Ordering::SeqCst));

    if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
