mod common;

use bext_core::{
    encode_wide, BundleExtension, BundleExtensionCreateArgs, ExtensionBase, ExtensionConfig,
    ExtensionError, ExtensionObject, ExtensionRef, ExtensionResult, Status,
};
use common::{CountingEngine, DropProbe};
use std::sync::atomic::{AtomicU64, Ordering};

#[test]
fn initialize_copies_exact_data_path() {
    let engine = CountingEngine::with_count(0);
    let (probe, _drops) = DropProbe::new();
    let object = ExtensionObject::new(engine, probe);
    assert_eq!(object.data_path(), None);

    let text = "C:\\ProgramData\\Package Cache\\{guid}\\extensions\\Util.ü";
    let wide = encode_wide(text);
    object
        .initialize(&BundleExtensionCreateArgs::new(2, Some(&wide)))
        .expect("initialize");
    drop(wide);

    assert_eq!(object.data_path(), Some(text));
    assert_eq!(object.base().data_path(), Some(text));
}

#[test]
fn oversized_data_path_is_allocation_failure_and_object_stays_releasable() {
    let engine = CountingEngine::with_count(0);
    let (probe, drops) = DropProbe::new();
    let config = ExtensionConfig {
        max_data_path_units: 8,
        ..ExtensionConfig::default()
    };
    let object = ExtensionObject::with_config(engine.clone(), probe, &config);

    let wide = encode_wide("C:\\far\\too\\long");
    let err = object
        .initialize(&BundleExtensionCreateArgs::new(1, Some(&wide)))
        .expect_err("path over the limit");
    assert_eq!(Status::from(&err), Status::AllocationFailure);
    assert_eq!(object.data_path(), None);

    assert_eq!(ExtensionRef::release(object), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(engine.count(), 0);
}

#[test]
fn null_or_malformed_data_path_is_copy_failure() {
    let engine = CountingEngine::with_count(0);
    let (probe, _drops) = DropProbe::new();
    let object = ExtensionObject::new(engine, probe);

    let err = object
        .initialize(&BundleExtensionCreateArgs::new(1, None))
        .expect_err("null data path");
    assert_eq!(Status::from(&err), Status::CopyFailure);

    let malformed = [0x0043_u16, 0x003A, 0xDC00];
    let err = object
        .initialize(&BundleExtensionCreateArgs::new(1, Some(&malformed)))
        .expect_err("unpaired surrogate");
    assert!(matches!(err, ExtensionError::CopyFailed { .. }));
    assert_eq!(object.data_path(), None);

    let wide = encode_wide("D:\\ok");
    object
        .initialize(&BundleExtensionCreateArgs::new(1, Some(&wide)))
        .expect("initialize after failures");
    assert_eq!(object.data_path(), Some("D:\\ok"));
}

#[test]
fn second_initialize_is_rejected_and_keeps_first_path() {
    let engine = CountingEngine::with_count(0);
    let (probe, _drops) = DropProbe::new();
    let object = ExtensionObject::new(engine, probe);

    let first = encode_wide("C:\\first");
    let second = encode_wide("C:\\second");
    object
        .initialize(&BundleExtensionCreateArgs::new(1, Some(&first)))
        .expect("first initialize");
    let err = object
        .initialize(&BundleExtensionCreateArgs::new(1, Some(&second)))
        .expect_err("second initialize");
    assert_eq!(err, ExtensionError::AlreadyInitialized);
    assert_eq!(Status::from(err), Status::Unexpected);
    assert_eq!(object.data_path(), Some("C:\\first"));
}

#[derive(Default)]
struct VersionGate {
    seen_version: AtomicU64,
}

impl BundleExtension for VersionGate {
    fn on_initialize(
        &self,
        base: &ExtensionBase,
        args: &BundleExtensionCreateArgs<'_>,
    ) -> ExtensionResult<()> {
        assert!(base.data_path().is_some(), "base copies before the hook runs");
        self.seen_version
            .store(args.engine_api_version, Ordering::SeqCst);
        if args.engine_api_version == 0 {
            return Err(ExtensionError::NotImplemented("engine api version 0"));
        }
        Ok(())
    }
}

#[test]
fn initialize_hook_runs_after_base_copy_and_can_fail() {
    let engine = CountingEngine::with_count(0);
    let object = ExtensionObject::new(engine, VersionGate::default());
    let wide = encode_wide("C:\\gate");

    let err = object
        .initialize(&BundleExtensionCreateArgs::new(0, Some(&wide)))
        .expect_err("hook rejects version 0");
    assert_eq!(Status::from(err), Status::NotImplemented);
    assert_eq!(object.extension().seen_version.load(Ordering::SeqCst), 0);
    assert_eq!(object.data_path(), Some("C:\\gate"));
}

#[test]
fn initialize_hook_sees_engine_api_version() {
    let engine = CountingEngine::with_count(0);
    let object = ExtensionObject::new(engine, VersionGate::default());
    let wide = encode_wide("C:\\gate");

    object
        .initialize(&BundleExtensionCreateArgs::new(7, Some(&wide)))
        .expect("hook accepts version 7");
    assert_eq!(object.extension().seen_version.load(Ordering::SeqCst), 7);
}
