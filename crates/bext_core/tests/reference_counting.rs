mod common;

use bext_core::{ExtensionObject, ExtensionRef, IID_BUNDLE_EXTENSION, IID_OBJECT};
use common::{CountingEngine, DropProbe};
use std::sync::atomic::Ordering;
use std::thread;

#[test]
fn construction_takes_one_engine_count_and_destruction_returns_it() {
    let engine = CountingEngine::with_count(5);
    let (probe, drops) = DropProbe::new();

    let object = ExtensionObject::new(engine.clone(), probe);
    assert_eq!(engine.count(), 6);
    assert_eq!(object.reference_count(), 1);

    assert_eq!(object.add_ref(), 2);
    assert_eq!(object.add_ref(), 3);

    let raw = ExtensionRef::as_non_null(&object);
    assert_eq!(unsafe { ExtensionObject::release(raw) }, 2);
    assert_eq!(unsafe { ExtensionObject::release(raw) }, 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(engine.count(), 6);

    assert_eq!(ExtensionRef::release(object), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(engine.count(), 5);
}

#[test]
fn destruction_waits_for_every_paired_release() {
    let engine = CountingEngine::with_count(1);
    let (probe, drops) = DropProbe::new();
    let object = ExtensionObject::new(engine.clone(), probe);

    let handles: Vec<_> = (0..8).map(|_| object.clone()).collect();
    assert_eq!(object.reference_count(), 9);

    drop(object);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    let mut remaining = handles;
    while let Some(handle) = remaining.pop() {
        let expected = remaining.len() as u32;
        assert_eq!(ExtensionRef::release(handle), expected);
        let expected_drops = usize::from(expected == 0);
        assert_eq!(drops.load(Ordering::SeqCst), expected_drops);
    }
    assert_eq!(engine.count(), 1);
}

#[test]
fn concurrent_add_ref_query_and_release_destroy_exactly_once() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 2_000;

    let engine = CountingEngine::with_count(0);
    let (probe, drops) = DropProbe::new();
    let object = ExtensionObject::new(engine.clone(), probe);

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let handle = object.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    handle.add_ref();
                    let extra = handle.clone();
                    drop(extra);
                    let object_view = handle
                        .query_interface(&IID_OBJECT)
                        .expect("object interface is always supported");
                    let extension_view = object_view
                        .query_interface(&IID_BUNDLE_EXTENSION)
                        .expect("bundle extension interface is always supported");
                    assert!(ExtensionRef::ptr_eq(&object_view, &extension_view));
                    drop(object_view);
                    ExtensionRef::release(extension_view);
                    unsafe {
                        ExtensionObject::release(ExtensionRef::as_non_null(&handle));
                    }
                }
                drop(handle);
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker thread should not panic");
    }

    assert_eq!(object.reference_count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(engine.count(), 1);

    drop(object);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(engine.count(), 0);
}

#[test]
fn last_release_on_another_thread_destroys_once() {
    let engine = CountingEngine::with_count(0);
    let (probe, drops) = DropProbe::new();
    let object = ExtensionObject::new(engine.clone(), probe);
    let moved = object.clone();
    drop(object);

    let final_count = thread::spawn(move || ExtensionRef::release(moved))
        .join()
        .expect("release thread should not panic");
    assert_eq!(final_count, 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(engine.count(), 0);
}
