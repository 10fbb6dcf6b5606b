// tests/cache.rs

use quiver::constants::CACHE_FORMAT_VERSION;
use quiver::models::CacheEntry;
use quiver::{Action, CacheStore, Context, Key, RawValue};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::sleep;
use std::time::Duration;
use tempfile::tempdir;

fn counting(calls: &Arc<AtomicUsize>, action: Action) -> Action {
    let counter = Arc::clone(calls);
    Action::callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        action.clone()
    })
}

fn site() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[test]
fn reuses_values_within_timeout_and_refreshes_after() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["a", "b"])).cache_in(
        CacheStore::new(dir.path()),
        &site(),
        Duration::from_millis(300),
        ["key"],
    );

    let first = action.invoke(&Context::default());
    let second = action.invoke(&Context::default());
    assert_eq!(first.raw_values(), second.raw_values());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(400));
    action.invoke(&Context::default());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn sites_and_keys_separate_entries() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let timeout = Duration::from_secs(60);

    let (site_a, site_b) = (site(), site());
    counting(&calls, Action::values(["a"]))
        .cache_in(store.clone(), &site_a, timeout, ["same"])
        .invoke(&Context::default());
    let from_b = counting(&calls, Action::values(["b"]))
        .cache_in(store.clone(), &site_b, timeout, ["same"])
        .invoke(&Context::default());
    counting(&calls, Action::values(["a2"]))
        .cache_in(store.clone(), &site_a, timeout, ["other"])
        .invoke(&Context::default());

    assert_eq!(from_b.raw_values()[0].value, "b");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.entries().unwrap().len(), 3);
}

#[test]
fn skip_cache_and_diagnostics_are_not_persisted() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let timeout = Duration::from_secs(60);

    let skipped = counting(&calls, Action::values(["a"]).skip_cache())
        .cache_in(store.clone(), &site(), timeout, Vec::<Key>::new());
    skipped.invoke(&Context::default());
    skipped.invoke(&Context::default());

    let failing = counting(&calls, Action::message("boom"))
        .cache_in(store.clone(), &site(), timeout, Vec::<Key>::new());
    failing.invoke(&Context::default());
    let invoked = failing.invoke(&Context::default());

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(store.entries().unwrap().is_empty());
    assert!(invoked.raw_values()[0].is_diagnostic());
}

#[test]
fn file_checksum_key_follows_content() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path().join("cache"));
    let input = dir.path().join("input.txt");
    fs::write(&input, "one").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["x"])).cache_in(
        store,
        &site(),
        Duration::from_secs(60),
        [Key::FileChecksum(input.clone())],
    );

    action.invoke(&Context::default());
    action.invoke(&Context::default());
    fs::write(&input, "two").unwrap();
    action.invoke(&Context::default());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unreadable_key_falls_back_to_direct_invocation() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["x"])).cache_in(
        CacheStore::new(dir.path()),
        &site(),
        Duration::from_secs(60),
        [Key::FileStats(dir.path().join("missing"))],
    );

    let invoked = action.invoke(&Context::default());
    action.invoke(&Context::default());
    assert_eq!(invoked.raw_values()[0].value, "x");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn corrupt_or_outdated_entries_are_misses() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let site = site();
    let file = store.file(&site, &["k".into()]).unwrap();
    fs::create_dir_all(file.parent().unwrap()).unwrap();

    let stale = CacheEntry {
        format_version: CACHE_FORMAT_VERSION + 1,
        nospace: false,
        values: vec![RawValue::new("stale")],
    };
    let bytes = bincode::serde::encode_to_vec(&stale, bincode::config::standard()).unwrap();
    fs::write(&file, lz4_flex::compress_prepend_size(&bytes)).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["fresh"])).cache_in(
        store.clone(),
        &site,
        Duration::from_secs(60),
        ["k"],
    );
    assert_eq!(action.invoke(&Context::default()).raw_values()[0].value, "fresh");

    fs::write(&file, b"not an entry").unwrap();
    assert_eq!(action.invoke(&Context::default()).raw_values()[0].value, "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The miss rewrote a valid entry.
    assert_eq!(action.invoke(&Context::default()).raw_values()[0].value, "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn call_sites_with_identical_keys_keep_separate_entries() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let timeout = Duration::from_secs(60);

    let a = counting(&calls, Action::values(["a"])).cache_with_store(CacheStore::new(dir.path()), timeout, ["k"]);
    let b = counting(&calls, Action::values(["b"])).cache_with_store(CacheStore::new(dir.path()), timeout, ["k"]);

    assert_eq!(a.invoke(&Context::default()).raw_values()[0].value, "a");
    assert_eq!(b.invoke(&Context::default()).raw_values()[0].value, "b");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(CacheStore::new(dir.path()).entries().unwrap().len(), 2);

    // Each site now answers from its own entry.
    assert_eq!(a.invoke(&Context::default()).raw_values()[0].value, "a");
    assert_eq!(b.invoke(&Context::default()).raw_values()[0].value, "b");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn explicit_site_uses_default_location() {
    let site = site();
    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["x"])).cache_at(&site, Duration::from_secs(60), ["k"]);

    assert_eq!(action.invoke(&Context::default()).raw_values()[0].value, "x");
    assert_eq!(action.invoke(&Context::default()).raw_values()[0].value, "x");

    // Without a usable cache directory the Action still resolves, uncached.
    let Ok(store) = CacheStore::default_location() else {
        return;
    };
    let file = store.file(&site, &["k".into()]).unwrap();
    if file.exists() {
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        fs::remove_dir_all(file.parent().unwrap()).unwrap();
    }
}

#[test]
fn cache_hit_keeps_nospace() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let action = counting(&calls, Action::values(["dir/"]).no_space()).cache_in(
        CacheStore::new(dir.path()),
        &site(),
        Duration::from_secs(60),
        ["k"],
    );

    assert!(action.invoke(&Context::default()).nospace());
    let second = action.invoke(&Context::default());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(second.nospace());
    assert_eq!(second.raw_values()[0].value, "dir/");
}
