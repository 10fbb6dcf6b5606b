// tests/chdir.rs
//
// The working directory is process-global, so every test here holds CWD_LOCK.

use lazy_static::lazy_static;
use quiver::{Action, Context, InvokedAction};
use std::env;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tempfile::{TempDir, tempdir};

lazy_static! {
    static ref CWD_LOCK: Mutex<()> = Mutex::new(());
}

fn lock() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn values(invoked: &InvokedAction) -> Vec<&str> {
    invoked.raw_values().iter().map(|v| v.value.as_str()).collect()
}

/// `a.rs`, `b.txt`, `.hidden`, `sub/`
fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), "").unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();
    fs::write(dir.path().join(".hidden"), "").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    dir
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn resolves_inside_directory_and_restores() {
    let _guard = lock();
    let dir = fixture();
    let before = env::current_dir().unwrap();

    let action = Action::callback(|_| {
        Action::values([env::current_dir().unwrap().to_string_lossy().into_owned()])
    })
    .chdir(path_str(dir.path()));
    let invoked = action.invoke(&Context::default());

    assert_eq!(
        fs::canonicalize(invoked.raw_values()[0].value.as_str()).unwrap(),
        fs::canonicalize(dir.path()).unwrap()
    );
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn failed_checks_leave_directory_alone() {
    let _guard = lock();
    let dir = fixture();
    let before = env::current_dir().unwrap();

    let missing = Action::values(["x"])
        .chdir(path_str(&dir.path().join("missing")))
        .invoke(&Context::default());
    assert_eq!(missing.messages().len(), 1);

    let not_dir = Action::values(["x"])
        .chdir(path_str(&dir.path().join("a.rs")))
        .invoke(&Context::default());
    assert!(not_dir.messages()[0].contains("is not a directory"));

    let same = Action::values(["x"]).chdir(".").invoke(&Context::default());
    assert_eq!(values(&same), vec!["x"]);
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn restores_directory_when_wrapped_action_panics() {
    let _guard = lock();
    let dir = fixture();
    let before = env::current_dir().unwrap();

    let action = Action::callback(|_| panic::resume_unwind(Box::new("boom")))
        .chdir(path_str(dir.path()));
    let result = panic::catch_unwind(AssertUnwindSafe(|| action.invoke(&Context::default())));

    assert!(result.is_err());
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn files_relative_to_changed_directory() {
    let _guard = lock();
    let dir = fixture();

    let invoked = Action::files(Vec::<String>::new())
        .chdir(path_str(dir.path()))
        .invoke(&Context::default());
    assert_eq!(values(&invoked), vec!["a.rs", "b.txt", "sub/"]);
    assert!(invoked.nospace());

    let hidden = Action::files(Vec::<String>::new())
        .chdir(path_str(dir.path()))
        .invoke(&Context::new("."));
    assert!(values(&hidden).contains(&".hidden"));
}

#[test]
fn files_by_suffix_and_directories_by_absolute_path() {
    let _guard = lock();
    let dir = fixture();
    let folder = format!("{}/", path_str(dir.path()));

    let rust = Action::files([".rs"]).invoke(&Context::new(folder.as_str()));
    assert_eq!(
        values(&rust),
        vec![format!("{}a.rs", folder).as_str(), format!("{}sub/", folder).as_str()]
    );
    assert_eq!(rust.raw_values()[0].display, "a.rs");

    let dirs = Action::directories().invoke(&Context::new(format!("{}s", folder)));
    assert_eq!(values(&dirs), vec![format!("{}sub/", folder).as_str()]);

    let missing = Action::directories().invoke(&Context::new(format!("{}nope/", folder)));
    assert_eq!(missing.messages().len(), 1);
}
