// tests/action_algebra.rs

use quiver::{Action, Context, InvokedAction, RawValue};

fn values(invoked: &InvokedAction) -> Vec<&str> {
    invoked.raw_values().iter().map(|v| v.value.as_str()).collect()
}

#[test]
fn values_with_no_space() {
    let invoked = Action::values(["a", "b"]).no_space().invoke(&Context::default());
    assert_eq!(values(&invoked), vec!["a", "b"]);
    assert!(invoked.nospace());
    assert!(!invoked.skipcache());
}

#[test]
fn default_context_resolves() {
    let action = Action::callback(|c| {
        assert!(c.args.is_empty() && c.parts.is_empty() && c.env.is_empty());
        Action::values([c.callback_value.clone()])
    });
    assert_eq!(values(&action.invoke(&Context::default())), vec![""]);
}

#[test]
fn self_referencing_callback_hits_depth_bound() {
    fn looping() -> Action {
        Action::callback(|_| looping())
    }
    let invoked = looping().no_space().invoke(&Context::default());
    assert_eq!(invoked.raw_values().len(), 1);
    assert!(invoked.raw_values()[0].is_diagnostic());
    assert!(invoked.raw_values()[0].description.contains("maximum recursion depth exceeded"));
}

#[test]
fn no_space_survives_every_transform() {
    let action = Action::values(["a"])
        .no_space()
        .style("red")
        .style_f(|_| "blue".to_string())
        .suppress(["x"]);
    let invoked = action.invoke(&Context::default());
    assert!(invoked.nospace());
    assert_eq!(invoked.raw_values()[0].style, "blue");

    let wrapped = Action::callback(move |c| invoked.clone().to_action().style("green").invoke(c).into_action());
    assert!(wrapped.invoke(&Context::default()).nospace());
}

#[test]
fn suppress_removes_diagnostics_and_separators_together() {
    let rows = || {
        Action::raw_values(vec![
            RawValue::diagnostic("file not found", ""),
            RawValue::separator(""),
        ])
    };
    let suppressed = rows().suppress(["not found"]).invoke(&Context::default());
    assert!(suppressed.raw_values().is_empty());

    let untouched = rows().suppress(["other pattern"]).invoke(&Context::default());
    assert_eq!(untouched.raw_values().len(), 2);
}

#[test]
fn export_and_import_round_trip_through_json() {
    let original = Action::values(["positional1", "p1"]).no_space();
    let json = original.invoke(&Context::default()).export_json();
    assert_eq!(
        Action::import(json.as_bytes()).invoke(&Context::default()),
        original.invoke(&Context::default())
    );
}

#[test]
fn multi_parts_with_filter_and_merge() {
    let action = Action::multi_parts(",", |c| {
        let parts = c.parts.clone();
        Action::callback(move |c| {
            Action::values(["red", "green", "blue"])
                .invoke(c)
                .filter(&parts)
                .into_action()
        })
    });
    let invoked = action.invoke(&Context::new("red,green,b"));
    assert_eq!(values(&invoked), vec!["red,green,blue"]);

    let merged = invoked.merge([Action::values(["other"]).no_space().invoke(&Context::default())]);
    assert_eq!(values(&merged), vec!["red,green,blue", "other"]);
    assert!(merged.nospace());
}

#[cfg(unix)]
#[test]
fn exec_command_sees_env_overlay_only_in_child() {
    let find = |key: &'static str| {
        Action::exec_command("env", Vec::<String>::new(), move |output| {
            let text = String::from_utf8_lossy(output);
            let found: Vec<String> = text
                .lines()
                .filter(|line| line.starts_with(key))
                .map(str::to_string)
                .collect();
            Action::values(found)
        })
    };

    let without = find("QUIVER_ALGEBRA_ENV=").invoke(&Context::default());
    assert!(without.raw_values().is_empty());

    let with = find("QUIVER_ALGEBRA_ENV=")
        .invoke(&Context::default().setenv("QUIVER_ALGEBRA_ENV", "test"));
    assert_eq!(values(&with), vec!["QUIVER_ALGEBRA_ENV=test"]);
    assert!(std::env::var("QUIVER_ALGEBRA_ENV").is_err());
}

#[cfg(unix)]
#[test]
fn exec_line_splits_quoted_arguments() {
    let action = Action::exec_line("printf '%s\\n' 'a b' c", |output| {
        Action::values(String::from_utf8_lossy(output).lines().map(str::to_string).collect::<Vec<_>>())
    });
    assert_eq!(values(&action.invoke(&Context::default())), vec!["a b", "c"]);

    let broken = Action::exec_line("echo 'unterminated", |_| Action::values(["never"]));
    let invoked = broken.invoke(&Context::default());
    assert!(invoked.raw_values()[0].is_diagnostic());
}

#[cfg(unix)]
#[test]
fn exec_command_in_runs_child_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let before = std::env::current_dir().unwrap();
    let action = Action::exec_command_in(dir.path().to_str().unwrap(), "pwd", ["-P"], |output| {
        Action::values([String::from_utf8_lossy(output).trim().to_string()])
    });

    let expected = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(
        values(&action.invoke(&Context::default())),
        vec![expected.to_str().unwrap()]
    );
    assert_eq!(std::env::current_dir().unwrap(), before);

    let missing = Action::exec_command_in(
        dir.path().join("missing").to_str().unwrap(),
        "pwd",
        Vec::<String>::new(),
        |_| Action::values(["never"]),
    );
    assert!(missing.invoke(&Context::default()).raw_values()[0].is_diagnostic());
}
