// src/core/defaults.rs

//! Ready-made Actions for common completion sources: external commands,
//! multi-part values and the filesystem.

use crate::core::action::Action;
use crate::core::context::Context;
use crate::core::{paths, style};
use crate::models::{RawValue, RawValues};
use crate::system::executor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

impl Action {
    /// Runs `program` with `args` and hands its stdout to `f`.
    ///
    /// The Context's environment overlay is passed to the child. A spawn
    /// failure or unsuccessful exit becomes a diagnostic.
    pub fn exec_command<I, S, F>(program: impl Into<String>, args: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[u8]) -> Self + Send + Sync + 'static,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        Self::callback(move |c| {
            match executor::execute_and_capture_output(&program, &args, &c.env_vars(), None) {
                Ok(output) => f(&output),
                Err(e) => Self::message(e.to_string()),
            }
        })
    }

    /// Like [`Action::exec_command`], with the child running in `dir` (`~`
    /// expanded). The working directory of this process is not changed.
    pub fn exec_command_in<I, S, F>(dir: impl Into<String>, program: impl Into<String>, args: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[u8]) -> Self + Send + Sync + 'static,
    {
        let dir = dir.into();
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        Self::callback(move |c| {
            let cwd = match paths::expand_home(&dir) {
                Ok(cwd) => cwd,
                Err(e) => return Self::message(e.to_string()),
            };
            match executor::execute_and_capture_output(&program, &args, &c.env_vars(), Some(&cwd)) {
                Ok(output) => f(&output),
                Err(e) => Self::message(e.to_string()),
            }
        })
    }

    /// Like [`Action::exec_command`], but takes a single command line split
    /// with POSIX shell quoting rules. An unparsable line becomes a diagnostic.
    pub fn exec_line<F>(command_line: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[u8]) -> Self + Send + Sync + 'static,
    {
        let command_line = command_line.into();
        Self::callback(move |c| {
            match executor::execute_line_and_capture_output(&command_line, &c.env_vars(), None) {
                Ok(output) => f(&output),
                Err(e) => Self::message(e.to_string()),
            }
        })
    }

    /// Completes a value made of parts joined by `divider` (`user@host`,
    /// `a,b,c`).
    ///
    /// `f` sees the parts already typed in [`Context::parts`] and only the
    /// last, unfinished part as `callback_value`. Its candidates are prefixed
    /// with everything typed before that part. An empty divider treats every
    /// typed character as a part.
    pub fn multi_parts<F>(divider: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context) -> Self + Send + Sync + 'static,
    {
        let divider = divider.into();
        Self::callback(move |c| {
            let (done, parts, current) = split_parts(&c.callback_value, &divider);
            let mut inner = c.clone();
            inner.parts = parts;
            inner.callback_value = current;
            f(&inner).invoke(&inner).prefix(&done).into_action()
        })
    }

    /// Files and directories below the typed path. With `suffixes`, only files
    /// ending in one of them are offered (directories always are).
    pub fn files<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suffixes: Vec<String> = suffixes.into_iter().map(Into::into).collect();
        Self::callback(move |c| list_entries(&c.callback_value, false, &suffixes))
    }

    /// Directories below the typed path.
    pub fn directories() -> Self {
        Self::callback(|c| list_entries(&c.callback_value, true, &[]))
    }
}

/// `(typed prefix, finished parts, current part)`.
fn split_parts(value: &str, divider: &str) -> (String, Vec<String>, String) {
    if divider.is_empty() {
        let parts = value.chars().map(String::from).collect();
        return (value.to_string(), parts, String::new());
    }
    match value.rsplit_once(divider) {
        Some((head, current)) => (
            format!("{}{}", head, divider),
            head.split(divider).map(str::to_string).collect(),
            current.to_string(),
        ),
        None => (String::new(), Vec::new(), value.to_string()),
    }
}

fn list_entries(typed: &str, dirs_only: bool, suffixes: &[String]) -> Action {
    let (folder, base) = match typed.rfind('/') {
        Some(idx) => typed.split_at(idx + 1),
        None => ("", typed),
    };
    let root: PathBuf = if folder.is_empty() {
        PathBuf::from(".")
    } else {
        match paths::expand_home(folder) {
            Ok(path) => path,
            Err(e) => return Action::message(e.to_string()),
        }
    };
    if !root.is_dir() {
        return Action::message(format!("{} is not a directory", root.display()));
    }
    let show_hidden = base.starts_with('.');

    let mut values = RawValues::new();
    let mut any_dir = false;
    for entry in WalkDir::new(&root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Action::message(e.to_string()),
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') && !show_hidden {
            continue;
        }

        let is_dir = entry.path().is_dir();
        if !is_dir && (dirs_only || !matches_suffix(&name, suffixes)) {
            continue;
        }

        let display = if is_dir { format!("{}/", name) } else { name };
        let style = style::for_path(&path_string(entry.path(), is_dir));
        any_dir |= is_dir;
        values.push(RawValue::styled(format!("{}{}", folder, display), "", style).with_display(display));
    }

    let action = Action::raw_values(values);
    if any_dir { action.no_space() } else { action }
}

fn matches_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.is_empty() || suffixes.iter().any(|s| name.ends_with(s.as_str()))
}

fn path_string(path: &Path, is_dir: bool) -> String {
    let mut s = path.to_string_lossy().into_owned();
    if is_dir && !s.ends_with('/') {
        s.push('/');
    }
    s
}
