// src/core/action.rs

//! # Actions
//!
//! An [`Action`] describes how to complete a flag or positional argument. It is
//! either a static list of candidates or a deferred callback producing another
//! Action from a [`Context`]. Operators (`no_space`, `style`, `chdir`,
//! `suppress`, `cache`, ...) never mutate an Action; they wrap it in a new
//! callback that resolves the original and post-processes the result.
//!
//! [`Action::invoke`] resolves the chain with a bounded depth and always
//! returns an [`InvokedAction`]. Errors are reported as diagnostic rows (see
//! [`Action::message`]), never as a `Result`.

use crate::constants::{MAX_RECURSION_DEPTH, RECURSION_EXCEEDED_MESSAGE};
use crate::core::cache::{CacheStore, Key};
use crate::core::context::Context;
use crate::core::invoked::InvokedAction;
use crate::core::{paths, style_config};
use crate::models::{RawValue, RawValues};
use regex::Regex;
use std::cell::Cell;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

/// Executed during completion of the associated flag or positional argument.
pub type CompletionCallback = Arc<dyn Fn(&Context) -> Action + Send + Sync>;

/// Maps Actions to an identifier (e.g. flag names).
pub type ActionMap = HashMap<String, Action>;

thread_local! {
    /// Depth left to a callback that is currently running, so that an
    /// `invoke` nested inside it continues the same budget.
    static REMAINING_DEPTH: Cell<Option<usize>> = const { Cell::new(None) };
}

#[derive(Clone)]
enum ActionKind {
    Static(RawValues),
    Deferred(CompletionCallback),
}

/// A possibly deferred description of completion candidates.
#[derive(Clone)]
pub struct Action {
    kind: ActionKind,
    nospace: bool,
    skipcache: bool,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Action");
        match &self.kind {
            ActionKind::Static(values) => s.field("values", values),
            ActionKind::Deferred(_) => s.field("callback", &"<deferred>"),
        };
        s.field("nospace", &self.nospace)
            .field("skipcache", &self.skipcache)
            .finish()
    }
}

impl Default for Action {
    /// No candidates.
    fn default() -> Self {
        Self::raw_values(Vec::new())
    }
}

// --- CONSTRUCTORS ---

impl Action {
    /// Candidates from plain values.
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::raw_values(values.into_iter().map(RawValue::new).collect())
    }

    /// Candidates from `(value, description)` pairs.
    pub fn values_described<I, V, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (V, D)>,
        V: Into<String>,
        D: Into<String>,
    {
        Self::raw_values(
            pairs
                .into_iter()
                .map(|(value, description)| RawValue::described(value, description))
                .collect(),
        )
    }

    /// Candidates from `(value, style)` pairs.
    pub fn styled_values<I, V, St>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (V, St)>,
        V: Into<String>,
        St: Into<String>,
    {
        Self::raw_values(
            pairs
                .into_iter()
                .map(|(value, style)| RawValue::styled(value, "", style))
                .collect(),
        )
    }

    /// Candidates from `(value, description, style)` triples.
    pub fn styled_values_described<I, V, D, St>(triples: I) -> Self
    where
        I: IntoIterator<Item = (V, D, St)>,
        V: Into<String>,
        D: Into<String>,
        St: Into<String>,
    {
        Self::raw_values(
            triples
                .into_iter()
                .map(|(value, description, style)| RawValue::styled(value, description, style))
                .collect(),
        )
    }

    /// A static Action over fully built candidates.
    pub fn raw_values(values: RawValues) -> Self {
        Self {
            kind: ActionKind::Static(values),
            nospace: false,
            skipcache: false,
        }
    }

    /// A deferred Action computed when the completion is requested.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Self + Send + Sync + 'static,
    {
        Self {
            kind: ActionKind::Deferred(Arc::new(f)),
            nospace: false,
            skipcache: false,
        }
    }

    /// A single diagnostic row carrying `msg`.
    ///
    /// Diagnostics are never written to the cache.
    pub fn message(msg: impl Into<String>) -> Self {
        let row = RawValue::diagnostic(msg, style_config::current().error.clone());
        Self::raw_values(vec![row]).skip_cache()
    }

    /// Whether this Action holds candidates rather than a callback.
    pub fn is_static(&self) -> bool {
        matches!(self.kind, ActionKind::Static(_))
    }

    /// Marks the result as not to be persisted by an enclosing
    /// [`cache`](Self::cache).
    pub fn skip_cache(self) -> Self {
        self.with_flags(false, true)
    }

    /// Disables the space the shell would insert after a candidate.
    pub fn no_space(self) -> Self {
        self.with_flags(true, false)
    }

    /// ORs the flags in. A flag, once set, is never cleared.
    pub(crate) fn with_flags(mut self, nospace: bool, skipcache: bool) -> Self {
        self.nospace |= nospace;
        self.skipcache |= skipcache;
        self
    }
}

// --- RESOLUTION ---

impl Action {
    /// Resolves the Action, running callbacks (and the callbacks they return)
    /// until a static list of candidates is reached.
    ///
    /// At most [`MAX_RECURSION_DEPTH`] nested callbacks are expanded; beyond
    /// that the result is a single "maximum recursion depth exceeded" row.
    /// Invoking from inside a callback (as every operator does) counts against
    /// the depth of the enclosing resolution.
    pub fn invoke(&self, c: &Context) -> InvokedAction {
        // Every field of a Context is an owned sequence, so there is nothing to
        // normalize beyond handing resolution its own copy.
        let context = c.clone();
        let depth = REMAINING_DEPTH.get().unwrap_or(MAX_RECURSION_DEPTH);
        self.resolve(&context, depth)
    }

    fn resolve(&self, c: &Context, depth: usize) -> InvokedAction {
        match &self.kind {
            ActionKind::Static(values) => {
                InvokedAction::new(values.clone(), self.nospace, self.skipcache)
            }
            ActionKind::Deferred(_) if depth == 0 => {
                log::debug!("Giving up on a callback chain deeper than {}", MAX_RECURSION_DEPTH);
                Self::message(RECURSION_EXCEEDED_MESSAGE).resolve(c, 0)
            }
            ActionKind::Deferred(callback) => {
                let outer = REMAINING_DEPTH.replace(Some(depth - 1));
                let _restore = scopeguard::guard(outer, |outer| REMAINING_DEPTH.set(outer));
                callback(c)
                    .resolve(c, depth - 1)
                    .with_flags(self.nospace, self.skipcache)
            }
        }
    }
}

// --- OPERATORS ---

impl Action {
    /// Assigns `style` to every candidate.
    pub fn style(self, style: impl Into<String>) -> Self {
        let style = style.into();
        self.style_f(move |_| style.clone())
    }

    /// Assigns `f(value)` as style to every candidate.
    pub fn style_f<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::callback(move |c| {
            let mut invoked = self.invoke(c);
            for value in invoked.raw_values.iter_mut() {
                value.style = f(&value.value);
            }
            invoked.into_action()
        })
    }

    /// Resolves the Action with `dir` as working directory.
    ///
    /// `~` expands to the home directory; an empty `dir` or `.` leaves the
    /// Action as is. The previous working directory is restored before this
    /// Action's resolution returns, including when the wrapped Action panics.
    pub fn chdir(self, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        Self::callback(move |c| {
            if dir.is_empty() || dir == "." {
                return self.clone();
            }

            let target = match paths::expand_home(&dir) {
                Ok(target) => target,
                Err(e) => return Self::message(e.to_string()),
            };
            match fs::metadata(&target) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Self::message(format!("{} is not a directory", target.display())),
                Err(e) => return Self::message(format!("{}: {}", target.display(), e)),
            }

            let current = match env::current_dir() {
                Ok(current) => current,
                Err(e) => return Self::message(e.to_string()),
            };
            if let Err(e) = env::set_current_dir(&target) {
                return Self::message(format!("{}: {}", target.display(), e));
            }
            log::debug!("Changed directory to '{}'", target.display());

            // Only fires if the wrapped Action unwinds.
            let guard = scopeguard::guard(current, |original| {
                if let Err(e) = env::set_current_dir(&original) {
                    log::warn!("Failed to restore directory '{}': {}", original.display(), e);
                }
            });

            let invoked = self.invoke(c);

            let original = scopeguard::ScopeGuard::into_inner(guard);
            if let Err(e) = env::set_current_dir(&original) {
                return Self::message(format!("{}: {}", original.display(), e));
            }
            invoked.into_action()
        })
    }

    /// Removes every diagnostic and separator row when at least one diagnostic
    /// matches one of the regular expressions.
    ///
    /// All-or-nothing: either the whole sentinel channel of this resolution is
    /// dropped or nothing is. An invalid expression turns the resolution into
    /// a diagnostic describing the compile error.
    pub fn suppress<I, S>(self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled: Result<Vec<Regex>, String> = expressions
            .into_iter()
            .map(|expr| Regex::new(expr.as_ref()).map_err(|e| e.to_string()))
            .collect();

        Self::callback(move |c| {
            let expressions = match &compiled {
                Ok(expressions) => expressions,
                Err(e) => return Self::message(e.clone()),
            };

            let mut invoked = self.invoke(c);
            let matched = invoked
                .raw_values
                .iter()
                .filter(|value| value.is_diagnostic())
                .any(|value| expressions.iter().any(|r| r.is_match(&value.description)));

            if matched {
                invoked.raw_values.retain(|value| !value.is_sentinel());
            }
            invoked.into_action()
        })
    }

    /// Caches the resolved values of a deferred Action for `timeout`.
    ///
    /// The cache identity is the source location of this call plus `keys`, so
    /// every call site gets its own entries. Static Actions are returned as is.
    #[track_caller]
    pub fn cache<I>(self, timeout: Duration, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        self.cached(None, call_site(), timeout, keys)
    }

    /// Like [`cache`](Self::cache) using `store` instead of the default cache
    /// directory. The site is still the location of this call.
    #[track_caller]
    pub fn cache_with_store<I>(self, store: CacheStore, timeout: Duration, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        self.cached(Some(store), call_site(), timeout, keys)
    }

    /// Like [`cache`](Self::cache) with an explicit site identifier.
    pub fn cache_at<I>(self, site: &str, timeout: Duration, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        self.cached(None, site.to_string(), timeout, keys)
    }

    /// Like [`cache_at`](Self::cache_at) using `store` instead of the default
    /// cache directory.
    pub fn cache_in<I>(self, store: CacheStore, site: &str, timeout: Duration, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        self.cached(Some(store), site.to_string(), timeout, keys)
    }

    fn cached<I>(self, store: Option<CacheStore>, site: String, timeout: Duration, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let ActionKind::Deferred(callback) = &self.kind else {
            return self;
        };
        let wrapped = Self {
            kind: ActionKind::Deferred(Arc::clone(callback)),
            nospace: false,
            skipcache: false,
        };
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();

        let cached = move |c: &Context| -> Self {
            let located = match &store {
                Some(store) => Ok(store.clone()),
                None => CacheStore::default_location(),
            }
            .and_then(|store| store.file(&site, &keys).map(|file| (store, file)));

            let (store, file) = match located {
                Ok(located) => located,
                Err(e) => {
                    log::debug!("Cache unavailable for '{}': {}", site, e);
                    return wrapped.clone();
                }
            };

            match store.load_entry(&file, timeout) {
                Ok(entry) => {
                    log::debug!("Cache hit for '{}' at '{}'", site, file.display());
                    return Self::raw_values(entry.values).with_flags(entry.nospace, false);
                }
                Err(e) => log::debug!("Cache miss for '{}': {}", site, e),
            }

            let invoked = wrapped.invoke(c);
            if !invoked.skipcache
                && let Err(e) = store.write_entry(&file, &invoked.raw_values, invoked.nospace)
            {
                log::debug!("Could not write cache '{}': {}", file.display(), e);
            }
            invoked.into_action()
        };

        Self {
            kind: ActionKind::Deferred(Arc::new(cached)),
            ..self
        }
    }
}

/// `file:line` of the code calling the `#[track_caller]` function this is
/// called from.
#[track_caller]
fn call_site() -> String {
    let location = Location::caller();
    format!("{}:{}", location.file(), location.line())
}
