include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use crate::core::action::{Action, ActionMap, CompletionCallback};
pub use crate::core::cache::{CacheStore, Key};
pub use crate::core::context::Context;
pub use crate::core::invoked::InvokedAction;
pub use crate::core::registry::Registry;
pub use crate::models::{RawValue, RawValues};
pub use crate::system::shell::Shell;
