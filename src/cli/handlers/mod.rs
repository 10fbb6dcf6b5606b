// src/cli/handlers/mod.rs

// One module per `_quiver` subcommand.

pub mod cache;
pub mod complete;
pub mod snippet;
pub mod styles;
