//! # System Interaction Layer
//!
//! The boundary between the completion core and the operating system.
//!
//! - **`executor`**: spawns external programs for exec based completions,
//!   passing a per-request environment overlay and capturing their output.
//! - **`shell`**: encodes resolved completions for each supported shell and
//!   generates the snippets that hook the host program into those shells.

pub mod executor;
pub mod shell;
