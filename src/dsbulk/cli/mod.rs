//! # CLI Layer
//!
//! One possible client of the library. This is the only place that:
//! - parses shell arguments (clap, in `setup.rs`)
//! - finds the config and repository files and opens the session
//! - writes to stdout/stderr
//!
//! Projected lines go to stdout and nothing else does, so output can be
//! piped straight into other tools. Messages, warnings and logs go to
//! stderr. `main.rs` turns errors into exit codes.

mod commands;
mod print;
mod setup;

pub use commands::run;
pub use setup::{parse, usage};
