//! # dsbulk Architecture
//!
//! dsbulk walks a fixed repository content hierarchy
//! (Community → Collection → Item → Bundle → Bitstream), wraps every object
//! it reaches in an attribute target, and prints a projection of each
//! target as TXT or TSV lines. Bulk drivers (metadata edits, policy edits,
//! bitstream replacement) are built from the same pieces.
//!
//! It is a library with a CLI client, not the other way round.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, finds config and repository files      │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs) + Argument Resolution (args.rs)         │
//! │  - Validates raw options against the repository             │
//! │  - Dispatches to drivers, returns CmdResult                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Drivers (commands/*.rs)                                    │
//! │  - list, metadata, policy, replace                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine: lister.rs → target.rs → printer.rs                 │
//! │  - Hierarchy walk, lazy attribute maps, projection          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - ContentRepository + AuthorizationService traits          │
//! │  - JsonRepository (production), InMemoryRepository (tests)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing writes to stdout/stderr or exits the
//! process. Logging goes through `tracing`; the binary decides where it
//! ends up.
//!
//! ## Testing Strategy
//!
//! 1. **Engine and drivers**: unit tests next to the code, run against
//!    `InMemoryRepository` built with `store::memory::fixtures`.
//! 2. **API**: dispatch and validation order.
//! 3. **CLI**: argument parsing in `cli/setup.rs`, end-to-end runs of the
//!    binary against a JSON repository in `tests/`.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade, entry point for all operations
//! - [`args`]: command-line options and their validation
//! - [`attributes`]: attribute values and the key registry
//! - [`commands`]: the bulk drivers
//! - [`config`]: configuration file and repository path lookup
//! - [`error`]: error types
//! - [`lister`]: hierarchy walk with per-level memoization
//! - [`model`]: object types, handles, metadata fields, policies
//! - [`printer`]: TXT/TSV projection
//! - [`store`]: repository traits and implementations
//! - [`target`]: attribute targets and their arena

pub mod api;
pub mod args;
pub mod attributes;
pub mod commands;
pub mod config;
pub mod error;
pub mod lister;
pub mod model;
pub mod printer;
pub mod store;
pub mod target;
