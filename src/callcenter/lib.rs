//! # Call Center Architecture
//!
//! `callcenter` is a **UI-agnostic library** for an appliance-repair call
//! center: agents log service tickets, follow them through Open, Closed and
//! Recalled, and look up the matching invoices. The `callcenter` binary is
//! one client of this library, not the application itself.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, retries failed reads          │
//! │  - Owns paginators, page totals and cached feeds            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs, paging.rs, search.rs)        │
//! │  - Pure business logic                                      │
//! │  - No I/O assumptions whatsoever                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract DocumentStore trait                             │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes regular Rust arguments, returns
//! `Result<CmdResult>` or typed values, and never writes to stdout/stderr.
//! The current time is passed in wherever expiry matters so listings are
//! deterministic under test.
//!
//! ## Testing Strategy
//!
//! 1. **Commands, paging, search**: thorough unit tests against
//!    `InMemoryStore` fixtures (`store::memory::fixtures`).
//! 2. **API**: dispatch, retry and cache bookkeeping.
//! 3. **CLI**: integration tests in `tests/` running the binary against a
//!    temporary data directory.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`paging`]: Cursor-paginated listings
//! - [`search`]: Prefix search and the debouncer
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Tickets, invoices, employees, staff accounts
//! - [`validation`]: Ticket form rules
//! - [`text`]: Normalization and deadline formatting
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod paging;
pub mod search;
pub mod store;
pub mod text;
pub mod validation;
