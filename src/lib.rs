//! # mushcode - Softcode Engine for Text Worlds
//!
//! mushcode parses and evaluates the softcode used by MUSH-style multi-user
//! text worlds: player commands, bracketed function calls, `%` substitutions
//! and boolean lock keys.
//!
//! ## Features
//!
//! - **Command Parsing**: `;`-separated lines, `/switch` lists, `target=argument` splits and the `"` `:` `;` shorthands.
//! - **Expression Evaluation**: nested `[function(args)]` calls, `%0`, `%1`, ... `%N` positional arguments (any digit run), `%q` registers and `\` escapes, with a depth ceiling and cooperative cancellation.
//! - **Function Registry**: catalog-driven arity checks and aliases over math, string, register and attribute builtins.
//! - **Lock Keys**: `&`/`|`/`!` expressions over dbrefs with per-object overrides and catalog defaults.
//! - **Metadata Catalogs**: functions, locks and commands described in JSON, embedded by default and replaceable from config.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use mushcode::engine::{standard_evaluator, ExecutionContext};
//! use mushcode::metadata::MetadataCatalogs;
//! use mushcode::world::InMemoryWorld;
//!
//! # fn main() -> anyhow::Result<()> {
//! let catalogs = MetadataCatalogs::embedded()?;
//! let evaluator = standard_evaluator(catalogs.functions, Arc::new(InMemoryWorld::new()), 50);
//! let mut ctx = ExecutionContext::new(1, Some("World"));
//! assert_eq!(evaluator.evaluate(&mut ctx, "Hello, [upcase(%0)]!")?, "Hello, WORLD!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - command parser, function dispatch and expression evaluation
//! - [`commands`] - runs parsed lines through the command catalog
//! - [`locks`] - lock key parsing, storage and evaluation
//! - [`metadata`] - function, lock and command catalogs
//! - [`world`] - object and attribute lookup used by `get()`/`xget()`
//! - [`config`] - configuration management and validation
//! - [`logutil`] - log-safe rendering of player input
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ CommandProcessor │ ← line → invocations → handler
//! └──────────────────┘
//!          │
//! ┌──────────────────┐
//! │ ExpressionEval.  │ ← brackets, %-substitutions, escapes
//! └──────────────────┘
//!          │
//! ┌──────────────────┐
//! │ FunctionRegistry │ ← builtins checked against the catalog
//! └──────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod engine;
pub mod locks;
pub mod logutil;
pub mod metadata;
pub mod world;
