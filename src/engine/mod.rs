//! # Softcode Engine
//!
//! Parsing and evaluation of softcode text:
//!
//! - [`parser`] splits raw input lines into [`Invocation`]s
//! - [`evaluator`] resolves brackets, leading calls, escapes and registers
//! - [`dispatcher`] turns `name(args)` text into a registry call
//! - [`registry`] holds the functions, arity-checked from the catalog
//! - [`registers`] carries per-command state in an [`ExecutionContext`]
//! - [`builtins`] is the standard function library
//!
//! ```rust
//! use std::sync::Arc;
//! use mushcode::engine::{standard_evaluator, ExecutionContext};
//! use mushcode::metadata::MetadataCatalogs;
//! use mushcode::world::InMemoryWorld;
//!
//! let catalogs = MetadataCatalogs::embedded().unwrap();
//! let evaluator = standard_evaluator(catalogs.functions, Arc::new(InMemoryWorld::new()), 50);
//! let mut ctx = ExecutionContext::new(1, None);
//! assert_eq!(evaluator.evaluate(&mut ctx, "[add(1,2)] apples").unwrap(), "3 apples");
//! ```

pub mod builtins;
pub mod dispatcher;
pub mod errors;
pub mod evaluator;
pub mod parser;
pub mod registers;
pub mod registry;

use std::sync::Arc;

pub use dispatcher::{FunctionDispatcher, DEFAULT_MAX_DEPTH};
pub use errors::EvalError;
pub use evaluator::ExpressionEvaluator;
pub use parser::{CommandParser, Invocation, Switch};
pub use registers::{CancelFlag, ExecutionContext, RegisterSet};
pub use registry::{Function, FunctionRegistry, FunctionRegistryBuilder};

use crate::metadata::FunctionCatalog;
use crate::world::AttributeLookup;

/// An evaluator over every builtin, arity-checked against `functions`.
pub fn standard_evaluator(
    functions: Arc<FunctionCatalog>,
    world: Arc<dyn AttributeLookup>,
    max_depth: usize,
) -> ExpressionEvaluator {
    let registry = builtins::register_all(FunctionRegistry::builder(functions), world).build();
    ExpressionEvaluator::new(Arc::new(registry)).with_max_depth(max_depth)
}
