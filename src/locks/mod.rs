//! # Locks
//!
//! Boolean permission predicates. [`expr`] parses and evaluates lock keys,
//! [`store`] holds per-object overrides, and [`evaluator`] picks which key
//! applies to a given object and lock type.

pub mod evaluator;
pub mod expr;
pub mod store;

pub use evaluator::LockEvaluator;
pub use expr::{IdentityCheck, LockExpr, LockExpressionEngine, LockParseError, LockToken};
pub use store::{InMemoryLockStore, LockStore};
