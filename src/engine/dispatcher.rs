//! `name(arg, arg, ...)` → registry call.
//!
//! The dispatcher receives text that has already been evaluated. It never
//! evaluates arguments itself; it only splits them and invokes the function.
//! Anything that is not shaped like a call comes back unchanged.

use std::sync::Arc;

use log::trace;

use super::errors::{messages, EvalError};
use super::registers::ExecutionContext;
use super::registry::FunctionRegistry;
use crate::logutil::escape_log;

/// Default recursion ceiling for evaluate/dispatch re-entry.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Re-entry gate shared by the evaluator and dispatcher.
pub(crate) fn check_reentry(
    ctx: &ExecutionContext,
    depth: usize,
    max_depth: usize,
) -> Result<(), EvalError> {
    if ctx.is_cancelled() {
        return Err(EvalError::Cancelled);
    }
    if depth > max_depth {
        return Err(EvalError::TooDeep { limit: max_depth });
    }
    Ok(())
}

/// `[A-Za-z@_][A-Za-z0-9_@#-]*`
pub fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '@' || c == '_' => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '#' | '-')
}

/// Split an argument list on commas at paren/brace depth zero outside
/// quotes. Escapes are kept verbatim; each argument is trimmed.
pub fn split_arguments(arglist: &str) -> Vec<String> {
    if arglist.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0usize;
    let mut brace_depth = 0usize;
    let mut in_quotes = false;
    let mut chars = arglist.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                continue;
            }
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => paren_depth += 1,
            ')' if !in_quotes => paren_depth = paren_depth.saturating_sub(1),
            '{' if !in_quotes => brace_depth += 1,
            '}' if !in_quotes => brace_depth = brace_depth.saturating_sub(1),
            ',' if !in_quotes && paren_depth == 0 && brace_depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    args.push(current.trim().to_string());
    args
}

/// Resolves and invokes function calls against a [`FunctionRegistry`].
#[derive(Clone)]
pub struct FunctionDispatcher {
    registry: Arc<FunctionRegistry>,
    max_depth: usize,
}

impl FunctionDispatcher {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Dispatch `text` as a call. Text that does not end in `)` or whose
    /// head is not a function name is returned unchanged.
    pub fn dispatch(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        depth: usize,
    ) -> Result<String, EvalError> {
        check_reentry(ctx, depth, self.max_depth)?;

        let trimmed = text.trim();
        if !trimmed.ends_with(')') {
            return Ok(text.to_string());
        }
        let Some(open) = trimmed.find('(') else {
            return Ok(text.to_string());
        };
        let name = &trimmed[..open];
        if !is_function_name(name) {
            return Ok(text.to_string());
        }

        let arglist = &trimmed[open + 1..trimmed.len() - 1];
        let args = split_arguments(arglist);

        let Some(function) = self.registry.get(name) else {
            trace!("dispatch depth={} unknown function {}", depth, escape_log(name));
            return Ok(messages::not_found(name));
        };
        let function = Arc::clone(function);
        let result = function.invoke(ctx, &args);
        trace!(
            "dispatch depth={} {}({} args) -> {}",
            depth,
            name,
            args.len(),
            escape_log(&result)
        );
        Ok(result)
    }
}
