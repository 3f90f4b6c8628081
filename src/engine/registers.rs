//! Per-dispatch scratch state: named `%q` registers and positional `%N`
//! arguments, owned by an [`ExecutionContext`] that lives for exactly one
//! top-level command.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::world::Dbref;

/// Named registers (case-insensitive) plus the tokenized positional arguments.
#[derive(Debug, Clone, Default)]
pub struct RegisterSet {
    named: HashMap<String, String>,
    arguments: Vec<String>,
}

impl RegisterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_named(&self, name: &str) -> Option<&str> {
        self.named.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn set_named(&mut self, name: &str, value: impl Into<String>) {
        self.named.insert(name.to_lowercase(), value.into());
    }

    pub fn get_argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Replace the positional arguments with the tokens of `raw`.
    pub fn load_arguments(&mut self, raw: Option<&str>) {
        self.arguments = raw.map(tokenize_arguments).unwrap_or_default();
    }

    pub fn named_len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.arguments.is_empty()
    }

    pub fn clear(&mut self) {
        self.named.clear();
        self.arguments.clear();
    }
}

/// Split raw argument text on whitespace or commas that sit outside `"`
/// quotes and `{}` braces. Quote and brace delimiters are dropped, escapes
/// resolved, and empty tokens skipped.
pub fn tokenize_arguments(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut brace_depth = 0usize;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => in_quotes = !in_quotes,
            '{' => brace_depth += 1,
            '}' if brace_depth > 0 => brace_depth -= 1,
            c if (c.is_whitespace() || c == ',') && !in_quotes && brace_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Shared stop signal for one session's evaluations.
///
/// Cloning yields another handle to the same flag, so a supervisor can hold
/// one end and raise it while the evaluator polls the other.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one top-level command's evaluation tree shares.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    actor: Dbref,
    registers: RegisterSet,
    cancel: CancelFlag,
}

impl ExecutionContext {
    /// Context for `actor` with positional arguments tokenized from `raw_arguments`.
    pub fn new(actor: Dbref, raw_arguments: Option<&str>) -> Self {
        let mut registers = RegisterSet::new();
        registers.load_arguments(raw_arguments);
        Self {
            actor,
            registers,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a session-wide cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn actor(&self) -> Dbref {
        self.actor
    }

    pub fn registers(&self) -> &RegisterSet {
        &self.registers
    }

    pub fn register(&self, name: &str) -> Option<&str> {
        self.registers.get_named(name)
    }

    pub fn set_register(&mut self, name: &str, value: impl Into<String>) {
        self.registers.set_named(name, value);
    }

    pub fn argument(&self, index: usize) -> Option<&str> {
        self.registers.get_argument(index)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Drop every register and argument. Called once the command finishes.
    pub fn clear(&mut self) {
        self.registers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_registers_ignore_case() {
        let mut set = RegisterSet::new();
        set.set_named("Foo", "bar");
        assert_eq!(set.get_named("FOO"), Some("bar"));
        assert_eq!(set.get_named("foo"), Some("bar"));
        assert_eq!(set.get_named("other"), None);
    }

    #[test]
    fn tokenizes_on_whitespace_and_commas() {
        assert_eq!(
            tokenize_arguments("alpha beta,gamma  ,delta"),
            vec!["alpha", "beta", "gamma", "delta"]
        );
    }

    #[test]
    fn quotes_and_braces_group_and_are_stripped() {
        assert_eq!(
            tokenize_arguments(r#""hello world" {a, b} c"#),
            vec!["hello world", "a, b", "c"]
        );
    }

    #[test]
    fn escapes_resolve_in_tokens() {
        assert_eq!(tokenize_arguments(r"a\ b c\,d"), vec!["a b", "c,d"]);
    }

    #[test]
    fn context_loads_arguments_once() {
        let ctx = ExecutionContext::new(
            1,
            Some("alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu"),
        );
        assert_eq!(ctx.argument(0), Some("alpha"));
        assert_eq!(ctx.argument(10), Some("lambda"));
        assert_eq!(ctx.argument(12), None);
    }

    #[test]
    fn clear_empties_everything() {
        let mut ctx = ExecutionContext::new(1, Some("a b"));
        ctx.set_register("x", "1");
        ctx.clear();
        assert!(ctx.registers().is_empty());
        assert_eq!(ctx.register("x"), None);
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let ctx = ExecutionContext::new(1, None).with_cancel(flag.clone());
        assert!(!ctx.is_cancelled());
        flag.cancel();
        assert!(ctx.is_cancelled());
        flag.reset();
        assert!(!ctx.is_cancelled());
    }
}
