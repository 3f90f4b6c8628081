//! Name → function table built once at startup.
//!
//! Functions are registered through [`FunctionRegistryBuilder`]. When the
//! function catalog carries arity bounds for a name, the builder wraps the
//! function in an [`ArityChecked`] decorator so the bounds are enforced before
//! the handler ever runs. Aliases come from the catalog as well.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::errors::messages;
use super::registers::ExecutionContext;
use crate::metadata::FunctionCatalog;

/// A softcode function.
///
/// Handlers receive arguments that are already evaluated and trimmed. They
/// report failures as `#-1 ...` strings, never by panicking.
pub trait Function: Send + Sync {
    fn name(&self) -> &str;
    fn invoke(&self, ctx: &mut ExecutionContext, args: &[String]) -> String;
}

/// Signature of the plain builtins in [`crate::engine::builtins`].
pub type NativeFn = fn(&mut ExecutionContext, &[String]) -> String;

/// A [`Function`] backed by a bare function pointer.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    name: &'static str,
    body: NativeFn,
}

impl NativeFunction {
    pub const fn new(name: &'static str, body: NativeFn) -> Self {
        Self { name, body }
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(&self, ctx: &mut ExecutionContext, args: &[String]) -> String {
        (self.body)(ctx, args)
    }
}

/// Enforces `[min, max]` on the argument count before delegating.
pub struct ArityChecked {
    inner: Arc<dyn Function>,
    display_name: String,
    min: usize,
    max: Option<usize>,
}

impl ArityChecked {
    pub fn new(
        inner: Arc<dyn Function>,
        display_name: impl Into<String>,
        min: usize,
        max: Option<usize>,
    ) -> Self {
        Self {
            inner,
            display_name: display_name.into(),
            min,
            max,
        }
    }
}

impl Function for ArityChecked {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn invoke(&self, ctx: &mut ExecutionContext, args: &[String]) -> String {
        if args.len() < self.min {
            return messages::too_few_args(&self.display_name, self.min);
        }
        if let Some(max) = self.max {
            if args.len() > max {
                return messages::too_many_args(&self.display_name, max);
            }
        }
        self.inner.invoke(ctx, args)
    }
}

/// Collects functions, then freezes them into a [`FunctionRegistry`].
pub struct FunctionRegistryBuilder {
    catalog: Arc<FunctionCatalog>,
    functions: HashMap<String, Arc<dyn Function>>,
    aliases: HashMap<String, String>,
}

impl FunctionRegistryBuilder {
    pub fn new(catalog: Arc<FunctionCatalog>) -> Self {
        Self {
            catalog,
            functions: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Add or replace a function under its own (case-insensitive) name.
    pub fn register(mut self, function: impl Function + 'static) -> Self {
        self.insert(Arc::new(function));
        self
    }

    pub fn register_native(self, name: &'static str, body: NativeFn) -> Self {
        self.register(NativeFunction::new(name, body))
    }

    pub(crate) fn insert(&mut self, function: Arc<dyn Function>) {
        self.functions
            .insert(function.name().to_lowercase(), function);
    }

    /// Extra alias on top of the catalog's.
    pub fn alias(mut self, alias: &str, function: &str) -> Self {
        self.aliases
            .insert(alias.to_lowercase(), function.to_lowercase());
        self
    }

    pub fn build(self) -> FunctionRegistry {
        let FunctionRegistryBuilder {
            catalog,
            functions,
            mut aliases,
        } = self;

        let mut checked = 0usize;
        let functions: HashMap<String, Arc<dyn Function>> = functions
            .into_iter()
            .map(|(key, function)| match catalog.get(&key) {
                Some(def) if def.name.eq_ignore_ascii_case(&key) => {
                    checked += 1;
                    let wrapped: Arc<dyn Function> = Arc::new(ArityChecked::new(
                        function,
                        def.name.clone(),
                        def.min_args,
                        def.max_args,
                    ));
                    (key, wrapped)
                }
                _ => (key, function),
            })
            .collect();

        for (alias, target) in catalog.aliases() {
            aliases
                .entry(alias.to_string())
                .or_insert_with(|| target.to_string());
        }
        // An alias never shadows a real function and must point somewhere.
        aliases.retain(|alias, target| {
            !functions.contains_key(alias) && functions.contains_key(target)
        });

        debug!(
            "Function registry built: {} functions ({} arity-checked), {} aliases",
            functions.len(),
            checked,
            aliases.len()
        );
        FunctionRegistry {
            catalog,
            functions,
            aliases,
        }
    }
}

/// Immutable lookup table shared by every evaluator.
pub struct FunctionRegistry {
    catalog: Arc<FunctionCatalog>,
    functions: HashMap<String, Arc<dyn Function>>,
    aliases: HashMap<String, String>,
}

impl FunctionRegistry {
    pub fn builder(catalog: Arc<FunctionCatalog>) -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::new(catalog)
    }

    /// Case-insensitive lookup by name, then by alias.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        let key = name.to_lowercase();
        self.functions.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|target| self.functions.get(target))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn catalog(&self) -> &FunctionCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
