//! `get()` and `xget()`: read attribute text through the injected
//! [`AttributeLookup`]. The stored text is returned as-is, never evaluated.

use std::sync::Arc;

use crate::engine::registers::ExecutionContext;
use crate::engine::registry::Function;
use crate::world::AttributeLookup;

/// Split `object/attribute` on the last slash. No slash means the actor.
fn split_spec(spec: &str) -> (&str, &str) {
    match spec.rfind('/') {
        Some(slash) => (spec[..slash].trim(), spec[slash + 1..].trim()),
        None => ("me", spec.trim()),
    }
}

pub struct AttributeGet {
    name: &'static str,
    world: Arc<dyn AttributeLookup>,
}

impl AttributeGet {
    /// `get(obj/attr)`
    pub fn get(world: Arc<dyn AttributeLookup>) -> Self {
        Self { name: "get", world }
    }

    /// `xget(obj, attr)` or `xget(obj/attr)`
    pub fn xget(world: Arc<dyn AttributeLookup>) -> Self {
        Self { name: "xget", world }
    }
}

impl Function for AttributeGet {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(&self, ctx: &mut ExecutionContext, args: &[String]) -> String {
        let (target, attribute) = match args {
            [object, attribute, ..] => (object.trim(), attribute.trim()),
            [spec] => split_spec(spec),
            [] => return String::new(),
        };
        if attribute.is_empty() {
            return String::new();
        }
        self.world
            .lookup(ctx.actor(), target, attribute)
            .unwrap_or_default()
    }
}
