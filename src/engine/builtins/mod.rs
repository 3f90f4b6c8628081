//! The builtin function library.
//!
//! [`register_all`] adds every builtin to a registry builder. Arity bounds
//! are not declared here; they come from the function catalog when the
//! registry is built.

pub mod attributes;
pub mod math;
pub mod registers;
pub mod string;
pub mod util;

use std::sync::Arc;

use super::registry::{FunctionRegistryBuilder, NativeFn};
use crate::world::AttributeLookup;

/// Pure builtins, by registered name.
pub const NATIVE_BUILTINS: &[(&str, NativeFn)] = &[
    ("add", math::add),
    ("sub", math::sub),
    ("mul", math::mul),
    ("div", math::div),
    ("mod", math::modulo),
    ("abs", math::abs),
    ("min", math::min),
    ("max", math::max),
    ("floor", math::floor),
    ("ceil", math::ceil),
    ("round", math::round),
    ("sqrt", math::sqrt),
    ("root", math::root),
    ("power", math::power),
    ("ln", math::ln),
    ("log", math::log),
    ("pi", math::pi),
    ("sin", math::sin),
    ("cos", math::cos),
    ("tan", math::tan),
    ("asin", math::asin),
    ("acos", math::acos),
    ("atan", math::atan),
    ("atan2", math::atan2),
    ("ctu", math::ctu),
    ("rand", math::rand),
    ("upcase", string::upcase),
    ("downcase", string::downcase),
    ("strlen", string::strlen),
    ("left", string::left),
    ("right", string::right),
    ("mid", string::mid),
    ("repeat", string::repeat),
    ("trim", string::trim_both),
    ("ltrim", string::ltrim),
    ("rtrim", string::rtrim),
    ("setq", registers::setq),
    ("setr", registers::setr),
    ("r", registers::r),
];

/// Register every builtin. Attribute readers go through `world`.
pub fn register_all(
    builder: FunctionRegistryBuilder,
    world: Arc<dyn AttributeLookup>,
) -> FunctionRegistryBuilder {
    let builder = NATIVE_BUILTINS
        .iter()
        .fold(builder, |b, (name, body)| b.register_native(*name, *body));
    builder
        .register(attributes::AttributeGet::get(Arc::clone(&world)))
        .register(attributes::AttributeGet::xget(world))
}
