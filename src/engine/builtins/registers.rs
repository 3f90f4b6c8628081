//! The only builtins with side effects: they write named registers in the
//! caller's [`ExecutionContext`].

use crate::engine::registers::ExecutionContext;

pub const NEEDS_NAME: &str = "#-1 SETQ REQUIRES VARIABLE AND VALUE";
pub const ODD_PAIRS: &str = "#-1 FUNCTION (SETQ) EXPECTS AN EVEN NUMBER OF ARGUMENTS";

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `setq(name, value[, name, value ...])` stores each pair and returns empty.
pub fn setq(ctx: &mut ExecutionContext, args: &[String]) -> String {
    if args.len() < 2 {
        return NEEDS_NAME.to_string();
    }
    if args.len() % 2 != 0 {
        return ODD_PAIRS.to_string();
    }
    // Validate every pair before writing any of them.
    if args.chunks(2).any(|pair| !valid_name(&pair[0])) {
        return NEEDS_NAME.to_string();
    }
    for pair in args.chunks(2) {
        ctx.set_register(&pair[0], pair[1].clone());
    }
    String::new()
}

/// `setr(name, value)` stores and returns the value.
pub fn setr(ctx: &mut ExecutionContext, args: &[String]) -> String {
    match args {
        [name, value, ..] if valid_name(name) => {
            ctx.set_register(name, value.clone());
            value.clone()
        }
        _ => NEEDS_NAME.to_string(),
    }
}

/// `r(name)` reads a register; unset reads as empty.
pub fn r(ctx: &mut ExecutionContext, args: &[String]) -> String {
    args.first()
        .and_then(|name| ctx.register(name))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn setq_writes_pairs_and_returns_empty() {
        let mut ctx = ExecutionContext::new(1, None);
        assert_eq!(setq(&mut ctx, &strings(&["a", "1", "B", "2"])), "");
        assert_eq!(ctx.register("A"), Some("1"));
        assert_eq!(ctx.register("b"), Some("2"));
    }

    #[test]
    fn setq_rejects_bad_names_without_writing() {
        let mut ctx = ExecutionContext::new(1, None);
        assert_eq!(setq(&mut ctx, &strings(&["ok", "1", "", "2"])), NEEDS_NAME);
        assert_eq!(ctx.register("ok"), None);
        assert_eq!(setq(&mut ctx, &strings(&["a", "1", "b"])), ODD_PAIRS);
        assert_eq!(ctx.register("a"), None);
    }

    #[test]
    fn setr_echoes_and_r_reads() {
        let mut ctx = ExecutionContext::new(1, None);
        assert_eq!(setr(&mut ctx, &strings(&["x", "val"])), "val");
        assert_eq!(r(&mut ctx, &strings(&["X"])), "val");
        assert_eq!(r(&mut ctx, &strings(&["missing"])), "");
    }
}
