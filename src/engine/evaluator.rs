//! Softcode expression evaluation.
//!
//! Evaluation runs in two passes over the input:
//!
//! 1. A splicing pass walks the text left to right. A leading bare call
//!    (`name(...)` before any other output) and every `[...]` bracket are
//!    evaluated recursively and dispatched; their results are spliced in.
//!    `\x` and `%` followed by `[`, `]`, `(` or `)` produce protected
//!    literal characters.
//! 2. A register pass expands `%qname`, `%N` and `%%` over the spliced
//!    text, function results included. Only escaped characters are skipped.
//!
//! Each recursive step re-enters through a depth and cancellation check.

use std::sync::Arc;

use log::{trace, warn};

use super::dispatcher::{check_reentry, is_name_char, FunctionDispatcher};
use super::errors::EvalError;
use super::registers::ExecutionContext;
use super::registry::FunctionRegistry;
use crate::logutil::escape_log;

/// Output of the splicing pass. Only `Text` is subject to register expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Literal(String),
}

#[derive(Debug, Default)]
struct Pieces(Vec<Piece>);

impl Pieces {
    fn push_text(&mut self, ch: char) {
        match self.0.last_mut() {
            Some(Piece::Text(text)) => text.push(ch),
            _ => self.0.push(Piece::Text(ch.to_string())),
        }
    }

    fn push_text_str(&mut self, s: &str) {
        match self.0.last_mut() {
            Some(Piece::Text(text)) => text.push_str(s),
            _ => self.0.push(Piece::Text(s.to_string())),
        }
    }

    fn push_literal(&mut self, s: &str) {
        match self.0.last_mut() {
            Some(Piece::Literal(text)) => text.push_str(s),
            _ => self.0.push(Piece::Literal(s.to_string())),
        }
    }
}

/// Evaluates softcode text against an [`ExecutionContext`].
#[derive(Clone)]
pub struct ExpressionEvaluator {
    dispatcher: FunctionDispatcher,
}

impl ExpressionEvaluator {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            dispatcher: FunctionDispatcher::new(registry),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.dispatcher = self.dispatcher.with_max_depth(max_depth);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.dispatcher.max_depth()
    }

    pub fn dispatcher(&self) -> &FunctionDispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        self.dispatcher.registry()
    }

    /// Fully evaluate `text`.
    pub fn evaluate(&self, ctx: &mut ExecutionContext, text: &str) -> Result<String, EvalError> {
        let result = self.evaluate_at(ctx, text, 0, true);
        match &result {
            Ok(out) => trace!("evaluate {} -> {}", escape_log(text), escape_log(out)),
            Err(e) => warn!("Evaluation of {} aborted: {:?}", escape_log(text), e),
        }
        result
    }

    fn evaluate_at(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        depth: usize,
        allow_leading: bool,
    ) -> Result<String, EvalError> {
        check_reentry(ctx, depth, self.dispatcher.max_depth())?;
        let pieces = self.splice(ctx, text, depth, allow_leading)?;

        let mut out = String::with_capacity(text.len());
        for piece in pieces.0 {
            match piece {
                Piece::Text(t) => expand_registers(ctx, &t, &mut out),
                Piece::Literal(l) => out.push_str(&l),
            }
        }
        Ok(out)
    }

    fn splice(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        depth: usize,
        allow_leading: bool,
    ) -> Result<Pieces, EvalError> {
        let chars: Vec<char> = text.chars().collect();
        let mut pieces = Pieces::default();
        let mut i = 0;

        if allow_leading {
            while i < chars.len() && chars[i].is_whitespace() {
                pieces.push_text(chars[i]);
                i += 1;
            }
            if let Some((open, close)) = leading_call(&chars, i) {
                let name: String = chars[i..open].iter().collect();
                let inner: String = chars[open + 1..close].iter().collect();
                let inner = self.evaluate_at(ctx, &inner, depth + 1, false)?;
                let call = format!("{}({})", name, inner);
                let result = self.dispatcher.dispatch(ctx, &call, depth + 1)?;
                pieces.push_text_str(&result);
                i = close + 1;
            }
        }

        while i < chars.len() {
            match chars[i] {
                '\\' => {
                    match chars.get(i + 1) {
                        Some(next) => pieces.push_literal(&next.to_string()),
                        None => pieces.push_literal("\\"),
                    }
                    i += 2;
                }
                '%' => match chars.get(i + 1) {
                    Some(&p) if matches!(p, '[' | ']' | '(' | ')') => {
                        pieces.push_literal(&p.to_string());
                        i += 2;
                    }
                    // `%x` with an escaped `x` passes the character through.
                    Some(&'\\') => {
                        match chars.get(i + 2) {
                            Some(escaped) => pieces.push_literal(&escaped.to_string()),
                            None => pieces.push_literal("\\"),
                        }
                        i += 3;
                    }
                    // `%` pairs with its specifier so `%%[` still opens a bracket.
                    Some(&next) if matches!(next, '%' | 'q' | 'Q' | '0'..='9') => {
                        pieces.push_text('%');
                        pieces.push_text(next);
                        i += 2;
                    }
                    _ => {
                        pieces.push_text('%');
                        i += 1;
                    }
                },
                '[' => match matching_bracket(&chars, i) {
                    Some(close) => {
                        let inner: String = chars[i + 1..close].iter().collect();
                        let inner = self.evaluate_at(ctx, &inner, depth + 1, true)?;
                        let result = self.dispatcher.dispatch(ctx, &inner, depth + 1)?;
                        pieces.push_text_str(&result);
                        i = close + 1;
                    }
                    None => {
                        pieces.push_text('[');
                        i += 1;
                    }
                },
                c => {
                    pieces.push_text(c);
                    i += 1;
                }
            }
        }
        Ok(pieces)
    }
}

/// Index of the `]` closing the `[` at `open`, honouring nesting, escapes
/// and quotes.
fn matching_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// `(open_paren, close_paren)` of a `name(...)` call starting at `start`.
fn leading_call(chars: &[char], start: usize) -> Option<(usize, usize)> {
    let first = *chars.get(start)?;
    if !(first.is_ascii_alphabetic() || first == '@' || first == '_') {
        return None;
    }
    let mut i = start + 1;
    while i < chars.len() && is_name_char(chars[i]) {
        i += 1;
    }
    if chars.get(i) != Some(&'(') {
        return None;
    }
    let open = i;

    let mut depth = 0usize;
    let mut in_quotes = false;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, i));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Second pass: `%%`, `%q<name>`, `%<digits>`, `%x`.
fn expand_registers(ctx: &ExecutionContext, text: &str, out: &mut String) {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let Some(&spec) = chars.get(i + 1) else {
            out.push('%');
            break;
        };
        match spec {
            'q' | 'Q' => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len()
                    && (chars[end].is_ascii_alphanumeric() || matches!(chars[end], '_' | '-'))
                {
                    end += 1;
                }
                if end == start {
                    out.push('%');
                    out.push(spec);
                } else {
                    let name: String = chars[start..end].iter().collect();
                    if let Some(value) = ctx.register(&name) {
                        out.push_str(value);
                    }
                }
                i = end;
            }
            d if d.is_ascii_digit() => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                let index: String = chars[start..end].iter().collect();
                if let Some(value) = index.parse::<usize>().ok().and_then(|n| ctx.argument(n)) {
                    out.push_str(value);
                }
                i = end;
            }
            other => {
                out.push(other);
                i += 2;
            }
        }
    }
}

impl std::fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("functions", &self.registry().len())
            .field("max_depth", &self.max_depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FunctionCatalog;

    fn evaluator() -> ExpressionEvaluator {
        fn repeat(_ctx: &mut ExecutionContext, args: &[String]) -> String {
            let count: usize = args.get(1).and_then(|n| n.parse().ok()).unwrap_or(0);
            args.first().map(|s| s.repeat(count)).unwrap_or_default()
        }
        fn setq(ctx: &mut ExecutionContext, args: &[String]) -> String {
            ctx.set_register(&args[0], args[1].clone());
            String::new()
        }
        fn echo(_ctx: &mut ExecutionContext, args: &[String]) -> String {
            args.join(",")
        }
        let registry = FunctionRegistry::builder(Arc::new(FunctionCatalog::default()))
            .register_native("repeat", repeat)
            .register_native("setq", setq)
            .register_native("echo", echo)
            .build();
        ExpressionEvaluator::new(Arc::new(registry))
    }

    fn eval(text: &str) -> String {
        let mut ctx = ExecutionContext::new(1, Some("zero one two"));
        evaluator().evaluate(&mut ctx, text).unwrap()
    }

    #[test]
    fn escaped_brackets_stay_literal() {
        assert_eq!(eval(r"-\[Test\] [repeat(-,3)]"), "-[Test] ---");
    }

    #[test]
    fn percent_punctuation_is_literal() {
        assert_eq!(eval("%[x%] %(y%)"), "[x] (y)");
        assert_eq!(eval("%%[echo(a)]"), "%a");
    }

    #[test]
    fn escapes_are_not_register_expanded() {
        assert_eq!(eval(r"\%0 %0"), "%0 zero");
        assert_eq!(eval("trailing\\"), "trailing\\");
    }

    #[test]
    fn register_pass_variants() {
        assert_eq!(eval("%1-%2-%9-%"), "one-two--%");
        assert_eq!(eval("%q %x %%"), "%q x %");
        assert_eq!(eval("[setq(a-b,v)]%qa-b/%QA-B"), "v/v");
    }

    #[test]
    fn unbalanced_bracket_is_copied() {
        assert_eq!(eval("a [b"), "a [b");
        assert_eq!(eval("a ]b"), "a ]b");
    }

    #[test]
    fn leading_call_only_at_start() {
        assert_eq!(eval("  repeat(ab,2) tail"), "  abab tail");
        assert_eq!(eval("x repeat(ab,2)"), "x repeat(ab,2)");
    }

    #[test]
    fn nested_brackets_evaluate_inside_out() {
        assert_eq!(eval("[repeat([echo(x)],[echo(2)])]"), "xx");
        assert_eq!(eval("[[echo(rep)]eat(z,3)]"), "zzz");
    }

    #[test]
    fn bracket_results_go_through_the_register_pass() {
        assert_eq!(eval("[echo(%%0)]"), "zero");
        assert_eq!(eval("[setq(n,Bob)][echo(%%qn)]!"), "Bob!");
    }

    #[test]
    fn percent_before_an_escape_keeps_it_literal() {
        assert_eq!(eval(r"%\[x]"), "[x]");
        assert_eq!(eval(r"100%\[repeat(a,2)]"), "100[repeat(a,2)]");
        assert_eq!(eval(r"%\%0"), "%0");
        assert_eq!(eval("end%\\"), "end\\");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(eval("hello (world) {x} ]"), "hello (world) {x} ]");
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let ev = evaluator().with_max_depth(4);
        let mut ctx = ExecutionContext::new(1, None);
        let deep = format!("{}x{}", "[".repeat(10), "]".repeat(10));
        assert_eq!(
            ev.evaluate(&mut ctx, &deep),
            Err(EvalError::TooDeep { limit: 4 })
        );
        let shallow = format!("{}x{}", "[".repeat(2), "]".repeat(2));
        assert_eq!(ev.evaluate(&mut ctx, &shallow).unwrap(), "x");
    }
}
