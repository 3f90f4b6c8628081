use thiserror::Error;

/// Hard failures that abort an evaluation tree.
///
/// Ordinary function failures are *not* represented here: they are `#-1 ...`
/// strings spliced into the output like any other result. Only conditions
/// that must stop the whole evaluation surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Bracket/function nesting exceeded the configured ceiling.
    #[error("#-1 EXPRESSION TOO DEEP")]
    TooDeep { limit: usize },

    /// The context's cancellation flag was raised mid-evaluation.
    #[error("#-1 EVALUATION CANCELLED")]
    Cancelled,
}

/// Canonical wire-visible error strings returned by functions.
pub mod messages {
    pub const NUMERIC: &str = "#-1 ARGUMENT MUST BE NUMERIC";
    pub const INTEGER: &str = "#-1 ARGUMENT MUST BE INTEGER";
    pub const BOOLEAN: &str = "#-1 ARGUMENT MUST BE BOOLEAN";
    pub const DIVISION_BY_ZERO: &str = "#-1 DIVISION BY ZERO";
    pub const VALUE_OUT_OF_RANGE: &str = "#-1 VALUE OUT OF RANGE";
    pub const ARGUMENT_OUT_OF_RANGE: &str = "#-1 ARGUMENT OUT OF RANGE";
    pub const IMAGINARY: &str = "#-1 IMAGINARY NUMBER";

    /// `#-1 FUNCTION (NAME) NOT FOUND`
    pub fn not_found(name: &str) -> String {
        format!("#-1 FUNCTION ({}) NOT FOUND", name.to_uppercase())
    }

    pub fn too_few_args(name: &str, min: usize) -> String {
        format!(
            "#-1 FUNCTION ({}) EXPECTS AT LEAST {} ARGUMENTS",
            name.to_uppercase(),
            min
        )
    }

    pub fn too_many_args(name: &str, max: usize) -> String {
        format!(
            "#-1 FUNCTION ({}) EXPECTS AT MOST {} ARGUMENTS",
            name.to_uppercase(),
            max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_errors_render_with_wire_prefix() {
        assert_eq!(
            EvalError::TooDeep { limit: 50 }.to_string(),
            "#-1 EXPRESSION TOO DEEP"
        );
        assert!(EvalError::Cancelled.to_string().starts_with("#-1"));
    }

    #[test]
    fn function_messages_uppercase_the_name() {
        assert_eq!(messages::not_found("foo"), "#-1 FUNCTION (FOO) NOT FOUND");
        assert_eq!(
            messages::too_few_args("setq", 2),
            "#-1 FUNCTION (SETQ) EXPECTS AT LEAST 2 ARGUMENTS"
        );
        assert_eq!(
            messages::too_many_args("pi", 0),
            "#-1 FUNCTION (PI) EXPECTS AT MOST 0 ARGUMENTS"
        );
    }
}
