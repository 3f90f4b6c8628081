//! String functions. Positions and lengths count characters, not bytes.

use super::util::{parse_int, trim, TrimMode};
use crate::engine::errors::messages;
use crate::engine::registers::ExecutionContext;

fn source(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("")
}

/// Non-negative integer argument, or the `#-1` message to return.
fn count_arg(args: &[String], index: usize) -> Result<usize, &'static str> {
    let n = args
        .get(index)
        .and_then(|a| parse_int(a))
        .ok_or(messages::INTEGER)?;
    usize::try_from(n).map_err(|_| messages::ARGUMENT_OUT_OF_RANGE)
}

pub fn upcase(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    source(args).to_uppercase()
}

pub fn downcase(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    source(args).to_lowercase()
}

pub fn strlen(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    source(args).chars().count().to_string()
}

pub fn left(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    match count_arg(args, 1) {
        Ok(n) => source(args).chars().take(n).collect(),
        Err(e) => e.to_string(),
    }
}

pub fn right(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    match count_arg(args, 1) {
        Ok(n) => {
            let text = source(args);
            let skip = text.chars().count().saturating_sub(n);
            text.chars().skip(skip).collect()
        }
        Err(e) => e.to_string(),
    }
}

/// `mid(string, start, length)`; a negative length counts backwards from
/// `start`.
pub fn mid(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let (Some(start), Some(length)) = (
        args.get(1).and_then(|a| parse_int(a)),
        args.get(2).and_then(|a| parse_int(a)),
    ) else {
        return messages::INTEGER.to_string();
    };
    if start < 0 {
        return messages::ARGUMENT_OUT_OF_RANGE.to_string();
    }
    let (start, length) = if length < 0 {
        ((start + length + 1).max(0), length.unsigned_abs())
    } else {
        (start, length as u64)
    };
    source(args)
        .chars()
        .skip(start as usize)
        .take(length as usize)
        .collect()
}

/// Longest string `repeat` will build.
pub const MAX_REPEAT_BYTES: usize = 65_536;

pub fn repeat(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    match count_arg(args, 1) {
        Ok(n) => {
            let text = source(args);
            match text.len().checked_mul(n) {
                Some(total) if total <= MAX_REPEAT_BYTES => text.repeat(n),
                _ => messages::ARGUMENT_OUT_OF_RANGE.to_string(),
            }
        }
        Err(e) => e.to_string(),
    }
}

/// `trim(string[, chars[, end]])` where `end` is `l`, `r` or `b`.
pub fn trim_both(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trim(
        source(args),
        args.get(1).map(String::as_str),
        TrimMode::from_arg(args.get(2)),
    )
}

pub fn ltrim(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trim(source(args), args.get(1).map(String::as_str), TrimMode::Left)
}

pub fn rtrim(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trim(source(args), args.get(1).map(String::as_str), TrimMode::Right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: fn(&mut ExecutionContext, &[String]) -> String, args: &[&str]) -> String {
        let mut ctx = ExecutionContext::new(1, None);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        f(&mut ctx, &args)
    }

    #[test]
    fn case_and_length() {
        assert_eq!(call(upcase, &["MiXed"]), "MIXED");
        assert_eq!(call(downcase, &["MiXed"]), "mixed");
        assert_eq!(call(strlen, &["héllo"]), "5");
        assert_eq!(call(strlen, &[""]), "0");
    }

    #[test]
    fn slicing() {
        assert_eq!(call(left, &["abcdef", "2"]), "ab");
        assert_eq!(call(left, &["ab", "9"]), "ab");
        assert_eq!(call(right, &["abcdef", "2"]), "ef");
        assert_eq!(call(left, &["abc", "-1"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(right, &["abc", "x"]), messages::INTEGER);
    }

    #[test]
    fn mid_supports_negative_lengths() {
        assert_eq!(call(mid, &["abcdef", "1", "3"]), "bcd");
        assert_eq!(call(mid, &["abcdef", "4", "-2"]), "de");
        assert_eq!(call(mid, &["abcdef", "9", "2"]), "");
        assert_eq!(call(mid, &["abcdef", "-1", "2"]), messages::ARGUMENT_OUT_OF_RANGE);
    }

    #[test]
    fn repeat_counts() {
        assert_eq!(call(repeat, &["-", "3"]), "---");
        assert_eq!(call(repeat, &["ab", "0"]), "");
        assert_eq!(call(repeat, &["ab", "-1"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(repeat, &["ab", "two"]), messages::INTEGER);
        assert_eq!(call(repeat, &["ab", "100000"]), messages::ARGUMENT_OUT_OF_RANGE);
    }

    #[test]
    fn trimming() {
        assert_eq!(call(trim_both, &["  hi  "]), "hi");
        assert_eq!(call(trim_both, &["--hi--", "-", "l"]), "hi--");
        assert_eq!(call(ltrim, &["xxhix", "x"]), "hix");
        assert_eq!(call(rtrim, &["xxhix", "x"]), "xxhi");
    }
}
