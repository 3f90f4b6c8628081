//! Arithmetic and trigonometry.
//!
//! Every argument goes through [`parse_number`] / [`parse_int`]; a bad one
//! yields the matching `#-1` message and no partial result.

use rand::Rng;

use super::util::{format_number, parse_bool, parse_int, parse_number, trim_fraction, AngleUnit};
use crate::engine::errors::messages;
use crate::engine::registers::ExecutionContext;

fn numbers(args: &[String]) -> Result<Vec<f64>, String> {
    args.iter()
        .map(|a| parse_number(a).ok_or_else(|| messages::NUMERIC.to_string()))
        .collect()
}

fn first_number(args: &[String]) -> Result<f64, String> {
    args.first()
        .and_then(|a| parse_number(a))
        .ok_or_else(|| messages::NUMERIC.to_string())
}

fn finish(result: Result<String, String>) -> String {
    result.unwrap_or_else(|e| e)
}

/// Fold left over the arguments.
fn fold(args: &[String], op: impl Fn(f64, f64) -> f64) -> String {
    finish(numbers(args).map(|ns| {
        let mut iter = ns.into_iter();
        let start = iter.next().unwrap_or(0.0);
        format_number(iter.fold(start, op))
    }))
}

pub fn add(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    fold(args, |a, b| a + b)
}

pub fn sub(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    fold(args, |a, b| a - b)
}

pub fn mul(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    fold(args, |a, b| a * b)
}

pub fn div(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(numbers(args).and_then(|ns| {
        let mut iter = ns.into_iter();
        let mut result = iter.next().unwrap_or(0.0);
        for divisor in iter {
            if divisor.abs() < f64::EPSILON {
                return Err(messages::DIVISION_BY_ZERO.to_string());
            }
            result /= divisor;
        }
        Ok(format_number(result))
    }))
}

/// Integer remainder; the sign follows the dividend.
pub fn modulo(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let (Some(dividend), Some(divisor)) = (
        args.first().and_then(|a| parse_int(a)),
        args.get(1).and_then(|a| parse_int(a)),
    ) else {
        return messages::INTEGER.to_string();
    };
    if divisor == 0 {
        return messages::DIVISION_BY_ZERO.to_string();
    }
    dividend.wrapping_rem(divisor).to_string()
}

pub fn abs(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).map(|n| format_number(n.abs())))
}

pub fn min(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    fold(args, f64::min)
}

pub fn max(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    fold(args, f64::max)
}

pub fn floor(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).map(|n| format_number(n.floor())))
}

pub fn ceil(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).map(|n| format_number(n.ceil())))
}

/// `round(number[, places[, pad]])`; places are capped at 15.
pub fn round(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let value = match first_number(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let places = match args.get(1) {
        Some(p) => match p.trim().parse::<u32>() {
            Ok(p) => p.min(15),
            Err(_) => return messages::INTEGER.to_string(),
        },
        None => 0,
    };
    let pad = match args.get(2) {
        Some(p) => match parse_bool(p) {
            Some(b) => b,
            None => return messages::BOOLEAN.to_string(),
        },
        None => false,
    };

    let scale = 10f64.powi(places as i32);
    let rounded = (value * scale).round() / scale;
    if places == 0 {
        return format_number(rounded);
    }
    if !rounded.is_finite() {
        return messages::VALUE_OUT_OF_RANGE.to_string();
    }
    let fixed = format!("{:.*}", places as usize, rounded);
    if pad {
        fixed
    } else {
        trim_fraction(fixed)
    }
}

pub fn sqrt(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).and_then(|n| {
        if n < 0.0 {
            Err(messages::IMAGINARY.to_string())
        } else {
            Ok(format_number(n.sqrt()))
        }
    }))
}

/// `root(number, degree)`; odd roots of negatives stay real.
pub fn root(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let value = match first_number(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(degree) = args.get(1).and_then(|a| parse_int(a)) else {
        return messages::INTEGER.to_string();
    };
    if degree == 0 {
        return messages::ARGUMENT_OUT_OF_RANGE.to_string();
    }
    if value < 0.0 && degree % 2 == 0 {
        return messages::IMAGINARY.to_string();
    }
    let magnitude = value.abs().powf(1.0 / degree as f64);
    format_number(if value < 0.0 { -magnitude } else { magnitude })
}

pub fn power(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(numbers(args).and_then(|ns| match ns.as_slice() {
        [base, exponent, ..] => {
            let result = base.powf(*exponent);
            if result.is_finite() {
                Ok(format_number(result))
            } else {
                Err(messages::ARGUMENT_OUT_OF_RANGE.to_string())
            }
        }
        _ => Err(messages::NUMERIC.to_string()),
    }))
}

pub fn ln(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).and_then(|n| {
        if n <= 0.0 {
            Err(messages::ARGUMENT_OUT_OF_RANGE.to_string())
        } else {
            Ok(format_number(n.ln()))
        }
    }))
}

/// `log(number[, base])`; base defaults to 10, `e` means natural log.
pub fn log(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let value = match first_number(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if value <= 0.0 {
        return messages::ARGUMENT_OUT_OF_RANGE.to_string();
    }
    let result = match args.get(1).map(|b| b.trim()) {
        None => value.log10(),
        Some(b) if b.eq_ignore_ascii_case("e") => value.ln(),
        Some(b) => match parse_number(b) {
            Some(base) if base <= 0.0 || (base - 1.0).abs() < f64::EPSILON => {
                return messages::ARGUMENT_OUT_OF_RANGE.to_string()
            }
            Some(base) => value.ln() / base.ln(),
            None => return messages::NUMERIC.to_string(),
        },
    };
    format_number(result)
}

pub fn pi(_ctx: &mut ExecutionContext, _args: &[String]) -> String {
    format_number(std::f64::consts::PI)
}

fn trig(args: &[String], f: fn(f64) -> f64) -> String {
    finish(first_number(args).map(|angle| {
        let radians = AngleUnit::from_arg(args.get(1)).to_radians(angle);
        format_number(f(radians))
    }))
}

pub fn sin(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trig(args, f64::sin)
}

pub fn cos(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trig(args, f64::cos)
}

pub fn tan(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    trig(args, f64::tan)
}

/// Inverse trig; `bounded` rejects inputs outside [-1, 1].
fn arc(args: &[String], f: fn(f64) -> f64, bounded: bool) -> String {
    finish(first_number(args).and_then(|n| {
        if bounded && !(-1.0..=1.0).contains(&n) {
            return Err(messages::ARGUMENT_OUT_OF_RANGE.to_string());
        }
        Ok(format_number(
            AngleUnit::from_arg(args.get(1)).from_radians(f(n)),
        ))
    }))
}

pub fn asin(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    arc(args, f64::asin, true)
}

pub fn acos(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    arc(args, f64::acos, true)
}

pub fn atan(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    arc(args, f64::atan, false)
}

/// `atan2(y, x[, unit])`
pub fn atan2(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(numbers(&args[..args.len().min(2)]).and_then(|ns| match ns.as_slice() {
        [y, x] => Ok(format_number(
            AngleUnit::from_arg(args.get(2)).from_radians(y.atan2(*x)),
        )),
        _ => Err(messages::NUMERIC.to_string()),
    }))
}

/// `ctu(angle, from, to)`: convert between angle units.
pub fn ctu(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    finish(first_number(args).map(|angle| {
        let radians = AngleUnit::from_arg(args.get(1)).to_radians(angle);
        format_number(AngleUnit::from_arg(args.get(2)).from_radians(radians))
    }))
}

/// `rand()` is a float in [0,1); `rand(n)` is an integer in [0,n) (or
/// (n,0] for negative n); `rand(lo, hi)` is an integer in [lo,hi].
pub fn rand(_ctx: &mut ExecutionContext, args: &[String]) -> String {
    let mut rng = rand::thread_rng();
    match args {
        [] => format_number(rng.gen::<f64>()),
        [bound] => match parse_int(bound) {
            Some(n) if n > 0 => rng.gen_range(0..n).to_string(),
            Some(n) if n < 0 => (-rng.gen_range(0..n.saturating_neg())).to_string(),
            _ => messages::INTEGER.to_string(),
        },
        [a, b, ..] => match (parse_int(a), parse_int(b)) {
            (Some(a), Some(b)) => rng.gen_range(a.min(b)..=a.max(b)).to_string(),
            _ => messages::INTEGER.to_string(),
        },
    }
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
    fn arithmetic_folds_over_all_arguments() {
        assert_eq!(call(add, &["1", "2", "3.5"]), "6.5");
        assert_eq!(call(sub, &["10", "3", "2"]), "5");
        assert_eq!(call(mul, &["2", "-3"]), "-6");
        assert_eq!(call(div, &["1", "3"]), "0.333333");
        assert_eq!(call(add, &["1", "x"]), messages::NUMERIC);
    }

    #[test]
    fn division_and_modulo_reject_zero() {
        assert_eq!(call(div, &["1", "0"]), messages::DIVISION_BY_ZERO);
        assert_eq!(call(modulo, &["7", "0"]), messages::DIVISION_BY_ZERO);
        assert_eq!(call(modulo, &["-7", "3"]), "-1");
        assert_eq!(call(modulo, &["7.5", "3"]), messages::INTEGER);
    }

    #[test]
    fn min_max_abs_floor_ceil() {
        assert_eq!(call(min, &["3", "-1", "2"]), "-1");
        assert_eq!(call(max, &["3", "-1", "2"]), "3");
        assert_eq!(call(abs, &["-4.25"]), "4.25");
        assert_eq!(call(floor, &["-1.5"]), "-2");
        assert_eq!(call(ceil, &["1.2"]), "2");
    }

    #[test]
    fn rounding_with_places_and_padding() {
        assert_eq!(call(round, &["2.5"]), "3");
        assert_eq!(call(round, &["3.14159", "2"]), "3.14");
        assert_eq!(call(round, &["1.5", "3"]), "1.5");
        assert_eq!(call(round, &["1.5", "3", "yes"]), "1.500");
        assert_eq!(call(round, &["1.5", "-1"]), messages::INTEGER);
        assert_eq!(call(round, &["1.5", "2", "perhaps"]), messages::BOOLEAN);
    }

    #[test]
    fn roots_and_logs_guard_their_domains() {
        assert_eq!(call(sqrt, &["16"]), "4");
        assert_eq!(call(sqrt, &["-1"]), messages::IMAGINARY);
        assert_eq!(call(root, &["27", "3"]), "3");
        assert_eq!(call(root, &["-8", "3"]), "-2");
        assert_eq!(call(root, &["-8", "2"]), messages::IMAGINARY);
        assert_eq!(call(root, &["8", "0"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(ln, &["0"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(log, &["1000"]), "3");
        assert_eq!(call(log, &["8", "2"]), "3");
        assert_eq!(call(log, &["8", "1"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(power, &["2", "10"]), "1024");
        assert_eq!(call(power, &["10", "400"]), messages::ARGUMENT_OUT_OF_RANGE);
    }

    #[test]
    fn trig_honours_units() {
        assert_eq!(call(sin, &["90", "d"]), "1");
        assert_eq!(call(cos, &["0"]), "1");
        assert_eq!(call(asin, &["1", "degrees"]), "90");
        assert_eq!(call(acos, &["2"]), messages::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(call(atan2, &["1", "1", "d"]), "45");
        assert_eq!(call(ctu, &["180", "d", "g"]), "200");
        assert_eq!(call(pi, &[]), "3.141593");
    }

    #[test]
    fn rand_stays_in_bounds() {
        for _ in 0..50 {
            let n: i64 = call(rand, &["5"]).parse().unwrap();
            assert!((0..5).contains(&n));
            let m: i64 = call(rand, &["-3", "3"]).parse().unwrap();
            assert!((-3..=3).contains(&m));
        }
        assert_eq!(call(rand, &["0"]), messages::INTEGER);
    }
}
