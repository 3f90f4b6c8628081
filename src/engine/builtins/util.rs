//! Argument coercion and number formatting shared by the builtins.

use std::collections::HashSet;

use crate::engine::errors::messages;

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Softcode truthiness for option arguments. Blank is false; integers are
/// true when non-zero; words are judged by their first letter (`t`/`y`
/// true, `f`/`n` false) or `on`/`off`. Anything else is not a boolean.
pub fn parse_bool(s: &str) -> Option<bool> {
    let token = s.trim();
    if token.is_empty() {
        return Some(false);
    }
    if let Ok(n) = token.parse::<i64>() {
        return Some(n != 0);
    }
    let lower = token.to_ascii_lowercase();
    match lower.chars().next()? {
        't' | 'y' => Some(true),
        'f' | 'n' => Some(false),
        'o' if lower.starts_with("on") => Some(true),
        'o' if lower.starts_with("of") => Some(false),
        _ => None,
    }
}

/// Render a numeric result. Values within 1e-9 of an integer print as that
/// integer; everything else is rounded to six places with trailing zeros
/// dropped. NaN and infinities are out of range.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return messages::VALUE_OUT_OF_RANGE.to_string();
    }
    let nearest = value.round();
    if (value - nearest).abs() < 1e-9 {
        if nearest.abs() < 9.0e15 {
            return format!("{}", nearest as i64);
        }
        return format!("{}", nearest);
    }
    let rounded = (value * 1e6).round() / 1e6;
    trim_fraction(format!("{:.6}", rounded))
}

/// Drop trailing zeros (and a bare trailing point) from a fixed-point string.
pub fn trim_fraction(mut text: String) -> String {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text.is_empty() || text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Angle unit named by the first letter of a unit argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Radians,
    Degrees,
    Gradians,
}

impl AngleUnit {
    /// Missing or unrecognised units mean radians.
    pub fn from_arg(arg: Option<&String>) -> Self {
        match arg.and_then(|a| a.trim().chars().next()) {
            Some('d') | Some('D') => AngleUnit::Degrees,
            Some('g') | Some('G') => AngleUnit::Gradians,
            _ => AngleUnit::Radians,
        }
    }

    pub fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle * (std::f64::consts::PI / 180.0),
            AngleUnit::Gradians => angle * (std::f64::consts::PI / 200.0),
        }
    }

    pub fn from_radians(self, radians: f64) -> f64 {
        match self {
            AngleUnit::Radians => radians,
            AngleUnit::Degrees => radians * (180.0 / std::f64::consts::PI),
            AngleUnit::Gradians => radians * (200.0 / std::f64::consts::PI),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    Both,
    Left,
    Right,
}

impl TrimMode {
    /// `l`, `r` or `b` (default).
    pub fn from_arg(arg: Option<&String>) -> Self {
        match arg.and_then(|a| a.trim().chars().next()) {
            Some('l') | Some('L') => TrimMode::Left,
            Some('r') | Some('R') => TrimMode::Right,
            _ => TrimMode::Both,
        }
    }
}

/// Trim whitespace, or the characters of `set` when one is given.
pub fn trim(value: &str, set: Option<&str>, mode: TrimMode) -> String {
    let set: Option<HashSet<char>> = set.filter(|s| !s.is_empty()).map(|s| s.chars().collect());
    let strip = |c: char| match &set {
        Some(set) => set.contains(&c),
        None => c.is_whitespace(),
    };
    match mode {
        TrimMode::Left => value.trim_start_matches(strip).to_string(),
        TrimMode::Right => value.trim_end_matches(strip).to_string(),
        TrimMode::Both => value.trim_matches(strip).to_string(),
    }
}
