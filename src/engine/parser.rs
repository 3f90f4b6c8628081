//! Command line splitter.
//!
//! Turns one raw input line into the ordered list of [`Invocation`]s it
//! stacks. Segments are separated by unescaped `;` or `&` that sit outside a
//! `"` quote and outside `{}` nesting. Each segment is then read as either a
//! shorthand form (`"hello`, `:waves`, `;'s hat`, `\text`) or a full command:
//!
//! ```text
//! @dig/teleport/quiet room=desc
//! ^--^ ^-------------^ ^--^ ^--^
//! name switches        target argument
//! ```
//!
//! The scanner never fails: unterminated quotes or braces simply run to the
//! end of the line.

use std::fmt;

/// A `/switch` or `/switch:arg` token following a command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub name: String,
    pub argument: Option<String>,
}

impl Switch {
    pub fn new(name: impl Into<String>, argument: Option<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.filter(|a| !a.trim().is_empty()),
        }
    }
}

/// One parsed command from a stacked input line.
///
/// Values are immutable; evaluating the target/argument text yields a new
/// invocation through [`Invocation::with_evaluated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    name: String,
    switches: Vec<Switch>,
    target: Option<String>,
    argument: Option<String>,
    raw: String,
}

impl Invocation {
    pub fn new(
        name: impl Into<String>,
        switches: Vec<Switch>,
        target: Option<String>,
        argument: Option<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            switches,
            target: target.filter(|t| !t.trim().is_empty()),
            argument: argument.filter(|a| !a.trim().is_empty()),
            raw: raw.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// The trimmed segment this invocation was read from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Copy of this invocation with target/argument replaced.
    pub fn with_evaluated(&self, target: Option<String>, argument: Option<String>) -> Self {
        Self::new(
            self.name.clone(),
            self.switches.clone(),
            target,
            argument,
            self.raw.clone(),
        )
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for switch in &self.switches {
            match &switch.argument {
                Some(arg) => write!(f, "/{}:{}", switch.name, arg)?,
                None => write!(f, "/{}", switch.name)?,
            }
        }
        if let Some(target) = &self.target {
            write!(f, " {}=", target)?;
        } else if self.argument.is_some() {
            write!(f, " ")?;
        }
        if let Some(argument) = &self.argument {
            write!(f, "{}", argument)?;
        }
        Ok(())
    }
}

/// Stateless line splitter.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Split `line` into its invocations. Empty segments are dropped.
    pub fn parse(&self, line: &str) -> Vec<Invocation> {
        if line.trim().is_empty() {
            return Vec::new();
        }

        split_segments(line)
            .into_iter()
            .filter_map(|segment| parse_segment(&segment))
            .collect()
    }
}

/// Split on unescaped `;`/`&` outside quotes and braces. Escapes are kept
/// verbatim (backslash included) so later stages still see them.
fn split_segments(line: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut brace_depth = 0usize;
    let mut chars = line.trim_start().chars().peekable();

    // A line opening with ';' is a semipose, not an empty first command.
    if chars.peek() == Some(&';') {
        chars.next();
        current.push(';');
    }

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '{' => {
                brace_depth += 1;
                current.push(ch);
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                current.push(ch);
            }
            ';' | '&' if !in_quotes && brace_depth == 0 => {
                push_segment(&mut segments, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_segment(&mut segments, &current);
    segments
}

fn push_segment(segments: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
}

fn shorthand_command(sigil: char) -> Option<&'static str> {
    match sigil {
        '\'' | '"' => Some("SAY"),
        ':' => Some("POSE"),
        ';' => Some("SEMIPOSE"),
        '\\' => Some("EMIT"),
        _ => None,
    }
}

fn parse_segment(raw: &str) -> Option<Invocation> {
    let mut chars = raw.chars();
    let first = chars.next()?;

    if let Some(command) = shorthand_command(first) {
        let rest = chars.as_str();
        // Semipose glues onto the actor's name, so its leading whitespace is
        // significant; everything else drops it.
        let argument = if command == "SEMIPOSE" {
            rest.to_string()
        } else {
            rest.trim_start().to_string()
        };
        return Some(Invocation::new(command, Vec::new(), None, Some(argument), raw));
    }

    let is_stop = |c: char| c.is_whitespace() || c == '/' || c == '=';

    let name_end = raw.find(is_stop).unwrap_or(raw.len());
    let name = &raw[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut rest = &raw[name_end..];
    let mut switches = Vec::new();
    while let Some(after_slash) = rest.strip_prefix('/') {
        let end = after_slash.find(is_stop).unwrap_or(after_slash.len());
        let token = &after_slash[..end];
        rest = &after_slash[end..];
        if token.is_empty() {
            continue;
        }
        match token.split_once(':') {
            Some((switch, arg)) => switches.push(Switch::new(switch, Some(arg.to_string()))),
            None => switches.push(Switch::new(token, None)),
        }
    }

    let rest = rest.trim_start();
    let (target, argument) = if rest.is_empty() {
        (None, None)
    } else {
        match find_unescaped(rest, '=') {
            Some(eq) => (
                Some(rest[..eq].trim().to_string()),
                Some(rest[eq + 1..].trim().to_string()),
            ),
            None => (None, Some(rest.trim().to_string())),
        }
    };

    Some(Invocation::new(name, switches, target, argument, raw))
}

/// Byte index of the first `needle` not preceded by an escaping backslash.
fn find_unescaped(text: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == needle {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<Invocation> {
        CommandParser::new().parse(line)
    }

    #[test]
    fn splits_stacked_commands() {
        let invocations = parse("say Hello;look here");
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].name(), "say");
        assert_eq!(invocations[0].argument(), Some("Hello"));
        assert_eq!(invocations[1].name(), "look");
        assert_eq!(invocations[1].argument(), Some("here"));
        assert_eq!(invocations[1].target(), None);
    }

    #[test]
    fn ampersand_also_separates() {
        let invocations = parse("look & who");
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[1].name(), "who");
    }

    #[test]
    fn reads_switches_target_and_argument() {
        let invocations = parse("@dig/teleport/quiet room=desc");
        assert_eq!(invocations.len(), 1);
        let inv = &invocations[0];
        assert_eq!(inv.name(), "@dig");
        let names: Vec<_> = inv.switches().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["teleport", "quiet"]);
        assert_eq!(inv.target(), Some("room"));
        assert_eq!(inv.argument(), Some("desc"));
    }

    #[test]
    fn switch_arguments_after_colon() {
        let inv = &parse("@page/port:5 bob=hi")[0];
        assert_eq!(inv.switches()[0].name, "port");
        assert_eq!(inv.switches()[0].argument.as_deref(), Some("5"));
        assert!(inv.has_switch("PORT"));
    }

    #[test]
    fn keeps_escapes_in_argument() {
        let invocations = parse(r"@eval -\[Test\] [repeat(-,3)]");
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].raw(), r"@eval -\[Test\] [repeat(-,3)]");
        assert_eq!(invocations[0].argument(), Some(r"-\[Test\] [repeat(-,3)]"));
    }

    #[test]
    fn escaped_separator_does_not_split() {
        let invocations = parse(r"say a\;b");
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].argument(), Some(r"a\;b"));
    }

    #[test]
    fn quotes_and_braces_protect_separators() {
        let invocations = parse(r#"@emit "a;b" {c;d};look"#);
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].argument(), Some(r#""a;b" {c;d}"#));
    }

    #[test]
    fn shorthand_sigils() {
        let invocations = parse("\"Hello there");
        assert_eq!(invocations[0].name(), "SAY");
        assert_eq!(invocations[0].argument(), Some("Hello there"));

        let invocations = parse(":waves.");
        assert_eq!(invocations[0].name(), "POSE");
        assert_eq!(invocations[0].argument(), Some("waves."));

        let invocations = parse(";'s hat tilts.");
        assert_eq!(invocations[0].name(), "SEMIPOSE");
        assert_eq!(invocations[0].argument(), Some("'s hat tilts."));

        let invocations = parse("; the Great");
        assert_eq!(invocations[0].argument(), Some(" the Great"));

        let invocations = parse(r"\The wind howls.");
        assert_eq!(invocations[0].name(), "EMIT");
        assert_eq!(invocations[0].argument(), Some("The wind howls."));
    }

    #[test]
    fn shorthand_skips_target_parsing() {
        let inv = &parse("'a=b/c")[0];
        assert_eq!(inv.name(), "SAY");
        assert_eq!(inv.target(), None);
        assert_eq!(inv.argument(), Some("a=b/c"));
    }

    #[test]
    fn only_first_equals_splits() {
        let inv = &parse("&attr me=x=y")[0];
        // '&' separates segments, so this is the attr command with target "me".
        assert_eq!(inv.name(), "attr");
        assert_eq!(inv.target(), Some("me"));
        assert_eq!(inv.argument(), Some("x=y"));
    }

    #[test]
    fn escaped_equals_stays_in_argument() {
        let inv = &parse(r"@emit a\=b")[0];
        assert_eq!(inv.target(), None);
        assert_eq!(inv.argument(), Some(r"a\=b"));
    }

    #[test]
    fn malformed_input_still_completes() {
        let invocations = parse("say \"unterminated; look {open");
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].name(), "say");

        assert!(parse("   ").is_empty());
        assert!(parse("&;&").is_empty());
        assert_eq!(parse("look}}};who").len(), 2);
    }

    #[test]
    fn with_evaluated_returns_new_value() {
        let original = parse("think [add(1,2)]").remove(0);
        let evaluated = original.with_evaluated(None, Some("3".to_string()));
        assert_eq!(original.argument(), Some("[add(1,2)]"));
        assert_eq!(evaluated.argument(), Some("3"));
        assert_eq!(evaluated.raw(), original.raw());
    }

    #[test]
    fn display_rebuilds_command_text() {
        let inv = &parse("@dig/teleport room=desc")[0];
        assert_eq!(inv.to_string(), "@dig/teleport room=desc");
    }
}
