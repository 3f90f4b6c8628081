//! Command metadata and the per-command evaluation policy.
//!
//! Whether a command's target or argument text is evaluated before the
//! command sees it is decided here, once, when the catalog is loaded. The
//! command processor only tests bits.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use serde::Deserialize;

use super::CatalogError;

/// Bitset of evaluation toggles for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EvalPolicy(u32);

impl EvalPolicy {
    pub const NONE: EvalPolicy = EvalPolicy(0);
    /// Command takes `target=argument`; without it the whole tail is the argument.
    pub const EQSPLIT: EvalPolicy = EvalPolicy(0x0001);
    /// Leave both sides unevaluated.
    pub const NOPARSE: EvalPolicy = EvalPolicy(0x0040);
    /// Leave the right-hand side (argument) unevaluated.
    pub const RS_NOPARSE: EvalPolicy = EvalPolicy(0x0400);
    /// Leave the left-hand side (target) unevaluated.
    pub const LS_NOPARSE: EvalPolicy = EvalPolicy(0x0800);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: EvalPolicy) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn evaluates_target(self) -> bool {
        !self.contains(Self::NOPARSE) && !self.contains(Self::LS_NOPARSE)
    }

    pub fn evaluates_argument(self) -> bool {
        !self.contains(Self::NOPARSE) && !self.contains(Self::RS_NOPARSE)
    }

    pub fn splits_on_equals(self) -> bool {
        self.contains(Self::EQSPLIT)
    }

    pub fn from_flag(flag: &str) -> Option<EvalPolicy> {
        match flag.to_lowercase().as_str() {
            "eqsplit" => Some(Self::EQSPLIT),
            "noparse" => Some(Self::NOPARSE),
            "rs_noparse" => Some(Self::RS_NOPARSE),
            "ls_noparse" => Some(Self::LS_NOPARSE),
            _ => None,
        }
    }
}

impl BitOr for EvalPolicy {
    type Output = EvalPolicy;

    fn bitor(self, rhs: EvalPolicy) -> EvalPolicy {
        EvalPolicy(self.0 | rhs.0)
    }
}

impl fmt::Display for EvalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::EQSPLIT, "eqsplit"),
            (Self::NOPARSE, "noparse"),
            (Self::RS_NOPARSE, "rs_noparse"),
            (Self::LS_NOPARSE, "ls_noparse"),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| *name)
        .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommandRecord {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    switches: Vec<String>,
    #[serde(default)]
    eval: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommandSnapshot {
    #[serde(default)]
    commands: Vec<CommandRecord>,
}

/// A command as the processor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub switches: Vec<String>,
    pub policy: EvalPolicy,
}

impl CommandDefinition {
    pub fn accepts_switch(&self, switch: &str) -> bool {
        self.switches.iter().any(|s| s.eq_ignore_ascii_case(switch))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    definitions: Vec<CommandDefinition>,
    index: HashMap<String, usize>,
}

impl CommandCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snapshot: CommandSnapshot = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for record in snapshot.commands {
            let mut policy = EvalPolicy::NONE;
            for flag in &record.eval {
                policy = policy
                    | EvalPolicy::from_flag(flag).ok_or_else(|| CatalogError::UnknownEvalFlag {
                        command: record.name.clone(),
                        flag: flag.clone(),
                    })?;
            }
            catalog.insert(CommandDefinition {
                name: record.name.to_uppercase(),
                aliases: record.aliases,
                switches: record.switches,
                policy,
            })?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, definition: CommandDefinition) -> Result<(), CatalogError> {
        let slot = self.definitions.len();
        let keys = std::iter::once(&definition.name).chain(definition.aliases.iter());
        for key in keys {
            let key = key.to_lowercase();
            if self.index.insert(key.clone(), slot).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "command",
                    name: key,
                });
            }
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Definition by name or alias, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.index
            .get(&name.to_lowercase())
            .and_then(|slot| self.definitions.get(*slot))
    }

    pub fn definitions(&self) -> &[CommandDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_bits_resolve_from_flag_names() {
        let json = r#"{"commands":[
            {"name":"@lock","aliases":["@lo"],"eval":["eqsplit","rs_noparse"]},
            {"name":"@wait","eval":["noparse"]}
        ]}"#;
        let catalog = CommandCatalog::from_json(json).unwrap();

        let lock = catalog.get("@LO").unwrap();
        assert_eq!(lock.name, "@LOCK");
        assert!(lock.policy.splits_on_equals());
        assert!(lock.policy.evaluates_target());
        assert!(!lock.policy.evaluates_argument());

        let wait = catalog.get("@wait").unwrap();
        assert!(!wait.policy.evaluates_target());
        assert!(!wait.policy.evaluates_argument());
        assert_eq!(wait.policy.to_string(), "noparse");
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let json = r#"{"commands":[{"name":"x","eval":["sometimes"]}]}"#;
        assert!(matches!(
            CommandCatalog::from_json(json),
            Err(CatalogError::UnknownEvalFlag { .. })
        ));
    }

    #[test]
    fn alias_collisions_are_rejected() {
        let json = r#"{"commands":[{"name":"look","aliases":["l"]},{"name":"leave","aliases":["L"]}]}"#;
        assert!(matches!(
            CommandCatalog::from_json(json),
            Err(CatalogError::Duplicate { .. })
        ));
    }

    #[test]
    fn switches_are_case_insensitive() {
        let json = r#"{"commands":[{"name":"@dig","switches":["teleport","quiet"]}]}"#;
        let catalog = CommandCatalog::from_json(json).unwrap();
        assert!(catalog.get("@dig").unwrap().accepts_switch("TELEPORT"));
        assert!(!catalog.get("@dig").unwrap().accepts_switch("loud"));
    }
}
