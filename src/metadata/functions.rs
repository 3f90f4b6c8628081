use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Arity and capability metadata for one softcode function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub handler: String,
    /// Zero means no lower bound.
    #[serde(default)]
    pub min_args: usize,
    /// `None` means unbounded.
    #[serde(default)]
    pub max_args: Option<usize>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAlias {
    pub alias: String,
    pub function: String,
}

#[derive(Debug, Deserialize)]
struct FunctionSnapshot {
    #[serde(default)]
    functions: Vec<FunctionDefinition>,
    #[serde(default)]
    aliases: Vec<FunctionAlias>,
}

/// Function metadata indexed by lowercase name and alias.
#[derive(Debug, Clone, Default)]
pub struct FunctionCatalog {
    by_name: HashMap<String, FunctionDefinition>,
    aliases: HashMap<String, String>,
}

impl FunctionCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snapshot: FunctionSnapshot = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for definition in snapshot.functions {
            let key = definition.name.to_lowercase();
            if catalog.by_name.contains_key(&key) {
                return Err(CatalogError::Duplicate {
                    kind: "function",
                    name: definition.name,
                });
            }
            catalog.by_name.insert(key, definition);
        }
        // Aliases pointing at unknown functions are dropped.
        for alias in snapshot.aliases {
            let target = alias.function.to_lowercase();
            if catalog.by_name.contains_key(&target) {
                catalog.aliases.insert(alias.alias.to_lowercase(), target);
            }
        }
        Ok(catalog)
    }

    /// Definition by name, then by alias.
    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        let key = name.to_lowercase();
        self.by_name
            .get(&key)
            .or_else(|| self.aliases.get(&key).and_then(|n| self.by_name.get(n)))
    }

    /// Canonical lowercase function name for `alias`.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(&alias.to_lowercase()).map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, f)| (a.as_str(), f.as_str()))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
