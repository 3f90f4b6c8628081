use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// A lock type and the key it uses when an object has no override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDefinition {
    pub name: String,
    pub default_key: String,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Deserialize)]
struct LockSnapshot {
    #[serde(default)]
    locks: Vec<LockDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct LockCatalog {
    by_name: HashMap<String, LockDefinition>,
}

impl LockCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snapshot: LockSnapshot = serde_json::from_str(json)?;
        Self::from_definitions(snapshot.locks)
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = LockDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::new();
        for definition in definitions {
            let key = definition.name.to_lowercase();
            if by_name.contains_key(&key) {
                return Err(CatalogError::Duplicate {
                    kind: "lock",
                    name: definition.name,
                });
            }
            by_name.insert(key, definition);
        }
        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&LockDefinition> {
        if name.trim().is_empty() {
            return None;
        }
        self.by_name.get(&name.to_lowercase())
    }

    pub fn definitions(&self) -> impl Iterator<Item = &LockDefinition> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
