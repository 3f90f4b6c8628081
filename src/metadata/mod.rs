//! # Metadata Catalogs
//!
//! Read-only tables the engine consults at runtime, loaded once at startup:
//!
//! - [`FunctionCatalog`] - function names, aliases and arity bounds
//! - [`LockCatalog`] - lock names and their default key expressions
//! - [`CommandCatalog`] - command names, aliases, switches and evaluation policy
//!
//! Each catalog is plain JSON. Defaults are compiled into the binary from
//! `data/*.json`; a deployment can point the `[metadata]` config section at
//! replacement files.
//!
//! ```rust
//! use mushcode::metadata::MetadataCatalogs;
//!
//! let catalogs = MetadataCatalogs::embedded().unwrap();
//! let setq = catalogs.functions.get("SETQ").unwrap();
//! assert_eq!(setq.min_args, 2);
//! ```

pub mod commands;
pub mod functions;
pub mod locks;

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::config::MetadataConfig;

pub use commands::{CommandCatalog, CommandDefinition, EvalPolicy};
pub use functions::{FunctionAlias, FunctionCatalog, FunctionDefinition};
pub use locks::{LockCatalog, LockDefinition};

const EMBEDDED_FUNCTIONS: &str = include_str!("../../data/functions.json");
const EMBEDDED_LOCKS: &str = include_str!("../../data/locks.json");
const EMBEDDED_COMMANDS: &str = include_str!("../../data/commands.json");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog io error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate {kind} entry: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("command {command} uses unknown eval flag '{flag}'")]
    UnknownEvalFlag { command: String, flag: String },
}

/// The three catalogs bundled together and shared by reference.
#[derive(Debug, Clone)]
pub struct MetadataCatalogs {
    pub functions: Arc<FunctionCatalog>,
    pub locks: Arc<LockCatalog>,
    pub commands: Arc<CommandCatalog>,
}

impl MetadataCatalogs {
    /// Catalogs compiled into the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        Ok(Self {
            functions: Arc::new(FunctionCatalog::from_json(EMBEDDED_FUNCTIONS)?),
            locks: Arc::new(LockCatalog::from_json(EMBEDDED_LOCKS)?),
            commands: Arc::new(CommandCatalog::from_json(EMBEDDED_COMMANDS)?),
        })
    }

    /// Catalogs named in `config`, falling back to the embedded copy for any
    /// file left unset.
    pub async fn load(config: &MetadataConfig) -> Result<Self, CatalogError> {
        let functions = match &config.functions {
            Some(path) => FunctionCatalog::from_json(&read_catalog(path).await?)?,
            None => FunctionCatalog::from_json(EMBEDDED_FUNCTIONS)?,
        };
        let locks = match &config.locks {
            Some(path) => LockCatalog::from_json(&read_catalog(path).await?)?,
            None => LockCatalog::from_json(EMBEDDED_LOCKS)?,
        };
        let commands = match &config.commands {
            Some(path) => CommandCatalog::from_json(&read_catalog(path).await?)?,
            None => CommandCatalog::from_json(EMBEDDED_COMMANDS)?,
        };
        debug!(
            "Loaded metadata: {} functions, {} locks, {} commands",
            functions.len(),
            locks.len(),
            commands.len()
        );
        Ok(Self {
            functions: Arc::new(functions),
            locks: Arc::new(locks),
            commands: Arc::new(commands),
        })
    }
}

async fn read_catalog(path: &str) -> Result<String, CatalogError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalogs_parse() {
        let catalogs = MetadataCatalogs::embedded().unwrap();
        assert!(catalogs.functions.get("repeat").is_some());
        assert!(catalogs.locks.get("Basic").is_some());
        assert!(catalogs.commands.get("@dig").is_some());
    }

    #[tokio::test]
    async fn load_reads_override_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locks.json");
        std::fs::write(
            &path,
            r##"{"locks":[{"name":"Speech","default_key":"#5"}]}"##,
        )
        .unwrap();

        let config = MetadataConfig {
            functions: None,
            locks: Some(path.to_string_lossy().into_owned()),
            commands: None,
        };
        let catalogs = MetadataCatalogs::load(&config).await.unwrap();
        assert_eq!(catalogs.locks.len(), 1);
        assert_eq!(catalogs.locks.get("speech").unwrap().default_key, "#5");
        assert!(catalogs.functions.get("setq").is_some());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let config = MetadataConfig {
            functions: Some("/definitely/not/here.json".to_string()),
            locks: None,
            commands: None,
        };
        let err = MetadataCatalogs::load(&config).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
