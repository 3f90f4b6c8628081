//! Chooses which key a lock check runs: the object's stored override, else
//! the lock type's default. Unknown lock types deny.

use std::sync::Arc;

use log::debug;

use super::expr::{IdentityCheck, LockExpressionEngine};
use super::store::LockStore;
use crate::logutil::escape_log;
use crate::metadata::LockCatalog;
use crate::world::Dbref;

pub struct LockEvaluator {
    catalog: Arc<LockCatalog>,
    store: Arc<dyn LockStore>,
    engine: LockExpressionEngine,
}

impl LockEvaluator {
    pub fn new(catalog: Arc<LockCatalog>, store: Arc<dyn LockStore>) -> Self {
        Self {
            catalog,
            store,
            engine: LockExpressionEngine::new(),
        }
    }

    /// The key text that would be evaluated, or `None` for an unknown lock.
    pub fn effective_key(&self, object: Dbref, lock_name: &str) -> Option<String> {
        let definition = self.catalog.get(lock_name)?;
        Some(
            self.store
                .get(object, &definition.name)
                .unwrap_or_else(|| definition.default_key.clone()),
        )
    }

    /// Does `subject` pass `object`'s `lock_name` lock?
    pub fn evaluate(&self, subject: &dyn IdentityCheck, object: Dbref, lock_name: &str) -> bool {
        let Some(key) = self.effective_key(object, lock_name) else {
            debug!("Unknown lock type {} on #{}", escape_log(lock_name), object);
            return false;
        };
        self.engine.evaluate(&key, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::store::InMemoryLockStore;
    use crate::metadata::LockDefinition;

    fn evaluator(store: Arc<InMemoryLockStore>) -> LockEvaluator {
        let catalog = LockCatalog::from_definitions(vec![
            LockDefinition {
                name: "Basic".into(),
                default_key: "TRUE_BOOLEXP".into(),
                flags: 0,
            },
            LockDefinition {
                name: "Control".into(),
                default_key: "FALSE_BOOLEXP".into(),
                flags: 0,
            },
        ])
        .unwrap();
        LockEvaluator::new(Arc::new(catalog), store)
    }

    #[test]
    fn defaults_apply_without_an_override() {
        let ev = evaluator(Arc::new(InMemoryLockStore::new()));
        assert!(ev.evaluate(&5i64, 100, "basic"));
        assert!(!ev.evaluate(&5i64, 100, "Control"));
    }

    #[test]
    fn stored_override_wins() {
        let store = Arc::new(InMemoryLockStore::new());
        store.set(100, "Basic", "#7");
        let ev = evaluator(Arc::clone(&store));
        assert!(ev.evaluate(&7i64, 100, "Basic"));
        assert!(!ev.evaluate(&5i64, 100, "Basic"));
        assert!(ev.evaluate(&5i64, 101, "Basic"));
        assert_eq!(ev.effective_key(100, "BASIC").as_deref(), Some("#7"));
    }

    #[test]
    fn unknown_lock_types_deny() {
        let store = Arc::new(InMemoryLockStore::new());
        store.set(100, "Mystery", "TRUE_BOOLEXP");
        let ev = evaluator(store);
        assert!(!ev.evaluate(&5i64, 100, "Mystery"));
        assert!(!ev.evaluate(&5i64, 100, ""));
    }
}
