//! World-facing capabilities the engine consumes.
//!
//! The object graph and attribute storage belong to the server, not to this
//! crate. Functions that read attributes go through [`AttributeLookup`], a
//! synchronous, non-suspending capability injected at registry build time.
//! [`InMemoryWorld`] is a small thread-safe implementation used by the binary
//! and the tests.

use std::collections::HashMap;
use std::sync::RwLock;

/// Numeric object identity, written `#<n>` in softcode.
pub type Dbref = i64;

/// Parse `#123` into a dbref.
pub fn parse_dbref(text: &str) -> Option<Dbref> {
    text.trim().strip_prefix('#')?.parse().ok()
}

/// Read access to object attributes.
///
/// `target` is a specifier as typed by the player: `me`, `here`, `#<id>`, or
/// a bare object name. Implementations shared across sessions must be safe
/// for concurrent use.
pub trait AttributeLookup: Send + Sync {
    fn lookup(&self, actor: Dbref, target: &str, attribute: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
struct WorldObject {
    name: String,
    location: Option<Dbref>,
    attributes: HashMap<String, String>,
}

/// Minimal object table keyed by dbref.
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    objects: RwLock<HashMap<Dbref, WorldObject>>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&self, dbref: Dbref, name: &str, location: Option<Dbref>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(
                dbref,
                WorldObject {
                    name: name.to_string(),
                    location,
                    attributes: HashMap::new(),
                },
            );
        }
    }

    /// Store an attribute; names are case-insensitive. Returns false when the
    /// object does not exist.
    pub fn set_attribute(&self, dbref: Dbref, attribute: &str, value: &str) -> bool {
        let Ok(mut objects) = self.objects.write() else {
            return false;
        };
        match objects.get_mut(&dbref) {
            Some(object) => {
                object
                    .attributes
                    .insert(attribute.to_uppercase(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn resolve(objects: &HashMap<Dbref, WorldObject>, actor: Dbref, target: &str) -> Option<Dbref> {
        let target = target.trim();
        if target.is_empty() || target.eq_ignore_ascii_case("me") {
            return objects.contains_key(&actor).then_some(actor);
        }
        if target.eq_ignore_ascii_case("here") {
            return objects.get(&actor)?.location;
        }
        if target.starts_with('#') {
            return parse_dbref(target).filter(|d| objects.contains_key(d));
        }
        objects
            .iter()
            .filter(|(_, obj)| obj.name.eq_ignore_ascii_case(target))
            .map(|(dbref, _)| *dbref)
            .min()
    }
}

impl AttributeLookup for InMemoryWorld {
    fn lookup(&self, actor: Dbref, target: &str, attribute: &str) -> Option<String> {
        let objects = self.objects.read().ok()?;
        let dbref = Self::resolve(&objects, actor, target)?;
        objects
            .get(&dbref)?
            .attributes
            .get(&attribute.trim().to_uppercase())
            .cloned()
    }
}
