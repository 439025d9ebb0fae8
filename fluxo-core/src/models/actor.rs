//! Actor identity and capability membership

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Capability required to fire a transition
///
/// Capability names follow the administration's role catalogue
/// (e.g. `DIRETOR_UE`, `COGESTOR_DRE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Identity surface the engine needs from a caller.
///
/// The engine never inspects roles or institution links; it only asks
/// whether the actor holds the capability a transition requires.
pub trait Actor: Send + Sync {
    /// Stable identifier recorded on audit entries
    fn id(&self) -> &str;

    /// Whether this actor holds the given capability
    fn has_capability(&self, capability: &Capability) -> bool;
}

/// In-memory actor backed by an explicit capability set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Actor identifier (registration number or service account name)
    pub id: String,
    /// Capabilities granted to this actor
    #[serde(default)]
    pub capabilities: HashSet<Capability>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: HashSet::new(),
        }
    }

    /// Grant a capability, builder-style
    pub fn grant(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(Capability::new(capability));
        self
    }
}

impl Actor for UserProfile {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_capability_membership() {
        let actor = UserProfile::new("6543210").grant("DIRETOR_UE");

        assert_eq!(actor.id(), "6543210");
        assert!(actor.has_capability(&Capability::from("DIRETOR_UE")));
        assert!(!actor.has_capability(&Capability::from("COGESTOR_DRE")));
    }

    #[test]
    fn test_capability_emptiness() {
        assert!(Capability::new("").is_empty());
        assert!(Capability::new("   ").is_empty());
        assert!(!Capability::new("DIRETOR_UE").is_empty());
    }

    #[test]
    fn test_capability_serializes_as_plain_string() {
        let json = serde_json::to_string(&Capability::from("DILOG_CRONOGRAMA")).unwrap();
        assert_eq!(json, "\"DILOG_CRONOGRAMA\"");
    }
}
