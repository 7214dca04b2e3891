//! Flag and data-bag key contract for the quorum peer relation.
//!
//! Flag names and bag keys are a cross-layer string contract: reactive
//! layers above us watch `<relation>.joined`-style flags, and peers read
//! the bag keys this unit publishes. The resolver is a pure, stateless
//! translator from logical flag or key to concrete string, validated once
//! at construction so no malformed name reaches a store.

use config::PeersConfig;

use crate::error::{PeersError, PeersResult};

/// Logical per-conversation flags toggled by the relation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationFlag {
    Joined,
    Departed,
    Changed,
}

impl std::fmt::Display for RelationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationFlag::Joined => write!(f, "joined"),
            RelationFlag::Departed => write!(f, "departed"),
            RelationFlag::Changed => write!(f, "changed"),
        }
    }
}

/// All logical flags, for iteration.
pub const ALL_FLAGS: &[RelationFlag] = &[
    RelationFlag::Joined,
    RelationFlag::Departed,
    RelationFlag::Changed,
];

/// Pure key resolver: maps logical flags and bag keys to concrete strings.
///
/// Constructed from configuration. Validates that every field is non-empty
/// and free of unresolved placeholders, and that the relation name cannot
/// collide with the `<relation>.<flag>` namespace.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    cfg: PeersConfig,
}

impl KeyResolver {
    /// Create a resolver from explicit configuration.
    ///
    /// Returns an error if any field is empty, contains unresolved `{…}`
    /// placeholders, or if the relation name contains `.` or whitespace.
    pub fn new(cfg: PeersConfig) -> PeersResult<Self> {
        let resolver = Self { cfg };
        resolver.validate()?;
        Ok(resolver)
    }

    /// Create a resolver using all defaults.
    pub fn with_defaults() -> Self {
        Self {
            cfg: PeersConfig::default(),
        }
    }

    /// Relation this contract is scoped to.
    pub fn relation_name(&self) -> &str {
        self.cfg.relation_name()
    }

    /// Concrete flag string for a logical relation flag.
    pub fn flag(&self, flag: RelationFlag) -> String {
        format!("{}.{flag}", self.cfg.relation_name())
    }

    /// Remote-bag key carrying a peer's advertised address.
    pub fn address_key(&self) -> &str {
        self.cfg.address_key()
    }

    /// Remote-bag key for the coordination-service leader marker.
    pub fn leader_key(&self) -> &str {
        self.cfg.leader_key()
    }

    /// Leadership-store key holding the current restart nonce.
    pub fn nonce_key(&self) -> &str {
        self.cfg.nonce_key()
    }

    /// Restart acknowledgement key for the given nonce.
    pub fn restarted_key(&self, nonce: &str) -> String {
        format!("{}.{nonce}", self.cfg.restart_key_prefix())
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &PeersConfig {
        &self.cfg
    }

    /// Validate that all fields are non-empty and contain no unresolved
    /// `{…}` placeholders.
    fn validate(&self) -> PeersResult<()> {
        for (field, value) in [
            ("relation_name", self.cfg.relation_name()),
            ("address_key", self.cfg.address_key()),
            ("leader_key", self.cfg.leader_key()),
            ("restart_key_prefix", self.cfg.restart_key_prefix()),
            ("nonce_key", self.cfg.nonce_key()),
        ] {
            if value.trim().is_empty() {
                return Err(PeersError::Config(format!("'{field}' is empty")));
            }
            if value.contains('{') || value.contains('}') {
                return Err(PeersError::Config(format!(
                    "'{field}' contains unresolved placeholder: {value}"
                )));
            }
        }
        let name = self.cfg.relation_name();
        if name.contains('.') || name.chars().any(char::is_whitespace) {
            return Err(PeersError::Config(format!(
                "relation name cannot contain '.' or whitespace: {name}"
            )));
        }
        Ok(())
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
