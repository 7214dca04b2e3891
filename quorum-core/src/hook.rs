//! Hook names & events
//!
//! The host orchestrator invokes this layer once per relation lifecycle
//! event, naming each invocation `<relation>-relation-<kind>`. This module
//! models those names and the event payload handlers receive. Dispatch is
//! serialized by the host: one hook runs at a time, so handlers never see
//! concurrent events for the same unit.
use std::fmt;

/// separator the host places between the relation name and the hook kind
const HOOK_SEP: &str = "-relation-";

/// Lifecycle hook kinds delivered for a peer relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// a remote unit joined the relation
    Joined,
    /// a remote unit departed the relation
    Departed,
    /// a remote unit changed the data it publishes
    Changed,
}

/// All hook kinds, in lifecycle order.
pub const ALL_HOOK_KINDS: &[HookKind] = &[HookKind::Joined, HookKind::Changed, HookKind::Departed];

impl HookKind {
    /// suffix used in concrete hook names
    pub fn suffix(&self) -> &'static str {
        match self {
            HookKind::Joined => "joined",
            HookKind::Departed => "departed",
            HookKind::Changed => "changed",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "joined" => Some(HookKind::Joined),
            "departed" => Some(HookKind::Departed),
            "changed" => Some(HookKind::Changed),
            _ => None,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Split a concrete hook name into its relation name and hook kind.
///
/// Returns `None` for names outside the `<relation>-relation-<kind>`
/// contract (config-changed, upgrade hooks, and so on). That is a normal
/// outcome, not an error; the router reports such events as unclaimed.
pub fn parse_hook_name(name: &str) -> Option<(&str, HookKind)> {
    // relation names may themselves contain the separator, kinds cannot
    let at = name.rfind(HOOK_SEP)?;
    let (relation, rest) = name.split_at(at);
    let kind = HookKind::from_suffix(&rest[HOOK_SEP.len()..])?;
    if relation.is_empty() {
        return None;
    }
    Some((relation, kind))
}

/// One dispatched hook occurrence: which relation, which lifecycle kind,
/// and the scope of the remote unit the event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    /// relation the hook fired for
    pub relation: String,
    /// which lifecycle hook fired
    pub kind: HookKind,
    /// scope identifying the remote unit (e.g. `zookeeper/1`)
    pub remote_unit: String,
}

impl HookEvent {
    /// Create an event from its parts.
    pub fn new(
        relation: impl Into<String>,
        kind: HookKind,
        remote_unit: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            kind,
            remote_unit: remote_unit.into(),
        }
    }

    /// Build an event from a concrete hook name, as a host shim would.
    pub fn from_hook_name(name: &str, remote_unit: impl Into<String>) -> Option<Self> {
        let (relation, kind) = parse_hook_name(name)?;
        Some(Self::new(relation, kind, remote_unit))
    }

    /// Concrete hook name under the host's naming contract.
    pub fn hook_name(&self) -> String {
        format!("{}{}{}", self.relation, HOOK_SEP, self.kind)
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.hook_name(), self.remote_unit)
    }
}
