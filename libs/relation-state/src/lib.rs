//! # relation-state
//!
//! `relation-state` defines the `RelationStore` and `LeadershipStore` traits
//! that bridge relation handlers to the host orchestrator's primitives: one
//! conversation per remote unit carrying a flag set and published data bags,
//! plus a process-wide leadership key-value store.
//!
//! Handlers stay generic over these traits. The host supplies production
//! implementations backed by its own state; [`memory`] provides an
//! in-process substrate that models a whole peer relation for tests and
//! embedded runs.
//!
//! [`memory`]: crate::memory
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;

/// A peer's scope paired with whatever address it has advertised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeerNode {
    /// scope identifying the remote unit (e.g. `zookeeper/1`)
    pub scope: String,
    /// address published by the peer, `None` until it advertises one
    pub address: Option<String>,
}

/// This unit's view of one peer relation, as maintained by the host.
///
/// Reads are eventually-consistent snapshots: the host refreshes remote
/// bags between hook invocations, never mid-operation. Absent scopes and
/// keys resolve to `None`/no-op rather than erroring, so callers can probe
/// freely.
#[async_trait]
pub trait RelationStore: Send + Sync + 'static {
    // send/sync/static required for async trait bounds
    type Error: std::error::Error + Send + Sync + 'static;

    /// scopes of every conversation this unit currently tracks
    async fn scopes(&self) -> Result<Vec<String>, Self::Error>;

    /// read a key the remote unit published toward us
    async fn get_remote(&self, scope: &str, key: &str) -> Result<Option<String>, Self::Error>;

    /// publish a key toward the remote unit, last write wins
    async fn set_local(&self, scope: &str, key: &str, value: &str) -> Result<(), Self::Error>;

    /// attach a named flag to the conversation
    async fn set_flag(&self, scope: &str, flag: &str) -> Result<(), Self::Error>;

    /// remove a named flag from the conversation
    async fn clear_flag(&self, scope: &str, flag: &str) -> Result<(), Self::Error>;

    /// whether the conversation currently carries the flag
    async fn has_flag(&self, scope: &str, flag: &str) -> Result<bool, Self::Error>;
}

/// Process-wide leadership key-value store maintained by the host.
///
/// Writes require host-side leadership; that check belongs to the host, not
/// this layer. Absent keys read as `None`.
#[async_trait]
pub trait LeadershipStore: Send + Sync + 'static {
    /// error surfaced by the backing store
    type Error: std::error::Error + Send + Sync + 'static;

    /// read a leadership value
    async fn leader_get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// write (`Some`) or clear (`None`) a leadership value
    async fn leader_set(&self, key: &str, value: Option<&str>) -> Result<(), Self::Error>;
}
