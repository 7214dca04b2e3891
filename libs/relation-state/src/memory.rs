use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::{LeadershipStore, RelationStore};

/// key the substrate publishes each unit's address under, matching the
/// host-supplied entry production relations carry
pub static ADDRESS_KEY: &str = "private-address";

/// Whole-relation substrate held in process memory: every unit, their
/// pairwise conversations, and the shared leadership store. Cloning hands
/// out another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    inner: Arc<Mutex<ClusterInner>>,
}

#[derive(Debug, Default)]
struct ClusterInner {
    units: BTreeMap<String, UnitEntry>,
    leadership: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct UnitEntry {
    address: String,
    // conversations keyed by the remote unit's scope
    conversations: BTreeMap<String, ConversationEntry>,
}

#[derive(Debug, Default)]
struct ConversationEntry {
    // writes stop propagating once the pair is disconnected
    connected: bool,
    flags: HashSet<String>,
    // keys this unit published toward the remote unit
    local: HashMap<String, String>,
    // last-known view of what the remote unit published toward us
    remote: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("unknown unit in memory cluster: {0}")]
    UnknownUnit(String),
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit and hand back its view of the relation. Registering
    /// an existing scope updates the stored address.
    pub fn add_unit(&self, scope: &str, address: &str) -> MemoryUnit {
        let mut guard = self.inner.lock().expect("memory cluster lock poisoned");
        guard
            .units
            .entry(scope.to_owned())
            .or_default()
            .address = address.to_owned();

        MemoryUnit {
            scope: scope.to_owned(),
            cluster: self.clone(),
        }
    }

    /// View onto a registered unit.
    pub fn unit(&self, scope: &str) -> Option<MemoryUnit> {
        let guard = self.inner.lock().expect("memory cluster lock poisoned");
        guard.units.contains_key(scope).then(|| MemoryUnit {
            scope: scope.to_owned(),
            cluster: self.clone(),
        })
    }

    /// Pair two units: each gains a conversation with the other, with the
    /// other's current address published under [`ADDRESS_KEY`]. Reconnecting
    /// a severed pair replays each side's local bag into the other's remote
    /// view, so keys published while apart are not lost.
    pub fn connect(&self, a: &str, b: &str) -> Result<(), MemoryError> {
        if a == b {
            return Ok(());
        }
        let mut guard = self.inner.lock().expect("memory cluster lock poisoned");
        let addr_a = guard
            .units
            .get(a)
            .ok_or_else(|| MemoryError::UnknownUnit(a.to_owned()))?
            .address
            .clone();
        let addr_b = guard
            .units
            .get(b)
            .ok_or_else(|| MemoryError::UnknownUnit(b.to_owned()))?
            .address
            .clone();

        open_conversation(&mut guard, a, b, &addr_a, &addr_b);
        open_conversation(&mut guard, b, a, &addr_b, &addr_a);
        replay_local(&mut guard, a, b);
        replay_local(&mut guard, b, a);
        debug!(a, b, "connected peer units");
        Ok(())
    }

    /// Sever a pairing. Both conversations remain, frozen at their
    /// last-known remote data, until [`evict`] garbage-collects a side.
    ///
    /// [`evict`]: MemoryCluster::evict
    pub fn disconnect(&self, a: &str, b: &str) -> Result<(), MemoryError> {
        let mut guard = self.inner.lock().expect("memory cluster lock poisoned");
        for (unit, peer) in [(a, b), (b, a)] {
            let entry = guard
                .units
                .get_mut(unit)
                .ok_or_else(|| MemoryError::UnknownUnit(unit.to_owned()))?;
            if let Some(conv) = entry.conversations.get_mut(peer) {
                conv.connected = false;
            }
        }
        debug!(a, b, "disconnected peer units");
        Ok(())
    }

    /// Drop a unit and every conversation that references it.
    pub fn evict(&self, scope: &str) {
        let mut guard = self.inner.lock().expect("memory cluster lock poisoned");
        guard.units.remove(scope);
        for entry in guard.units.values_mut() {
            entry.conversations.remove(scope);
        }
        debug!(scope, "evicted unit");
    }
}

/// Ensure `from` has a conversation toward `to` carrying both published
/// addresses, and mark it connected.
fn open_conversation(
    guard: &mut ClusterInner,
    from: &str,
    to: &str,
    addr_from: &str,
    addr_to: &str,
) {
    let entry = guard
        .units
        .get_mut(from)
        .expect("caller checked unit exists");
    let conv = entry.conversations.entry(to.to_owned()).or_default();
    conv.connected = true;
    conv.local.insert(ADDRESS_KEY.to_owned(), addr_from.to_owned());
    conv.remote.insert(ADDRESS_KEY.to_owned(), addr_to.to_owned());
}

/// Copy everything `from` has published toward `to` into `to`'s remote
/// view, catching the pair up on keys written while they were apart.
fn replay_local(guard: &mut ClusterInner, from: &str, to: &str) {
    let pending: Vec<(String, String)> = guard
        .units
        .get(from)
        .and_then(|unit| unit.conversations.get(to))
        .map(|conv| {
            conv.local
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();
    if let Some(back) = guard
        .units
        .get_mut(to)
        .and_then(|unit| unit.conversations.get_mut(from))
    {
        back.remote.extend(pending);
    }
}

/// One unit's handle onto the cluster, scoped to its own conversations.
#[derive(Debug, Clone)]
pub struct MemoryUnit {
    scope: String,
    cluster: MemoryCluster,
}

impl MemoryUnit {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }
}

#[async_trait]
impl RelationStore for MemoryUnit {
    type Error = MemoryError;

    async fn scopes(&self) -> Result<Vec<String>, Self::Error> {
        let guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        Ok(guard
            .units
            .get(&self.scope)
            .map(|unit| unit.conversations.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_remote(&self, scope: &str, key: &str) -> Result<Option<String>, Self::Error> {
        let guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        Ok(guard
            .units
            .get(&self.scope)
            .and_then(|unit| unit.conversations.get(scope))
            .and_then(|conv| conv.remote.get(key))
            .cloned())
    }

    async fn set_local(&self, scope: &str, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        let connected = {
            let Some(conv) = guard
                .units
                .get_mut(&self.scope)
                .and_then(|unit| unit.conversations.get_mut(scope))
            else {
                // no conversation toward that scope, nothing to publish into
                return Ok(());
            };
            conv.local.insert(key.to_owned(), value.to_owned());
            conv.connected
        };

        if connected
            && let Some(back) = guard
                .units
                .get_mut(scope)
                .and_then(|peer| peer.conversations.get_mut(&self.scope))
        {
            back.remote.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }

    async fn set_flag(&self, scope: &str, flag: &str) -> Result<(), Self::Error> {
        let mut guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        if let Some(conv) = guard
            .units
            .get_mut(&self.scope)
            .and_then(|unit| unit.conversations.get_mut(scope))
        {
            conv.flags.insert(flag.to_owned());
        }
        Ok(())
    }

    async fn clear_flag(&self, scope: &str, flag: &str) -> Result<(), Self::Error> {
        let mut guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        if let Some(conv) = guard
            .units
            .get_mut(&self.scope)
            .and_then(|unit| unit.conversations.get_mut(scope))
        {
            conv.flags.remove(flag);
        }
        Ok(())
    }

    async fn has_flag(&self, scope: &str, flag: &str) -> Result<bool, Self::Error> {
        let guard = self.cluster.inner.lock().expect("memory cluster lock poisoned");
        Ok(guard
            .units
            .get(&self.scope)
            .and_then(|unit| unit.conversations.get(scope))
            .is_some_and(|conv| conv.flags.contains(flag)))
    }
}

#[async_trait]
impl LeadershipStore for MemoryCluster {
    type Error = MemoryError;

    async fn leader_get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let guard = self.inner.lock().expect("memory cluster lock poisoned");
        Ok(guard.leadership.get(key).cloned())
    }

    async fn leader_set(&self, key: &str, value: Option<&str>) -> Result<(), Self::Error> {
        let mut guard = self.inner.lock().expect("memory cluster lock poisoned");
        match value {
            Some(value) => {
                guard.leadership.insert(key.to_owned(), value.to_owned());
            }
            None => {
                guard.leadership.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::{ADDRESS_KEY, MemoryCluster, MemoryError};
    use crate::{LeadershipStore, RelationStore};

    #[tokio::test]
    #[traced_test]
    async fn connect_publishes_addresses_both_ways() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        let zk1 = cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");

        assert_eq!(zk0.scopes().await.expect("scopes"), vec!["zookeeper/1"]);
        assert_eq!(
            zk0.get_remote("zookeeper/1", ADDRESS_KEY)
                .await
                .expect("remote read"),
            Some("10.0.0.11".into())
        );
        assert_eq!(
            zk1.get_remote("zookeeper/0", ADDRESS_KEY)
                .await
                .expect("remote read"),
            Some("10.0.0.10".into())
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn writes_propagate_while_connected() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        let zk1 = cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");

        zk0.set_local("zookeeper/1", "is_zk_leader", "true")
            .await
            .expect("publish");
        assert_eq!(
            zk1.get_remote("zookeeper/0", "is_zk_leader")
                .await
                .expect("remote read"),
            Some("true".into())
        );
        // the writer does not see its own key as remote data
        assert_eq!(
            zk0.get_remote("zookeeper/1", "is_zk_leader")
                .await
                .expect("remote read"),
            None
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn disconnect_freezes_last_known_data() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        let zk1 = cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");

        zk0.set_local("zookeeper/1", "k", "v1").await.expect("publish");
        cluster
            .disconnect("zookeeper/0", "zookeeper/1")
            .expect("disconnect");
        zk0.set_local("zookeeper/1", "k", "v2").await.expect("publish");

        // conversation survives with the value from before the disconnect
        assert_eq!(zk1.scopes().await.expect("scopes"), vec!["zookeeper/0"]);
        assert_eq!(
            zk1.get_remote("zookeeper/0", "k").await.expect("remote read"),
            Some("v1".into())
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn reconnect_replays_data_published_while_apart() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        let zk1 = cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");
        cluster
            .disconnect("zookeeper/0", "zookeeper/1")
            .expect("disconnect");

        zk0.set_local("zookeeper/1", "k", "v2").await.expect("publish");
        assert_eq!(
            zk1.get_remote("zookeeper/0", "k").await.expect("remote read"),
            None
        );

        // re-pairing catches the peer up on everything written while apart
        cluster.connect("zookeeper/0", "zookeeper/1").expect("reconnect");
        assert_eq!(
            zk1.get_remote("zookeeper/0", "k").await.expect("remote read"),
            Some("v2".into())
        );
        assert_eq!(
            zk1.get_remote("zookeeper/0", ADDRESS_KEY)
                .await
                .expect("remote read"),
            Some("10.0.0.10".into())
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn evict_garbage_collects_conversations() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");

        cluster.evict("zookeeper/1");

        assert!(zk0.scopes().await.expect("scopes").is_empty());
        assert_eq!(
            zk0.get_remote("zookeeper/1", ADDRESS_KEY)
                .await
                .expect("remote read"),
            None
        );
        assert!(cluster.unit("zookeeper/1").is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn flags_track_per_conversation() {
        let cluster = MemoryCluster::new();
        let zk0 = cluster.add_unit("zookeeper/0", "10.0.0.10");
        cluster.add_unit("zookeeper/1", "10.0.0.11");
        cluster.connect("zookeeper/0", "zookeeper/1").expect("connect");

        zk0.set_flag("zookeeper/1", "cluster.joined").await.expect("set");
        assert!(zk0.has_flag("zookeeper/1", "cluster.joined").await.expect("has"));

        zk0.clear_flag("zookeeper/1", "cluster.joined").await.expect("clear");
        assert!(!zk0.has_flag("zookeeper/1", "cluster.joined").await.expect("has"));

        // unknown scopes are a quiet no-op
        zk0.set_flag("zookeeper/9", "cluster.joined").await.expect("set");
        assert!(!zk0.has_flag("zookeeper/9", "cluster.joined").await.expect("has"));
    }

    #[tokio::test]
    #[traced_test]
    async fn leadership_round_trip() {
        let cluster = MemoryCluster::new();
        assert_eq!(cluster.leader_get("restart_nonce").await.expect("get"), None);

        cluster
            .leader_set("restart_nonce", Some("a1b2"))
            .await
            .expect("set");
        assert_eq!(
            cluster.leader_get("restart_nonce").await.expect("get"),
            Some("a1b2".into())
        );

        cluster.leader_set("restart_nonce", None).await.expect("clear");
        assert_eq!(cluster.leader_get("restart_nonce").await.expect("get"), None);
    }

    #[tokio::test]
    #[traced_test]
    async fn connect_requires_registered_units() {
        let cluster = MemoryCluster::new();
        cluster.add_unit("zookeeper/0", "10.0.0.10");

        let err = cluster
            .connect("zookeeper/0", "zookeeper/9")
            .expect_err("unknown unit");
        assert!(matches!(err, MemoryError::UnknownUnit(scope) if scope == "zookeeper/9"));
    }
}
