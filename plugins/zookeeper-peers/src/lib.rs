//! # zookeeper-peers
//!
//! Peer-relation handler for a ZooKeeper quorum. Reacts to the host's
//! joined/departed/changed hooks by toggling per-conversation flags, and
//! answers the queries coordination layers need: peer addresses for
//! ensemble assembly, the self-declared ZooKeeper leader, and which peers
//! have acknowledged the current rolling restart.
//!
//! ZooKeeper elects its own leader; host-side leadership is a separate
//! mechanism. Everything that moves through here is a small string marker
//! in the relation data bags.
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod keys;

pub use error::{PeersError, PeersResult};
pub use keys::{KeyResolver, RelationFlag};

use std::fmt;

use quorum_core::prelude::*;
use relation_state::{LeadershipStore, PeerNode, RelationStore};

/// value published for boolean markers (leader, restart acknowledgement)
static MARKER_TRUE: &str = "true";

/// A restart acknowledgement only counts when the bag value is the JSON
/// boolean `true`; anything else reads as absent.
fn marker_is_true(raw: &str) -> bool {
    serde_json::from_str::<bool>(raw.trim()).unwrap_or(false)
}

/// Peer-relation adapter, generic over the host-backed stores.
pub struct ZookeeperPeers<S, L> {
    keys: KeyResolver,
    store: S,
    leadership: L,
}

impl<S, L> fmt::Debug for ZookeeperPeers<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZookeeperPeers")
            .field("keys", &self.keys)
            .finish()
    }
}

impl<S, L> ZookeeperPeers<S, L>
where
    S: RelationStore,
    L: LeadershipStore,
{
    pub fn new(keys: KeyResolver, store: S, leadership: L) -> Self {
        Self {
            keys,
            store,
            leadership,
        }
    }

    /// Relation this handler serves.
    pub fn relation_name(&self) -> &str {
        self.keys.relation_name()
    }

    /// Key contract in use.
    pub fn keys(&self) -> &KeyResolver {
        &self.keys
    }

    // ------------------------------------------------------------------
    // Hook reactions
    // ------------------------------------------------------------------

    /// A peer joined: its conversation sheds `departed` and gains `joined`.
    pub async fn joined(&self, scope: &str) -> PeersResult<()> {
        self.store
            .clear_flag(scope, &self.keys.flag(RelationFlag::Departed))
            .await
            .map_err(PeersError::store)?;
        self.store
            .set_flag(scope, &self.keys.flag(RelationFlag::Joined))
            .await
            .map_err(PeersError::store)?;
        debug!(scope, "peer joined");
        Ok(())
    }

    /// A peer departed: the inverse of [`joined`]. The conversation and its
    /// last-known data stay readable until the host garbage-collects them.
    ///
    /// [`joined`]: ZookeeperPeers::joined
    pub async fn departed(&self, scope: &str) -> PeersResult<()> {
        self.store
            .clear_flag(scope, &self.keys.flag(RelationFlag::Joined))
            .await
            .map_err(PeersError::store)?;
        self.store
            .set_flag(scope, &self.keys.flag(RelationFlag::Departed))
            .await
            .map_err(PeersError::store)?;
        debug!(scope, "peer departed");
        Ok(())
    }

    /// A peer changed its published data. Raises `changed` only; join and
    /// departure state is left alone.
    pub async fn changed(&self, scope: &str) -> PeersResult<()> {
        self.store
            .set_flag(scope, &self.keys.flag(RelationFlag::Changed))
            .await
            .map_err(PeersError::store)?;
        debug!(scope, "peer data changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dismissals
    // ------------------------------------------------------------------

    /// Clear `joined` on every conversation once the batch is processed.
    pub async fn dismiss_joined(&self) -> PeersResult<()> {
        self.dismiss(RelationFlag::Joined).await
    }

    /// Clear `departed` on every conversation once the batch is processed.
    pub async fn dismiss_departed(&self) -> PeersResult<()> {
        self.dismiss(RelationFlag::Departed).await
    }

    /// Clear `changed` on every conversation once the batch is processed.
    pub async fn dismiss_changed(&self) -> PeersResult<()> {
        self.dismiss(RelationFlag::Changed).await
    }

    async fn dismiss(&self, flag: RelationFlag) -> PeersResult<()> {
        let name = self.keys.flag(flag);
        for scope in self.scopes().await? {
            self.store
                .clear_flag(&scope, &name)
                .await
                .map_err(PeersError::store)?;
        }
        debug!(flag = %name, "dismissed on all conversations");
        Ok(())
    }

    /// Scopes whose conversation currently carries the given flag.
    pub async fn flag_scopes(&self, flag: RelationFlag) -> PeersResult<Vec<String>> {
        let name = self.keys.flag(flag);
        let mut scopes = Vec::new();
        for scope in self.scopes().await? {
            if self
                .store
                .has_flag(&scope, &name)
                .await
                .map_err(PeersError::store)?
            {
                scopes.push(scope);
            }
        }
        Ok(scopes)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every known peer with whatever address it has advertised, in the
    /// store's scope order.
    pub async fn get_nodes(&self) -> PeersResult<Vec<PeerNode>> {
        let mut nodes = Vec::new();
        for scope in self.scopes().await? {
            let address = self.remote(&scope, self.keys.address_key()).await?;
            nodes.push(PeerNode { scope, address });
        }
        debug!(count = nodes.len(), "collected peer nodes");
        Ok(nodes)
    }

    /// Peers that acknowledged a restart under the current nonce.
    ///
    /// No nonce means no rolling restart in flight: the answer is empty no
    /// matter what stale acknowledgements the bags still carry.
    pub async fn restarted_nodes(&self) -> PeersResult<Vec<PeerNode>> {
        let Some(nonce) = self.current_nonce().await? else {
            return Ok(Vec::new());
        };
        let key = self.keys.restarted_key(&nonce);
        let mut nodes = Vec::new();
        for scope in self.scopes().await? {
            let acked = self
                .remote(&scope, &key)
                .await?
                .is_some_and(|raw| marker_is_true(&raw));
            if !acked {
                continue;
            }
            let address = self.remote(&scope, self.keys.address_key()).await?;
            nodes.push(PeerNode { scope, address });
        }
        debug!(%nonce, count = nodes.len(), "collected restart acknowledgements");
        Ok(nodes)
    }

    /// Publish the ZooKeeper leader marker to every peer.
    ///
    /// The unit that won ZooKeeper's own election calls this, regardless of
    /// which unit holds host-side leadership.
    pub async fn set_zk_leader(&self) -> PeersResult<()> {
        for scope in self.scopes().await? {
            self.store
                .set_local(&scope, self.keys.leader_key(), MARKER_TRUE)
                .await
                .map_err(PeersError::store)?;
        }
        info!("published leader marker to all peers");
        Ok(())
    }

    /// Address of the first peer that declared itself ZooKeeper leader.
    ///
    /// `None` when nobody has, or when the leader has yet to advertise an
    /// address.
    pub async fn find_zk_leader(&self) -> PeersResult<Option<String>> {
        for scope in self.scopes().await? {
            let declared = self
                .remote(&scope, self.keys.leader_key())
                .await?
                .is_some_and(|marker| !marker.trim().is_empty());
            if declared {
                return self.remote(&scope, self.keys.address_key()).await;
            }
        }
        Ok(None)
    }

    /// Acknowledge the current rolling restart to every peer.
    ///
    /// With no nonce set there is nothing to acknowledge and the call is a
    /// logged no-op.
    pub async fn inform_restart(&self) -> PeersResult<()> {
        let Some(nonce) = self.current_nonce().await? else {
            debug!("no restart nonce set, nothing to acknowledge");
            return Ok(());
        };
        let key = self.keys.restarted_key(&nonce);
        for scope in self.scopes().await? {
            self.store
                .set_local(&scope, &key, MARKER_TRUE)
                .await
                .map_err(PeersError::store)?;
        }
        info!(%nonce, "acknowledged restart to all peers");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Store helpers
    // ------------------------------------------------------------------

    async fn scopes(&self) -> PeersResult<Vec<String>> {
        self.store.scopes().await.map_err(PeersError::store)
    }

    async fn remote(&self, scope: &str, key: &str) -> PeersResult<Option<String>> {
        self.store
            .get_remote(scope, key)
            .await
            .map_err(PeersError::store)
    }

    /// Current restart nonce; empty values count as unset.
    async fn current_nonce(&self) -> PeersResult<Option<String>> {
        Ok(self
            .leadership
            .leader_get(self.keys.nonce_key())
            .await
            .map_err(PeersError::store)?
            .filter(|nonce| !nonce.trim().is_empty()))
    }
}

#[async_trait]
impl<S, L> RelationHandler for ZookeeperPeers<S, L>
where
    S: RelationStore,
    L: LeadershipStore,
{
    fn relation_name(&self) -> &str {
        self.keys.relation_name()
    }

    #[instrument(level = "debug", skip_all)]
    async fn on_event(&self, event: &HookEvent) -> Result<()> {
        debug!(hook = %event.hook_name(), unit = %event.remote_unit, "handling hook");
        match event.kind {
            HookKind::Joined => self.joined(&event.remote_unit).await?,
            HookKind::Departed => self.departed(&event.remote_unit).await?,
            HookKind::Changed => self.changed(&event.remote_unit).await?,
        }
        Ok(())
    }
}

impl<S, L> Register for ZookeeperPeers<S, L>
where
    S: RelationStore,
    L: LeadershipStore,
{
    fn register(self, router: &mut HookRouter) {
        router.handler(self);
    }
}
