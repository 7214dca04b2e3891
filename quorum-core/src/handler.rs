//! Relation handlers register with the router and are invoked once per
//! dispatched hook.
use anyhow::Result;
use async_trait::async_trait;

use crate::hook::HookEvent;

/// A handler for one relation's lifecycle hooks.
#[async_trait]
pub trait RelationHandler: Send + Sync + 'static {
    /// relation whose events this handler consumes
    fn relation_name(&self) -> &str;

    /// what to execute for each hook dispatched on this handler's relation
    ///
    /// An error aborts the dispatch and surfaces to the host, which owns
    /// retry: failed hooks are re-invoked by the orchestrator, so this
    /// method must tolerate re-running after a partial write.
    async fn on_event(&self, event: &HookEvent) -> Result<()>;
}
