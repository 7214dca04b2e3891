//! # Router
//!
//! Holds the registered relation handlers and drives them to completion for
//! each hook event the host dispatches.
use std::{fmt, sync::Arc};

use anyhow::Result;
use tracing::{debug, warn};

use crate::{handler::RelationHandler, hook::HookEvent};

/// Handy type alias for the dispatch list entries
pub(crate) type HandlerFn = Arc<dyn RelationHandler>;

/// Holds the list of relation handlers. The host calls [`dispatch`] once per
/// lifecycle event; handlers whose relation matches run in registration
/// order.
///
/// [`dispatch`]: HookRouter::dispatch
#[derive(Default)]
pub struct HookRouter {
    /// all handlers, in registration order
    handlers: Vec<HandlerFn>,
}

impl fmt::Debug for HookRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRouter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl HookRouter {
    /// Make a new router with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to the dispatch list.
    pub fn handler<H, U>(&mut self, handler: U) -> &mut Self
    where
        U: Into<Arc<H>>,
        H: RelationHandler,
    {
        self.handlers.push(handler.into());
        self
    }

    /// number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// whether any handlers are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch one hook event, returning how many handlers ran.
    ///
    /// The first handler error aborts the dispatch and is returned to the
    /// host; handlers later in the list do not run. An event no handler
    /// claims is reported at debug level and counts zero.
    pub async fn dispatch(&self, event: &HookEvent) -> Result<usize> {
        let mut ran = 0;
        for handler in &self.handlers {
            if handler.relation_name() != event.relation {
                continue;
            }
            if let Err(err) = handler.on_event(event).await {
                warn!(?err, hook = %event.hook_name(), "relation handler failed");
                return Err(err);
            }
            ran += 1;
        }
        if ran == 0 {
            debug!(hook = %event.hook_name(), "no handler claimed the event");
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;
    use async_trait::async_trait;

    use super::*;
    use crate::hook::HookKind;

    #[derive(Debug, Default)]
    struct Recording {
        name: &'static str,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl RelationHandler for Recording {
        fn relation_name(&self) -> &str {
            self.name
        }

        async fn on_event(&self, _event: &HookEvent) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl RelationHandler for Failing {
        fn relation_name(&self) -> &str {
            "cluster"
        }

        async fn on_event(&self, _event: &HookEvent) -> Result<()> {
            bail!("boom")
        }
    }

    #[tokio::test]
    async fn routes_by_relation_name() {
        let cluster = Arc::new(Recording {
            name: "cluster",
            seen: AtomicUsize::new(0),
        });
        let other = Arc::new(Recording {
            name: "database",
            seen: AtomicUsize::new(0),
        });
        let mut router = HookRouter::new();
        router
            .handler::<Recording, _>(Arc::clone(&cluster))
            .handler::<Recording, _>(Arc::clone(&other));

        let event = HookEvent::new("cluster", HookKind::Joined, "app/1");
        let ran = router.dispatch(&event).await.unwrap();

        assert_eq!(ran, 1);
        assert_eq!(cluster.seen.load(Ordering::SeqCst), 1);
        assert_eq!(other.seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unclaimed_event_runs_nothing() {
        let cluster = Arc::new(Recording {
            name: "cluster",
            seen: AtomicUsize::new(0),
        });
        let mut router = HookRouter::new();
        router.handler::<Recording, _>(Arc::clone(&cluster));

        let event = HookEvent::new("telemetry", HookKind::Changed, "app/1");
        let ran = router.dispatch(&event).await.unwrap();

        assert_eq!(ran, 0);
        assert_eq!(cluster.seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_error_aborts_dispatch() {
        let after = Arc::new(Recording {
            name: "cluster",
            seen: AtomicUsize::new(0),
        });
        let mut router = HookRouter::new();
        router
            .handler(Failing)
            .handler::<Recording, _>(Arc::clone(&after));

        let event = HookEvent::new("cluster", HookKind::Departed, "app/2");
        let err = router.dispatch(&event).await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
        // registration order is dispatch order, nothing after the failure ran
        assert_eq!(after.seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handlers_run_in_registration_order() {
        let first = Arc::new(Recording {
            name: "cluster",
            seen: AtomicUsize::new(0),
        });
        let second = Arc::new(Recording {
            name: "cluster",
            seen: AtomicUsize::new(0),
        });
        let mut router = HookRouter::new();
        router
            .handler::<Recording, _>(Arc::clone(&first))
            .handler::<Recording, _>(Arc::clone(&second));
        assert_eq!(router.len(), 2);

        let event = HookEvent::new("cluster", HookKind::Changed, "app/0");
        let ran = router.dispatch(&event).await.unwrap();

        assert_eq!(ran, 2);
        assert_eq!(first.seen.load(Ordering::SeqCst), 1);
        assert_eq!(second.seen.load(Ordering::SeqCst), 1);
    }
}
