//! quorum prelude

pub use crate::{
    Register,
    anyhow::{self, Context, Result},
    async_trait,
    handler::RelationHandler,
    hook::{HookEvent, HookKind, parse_hook_name},
    router::HookRouter,
    tokio,
    tracing::{self, debug, error, info, instrument, trace},
};

pub use std::sync::Arc;
