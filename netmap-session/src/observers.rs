//! §6 observer hooks, and the polymorphic logging/clock surfaces §9 calls
//! out as the crate's only capability-record seams.
//!
//! Modeled as boxed closures rather than a trait per hook: there is exactly
//! one call site for each, so a generic `S: Service<Request>` parameter
//! (the shape `candidate_set.rs` uses for its peer service) would be pure
//! ceremony here. What is kept from that idiom is the "capability record
//! with a default no-op implementation" shape itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ObserverError;
use crate::netmap::NetworkMap;
use crate::update::DebugMessage;
use crate::watchdog::ResetSink;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque per-call context threaded through `handle_non_keepalive` and
/// `on_debug`. The transport collaborator (§1) is expected to carry
/// cancellation/deadline information here; this crate never inspects it.
#[derive(Clone, Debug, Default)]
pub struct RequestContext(Arc<()>);

impl RequestContext {
    pub fn new() -> Self {
        RequestContext::default()
    }
}

fn noop_logger() -> Arc<dyn Fn(&str) + Send + Sync> {
    Arc::new(|_: &str| {})
}

fn noop_concise_summary() -> Arc<dyn Fn(&str) + Send + Sync> {
    Arc::new(|_: &str| {})
}

fn noop_self_node_changed() -> Arc<dyn Fn(Arc<NetworkMap>) + Send + Sync> {
    Arc::new(|_: Arc<NetworkMap>| {})
}

fn noop_on_debug() -> Arc<
    dyn Fn(RequestContext, DebugMessage, ResetSink) -> BoxFuture<'static, Result<(), ObserverError>>
        + Send
        + Sync,
> {
    Arc::new(|_ctx, _debug, _reset| Box::pin(async { Ok(()) }))
}

fn noop_cancel_hook() -> Arc<dyn Fn() + Send + Sync> {
    Arc::new(|| {})
}

/// All observer hooks and pluggable log sinks a [`crate::session::Session`]
/// dispatches to, grouped together the way a `tower::Service` bundles its
/// behavior into one swappable value. Every field defaults to a no-op
/// (§4.4 `new`: "discard-loggers and no-op observers").
#[derive(Clone)]
pub struct Observers {
    pub logger: Arc<dyn Fn(&str) + Send + Sync>,
    pub verbose_logger: Arc<dyn Fn(&str) + Send + Sync>,
    pub on_debug: Arc<
        dyn Fn(RequestContext, DebugMessage, ResetSink) -> BoxFuture<'static, Result<(), ObserverError>>
            + Send
            + Sync,
    >,
    pub on_concise_summary: Arc<dyn Fn(&str) + Send + Sync>,
    pub on_self_node_changed: Arc<dyn Fn(Arc<NetworkMap>) + Send + Sync>,
    pub cancel_hook: Arc<dyn Fn() + Send + Sync>,
}

impl Default for Observers {
    fn default() -> Self {
        Observers {
            logger: noop_logger(),
            verbose_logger: noop_logger(),
            on_debug: noop_on_debug(),
            on_concise_summary: noop_concise_summary(),
            on_self_node_changed: noop_self_node_changed(),
            cancel_hook: noop_cancel_hook(),
        }
    }
}
