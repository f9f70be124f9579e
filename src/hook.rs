//! Context-creation instrumentation hook
//!
//! An explicitly installed, process-wide observer invoked synchronously
//! whenever a new context object is constructed, never when a `Shared`
//! derivation hands back the existing instance. Meant for test doubles and
//! observability, not production control flow; the installer is
//! responsible for clearing the hook so it does not leak into unrelated
//! evaluation sessions. With no hook installed the construction path does
//! nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::context::EvaluationContext;

/// Callback invoked with every newly constructed context.
pub type ContextCreationHook = Arc<dyn Fn(&EvaluationContext) + Send + Sync>;

static CREATION_HOOK: Mutex<Option<ContextCreationHook>> = Mutex::new(None);

/// Install the process-wide creation hook, replacing any previous one.
pub fn install_context_creation_hook<F>(hook: F)
where
    F: Fn(&EvaluationContext) + Send + Sync + 'static,
{
    *registry() = Some(Arc::new(hook));
    debug!("installed context creation hook");
}

/// Remove the process-wide creation hook.
pub fn clear_context_creation_hook() {
    *registry() = None;
    debug!("cleared context creation hook");
}

/// Invoke the hook for a newly constructed context, if one is installed.
///
/// The callback is cloned out of the registry before it runs, so a hook
/// that itself creates contexts cannot deadlock on the registry lock.
pub(crate) fn notify_context_created(context: &EvaluationContext) {
    let hook = registry().clone();
    if let Some(hook) = hook {
        hook(context);
    }
}

fn registry() -> MutexGuard<'static, Option<ContextCreationHook>> {
    CREATION_HOOK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
