use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation flag for one in-flight `assistant_request_id`
/// (spec §5): [`crate::dispatch::cooperative::drive`] and
/// [`crate::dispatch::parallel::drive`] consult it between tickets and,
/// once set, stop popping new work and record `WorkflowFailed` instead of
/// draining further. An `Arc<AtomicBool>` shutdown flag checked by a
/// `std::thread`-based loop that can't use an async channel — the same
/// shape as the lag monitor shutdown flag in dashflow's websocket server.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
