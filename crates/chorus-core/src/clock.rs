use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A monotonic nanosecond clock shared by everything that needs to stamp
/// messages and events with a strictly increasing timestamp (spec §3:
/// "timestamp strictly orders messages produced by the same clock").
///
/// Wall-clock time can go backwards (NTP adjustment, leap seconds) or stall
/// (two calls within the same nanosecond); `now()` guards against both by
/// never returning a value less than or equal to the previous one.
#[derive(Debug, Default)]
pub struct Clock {
    last: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Returns a timestamp strictly greater than every timestamp this
    /// clock has previously returned.
    pub fn now(&self) -> i64 {
        let wall_clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);

        loop {
            let last = self.last.load(Ordering::SeqCst);
            let candidate = wall_clock.max(last + 1);
            if self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return candidate;
            }
        }
    }
}
