/// Latest-wins coalescing of calls within a time window.
///
/// Each [`Debouncer::call`] replaces the pending value and pushes the deadline
/// out to `now + window`; [`Debouncer::poll`] releases the value once the
/// deadline has passed. Time is supplied by the caller in milliseconds, so the
/// same call sequence always produces the same releases.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window_ms: u64,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline_ms: u64,
}

impl<T> Debouncer<T> {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// Schedule `value`, superseding anything pending.
    pub fn call(&mut self, value: T, now_ms: u64) {
        self.pending = Some(Pending {
            value,
            deadline_ms: now_ms.saturating_add(self.window_ms),
        });
    }

    /// Release the pending value if its deadline is at or before `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| p.deadline_ms <= now_ms) {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }

    /// Drop the pending value. Returns whether anything was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline_ms)
    }
}
