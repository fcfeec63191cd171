//! Replay guard: stops the same request from applying twice.
//!
//! A request ID is claimed when the request is received. If the request
//! completes, the claim is kept; if it is rejected, the claim is released
//! so the caller may fix the input and resubmit under the same ID.
//! Resubmitting an ID that is claimed (in flight or completed) fails with
//! [`TreasuryError::InvalidInput`].
//!
//! Completed IDs are kept in a bounded window; when the window is full the
//! oldest completed ID is forgotten.

use std::collections::VecDeque;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use treasury_types::{RequestId, Result, TreasuryError};

pub struct ReplayGuard {
    /// Claimed IDs, in flight or completed.
    claimed: DashMap<RequestId, ()>,
    /// Completion order for eviction (front = oldest).
    completed: Mutex<VecDeque<RequestId>>,
    /// Maximum number of completed IDs remembered.
    max_size: usize,
}

impl ReplayGuard {
    /// Create a guard remembering up to `max_size` completed requests.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "ReplayGuard max_size must be > 0");
        Self {
            claimed: DashMap::new(),
            completed: Mutex::new(VecDeque::with_capacity(max_size.min(4096))),
            max_size,
        }
    }

    /// Claim `id` for a request about to run.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `id` is already claimed.
    pub fn claim(&self, id: RequestId) -> Result<()> {
        match self.claimed.entry(id) {
            Entry::Occupied(_) => Err(TreasuryError::InvalidInput {
                reason: format!("request {id} already submitted"),
            }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(())
            }
        }
    }

    /// Drop the claim of a rejected request.
    pub fn release(&self, id: RequestId) {
        self.claimed.remove(&id);
    }

    /// Keep the claim of a completed request, evicting the oldest if full.
    pub fn commit(&self, id: RequestId) {
        let mut completed = self.completed.lock();
        if completed.len() >= self.max_size {
            if let Some(oldest) = completed.pop_front() {
                self.claimed.remove(&oldest);
            }
        }
        completed.push_back(id);
    }

    /// Whether `id` is currently claimed.
    pub fn is_claimed(&self, id: &RequestId) -> bool {
        self.claimed.contains_key(id)
    }

    /// Number of IDs currently claimed.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
