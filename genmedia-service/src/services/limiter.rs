//! Caps concurrent provider calls. Saturation rejects instead of queueing.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct GenerationLimiter {
    permits: Option<Arc<Semaphore>>,
}

/// Held for the duration of one provider call.
pub struct GenerationPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl GenerationLimiter {
    /// `max_concurrent == 0` disables the limit.
    pub fn new(max_concurrent: usize) -> Self {
        let permits = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self { permits }
    }

    pub fn unlimited() -> Self {
        Self { permits: None }
    }

    /// A permit, or `None` when every slot is taken.
    pub fn try_acquire(&self) -> Option<GenerationPermit> {
        match &self.permits {
            None => Some(GenerationPermit { _permit: None }),
            Some(semaphore) => semaphore
                .clone()
                .try_acquire_owned()
                .ok()
                .map(|permit| GenerationPermit {
                    _permit: Some(permit),
                }),
        }
    }
}
