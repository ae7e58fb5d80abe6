// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::ExecutionError;

/// Consumer-driven backpressure gate bounding unreleased in-flight items.
///
/// Before the producer may pull the (N+1)th item it must acquire a lease;
/// `acquire` suspends while `limit` leases are outstanding. Capacity comes
/// back one unit at a time when the consumer drops a [`GateLease`] after
/// folding the item's result into a batch. This inverts control relative to
/// a producer-side counted semaphore: the consumer regulates how fast the
/// producer may advance.
///
/// Waiting on a full gate is normal backpressure, not an error; no timeout
/// is imposed.
#[derive(Clone)]
pub struct BackpressureGate {
    permits: Arc<Semaphore>,
}

/// One unit of gate capacity. Released on drop.
pub struct GateLease {
    _permit: OwnedSemaphorePermit,
}

impl BackpressureGate {
    /// Create a gate admitting at most `limit` unreleased items. Clamped to
    /// a minimum of 1.
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<GateLease, ExecutionError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutionError::Internal {
                message: "backpressure gate closed while producer active".into(),
            })?;
        Ok(GateLease { _permit: permit })
    }

    /// Non-blocking acquire; `None` when the gate is at capacity.
    pub fn try_acquire(&self) -> Option<GateLease> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| GateLease { _permit: permit })
    }

    /// Currently free slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
