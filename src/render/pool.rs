// src/render/pool.rs
// =============================================================================
// A fixed-size pool of render handles - the crawl's backpressure mechanism.
//
// Handles are expensive to create, so the pool builds `size` of them once and
// leases them out for the lifetime of the run. Because no task may fetch
// without a leased handle, "max concurrent fetches" IS "pool size": however
// many URLs are queued, fan-out past the pool size is impossible.
//
// How leasing works:
// 1. lease() scans the slots round-robin, starting one past the last lease
// 2. A free slot's handle is moved out (the slot becomes None) and handed to
//    the caller wrapped in a PoolLease
// 3. When every slot is empty, lease() parks on a Notify until some lease
//    is dropped
// 4. Dropping the PoolLease puts the handle back and wakes one waiter
//
// The RAII lease is what guarantees the "release on every exit path" rule:
// early returns, ? propagation, even panics all run the Drop impl. The slot
// state lives under a std::sync::Mutex (never held across an await); only
// the waiting is async.
// =============================================================================

use std::sync::Mutex;
use tokio::sync::Notify;

use super::{RenderBackend, RenderHandle};
use crate::error::CrawlError;

pub struct RenderPool {
    state: Mutex<PoolState>,
    /// Signalled once per returned handle
    available: Notify,
}

struct PoolState {
    /// None = currently leased
    slots: Vec<Option<Box<dyn RenderHandle>>>,
    /// Where the next lease() starts scanning (round-robin fairness)
    cursor: usize,
}

impl RenderPool {
    /// Creates `size` handles up front
    ///
    /// A handle creation failure here is structural: the run cannot start.
    pub async fn new(backend: &dyn RenderBackend, size: usize) -> Result<RenderPool, CrawlError> {
        let mut slots = Vec::with_capacity(size);
        for _ in 0..size {
            slots.push(Some(backend.new_handle().await?));
        }

        Ok(RenderPool {
            state: Mutex::new(PoolState { slots, cursor: 0 }),
            available: Notify::new(),
        })
    }

    /// Borrows a handle, suspending until one is free
    ///
    /// The handle returns to the pool when the lease is dropped.
    pub async fn lease(&self) -> PoolLease<'_> {
        loop {
            // Register interest before checking, so a release that lands
            // between the check and the await is not lost
            let notified = self.available.notified();

            {
                let mut state = self.state.lock().unwrap();
                let len = state.slots.len();
                for offset in 0..len {
                    let index = (state.cursor + offset) % len;
                    if state.slots[index].is_some() {
                        let handle = state.slots[index].take();
                        state.cursor = (index + 1) % len;
                        return PoolLease {
                            pool: self,
                            index,
                            handle,
                        };
                    }
                }
            }

            notified.await;
        }
    }

    fn release(&self, index: usize, handle: Box<dyn RenderHandle>) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(state.slots[index].is_none(), "slot released twice");
        state.slots[index] = Some(handle);
        drop(state);
        self.available.notify_one();
    }

    /// Closes every handle; called once all leases are back
    ///
    /// Close failures are collected rather than short-circuiting, so one bad
    /// handle doesn't leave the rest open.
    pub async fn close(&self) -> Result<(), CrawlError> {
        let handles: Vec<Box<dyn RenderHandle>> = {
            let mut state = self.state.lock().unwrap();
            state.slots.iter_mut().filter_map(Option::take).collect()
        };

        let mut failures = Vec::new();
        for mut handle in handles {
            if let Err(e) = handle.close().await {
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CrawlError::Structural(format!(
                "failed to close {} render handle(s): {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }
}

/// A leased handle; returns to the pool on drop
pub struct PoolLease<'a> {
    pool: &'a RenderPool,
    index: usize,
    handle: Option<Box<dyn RenderHandle>>,
}

impl PoolLease<'_> {
    pub fn handle_mut(&mut self) -> &mut dyn RenderHandle {
        // The Option is only None after Drop has run
        self.handle.as_mut().unwrap().as_mut()
    }
}

impl Drop for PoolLease<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release(self.index, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::MockSite;
    use std::time::Duration;

    #[tokio::test]
    async fn leases_block_when_pool_is_exhausted() {
        let backend = MockSite::new().backend();
        let pool = RenderPool::new(&backend, 2).await.unwrap();

        let first = pool.lease().await;
        let second = pool.lease().await;

        // Both handles are out: a third lease must not resolve yet
        let third = tokio::time::timeout(Duration::from_millis(50), pool.lease()).await;
        assert!(third.is_err(), "third lease should block on an empty pool");

        drop(first);

        // A returned handle unblocks the waiter
        let third = tokio::time::timeout(Duration::from_millis(50), pool.lease()).await;
        assert!(third.is_ok(), "lease should resolve after a release");

        drop(second);
        drop(third);
        pool.close().await.unwrap();
    }

    #[tokio::test]
    async fn lease_is_released_on_drop_even_after_errors() {
        let backend = MockSite::new().backend();
        let pool = RenderPool::new(&backend, 1).await.unwrap();

        {
            let mut lease = pool.lease().await;
            // Simulate a fetch that fails part-way through
            let _ = lease
                .handle_mut()
                .navigate("https://missing.test/", Duration::from_secs(1))
                .await;
            // lease dropped here, on the error path
        }

        // The single handle must be available again
        let again = tokio::time::timeout(Duration::from_millis(50), pool.lease()).await;
        assert!(again.is_ok(), "handle must return to the pool after drop");
    }

    #[tokio::test]
    async fn leases_rotate_round_robin() {
        let backend = MockSite::new().backend();
        let pool = RenderPool::new(&backend, 3).await.unwrap();

        let a = pool.lease().await;
        let index_a = a.index;
        drop(a);

        // With every slot free again, the cursor has moved past slot 0
        let b = pool.lease().await;
        assert_ne!(b.index, index_a, "consecutive leases should rotate slots");
    }
}
