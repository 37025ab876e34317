// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::StoreError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

const DEFAULT_BLOCKING_WORKERS: usize = 4;
const DEFAULT_OVERFLOW_WORKERS: usize = 2;

/// Bounded gateway onto tokio's blocking threads.
///
/// [`run_queued`](Self::run_queued) waits for a worker slot and suits short
/// database calls. [`run_blocking`](Self::run_blocking) fails fast with
/// [`StoreError::Busy`] once the overflow slots are gone too, for expensive work
/// such as password hashing.
#[derive(Clone)]
pub struct BlockingPool {
    blocking: Arc<Semaphore>,
    overflow: Arc<Semaphore>,
}

impl BlockingPool {
    pub fn new(blocking_workers: usize, overflow_workers: usize) -> Self {
        Self {
            blocking: Arc::new(Semaphore::new(blocking_workers)),
            overflow: Arc::new(Semaphore::new(overflow_workers)),
        }
    }

    pub fn default_pool() -> Self {
        Self::new(DEFAULT_BLOCKING_WORKERS, DEFAULT_OVERFLOW_WORKERS)
    }

    /// Waits for a worker slot, then runs `task`.
    pub async fn run_queued<F, R>(&self, context: &'static str, task: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .blocking
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| StoreError::Blocking {
                context,
                message: err.to_string(),
            })?;

        Self::spawn_with_permit(context, permit, task).await
    }

    pub async fn run_blocking<F, R>(&self, context: &'static str, task: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = match self.blocking.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => match self.overflow.clone().try_acquire_owned() {
                Ok(permit) => {
                    log::warn!(
                        "Blocking pool overflow used for {} (pool saturated)",
                        context
                    );
                    permit
                }
                Err(_) => return Err(StoreError::Busy { context }),
            },
        };

        Self::spawn_with_permit(context, permit, task).await
    }

    async fn spawn_with_permit<F, R>(
        context: &'static str,
        _permit: OwnedSemaphorePermit,
        task: F,
    ) -> Result<R, StoreError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        tokio::task::spawn_blocking(task)
            .await
            .map_err(|err| StoreError::Blocking {
                context,
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocking_pool_returns_busy_when_saturated() {
        let pool = BlockingPool::new(1, 0);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let (hold_tx, hold_rx) = std::sync::mpsc::channel::<()>();
        let pool_clone = pool.clone();

        let hold_task = tokio::spawn(async move {
            pool_clone
                .run_blocking("hold", move || {
                    let _ = ready_tx.send(());
                    let _ = hold_rx.recv();
                })
                .await
        });

        ready_rx.await.expect("ready signal");
        let err = pool
            .run_blocking("second", || {})
            .await
            .expect_err("expected busy error");
        assert!(err.is_busy());

        let _ = hold_tx.send(());
        let result = hold_task.await.expect("join ok");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn queued_call_waits_for_free_slot() {
        let pool = BlockingPool::new(1, 0);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let (hold_tx, hold_rx) = std::sync::mpsc::channel::<()>();
        let pool_clone = pool.clone();

        let hold_task = tokio::spawn(async move {
            pool_clone
                .run_queued("hold", move || {
                    let _ = ready_tx.send(());
                    let _ = hold_rx.recv();
                })
                .await
        });
        ready_rx.await.expect("ready signal");

        let queued_pool = pool.clone();
        let queued = tokio::spawn(async move { queued_pool.run_queued("second", || 7).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!queued.is_finished());

        let _ = hold_tx.send(());
        assert!(hold_task.await.expect("join ok").is_ok());
        assert_eq!(queued.await.expect("join ok").expect("result"), 7);
    }

    #[tokio::test]
    async fn blocking_pool_returns_task_result() {
        let pool = BlockingPool::default_pool();
        let value = pool.run_blocking("sum", || 2 + 3).await.expect("result");
        assert_eq!(value, 5);
    }
}
