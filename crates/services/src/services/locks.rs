use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// In-process critical sections keyed by task id. Unrelated tasks never contend.
#[derive(Clone, Default)]
pub struct TaskLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TaskLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, task_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.inner.entry(task_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.inner.len())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_task_is_serialized() {
        let locks = TaskLocks::new();
        let task_id = Uuid::new_v4();

        let guard = locks.lock(task_id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(task_id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_tasks_do_not_contend() {
        let locks = TaskLocks::new();
        let _first = locks.lock(Uuid::new_v4()).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(Uuid::new_v4()));
        assert!(second.await.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = TaskLocks::new();
        let held = Uuid::new_v4();
        let _guard = locks.lock(held).await;
        drop(locks.lock(Uuid::new_v4()).await);

        assert_eq!(locks.len(), 2);
        assert_eq!(locks.prune_idle(), 1);
        assert_eq!(locks.len(), 1);
    }
}
