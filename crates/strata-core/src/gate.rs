//! Per-target round serialization
//!
//! Two rounds for one target would both read, merge and overwrite the same
//! artifact. [`RoundGate`] hands out one async lock per target so rounds
//! for a target run one at a time while different targets proceed in
//! parallel. A target's lock is dropped once no round holds or awaits it.

use dashmap::DashMap;
use std::sync::Arc;
use strata_artifact::TargetId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One lock per busy target
#[derive(Debug, Default)]
pub struct RoundGate {
    locks: DashMap<TargetId, Arc<Mutex<()>>>,
}

impl RoundGate {
    /// Empty gate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other round holds `target`
    ///
    /// The target stays locked until the returned guard is dropped.
    pub async fn enter(&self, target: &TargetId) -> GatePass<'_> {
        // Clone the Arc out so the map shard is not held across the await
        let lock = self
            .locks
            .entry(target.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        if lock.try_lock().is_err() {
            tracing::debug!(%target, "waiting for running round on target");
        }
        GatePass {
            gate: self,
            target: target.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Forget `target` unless another round still holds a handle to it
    fn release(&self, target: &TargetId) {
        // The map's own handle is the only one left
        self.locks
            .remove_if(target, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Whether a round currently holds `target`
    #[must_use]
    pub fn is_busy(&self, target: &TargetId) -> bool {
        self.locks
            .get(target)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of targets with a round running or waiting
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no round is running or waiting
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive hold on one target, released on drop
#[derive(Debug)]
pub struct GatePass<'a> {
    gate: &'a RoundGate,
    target: TargetId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl GatePass<'_> {
    /// Target held
    #[inline]
    #[must_use]
    pub fn target(&self) -> &TargetId {
        &self.target
    }
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        // Unlock first so the guard's handle no longer counts
        drop(self.guard.take());
        self.gate.release(&self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_target_is_exclusive() {
        let gate = Arc::new(RoundGate::new());
        let target = TargetId::from_task("todo");

        let guard = gate.enter(&target).await;
        assert!(gate.is_busy(&target));

        let waiter = {
            let gate = Arc::clone(&gate);
            let target = target.clone();
            tokio::spawn(async move {
                let _guard = gate.enter(&target).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(gate.len(), 1);
        waiter.await.unwrap();
        assert!(!gate.is_busy(&target));
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn different_targets_are_independent() {
        let gate = RoundGate::new();
        let _a = gate.enter(&TargetId::from_task("a")).await;
        let b = gate.enter(&TargetId::from_task("b")).await;
        assert_eq!(gate.len(), 2);
        assert_eq!(b.target(), &TargetId::from_task("b"));
        drop(b);
        assert_eq!(gate.len(), 1);
    }

    #[tokio::test]
    async fn finished_targets_are_forgotten() {
        let gate = RoundGate::new();
        for task in ["a", "b", "c"] {
            let _pass = gate.enter(&TargetId::from_task(task)).await;
        }
        assert!(gate.is_empty());
    }
}
