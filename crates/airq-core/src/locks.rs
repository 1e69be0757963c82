//! Keyed async locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use airq_types::SensorId;

/// One async mutex per sensor, created on first use.
///
/// Holders of the guard for a sensor exclude every other holder for the same
/// sensor; different sensors never contend.
#[derive(Debug, Default)]
pub struct SensorLocks {
    locks: Mutex<HashMap<SensorId, Arc<Mutex<()>>>>,
}

impl SensorLocks {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sensor_id`.
    pub async fn lock(&self, sensor_id: SensorId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(sensor_id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_sensor_is_exclusive() {
        let locks = Arc::new(SensorLocks::new());
        let guard = locks.lock(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_sensors_do_not_contend() {
        let locks = SensorLocks::new();
        let _first = locks.lock(1).await;
        let _second = tokio::time::timeout(Duration::from_millis(100), locks.lock(2))
            .await
            .expect("independent sensor should lock immediately");
        assert_eq!(locks.locks.lock().await.len(), 2);
    }
}
