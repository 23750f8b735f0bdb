//! Clock and task seam for the journey runtime.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// Time source and task spawner the journey runtime is written against.
///
/// `TokioContext` drives a real app; `SimContext` in `carpath_sim` swaps in
/// a virtual clock so scenarios replay identically.
#[async_trait]
pub trait DriveContext: Send + Sync + 'static {
    /// Monotonic time since the context was created (virtual in simulation).
    fn now(&self) -> Duration;

    /// Wall-clock time used to stamp location fixes.
    fn system_time(&self) -> SystemTime;

    /// Waits for `duration`. A virtual clock jumps forward instead.
    async fn sleep(&self, duration: Duration);

    /// Runs `future` in the background. `name` labels the task's tracing span
    /// ("ticker", "route-fetch", "location-bridge").
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Seed the context was built with; 0 when unseeded.
    fn seed(&self) -> u64;
}
