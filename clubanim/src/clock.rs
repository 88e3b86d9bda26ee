//! Per-frame clocks driving the marquee.
//!
//! A [`FrameClock`] invokes a one-shot callback on the next display frame
//! with the frame timestamp in milliseconds. Two implementations are
//! provided:
//!
//! - [`ManualFrameClock`]: frames are delivered explicitly, for tests and
//!   simulations.
//! - [`TokioFrameClock`]: frames fire on a tokio timer at a fixed rate.

use crate::errors::MarqueeError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_FRAME_RATE: u32 = 60;

const MAX_FRAME_RATE: u32 = 1000;

/// Callback fired once with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(u64);

pub trait FrameClock: Send + Sync {
    /// Schedules `callback` for the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a pending request. Unknown or already fired ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ManualQueue {
    next_id: u64,
    pending: Vec<(FrameRequestId, FrameCallback)>,
}

/// Clock whose frames are delivered by hand.
#[derive(Default)]
pub struct ManualFrameClock {
    queue: Mutex<ManualQueue>,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every callback pending at call time and returns how many fired.
    ///
    /// Requests made from inside a callback wait for the next delivery.
    pub fn deliver_frame(&self, timestamp_ms: f64) -> usize {
        let due = std::mem::take(&mut lock(&self.queue).pending);
        let fired = due.len();
        for (_, callback) in due {
            callback(timestamp_ms);
        }
        fired
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.queue).pending.len()
    }
}

impl FrameClock for ManualFrameClock {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let mut queue = lock(&self.queue);
        let id = FrameRequestId(queue.next_id);
        queue.next_id += 1;
        queue.pending.push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        lock(&self.queue).pending.retain(|(pending, _)| *pending != id);
    }
}

/// Clock firing frames from tokio timers at a fixed rate.
///
/// Timestamps are the milliseconds elapsed since the clock was created.
pub struct TokioFrameClock {
    interval: Duration,
    origin: Instant,
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<FrameRequestId, JoinHandle<()>>>>,
}

impl TokioFrameClock {
    /// Creates a clock on the current tokio runtime.
    pub fn new(frame_rate: u32) -> Result<Self, MarqueeError> {
        if frame_rate == 0 || frame_rate > MAX_FRAME_RATE {
            return Err(MarqueeError::InvalidFrameRate(frame_rate));
        }
        let runtime =
            Handle::try_current().map_err(|e| MarqueeError::ClockUnavailable(e.to_string()))?;

        tracing::debug!("Frame clock running at {} fps", frame_rate);

        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / frame_rate as f64),
            origin: Instant::now(),
            runtime,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn frame_interval(&self) -> Duration {
        self.interval
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl FrameClock for TokioFrameClock {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = FrameRequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let interval = self.interval;
        let origin = self.origin;
        let tasks = self.tasks.clone();

        // Held until the handle is registered so the task cannot unregister first
        let mut registry = lock(&self.tasks);
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            lock(&tasks).remove(&id);
            callback(origin.elapsed().as_secs_f64() * 1000.0);
        });
        registry.insert(id, handle);
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        if let Some(handle) = lock(&self.tasks).remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioFrameClock {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.tasks).drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_clock_delivers_once() {
        let clock = ManualFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        clock.request_frame(Box::new(move |_: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(clock.deliver_frame(16.0), 1);
        assert_eq!(clock.deliver_frame(32.0), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_clock_cancel() {
        let clock = ManualFrameClock::new();
        let id = clock.request_frame(Box::new(|_: f64| panic!("cancelled frame fired")));
        clock.cancel_frame(id);
        assert_eq!(clock.pending_count(), 0);
        assert_eq!(clock.deliver_frame(16.0), 0);
    }

    #[test]
    fn test_tokio_clock_requires_runtime() {
        assert!(matches!(
            TokioFrameClock::new(60),
            Err(MarqueeError::ClockUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_tokio_clock_rejects_zero_rate() {
        assert!(matches!(
            TokioFrameClock::new(0),
            Err(MarqueeError::InvalidFrameRate(0))
        ));
    }

    #[tokio::test]
    async fn test_tokio_clock_fires_with_elapsed_time() {
        let clock = TokioFrameClock::new(100).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        clock.request_frame(Box::new(move |ts: f64| {
            let _ = tx.send(ts);
        }));

        let ts = rx.await.unwrap();
        assert!(ts >= 10.0);
        assert_eq!(clock.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_tokio_clock_cancel() {
        let clock = TokioFrameClock::new(100).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let id = clock.request_frame(Box::new(move |_: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        clock.cancel_frame(id);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(clock.pending_count(), 0);
    }
}
