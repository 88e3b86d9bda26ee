//! Multi-instance marquee manager.
//!
//! Every call to [`Marquee::start`] creates an independent engine instance
//! bound to the manager's [`FrameClock`]. Each frame callback advances the
//! instance's [`LaneEngine`], publishes the new offsets and requests the next
//! frame while the instance is running.

use crate::clock::{FrameClock, FrameRequestId};
use crate::engine::LaneEngine;
use crate::lane::Lane;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;

/// Identifies one running marquee instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineHandle(u64);

struct Instance {
    engine: LaneEngine,
    /// Frame request currently queued on the clock
    pending: Option<FrameRequestId>,
    offsets: watch::Sender<Vec<f64>>,
}

type SharedInstance = Arc<Mutex<Instance>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Marquee {
    clock: Arc<dyn FrameClock>,
    instances: Mutex<HashMap<EngineHandle, SharedInstance>>,
    next_handle: AtomicU64,
}

impl std::fmt::Debug for Marquee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marquee")
            .field("running", &self.running_count())
            .finish()
    }
}

impl Marquee {
    pub fn new(clock: Arc<dyn FrameClock>) -> Self {
        Self {
            clock,
            instances: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
        }
    }

    /// Starts a new instance animating `lanes` and schedules its first frame.
    ///
    /// Lanes are validated by [`Lane::new`], so an invalid configuration is
    /// rejected before anything reaches the clock.
    pub fn start(&self, lanes: Vec<Lane>) -> EngineHandle {
        let handle = EngineHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));

        let mut engine = LaneEngine::new(lanes);
        engine.start();
        let (offsets, _) = watch::channel(engine.offsets());
        let lane_count = engine.lanes().len();

        let instance = Arc::new(Mutex::new(Instance {
            engine,
            pending: None,
            offsets,
        }));

        {
            let mut guard = lock(&instance);
            schedule(&self.clock, &instance, &mut guard);
        }
        lock(&self.instances).insert(handle, instance);

        tracing::info!(?handle, lanes = lane_count, "Marquee started");
        handle
    }

    /// Stops an instance and cancels its pending frame.
    ///
    /// Stopping an unknown or already stopped handle does nothing.
    pub fn stop(&self, handle: EngineHandle) {
        let Some(instance) = lock(&self.instances).remove(&handle) else {
            tracing::debug!(?handle, "Stop requested for unknown marquee");
            return;
        };

        let mut guard = lock(&instance);
        guard.engine.stop();
        if let Some(id) = guard.pending.take() {
            self.clock.cancel_frame(id);
        }
        tracing::info!(?handle, "Marquee stopped");
    }

    /// Stops every running instance.
    pub fn stop_all(&self) {
        let handles: Vec<EngineHandle> = lock(&self.instances).keys().copied().collect();
        for handle in handles {
            self.stop(handle);
        }
    }

    /// Last published offsets of an instance, keyed by lane index.
    pub fn get_offsets(&self, handle: EngineHandle) -> Option<HashMap<usize, f64>> {
        let instance = self.instance(handle)?;
        let guard = lock(&instance);
        let offsets = guard.offsets.borrow();
        Some(offsets.iter().copied().enumerate().collect())
    }

    /// Receiver notified once per processed frame with the new offsets.
    pub fn subscribe(&self, handle: EngineHandle) -> Option<watch::Receiver<Vec<f64>>> {
        let instance = self.instance(handle)?;
        let guard = lock(&instance);
        Some(guard.offsets.subscribe())
    }

    pub fn is_running(&self, handle: EngineHandle) -> bool {
        self.instance(handle)
            .map(|instance| lock(&instance).engine.is_running())
            .unwrap_or(false)
    }

    pub fn running_count(&self) -> usize {
        lock(&self.instances).len()
    }

    fn instance(&self, handle: EngineHandle) -> Option<SharedInstance> {
        lock(&self.instances).get(&handle).cloned()
    }
}

impl Drop for Marquee {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Queues the next frame of `instance` on the clock.
fn schedule(clock: &Arc<dyn FrameClock>, instance: &SharedInstance, guard: &mut Instance) {
    let weak = Arc::downgrade(instance);
    let frame_clock = clock.clone();
    let id = clock.request_frame(Box::new(move |timestamp_ms: f64| {
        on_frame(&frame_clock, &weak, timestamp_ms);
    }));
    guard.pending = Some(id);
}

fn on_frame(clock: &Arc<dyn FrameClock>, weak: &Weak<Mutex<Instance>>, timestamp_ms: f64) {
    let Some(instance) = weak.upgrade() else {
        return;
    };

    let mut guard = lock(&instance);
    guard.pending = None;
    // A stop may have won the race against an already dequeued frame
    if !guard.engine.is_running() {
        return;
    }

    if guard.engine.tick(timestamp_ms) {
        let offsets = guard.engine.offsets();
        guard.offsets.send_replace(offsets);
    }
    schedule(clock, &instance, &mut guard);
}
