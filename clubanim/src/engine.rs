use crate::lane::Lane;

/// Frame bookkeeping of one engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationClockState {
    /// Timestamp (ms) of the last processed frame, `None` until the first frame.
    pub last_frame_timestamp: Option<f64>,
    pub running: bool,
}

/// Timing core of a marquee: lane offsets advanced frame by frame.
///
/// The engine owns no clock. Whoever drives it calls [`LaneEngine::tick`]
/// with monotonic frame timestamps in milliseconds.
#[derive(Debug, Clone)]
pub struct LaneEngine {
    lanes: Vec<Lane>,
    // Distance travelled into the current cycle, shared by both directions
    phases: Vec<f64>,
    clock: AnimationClockState,
}

impl LaneEngine {
    /// Builds a stopped engine with every lane at its initial offset.
    pub fn new(lanes: Vec<Lane>) -> Self {
        let phases = vec![0.0; lanes.len()];
        Self {
            lanes,
            phases,
            clock: AnimationClockState::default(),
        }
    }

    pub fn start(&mut self) {
        if self.clock.running {
            return;
        }
        self.clock.running = true;
        tracing::debug!(lanes = self.lanes.len(), "Lane engine started");
    }

    /// Stops the engine. The next start measures its first delta from zero.
    pub fn stop(&mut self) {
        if self.clock.running {
            tracing::debug!(lanes = self.lanes.len(), "Lane engine stopped");
        }
        self.clock.running = false;
        self.clock.last_frame_timestamp = None;
    }

    pub fn is_running(&self) -> bool {
        self.clock.running
    }

    pub fn clock_state(&self) -> AnimationClockState {
        self.clock
    }

    /// Processes one frame.
    ///
    /// Returns `false` without touching any offset when the engine is stopped
    /// or the timestamp is not a finite number. A timestamp older than the
    /// previous one counts as a zero delta.
    pub fn tick(&mut self, timestamp_ms: f64) -> bool {
        if !self.clock.running {
            return false;
        }
        if !timestamp_ms.is_finite() {
            tracing::warn!("Ignoring non-finite frame timestamp {}", timestamp_ms);
            return false;
        }

        let delta_seconds = match self.clock.last_frame_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.clock.last_frame_timestamp = Some(timestamp_ms);

        for (lane, phase) in self.lanes.iter().zip(self.phases.iter_mut()) {
            *phase = lane.advance(*phase, delta_seconds);
        }
        true
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Current offsets, indexed like the lanes.
    pub fn offsets(&self) -> Vec<f64> {
        self.lanes
            .iter()
            .zip(&self.phases)
            .map(|(lane, phase)| lane.offset_at(*phase))
            .collect()
    }

    pub fn offset(&self, lane: usize) -> Option<f64> {
        let phase = self.phases.get(lane)?;
        Some(self.lanes[lane].offset_at(*phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::Direction;
    use clubmedia::MediaRef;

    fn lane(direction: Direction, speed: f64, width: f64, count: usize) -> Lane {
        let items = (0..count)
            .map(|i| MediaRef::new(format!("lane/{i}.jpg")).unwrap())
            .collect();
        Lane::new(items, direction, speed, width).unwrap()
    }

    #[test]
    fn test_stopped_engine_ignores_frames() {
        let mut engine = LaneEngine::new(vec![lane(Direction::RightToLeft, 60.0, 250.0, 4)]);
        assert!(!engine.tick(0.0));
        assert!(!engine.tick(1000.0));
        assert_eq!(engine.offsets(), vec![0.0]);
    }

    #[test]
    fn test_first_frame_has_zero_delta() {
        let mut engine = LaneEngine::new(vec![lane(Direction::RightToLeft, 60.0, 250.0, 4)]);
        engine.start();
        assert!(engine.tick(5000.0));
        assert_eq!(engine.offset(0), Some(0.0));

        assert!(engine.tick(5500.0));
        assert_eq!(engine.offset(0), Some(-30.0));
    }

    #[test]
    fn test_backwards_timestamp_is_clamped() {
        let mut engine = LaneEngine::new(vec![lane(Direction::LeftToRight, 100.0, 100.0, 2)]);
        engine.start();
        engine.tick(1000.0);
        engine.tick(1500.0);
        assert_eq!(engine.offset(0), Some(-150.0));

        engine.tick(1200.0);
        assert_eq!(engine.offset(0), Some(-150.0));
        assert_eq!(engine.clock_state().last_frame_timestamp, Some(1200.0));
    }

    #[test]
    fn test_stop_resets_frame_timestamp() {
        let mut engine = LaneEngine::new(vec![lane(Direction::RightToLeft, 100.0, 100.0, 2)]);
        engine.start();
        engine.tick(0.0);
        engine.tick(500.0);
        engine.stop();
        assert_eq!(engine.clock_state().last_frame_timestamp, None);

        // The pause is not counted after a restart
        engine.start();
        engine.tick(60_000.0);
        assert_eq!(engine.offset(0), Some(-50.0));
    }

    #[test]
    fn test_empty_engine() {
        let mut engine = LaneEngine::new(Vec::new());
        engine.start();
        assert!(engine.tick(16.0));
        assert!(engine.offsets().is_empty());
        assert_eq!(engine.offset(0), None);
    }
}
