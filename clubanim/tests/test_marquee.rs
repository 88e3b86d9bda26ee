use clubanim::{
    COPIES_PER_LANE, Direction, Lane, LaneEngine, ManualFrameClock, Marquee, MarqueeError,
};
use clubmedia::MediaRef;
use std::sync::Arc;

fn items(count: usize) -> Vec<MediaRef> {
    (0..count)
        .map(|i| MediaRef::new(format!("carousel/item-{i}.jpg")).unwrap())
        .collect()
}

fn lane(direction: Direction, speed: f64, width: f64, count: usize) -> Lane {
    Lane::new(items(count), direction, speed, width).unwrap()
}

#[test]
fn test_right_to_left_cycle_returns_to_zero() {
    // cycle = 4 * 250 = 1000 px at 60 px/s: one cycle lasts 1000/60 s
    let mut engine = LaneEngine::new(vec![lane(Direction::RightToLeft, 60.0, 250.0, 4)]);
    engine.start();

    let frame_ms = 1000.0 / 60.0;
    for frame in 0..1000 {
        engine.tick(frame as f64 * frame_ms);
        let offset = engine.offset(0).unwrap();
        assert!(offset > -1000.0, "offset {offset} went past the cycle");
        assert!(offset <= 0.0);
    }

    // Frame 1000 lands exactly one cycle after frame 0
    engine.tick(1000.0 * frame_ms);
    assert_eq!(engine.offset(0), Some(0.0));
}

#[test]
fn test_mirrored_lanes_stay_synchronized() {
    let mut engine = LaneEngine::new(vec![
        lane(Direction::RightToLeft, 80.0, 100.0, 3),
        lane(Direction::LeftToRight, 80.0, 100.0, 3),
    ]);
    engine.start();
    let cycle = 300.0;

    // Binary-exact deltas, including a pause longer than two cycles
    let deltas = [0.0, 125.0, 250.0, 500.0, 62.5, 10_000.0, 125.0, 1875.0, 4000.0, 31.25];
    let mut timestamp = 0.0;
    for delta in deltas {
        timestamp += delta;
        engine.tick(timestamp);

        let rtl = engine.offset(0).unwrap();
        let ltr = engine.offset(1).unwrap();
        assert_eq!(rtl, -ltr - cycle, "desynchronized at {timestamp} ms");
        assert!(rtl > -cycle && rtl <= 0.0);
        assert!((-cycle..0.0).contains(&ltr));
    }
}

#[test]
fn test_mirrored_lanes_are_exact_at_display_rates() {
    for (speed, width) in [(60.0, 250.0), (37.3, 406.0)] {
        let mut engine = LaneEngine::new(vec![
            lane(Direction::RightToLeft, speed, width, 4),
            lane(Direction::LeftToRight, speed, width, 4),
        ]);
        engine.start();
        let cycle = engine.lanes()[0].cycle_width_px();

        for frame in 0..20_000u64 {
            // 60 fps with a few hundred microseconds of scheduling jitter
            let jitter = ((frame * 7919) % 13) as f64 * 0.037;
            engine.tick(frame as f64 * 1000.0 / 60.0 + jitter);

            let rtl = engine.offset(0).unwrap();
            let ltr = engine.offset(1).unwrap();
            assert_eq!(rtl, -ltr - cycle, "desynchronized at frame {frame}");
            assert!(rtl > -cycle && rtl <= 0.0);
            assert!((-cycle..0.0).contains(&ltr));
        }
    }
}

#[test]
fn test_long_pause_lands_in_range() {
    let mut engine = LaneEngine::new(vec![
        lane(Direction::RightToLeft, 100.0, 100.0, 3),
        lane(Direction::LeftToRight, 100.0, 100.0, 3),
    ]);
    engine.start();
    engine.tick(0.0);
    engine.tick(500.0);

    // 2 hours in the background
    engine.tick(500.0 + 7_200_000.0);

    assert_eq!(engine.offsets(), vec![-50.0, -250.0]);
}

#[test]
fn test_zero_speed_lane_is_static() {
    let mut engine = LaneEngine::new(vec![lane(Direction::LeftToRight, 0.0, 100.0, 2)]);
    engine.start();
    for frame in 0..100 {
        engine.tick(frame as f64 * 16.0);
    }
    assert_eq!(engine.offset(0), Some(-200.0));
}

#[test]
fn test_empty_lane_fails_before_scheduling() {
    let clock = Arc::new(ManualFrameClock::new());
    let marquee = Marquee::new(clock.clone());

    let result = Lane::new(Vec::new(), Direction::RightToLeft, 40.0, 232.0)
        .map(|lane| marquee.start(vec![lane]));

    assert!(matches!(
        result,
        Err(MarqueeError::InvalidLaneConfiguration { .. })
    ));
    assert_eq!(clock.pending_count(), 0);
    assert_eq!(marquee.running_count(), 0);
}

#[test]
fn test_no_updates_after_stop() {
    let clock = Arc::new(ManualFrameClock::new());
    let marquee = Marquee::new(clock.clone());
    let handle = marquee.start(vec![lane(Direction::RightToLeft, 100.0, 100.0, 4)]);
    let updates = marquee.subscribe(handle).unwrap();

    clock.deliver_frame(0.0);
    clock.deliver_frame(100.0);
    let before = updates.borrow().clone();
    assert_eq!(before, vec![-10.0]);

    marquee.stop(handle);
    marquee.stop(handle);

    assert_eq!(clock.pending_count(), 0);
    assert_eq!(clock.deliver_frame(200.0), 0);
    assert_eq!(clock.deliver_frame(300.0), 0);
    assert_eq!(*updates.borrow(), before);
    assert!(!marquee.is_running(handle));
    assert!(marquee.get_offsets(handle).is_none());
}

#[tokio::test]
async fn test_subscriber_sees_each_frame() {
    let clock = Arc::new(ManualFrameClock::new());
    let marquee = Marquee::new(clock.clone());
    let handle = marquee.start(vec![lane(Direction::LeftToRight, 50.0, 100.0, 2)]);
    let mut updates = marquee.subscribe(handle).unwrap();

    clock.deliver_frame(0.0);
    updates.changed().await.unwrap();
    assert_eq!(*updates.borrow_and_update(), vec![-200.0]);

    clock.deliver_frame(1000.0);
    updates.changed().await.unwrap();
    assert_eq!(*updates.borrow_and_update(), vec![-150.0]);

    marquee.stop(handle);
    assert!(updates.changed().await.is_err());
}

#[tokio::test]
async fn test_tokio_clock_drives_marquee() {
    let clock = Arc::new(clubanim::TokioFrameClock::new(100).unwrap());
    let marquee = Marquee::new(clock.clone());
    let handle = marquee.start(vec![lane(Direction::RightToLeft, 1000.0, 100.0, 10)]);
    let mut updates = marquee.subscribe(handle).unwrap();

    // First frame records the timestamp, the next ones move
    for _ in 0..3 {
        updates.changed().await.unwrap();
    }
    let offset = marquee.get_offsets(handle).unwrap()[&0];
    assert!(offset < 0.0 && offset > -1000.0);

    marquee.stop(handle);
    assert_eq!(clock.pending_count(), 0);
}

#[test]
fn test_render_sequence_is_tripled() {
    let lane = lane(Direction::RightToLeft, 40.0, 232.0, 5);
    let sequence = lane.render_sequence();
    assert_eq!(sequence.len(), 5 * COPIES_PER_LANE);
    assert_eq!(sequence[1].key(), "carousel/item-1.jpg");
    assert_eq!(sequence[6].key(), "carousel/item-1.jpg");
}
