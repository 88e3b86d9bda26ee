#![cfg(feature = "clubconfig")]

use clubanim::{Direction, LaneSettings, MarqueeConfigExt, Typewriter};
use clubconfig::Config;
use clubmedia::{MediaKind, MediaRef};
use std::time::Duration;

fn load(dir: &tempfile::TempDir) -> Config {
    Config::load_config(dir.path().to_str().unwrap()).unwrap()
}

#[test]
fn test_default_lanes() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);

    let lanes = config.get_marquee_lanes().unwrap();
    assert_eq!(lanes.len(), 2);
    assert_eq!(lanes[0].direction(), Direction::RightToLeft);
    assert_eq!(lanes[1].direction(), Direction::LeftToRight);
    assert_eq!(lanes[0].item_width_px(), 232.0);
    assert_eq!(lanes[0].items()[3].kind(), MediaKind::Video);
}

#[test]
fn test_invalid_lane_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "marquee:\n  lanes:\n    - direction: left_to_right\n      speed: 10.0\n      item_width: 100.0\n      items: []\n",
    )
    .unwrap();

    let err = load(&dir).get_marquee_lanes().unwrap_err();
    assert!(err.to_string().contains("marquee.lanes[0]"));
}

#[test]
fn test_set_lanes_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);

    config
        .set_marquee_lanes(&[LaneSettings {
            direction: Direction::LeftToRight,
            speed: 12.5,
            item_width: 180.0,
            items: vec![MediaRef::new("events/fair.jpg").unwrap()],
        }])
        .unwrap();

    let lanes = load(&dir).get_marquee_lanes().unwrap();
    assert_eq!(lanes.len(), 1);
    assert_eq!(lanes[0].speed_px_per_second(), 12.5);
    assert_eq!(lanes[0].items()[0].key(), "events/fair.jpg");
}

#[test]
fn test_typewriter_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);

    let tw = config.get_typewriter_config().unwrap();
    assert_eq!(tw.phrases.len(), 3);
    assert_eq!(tw.typing_interval, Duration::from_millis(90));
    assert_eq!(tw.hold_duration, Duration::from_millis(1800));
    assert!(tw.looping);
    assert!(Typewriter::new(tw).is_ok());
}

#[tokio::test]
async fn test_frame_clock_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);
    config.set_frame_rate(50).unwrap();

    let clock = config.create_frame_clock().unwrap();
    assert_eq!(clock.frame_interval(), Duration::from_millis(20));
}
