//! # clubanim
//!
//! Timing core of the site's animated sections: the infinite multi-lane
//! media marquee and the typing-text banner.
//!
//! Rendering is out of scope. The engines publish numbers (lane offsets in
//! pixels, visible text) that any rendering layer can consume.
//!
//! ```text
//! FrameClock ──frame(ts)──▶ Marquee ──tick──▶ LaneEngine ──▶ offsets (watch channel)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use clubanim::{Direction, Lane, ManualFrameClock, Marquee};
//! use clubmedia::MediaRef;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualFrameClock::new());
//! let marquee = Marquee::new(clock.clone());
//!
//! let items = vec![MediaRef::new("carousel/a.jpg").unwrap()];
//! let lane = Lane::new(items, Direction::RightToLeft, 50.0, 200.0).unwrap();
//! let handle = marquee.start(vec![lane]);
//!
//! clock.deliver_frame(0.0);
//! clock.deliver_frame(1000.0);
//! assert_eq!(marquee.get_offsets(handle).unwrap()[&0], -50.0);
//! ```

pub mod clock;
pub mod engine;
pub mod errors;
pub mod lane;
pub mod marquee;
pub mod typewriter;

#[cfg(feature = "clubconfig")]
pub mod config_ext;

pub use clock::{
    DEFAULT_FRAME_RATE, FrameCallback, FrameClock, FrameRequestId, ManualFrameClock,
    TokioFrameClock,
};
pub use engine::{AnimationClockState, LaneEngine};
pub use errors::MarqueeError;
pub use lane::{COPIES_PER_LANE, Direction, Lane};
pub use marquee::{EngineHandle, Marquee};
pub use typewriter::{Typewriter, TypewriterConfig, TypewriterState};

#[cfg(feature = "clubconfig")]
pub use config_ext::{LaneSettings, MarqueeConfigExt};
