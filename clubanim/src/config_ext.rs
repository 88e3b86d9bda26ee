//! Extension reading marquee and typewriter settings from clubconfig.

use crate::clock::TokioFrameClock;
use crate::lane::{Direction, Lane};
use crate::typewriter::TypewriterConfig;
use anyhow::{Result, anyhow};
use clubconfig::Config;
use clubmedia::MediaRef;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of `marquee.lanes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSettings {
    pub direction: Direction,
    /// Pixels per second
    pub speed: f64,
    pub item_width: f64,
    pub items: Vec<MediaRef>,
}

impl LaneSettings {
    pub fn into_lane(self) -> Result<Lane> {
        Ok(Lane::new(
            self.items,
            self.direction,
            self.speed,
            self.item_width,
        )?)
    }
}

/// Content of the `typewriter` section, durations in milliseconds
#[derive(Debug, Clone, Deserialize)]
struct TypewriterSettings {
    phrases: Vec<String>,
    typing_ms: Option<u64>,
    deleting_ms: Option<u64>,
    hold_ms: Option<u64>,
    gap_ms: Option<u64>,
    #[serde(default = "default_looping")]
    looping: bool,
}

fn default_looping() -> bool {
    true
}

/// Extension trait giving typed access to the animation settings
///
/// # Example
///
/// ```rust,ignore
/// use clubanim::{Marquee, MarqueeConfigExt};
/// use clubconfig::get_config;
///
/// let config = get_config();
/// let marquee = Marquee::new(Arc::new(config.create_frame_clock()?));
/// let handle = marquee.start(config.get_marquee_lanes()?);
/// ```
pub trait MarqueeConfigExt {
    /// Validated lanes from `marquee.lanes`
    fn get_marquee_lanes(&self) -> Result<Vec<Lane>>;

    /// Replaces `marquee.lanes`
    fn set_marquee_lanes(&self, lanes: &[LaneSettings]) -> Result<()>;

    /// Tokio clock running at `marquee.frame_rate`
    fn create_frame_clock(&self) -> Result<TokioFrameClock>;

    /// Typewriter settings from the `typewriter` section
    fn get_typewriter_config(&self) -> Result<TypewriterConfig>;
}

impl MarqueeConfigExt for Config {
    fn get_marquee_lanes(&self) -> Result<Vec<Lane>> {
        let settings: Vec<LaneSettings> = self.get_typed(&["marquee", "lanes"])?;
        settings
            .into_iter()
            .enumerate()
            .map(|(index, lane)| {
                lane.into_lane()
                    .map_err(|e| anyhow!("marquee.lanes[{}]: {}", index, e))
            })
            .collect()
    }

    fn set_marquee_lanes(&self, lanes: &[LaneSettings]) -> Result<()> {
        self.set_typed(&["marquee", "lanes"], &lanes)
    }

    fn create_frame_clock(&self) -> Result<TokioFrameClock> {
        let rate = self.get_frame_rate()?;
        let rate = u32::try_from(rate).map_err(|_| anyhow!("Frame rate {} is too large", rate))?;
        Ok(TokioFrameClock::new(rate)?)
    }

    fn get_typewriter_config(&self) -> Result<TypewriterConfig> {
        let settings: TypewriterSettings = self.get_typed(&["typewriter"])?;
        let defaults = TypewriterConfig::default();

        Ok(TypewriterConfig {
            phrases: settings.phrases,
            typing_interval: settings
                .typing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.typing_interval),
            deleting_interval: settings
                .deleting_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.deleting_interval),
            hold_duration: settings
                .hold_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.hold_duration),
            gap_duration: settings
                .gap_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.gap_duration),
            looping: settings.looping,
        })
    }
}
