//! Marquee lanes: validated geometry and the per-frame wrap rule.

use crate::errors::MarqueeError;
use clubmedia::MediaRef;
use serde::{Deserialize, Serialize};

/// Number of concatenated copies of a lane's items the renderer must draw.
///
/// The hard reset applied when an offset crosses a full cycle is only
/// invisible when the item strip is at least this many times wider than
/// the cycle.
pub const COPIES_PER_LANE: usize = 3;

/// Float tolerance for the wrap comparisons, in pixels.
pub(crate) const WRAP_EPSILON_PX: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

/// One horizontal strip of media scrolling at a constant speed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    items: Vec<MediaRef>,
    direction: Direction,
    speed_px_per_second: f64,
    item_width_px: f64,
}

impl Lane {
    /// Validates and builds a lane.
    ///
    /// Fails with [`MarqueeError::InvalidLaneConfiguration`] when the lane has
    /// no item, when the speed is negative or not finite, or when the item
    /// width is not strictly positive. A speed of zero is accepted and yields
    /// a lane that never moves.
    pub fn new(
        items: Vec<MediaRef>,
        direction: Direction,
        speed_px_per_second: f64,
        item_width_px: f64,
    ) -> Result<Self, MarqueeError> {
        if items.is_empty() {
            return Err(MarqueeError::invalid_lane("lane has no items"));
        }
        if !speed_px_per_second.is_finite() || speed_px_per_second < 0.0 {
            return Err(MarqueeError::invalid_lane(format!(
                "speed must be a finite non-negative number, got {}",
                speed_px_per_second
            )));
        }
        if !item_width_px.is_finite() || item_width_px <= 0.0 {
            return Err(MarqueeError::invalid_lane(format!(
                "item width must be positive, got {}",
                item_width_px
            )));
        }

        Ok(Self {
            items,
            direction,
            speed_px_per_second,
            item_width_px,
        })
    }

    pub fn items(&self) -> &[MediaRef] {
        &self.items
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed_px_per_second(&self) -> f64 {
        self.speed_px_per_second
    }

    pub fn item_width_px(&self) -> f64 {
        self.item_width_px
    }

    /// Width of one full copy of the item list.
    pub fn cycle_width_px(&self) -> f64 {
        self.item_width_px * self.items.len() as f64
    }

    /// Offset a lane starts from: `0` when moving left, `-cycle` when moving right.
    pub fn initial_offset(&self) -> f64 {
        self.offset_at(0.0)
    }

    /// Items in the order the renderer draws them, repeated [`COPIES_PER_LANE`] times.
    pub fn render_sequence(&self) -> Vec<&MediaRef> {
        self.items
            .iter()
            .cycle()
            .take(self.items.len() * COPIES_PER_LANE)
            .collect()
    }

    /// Converts a travelled distance in `[0, cycle)` into this lane's offset.
    ///
    /// Left-to-right lanes sit at `phase - cycle`; right-to-left lanes are
    /// derived from that same value, so two lanes sharing a phase mirror each
    /// other bit for bit.
    pub fn offset_at(&self, phase: f64) -> f64 {
        let cycle = self.cycle_width_px();
        let left_to_right = phase - cycle;
        match self.direction {
            Direction::LeftToRight => left_to_right,
            Direction::RightToLeft => -left_to_right - cycle,
        }
    }

    /// Adds `delta_seconds` worth of travel to `phase` and applies the wrap rule.
    ///
    /// The phase stays in `[0, cycle)`. Crossing the cycle once resets it to
    /// `0`; overshooting by more than one extra cycle folds it back by modulo.
    pub(crate) fn advance(&self, phase: f64, delta_seconds: f64) -> f64 {
        let cycle = self.cycle_width_px();
        let moved = phase + self.speed_px_per_second * delta_seconds;

        if moved >= 2.0 * cycle - WRAP_EPSILON_PX {
            let rest = moved.rem_euclid(cycle);
            if rest >= cycle - WRAP_EPSILON_PX { 0.0 } else { rest }
        } else if moved >= cycle - WRAP_EPSILON_PX {
            0.0
        } else {
            moved
        }
    }
}
