//! Typing-text animation of the hero banner.
//!
//! The animation types a phrase one character at a time, holds it, deletes
//! it, waits a moment and moves on to the next phrase.

use crate::errors::MarqueeError;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypewriterConfig {
    pub phrases: Vec<String>,
    /// Time between two typed characters
    pub typing_interval: Duration,
    /// Time between two deleted characters
    pub deleting_interval: Duration,
    /// How long a complete phrase stays displayed
    pub hold_duration: Duration,
    /// Pause with an empty text before the next phrase
    pub gap_duration: Duration,
    pub looping: bool,
}

impl TypewriterConfig {
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases,
            ..Default::default()
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            phrases: Vec::new(),
            typing_interval: Duration::from_millis(90),
            deleting_interval: Duration::from_millis(45),
            hold_duration: Duration::from_millis(1800),
            gap_duration: Duration::from_millis(400),
            looping: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypewriterState {
    Typing,
    Holding,
    Deleting,
    Waiting,
    Finished,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    config: TypewriterConfig,
    phrase_index: usize,
    /// Characters of the current phrase currently visible
    visible: usize,
    text: String,
    state: TypewriterState,
    /// Time already spent in the current step
    carried: Duration,
    last_frame_timestamp: Option<f64>,
}

impl Typewriter {
    /// Builds a typewriter positioned before the first character of the first phrase.
    ///
    /// Rejects an empty phrase list, empty phrases and zero typing or
    /// deleting intervals.
    pub fn new(config: TypewriterConfig) -> Result<Self, MarqueeError> {
        if config.phrases.is_empty() {
            return Err(MarqueeError::invalid_typewriter("no phrases"));
        }
        if let Some(index) = config.phrases.iter().position(String::is_empty) {
            return Err(MarqueeError::invalid_typewriter(format!(
                "phrase {} is empty",
                index
            )));
        }
        if config.typing_interval.is_zero() || config.deleting_interval.is_zero() {
            return Err(MarqueeError::invalid_typewriter(
                "typing and deleting intervals must be positive",
            ));
        }

        Ok(Self {
            config,
            phrase_index: 0,
            visible: 0,
            text: String::new(),
            state: TypewriterState::Typing,
            carried: Duration::ZERO,
            last_frame_timestamp: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> TypewriterState {
        self.state
    }

    pub fn phrase_index(&self) -> usize {
        self.phrase_index
    }

    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.phrase_index = 0;
        self.visible = 0;
        self.text.clear();
        self.state = TypewriterState::Typing;
        self.carried = Duration::ZERO;
        self.last_frame_timestamp = None;
    }

    /// Consumes `elapsed` through as many steps as it covers and returns the text.
    ///
    /// A looping typewriter skips whole passes over its phrases first, so a
    /// long pause costs at most one pass.
    pub fn advance(&mut self, elapsed: Duration) -> &str {
        let mut budget = self.carried.saturating_add(elapsed);
        if self.config.looping {
            budget = fold(budget, self.loop_period());
        }

        while let Some(step) = self.step_duration() {
            if budget < step {
                break;
            }
            budget -= step;
            self.step();
        }

        self.carried = if self.state == TypewriterState::Finished {
            Duration::ZERO
        } else {
            budget
        };
        &self.text
    }

    /// Advances from a frame timestamp in milliseconds.
    ///
    /// The first frame only records its timestamp. Timestamps going
    /// backwards count as no elapsed time.
    pub fn tick(&mut self, timestamp_ms: f64) -> &str {
        if !timestamp_ms.is_finite() {
            return &self.text;
        }

        let elapsed_ms = self
            .last_frame_timestamp
            .map(|last| (timestamp_ms - last).max(0.0))
            .unwrap_or(0.0);
        self.last_frame_timestamp = Some(timestamp_ms);

        let elapsed = Duration::try_from_secs_f64(elapsed_ms / 1000.0).unwrap_or(Duration::MAX);
        self.advance(elapsed)
    }

    /// Time needed to type, hold, delete and leave every phrase once.
    fn loop_period(&self) -> Duration {
        let config = &self.config;
        config.phrases.iter().fold(Duration::ZERO, |total, phrase| {
            let chars = u32::try_from(phrase.chars().count()).unwrap_or(u32::MAX);
            total
                .saturating_add(config.typing_interval.saturating_mul(chars))
                .saturating_add(config.hold_duration)
                .saturating_add(config.deleting_interval.saturating_mul(chars))
                .saturating_add(config.gap_duration)
        })
    }

    fn step_duration(&self) -> Option<Duration> {
        match self.state {
            TypewriterState::Typing => Some(self.config.typing_interval),
            TypewriterState::Holding => Some(self.config.hold_duration),
            TypewriterState::Deleting => Some(self.config.deleting_interval),
            TypewriterState::Waiting => Some(self.config.gap_duration),
            TypewriterState::Finished => None,
        }
    }

    fn current_phrase(&self) -> &str {
        &self.config.phrases[self.phrase_index]
    }

    fn step(&mut self) {
        match self.state {
            TypewriterState::Typing => {
                if let Some(c) = self.current_phrase().chars().nth(self.visible) {
                    self.text.push(c);
                    self.visible += 1;
                }
                if self.visible >= self.current_phrase().chars().count() {
                    self.state = TypewriterState::Holding;
                }
            }
            TypewriterState::Holding => {
                let last = self.phrase_index + 1 == self.config.phrases.len();
                self.state = if last && !self.config.looping {
                    tracing::debug!("Typewriter finished on phrase {}", self.phrase_index);
                    TypewriterState::Finished
                } else {
                    TypewriterState::Deleting
                };
            }
            TypewriterState::Deleting => {
                self.text.pop();
                self.visible = self.visible.saturating_sub(1);
                if self.visible == 0 {
                    self.state = TypewriterState::Waiting;
                }
            }
            TypewriterState::Waiting => {
                self.phrase_index = (self.phrase_index + 1) % self.config.phrases.len();
                self.state = TypewriterState::Typing;
            }
            TypewriterState::Finished => {}
        }
    }
}

fn fold(budget: Duration, period: Duration) -> Duration {
    if period.is_zero() || budget < period {
        return budget;
    }
    let rest = budget.as_nanos() % period.as_nanos();
    Duration::new(
        (rest / 1_000_000_000) as u64,
        (rest % 1_000_000_000) as u32,
    )
}
