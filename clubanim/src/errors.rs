use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarqueeError {
    #[error("Invalid lane configuration: {reason}")]
    InvalidLaneConfiguration { reason: String },
    #[error("Invalid typewriter configuration: {0}")]
    InvalidTypewriterConfiguration(String),
    #[error("Frame rate must be between 1 and 1000 fps, got {0}")]
    InvalidFrameRate(u32),
    #[error("Frame clock unavailable: {0}")]
    ClockUnavailable(String),
}

impl MarqueeError {
    pub fn invalid_lane(reason: impl Into<String>) -> Self {
        MarqueeError::InvalidLaneConfiguration {
            reason: reason.into(),
        }
    }

    pub fn invalid_typewriter(reason: impl Into<String>) -> Self {
        MarqueeError::InvalidTypewriterConfiguration(reason.into())
    }
}
