use chrono::TimeDelta;

/// Timing windows that drive the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// How long a lower count must persist before the drop is trusted.
    pub reduction_confirm_window: TimeDelta,
    /// How long zero detections must persist before the session is closed.
    pub silence_confirm_window: TimeDelta,
    /// Sessions shorter than this are discarded without a record.
    pub min_detection_duration: TimeDelta,
}

impl AggregatorConfig {
    pub const DEFAULT_REDUCTION_CONFIRM_SECS: i64 = 5;
    pub const DEFAULT_SILENCE_CONFIRM_SECS: i64 = 5;
    pub const DEFAULT_MIN_DETECTION_SECS: i64 = 10;

    pub fn from_secs(reduction_confirm: i64, silence_confirm: i64, min_detection: i64) -> Self {
        Self {
            reduction_confirm_window: TimeDelta::seconds(reduction_confirm),
            silence_confirm_window: TimeDelta::seconds(silence_confirm),
            min_detection_duration: TimeDelta::seconds(min_detection),
        }
    }

    pub fn with_reduction_confirm_window(mut self, window: TimeDelta) -> Self {
        self.reduction_confirm_window = window;
        self
    }

    pub fn with_silence_confirm_window(mut self, window: TimeDelta) -> Self {
        self.silence_confirm_window = window;
        self
    }

    pub fn with_min_detection_duration(mut self, duration: TimeDelta) -> Self {
        self.min_detection_duration = duration;
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from_secs(
            Self::DEFAULT_REDUCTION_CONFIRM_SECS,
            Self::DEFAULT_SILENCE_CONFIRM_SECS,
            Self::DEFAULT_MIN_DETECTION_SECS,
        )
    }
}
