use chrono::{DateTime, Utc};
use tally_types::LogRecord;

/// An unbroken run of positive counts, possibly fluctuating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub start_time: DateTime<Utc>,
    /// Always > 0.
    pub current_count: u32,
}

/// A drop below `candidate_count` that has not yet been confirmed.
///
/// `candidate_count` is the count that was current immediately before the drop,
/// not the lower reading that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReduction {
    pub candidate_count: u32,
    pub observed_at: DateTime<Utc>,
}

/// Everything the aggregator remembers between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregatorState {
    pub session: Option<ActiveSession>,
    pub pending: Option<PendingReduction>,
    pub last_detection: Option<DateTime<Utc>>,
}

impl AggregatorState {
    pub fn is_idle(&self) -> bool {
        self.session.is_none() && self.pending.is_none() && self.last_detection.is_none()
    }
}

/// What a single sample did to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Zero count with nothing open.
    Idle,
    /// First positive count after idle.
    Started { count: u32 },
    /// Count rose within the session; any pending drop is forgotten.
    Raised { from: u32, to: u32 },
    /// Same count as the session, nothing pending.
    Steady { count: u32 },
    /// Count came back to the session level before the drop was confirmed.
    Recovered { count: u32 },
    /// A lower count was seen for the first time.
    ReductionPending { candidate: u32, observed: u32 },
    /// A lower count was seen again, still inside the confirm window.
    ReductionWaiting { candidate: u32, observed: u32 },
    /// The drop held for the confirm window; a new session starts at `to`.
    ReductionConfirmed { from: u32, to: u32 },
    /// Zero count inside the silence window; the session stays open.
    Gap,
    /// Silence held for the confirm window; the session is closed.
    Ended { count: u32 },
}

impl Transition {
    /// True for transitions that close a session (whether or not it was logged).
    pub fn closes_session(&self) -> bool {
        matches!(
            self,
            Transition::ReductionConfirmed { .. } | Transition::Ended { .. }
        )
    }
}

/// Result of processing one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub transition: Transition,
    pub record: Option<LogRecord>,
}

impl Outcome {
    pub(crate) fn quiet(transition: Transition) -> Self {
        Self {
            transition,
            record: None,
        }
    }

    /// A session was closed but was too short to be logged.
    pub fn discarded(&self) -> bool {
        self.transition.closes_session() && self.record.is_none()
    }
}
