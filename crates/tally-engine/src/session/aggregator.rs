use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tally_types::{Error, LogRecord, Result, Sample};

use super::types::{ActiveSession, AggregatorState, Outcome, PendingReduction, Transition};
use crate::AggregatorConfig;

/// Debounces a stream of per-frame counts into presence-session records.
///
/// One instance per detector stream. Samples must arrive in non-decreasing time
/// order; the aggregator does no locking and never blocks, so it is driven by a
/// single processing loop.
///
/// # Example
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use tally_engine::{AggregatorConfig, SessionAggregator};
/// use tally_types::Sample;
///
/// let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
/// let at = |secs: i64, count: u32| Sample::new(t0 + TimeDelta::seconds(secs), count);
///
/// let mut aggregator = SessionAggregator::new(AggregatorConfig::default());
/// assert!(aggregator.process(at(0, 2)).is_none());
/// assert!(aggregator.process(at(15, 2)).is_none());
/// assert!(aggregator.process(at(17, 0)).is_none());
///
/// let record = aggregator.process(at(20, 0)).unwrap();
/// assert_eq!(record.count, 2);
/// assert_eq!(record.duration, TimeDelta::seconds(15));
/// assert!(aggregator.is_idle());
/// ```
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    config: AggregatorConfig,
    state: AggregatorState,
    // Latest sample time seen; guards the ordering precondition.
    watermark: Option<DateTime<Utc>>,
}

impl SessionAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            state: AggregatorState::default(),
            watermark: None,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn state(&self) -> &AggregatorState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Process one sample and return the record it finalized, if any.
    ///
    /// Delivering a sample older than the previous one is a caller bug; debug
    /// builds panic on it. Use [`try_process`](Self::try_process) to get an error
    /// instead.
    pub fn process(&mut self, sample: Sample) -> Option<LogRecord> {
        debug_assert!(
            self.check_order(&sample).is_ok(),
            "samples must be delivered in time order: {} arrived after {:?}",
            sample.time,
            self.watermark
        );
        self.apply(sample).record
    }

    /// Like [`process`](Self::process), but rejects out-of-order samples with
    /// [`Error::InvalidInput`] and leaves the state untouched.
    pub fn try_process(&mut self, sample: Sample) -> Result<Option<LogRecord>> {
        self.step(sample).map(|outcome| outcome.record)
    }

    /// Process one sample and report which transition it caused.
    pub fn step(&mut self, sample: Sample) -> Result<Outcome> {
        self.check_order(&sample)?;
        Ok(self.apply(sample))
    }

    /// Close the open session as if silence had just been confirmed.
    ///
    /// Used when the stream is known to be over. The session ends at the last
    /// detection and is logged only if it is long enough. The aggregator is idle
    /// afterwards.
    pub fn flush(&mut self) -> Option<LogRecord> {
        self.flush_outcome().and_then(|outcome| outcome.record)
    }

    /// Like [`flush`](Self::flush), but reports the closed session even when it
    /// was too short to be logged. `None` means no session was open.
    pub fn flush_outcome(&mut self) -> Option<Outcome> {
        let state = std::mem::take(&mut self.state);
        let session = state.session?;
        let last_detection = state.last_detection?;
        Some(Outcome {
            transition: Transition::Ended {
                count: session.current_count,
            },
            record: self.finalize(session.current_count, session.start_time, last_detection),
        })
    }

    fn check_order(&self, sample: &Sample) -> Result<()> {
        match self.watermark {
            Some(last) if sample.time < last => Err(Error::InvalidInput(format!(
                "sample at {} arrived after {}; time must not move backwards",
                sample.time, last
            ))),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, sample: Sample) -> Outcome {
        self.watermark = Some(match self.watermark {
            Some(last) => last.max(sample.time),
            None => sample.time,
        });

        let outcome = if sample.is_detection() {
            self.on_detection(sample)
        } else {
            self.on_silence(sample.time)
        };

        tracing::trace!(
            time = %sample.time,
            count = sample.count,
            transition = ?outcome.transition,
            "sample processed"
        );
        outcome
    }

    fn on_detection(&mut self, sample: Sample) -> Outcome {
        let Sample { time, count } = sample;
        self.state.last_detection = Some(time);

        let Some(session) = self.state.session else {
            self.start_session(time, count);
            return Outcome::quiet(Transition::Started { count });
        };
        let current = session.current_count;

        match count.cmp(&current) {
            Ordering::Greater => {
                self.state.session = Some(ActiveSession {
                    current_count: count,
                    ..session
                });
                self.state.pending = None;
                Outcome::quiet(Transition::Raised {
                    from: current,
                    to: count,
                })
            }
            Ordering::Equal => {
                if self.state.pending.take().is_some() {
                    Outcome::quiet(Transition::Recovered { count })
                } else {
                    Outcome::quiet(Transition::Steady { count })
                }
            }
            Ordering::Less => match self.state.pending {
                None => {
                    self.state.pending = Some(PendingReduction {
                        candidate_count: current,
                        observed_at: time,
                    });
                    Outcome::quiet(Transition::ReductionPending {
                        candidate: current,
                        observed: count,
                    })
                }
                Some(pending)
                    if time - pending.observed_at >= self.config.reduction_confirm_window =>
                {
                    let record = self.finalize(
                        pending.candidate_count,
                        session.start_time,
                        pending.observed_at,
                    );
                    self.start_session(time, count);
                    Outcome {
                        transition: Transition::ReductionConfirmed {
                            from: pending.candidate_count,
                            to: count,
                        },
                        record,
                    }
                }
                Some(pending) => Outcome::quiet(Transition::ReductionWaiting {
                    candidate: pending.candidate_count,
                    observed: count,
                }),
            },
        }
    }

    fn on_silence(&mut self, time: DateTime<Utc>) -> Outcome {
        let Some(last_detection) = self.state.last_detection else {
            return Outcome::quiet(Transition::Idle);
        };

        if time - last_detection < self.config.silence_confirm_window {
            return Outcome::quiet(Transition::Gap);
        }

        let state = std::mem::take(&mut self.state);
        match state.session {
            Some(session) => Outcome {
                transition: Transition::Ended {
                    count: session.current_count,
                },
                record: self.finalize(session.current_count, session.start_time, last_detection),
            },
            None => Outcome::quiet(Transition::Idle),
        }
    }

    fn start_session(&mut self, time: DateTime<Utc>, count: u32) {
        self.state.session = Some(ActiveSession {
            start_time: time,
            current_count: count,
        });
        self.state.pending = None;
    }

    fn finalize(
        &self,
        count: u32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Option<LogRecord> {
        let duration = end_time - start_time;
        if duration >= self.config.min_detection_duration {
            Some(LogRecord::new(count, duration, end_time))
        } else {
            tracing::debug!(
                count,
                duration_ms = duration.num_milliseconds(),
                "session shorter than minimum, not logged"
            );
            None
        }
    }
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}
