use tally_engine::Transition;
use tally_types::{LogRecord, Sample};

use super::PipelineStats;

/// Live feed published by the processing loop.
///
/// Every accepted sample is echoed together with what it did, so subscribers can
/// show the current count without waiting for a session to close.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Sample {
        sample: Sample,
        transition: Transition,
    },
    Record(LogRecord),
    /// Sample refused by the aggregator (time went backwards).
    Rejected {
        sample: Sample,
        reason: String,
    },
    /// The sink refused a record. The aggregator state is unaffected.
    SinkFailed {
        record: LogRecord,
        error: String,
    },
    SourceFailed {
        error: String,
    },
    Stopped {
        reason: String,
        stats: PipelineStats,
    },
}
