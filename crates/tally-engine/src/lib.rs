// Engine module - the session aggregation state machine
// Pure: no I/O, no clocks, no threads. Callers feed samples and route records.

pub mod config;
pub mod session;

pub use config::AggregatorConfig;
pub use session::{
    ActiveSession, AggregatorState, Outcome, PendingReduction, SessionAggregator, Transition,
};

use tally_types::{LogRecord, Sample};

// Façade API - run a whole recorded stream through a fresh aggregator

/// Feed `samples` in order through a new aggregator and collect every emitted record.
///
/// The session still open at the end of the stream is not reported; use
/// [`SessionAggregator::flush`] when the stream is known to be finished.
pub fn aggregate<I>(config: AggregatorConfig, samples: I) -> Vec<LogRecord>
where
    I: IntoIterator<Item = Sample>,
{
    let mut aggregator = SessionAggregator::new(config);
    samples
        .into_iter()
        .filter_map(|sample| aggregator.process(sample))
        .collect()
}
