use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tally_engine::AggregatorConfig;
use tally_types::{Sample, StreamId};

use super::pipeline::handle_and_describe;
use super::{MonitorEvent, PipelineStats, SessionPipeline};
use crate::{DetectorSource, Error, LogSink, MonitorSettings, Result};

const STOP_POLL: Duration = Duration::from_millis(100);

/// What the sampler hands to the processing loop. The end marker travels
/// behind the samples so nothing queued is lost.
enum Feed {
    Sample(Sample),
    Failed(String),
    End(String),
}

/// Cloneable handle that asks a running monitor to stop.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs one stream on two threads: a sampler pulling from the detector source
/// and a processing loop that owns the aggregator and the sink.
///
/// Events are published on [`SessionMonitor::receiver`]. The last event is
/// always [`MonitorEvent::Stopped`].
pub struct SessionMonitor {
    rx: Receiver<MonitorEvent>,
    stop: StopHandle,
    processor: Option<JoinHandle<PipelineStats>>,
    // The sampler may be blocked inside the source; it is never joined.
    _sampler: JoinHandle<()>,
}

impl SessionMonitor {
    pub fn start<Src, S>(
        source: Src,
        sink: S,
        config: AggregatorConfig,
        settings: &MonitorSettings,
    ) -> Result<Self>
    where
        Src: DetectorSource + 'static,
        S: LogSink + 'static,
    {
        let (tx_out, rx_out) = channel();
        let (tx_feed, rx_feed) = sync_channel(settings.channel_capacity.max(1));
        let stop = StopHandle(Arc::new(AtomicBool::new(false)));

        let sampler_stop = stop.clone();
        let max_errors = settings.max_source_errors.max(1);
        let sampler = std::thread::Builder::new()
            .name("tally-sampler".to_string())
            .spawn(move || run_sampler(source, tx_feed, sampler_stop, max_errors))?;

        let pipeline = SessionPipeline::new(settings.stream_id(), config, sink);
        let processor_stop = stop.clone();
        let flush_on_stop = settings.flush_on_stop;
        let processor = std::thread::Builder::new()
            .name("tally-processor".to_string())
            .spawn(move || {
                run_processor(pipeline, rx_feed, tx_out, processor_stop, flush_on_stop)
            })?;

        Ok(Self {
            rx: rx_out,
            stop,
            processor: Some(processor),
            _sampler: sampler,
        })
    }

    pub fn receiver(&self) -> &Receiver<MonitorEvent> {
        &self.rx
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for the processing loop to finish and return its counters.
    pub fn join(mut self) -> Result<PipelineStats> {
        let handle = self
            .processor
            .take()
            .ok_or_else(|| Error::Disconnected("monitor already joined".to_string()))?;
        handle
            .join()
            .map_err(|_| Error::Disconnected("processing thread panicked".to_string()))
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        if self.processor.is_some() {
            self.stop.stop();
        }
    }
}

fn run_sampler<Src: DetectorSource>(
    mut source: Src,
    tx: SyncSender<Feed>,
    stop: StopHandle,
    max_errors: u32,
) {
    let mut failures = 0u32;
    loop {
        if stop.is_stopped() {
            let _ = tx.send(Feed::End("stop requested".to_string()));
            return;
        }

        match source.next_sample() {
            Ok(Some(sample)) => {
                failures = 0;
                if tx.send(Feed::Sample(sample)).is_err() {
                    return;
                }
            }
            Ok(None) => {
                let _ = tx.send(Feed::End("source exhausted".to_string()));
                return;
            }
            Err(err) => {
                failures += 1;
                tracing::error!(error = %err, failures, "detector source failed");
                if tx.send(Feed::Failed(err.to_string())).is_err() {
                    return;
                }
                if failures >= max_errors {
                    let _ = tx.send(Feed::End(format!(
                        "source failed {} times in a row",
                        failures
                    )));
                    return;
                }
            }
        }
    }
}

fn run_processor<S: LogSink>(
    mut pipeline: SessionPipeline<S>,
    rx: Receiver<Feed>,
    tx: Sender<MonitorEvent>,
    stop: StopHandle,
    flush_on_stop: bool,
) -> PipelineStats {
    let stream_id: StreamId = pipeline.stream_id().clone();
    tracing::info!(stream = %stream_id, "monitor started");

    let reason = loop {
        match rx.recv_timeout(STOP_POLL) {
            Ok(Feed::Sample(sample)) => {
                for event in handle_and_describe(&mut pipeline, sample) {
                    let _ = tx.send(event);
                }
            }
            Ok(Feed::Failed(error)) => {
                let _ = tx.send(MonitorEvent::SourceFailed { error });
            }
            Ok(Feed::End(reason)) => break reason,
            Err(RecvTimeoutError::Timeout) => {
                if stop.is_stopped() {
                    break "stop requested".to_string();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break "sampler went away".to_string(),
        }
    };

    if flush_on_stop
        && let Some((record, error)) = pipeline.flush()
    {
        let _ = tx.send(match error {
            Some(err) => MonitorEvent::SinkFailed {
                record,
                error: err.to_string(),
            },
            None => MonitorEvent::Record(record),
        });
    }

    let stats = pipeline.stats();
    tracing::info!(
        stream = %stream_id,
        reason = %reason,
        samples = stats.samples,
        records = stats.records,
        "monitor stopped"
    );
    let _ = tx.send(MonitorEvent::Stopped { reason, stats });
    stats
}
