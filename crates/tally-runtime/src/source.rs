use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tally_types::{parse_timestamp, Error as InputError, Sample};

use crate::{Clock, Error, Result};

/// Producer of detector samples.
///
/// Returns `Ok(None)` once the source is exhausted. Implementations are driven
/// from a single sampling thread.
pub trait DetectorSource: Send {
    fn next_sample(&mut self) -> Result<Option<Sample>>;
}

impl<S: DetectorSource + ?Sized> DetectorSource for Box<S> {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        (**self).next_sample()
    }
}

/// Samples from any iterator, mostly for tests and embedding.
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Sample> + Send,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
        }
    }
}

impl<I> DetectorSource for IterSource<I>
where
    I: Iterator<Item = Sample> + Send,
{
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        Ok(self.iter.next())
    }
}

/// Replays a recorded detector log.
///
/// The input is CSV with a `time,count` header. `time` is RFC 3339 or Unix
/// seconds. Rows with a negative count or a time earlier than the previous row
/// are rejected with the offending line number.
pub struct ReplaySource {
    reader: csv::Reader<Box<dyn Read + Send>>,
    row: csv::StringRecord,
    last_time: Option<DateTime<Utc>>,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Source(format!("cannot open replay file {}: {}", path.display(), e))
        })?;
        Ok(Self::from_reader(file))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(reader);
        Self {
            reader: csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .comment(Some(b'#'))
                .from_reader(reader),
            row: csv::StringRecord::new(),
            last_time: None,
        }
    }

    fn parse_row(&self) -> std::result::Result<Sample, InputError> {
        let time = parse_timestamp(field(&self.row, 0, "time")?)?;
        let raw_count = field(&self.row, 1, "count")?;
        let count: i64 = raw_count.parse().map_err(|_| {
            InputError::InvalidInput(format!("count is not an integer: {:?}", raw_count))
        })?;
        let sample = Sample::from_raw(time, count)?;

        if let Some(last) = self.last_time
            && sample.time < last
        {
            return Err(InputError::InvalidInput(format!(
                "time {} is earlier than the previous row ({})",
                sample.time, last
            )));
        }

        Ok(sample)
    }
}

fn field<'a>(
    row: &'a csv::StringRecord,
    idx: usize,
    name: &str,
) -> std::result::Result<&'a str, InputError> {
    row.get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| InputError::InvalidInput(format!("missing {} column", name)))
}

impl DetectorSource for ReplaySource {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if !self.reader.read_record(&mut self.row)? {
            return Ok(None);
        }

        let line = self.row.position().map(|p| p.line()).unwrap_or(0);
        let sample = self
            .parse_row()
            .map_err(|e| Error::Source(format!("line {}: {}", line, e)))?;

        self.last_time = Some(sample.time);
        Ok(Some(sample))
    }
}

/// Polls a live count probe and stamps each reading with a clock.
///
/// The probe returns `Ok(None)` when the detector has shut down. Between probes
/// the source sleeps for `interval` (if any).
pub struct ClockedSource<C, F> {
    clock: C,
    probe: F,
    interval: Option<Duration>,
    started: bool,
}

impl<C, F> ClockedSource<C, F>
where
    C: Clock,
    F: FnMut() -> Result<Option<i64>> + Send,
{
    pub fn new(clock: C, probe: F) -> Self {
        Self {
            clock,
            probe,
            interval: None,
            started: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval).filter(|d| !d.is_zero());
        self
    }
}

impl<C, F> DetectorSource for ClockedSource<C, F>
where
    C: Clock,
    F: FnMut() -> Result<Option<i64>> + Send,
{
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if self.started
            && let Some(interval) = self.interval
        {
            std::thread::sleep(interval);
        }
        self.started = true;

        match (self.probe)()? {
            Some(raw) => Ok(Some(Sample::from_raw(self.clock.now(), raw)?)),
            None => Ok(None),
        }
    }
}
