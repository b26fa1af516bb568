use std::fmt;
use tally_index::StoredRecord;
use tally_types::{format_duration, LogRecord};

use super::{objects, Palette};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct RecordView<'a> {
    record: &'a LogRecord,
    palette: Palette,
}

impl<'a> RecordView<'a> {
    pub fn new(record: &'a LogRecord, palette: Palette) -> Self {
        Self { record, palette }
    }
}

impl fmt::Display for RecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.record;
        write!(
            f,
            "{} - {}  {}  {}",
            self.palette.dim(r.start_time().format(TIME_FORMAT)),
            self.palette.dim(r.end_time.format("%H:%M:%S")),
            self.palette.strong(objects(r.count)),
            format_duration(r.duration),
        )
    }
}

pub struct StoredRecordView<'a> {
    stored: &'a StoredRecord,
    palette: Palette,
}

impl<'a> StoredRecordView<'a> {
    pub fn new(stored: &'a StoredRecord, palette: Palette) -> Self {
        Self { stored, palette }
    }
}

impl fmt::Display for StoredRecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<5} {:<12} {}",
            self.stored.id,
            self.stored.stream_id,
            RecordView::new(&self.stored.record, self.palette)
        )
    }
}
