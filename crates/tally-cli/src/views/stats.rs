use serde::Serialize;
use std::fmt;
use tally_index::DetectionStats;
use tally_runtime::PipelineStats;
use tally_types::StreamId;

use super::Palette;

pub struct StatsView<'a> {
    stats: &'a DetectionStats,
    palette: Palette,
}

impl<'a> StatsView<'a> {
    pub fn new(stats: &'a DetectionStats, palette: Palette) -> Self {
        Self { stats, palette }
    }
}

impl fmt::Display for StatsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        let p = &self.palette;
        writeln!(f, "{}", p.strong(format!("Detections on {}", s.date)))?;
        writeln!(f, "  objects  {:>8} today  {:>8} total", s.today_objects, s.total_objects)?;
        write!(f, "  records  {:>8} today  {:>8} total", s.today_records, s.total_records)
    }
}

/// Totals printed after `tally replay`.
#[derive(Debug, Serialize)]
pub struct ReplaySummaryView {
    pub stream_id: StreamId,
    pub stored: bool,
    #[serde(flatten)]
    pub stats: PipelineStats,
}

impl fmt::Display for ReplaySummaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        write!(
            f,
            "{} records from {} samples on stream {}",
            s.records, s.samples, self.stream_id
        )?;
        if s.discarded > 0 {
            write!(f, ", {} short sessions discarded", s.discarded)?;
        }
        if s.rejected > 0 {
            write!(f, ", {} samples rejected", s.rejected)?;
        }
        if s.sink_failures > 0 {
            write!(f, ", {} records not stored", s.sink_failures)?;
        }
        if !self.stored {
            write!(f, " (not stored)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_stats_block() {
        let stats = DetectionStats {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            today_objects: 6,
            total_objects: 11,
            today_records: 3,
            total_records: 4,
        };
        let text = StatsView::new(&stats, Palette::plain()).to_string();
        assert_eq!(
            text,
            "Detections on 2025-06-01\n\
             \x20 objects         6 today        11 total\n\
             \x20 records         3 today         4 total"
        );
    }

    #[test]
    fn test_replay_summary_mentions_discards() {
        let summary = ReplaySummaryView {
            stream_id: StreamId::new("cam-1"),
            stored: false,
            stats: PipelineStats {
                samples: 70,
                records: 2,
                discarded: 1,
                ..PipelineStats::default()
            },
        };
        assert_eq!(
            summary.to_string(),
            "2 records from 70 samples on stream cam-1, 1 short sessions discarded (not stored)"
        );
    }
}
