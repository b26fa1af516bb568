mod event;
mod record;
mod stats;

pub use event::{describe_transition, EventView, EventViewModel};
pub use record::{RecordView, StoredRecordView};
pub use stats::{ReplaySummaryView, StatsView};

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Colours for plain output, switched off when stdout is not a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            enabled: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn strong<T: Display>(&self, value: T) -> String {
        if self.enabled {
            value.bold().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn dim<T: Display>(&self, value: T) -> String {
        if self.enabled {
            value.dimmed().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn good<T: Display>(&self, value: T) -> String {
        if self.enabled {
            value.green().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn warn<T: Display>(&self, value: T) -> String {
        if self.enabled {
            value.yellow().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn bad<T: Display>(&self, value: T) -> String {
        if self.enabled {
            value.red().to_string()
        } else {
            value.to_string()
        }
    }
}

pub(crate) fn objects(count: u32) -> String {
    if count == 1 {
        "1 object".to_string()
    } else {
        format!("{} objects", count)
    }
}
