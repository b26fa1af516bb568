pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod sink;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{resolve_data_path, AggregatorSettings, Config, MonitorSettings};
pub use error::{Error, Result};
pub use monitor::{
    process_stream, Handled, MonitorEvent, PipelineStats, SessionMonitor, SessionPipeline,
    StopHandle,
};
pub use sink::{ChannelSink, DatabaseSink, FanoutSink, LogSink, MemorySink};
pub use source::{ClockedSource, DetectorSource, IterSource, ReplaySource};
