mod events;
mod pipeline;
mod supervisor;

pub use events::MonitorEvent;
pub use pipeline::{process_stream, Handled, PipelineStats, SessionPipeline};
pub use supervisor::{SessionMonitor, StopHandle};
