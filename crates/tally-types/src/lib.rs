pub mod error;
pub mod record;
pub mod sample;
pub mod stream;
mod util;

pub use error::{Error, Result};
pub use record::LogRecord;
pub use sample::Sample;
pub use stream::StreamId;
pub use util::*;
