pub mod capture;
pub mod deadline;
pub mod source;

pub use capture::{Acquisition, promote_to_real_time};
pub use deadline::{DeadlineMonitor, DeadlineSummary};
pub use source::{SampleSource, TextSource, WavFileSource};
