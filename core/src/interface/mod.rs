pub mod detection;
pub mod trace;

pub use detection::{DetectionRecord, SlotReport};
pub use trace::{Series, Trace, TraceSink};
