//! Signal-processing core for the LFM pulse-compression experiment.
//!
//! A baseband chirp is scaled against a Gaussian noise floor, lifted onto a
//! quarter-rate carrier and scattered into pulse-width slots. The receive
//! chain then demodulates with the fs/4 bandpass trick, decimates through a
//! cascade of low-pass stages and compresses the pulses with a matched filter.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod scene;
pub mod telemetry;
pub mod waveform;

pub use prelude::{ProcessingStage, Signal, StageConfig, StageError, StageResult};
