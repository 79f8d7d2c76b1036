pub mod convolve;
pub mod fft;
pub mod stats;
pub mod window;

pub use convolve::{convolve, convolve_strided, correlate_same, fft_convolve, Mode};
pub use fft::FftHelper;
pub use stats::StatsHelper;
