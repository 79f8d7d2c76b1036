pub mod decimate;
pub mod demod;
pub mod detect;
pub mod fir;
pub mod matched;

pub use decimate::CascadedDecimator;
pub use demod::QuadratureDemodulator;
pub use detect::PeakDetector;
pub use fir::LowpassFir;
pub use matched::MatchedFilter;
