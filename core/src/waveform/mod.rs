pub mod carrier;
pub mod chirp;

pub use carrier::{modulate, quarter_rate_carrier};
pub use chirp::ChirpParams;
