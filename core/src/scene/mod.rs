pub mod noise;
pub mod placement;

pub use noise::{synthesize, NoiseScene};
pub use placement::{place_pulses, slot_count, PulsePlacement};
