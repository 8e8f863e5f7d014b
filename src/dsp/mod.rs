//! Per-sample distortion core.
//!
//! [`transfer`] holds the stateless curves. [`sample`] wraps a curve with
//! pre/post gain and [`block`] walks a multi-channel buffer in place.
//! Nothing in here allocates or locks.

pub mod block;
pub mod kind;
pub mod noise;
pub mod sample;
pub mod transfer;

pub use block::BlockProcessor;
pub use kind::DistortionType;
pub use noise::NoiseSource;
pub use sample::{SampleProcessor, process_sample};
