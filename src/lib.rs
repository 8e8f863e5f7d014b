// Enable pedantic lints globally, then allow the noisy ones we're not fixing.
#![warn(clippy::pedantic, clippy::nursery)]
// --- Intentionally allowed ---
#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]
// Audio code performs intentional casts
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::match_same_arms,
    clippy::struct_field_names,
    clippy::trivially_copy_pass_by_ref
)]
#![allow(clippy::redundant_pub_crate)]

pub mod dsp;
pub mod engine;
pub mod meter;
pub mod params;
pub mod preset;
pub mod render;
pub mod settings;

pub use dsp::DistortionType;
pub use engine::{Engine, EngineHandle, EngineMessage};
pub use params::{ParamSnapshot, ParameterState};
