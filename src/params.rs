//! Control values shared between the control thread and the audio thread.
//!
//! Each field is its own atomic: writers clamp and store, the audio thread
//! loads everything once per block through [`ParameterState::snapshot`].
//! There is no cross-field atomicity; last writer wins per field.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crate::dsp::DistortionType;
pub use crate::dsp::transfer::{AMOUNT_MAX, AMOUNT_MIN};

pub const GAIN_MIN: f32 = 0.125;
pub const GAIN_MAX: f32 = 8.0;
pub const DEFAULT_GAIN: f32 = 1.0;
/// Half of the amount range.
pub const DEFAULT_AMOUNT: f32 = AMOUNT_MAX / 2.0;

pub const PARAM_PRE_GAIN: &str = "pre_gain";
pub const PARAM_POST_GAIN: &str = "post_gain";
pub const PARAM_AMOUNT: &str = "amount";
pub const PARAM_TYPE: &str = "type";

/// Plain copy of the control values for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub pre_gain: f32,
    pub post_gain: f32,
    /// Intensity, higher is dirtier.
    pub amount: f32,
    pub distortion_type: DistortionType,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            pre_gain: DEFAULT_GAIN,
            post_gain: DEFAULT_GAIN,
            amount: DEFAULT_AMOUNT,
            distortion_type: DistortionType::default(),
        }
    }
}

impl ParamSnapshot {
    /// The inverse reading of the amount, `1 - amount`.
    pub fn threshold(&self) -> f32 {
        1.0 - self.amount
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

pub fn clamp_gain(gain: f32) -> f32 {
    clamp_or(gain, GAIN_MIN, GAIN_MAX, DEFAULT_GAIN)
}

pub fn clamp_amount(amount: f32) -> f32 {
    clamp_or(amount, AMOUNT_MIN, AMOUNT_MAX, DEFAULT_AMOUNT)
}

#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct ParameterState {
    pre_gain: AtomicF32,
    post_gain: AtomicF32,
    amount: AtomicF32,
    distortion_type: AtomicU8,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self::from_snapshot(&ParamSnapshot::default())
    }
}

impl ParameterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from `values`, clamping each one.
    pub fn from_snapshot(values: &ParamSnapshot) -> Self {
        Self {
            pre_gain: AtomicF32::new(clamp_gain(values.pre_gain)),
            post_gain: AtomicF32::new(clamp_gain(values.post_gain)),
            amount: AtomicF32::new(clamp_amount(values.amount)),
            distortion_type: AtomicU8::new(values.distortion_type.tag()),
        }
    }

    pub fn set_pre_gain(&self, gain: f32) {
        self.pre_gain.store(clamp_gain(gain));
    }

    pub fn set_post_gain(&self, gain: f32) {
        self.post_gain.store(clamp_gain(gain));
    }

    pub fn set_distortion_amount(&self, amount: f32) {
        self.amount.store(clamp_amount(amount));
    }

    pub fn set_distortion_type(&self, kind: DistortionType) {
        self.distortion_type.store(kind.tag(), Ordering::Relaxed);
    }

    /// Selects the variant from a raw selector value (1..=7).
    pub fn set_distortion_type_from_control(&self, value: f32) {
        self.set_distortion_type(DistortionType::from_control(value));
    }

    pub fn pre_gain(&self) -> f32 {
        self.pre_gain.load()
    }

    pub fn post_gain(&self) -> f32 {
        self.post_gain.load()
    }

    pub fn distortion_amount(&self) -> f32 {
        self.amount.load()
    }

    pub fn distortion_type(&self) -> DistortionType {
        DistortionType::from_tag(self.distortion_type.load(Ordering::Relaxed))
    }

    /// Loads every field. Plain atomic loads, safe on the audio thread.
    #[inline]
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            pre_gain: self.pre_gain(),
            post_gain: self.post_gain(),
            amount: self.distortion_amount(),
            distortion_type: self.distortion_type(),
        }
    }

    /// Writes every field of `values` through the clamping setters.
    pub fn apply(&self, values: &ParamSnapshot) {
        self.set_pre_gain(values.pre_gain);
        self.set_post_gain(values.post_gain);
        self.set_distortion_amount(values.amount);
        self.set_distortion_type(values.distortion_type);
    }

    // Set a parameter value by automation id. Values are clamped, only the
    // name can be rejected.
    pub fn set_parameter(&self, name: &str, value: f32) -> Result<(), &'static str> {
        match name {
            PARAM_PRE_GAIN => self.set_pre_gain(value),
            PARAM_POST_GAIN => self.set_post_gain(value),
            PARAM_AMOUNT => self.set_distortion_amount(value),
            PARAM_TYPE => self.set_distortion_type_from_control(value),
            _ => return Err("Unknown parameter"),
        }
        Ok(())
    }

    pub fn get_parameter(&self, name: &str) -> Result<f32, &'static str> {
        match name {
            PARAM_PRE_GAIN => Ok(self.pre_gain()),
            PARAM_POST_GAIN => Ok(self.post_gain()),
            PARAM_AMOUNT => Ok(self.distortion_amount()),
            PARAM_TYPE => Ok(f32::from(self.distortion_type().control_value())),
            _ => Err("Unknown parameter"),
        }
    }
}
