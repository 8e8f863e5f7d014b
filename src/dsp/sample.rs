use crate::dsp::kind::DistortionType;
use crate::dsp::noise::NoiseSource;
use crate::dsp::transfer;
use crate::params::ParamSnapshot;

/// Pre-gain, curve, post-gain for a single sample.
///
/// Gains are expected positive and finite; the curve output is bounded by
/// [`transfer::CEILING`], so the result is bounded by `CEILING * post_gain`.
#[inline]
pub fn process_sample(
    sample: f32,
    pre_gain: f32,
    post_gain: f32,
    kind: DistortionType,
    amount: f32,
    noise: &mut NoiseSource,
) -> f32 {
    let driven = sample * pre_gain;
    let shaped = transfer::shape(kind, driven, amount, noise);
    shaped * post_gain
}

/// Owns the audio-thread state a sample needs (the noise generator).
#[derive(Debug, Clone, Default)]
pub struct SampleProcessor {
    noise: NoiseSource,
}

impl SampleProcessor {
    pub const fn new(seed: u32) -> Self {
        Self {
            noise: NoiseSource::new(seed),
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32, params: &ParamSnapshot) -> f32 {
        process_sample(
            sample,
            params.pre_gain,
            params.post_gain,
            params.distortion_type,
            params.amount,
            &mut self.noise,
        )
    }

    pub const fn noise(&self) -> &NoiseSource {
        &self.noise
    }

    pub fn reseed(&mut self, seed: u32) {
        self.noise.reseed(seed);
    }

    pub const fn reset(&mut self) {
        self.noise.reset();
    }
}
