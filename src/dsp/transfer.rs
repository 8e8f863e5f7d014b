//! Transfer curves, one per [`DistortionType`].
//!
//! Every curve takes the distortion amount as intensity in `[0, AMOUNT_MAX]`
//! (higher means dirtier), maps 0 to 0 and stays inside `[-CEILING, CEILING]`
//! for any input, including infinities and NaN.

use std::f32::consts::{FRAC_2_PI, FRAC_PI_2};

use crate::dsp::kind::DistortionType;
use crate::dsp::noise::NoiseSource;

/// Output amplitude bound of every curve, before post-gain.
pub const CEILING: f32 = 1.0;
/// Inputs are clamped to this magnitude before shaping.
pub const INPUT_LIMIT: f32 = 1.0e6;
pub const AMOUNT_MIN: f32 = 0.0;
pub const AMOUNT_MAX: f32 = 0.99;

/// Smallest deep-fry clip threshold, reached at full amount.
const DEEP_FRY_MIN_THRESHOLD: f32 = 0.01;
const DEEP_FRY_MAX_BITS: f32 = 16.0;
const DEEP_FRY_BIT_RANGE: f32 = 14.0;
/// Peak noise modulation depth of the noisy circuit at full amount.
const NOISE_DEPTH: f32 = 0.5;

#[inline]
fn sanitize_input(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-INPUT_LIMIT, INPUT_LIMIT)
    }
}

#[inline]
fn sanitize_amount(amount: f32) -> f32 {
    if amount.is_nan() {
        AMOUNT_MIN
    } else {
        amount.clamp(AMOUNT_MIN, AMOUNT_MAX)
    }
}

/// Pulls a curve result back inside the ceiling. NaN becomes silence.
#[inline]
pub fn saturate(y: f32) -> f32 {
    if y.is_nan() {
        0.0
    } else {
        y.clamp(-CEILING, CEILING)
    }
}

/// Soft clip whose knee moves towards zero as the amount rises.
#[inline]
pub fn overdrive(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let drive = 9.0f32.mul_add(amount, 1.0);
    saturate((x * drive).tanh())
}

/// Hard clip at a shrinking threshold followed by bit reduction.
#[inline]
pub fn deep_fry(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let threshold = (1.0 - amount).max(DEEP_FRY_MIN_THRESHOLD);
    let clipped = x.clamp(-threshold, threshold) / threshold;

    let bits = DEEP_FRY_BIT_RANGE.mul_add(-amount, DEEP_FRY_MAX_BITS);
    let steps = bits.exp2();
    // round() goes half away from zero, which keeps the curve odd and 0 fixed
    saturate((clipped * steps).round() / steps)
}

/// Sinusoidal wavefolder. Past the first peak the output folds back.
#[inline]
pub fn sine(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let k = FRAC_PI_2 * 7.0f32.mul_add(amount, 1.0);
    saturate((x * k).sin())
}

/// Very high drive followed by a power squash; near square at full amount.
#[inline]
pub fn destroy(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let drive = 4.0 * 10f32.powf(3.0 * amount);
    let z = (x * drive).tanh();
    saturate(z.signum() * z.abs().powf(1.0 - amount))
}

/// Arctangent curve, softer shoulder than tanh and a longer tail.
#[inline]
pub fn unnamed(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let drive = 24.0f32.mul_add(amount, 1.0);
    saturate((x * drive).atan() * FRAC_2_PI)
}

/// Cubic soft clip, `1.5 (z - z^3 / 3)` with `z` hard limited to ±1.
#[inline]
pub fn unnamed_two(x: f32, amount: f32) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let drive = 14.0f32.mul_add(amount, 1.0);
    let z = (x * drive).clamp(-1.0, 1.0);
    saturate(1.5 * (z - z * z * z / 3.0))
}

/// Overdrive curve whose drive is jittered by the noise source.
///
/// The noise multiplies the signal, so silence stays silent. Advances
/// `noise` exactly once per call.
#[inline]
pub fn noisy_circuit(x: f32, amount: f32, noise: &mut NoiseSource) -> f32 {
    let (x, amount) = (sanitize_input(x), sanitize_amount(amount));
    let drive = 9.0f32.mul_add(amount, 1.0);
    let jitter = (NOISE_DEPTH * amount).mul_add(noise.next_bipolar(), 1.0);
    saturate((x * drive * jitter).tanh())
}

/// Runs the curve selected by `kind`.
#[inline]
pub fn shape(kind: DistortionType, x: f32, amount: f32, noise: &mut NoiseSource) -> f32 {
    match kind {
        DistortionType::Overdrive => overdrive(x, amount),
        DistortionType::DeepFry => deep_fry(x, amount),
        DistortionType::Sine => sine(x, amount),
        DistortionType::Destroy => destroy(x, amount),
        DistortionType::Unnamed => unnamed(x, amount),
        DistortionType::Unnamed2 => unnamed_two(x, amount),
        DistortionType::NoisyCircuit => noisy_circuit(x, amount, noise),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMOUNTS: [f32; 5] = [0.0, 0.25, 0.5, 0.75, AMOUNT_MAX];

    fn run(kind: DistortionType, x: f32, amount: f32) -> f32 {
        shape(kind, x, amount, &mut NoiseSource::default())
    }

    #[test]
    fn zero_maps_to_zero() {
        for kind in DistortionType::ALL {
            for amount in AMOUNTS {
                assert_eq!(run(kind, 0.0, amount), 0.0, "{kind} at amount {amount}");
            }
        }
    }

    #[test]
    fn curves_are_odd_symmetric() {
        for kind in DistortionType::ALL {
            for amount in AMOUNTS {
                for x in [0.01, 0.1, 0.37, 0.5, 0.9, 1.0, 3.0] {
                    let pos = run(kind, x, amount);
                    let neg = run(kind, -x, amount);
                    assert!(
                        (pos + neg).abs() < 1e-6,
                        "{kind} amount {amount} x {x}: {pos} vs {neg}"
                    );
                }
            }
        }
    }

    #[test]
    fn extreme_inputs_stay_bounded() {
        let inputs = [
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            1.0e30,
            -1.0e-30,
        ];
        for kind in DistortionType::ALL {
            for amount in AMOUNTS {
                for x in inputs {
                    let y = run(kind, x, amount);
                    assert!(y.is_finite(), "{kind} produced {y} for {x}");
                    assert!(y.abs() <= CEILING, "{kind} produced {y} for {x}");
                }
            }
        }
    }

    #[test]
    fn out_of_range_amounts_are_clamped() {
        for kind in DistortionType::ALL {
            assert_eq!(run(kind, 0.4, -1.0), run(kind, 0.4, 0.0));
            assert_eq!(run(kind, 0.4, 5.0), run(kind, 0.4, AMOUNT_MAX));
            assert_eq!(run(kind, 0.4, f32::NAN), run(kind, 0.4, 0.0));
        }
    }

    #[test]
    fn overdrive_is_linear_near_zero_at_zero_amount() {
        let x = 0.001;
        assert!((overdrive(x, 0.0) - x).abs() < 1e-6);
        assert!(overdrive(1.0, 0.0) < 0.8);
    }

    #[test]
    fn amount_increases_drive_on_monotonic_curves() {
        let curves: [fn(f32, f32) -> f32; 4] = [overdrive, destroy, unnamed, unnamed_two];
        for curve in curves {
            let mut last = 0.0;
            for amount in AMOUNTS {
                let y = curve(0.05, amount);
                assert!(y >= last, "expected {y} >= {last} at amount {amount}");
                last = y;
            }
        }
    }

    #[test]
    fn deep_fry_reduces_resolution() {
        let distinct = |amount: f32| {
            let mut values: Vec<u32> = (0..=200)
                .map(|i| deep_fry(i as f32 / 200.0, amount).to_bits())
                .collect();
            values.sort_unstable();
            values.dedup();
            values.len()
        };
        assert!(distinct(AMOUNT_MAX) < 8);
        assert!(distinct(0.0) > 150);
    }

    #[test]
    fn deep_fry_clips_at_threshold() {
        // threshold 0.5 at amount 0.5, so anything above is full scale
        let y = deep_fry(0.8, 0.5);
        assert!((y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn sine_folds_past_its_peak() {
        let peak = sine(1.0, 0.0);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(sine(1.5, 0.0) < peak);
        assert!(sine(2.5, 0.0) < 0.0);
    }

    #[test]
    fn destroy_approaches_square_wave() {
        for x in [0.001, 0.01, 0.2, 0.9] {
            assert!(destroy(x, AMOUNT_MAX) > 0.9, "x {x}");
            assert!(destroy(-x, AMOUNT_MAX) < -0.9, "x {x}");
        }
    }

    #[test]
    fn unnamed_curves_are_distinct() {
        for amount in AMOUNTS {
            let atan = unnamed(0.3, amount);
            let cubic = unnamed_two(0.3, amount);
            let tanh = overdrive(0.3, amount);
            assert!((atan - cubic).abs() > 1e-3, "amount {amount}: {atan} vs {cubic}");
            assert!((atan - tanh).abs() > 1e-3, "amount {amount}: {atan} vs {tanh}");
            assert!((cubic - tanh).abs() > 1e-3, "amount {amount}: {cubic} vs {tanh}");
        }
    }

    #[test]
    fn noisy_circuit_is_seed_deterministic() {
        let mut a = NoiseSource::new(7);
        let mut b = NoiseSource::new(7);
        for i in 0..256 {
            let x = (i as f32 * 0.1).sin() * 0.5;
            assert_eq!(
                noisy_circuit(x, 0.8, &mut a).to_bits(),
                noisy_circuit(x, 0.8, &mut b).to_bits()
            );
        }
    }

    #[test]
    fn noisy_circuit_perturbs_overdrive() {
        let mut noise = NoiseSource::default();
        let differs = (0..64)
            .filter(|_| (noisy_circuit(0.3, 0.9, &mut noise) - overdrive(0.3, 0.9)).abs() > 1e-4)
            .count();
        assert!(differs > 32);
    }

    #[test]
    fn noisy_circuit_without_amount_is_clean() {
        let mut noise = NoiseSource::default();
        assert_eq!(noisy_circuit(0.3, 0.0, &mut noise), overdrive(0.3, 0.0));
    }
}
