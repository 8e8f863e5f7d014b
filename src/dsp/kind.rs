use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The closed set of distortion characters the engine can run.
#[derive(
    ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum DistortionType {
    /// tanh soft clip, amount moves the knee
    #[default]
    Overdrive,
    /// Hard clip plus bit reduction
    DeepFry,
    /// Sinusoidal wavefolder
    Sine,
    /// Drives towards a square wave
    Destroy,
    /// Arctangent curve
    Unnamed,
    /// Cubic soft clip
    Unnamed2,
    /// Soft clip with seeded multiplicative noise
    NoisyCircuit,
}

/// Lowest and highest value of the control-surface selector.
pub const CONTROL_MIN: u8 = 1;
pub const CONTROL_MAX: u8 = 7;

impl DistortionType {
    pub const ALL: [Self; 7] = [
        Self::Overdrive,
        Self::DeepFry,
        Self::Sine,
        Self::Destroy,
        Self::Unnamed,
        Self::Unnamed2,
        Self::NoisyCircuit,
    ];

    /// Maps a selector value (1..=7) to a variant.
    ///
    /// The value is rounded to the nearest step and clamped into range, NaN
    /// falls back to the default variant.
    pub fn from_control(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        let step = value
            .round()
            .clamp(f32::from(CONTROL_MIN), f32::from(CONTROL_MAX)) as u8;
        Self::from_tag(step - CONTROL_MIN)
    }

    /// Selector value for this variant, the inverse of [`Self::from_control`].
    pub const fn control_value(self) -> u8 {
        self.tag() + CONTROL_MIN
    }

    /// Compact tag used for atomic storage.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Overdrive => 0,
            Self::DeepFry => 1,
            Self::Sine => 2,
            Self::Destroy => 3,
            Self::Unnamed => 4,
            Self::Unnamed2 => 5,
            Self::NoisyCircuit => 6,
        }
    }

    /// Decodes a storage tag. Unknown tags decode to the default variant.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::DeepFry,
            2 => Self::Sine,
            3 => Self::Destroy,
            4 => Self::Unnamed,
            5 => Self::Unnamed2,
            6 => Self::NoisyCircuit,
            _ => Self::Overdrive,
        }
    }

    /// Whether the curve consumes values from the noise source.
    pub const fn uses_noise(self) -> bool {
        matches!(self, Self::NoisyCircuit)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdrive => "OVERDRIVE",
            Self::DeepFry => "DEEPFRY",
            Self::Sine => "SINE",
            Self::Destroy => "DESTROY",
            Self::Unnamed => "UNNAMED",
            Self::Unnamed2 => "UNNAMED2",
            Self::NoisyCircuit => "NOISY_CIRCUIT",
        }
    }
}

impl std::fmt::Display for DistortionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
