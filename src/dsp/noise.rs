/// Seed used when none is configured. Any non-zero value works.
pub const DEFAULT_SEED: u32 = 0x9E37_79B9;

/// Xorshift32 generator for the noisy-circuit curve.
///
/// Owned by the audio thread. Reseeding goes through the engine message
/// queue so the control thread never touches the state directly.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
    seed: u32,
}

impl NoiseSource {
    /// Zero is a fixed point of xorshift, so it is remapped to [`DEFAULT_SEED`].
    pub const fn new(seed: u32) -> Self {
        let seed = if seed == 0 { DEFAULT_SEED } else { seed };
        Self { state: seed, seed }
    }

    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Restarts the sequence from the current seed.
    pub const fn reset(&mut self) {
        self.state = self.seed;
    }

    pub fn reseed(&mut self, seed: u32) {
        *self = Self::new(seed);
    }

    /// Next value, uniformly spread over [-1.0, 1.0].
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        (x as i32 as f32 / i32::MAX as f32).clamp(-1.0, 1.0)
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
