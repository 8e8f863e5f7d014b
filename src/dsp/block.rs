use crate::dsp::sample::SampleProcessor;
use crate::params::ParamSnapshot;

/// Applies the sample processor across a multi-channel block in place.
///
/// Traversal is channel-major for both buffer layouts, so the noise
/// sequence lands on the same samples whether the host hands over planar or
/// interleaved audio.
#[derive(Debug, Clone, Default)]
pub struct BlockProcessor {
    sample: SampleProcessor,
}

impl BlockProcessor {
    pub const fn new(seed: u32) -> Self {
        Self {
            sample: SampleProcessor::new(seed),
        }
    }

    /// One slice per channel. Lengths are left as they are.
    pub fn process_planar(&mut self, channels: &mut [&mut [f32]], params: &ParamSnapshot) {
        for channel in channels.iter_mut() {
            self.process_channel(channel, params);
        }
    }

    /// Frames of `channel_count` interleaved samples.
    ///
    /// Returns `false` and leaves the buffer alone when the layout does not
    /// add up (zero channels or a trailing partial frame).
    pub fn process_interleaved(
        &mut self,
        buffer: &mut [f32],
        channel_count: usize,
        params: &ParamSnapshot,
    ) -> bool {
        if channel_count == 0 || buffer.len() % channel_count != 0 {
            return false;
        }

        for channel in 0..channel_count {
            for sample in buffer.iter_mut().skip(channel).step_by(channel_count) {
                *sample = self.sample.process(*sample, params);
            }
        }

        true
    }

    #[inline]
    pub fn process_channel(&mut self, channel: &mut [f32], params: &ParamSnapshot) {
        for sample in channel.iter_mut() {
            *sample = self.sample.process(*sample, params);
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.sample.reseed(seed);
    }

    pub const fn reset(&mut self) {
        self.sample.reset();
    }

    pub const fn seed(&self) -> u32 {
        self.sample.noise().seed()
    }
}
