use arc_swap::ArcSwap;
use std::sync::Arc;

/// Peaks at or above this level are flagged as clipping.
const CLIP_THRESHOLD: f32 = 0.95;
const HOLD_SECONDS: usize = 2;
const SILENCE_DB: f32 = -100.0;

/// Held output peak, published from the audio thread.
pub struct PeakMeter {
    held_peak: f32,
    samples_since_peak: usize,
    hold_samples: usize,
    clipped_blocks: u64,
    info: Arc<ArcSwap<PeakMeterInfo>>,
    /// Second buffer, swapped with the published one so publishing never
    /// allocates.
    spare: Arc<PeakMeterInfo>,
}

/// Read side of a [`PeakMeter`], for the control thread.
#[derive(Clone)]
pub struct PeakMeterHandle {
    info: Arc<ArcSwap<PeakMeterInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakMeterInfo {
    pub peak_linear: f32,
    pub peak_db: f32,
    pub is_clipping: bool,
    /// Blocks whose own peak crossed the clip threshold since the last reset.
    pub clipped_blocks: u64,
}

fn to_db(linear: f32) -> f32 {
    if linear > 1e-10 {
        20.0 * linear.log10()
    } else {
        SILENCE_DB
    }
}

impl PeakMeter {
    pub fn new(sample_rate: usize) -> (Self, PeakMeterHandle) {
        let info = Arc::new(ArcSwap::from_pointee(PeakMeterInfo::silent()));

        (
            Self {
                held_peak: 0.0,
                samples_since_peak: 0,
                hold_samples: sample_rate * HOLD_SECONDS,
                clipped_blocks: 0,
                info: Arc::clone(&info),
                spare: Arc::new(PeakMeterInfo::silent()),
            },
            PeakMeterHandle { info },
        )
    }

    /// Feeds one processed block. `frames` is the per-channel length used
    /// for the hold timer; the samples may be planar or interleaved.
    pub fn process<'a>(&mut self, samples: impl IntoIterator<Item = &'a f32>, frames: usize) {
        let block_peak = samples
            .into_iter()
            .map(|s| s.abs())
            .filter(|s| s.is_finite())
            .fold(0.0f32, f32::max);

        if block_peak >= CLIP_THRESHOLD {
            self.clipped_blocks += 1;
        }

        if block_peak >= self.held_peak {
            self.held_peak = block_peak;
            self.samples_since_peak = 0;
        } else {
            self.samples_since_peak += frames;
            if self.samples_since_peak > self.hold_samples {
                self.held_peak = block_peak;
                self.samples_since_peak = 0;
            }
        }

        self.publish(PeakMeterInfo {
            peak_linear: self.held_peak,
            peak_db: to_db(self.held_peak),
            is_clipping: self.held_peak >= CLIP_THRESHOLD,
            clipped_blocks: self.clipped_blocks,
        });
    }

    pub fn reset(&mut self) {
        self.held_peak = 0.0;
        self.samples_since_peak = 0;
        self.clipped_blocks = 0;
        self.publish(PeakMeterInfo::silent());
    }

    /// Skipped when a reader still holds the spare buffer; the next block
    /// publishes instead.
    fn publish(&mut self, info: PeakMeterInfo) {
        let Some(slot) = Arc::get_mut(&mut self.spare) else {
            return;
        };
        *slot = info;
        self.spare = self.info.swap(Arc::clone(&self.spare));
    }
}

impl PeakMeterInfo {
    fn silent() -> Self {
        Self {
            peak_db: SILENCE_DB,
            ..Self::default()
        }
    }
}

impl PeakMeterHandle {
    pub fn get_info(&self) -> PeakMeterInfo {
        self.info.load().as_ref().clone()
    }
}
