use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};
use std::sync::Arc;

use crate::dsp::{BlockProcessor, DistortionType};
use crate::meter::{PeakMeter, PeakMeterHandle, PeakMeterInfo};
use crate::params::{ParamSnapshot, ParameterState};
use crate::preset::Preset;

const MESSAGE_CHANNEL_CAPACITY: usize = 16;

/// Requests that touch audio-thread-owned state. Applied at the start of the
/// next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMessage {
    Reseed(u32),
    ResetNoise,
    ResetMeter,
}

/// Audio-thread side: owns the block processor, the noise state and the meter.
pub struct Engine {
    params: Arc<ParameterState>,
    processor: BlockProcessor,
    meter: PeakMeter,
    /// Control thread → audio thread requests.
    rx_updates: Receiver<EngineMessage>,
}

/// Control-thread side. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    params: Arc<ParameterState>,
    meter: PeakMeterHandle,
    tx_updates: Sender<EngineMessage>,
}

impl Engine {
    pub fn new(sample_rate: usize, seed: u32) -> (Self, EngineHandle) {
        Self::with_params(sample_rate, seed, &ParamSnapshot::default())
    }

    pub fn with_params(
        sample_rate: usize,
        seed: u32,
        initial: &ParamSnapshot,
    ) -> (Self, EngineHandle) {
        let params = Arc::new(ParameterState::from_snapshot(initial));
        let (meter, meter_handle) = PeakMeter::new(sample_rate);
        let (tx_updates, rx_updates) = bounded(MESSAGE_CHANNEL_CAPACITY);

        (
            Self {
                params: Arc::clone(&params),
                processor: BlockProcessor::new(seed),
                meter,
                rx_updates,
            },
            EngineHandle {
                params,
                meter: meter_handle,
                tx_updates,
            },
        )
    }

    /// Processes one block of per-channel slices in place.
    pub fn process_planar(&mut self, channels: &mut [&mut [f32]]) {
        self.handle_messages();

        let snapshot = self.params.snapshot();
        self.processor.process_planar(channels, &snapshot);

        let frames = channels.first().map_or(0, |c| c.len());
        self.meter
            .process(channels.iter().flat_map(|c| c.iter()), frames);
    }

    /// Processes one block of interleaved frames in place. A buffer that is
    /// not a whole number of frames is left untouched and `false` returned.
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channel_count: usize) -> bool {
        self.handle_messages();

        let snapshot = self.params.snapshot();
        if !self
            .processor
            .process_interleaved(buffer, channel_count, &snapshot)
        {
            return false;
        }

        self.meter.process(buffer.iter(), buffer.len() / channel_count);
        true
    }

    pub fn handle_messages(&mut self) {
        while let Ok(message) = self.rx_updates.try_recv() {
            match message {
                EngineMessage::Reseed(seed) => self.processor.reseed(seed),
                EngineMessage::ResetNoise => self.processor.reset(),
                EngineMessage::ResetMeter => self.meter.reset(),
            }
        }
    }

    pub const fn seed(&self) -> u32 {
        self.processor.seed()
    }
}

impl EngineHandle {
    pub fn set_pre_gain(&self, gain: f32) {
        self.params.set_pre_gain(gain);
    }

    pub fn set_post_gain(&self, gain: f32) {
        self.params.set_post_gain(gain);
    }

    pub fn set_distortion_amount(&self, amount: f32) {
        self.params.set_distortion_amount(amount);
    }

    pub fn set_distortion_type(&self, kind: DistortionType) {
        self.params.set_distortion_type(kind);
    }

    pub fn set_parameter(&self, name: &str, value: f32) -> Result<(), &'static str> {
        self.params.set_parameter(name, value)
    }

    pub fn get_parameter(&self, name: &str) -> Result<f32, &'static str> {
        self.params.get_parameter(name)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.params.snapshot()
    }

    pub fn params(&self) -> &ParameterState {
        &self.params
    }

    pub fn apply_preset(&self, preset: &Preset) {
        debug!("Applying preset '{}'", preset.name);
        self.params.apply(&preset.snapshot());
    }

    pub fn reseed(&self, seed: u32) {
        self.send(EngineMessage::Reseed(seed));
    }

    pub fn reset_noise(&self) {
        self.send(EngineMessage::ResetNoise);
    }

    pub fn reset_meter(&self) {
        self.send(EngineMessage::ResetMeter);
    }

    pub fn peak_info(&self) -> PeakMeterInfo {
        self.meter.get_info()
    }

    fn send(&self, message: EngineMessage) {
        match self.tx_updates.try_send(message) {
            Ok(()) => debug!("Queued engine message {message:?}"),
            Err(TrySendError::Full(_)) => {
                warn!("Engine message queue full, dropping {message:?}");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Engine has been dropped, ignoring {message:?}");
            }
        }
    }
}
