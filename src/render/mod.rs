//! Offline host: streams a WAV file through the engine block by block.

pub mod writer;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use hound::{SampleFormat, WavReader, WavSpec};
use log::{debug, info, warn};
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::dsp::DistortionType;
use crate::engine::{Engine, EngineHandle};
use crate::meter::PeakMeterInfo;
pub use writer::WavWriterThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Frames per block handed to the engine.
    pub block_size: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { block_size: 512 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub frames: u64,
    pub channels: u16,
    pub sample_rate: u32,
    /// Largest absolute output sample over the whole file.
    pub peak: f32,
    /// Meter state after the last block.
    pub meter: PeakMeterInfo,
}

/// Reads only the header of `path`.
pub fn probe(path: &Path) -> Result<WavSpec> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    Ok(reader.spec())
}

/// `<dir>/<stem>_<type>_<timestamp>.wav`
pub fn default_output_path(
    input: &Path,
    dir: &Path,
    kind: DistortionType,
    now: DateTime<Local>,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("render");
    dir.join(format!(
        "{stem}_{}_{}.wav",
        kind.label().to_lowercase(),
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Every sample of the file as f32 in [-1, 1], whatever the stored format.
fn normalized_samples<R: Read>(
    reader: &mut WavReader<R>,
) -> Box<dyn Iterator<Item = Result<f32>> + '_> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => Box::new(
            reader
                .samples::<f32>()
                .map(|s| s.context("Failed to read sample")),
        ),
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            Box::new(reader.samples::<i32>().map(move |s| {
                s.map(|v| v as f32 * scale)
                    .context("Failed to read sample")
            }))
        }
    }
}

/// Where `path` will land once written. The longest existing prefix is
/// canonicalized (seeing through symlinks); the rest, which cannot contain
/// symlinks yet, is applied lexically.
fn resolve_output(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read the working directory")?
            .join(path)
    };

    let components: Vec<Component> = absolute.components().collect();
    for split in (1..=components.len()).rev() {
        let head: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = fs::canonicalize(&head) {
            for component in &components[split..] {
                match component {
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    Component::CurDir => {}
                    other => resolved.push(other),
                }
            }
            return Ok(resolved);
        }
    }
    Ok(absolute)
}

/// True when writing `output` would overwrite `input`, however either path
/// is spelled.
fn resolves_to_same_file(input: &Path, output: &Path) -> Result<bool> {
    let input = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve {}", input.display()))?;
    Ok(resolve_output(output)? == input)
}

/// Renders `input` into a 32-bit float WAV at `output`.
///
/// Parameter changes made through `handle` while this runs are picked up at
/// the next block, as they would be by a live host. On failure the partial
/// output file is removed.
pub fn render_file(
    input: &Path,
    output: &Path,
    options: &RenderOptions,
    engine: &mut Engine,
    handle: &EngineHandle,
) -> Result<RenderSummary> {
    if options.block_size == 0 {
        bail!("block size must be greater than zero");
    }

    let mut reader = WavReader::open(input)
        .with_context(|| format!("Failed to open WAV file {}", input.display()))?;
    if resolves_to_same_file(input, output)? {
        bail!(
            "refusing to overwrite the input file {} (output {})",
            input.display(),
            output.display()
        );
    }

    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        bail!("{} has no channels", input.display());
    }
    debug!(
        "Input {}: {} ch, {} Hz, {} bit {:?}",
        input.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let writer = WavWriterThread::spawn(output, out_spec)?;

    handle.reset_meter();

    let streamed = stream_blocks(&mut reader, channels, options.block_size, engine, &writer);
    let finished = writer.finish();
    let (frames, peak) = match (streamed, finished) {
        (Ok(stats), Ok(_)) => stats,
        (Err(e), _) | (Ok(_), Err(e)) => {
            if let Err(remove) = fs::remove_file(output) {
                warn!(
                    "Failed to remove partial output {}: {remove}",
                    output.display()
                );
            }
            return Err(e);
        }
    };

    let summary = RenderSummary {
        frames,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        peak,
        meter: handle.peak_info(),
    };
    info!(
        "Rendered {} frames ({} ch) with peak {:.3}",
        summary.frames, summary.channels, summary.peak
    );
    Ok(summary)
}

/// Reads, processes and queues blocks until the input runs out. Returns the
/// frame count and the largest absolute output sample.
fn stream_blocks<R: Read>(
    reader: &mut WavReader<R>,
    channels: usize,
    block_size: usize,
    engine: &mut Engine,
    writer: &WavWriterThread,
) -> Result<(u64, f32)> {
    let block_len = block_size * channels;
    let mut samples = normalized_samples(reader);
    let mut frames = 0u64;
    let mut peak = 0.0f32;

    loop {
        let mut block = Vec::with_capacity(block_len);
        for sample in samples.by_ref().take(block_len) {
            block.push(sample?);
        }
        if block.is_empty() {
            break;
        }

        let partial = block.len() % channels;
        if partial != 0 {
            warn!("Dropping {partial} trailing samples that do not fill a frame");
            block.truncate(block.len() - partial);
            if block.is_empty() {
                break;
            }
        }

        engine.process_interleaved(&mut block, channels);

        frames += (block.len() / channels) as u64;
        peak = block.iter().map(|s| s.abs()).fold(peak, f32::max);

        if writer.send(block).is_err() {
            // finish() reports why the writer stopped
            break;
        }
    }

    Ok((frames, peak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_output_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = default_output_path(
            Path::new("/music/riff.wav"),
            Path::new("renders"),
            DistortionType::NoisyCircuit,
            now,
        );
        assert_eq!(
            path,
            PathBuf::from("renders/riff_noisy_circuit_20240309_140507.wav")
        );
    }

    #[test]
    fn rejects_zero_block_size() {
        let (mut engine, handle) = Engine::new(48_000, 1);
        let err = render_file(
            Path::new("in.wav"),
            Path::new("out.wav"),
            &RenderOptions { block_size: 0 },
            &mut engine,
            &handle,
        )
        .unwrap_err();
        assert!(err.to_string().contains("block size"));
    }

    #[test]
    fn rejects_in_place_render() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let input = dir.path().join("same.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&input, spec)?;
        writer.write_sample(1000i16)?;
        writer.finalize()?;

        fs::create_dir(dir.path().join("sub"))?;
        let aliases = [
            input.clone(),
            dir.path().join("sub").join("..").join("same.wav"),
            dir.path().join(".").join("same.wav"),
        ];
        let (mut engine, handle) = Engine::new(48_000, 1);
        for output in aliases {
            let err = render_file(
                &input,
                &output,
                &RenderOptions::default(),
                &mut engine,
                &handle,
            )
            .unwrap_err();
            assert!(err.to_string().contains("refusing to overwrite"), "{err}");
        }

        assert_eq!(WavReader::open(&input)?.spec(), spec);
        Ok(())
    }

    #[test]
    fn output_aliases_resolve_through_missing_directories() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let input = dir.path().join("in.wav");
        fs::write(&input, b"placeholder")?;
        assert!(!resolves_to_same_file(
            &input,
            &dir.path().join("new").join("in.wav")
        )?);
        assert!(resolves_to_same_file(&input, &input)?);
        // the writer would create `missing` and then step back out of it
        assert!(resolves_to_same_file(
            &input,
            &dir.path().join("missing").join("..").join("in.wav")
        )?);
        Ok(())
    }
}
