use anyhow::Result;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rustfry::dsp::DistortionType;
use rustfry::engine::Engine;
use rustfry::render::{self, RenderOptions};
use std::path::Path;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 22_050;

fn write_int_wav(path: &Path, channels: u16, frames: usize) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for frame in 0..frames {
        let value = (frame as f32 * 0.07).sin();
        for channel in 0..channels {
            // channel 0 carries the sine, the rest stay silent
            let sample = if channel == 0 { value } else { 0.0 };
            writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

fn read_float_wav(path: &Path) -> Result<(WavSpec, Vec<f32>)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?;
    Ok((spec, samples))
}

#[test]
fn renders_int_wav_to_float_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("riff.wav");
    let output = dir.path().join("renders").join("riff_fried.wav");
    // 1000 frames with a 256-frame block leaves a partial last block
    write_int_wav(&input, 2, 1000)?;

    let spec = render::probe(&input)?;
    let (mut engine, handle) = Engine::new(spec.sample_rate as usize, 5);
    handle.set_distortion_type(DistortionType::DeepFry);
    handle.set_distortion_amount(0.8);

    let summary = render::render_file(
        &input,
        &output,
        &RenderOptions { block_size: 256 },
        &mut engine,
        &handle,
    )?;
    assert_eq!(summary.frames, 1000);
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.sample_rate, SAMPLE_RATE);
    assert!(summary.peak > 0.0 && summary.peak <= 1.0);

    let (out_spec, samples) = read_float_wav(&output)?;
    assert_eq!(out_spec.channels, 2);
    assert_eq!(out_spec.sample_rate, SAMPLE_RATE);
    assert_eq!(out_spec.bits_per_sample, 32);
    assert_eq!(out_spec.sample_format, SampleFormat::Float);
    assert_eq!(samples.len(), 2000);

    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    // silent right channel stays silent
    assert!(samples.iter().skip(1).step_by(2).all(|&s| s == 0.0));
    assert_eq!(samples[0], 0.0);
    Ok(())
}

#[test]
fn render_is_deterministic_for_a_seed() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("mono.wav");
    write_int_wav(&input, 1, 600)?;

    let render_with_seed = |name: &str, seed: u32| -> Result<Vec<f32>> {
        let output = dir.path().join(name);
        let (mut engine, handle) = Engine::new(SAMPLE_RATE as usize, seed);
        handle.set_distortion_type(DistortionType::NoisyCircuit);
        handle.set_distortion_amount(0.9);
        render::render_file(
            &input,
            &output,
            &RenderOptions::default(),
            &mut engine,
            &handle,
        )?;
        Ok(read_float_wav(&output)?.1)
    };

    let a = render_with_seed("a.wav", 11)?;
    let b = render_with_seed("b.wav", 11)?;
    let c = render_with_seed("c.wav", 12)?;
    assert_eq!(a, b);
    assert_ne!(a, c);
    Ok(())
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (mut engine, handle) = Engine::new(48_000, 1);
    let result = render::render_file(
        &dir.path().join("nope.wav"),
        &dir.path().join("out.wav"),
        &RenderOptions::default(),
        &mut engine,
        &handle,
    );
    assert!(result.is_err());
    assert!(render::probe(&dir.path().join("nope.wav")).is_err());
}

#[test]
fn aliased_output_leaves_input_intact() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("in.wav");
    write_int_wav(&input, 1, 48_000)?;
    std::fs::create_dir(dir.path().join("sub"))?;
    let aliased = dir.path().join("sub").join("..").join("in.wav");

    let (mut engine, handle) = Engine::new(48_000, 1);
    let result = render::render_file(
        &input,
        &aliased,
        &RenderOptions::default(),
        &mut engine,
        &handle,
    );
    assert!(result.is_err());

    let reader = WavReader::open(&input)?;
    assert_eq!(reader.spec().sample_format, SampleFormat::Int);
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.len(), 48_000);
    Ok(())
}

#[test]
fn truncated_input_leaves_no_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("cut.wav");
    let output = dir.path().join("cut_out.wav");
    write_int_wav(&input, 1, 4_000)?;

    // the header still promises 4000 samples
    let file = std::fs::OpenOptions::new().write(true).open(&input)?;
    let len = file.metadata()?.len();
    file.set_len(len - 2_000)?;
    drop(file);

    let (mut engine, handle) = Engine::new(48_000, 1);
    let result = render::render_file(
        &input,
        &output,
        &RenderOptions { block_size: 128 },
        &mut engine,
        &handle,
    );
    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}
