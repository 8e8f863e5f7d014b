use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::path::{Path, PathBuf};

use rustfry::dsp::noise::NoiseSource;
use rustfry::dsp::{DistortionType, transfer};
use rustfry::engine::Engine;
use rustfry::params::ParamSnapshot;
use rustfry::preset::Preset;
use rustfry::render::{self, RenderOptions};
use rustfry::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "rustfry")]
#[command(version)]
#[command(about = "Multi-mode distortion: render WAV files and inspect transfer curves.")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "RUSTFRY_SETTINGS",
        help = "Settings file (defaults to the XDG config location)"
    )]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a WAV file through the distortion engine
    Render(RenderArgs),
    /// List the distortion types and their selector values
    Types,
    /// Print a transfer curve as input/output pairs
    Curve(CurveArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input WAV file
    input: PathBuf,
    #[arg(short, long, help = "Output WAV file (defaults to a timestamped name)")]
    output: Option<PathBuf>,
    #[arg(long, help = "Preset JSON file; flags override its values")]
    preset: Option<PathBuf>,
    #[arg(short = 't', long = "type", value_enum)]
    distortion_type: Option<DistortionType>,
    #[arg(short, long, help = "Distortion amount, 0.0 to 0.99")]
    amount: Option<f32>,
    #[arg(long, help = "Gain before the curve, 0.125 to 8")]
    pre_gain: Option<f32>,
    #[arg(long, help = "Gain after the curve, 0.125 to 8")]
    post_gain: Option<f32>,
    #[arg(long, help = "Noise seed for the noisy-circuit type")]
    seed: Option<u32>,
    #[arg(long, help = "Frames per processing block")]
    block_size: Option<usize>,
}

#[derive(Args, Debug)]
struct CurveArgs {
    #[arg(short = 't', long = "type", value_enum, default_value_t = DistortionType::Overdrive)]
    distortion_type: DistortionType,
    #[arg(short, long, default_value_t = 0.5)]
    amount: f32,
    #[arg(long, default_value_t = 21)]
    points: usize,
    #[arg(long, default_value_t = 1.0, help = "Sweep inputs over [-range, range]")]
    range: f32,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    info!("rustfry v{}", env!("CARGO_PKG_VERSION"));

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    debug!("Settings:\n{settings}");

    match cli.command {
        Command::Render(args) => run_render(&args, &settings),
        Command::Types => {
            print_types();
            Ok(())
        }
        Command::Curve(args) => print_curve(&args),
    }
}

fn run_render(args: &RenderArgs, settings: &Settings) -> Result<()> {
    let mut snapshot = match &args.preset {
        Some(path) => {
            let preset = Preset::load(path)
                .with_context(|| format!("failed to load preset '{}'", path.display()))?;
            info!("Using preset '{}'", preset.name);
            preset.snapshot()
        }
        None => ParamSnapshot::default(),
    };
    if let Some(kind) = args.distortion_type {
        snapshot.distortion_type = kind;
    }
    if let Some(amount) = args.amount {
        snapshot.amount = amount;
    }
    if let Some(gain) = args.pre_gain {
        snapshot.pre_gain = gain;
    }
    if let Some(gain) = args.post_gain {
        snapshot.post_gain = gain;
    }

    let spec = render::probe(&args.input)?;
    let sample_rate = match spec.sample_rate {
        0 => settings.sample_rate,
        rate => rate,
    };
    let seed = args.seed.unwrap_or(settings.noise_seed);
    let (mut engine, handle) = Engine::with_params(sample_rate as usize, seed, &snapshot);

    // The engine clamps, so log what it actually stored.
    let applied = handle.snapshot();
    info!(
        "{} amount={:.3} pre={:.3} post={:.3} seed={seed:#010x}",
        applied.distortion_type, applied.amount, applied.pre_gain, applied.post_gain
    );

    let output = args.output.clone().unwrap_or_else(|| {
        render::default_output_path(
            &args.input,
            Path::new(&settings.output_dir),
            applied.distortion_type,
            chrono::Local::now(),
        )
    });

    let options = RenderOptions {
        block_size: args.block_size.unwrap_or(settings.block_size),
    };
    let summary = render::render_file(&args.input, &output, &options, &mut engine, &handle)
        .with_context(|| format!("failed to render '{}'", args.input.display()))?;

    println!("{}", output.display());
    println!(
        "{} frames, {} ch, {} Hz, peak {:.3} ({:.1} dBFS){}",
        summary.frames,
        summary.channels,
        summary.sample_rate,
        summary.peak,
        20.0 * summary.peak.max(1e-10).log10(),
        if summary.meter.clipped_blocks > 0 {
            format!(", {} clipped blocks", summary.meter.clipped_blocks)
        } else {
            String::new()
        }
    );
    Ok(())
}

fn print_types() {
    for kind in DistortionType::ALL {
        let name = clap::ValueEnum::to_possible_value(&kind)
            .map(|v| v.get_name().to_string())
            .unwrap_or_default();
        println!("{}  {:<14} {name}", kind.control_value(), kind.label());
    }
}

fn print_curve(args: &CurveArgs) -> Result<()> {
    if args.points < 2 {
        bail!("need at least 2 points, got {}", args.points);
    }
    if !args.range.is_finite() || args.range <= 0.0 {
        bail!("range must be a positive number, got {}", args.range);
    }

    let mut noise = NoiseSource::default();
    let step = 2.0 * args.range / (args.points - 1) as f32;
    for i in 0..args.points {
        let x = step.mul_add(i as f32, -args.range);
        let y = transfer::shape(args.distortion_type, x, args.amount, &mut noise);
        println!("{x:.4}\t{y:.6}");
    }
    Ok(())
}
