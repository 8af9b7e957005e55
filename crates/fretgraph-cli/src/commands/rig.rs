//! Rig graph commands: list node types, render a rig file offline against a
//! WAV file, or play one live through a device.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::{Args, Subcommand};
use fretgraph_io::{read_wav_stereo, rig_engine, write_wav_stereo, AudioStream, StereoSamples, StreamConfig};
use fretgraph_registry::EffectRegistry;
use fretgraph_rig::{load_rig, render_offline, ChannelMode, DefaultNodeFactory, EngineConfig, MIXER_TAG, SINK_TAG, SOURCE_TAG, SPLITTER_TAG};

#[derive(Args)]
pub struct RigArgs {
    #[command(subcommand)]
    command: RigCommand,
}

#[derive(Subcommand)]
enum RigCommand {
    /// List the structural node kinds and registered effects usable as rig node types
    List,

    /// Render a rig file against a WAV input, writing the captured output to a WAV file
    Render {
        /// Rig description (JSON)
        rig: PathBuf,

        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Processing block size
        #[arg(long, default_value = "256")]
        block_size: usize,

        /// Output bit depth (16, 24, or 32)
        #[arg(long, default_value = "32")]
        bit_depth: u16,
    },

    /// Play a rig live: device input feeds its sources, its sinks feed device output
    Play {
        /// Rig description (JSON)
        rig: PathBuf,

        /// Input device (index, exact name, or partial name)
        #[arg(short, long)]
        input: Option<String>,

        /// Output device (index, exact name, or partial name)
        #[arg(short, long)]
        output: Option<String>,

        /// Sample rate
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// Buffer size in frames
        #[arg(long, default_value = "256")]
        buffer_size: u32,
    },
}

pub fn run(args: RigArgs) -> anyhow::Result<()> {
    match args.command {
        RigCommand::List => list_node_types(),
        RigCommand::Render { rig, input, output, block_size, bit_depth } => {
            render(&rig, &input, &output, block_size, bit_depth)
        }
        RigCommand::Play { rig, input, output, sample_rate, buffer_size } => {
            play(&rig, input, output, sample_rate, buffer_size)
        }
    }
}

fn list_node_types() -> anyhow::Result<()> {
    println!("Structural node types:");
    for tag in [SOURCE_TAG, SINK_TAG, SPLITTER_TAG, MIXER_TAG] {
        println!("  {tag}");
    }
    println!();

    println!("Effect node types:");
    let registry = EffectRegistry::new();
    for effect in registry.all_effects() {
        println!("  {:14} {}", effect.id, effect.name);
    }
    Ok(())
}

fn render(rig_path: &PathBuf, input_path: &PathBuf, output_path: &PathBuf, block_size: usize, bit_depth: u16) -> anyhow::Result<()> {
    println!("Loading rig {}...", rig_path.display());
    let rig = load_rig(rig_path)?;

    println!("Loading {}...", input_path.display());
    let (samples, spec) = read_wav_stereo(input_path)?;
    let sample_rate = spec.sample_rate as f32;

    let config = EngineConfig {
        sample_rate,
        max_frames: block_size.max(1),
        channel_mode: ChannelMode::Stereo,
    };
    let factory = DefaultNodeFactory::default();

    println!("Rendering {} frames through '{}'...", samples.left.len(), rig.metadata.name);
    let output = render_offline(&rig, &factory, config, &samples.left, &samples.right)?;

    let out_samples = StereoSamples::new(output.left, output.right);
    let mut out_spec = spec;
    out_spec.bits_per_sample = bit_depth;
    write_wav_stereo(output_path, &out_samples, out_spec)?;

    println!("Wrote {}", output_path.display());
    Ok(())
}

fn play(rig_path: &PathBuf, input: Option<String>, output: Option<String>, sample_rate: u32, buffer_size: u32) -> anyhow::Result<()> {
    println!("Loading rig {}...", rig_path.display());
    let rig = load_rig(rig_path)?;
    let factory = DefaultNodeFactory::default();

    let config = EngineConfig {
        sample_rate: sample_rate as f32,
        max_frames: buffer_size as usize,
        channel_mode: ChannelMode::Stereo,
    };

    let (mut handle, mut callback) = rig_engine(config, fretgraph_io::DEFAULT_CONTROL_QUEUE_CAPACITY);
    handle.load_rig(&rig, &factory)?;

    println!("Playing '{}'. Press Ctrl+C to stop.", rig.metadata.name);

    let stream_config = StreamConfig {
        sample_rate,
        buffer_size,
        input_device: input,
        output_device: output,
    };
    let mut stream = AudioStream::new(stream_config)?;

    let running = stream.running_handle();
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    stream.run(move |input: &[f32], output: &mut [f32]| {
        callback.process(input, output);
    })?;

    let metrics = handle.metrics();
    println!(
        "Done. peak cpu load {:.1}%, dropouts {}",
        metrics.cpu_load * 100.0,
        metrics.dropout_count
    );
    Ok(())
}
