//! SamplerQuest - Pooled sample playback with ADSR envelopes

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use samplerquest::config::{self, SamplerConfig};
use samplerquest::engine::{Recorder, Sampler, Sequencer, Tempo};
use samplerquest::mapping::{Note, ScaleMapper};

mod cli;

use cli::{Cli, Commands};

/// Seconds rendered after the sequence ends and every voice has gone quiet
const RENDER_TAIL_SECS: f64 = 0.5;

/// Upper bound for open-ended renders
const MAX_RENDER_SECS: f64 = 600.0;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            config: config_path,
            output,
            duration,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;
            let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

            let mut sampler = build_sampler(&cfg, base_dir)?;
            let mut tempo = Tempo::new(cfg.master.bpm)
                .with_smoothing(cfg.master.smooth_tempo, cfg.master.transition_time);
            let mut sequencer = Sequencer::new(cfg.sequence.clone());
            if cfg.scale.quantize {
                sequencer = sequencer.with_quantizer(cfg.scale.mapper());
            }

            match duration {
                Some(secs) => println!("Rendering {:.1} seconds to {:?}...", secs, output),
                None => println!(
                    "Rendering {} events ({:.1} beats) to {:?}...",
                    sequencer.events().len(),
                    sequencer.length_beats(),
                    output
                ),
            }

            let sample_rate = cfg.audio.sample_rate;
            let block = cfg.audio.buffer_size;
            let block_secs = block as f64 / sample_rate as f64;
            let limit = duration.unwrap_or(MAX_RENDER_SECS).max(0.0);

            let mut recorder = Recorder::new(&output, sample_rate)?;
            let mut elapsed = 0.0;
            let mut tail = 0.0;

            while elapsed < limit {
                if duration.is_none() {
                    if sequencer.is_finished() && sampler.active_count() == 0 {
                        tail += block_secs;
                        if tail >= RENDER_TAIL_SECS {
                            break;
                        }
                    } else {
                        tail = 0.0;
                    }
                }

                sequencer.advance(&mut sampler, &mut tempo, block_secs);
                let frames = block.min(((limit - elapsed) * sample_rate as f64).ceil() as usize);
                recorder.record(&mut sampler, frames)?;
                elapsed += block_secs;
            }

            if duration.is_none() && elapsed >= limit {
                warn!(seconds = limit, "Render stopped at the length limit");
            }

            let peak = recorder.peak();
            recorder.finalize()?;
            println!("Rendered to {:?}", output);
            if peak > 1.0 {
                println!("  Warning: output peaked at {:.2}, lower master.volume to avoid clipping", peak);
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!("  Master pitch: {:.2}", cfg.master.pitch);
                    println!("  BPM: {}", cfg.master.bpm);
                    println!(
                        "  Envelope: A {:.2}s D {:.2}s S {:.2} R {:.2}s",
                        cfg.envelope.attack, cfg.envelope.decay, cfg.envelope.sustain, cfg.envelope.release
                    );
                    println!("  Voices: {} ({:?} on retrigger)", cfg.pool.capacity, cfg.pool.retrigger);
                    println!(
                        "  Scale: {} {:?}{}",
                        cfg.scale.root,
                        cfg.scale.name,
                        if cfg.scale.quantize { " [quantizing]" } else { "" }
                    );

                    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
                    println!("  Samples: {}", cfg.samples.len());
                    for sample in &cfg.samples {
                        let path = sample.resolve_path(base_dir);
                        println!(
                            "    - {} ({}) {}",
                            sample.metadata.name,
                            sample.metadata.base_note,
                            if path.exists() { "[found]" } else { "[missing]" }
                        );
                    }
                    println!("  Sequence events: {}", cfg.sequence.len());
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Scale { root, scale } => {
            let mapper = ScaleMapper::new(root, scale.scale(), true);
            println!("{} {}:", root, mapper.scale().name());
            for note in mapper.scale_notes() {
                println!("  {:<4} {:>8.2} Hz", note.to_string(), note.frequency());
            }
        }

        Commands::Quantize {
            root,
            scale,
            lower,
            notes,
        } => {
            let mapper = ScaleMapper::new(root, scale.scale(), !lower);
            for name in &notes {
                match name.parse::<Note>() {
                    Ok(note) => println!("{} -> {}", note, mapper.nearest(note)),
                    Err(e) => println!("{}: {}", name, e),
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../samplerquest.example.yaml");

            let path = "samplerquest.yaml";
            if Path::new(path).exists() {
                println!("samplerquest.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created samplerquest.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Create the sampler and load every configured sample into it
fn build_sampler(cfg: &SamplerConfig, base_dir: &Path) -> Result<Sampler> {
    let mut sampler = Sampler::from_config(cfg);
    for sample in &cfg.samples {
        let asset = sample
            .load(base_dir)
            .with_context(|| format!("failed to load sample '{}'", sample.metadata.name))?;
        info!(
            name = sample.metadata.name.as_str(),
            seconds = asset.duration_secs(),
            "Loaded sample"
        );
        sampler.load_sample(asset)?;
    }
    Ok(sampler)
}
