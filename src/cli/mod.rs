//! CLI interface for SamplerQuest

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use samplerquest::mapping::{Note, ScaleKind};

/// Pooled sample playback with ADSR envelopes
#[derive(Parser)]
#[command(name = "samplerquest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the configured sequence to a WAV file
    Render {
        /// Configuration file path
        #[arg(short, long, default_value = "samplerquest.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds (default: until the sequence has rung out)
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "samplerquest.yaml")]
        config: PathBuf,
    },

    /// List the notes of a scale
    Scale {
        /// Root note, e.g. C4 or F#3
        #[arg(short, long, default_value = "C4")]
        root: Note,

        /// Scale type
        #[arg(short, long, value_enum, default_value = "major")]
        scale: ScaleKind,
    },

    /// Snap notes to the nearest note of a scale
    Quantize {
        /// Root note, e.g. C4 or F#3
        #[arg(short, long, default_value = "C4")]
        root: Note,

        /// Scale type
        #[arg(short, long, value_enum, default_value = "major")]
        scale: ScaleKind,

        /// Break ties downwards instead of upwards
        #[arg(long)]
        lower: bool,

        /// Notes to quantize
        #[arg(required = true)]
        notes: Vec<String>,
    },

    /// Generate an example configuration file
    Init,
}
