//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::params::{PlaybackRun, VisualizerConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "synchronice")]
#[command(about = "Headless driver for the audio-reactive particle visualizer", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a feature stream through a session and report frame statistics
    Play(PlayArgs),
    /// Write a synthetic feature stream as JSON lines
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct PlayArgs {
    /// JSON-lines stream of wire messages (synthetic stream when omitted)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// JSON configuration file (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Media time to play through (defaults to the stream length)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Simulated render frame rate
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Override the particle count
    #[arg(long, value_name = "COUNT")]
    pub particles: Option<usize>,

    /// Override the simulation seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tempo of the synthetic stream
    #[arg(long, value_name = "BPM", default_value = "124")]
    pub tempo: f32,

    /// Deliver the stream from a producer thread through the feed
    #[arg(long)]
    pub live: bool,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Length of the stream
    #[arg(long, value_name = "SECONDS", default_value = "30")]
    pub duration: f32,

    #[arg(long, value_name = "BPM", default_value = "124")]
    pub tempo: f32,

    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Output file (stdout when omitted)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Synthetic stream length when neither a file nor a duration is given
const DEFAULT_SYNTHETIC_SECS: f32 = 20.0;

impl PlayArgs {
    /// Load the configuration file if any, then apply command-line overrides
    pub fn load_config(&self) -> Result<VisualizerConfig> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load_from_file(path)?,
            None => VisualizerConfig::default(),
        };
        if let Some(count) = self.particles {
            config.particles.total_count = count;
        }
        if let Some(seed) = self.seed {
            config.particles.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }

    /// Synthetic stream length
    pub fn synthetic_duration(&self) -> f32 {
        self.duration.unwrap_or(DEFAULT_SYNTHETIC_SECS)
    }

    /// Playback run covering `stream_secs` unless a duration was given
    pub fn playback(&self, stream_secs: f32) -> PlaybackRun {
        PlaybackRun::new(self.duration.unwrap_or(stream_secs), self.fps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let args = Args::parse_from([
            "synchronice",
            "play",
            "--particles",
            "120",
            "--seed",
            "9",
            "--fps",
            "30",
        ]);
        let Command::Play(play) = args.command else {
            panic!("expected play");
        };
        let config = play.load_config().unwrap();
        assert_eq!(config.particles.total_count, 120);
        assert_eq!(config.particles.seed, 9);
        assert_eq!(play.playback(2.0).total_frames(), 60);
    }

    #[test]
    fn test_zero_particles_rejected() {
        let args = Args::parse_from(["synchronice", "play", "--particles", "0"]);
        let Command::Play(play) = args.command else {
            panic!("expected play");
        };
        assert!(play.load_config().is_err());
    }
}
