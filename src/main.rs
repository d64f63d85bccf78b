//! Synchronice - headless driver for the audio-reactive particle visualizer
//!
//! Replays a recorded (or synthetic) feature stream through a session at a
//! fixed frame rate, the way a render loop would, and reports what the
//! scene did.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use synchronice::cli::{Args, Command, GenerateArgs, PlayArgs};
use synchronice::params::TimelineConfig;
use synchronice::session::{RenderFrame, VisualizationSession};
use synchronice::sync::SteppedClock;
use synchronice::synthetic::SyntheticStream;
use synchronice::transport::{feed_channel, StreamMessage};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Play(play) => run_play(&play),
        Command::Generate(generate) => run_generate(&generate),
    }
}

/// Read a JSON-lines stream, dropping lines that do not decode
fn read_stream(path: &std::path::Path) -> Result<Vec<StreamMessage>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading stream {}", path.display()))?;
    let mut messages = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match StreamMessage::from_json(line) {
            Ok(message) => messages.push(message),
            Err(e) => log::warn!("[Stream] Line {} dropped: {}", line_no + 1, e),
        }
    }
    log::info!(
        "[Stream] Read {} messages from {}",
        messages.len(),
        path.display()
    );
    Ok(messages)
}

/// Media time covered by the chunks in a stream (seconds)
fn stream_length(messages: &[StreamMessage], timeline: &TimelineConfig) -> f32 {
    messages
        .iter()
        .filter_map(|m| match m {
            StreamMessage::ChunkData(c) => Some(c.timestamp + timeline.chunk_interval_s),
            _ => None,
        })
        .fold(0.0, f64::max) as f32
}

fn run_play(args: &PlayArgs) -> Result<()> {
    let config = args.load_config().context("loading configuration")?;
    let messages = match &args.input {
        Some(path) => read_stream(path)?,
        None => {
            println!(
                "Synthetic stream: {:.1}s at {} BPM",
                args.synthetic_duration(),
                args.tempo
            );
            SyntheticStream::new(&config.timeline, args.tempo, config.particles.seed)
                .messages(args.synthetic_duration() as f64)
        }
    };
    let run = args.playback(stream_length(&messages, &config.timeline));
    let feed_capacity = config.timeline.feed_capacity;
    let mut session = VisualizationSession::new(config).context("creating session")?;

    let producer = if args.live {
        let (mut tx, rx) = feed_channel(feed_capacity);
        session.attach_feed(rx);
        Some(thread::spawn(move || {
            for mut message in messages {
                loop {
                    match tx.try_send(message) {
                        Ok(()) => break,
                        Err(back) if tx.is_abandoned() => {
                            log::debug!("[Stream] Session gone, dropping {}", back.kind());
                            return;
                        }
                        Err(back) => {
                            message = back;
                            thread::yield_now();
                        }
                    }
                }
            }
        }))
    } else {
        for message in messages {
            // Dropped records are logged and counted by the session
            let _ = session.ingest(message);
        }
        None
    };

    println!(
        "Playing {:.1}s at {} FPS ({} frames, {} particles)",
        run.duration_secs,
        run.fps,
        run.total_frames(),
        session.particles().len()
    );

    let dt = run.frame_dt();
    let mut clock = SteppedClock::new();
    clock.play();
    let mut report = PlayReport::default();
    for _ in 0..run.total_frames() {
        clock.advance(dt as f64);
        let frame = session.frame(&clock, dt);
        report.observe(&frame);
    }

    report.print(&session);

    if let Some(handle) = producer {
        // Dropping the session abandons the feed so a blocked producer exits
        drop(session);
        if handle.join().is_err() {
            anyhow::bail!("stream producer thread panicked");
        }
    }
    Ok(())
}

/// Running summary of a headless playback
#[derive(Default)]
struct PlayReport {
    frames: usize,
    amplitude_sum: f64,
    percussive_frames: usize,
    max_fov_degrees: f32,
    peak_light_intensity: f32,
    max_extent_m: f32,
}

impl PlayReport {
    fn observe(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        self.amplitude_sum += frame.features.amplitude as f64;
        if frame.features.is_percussive {
            self.percussive_frames += 1;
        }
        self.max_fov_degrees = self.max_fov_degrees.max(frame.camera.fov_degrees);
        self.peak_light_intensity = self.peak_light_intensity.max(frame.light.intensity);
        for instance in &frame.instances {
            for axis in instance.position {
                self.max_extent_m = self.max_extent_m.max(axis.abs());
            }
        }
    }

    fn print(&self, session: &VisualizationSession) {
        println!("\nPlayback summary");
        println!("  frames:               {}", self.frames);
        println!(
            "  mean amplitude:       {:.3}",
            self.amplitude_sum / self.frames.max(1) as f64
        );
        println!("  percussive frames:    {}", self.percussive_frames);
        println!("  widest fov:           {:.1}°", self.max_fov_degrees);
        println!("  peak light intensity: {:.2}", self.peak_light_intensity);
        println!("  furthest particle:    {:.2}m", self.max_extent_m);
        let stats = session.stats();
        println!("  chunks ingested:      {}", stats.chunks_ingested);
        println!("  analyses ingested:    {}", stats.analyses_ingested);
        println!("  records dropped:      {}", stats.records_dropped);
        println!("  clock regressions:    {}", stats.clock_regressions);
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let mut stream = SyntheticStream::new(&TimelineConfig::default(), args.tempo, args.seed);
    let messages = stream.messages(args.duration as f64);

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);
    for message in &messages {
        writeln!(out, "{}", message.to_json()?)?;
    }
    out.flush()?;

    if let Some(path) = &args.output {
        log::info!(
            "[Stream] Wrote {} messages to {}",
            messages.len(),
            path.display()
        );
    }
    Ok(())
}
