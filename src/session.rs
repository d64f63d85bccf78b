//! One visualization session: store, synchronizer, mapper, simulation, scene.
//!
//! The session is the only owner of mutable state. Hosts call [`frame`]
//! once per render tick and [`reset`] when a new track is loaded.
//!
//! [`frame`]: VisualizationSession::frame
//! [`reset`]: VisualizationSession::reset

use glam::Mat4;

use crate::error::{Result, VisualizerError};
use crate::features::FeatureChunk;
use crate::mapping::SynestheticMapper;
use crate::params::VisualizerConfig;
use crate::particles::{ParticleInstance, ParticleSystem};
use crate::scene::{CameraState, LightState, SceneResponseController, SceneTransform};
use crate::sync::{MediaClock, PlaybackSynchronizer};
use crate::timeline::FeatureTimeline;
use crate::transport::{FeedReceiver, ProcessingStatus, StreamMessage};

/// Everything the render surface needs for one tick
#[derive(Debug, Clone)]
pub struct RenderFrame {
    /// Media time this frame was sampled at (seconds)
    pub time_s: f64,
    pub playing: bool,
    /// Interpolated feature vector the frame was built from
    pub features: FeatureChunk,
    pub instances: Vec<ParticleInstance>,
    pub camera: CameraState,
    pub light: LightState,
    pub transform: SceneTransform,
}

/// Ingest and playback counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub chunks_ingested: usize,
    pub analyses_ingested: usize,
    pub records_dropped: usize,
    pub clock_regressions: usize,
    pub frames: usize,
    /// Latest producer status report
    pub producer_status: Option<ProcessingStatus>,
    /// Latest producer-side error message
    pub producer_error: Option<String>,
}

pub struct VisualizationSession {
    config: VisualizerConfig,
    timeline: FeatureTimeline,
    synchronizer: PlaybackSynchronizer,
    mapper: SynestheticMapper,
    particles: ParticleSystem,
    scene: SceneResponseController,
    feed: Option<FeedReceiver>,
    stats: SessionStats,
}

impl VisualizationSession {
    /// Build a session from a validated configuration
    pub fn new(config: VisualizerConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "[Session] Starting with {} particles, chunk interval {}s, analysis interval {}s",
            config.particles.total_count,
            config.timeline.chunk_interval_s,
            config.timeline.analysis_interval_s
        );
        Ok(Self {
            timeline: FeatureTimeline::new(&config.timeline),
            synchronizer: PlaybackSynchronizer::new(),
            mapper: SynestheticMapper::new(config.mapping.clone()),
            particles: ParticleSystem::new(&config.particles),
            scene: SceneResponseController::new(
                config.scene.clone(),
                config.mapping.energy_center_ceiling_hz,
            ),
            feed: None,
            stats: SessionStats::default(),
            config,
        })
    }

    /// Receive messages from a transport thread, drained every frame
    pub fn attach_feed(&mut self, feed: FeedReceiver) {
        self.feed = Some(feed);
    }

    /// Apply one stream message
    ///
    /// Malformed records are logged, counted and dropped; the error is
    /// returned for callers that want it, but ingestion can simply continue.
    pub fn ingest(&mut self, message: StreamMessage) -> Result<()> {
        let result = match message {
            StreamMessage::ChunkData(chunk) => self
                .timeline
                .append_chunk(chunk)
                .map(|()| self.stats.chunks_ingested += 1),
            StreamMessage::AnalysisData(record) => self
                .timeline
                .append_analysis(record)
                .map(|()| self.stats.analyses_ingested += 1),
            StreamMessage::Status(status) => {
                log::debug!(
                    "[Session] Producer {:?}: {}/{} chunks",
                    status.status,
                    status.processed_chunks,
                    status.total_chunks
                );
                self.stats.producer_status = Some(status);
                Ok(())
            }
            StreamMessage::Error { message } => {
                log::warn!("[Session] Producer reported error: {}", message);
                self.stats.producer_error = Some(message);
                Ok(())
            }
        };

        if let Err(e) = &result {
            log::warn!("[Session] Dropped record: {}", e);
            self.stats.records_dropped += 1;
        }
        result
    }

    /// Decode and apply one JSON wire message
    pub fn ingest_json(&mut self, text: &str) -> Result<()> {
        match StreamMessage::from_json(text) {
            Ok(message) => self.ingest(message),
            Err(e) => {
                log::warn!("[Session] Dropped message: {}", e);
                self.stats.records_dropped += 1;
                Err(e)
            }
        }
    }

    /// Drain the attached feed into the timeline
    ///
    /// Returns the number of messages taken off the queue.
    pub fn pump_feed(&mut self) -> usize {
        let messages = match self.feed.as_mut() {
            Some(feed) => feed.drain(),
            None => return 0,
        };
        let count = messages.len();
        for message in messages {
            // Already logged and counted
            let _ = self.ingest(message);
        }
        count
    }

    /// Flag the next backward clock jump as an intentional seek
    pub fn seek(&mut self) {
        self.synchronizer.seek();
    }

    /// Build one frame at the clock's current position
    pub fn frame(&mut self, clock: &impl MediaClock, dt_s: f32) -> RenderFrame {
        self.pump_feed();

        let time_s = clock.position_s();
        if let Err(e) = self.synchronizer.observe(time_s) {
            if let VisualizerError::ClockRegression { .. } = e {
                self.stats.clock_regressions += 1;
            }
            log::warn!("[Session] {}", e);
        }

        let features = self.synchronizer.sample(&self.timeline, time_s);
        let analysis = self.synchronizer.sample_analysis(&self.timeline, time_s);

        let mapped = self.mapper.map_frame(&features);
        self.particles.advance(dt_s, &features, &mapped, &self.mapper);
        self.scene.advance(dt_s, &features, analysis);
        self.stats.frames += 1;

        RenderFrame {
            time_s,
            playing: clock.is_playing(),
            features,
            instances: self.particles.instances(),
            camera: self.scene.camera(),
            light: self.scene.light(),
            transform: self.scene.transform(),
        }
    }

    /// Start over for a new track
    ///
    /// Clears the timeline, discards anything still queued on the feed and
    /// rebuilds the particle set and scene in one step.
    pub fn reset(&mut self) {
        let stale = self.feed.as_mut().map(|feed| feed.drain().len()).unwrap_or(0);
        self.timeline.reset();
        self.synchronizer.reset();
        self.particles = ParticleSystem::new(&self.config.particles);
        self.scene = SceneResponseController::new(
            self.config.scene.clone(),
            self.config.mapping.energy_center_ceiling_hz,
        );
        self.stats = SessionStats::default();
        log::info!("[Session] Reset ({} stale messages discarded)", stale);
    }

    /// View-projection matrix for the current camera
    pub fn view_projection(&self) -> Mat4 {
        self.scene.camera().view_projection(&self.config.viewport)
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn timeline(&self) -> &FeatureTimeline {
        &self.timeline
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
