use crate::{
    analysis::SpectralAnalyzer,
    audio::AudioTrack,
    config::AppConfig,
    mapping::{AnimationParameters, ParameterMapper},
    Result,
};

/// Drives the tick cadence of the animation engine.
///
/// One tick advances playback by a single frame interval, pulls the latest
/// analysis window, maps it to a parameter set and returns the snapshot for
/// the visual consumer. Ticks are frame-synchronous: the render loop calls
/// [`AnimationClock::tick`] once per drawn frame, so parameter updates never
/// outpace the consumer, and `&mut self` guarantees no two ticks execute
/// concurrently.
#[derive(Debug)]
pub struct AnimationClock {
    analyzer: SpectralAnalyzer,
    mapper: ParameterMapper,
    track: Option<AudioTrack>,
    frame_interval: f32,
    ticks: u64,
    latest: AnimationParameters,
}

impl AnimationClock {
    /// Builds a clock from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            SpectralAnalyzer::new(config.analysis.clone()),
            ParameterMapper::new(config.mapping.clone()),
            config.capture.fps,
        )
    }

    /// Builds a clock from explicit parts, used when the caller needs a
    /// seeded mapper for reproducible runs.
    pub fn with_parts(analyzer: SpectralAnalyzer, mapper: ParameterMapper, fps: u32) -> Self {
        Self {
            analyzer,
            mapper,
            track: None,
            frame_interval: 1.0 / fps.max(1) as f32,
            ticks: 0,
            latest: AnimationParameters::rest(),
        }
    }

    /// Whether a tick loop is currently scheduled.
    pub fn is_playing(&self) -> bool {
        self.track.is_some()
    }

    /// The most recently published parameter set.
    pub fn latest(&self) -> AnimationParameters {
        self.latest
    }

    /// Whether the bound track has reached its natural end. `false` when no
    /// track is bound.
    pub fn track_ended(&self) -> bool {
        self.track.as_ref().map(AudioTrack::ended).unwrap_or(false)
    }

    /// Binds a track and begins ticking from a clean slate.
    ///
    /// Starting while already running performs an implicit [`stop`] first,
    /// so a restart can never leave two tick loops scheduled.
    ///
    /// [`stop`]: AnimationClock::stop
    pub fn start(&mut self, mut track: AudioTrack) {
        if self.is_playing() {
            tracing::debug!("restarting animation clock, stopping previous loop");
            self.stop();
        }

        track.seek_start();
        tracing::info!(
            duration_seconds = track.duration_seconds(),
            "animation clock started"
        );
        self.track = Some(track);
    }

    /// Halts ticking, unbinds the track and zeroes all derived analysis
    /// state so a subsequent [`start`] begins clean.
    ///
    /// [`start`]: AnimationClock::start
    pub fn stop(&mut self) {
        self.track = None;
        self.ticks = 0;
        self.latest = AnimationParameters::rest();
        self.analyzer.reset();
        self.mapper.reset();
        tracing::info!("animation clock stopped");
    }

    /// Advances one frame: plays the next frame interval of audio, samples
    /// the spectrum and publishes a fresh parameter set. Returns `None`
    /// when the clock is not running.
    pub fn tick(&mut self) -> Result<Option<AnimationParameters>> {
        let Some(track) = self.track.as_mut() else {
            return Ok(None);
        };

        track.advance(self.frame_interval);
        self.ticks += 1;

        let spectrum = self.analyzer.sample(self.track.as_ref(), self.ticks)?;
        let params = self.mapper.map(spectrum, &self.latest);
        self.latest = params;
        Ok(Some(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, MappingConfig};

    fn clock() -> AnimationClock {
        AnimationClock::with_parts(
            SpectralAnalyzer::new(AnalysisConfig {
                sample_rate: 480,
                window_size: 64,
            }),
            ParameterMapper::with_seed(MappingConfig::default(), 11),
            60,
        )
    }

    fn silent_track(seconds: f32) -> AudioTrack {
        AudioTrack::from_samples(vec![0.0; (480.0 * seconds) as usize], 480).unwrap()
    }

    #[test]
    fn tick_is_a_noop_when_stopped() {
        let mut clock = clock();
        assert!(!clock.is_playing());
        assert!(clock.tick().unwrap().is_none());
    }

    #[test]
    fn silence_publishes_the_resting_face() {
        let mut clock = clock();
        clock.start(silent_track(1.0));

        for _ in 0..60 {
            let params = clock.tick().unwrap().expect("clock is running");
            assert_eq!(params.mouth, 0.0);
            assert_eq!(params.jaw, 0.0);
            assert_eq!(params.brow, 0.0);
        }
        assert!(clock.track_ended());
    }

    #[test]
    fn restart_produces_a_single_tick_loop() {
        let mut clock = clock();
        clock.start(silent_track(1.0));
        clock.tick().unwrap();
        clock.tick().unwrap();

        // A second start must first stop the running loop and reset its
        // state: exactly one parameter update is produced per tick call.
        clock.start(silent_track(1.0));
        assert!(clock.is_playing());
        assert_eq!(clock.latest(), AnimationParameters::rest());

        let updates: Vec<_> = (0..3).map(|_| clock.tick().unwrap()).collect();
        assert!(updates.iter().all(|update| update.is_some()));
        assert!((clock.track.as_ref().unwrap().position_seconds() - 0.05).abs() < 1e-3);
    }

    #[test]
    fn stop_resets_to_a_clean_slate() {
        let mut clock = clock();
        clock.start(silent_track(0.5));
        clock.tick().unwrap();
        clock.stop();

        assert!(!clock.is_playing());
        assert!(!clock.track_ended());
        assert_eq!(clock.latest(), AnimationParameters::rest());
        assert!(clock.tick().unwrap().is_none());
    }
}
