//! Application state and the input controller.
//!
//! Maps key events onto transport operations: space = play/pause (restart
//! when ended), m = mute, arrows = seek ±5 s / volume, +/- = key steppers,
//! [ ] = tempo steppers. The session - and with it the audio device - is
//! only created on the first key press, which doubles as the user gesture
//! most platforms require before audio output.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use rtrb::Consumer;

use karashift::analysis::DetectedKey;
use karashift::io::UserGesture;
use karashift::media::{MediaSource, SimulatedVideo};
use karashift::session::Session;

use crate::ui;

/// Controls fade out after this much inactivity, like the prototype's
/// overlay.
const IDLE_HIDE: Duration = Duration::from_secs(5);

/// Demo media length in seconds.
const DEMO_DURATION: f64 = 30.0;
const DEMO_SAMPLE_RATE: f32 = 48_000.0;

/// UI pitch stepper range; the library itself allows ±12.
const UI_PITCH_RANGE: f32 = 7.0;

pub struct App {
    media: MediaSource,
    session: Option<Session<SimulatedVideo>>,
    key_rx: Option<Consumer<DetectedKey>>,
    detected: Option<DetectedKey>,
    last_activity: Instant,
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            media: demo_media(),
            session: None,
            key_rx: None,
            detected: None,
            last_activity: Instant::now(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_detections();
            if let Some(session) = self.session.as_mut() {
                session.transport().poll_ended();
            }

            let view = self.view();
            terminal.draw(|frame| ui::render(frame, &view))?;

            // Non-blocking input, ~60fps cadence.
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.last_activity = Instant::now();
                        self.handle_key(key.code)?;
                    }
                }
            }
        }

        // Unconditional teardown on the way out.
        if let Some(session) = self.session.take() {
            session.close();
        }
        Ok(())
    }

    /// Keep only the latest detection each frame.
    fn poll_detections(&mut self) {
        if let Some(rx) = self.key_rx.as_mut() {
            while let Ok(detected) = rx.pop() {
                self.detected = Some(detected);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) -> EyreResult<()> {
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            self.should_quit = true;
            return Ok(());
        }

        // First key press is the activating gesture.
        if self.session.is_none() {
            let gesture = UserGesture::acknowledge();
            let visual = SimulatedVideo::new(self.media.duration_seconds());
            let (session, key_rx) = Session::begin(&self.media, visual, &gesture)?;
            self.session = Some(session);
            self.key_rx = Some(key_rx);
            return Ok(());
        }

        let transport = self.session.as_mut().expect("session exists").transport();
        match key {
            KeyCode::Char(' ') => {
                if transport.is_ended() {
                    transport.restart();
                } else {
                    transport.toggle_play();
                }
            }
            KeyCode::Char('m') | KeyCode::Char('M') => transport.toggle_mute(),
            KeyCode::Right => transport.seek_by(5.0),
            KeyCode::Left => transport.seek_by(-5.0),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (transport.pitch_semitones() + 1.0).min(UI_PITCH_RANGE);
                transport.set_pitch_semitones(next);
            }
            KeyCode::Char('-') => {
                let next = (transport.pitch_semitones() - 1.0).max(-UI_PITCH_RANGE);
                transport.set_pitch_semitones(next);
            }
            KeyCode::Char(']') => {
                let rate = transport.tempo_rate() + 0.1;
                transport.set_tempo_rate(rate);
            }
            KeyCode::Char('[') => {
                let rate = transport.tempo_rate() - 0.1;
                transport.set_tempo_rate(rate);
            }
            KeyCode::Up => {
                let db = transport.volume_db() + 2.0;
                transport.set_volume_db(db);
            }
            KeyCode::Down => {
                let db = transport.volume_db() - 2.0;
                transport.set_volume_db(db);
            }
            _ => {}
        }
        Ok(())
    }

    fn view(&self) -> ui::View {
        let controls_visible = self.last_activity.elapsed() < IDLE_HIDE;
        match self.session.as_ref() {
            None => ui::View::idle(controls_visible),
            Some(session) => {
                let t = session.transport_ref();
                ui::View {
                    started: true,
                    controls_visible,
                    state: t.state(),
                    position: t.position(),
                    duration: t.duration(),
                    pitch_semitones: t.pitch_semitones(),
                    tempo_rate: t.tempo_rate(),
                    volume_db: t.volume_db(),
                    muted: t.muted(),
                    detected: self.detected.map(|d| d.note.to_string()),
                }
            }
        }
    }
}

/// Synthesized stand-in for decoded media: a concert-pitch sine, so the
/// key readout has something to find.
fn demo_media() -> MediaSource {
    let frames = (DEMO_DURATION * DEMO_SAMPLE_RATE as f64) as usize;
    let samples: Vec<f32> = (0..frames)
        .map(|i| {
            let t = i as f32 / DEMO_SAMPLE_RATE;
            0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    MediaSource::from_samples(samples, DEMO_SAMPLE_RATE)
}
