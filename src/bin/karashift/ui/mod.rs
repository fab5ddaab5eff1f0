//! TUI for karashift
//!
//! A stand-in "video" pane (progress gauge driven by the visual clock)
//! with the control bar overlaid below it. The control bar hides after a
//! few seconds of inactivity, like the prototype's overlay.

mod transport;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use karashift::transport::TransportState;

use transport::render_transport;

/// Everything the renderer needs, snapshotted once per frame.
pub struct View {
    pub started: bool,
    pub controls_visible: bool,
    pub state: TransportState,
    pub position: f64,
    pub duration: f64,
    pub pitch_semitones: f32,
    pub tempo_rate: f32,
    pub volume_db: f32,
    pub muted: bool,
    pub detected: Option<String>,
}

impl View {
    pub fn idle(controls_visible: bool) -> Self {
        Self {
            started: false,
            controls_visible,
            state: TransportState::Idle,
            position: 0.0,
            duration: 0.0,
            pitch_semitones: 0.0,
            tempo_rate: 1.0,
            volume_db: 0.0,
            muted: false,
            detected: None,
        }
    }
}

pub fn render(frame: &mut Frame, view: &View) {
    let area = frame.area();

    if !view.started {
        let splash = Paragraph::new("\n  karashift\n\n  press any key to start audio  [Q] quit")
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(splash, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // "video" pane
            Constraint::Length(3), // control bar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    render_video_pane(frame, chunks[0], view);

    if view.controls_visible {
        render_transport(frame, chunks[1], view);

        let help = Paragraph::new(
            " [Space] Play/Pause  [←/→] Seek ±5s  [M] Mute  [+/-] Key  [ [/] ] Tempo  [↑/↓] Volume  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }
}

fn render_video_pane(frame: &mut Frame, area: ratatui::layout::Rect, view: &View) {
    let block = Block::default().title(" Video ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let ratio = if view.duration > 0.0 {
        (view.position / view.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let label = format!(
        "{} / {}",
        format_time(view.position),
        format_time(view.duration)
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Red))
        .ratio(ratio)
        .label(label);

    // Center the scrub bar vertically in the pane.
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    frame.render_widget(gauge, rows[1]);
}

pub(crate) fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
