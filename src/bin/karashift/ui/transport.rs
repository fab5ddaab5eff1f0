//! Control bar widget - play state, position, key/tempo/volume, detected key

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use karashift::transport::TransportState;

use super::{format_time, View};

pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" karashift ").borders(Borders::ALL);

    let (play_symbol, play_state_str, play_color) = match view.state {
        TransportState::Playing => ("▶", "Playing", Color::Green),
        TransportState::Paused => ("⏸", "Paused", Color::Yellow),
        TransportState::Ready => ("⏹", "Ready", Color::Yellow),
        TransportState::Ended => ("↻", "Ended", Color::Red),
        TransportState::Idle => ("·", "Idle", Color::DarkGray),
    };

    let volume_str = if view.muted {
        "Muted".to_string()
    } else {
        format!("{:+.0} dB", view.volume_db)
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {play_symbol} {play_state_str}  "),
            Style::default().fg(play_color),
        ),
        Span::styled(
            format!(
                "{} / {}  ",
                format_time(view.position),
                format_time(view.duration)
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Key: {:+.0}  ", view.pitch_semitones),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Tempo: {:.1}x  ", view.tempo_rate),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Vol: {volume_str}  "),
            Style::default().fg(if view.muted {
                Color::Red
            } else {
                Color::Magenta
            }),
        ),
        Span::styled(
            format!(
                "Detected: {}",
                view.detected.as_deref().unwrap_or("N/A")
            ),
            Style::default().fg(Color::Green),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
