use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::history::EntryKind;
use crate::overlay::Overlay;
use crate::player::PlayerInfo;
use crate::sequence::TimerDirection;
use crate::time_format::secs_to_hms;
use crate::ui::{bold, dim, fit, italic, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

pub fn render_overlay(app: &App, f: &mut Frame) {
    let Some(player) = app.player.as_ref() else {
        return;
    };
    let info = player.info();
    let overlay = &app.overlay;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // sequence state
            Constraint::Length(3), // clock
            Constraint::Length(1), // consumed
            Constraint::Length(1), // notification
            Constraint::Min(3),    // history
            Constraint::Length(1), // controls
        ])
        .split(f.area());

    let header = Paragraph::new(Span::styled(
        overlay.header(&info),
        Style::default().patch(bold()).fg(Color::Cyan),
    ))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    f.render_widget(
        Paragraph::new(Overlay::sequence_state(&info)).alignment(Alignment::Center),
        chunks[1],
    );

    render_clock(&info, f, chunks[2]);

    f.render_widget(
        Paragraph::new(Span::styled(Overlay::consumed_line(&info), dim()))
            .alignment(Alignment::Center),
        chunks[3],
    );

    if let Some(notification) = overlay.notification() {
        f.render_widget(
            Paragraph::new(Span::styled(
                notification.to_string(),
                Style::default().patch(italic()).fg(Color::Yellow),
            ))
            .alignment(Alignment::Center),
            chunks[4],
        );
    }

    render_history(overlay, f, chunks[5]);
    f.render_widget(Paragraph::new(controls_line(&info)), chunks[6]);
}

fn render_clock(info: &PlayerInfo, f: &mut Frame, area: Rect) {
    let title = match info.running {
        true => info.timer_label.clone(),
        false => format!("{} (paused)", info.timer_label),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    match Overlay::timer_ratio(info) {
        Some(ratio) if !info.finished => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::Green))
                .ratio(ratio.clamp(0.0, 1.0))
                .label(format!(
                    "{} / {}",
                    secs_to_hms(info.timer_value),
                    secs_to_hms(info.timer_total)
                ));
            f.render_widget(gauge, area);
        }
        _ => {
            let text = match info.timer_type {
                TimerDirection::CountUp => format!("{} elapsed", secs_to_hms(info.timer_value)),
                TimerDirection::CountDown => secs_to_hms(info.timer_value),
            };
            f.render_widget(
                Paragraph::new(Span::styled(text, bold()))
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
        }
    }
}

fn render_history(overlay: &Overlay, f: &mut Frame, area: Rect) {
    let width = (area.width as usize).saturating_sub(2);
    let visible = (area.height as usize).saturating_sub(2);

    // newest first
    let items: Vec<ListItem> = overlay
        .history()
        .entries()
        .iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let text = match &entry.kind {
                EntryKind::Timer { label, progress } => {
                    format!("{label}  {progress}  {}", entry.time_range())
                }
                EntryKind::DeadTime => format!("{}  {}", entry.title(), entry.time_range()),
            };
            let style = match entry.is_dead_time() {
                true => dim(),
                false => Style::default(),
            };
            ListItem::new(Span::styled(fit(&text, width), style))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("History"));
    f.render_widget(list, area);
}

fn controls_line(info: &PlayerInfo) -> Line<'static> {
    let controls = Overlay::controls(info);
    let toggle = match info.running {
        true => "(space) pause",
        false => "(space) play",
    };

    let entry = |text: &'static str, enabled: bool| {
        let style = match enabled {
            true => italic(),
            false => Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT),
        };
        Span::styled(text, style)
    };

    Line::from(vec![
        entry("(←) prev", controls.prev),
        Span::raw("  "),
        entry(toggle, controls.toggle),
        Span::raw("  "),
        entry("(→) next", controls.next),
        Span::raw("  "),
        entry("(+) add execution", controls.add),
        Span::raw("  "),
        entry("(esc) close", true),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sequence::{SequenceDefinition, TimerSpec};
    use crate::store::MemoryKvStore;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
        terminal.draw(|f| render_overlay(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn playing_app() -> App {
        let mut app = App::new(Config::default(), Box::new(MemoryKvStore::new()), None);
        app.composer.load(
            "drill",
            SequenceDefinition::new(
                vec![TimerSpec::count_down("Sprint", 2), TimerSpec::count_up("Rest")],
                1,
            ),
        )
        .unwrap();
        app.play();
        app
    }

    #[test]
    fn test_renders_running_timer() {
        let app = playing_app();
        let rendered = draw(&app);

        assert!(rendered.contains("Sprint [00:00:02]"));
        assert!(rendered.contains("sequence: 1/1  timer: 1/2"));
        assert!(rendered.contains("Sprint Started."));
        assert!(rendered.contains("00:00:02 / 00:00:02"));
    }

    #[test]
    fn test_renders_finished_sequence() {
        let mut app = playing_app();
        {
            let player = app.player.as_mut().unwrap();
            player.tick();
            player.tick();
            player.skip(true);
        }
        app.sync_overlay();
        let rendered = draw(&app);

        assert!(rendered.contains("drill - Finished"));
        assert!(rendered.contains("Total Time: 2s"));
        assert!(rendered.contains("Sequence finished."));
        assert!(rendered.contains("History"));
    }

    #[test]
    fn test_without_player_draws_nothing() {
        let mut app = App::new(Config::default(), Box::new(MemoryKvStore::new()), None);
        app.state = crate::app::AppState::Overlay;
        assert!(draw(&app).trim().is_empty());
    }
}
