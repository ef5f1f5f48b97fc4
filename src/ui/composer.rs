use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, EditField, Focus};
use crate::time_format::{secs_to_hms, secs_to_hms_short};
use crate::ui::{bold, dim, italic, pad, selected, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

const DIRECTION_WIDTH: usize = 10;
const CLOCK_WIDTH: usize = 8;

const LEGEND: &str = "(a)dd (d)el (t)ype (+/-) time (e)dit (T)ime (x/X) repeat (n)ame (s)ave (tab) library (space) play (q)uit";

pub fn render_composer(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title and estimate
            Constraint::Min(3),    // timers and library
            Constraint::Length(1), // prompt or notice
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    render_summary(app, f, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    render_timers(app, f, panes[0]);
    render_library(app, f, panes[1]);

    render_status(app, f, chunks[2]);
    f.render_widget(Paragraph::new(Span::styled(LEGEND, italic())), chunks[3]);
}

fn render_summary(app: &App, f: &mut Frame, area: Rect) {
    let composer = &app.composer;
    let title = match composer.title.is_empty() {
        true => Span::styled("(untitled)", dim()),
        false => Span::styled(composer.title.clone(), bold()),
    };

    let lines = vec![
        Line::from(title),
        Line::from(Span::raw(format!(
            "{} timer(s) x {} execution(s)   estimated {}",
            composer.timers().len(),
            composer.executions(),
            secs_to_hms_short(composer.estimated_secs())
        ))),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_timers(app: &App, f: &mut Frame, area: Rect) {
    let composer = &app.composer;
    // borders and the index column
    let label_width = (area.width as usize)
        .saturating_sub(2 + 5 + DIRECTION_WIDTH + CLOCK_WIDTH + 2)
        .max(1);

    let items: Vec<ListItem> = composer
        .timers()
        .iter()
        .enumerate()
        .map(|(idx, timer)| {
            let text = format!(
                "{:>3}. {} {} {}",
                idx + 1,
                pad(&timer.label, label_width),
                pad(&timer.direction.to_string(), DIRECTION_WIDTH),
                secs_to_hms(timer.duration)
            );
            let style = if idx == composer.selected() && app.focus == Focus::Timers {
                selected()
            } else if idx == composer.selected() {
                bold()
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(text, style))
        })
        .collect();

    let list = List::new(items).block(pane_block("Timers", app.focus == Focus::Timers));
    f.render_widget(list, area);
}

fn render_library(app: &App, f: &mut Frame, area: Rect) {
    let width = (area.width as usize).saturating_sub(2);

    let items: Vec<ListItem> = if app.library.is_empty() {
        vec![ListItem::new(Span::styled("no saved sequences", dim()))]
    } else {
        app.library
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let style = match idx == app.library_selected && app.focus == Focus::Library {
                    true => selected(),
                    false => Style::default(),
                };
                ListItem::new(Span::styled(pad(name, width), style))
            })
            .collect()
    };

    let list = List::new(items).block(pane_block("Library", app.focus == Focus::Library));
    f.render_widget(list, area);
}

fn render_status(app: &App, f: &mut Frame, area: Rect) {
    let line = if let Some(input) = &app.input {
        let prompt = match input.field {
            EditField::Label => "Label",
            EditField::Duration => "Duration",
            EditField::Title => "Title",
        };
        Line::from(vec![
            Span::styled(format!("{prompt}: "), bold()),
            Span::raw(input.buffer.clone()),
            Span::styled("_", dim()),
        ])
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Yellow)))
    } else {
        Line::default()
    };
    f.render_widget(Paragraph::new(line), area);
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = match focused {
        true => Style::default().fg(Color::Cyan),
        false => dim(),
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryKvStore;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render_composer(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(Config::default(), Box::new(MemoryKvStore::new()), None)
    }

    #[test]
    fn test_renders_timer_rows() {
        let mut app = app();
        app.composer.title = "pomodoro".to_string();
        let rendered = draw(&app, 100, 20);

        assert!(rendered.contains("pomodoro"));
        assert!(rendered.contains("Timer #1"));
        assert!(rendered.contains("Count-Down"));
        assert!(rendered.contains("00:00:05"));
        assert!(rendered.contains("no saved sequences"));
    }

    #[test]
    fn test_renders_prompt() {
        let mut app = app();
        app.composer.title = "x".to_string();
        app.input = Some(crate::app::TextInput {
            field: EditField::Title,
            buffer: "new name".to_string(),
        });
        let rendered = draw(&app, 100, 20);

        assert!(rendered.contains("Title: new name"));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let app = app();
        draw(&app, 10, 4);
        draw(&app, 1, 1);
    }
}
