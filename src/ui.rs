pub mod composer;
pub mod overlay;
pub mod screen;

use ratatui::style::{Color, Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn selected() -> Style {
    Style::default()
        .patch(bold())
        .fg(Color::Black)
        .bg(Color::Cyan)
}

/// Cut `text` to at most `width` terminal columns, marking the cut with an ellipsis
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Cut or pad `text` to exactly `width` columns
pub fn pad(text: &str, width: usize) -> String {
    let cut = fit(text, width);
    let fill = width.saturating_sub(cut.width());
    format!("{cut}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_leaves_short_text() {
        assert_eq!(fit("Focus", 10), "Focus");
        assert_eq!(fit("Focus", 5), "Focus");
    }

    #[test]
    fn test_fit_cuts_long_text() {
        assert_eq!(fit("Deep work block", 6), "Deep …");
        assert_eq!(fit("anything", 0), "");
    }

    #[test]
    fn test_fit_counts_wide_chars() {
        // each of these takes two columns
        assert_eq!(fit("休憩時間", 5), "休憩…");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abc…");
    }

    #[test]
    fn test_ui_constants() {
        assert!(HORIZONTAL_MARGIN > 0);
        assert!(VERTICAL_MARGIN > 0);
    }
}
