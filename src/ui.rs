use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Padding, Paragraph, Wrap},
};

use crate::app::ClientState;

pub const HELP_NAVIGATION: &str = "← Previous (h) • Next (l) → • Random (r)";
pub const HELP_JUMP: &str = "First (a) • Last (e) • q to quit";

/// Border plus one column of padding on each side.
const HORIZONTAL_CHROME: u16 = 4;

/// What goes inside the border. Loading beats error, error beats the quote.
pub fn content(state: &ClientState) -> Text<'static> {
    let theme = state.theme();

    if state.loading {
        return Text::from(Line::styled(format!("{} Loading...", state.spinner_frame()), theme.spinner));
    }
    if let Some(err) = &state.err {
        return Text::from(Line::styled(format!("Error: {}", err), theme.quote));
    }

    let mut lines: Vec<Line<'static>> = state
        .quote
        .lines()
        .map(|l| Line::styled(l.to_string(), theme.quote))
        .collect();
    lines.push(Line::default());
    lines.push(Line::styled(HELP_NAVIGATION, theme.help));
    lines.push(Line::styled(HELP_JUMP, theme.help));
    Text::from(lines)
}

/// Where the bordered box goes: one blank row on top, as wide as the viewport
/// and as tall as its wrapped content.
pub fn frame_area(state: &ClientState, text: &Text<'_>, area: Rect) -> Rect {
    let width = state.width.min(area.width);
    let inner = width.saturating_sub(HORIZONTAL_CHROME).max(1) as usize;
    let rows: usize = text
        .lines
        .iter()
        .map(|l| {
            let w = l.width();
            // Word wrapping can spill one row past a plain division.
            if w <= inner { 1 } else { w.div_ceil(inner) + 1 }
        })
        .sum();

    let available = area.height.saturating_sub(1);
    let height = u16::try_from(rows + 2).unwrap_or(u16::MAX).min(available);
    Rect { x: area.x, y: area.y + 1u16.min(area.height), width, height }
}

pub fn render(f: &mut Frame, state: &ClientState) {
    let theme = state.theme();
    let text = content(state);
    let area = frame_area(state, &text, f.area());

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(theme.border)
        .padding(Padding::horizontal(1));
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}
