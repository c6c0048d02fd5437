use ratatui::style::{Color, Modifier, Style};

/// Pride flag colors.
pub const RAINBOW: [Color; 6] = [
    Color::Rgb(0xe6, 0x00, 0x00), // Red
    Color::Rgb(0xff, 0x8e, 0x00), // Orange
    Color::Rgb(0xff, 0xef, 0x00), // Yellow
    Color::Rgb(0x00, 0x82, 0x1b), // Green
    Color::Rgb(0x00, 0x4b, 0xff), // Blue
    Color::Rgb(0x78, 0x00, 0x89), // Purple
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub border: Style,
    pub quote: Style,
    pub help: Style,
    pub spinner: Style,
}

impl Theme {
    /// Everything the renderer colors, derived from one seed.
    pub fn from_seed(seed: u64) -> Self {
        let accent = RAINBOW[(seed % RAINBOW.len() as u64) as usize];
        Self {
            accent,
            border: Style::default().fg(accent),
            quote: Style::default().fg(accent).add_modifier(Modifier::BOLD | Modifier::ITALIC),
            help: Style::default().fg(accent),
            spinner: Style::default().fg(accent),
        }
    }
}

/// A fresh random seed for [`Theme::from_seed`].
pub fn random_seed() -> u64 {
    uuid::Uuid::new_v4().as_u64_pair().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_theme() {
        assert_eq!(Theme::from_seed(3), Theme::from_seed(3));
        assert_eq!(Theme::from_seed(3).accent, RAINBOW[3]);
        assert_eq!(Theme::from_seed(9).accent, RAINBOW[3]);
    }

    #[test]
    fn every_style_uses_the_accent() {
        let theme = Theme::from_seed(random_seed());
        assert!(RAINBOW.contains(&theme.accent));
        assert_eq!(theme.quote.fg, Some(theme.accent));
        assert!(theme.quote.add_modifier.contains(Modifier::ITALIC));
    }
}
