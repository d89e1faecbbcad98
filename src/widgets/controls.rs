use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

/// Top navigation entries: key, label.
pub const NAV_ENTRIES: [(&str, &str); 4] = [
    ("F1", "Home"),
    ("F2", "Upload"),
    ("F3", "Dataset"),
    ("F4", "Graph"),
];

/// Persistent top bar: brand plus one entry per route, the active one highlighted.
pub struct NavBar {
    pub active: usize,
    pub active_color: Color,
    pub background: Color,
}

impl Widget for &NavBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        const BRAND: &str = " Data Visualization Studio ";

        let mut constraints = vec![Constraint::Length(BRAND.chars().count() as u16)];
        for (key, label) in NAV_ENTRIES {
            constraints.push(Constraint::Length(
                (key.chars().count() + label.chars().count()) as u16 + 3,
            ));
        }
        constraints.push(Constraint::Fill(1));
        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base = Style::default().bg(self.background);

        Paragraph::new(BRAND)
            .style(base.fg(self.active_color).add_modifier(Modifier::BOLD))
            .render(layout[0], buf);

        for (i, (key, label)) in NAV_ENTRIES.iter().enumerate() {
            let style = if i == self.active {
                base.fg(Color::Black).bg(self.active_color)
            } else {
                base
            };
            Paragraph::new(format!(" {} {} ", key, label))
                .style(style)
                .centered()
                .render(layout[i + 1], buf);
        }

        Paragraph::new("").style(base).render(layout[NAV_ENTRIES.len() + 1], buf);
    }
}

/// Bottom bar of key hints with an optional right-aligned status.
#[derive(Default)]
pub struct Controls {
    pub hints: Vec<(&'static str, &'static str)>,
    pub status: Option<String>,
    pub dimmed: bool,
    pub background: Option<Color>,
}

impl Controls {
    pub fn new(hints: &[(&'static str, &'static str)]) -> Self {
        Self {
            hints: hints.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.hints.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));
        let status_width = self
            .status
            .as_ref()
            .map(|s| s.chars().count() as u16 + 1)
            .unwrap_or(0);
        constraints.push(Constraint::Length(status_width));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bg = self.background.unwrap_or(Color::DarkGray);
        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in self.hints.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.add_modifier(Modifier::BOLD))
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(bg))
                .render(layout[j + 1], buf);
        }

        let fill_idx = self.hints.len() * 2;
        Paragraph::new("")
            .style(base_style.bg(bg))
            .render(layout[fill_idx], buf);
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(base_style.bg(bg))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}
