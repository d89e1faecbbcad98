use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    /// Text changed
    Edited,
    /// Enter pressed
    Submit,
    /// Esc pressed
    Cancel,
}

/// Single-line text input backed by tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    placeholder: Option<String>,
    text_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            value: String::new(),
            placeholder: None,
            text_color: None,
            focused: false,
        };
        widget.apply_style();
        widget
    }

    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self.apply_style();
        self
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.apply_style();
        self
    }

    /// Recreating the TextArea resets its styles, so every rebuild goes through here.
    fn apply_style(&mut self) {
        let mut style = Style::default();
        if let Some(color) = self.text_color {
            style = style.fg(color);
        }
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        if let Some(placeholder) = &self.placeholder {
            self.textarea.set_placeholder_text(placeholder.clone());
            self.textarea
                .set_placeholder_style(Style::default().fg(Color::DarkGray));
        }
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            // Same style as the text hides the cursor
            style
        };
        self.textarea.set_cursor_style(cursor);
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.focused != focused {
            self.focused = focused;
            self.apply_style();
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and put the cursor at its end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into().replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![self.value.clone()]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => return TextInputEvent::Submit,
            KeyCode::Esc => return TextInputEvent::Cancel,
            _ => {}
        }
        let Some(input) = key_event_to_input(event) else {
            return TextInputEvent::None;
        };
        self.textarea.input(input);
        let value = self.textarea.lines().first().cloned().unwrap_or_default();
        if value == self.value {
            TextInputEvent::None
        } else {
            self.value = value;
            TextInputEvent::Edited
        }
    }
}

/// Keys a single-line editor understands; everything else is dropped.
fn key_event_to_input(event: &KeyEvent) -> Option<Input> {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    Some(Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    })
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);
    }
}
