use crossterm::event::{KeyCode, KeyEvent};
use helpdesk_core::form::TicketDraft;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::ticket_list::priority_style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Type,
    Priority,
    Description,
}

impl DraftField {
    fn next(self) -> Self {
        match self {
            DraftField::Type => DraftField::Priority,
            DraftField::Priority => DraftField::Description,
            DraftField::Description => DraftField::Type,
        }
    }

    fn prev(self) -> Self {
        match self {
            DraftField::Type => DraftField::Description,
            DraftField::Priority => DraftField::Type,
            DraftField::Description => DraftField::Priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    Continue,
    Submit,
    Cancel,
}

/// The form behind both the create and the edit dialog.
#[derive(Debug, Clone)]
pub struct DraftEditor {
    draft: TicketDraft,
    field: DraftField,
    error: Option<String>,
}

impl DraftEditor {
    pub fn new(draft: TicketDraft) -> Self {
        Self {
            draft,
            field: DraftField::Type,
            error: None,
        }
    }

    pub fn draft(&self) -> &TicketDraft {
        &self.draft
    }

    pub fn field(&self) -> DraftField {
        self.field
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorEvent {
        match key.code {
            KeyCode::Enter => return EditorEvent::Submit,
            KeyCode::Esc => return EditorEvent::Cancel,
            KeyCode::Tab => self.field = self.field.next(),
            KeyCode::BackTab => self.field = self.field.prev(),
            KeyCode::Right => match self.field {
                DraftField::Type => self.draft.next_kind(),
                DraftField::Priority => self.draft.next_priority(),
                DraftField::Description => {}
            },
            KeyCode::Left => match self.field {
                DraftField::Type => self.draft.prev_kind(),
                DraftField::Priority => self.draft.prev_priority(),
                DraftField::Description => {}
            },
            KeyCode::Backspace if self.field == DraftField::Description => {
                self.draft.request.pop();
            }
            KeyCode::Char(c) if self.field == DraftField::Description => {
                self.draft.request.push(c);
            }
            _ => {}
        }
        EditorEvent::Continue
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = |field: DraftField, text: &'static str| {
            let style = if self.field == field {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().bold()
            };
            Span::styled(text, style)
        };
        let unset = || Span::styled("(choose one)", Style::default().fg(Color::Red));

        let mut lines = vec![
            Line::from(vec![
                label(DraftField::Type, "Type:        "),
                self.draft
                    .kind
                    .map_or_else(unset, |k| Span::raw(format!("< {} >", k.label()))),
            ]),
            Line::from(vec![
                label(DraftField::Priority, "Priority:    "),
                self.draft.priority.map_or_else(unset, |p| {
                    Span::styled(format!("< {} >", p.label()), priority_style(p))
                }),
            ]),
            Line::from(label(DraftField::Description, "Description:")),
            Line::from(format!("{}_", self.draft.request)),
            Line::from(""),
        ];
        if let Some(ref err) = self.error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
