use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::{Client, Status};
use crate::store::ClientDraft;
use crate::ui::components::popup::render_error;
use crate::ui::REQUIRED_FIELDS_MESSAGE;

#[derive(Debug, PartialEq)]
pub enum ClientWizardAction {
    Cancel,
    Save {
        client_id: Option<i64>,
        draft: ClientDraft,
    },
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ClientField {
    Name,
    Email,
    Phone,
    Address,
    Status,
}

pub struct ClientWizardState {
    client_id: Option<i64>,
    draft: ClientDraft,
    current_field: ClientField,
    editing: bool,
    show_error: Option<String>,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            draft: ClientDraft::default(),
            current_field: ClientField::Name,
            editing: false,
            show_error: None,
        }
    }

    pub fn from_existing(client: &Client) -> Self {
        Self {
            client_id: Some(client.id),
            draft: ClientDraft::from(client),
            ..Self::new()
        }
    }

    /// Shows `message` in the error popup until the next key press.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::Email,
            ClientField::Email => ClientField::Phone,
            ClientField::Phone => ClientField::Address,
            ClientField::Address => ClientField::Status,
            ClientField::Status => ClientField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::Status,
            ClientField::Email => ClientField::Name,
            ClientField::Phone => ClientField::Email,
            ClientField::Address => ClientField::Phone,
            ClientField::Status => ClientField::Address,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            ClientField::Name => &mut self.draft.name,
            ClientField::Email => &mut self.draft.email,
            ClientField::Phone => &mut self.draft.phone,
            ClientField::Address => &mut self.draft.address,
            ClientField::Status => {
                match key {
                    KeyCode::Right | KeyCode::Char(' ') => {
                        self.draft.status = self.draft.status.next();
                    }
                    KeyCode::Left => {
                        self.draft.status = self.draft.status.previous();
                    }
                    _ => {}
                }
                return;
            }
        };

        match key {
            KeyCode::Char(c) => {
                field_value.push(c);
            }
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<ClientWizardAction> {
        // Any key dismisses the error popup
        if self.show_error.take().is_some() {
            return None;
        }

        match key {
            KeyCode::Esc => {
                if self.editing {
                    self.toggle_editing();
                } else {
                    return Some(ClientWizardAction::Cancel);
                }
            }
            KeyCode::Enter => self.toggle_editing(),
            KeyCode::Up if !self.editing => self.previous_field(),
            KeyCode::Down if !self.editing => self.next_field(),
            KeyCode::Char('s') if !self.editing => {
                if self.draft.validate().is_ok() {
                    return Some(ClientWizardAction::Save {
                        client_id: self.client_id,
                        draft: self.draft.clone(),
                    });
                }
                self.show_error = Some(REQUIRED_FIELDS_MESSAGE.to_string());
            }
            _ if self.editing => self.edit_current_field(key),
            _ => {}
        }
        None
    }
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    // Title with appropriate text based on whether we're editing or creating
    let title_text = if state.client_id.is_none() {
        "Client Creation Wizard"
    } else {
        "Client Editing Wizard"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = match (state.editing, state.current_field) {
        (true, ClientField::Status) => "Left/Right - Change status | Enter - Done",
        (true, _) => "Enter - Save field | Esc - Stop editing",
        (false, _) => "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if let Some(error) = &state.show_error {
        let size = f.size();
        render_error(f, size, error);
    }
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ClientWizardState, area: Rect) {
    let field_names = ["Name *", "Email *", "Phone", "Address", "Status"];

    let field_values = [
        state.draft.name.as_str(),
        state.draft.email.as_str(),
        state.draft.phone.as_str(),
        state.draft.address.as_str(),
        state.draft.status.label(),
    ];

    let items: Vec<ListItem> = field_names
        .iter()
        .zip(field_values.iter())
        .enumerate()
        .map(|(i, (name, value))| {
            let content = if i == state.current_field as usize && state.editing {
                let cursor = if state.current_field == ClientField::Status {
                    format!("< {} >", value)
                } else {
                    format!("{}|", value)
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Yellow)),
                    Span::styled(cursor, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if i == state.current_field as usize {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };

                Spans::from(vec![
                    Span::styled(format!("{}: ", name), style),
                    Span::raw(*value),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Client Details"));

    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut ClientWizardState) -> Result<Option<ClientWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }

    Ok(None)
}
