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

use crate::models::BusinessInfo;

#[derive(Debug, PartialEq)]
pub enum BusinessInfoWizardAction {
    Cancel,
    Save(BusinessInfo),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum BusinessInfoField {
    Name,
    Email,
    Phone,
    Address,
    Website,
}

pub struct BusinessInfoWizardState {
    info: BusinessInfo,
    current_field: BusinessInfoField,
    editing: bool,
}

impl BusinessInfoWizardState {
    /// Starts from the saved profile, or an empty one.
    pub fn new(existing: Option<&BusinessInfo>) -> Self {
        Self {
            info: existing.cloned().unwrap_or_default(),
            current_field: BusinessInfoField::Name,
            editing: false,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            BusinessInfoField::Name => BusinessInfoField::Email,
            BusinessInfoField::Email => BusinessInfoField::Phone,
            BusinessInfoField::Phone => BusinessInfoField::Address,
            BusinessInfoField::Address => BusinessInfoField::Website,
            BusinessInfoField::Website => BusinessInfoField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            BusinessInfoField::Name => BusinessInfoField::Website,
            BusinessInfoField::Email => BusinessInfoField::Name,
            BusinessInfoField::Phone => BusinessInfoField::Email,
            BusinessInfoField::Address => BusinessInfoField::Phone,
            BusinessInfoField::Website => BusinessInfoField::Address,
        };
    }

    fn field_mut(&mut self) -> &mut String {
        match self.current_field {
            BusinessInfoField::Name => &mut self.info.name,
            BusinessInfoField::Email => &mut self.info.email,
            BusinessInfoField::Phone => &mut self.info.phone,
            BusinessInfoField::Address => &mut self.info.address,
            BusinessInfoField::Website => &mut self.info.website,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = self.field_mut();
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

    pub fn handle_key(&mut self, key: KeyCode) -> Option<BusinessInfoWizardAction> {
        match key {
            KeyCode::Esc => {
                if self.editing {
                    self.toggle_editing();
                } else {
                    return Some(BusinessInfoWizardAction::Cancel);
                }
            }
            KeyCode::Enter => self.toggle_editing(),
            KeyCode::Up if !self.editing => self.previous_field(),
            KeyCode::Down if !self.editing => self.next_field(),
            // Every field is optional.
            KeyCode::Char('s') if !self.editing => {
                return Some(BusinessInfoWizardAction::Save(self.info.clone()));
            }
            _ if self.editing => self.edit_current_field(key),
            _ => {}
        }
        None
    }
}

pub fn render_business_info_wizard<B: Backend>(
    f: &mut Frame<B>,
    state: &mut BusinessInfoWizardState,
) {
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

    let title = Paragraph::new("Business Information")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Stop editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &BusinessInfoWizardState, area: Rect) {
    let fields = [
        ("Business Name", &state.info.name),
        ("Email", &state.info.email),
        ("Phone", &state.info.phone),
        ("Address", &state.info.address),
        ("Website", &state.info.website),
    ];

    let items: Vec<ListItem> = fields
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            let selected = i == state.current_field as usize;
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };

            let content = if selected && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), label_style),
                    Span::styled(
                        format!("{}|", value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), label_style),
                    Span::raw(value.as_str()),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list =
        List::new(items).block(Block::default().borders(Borders::ALL).title("Details"));

    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut BusinessInfoWizardState) -> Result<Option<BusinessInfoWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(state: &mut BusinessInfoWizardState, text: &str) {
        for c in text.chars() {
            state.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn edits_land_in_the_selected_field() {
        let mut state = BusinessInfoWizardState::new(None);
        state.handle_key(KeyCode::Up);
        state.handle_key(KeyCode::Enter);
        type_text(&mut state, "cedar.tst");
        state.handle_key(KeyCode::Backspace);
        type_text(&mut state, "t");
        state.handle_key(KeyCode::Enter);

        let Some(BusinessInfoWizardAction::Save(info)) = state.handle_key(KeyCode::Char('s')) else {
            panic!("expected save");
        };
        assert_eq!(info.website, "cedar.tst");
        assert_eq!(info.name, "");
    }

    #[test]
    fn typing_s_while_editing_is_text() {
        let existing = BusinessInfo {
            name: "Cedar".to_string(),
            ..BusinessInfo::default()
        };
        let mut state = BusinessInfoWizardState::new(Some(&existing));
        state.handle_key(KeyCode::Enter);
        assert_eq!(state.handle_key(KeyCode::Char('s')), None);
        state.handle_key(KeyCode::Esc);

        assert_eq!(
            state.handle_key(KeyCode::Char('s')),
            Some(BusinessInfoWizardAction::Save(BusinessInfo {
                name: "Cedars".to_string(),
                ..BusinessInfo::default()
            }))
        );
        assert_eq!(state.handle_key(KeyCode::Esc), Some(BusinessInfoWizardAction::Cancel));
    }
}
