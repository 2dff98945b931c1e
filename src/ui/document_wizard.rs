//! Creation and editing form for quotes and invoices.
//!
//! The form edits a [`DocumentDraft`]; id, date and the stored total are
//! left to the store. The total shown at the bottom follows every change to
//! the line items.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::error::StoreError;
use crate::models::{Document, Status};
use crate::store::{DocumentCollection, DocumentDraft, LineItemDraft, Store};
use crate::totals::format_amount;
use crate::ui::components::popup::render_error;
use crate::ui::components::selection::{clamp_index, next_index, previous_index};
use crate::ui::REQUIRED_FIELDS_MESSAGE;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DocumentField {
    Title,
    Description,
    Client,
    Status,
    LineItems,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineItemField {
    Description,
    Quantity,
    UnitPrice,
}

#[derive(Debug, PartialEq)]
pub enum DocumentWizardAction<S> {
    Cancel,
    Save {
        document_id: Option<i64>,
        draft: DocumentDraft<S>,
    },
}

pub struct DocumentWizardState<S> {
    document_id: Option<i64>,
    draft: DocumentDraft<S>,
    clients: Vec<(i64, String)>,
    current_field: DocumentField,
    editing: bool,
    line_items_list_state: ListState,
    editing_line_item: Option<(usize, LineItemField, String)>, // (index, field, current value)
    show_error: Option<String>,
}

impl<S: DocumentCollection> DocumentWizardState<S> {
    pub fn new(store: &Store) -> Self {
        let mut line_items_list_state = ListState::default();
        line_items_list_state.select(Some(0));

        Self {
            document_id: None,
            draft: DocumentDraft::default(),
            clients: store
                .clients()
                .iter()
                .map(|c| (c.id, c.name.clone()))
                .collect(),
            current_field: DocumentField::Title,
            editing: false,
            line_items_list_state,
            editing_line_item: None,
            show_error: None,
        }
    }

    pub fn from_existing(document: &Document<S>, store: &Store) -> Self {
        let mut state = Self::new(store);
        state.document_id = Some(document.id);
        state.draft = DocumentDraft::from(document);
        state
            .line_items_list_state
            .select(clamp_index(Some(0), state.draft.line_items.len()));
        state
    }

    /// Shows `message` in the error popup until the next key press.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            DocumentField::Title => DocumentField::Description,
            DocumentField::Description => DocumentField::Client,
            DocumentField::Client => DocumentField::Status,
            DocumentField::Status => DocumentField::LineItems,
            DocumentField::LineItems => DocumentField::Title,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            DocumentField::Title => DocumentField::LineItems,
            DocumentField::Description => DocumentField::Title,
            DocumentField::Client => DocumentField::Description,
            DocumentField::Status => DocumentField::Client,
            DocumentField::LineItems => DocumentField::Status,
        };
    }

    fn client_label(&self) -> String {
        match self.draft.client_id {
            None => "Select a client".to_string(),
            Some(id) => self
                .clients
                .iter()
                .find(|(client_id, _)| *client_id == id)
                .map_or_else(|| format!("Unknown client ({})", id), |(_, name)| name.clone()),
        }
    }

    fn cycle_client(&mut self, forward: bool) {
        if self.clients.is_empty() {
            self.show_error = Some("Add a client first.".to_string());
            return;
        }
        let current = self
            .draft
            .client_id
            .and_then(|id| self.clients.iter().position(|(c, _)| *c == id));
        let len = self.clients.len();
        let pos = if forward {
            next_index(current, len)
        } else {
            previous_index(current.or(Some(0)), len)
        };
        self.draft.client_id = pos.map(|i| self.clients[i].0);
    }

    pub fn add_line_item(&mut self) {
        self.draft.line_items.push(LineItemDraft::default());
        let index = self.draft.line_items.len() - 1;
        self.line_items_list_state.select(Some(index));
        self.editing_line_item = Some((index, LineItemField::Description, String::new()));
    }

    pub fn edit_line_item(&mut self) {
        if let Some(selected) = self.line_items_list_state.selected() {
            if let Some(item) = self.draft.line_items.get(selected) {
                self.editing_line_item = Some((
                    selected,
                    LineItemField::Description,
                    item.description.clone(),
                ));
            }
        }
    }

    pub fn delete_line_item(&mut self) {
        if let Some(selected) = self.line_items_list_state.selected() {
            if selected < self.draft.line_items.len() {
                self.draft.line_items.remove(selected);
                self.line_items_list_state
                    .select(clamp_index(Some(selected), self.draft.line_items.len()));
            }
        }
    }

    /// Stores the value being typed and moves to the next part of the line
    /// item: description, then quantity, then unit price.
    pub fn next_field_in_line_item(&mut self) {
        let Some((idx, field, value)) = self.editing_line_item.take() else {
            return;
        };
        let Some(item) = self.draft.line_items.get_mut(idx) else {
            return;
        };

        self.editing_line_item = match field {
            LineItemField::Description => {
                item.description = value;
                Some((idx, LineItemField::Quantity, item.quantity.to_string()))
            }
            LineItemField::Quantity => match value.trim().parse::<u32>() {
                Ok(quantity) => {
                    item.quantity = quantity;
                    Some((idx, LineItemField::UnitPrice, item.unit_price.to_string()))
                }
                Err(_) => {
                    self.show_error = Some("Quantity must be a whole number.".to_string());
                    Some((idx, field, value))
                }
            },
            LineItemField::UnitPrice => match value.trim().parse::<f64>() {
                Ok(price) if price.is_finite() && price >= 0.0 => {
                    item.unit_price = price;
                    None
                }
                _ => {
                    self.show_error = Some("Unit price must be a non-negative number.".to_string());
                    Some((idx, field, value))
                }
            },
        };
    }

    fn edit_text(&mut self, key: KeyCode) {
        let field_value = match self.current_field {
            DocumentField::Title => &mut self.draft.title,
            DocumentField::Description => &mut self.draft.description,
            _ => return,
        };

        match key {
            KeyCode::Char(c) => field_value.push(c),
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
    }

    fn edit_line_item_value(&mut self, key: KeyCode) {
        let Some((_, field, value)) = &mut self.editing_line_item else {
            return;
        };

        match key {
            KeyCode::Char(c) => {
                let accepted = match field {
                    LineItemField::Description => true,
                    LineItemField::Quantity => c.is_ascii_digit(),
                    LineItemField::UnitPrice => c.is_ascii_digit() || c == '.',
                };
                if accepted {
                    value.push(c);
                }
            }
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }

    fn handle_line_items_key(&mut self, key: KeyCode) {
        let len = self.draft.line_items.len();
        match key {
            KeyCode::Char('a') => self.add_line_item(),
            KeyCode::Char('e') => self.edit_line_item(),
            KeyCode::Char('d') => self.delete_line_item(),
            KeyCode::Up => self
                .line_items_list_state
                .select(previous_index(self.line_items_list_state.selected(), len)),
            KeyCode::Down => self
                .line_items_list_state
                .select(next_index(self.line_items_list_state.selected(), len)),
            KeyCode::Enter | KeyCode::Esc => self.editing = false,
            _ => {}
        }
    }

    fn save(&mut self) -> Option<DocumentWizardAction<S>> {
        match self.draft.validate() {
            Ok(()) => Some(DocumentWizardAction::Save {
                document_id: self.document_id,
                draft: self.draft.clone(),
            }),
            Err(StoreError::MissingField(_)) => {
                self.show_error = Some(REQUIRED_FIELDS_MESSAGE.to_string());
                None
            }
            Err(e) => {
                self.show_error = Some(e.to_string());
                None
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<DocumentWizardAction<S>> {
        // Any key dismisses the error popup
        if self.show_error.take().is_some() {
            return None;
        }

        if self.editing_line_item.is_some() {
            match key {
                KeyCode::Enter | KeyCode::Tab => self.next_field_in_line_item(),
                KeyCode::Esc => self.editing_line_item = None,
                _ => self.edit_line_item_value(key),
            }
            return None;
        }

        if self.editing {
            match (self.current_field, key) {
                (DocumentField::LineItems, _) => self.handle_line_items_key(key),
                (_, KeyCode::Enter | KeyCode::Esc) => self.editing = false,
                (DocumentField::Client, KeyCode::Right | KeyCode::Char(' ')) => {
                    self.cycle_client(true)
                }
                (DocumentField::Client, KeyCode::Left) => self.cycle_client(false),
                (DocumentField::Status, KeyCode::Right | KeyCode::Char(' ')) => {
                    self.draft.status = self.draft.status.next()
                }
                (DocumentField::Status, KeyCode::Left) => {
                    self.draft.status = self.draft.status.previous()
                }
                _ => self.edit_text(key),
            }
            return None;
        }

        match key {
            KeyCode::Esc => return Some(DocumentWizardAction::Cancel),
            KeyCode::Enter => self.editing = true,
            KeyCode::Up => self.previous_field(),
            KeyCode::Down | KeyCode::Tab => self.next_field(),
            KeyCode::Char('s') => return self.save(),
            _ => {}
        }
        None
    }
}

pub fn render_document_wizard<B: Backend, S: DocumentCollection>(
    frame: &mut Frame<B>,
    state: &mut DocumentWizardState<S>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),  // Title
                Constraint::Min(12),    // Form
                Constraint::Length(3),  // Help
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title_text = if state.document_id.is_some() {
        format!("{} Editing Wizard", S::KIND.label())
    } else {
        format!("{} Creation Wizard", S::KIND.label())
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_form(frame, state, chunks[1]);

    let help_text = match (state.editing, state.current_field) {
        (false, _) => "Enter - Edit field | Up/Down - Navigate fields | S - Save | Esc - Cancel",
        (true, DocumentField::Title | DocumentField::Description) => {
            "Enter - Save field | Esc - Stop editing"
        }
        (true, DocumentField::Client | DocumentField::Status) => {
            "Left/Right - Change selection | Enter - Done"
        }
        (true, DocumentField::LineItems) => {
            if state.editing_line_item.is_some() {
                "Enter/Tab - Next part | Esc - Stop editing item"
            } else {
                "A - Add item | E - Edit selected | D - Delete selected | Enter - Done"
            }
        }
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);

    if let Some(error) = &state.show_error {
        let size = frame.size();
        render_error(frame, size, error);
    }
}

fn field_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_form<B: Backend, S: DocumentCollection>(
    frame: &mut Frame<B>,
    state: &mut DocumentWizardState<S>,
    area: Rect,
) {
    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6),  // Details
                Constraint::Min(6),     // Line Items
                Constraint::Length(3),  // Total
            ]
            .as_ref(),
        )
        .split(area);

    let client_label = state.client_label();
    let fields = [
        (DocumentField::Title, "Title *", state.draft.title.clone()),
        (DocumentField::Description, "Description *", state.draft.description.clone()),
        (DocumentField::Client, "Client *", client_label),
        (DocumentField::Status, "Status", state.draft.status.label().to_string()),
    ];

    let items: Vec<ListItem> = fields
        .into_iter()
        .map(|(field, name, value)| {
            let selected = field == state.current_field;
            let value = match (selected && state.editing, field) {
                (true, DocumentField::Client | DocumentField::Status) => format!("< {} >", value),
                (true, _) => format!("{}|", value),
                (false, _) => value,
            };
            let value_style = if selected && state.editing {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Spans::from(vec![
                Span::styled(format!("{}: ", name), field_style(selected)),
                Span::styled(value, value_style),
            ]))
        })
        .collect();

    let details = List::new(items).block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(details, form_chunks[0]);

    let on_line_items = state.current_field == DocumentField::LineItems;
    let line_items_block = Block::default()
        .title(if on_line_items {
            "Line Items (selected)"
        } else {
            "Line Items"
        })
        .borders(Borders::ALL)
        .style(field_style(on_line_items));

    if let Some((idx, field, value)) = &state.editing_line_item {
        let line_items_area = line_items_block.inner(form_chunks[1]);
        frame.render_widget(line_items_block, form_chunks[1]);

        let edit_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(line_items_area);

        let item = state.draft.line_items.get(*idx).cloned().unwrap_or_default();
        let parts = [
            (LineItemField::Description, "Description: ", item.description.clone()),
            (LineItemField::Quantity, "Quantity: ", item.quantity.to_string()),
            (LineItemField::UnitPrice, "Unit Price: $", item.unit_price.to_string()),
        ];

        for (chunk, (part, label, saved)) in edit_chunks.iter().zip(parts) {
            let (shown, style) = if part == *field {
                (
                    format!("{}|", value),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                (saved, Style::default())
            };
            let paragraph = Paragraph::new(Spans::from(vec![
                Span::raw(label),
                Span::styled(shown, style),
            ]))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(paragraph, *chunk);
        }
    } else {
        let line_items: Vec<ListItem> = if state.draft.line_items.is_empty() {
            vec![ListItem::new("No line items added yet")]
        } else {
            state
                .draft
                .line_items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    ListItem::new(format!(
                        "{}. {} - {} x {} = {}",
                        i + 1,
                        if item.description.is_empty() {
                            "(no description)"
                        } else {
                            item.description.as_str()
                        },
                        item.quantity,
                        format_amount(item.unit_price),
                        format_amount(item.amount())
                    ))
                })
                .collect()
        };

        let highlight = if on_line_items && state.editing {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        let list = List::new(line_items)
            .block(line_items_block)
            .highlight_style(highlight);

        frame.render_stateful_widget(list, form_chunks[1], &mut state.line_items_list_state);
    }

    let total = Paragraph::new(Spans::from(vec![
        Span::styled("Total Amount: ", Style::default().fg(Color::Yellow)),
        Span::styled(
            format_amount(state.draft.total()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(total, form_chunks[2]);
}

pub fn handle_input<S: DocumentCollection>(
    state: &mut DocumentWizardState<S>,
) -> Result<Option<DocumentWizardAction<S>>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }
    Ok(None)
}
