//! Table of quotes or invoices, one generic screen for both.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Client, Document, Status};
use crate::store::{DocumentCollection, StatusFilter, Store};
use crate::totals::format_amount;
use crate::ui::components::popup::render_delete_confirmation;
use crate::ui::components::selection::{clamp_index, next_index, previous_index};

pub struct DocumentsState<S> {
    documents: Vec<Document<S>>,
    clients: Vec<Client>,
    filter: StatusFilter<S>,
    table_state: TableState,
    show_delete_confirmation: bool,
    message: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum DocumentAction {
    Back,
    New,
    Edit(i64),
    Delete(i64),
    Export(i64),
}

impl<S: DocumentCollection> DocumentsState<S> {
    pub fn new(store: &Store) -> Self {
        let mut state = Self {
            documents: Vec::new(),
            clients: Vec::new(),
            filter: StatusFilter::All,
            table_state: TableState::default(),
            show_delete_confirmation: false,
            message: None,
        };
        state.reload(store);
        state
    }

    pub fn reload(&mut self, store: &Store) {
        self.documents = store.documents::<S>().to_vec();
        self.clients = store.clients().to_vec();
        self.clamp_selection();
    }

    /// One-line status shown under the table until the next key press.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    fn visible(&self) -> Vec<&Document<S>> {
        self.documents
            .iter()
            .filter(|d| self.filter.matches(d.status))
            .collect()
    }

    fn client_name(&self, client_id: Option<i64>) -> &str {
        client_id
            .and_then(|id| self.clients.iter().find(|c| c.id == id))
            .map_or("-", |c| c.name.as_str())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.table_state
            .select(clamp_index(self.table_state.selected(), len));
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        self.table_state.select(next_index(self.table_state.selected(), len));
    }

    pub fn previous(&mut self) {
        let len = self.visible().len();
        self.table_state
            .select(previous_index(self.table_state.selected(), len));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_document_id(&self) -> Option<i64> {
        let visible = self.visible();
        self.table_state
            .selected()
            .and_then(|i| visible.get(i))
            .map(|d| d.id)
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<DocumentAction> {
        self.message = None;

        if self.show_delete_confirmation {
            match key {
                KeyCode::Char('y') => {
                    self.toggle_delete_confirmation();
                    return self.selected_document_id().map(DocumentAction::Delete);
                }
                KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                    self.toggle_delete_confirmation();
                }
                _ => {}
            }
            return None;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Some(DocumentAction::Back),
            KeyCode::Char('n') => return Some(DocumentAction::New),
            KeyCode::Char('e') | KeyCode::Enter => {
                return self.selected_document_id().map(DocumentAction::Edit);
            }
            KeyCode::Char('x') => {
                return self.selected_document_id().map(DocumentAction::Export);
            }
            KeyCode::Char('d') => {
                if self.selected_document_id().is_some() {
                    self.toggle_delete_confirmation();
                }
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.cycle();
                self.table_state.select(None);
                self.clamp_selection();
            }
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            _ => {}
        }
        None
    }
}

pub fn render_documents<B: Backend, S: DocumentCollection>(
    frame: &mut Frame<B>,
    state: &mut DocumentsState<S>,
) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    let header_cells = ["Title", "Client", "Date", "Status", "Total"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    let visible = state.visible();
    let title = format!(
        "{} [{}] ({} of {})",
        S::KIND.plural(),
        state.filter.label(),
        visible.len(),
        state.documents.len()
    );
    let rows: Vec<Row> = visible
        .iter()
        .map(|document| {
            Row::new(vec![
                Cell::from(document.title.clone()),
                Cell::from(state.client_name(document.client_id).to_string()),
                Cell::from(document.date.format("%Y-%m-%d").to_string()),
                Cell::from(document.status.label()),
                Cell::from(format_amount(document.total_amount)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(12),
            Constraint::Percentage(18),
        ]);

    frame.render_stateful_widget(table, chunks[0], &mut state.table_state);

    if let Some(message) = &state.message {
        let status = Paragraph::new(message.as_str()).style(Style::default().fg(Color::Green));
        frame.render_widget(status, chunks[1]);
    }

    let buttons_text = if state.selected_document_id().is_some() {
        "<N> New | <E> Edit | <D> Delete | <X> Export PDF | <F> Filter status | <Esc> Back"
    } else {
        "<N> New | <F> Filter status | <Esc> Back"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[2]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size, &S::KIND.label().to_lowercase());
    }
}

pub fn handle_input<S: DocumentCollection>(
    state: &mut DocumentsState<S>,
) -> Result<Option<DocumentAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use chrono::{TimeZone, Utc};

    fn demo() -> Store {
        Store::demo(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn filter_cycle_narrows_to_one_status() {
        let store = demo();
        let mut state = DocumentsState::<InvoiceStatus>::new(&store);
        assert_eq!(state.visible().len(), 2);

        // all -> pending
        state.handle_key(KeyCode::Char('f'));
        assert_eq!(state.visible().len(), 1);
        assert_eq!(state.selected_document_id(), Some(store.invoices()[1].id));

        // pending -> paid -> overdue
        state.handle_key(KeyCode::Char('f'));
        state.handle_key(KeyCode::Char('f'));
        assert!(state.visible().is_empty());
        assert_eq!(state.handle_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn export_and_delete_target_the_selected_row() {
        let store = demo();
        let second = store.invoices()[1].id;
        let mut state = DocumentsState::<InvoiceStatus>::new(&store);
        state.handle_key(KeyCode::Down);

        assert_eq!(
            state.handle_key(KeyCode::Char('x')),
            Some(DocumentAction::Export(second))
        );
        state.handle_key(KeyCode::Char('d'));
        assert_eq!(
            state.handle_key(KeyCode::Char('y')),
            Some(DocumentAction::Delete(second))
        );
    }

    #[test]
    fn message_clears_on_next_key() {
        let mut state = DocumentsState::<InvoiceStatus>::new(&demo());
        state.set_message("Exported");
        state.handle_key(KeyCode::Down);
        assert_eq!(state.message, None);
        assert_eq!(state.client_name(Some(-1)), "-");
    }
}
