use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Client, Status};
use crate::store::{ClientFilter, Store};
use crate::ui::components::popup::render_delete_confirmation;
use crate::ui::components::selection::{clamp_index, next_index, previous_index};

// Represents the state of the client table screen
pub struct ClientsState {
    clients: Vec<Client>,
    filter: ClientFilter,
    table_state: TableState,
    searching: bool,
    show_delete_confirmation: bool,
}

#[derive(Debug, PartialEq)]
pub enum ClientAction {
    Back,
    NewClient,
    EditClient(i64),
    DeleteClient(i64),
}

impl ClientsState {
    pub fn new(store: &Store) -> Self {
        let mut state = Self {
            clients: Vec::new(),
            filter: ClientFilter::default(),
            table_state: TableState::default(),
            searching: false,
            show_delete_confirmation: false,
        };
        state.reload(store);
        state
    }

    /// Picks up a new snapshot, keeping the filter and cursor position.
    pub fn reload(&mut self, store: &Store) {
        self.clients = store.clients().to_vec();
        self.clamp_selection();
    }

    fn visible(&self) -> Vec<&Client> {
        self.clients.iter().filter(|c| self.filter.matches(c)).collect()
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

    pub fn selected_client_id(&self) -> Option<i64> {
        let visible = self.visible();
        self.table_state
            .selected()
            .and_then(|i| visible.get(i))
            .map(|c| c.id)
    }

    pub fn cycle_filter(&mut self) {
        self.filter.status = self.filter.status.cycle();
        self.table_state.select(None);
        self.clamp_selection();
    }

    fn edit_search(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => self.searching = false,
            KeyCode::Char(c) => self.filter.search.push(c),
            KeyCode::Backspace => {
                self.filter.search.pop();
            }
            _ => return,
        }
        self.table_state.select(None);
        self.clamp_selection();
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<ClientAction> {
        if self.searching {
            self.edit_search(key);
            return None;
        }

        if self.show_delete_confirmation {
            match key {
                KeyCode::Char('y') => {
                    self.toggle_delete_confirmation();
                    return self.selected_client_id().map(ClientAction::DeleteClient);
                }
                KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                    self.toggle_delete_confirmation();
                }
                _ => {}
            }
            return None;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Some(ClientAction::Back),
            KeyCode::Char('n') => return Some(ClientAction::NewClient),
            KeyCode::Char('e') | KeyCode::Enter => {
                return self.selected_client_id().map(ClientAction::EditClient);
            }
            KeyCode::Char('d') => {
                if self.selected_client_id().is_some() {
                    self.toggle_delete_confirmation();
                }
            }
            KeyCode::Char('f') => self.cycle_filter(),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            _ => {}
        }
        None
    }
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    let search_text = if state.searching {
        format!("{}|", state.filter.search)
    } else {
        state.filter.search.clone()
    };
    let filter_line = Paragraph::new(format!(
        "Status: {}    Search: {}",
        state.filter.status.label(),
        search_text
    ))
    .block(Block::default().title("Filter").borders(Borders::ALL))
    .style(if state.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    });
    frame.render_widget(filter_line, chunks[0]);

    let header_cells = ["Name", "Email", "Phone", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    let visible = state.visible();
    let title = format!("Clients ({} of {})", visible.len(), state.clients.len());
    let rows: Vec<Row> = visible
        .iter()
        .map(|client| {
            Row::new(vec![
                Cell::from(client.name.clone()),
                Cell::from(client.email.clone()),
                Cell::from(client.phone.clone()),
                Cell::from(client.status.label()),
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
            Constraint::Percentage(35),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ]);

    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    let buttons_text = if state.searching {
        "Type to search by name | <Enter>/<Esc> Done"
    } else if state.selected_client_id().is_some() {
        "<N> New | <E> Edit | <D> Delete | <F> Filter status | </> Search | <Esc> Back"
    } else {
        "<N> New | <F> Filter status | </> Search | <Esc> Back"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[2]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size, "client");
    }
}

pub fn handle_input(state: &mut ClientsState) -> Result<Option<ClientAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientStatus;
    use crate::store::ClientDraft;
    use chrono::{TimeZone, Utc};

    fn store() -> Store {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let (store, _) = Store::default()
            .add_client(
                ClientDraft {
                    name: "Acme".to_string(),
                    email: "a@acme.test".to_string(),
                    ..ClientDraft::default()
                },
                now,
            )
            .unwrap();
        let (store, _) = store
            .add_client(
                ClientDraft {
                    name: "Globex".to_string(),
                    email: "g@globex.test".to_string(),
                    status: ClientStatus::Inactive,
                    ..ClientDraft::default()
                },
                now,
            )
            .unwrap();
        store
    }

    #[test]
    fn delete_needs_confirmation() {
        let store = store();
        let mut state = ClientsState::new(&store);
        let first = store.clients()[0].id;

        assert_eq!(state.handle_key(KeyCode::Char('d')), None);
        assert!(state.show_delete_confirmation);
        assert_eq!(
            state.handle_key(KeyCode::Char('y')),
            Some(ClientAction::DeleteClient(first))
        );

        state.handle_key(KeyCode::Char('d'));
        assert_eq!(state.handle_key(KeyCode::Char('n')), None);
        assert!(!state.show_delete_confirmation);
    }

    #[test]
    fn status_filter_and_search_narrow_the_table() {
        let store = store();
        let globex = store.clients()[1].id;
        let mut state = ClientsState::new(&store);

        // all -> active -> inactive
        state.handle_key(KeyCode::Char('f'));
        state.handle_key(KeyCode::Char('f'));
        assert_eq!(state.visible().len(), 1);
        assert_eq!(state.selected_client_id(), Some(globex));

        state.handle_key(KeyCode::Char('f'));
        state.handle_key(KeyCode::Char('/'));
        for c in "ACM".chars() {
            state.handle_key(KeyCode::Char(c));
        }
        // 'q' is search text here, not "back"
        assert_eq!(state.handle_key(KeyCode::Char('q')), None);
        assert!(state.visible().is_empty());
        assert_eq!(state.selected_client_id(), None);

        state.handle_key(KeyCode::Backspace);
        state.handle_key(KeyCode::Enter);
        assert_eq!(state.visible()[0].name, "Acme");
    }

    #[test]
    fn reload_keeps_the_cursor_in_range() {
        let store = store();
        let mut state = ClientsState::new(&store);
        state.handle_key(KeyCode::Down);

        let last = store.clients()[1].id;
        state.reload(&store.delete_client(last).unwrap());

        assert_eq!(state.selected_client_id(), Some(store.clients()[0].id));
    }
}
