use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::Status;
use crate::store::{business_info_is_empty, StatusTally, Store, Summary};
use crate::totals::format_amount;
use crate::ui::components::selection::{next_index, previous_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardItem {
    BusinessInfo,
    Clients,
    Quotes,
    Invoices,
}

impl DashboardItem {
    const ALL: [DashboardItem; 4] = [
        DashboardItem::BusinessInfo,
        DashboardItem::Clients,
        DashboardItem::Quotes,
        DashboardItem::Invoices,
    ];

    fn label(self) -> &'static str {
        match self {
            DashboardItem::BusinessInfo => "Business Info",
            DashboardItem::Clients => "Clients",
            DashboardItem::Quotes => "Quotes",
            DashboardItem::Invoices => "Invoices",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DashboardAction {
    Exit,
    Open(DashboardItem),
    Pull,
}

pub struct DashboardState {
    business_name: Option<String>,
    summary: Summary,
    has_backend: bool,
    list_state: ListState,
    message: Option<String>,
}

impl DashboardState {
    pub fn new(store: &Store, has_backend: bool) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        let business_name = store
            .business_info()
            .filter(|info| !business_info_is_empty(info))
            .map(|info| info.name.clone());

        Self {
            business_name,
            summary: store.summary(),
            has_backend,
            list_state,
            message: None,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn next(&mut self) {
        self.list_state
            .select(next_index(self.list_state.selected(), DashboardItem::ALL.len()));
    }

    pub fn previous(&mut self) {
        self.list_state
            .select(previous_index(self.list_state.selected(), DashboardItem::ALL.len()));
    }

    pub fn selected_item(&self) -> Option<DashboardItem> {
        self.list_state
            .selected()
            .and_then(|i| DashboardItem::ALL.get(i).copied())
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<DashboardAction> {
        self.message = None;
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Some(DashboardAction::Exit),
            KeyCode::Char('b') => return Some(DashboardAction::Open(DashboardItem::BusinessInfo)),
            KeyCode::Char('c') => return Some(DashboardAction::Open(DashboardItem::Clients)),
            KeyCode::Char('o') => return Some(DashboardAction::Open(DashboardItem::Quotes)),
            KeyCode::Char('i') => return Some(DashboardAction::Open(DashboardItem::Invoices)),
            KeyCode::Char('r') if self.has_backend => return Some(DashboardAction::Pull),
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            KeyCode::Enter => return self.selected_item().map(DashboardAction::Open),
            _ => {}
        }
        None
    }
}

fn tally_lines<S: Status>(title: &str, tallies: &[StatusTally<S>]) -> Vec<Spans<'static>> {
    let mut lines = vec![Spans::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Yellow),
    ))];
    for tally in tallies {
        lines.push(Spans::from(format!(
            "  {:<10} {:>4}   {}",
            tally.status.label(),
            tally.count,
            format_amount(tally.amount)
        )));
    }
    lines.push(Spans::from(""));
    lines
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(1)].as_ref())
        .split(chunks[0]);

    let items: Vec<ListItem> = DashboardItem::ALL
        .iter()
        .map(|item| ListItem::new(Spans::from(vec![Span::raw(item.label())])))
        .collect();

    let menu = List::new(items)
        .block(Block::default().title("Business Admin").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(menu, body[0], &mut state.list_state);

    let summary = &state.summary;
    let mut lines = vec![
        Spans::from(vec![
            Span::styled("Business: ", Style::default().fg(Color::Yellow)),
            Span::raw(state.business_name.clone().unwrap_or_else(|| "Not set".to_string())),
        ]),
        Spans::from(""),
        Spans::from(vec![
            Span::styled("Clients: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                "{} ({} active)",
                summary.clients_total, summary.clients_active
            )),
        ]),
        Spans::from(""),
    ];
    lines.extend(tally_lines("Quotes", &summary.quotes));
    lines.extend(tally_lines("Invoices", &summary.invoices));
    if let Some(message) = &state.message {
        lines.push(Spans::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Green),
        )));
    }

    let overview = Paragraph::new(lines)
        .block(Block::default().title("Overview").borders(Borders::ALL));
    frame.render_widget(overview, body[1]);

    let buttons_text = if state.has_backend {
        "<Enter> Open | <B> Business | <C> Clients | <O> Quotes | <I> Invoices | <R> Refresh | <Esc> Exit"
    } else {
        "<Enter> Open | <B> Business | <C> Clients | <O> Quotes | <I> Invoices | <Esc> Exit"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[1]);
}

pub fn handle_input(state: &mut DashboardState) -> Result<Option<DashboardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(state.handle_key(key.code));
    }
    Ok(None)
}
