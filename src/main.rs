mod api;
mod config;
mod db;
mod error;
mod models;
mod pdf_export;
mod session;
mod store;
mod totals;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::config::Config;
use crate::models::{DocumentKind, InvoiceStatus, QuoteStatus, Status};
use crate::pdf_export::DocumentExporter;
use crate::session::Session;
use crate::store::{DocumentCollection, StatusTally, Store, business_info_is_empty};
use crate::totals::format_amount;
use crate::ui::{
    business_info_wizard::{
        BusinessInfoWizardAction, BusinessInfoWizardState,
        handle_input as handle_business_info_wizard_input, render_business_info_wizard,
    },
    client_wizard::{
        ClientWizardAction, ClientWizardState, handle_input as handle_client_wizard_input,
        render_client_wizard,
    },
    clients::{ClientAction, ClientsState, handle_input as handle_clients_input, render_clients},
    dashboard::{
        DashboardAction, DashboardItem, DashboardState, handle_input as handle_dashboard_input,
        render_dashboard,
    },
    document_wizard::{
        DocumentWizardAction, DocumentWizardState, handle_input as handle_document_wizard_input,
        render_document_wizard,
    },
    documents::{
        DocumentAction, DocumentsState, handle_input as handle_documents_input, render_documents,
    },
};

#[derive(Parser)]
#[command(name = "business_admin", version, about = "Clients, quotes and invoices for a small business")]
struct Cli {
    /// SQLite database holding local storage (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Base URL of the REST backend (overrides API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory exported PDFs are written to (overrides EXPORT_DIR)
    #[arg(long, global = true)]
    export_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal UI (the default)
    Tui,
    /// Print client counts and quote/invoice totals per status
    Summary,
    /// Write a quote or invoice to a PDF file
    Export {
        kind: ExportKind,
        id: i64,
    },
    /// Fetch every collection from the backend into local storage
    Pull,
    /// Replace local storage with sample data
    SeedDemo,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Quote,
    Invoice,
}

// Represents the current screen in the app
#[derive(Clone, Copy, PartialEq)]
enum AppScreen {
    Dashboard,
    BusinessInfoWizard,
    Clients,
    ClientWizard,
    Quotes,
    QuoteWizard,
    Invoices,
    InvoiceWizard,
}

// Per-screen state; a screen's slot is filled when it is shown
#[derive(Default)]
struct Screens {
    dashboard: Option<DashboardState>,
    business_info_wizard: Option<BusinessInfoWizardState>,
    clients: Option<ClientsState>,
    client_wizard: Option<ClientWizardState>,
    quotes: Option<DocumentsState<QuoteStatus>>,
    quote_wizard: Option<DocumentWizardState<QuoteStatus>>,
    invoices: Option<DocumentsState<InvoiceStatus>>,
    invoice_wizard: Option<DocumentWizardState<InvoiceStatus>>,
}

// Main application state
struct AppState {
    session: Session,
    exporter: DocumentExporter,
    screen: AppScreen,
    screens: Screens,
}

/// Lets the quote and invoice screens share one set of handlers.
trait DocumentScreens: DocumentCollection {
    const LIST: AppScreen;
    const WIZARD: AppScreen;

    fn list(screens: &mut Screens) -> &mut Option<DocumentsState<Self>>;

    fn wizard(screens: &mut Screens) -> &mut Option<DocumentWizardState<Self>>;
}

impl DocumentScreens for QuoteStatus {
    const LIST: AppScreen = AppScreen::Quotes;
    const WIZARD: AppScreen = AppScreen::QuoteWizard;

    fn list(screens: &mut Screens) -> &mut Option<DocumentsState<Self>> {
        &mut screens.quotes
    }

    fn wizard(screens: &mut Screens) -> &mut Option<DocumentWizardState<Self>> {
        &mut screens.quote_wizard
    }
}

impl DocumentScreens for InvoiceStatus {
    const LIST: AppScreen = AppScreen::Invoices;
    const WIZARD: AppScreen = AppScreen::InvoiceWizard;

    fn list(screens: &mut Screens) -> &mut Option<DocumentsState<Self>> {
        &mut screens.invoices
    }

    fn wizard(screens: &mut Screens) -> &mut Option<DocumentWizardState<Self>> {
        &mut screens.invoice_wizard
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, command line flags win over the environment
    let config = config::init()?.with_overrides(cli.database_url, cli.api_url, cli.export_dir);
    init_tracing(&config)?;
    info!(
        database_url = config.database_url(),
        backend = config.api_base_url.as_deref().unwrap_or("none"),
        "Starting business admin"
    );

    let mut session = Session::open(&config).await?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let exporter = DocumentExporter::new(&config.export_dir)?;
            run_tui(session, exporter).await?;
        }
        Commands::Summary => print_summary(session.store()),
        Commands::Export { kind, id } => {
            let exporter = DocumentExporter::new(&config.export_dir)?;
            let path = match kind {
                ExportKind::Quote => export_document::<QuoteStatus>(&session, &exporter, id)?,
                ExportKind::Invoice => export_document::<InvoiceStatus>(&session, &exporter, id)?,
            };
            println!("{}", path.display());
        }
        Commands::Pull => {
            // Opening the session already pulled.
            if !session.has_backend() {
                anyhow::bail!("No backend configured; set API_BASE_URL or pass --api-url");
            }
            let store = session.store();
            println!(
                "Pulled {} clients, {} quotes, {} invoices",
                store.clients().len(),
                store.quotes().len(),
                store.invoices().len()
            );
        }
        Commands::SeedDemo => {
            session.replace(Store::demo(Utc::now())?).await?;
            println!("Local storage replaced with sample data");
        }
    }

    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_tracing(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn export_document<S: DocumentCollection>(
    session: &Session,
    exporter: &DocumentExporter,
    id: i64,
) -> Result<PathBuf> {
    let store = session.store();
    let document = store
        .document::<S>(id)
        .with_context(|| format!("{} {} not found", S::KIND, id))?;
    let client = document.client_id.and_then(|client_id| store.client(client_id));

    exporter.export(document, store.business_info(), client)
}

fn print_tallies<S: Status>(kind: DocumentKind, tallies: &[StatusTally<S>]) {
    println!("{}:", kind.plural());
    for tally in tallies {
        println!(
            "  {:<10} {:>4}  {:>12}",
            tally.status.label(),
            tally.count,
            format_amount(tally.amount)
        );
    }
}

fn print_summary(store: &Store) {
    let summary = store.summary();
    let business = store
        .business_info()
        .filter(|info| !business_info_is_empty(info))
        .map_or("Not set", |info| info.name.as_str());

    println!("Business: {}", business);
    println!(
        "Clients: {} ({} active)",
        summary.clients_total, summary.clients_active
    );
    print_tallies(DocumentKind::Quote, &summary.quotes);
    print_tallies(DocumentKind::Invoice, &summary.invoices);
}

async fn run_tui(session: Session, exporter: DocumentExporter) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState {
        session,
        exporter,
        screen: AppScreen::Dashboard,
        screens: Screens::default(),
    };
    show_dashboard(&mut app_state);

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "Terminal UI stopped");
    }
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Render current screen
        let screens = &mut app_state.screens;
        terminal.draw(|f| {
            match app_state.screen {
                AppScreen::Dashboard => {
                    if let Some(state) = &mut screens.dashboard {
                        render_dashboard(f, state);
                    }
                }
                AppScreen::BusinessInfoWizard => {
                    if let Some(state) = &mut screens.business_info_wizard {
                        render_business_info_wizard(f, state);
                    }
                }
                AppScreen::Clients => {
                    if let Some(state) = &mut screens.clients {
                        render_clients(f, state);
                    }
                }
                AppScreen::ClientWizard => {
                    if let Some(state) = &mut screens.client_wizard {
                        render_client_wizard(f, state);
                    }
                }
                AppScreen::Quotes => {
                    if let Some(state) = &mut screens.quotes {
                        render_documents(f, state);
                    }
                }
                AppScreen::QuoteWizard => {
                    if let Some(state) = &mut screens.quote_wizard {
                        render_document_wizard(f, state);
                    }
                }
                AppScreen::Invoices => {
                    if let Some(state) = &mut screens.invoices {
                        render_documents(f, state);
                    }
                }
                AppScreen::InvoiceWizard => {
                    if let Some(state) = &mut screens.invoice_wizard {
                        render_document_wizard(f, state);
                    }
                }
            }
        })?;

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::Dashboard => handle_dashboard_screen(app_state).await?,
            AppScreen::BusinessInfoWizard => handle_business_info_wizard_screen(app_state).await?,
            AppScreen::Clients => handle_clients_screen(app_state).await?,
            AppScreen::ClientWizard => handle_client_wizard_screen(app_state).await?,
            AppScreen::Quotes => handle_documents_screen::<QuoteStatus>(app_state).await?,
            AppScreen::QuoteWizard => handle_document_wizard_screen::<QuoteStatus>(app_state).await?,
            AppScreen::Invoices => handle_documents_screen::<InvoiceStatus>(app_state).await?,
            AppScreen::InvoiceWizard => handle_document_wizard_screen::<InvoiceStatus>(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn show_dashboard(app_state: &mut AppState) {
    let session = &app_state.session;
    app_state.screens.dashboard = Some(DashboardState::new(session.store(), session.has_backend()));
    app_state.screen = AppScreen::Dashboard;
}

fn show_clients(app_state: &mut AppState) {
    let store = app_state.session.store();
    if let Some(state) = &mut app_state.screens.clients {
        state.reload(store);
    } else {
        app_state.screens.clients = Some(ClientsState::new(store));
    }
    app_state.screens.client_wizard = None;
    app_state.screen = AppScreen::Clients;
}

fn show_documents<S: DocumentScreens>(app_state: &mut AppState) {
    let store = app_state.session.store();
    let slot = S::list(&mut app_state.screens);
    if let Some(state) = slot {
        state.reload(store);
    } else {
        *slot = Some(DocumentsState::new(store));
    }
    *S::wizard(&mut app_state.screens) = None;
    app_state.screen = S::LIST;
}

async fn handle_dashboard_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.screens.dashboard {
        Some(state) => handle_dashboard_input(state)?,
        None => None,
    };

    match action {
        Some(DashboardAction::Exit) => return Ok(true),
        Some(DashboardAction::Open(DashboardItem::BusinessInfo)) => {
            let wizard = BusinessInfoWizardState::new(app_state.session.store().business_info());
            app_state.screens.business_info_wizard = Some(wizard);
            app_state.screen = AppScreen::BusinessInfoWizard;
        }
        Some(DashboardAction::Open(DashboardItem::Clients)) => show_clients(app_state),
        Some(DashboardAction::Open(DashboardItem::Quotes)) => show_documents::<QuoteStatus>(app_state),
        Some(DashboardAction::Open(DashboardItem::Invoices)) => show_documents::<InvoiceStatus>(app_state),
        Some(DashboardAction::Pull) => {
            let message = match app_state.session.pull().await {
                Ok(_) => "Refreshed from backend".to_string(),
                Err(e) => {
                    warn!(error = %e, "Refresh failed");
                    format!("Refresh failed: {}", e)
                }
            };
            show_dashboard(app_state);
            if let Some(state) = &mut app_state.screens.dashboard {
                state.set_message(message);
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_business_info_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.screens.business_info_wizard {
        Some(state) => handle_business_info_wizard_input(state)?,
        None => None,
    };

    match action {
        Some(BusinessInfoWizardAction::Cancel) => {
            app_state.screens.business_info_wizard = None;
            show_dashboard(app_state);
        }
        Some(BusinessInfoWizardAction::Save(info)) => {
            app_state.session.update_business_info(info).await?;
            app_state.screens.business_info_wizard = None;
            show_dashboard(app_state);
        }
        None => {}
    }

    Ok(false)
}

async fn handle_clients_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.screens.clients {
        Some(state) => handle_clients_input(state)?,
        None => None,
    };

    match action {
        Some(ClientAction::Back) => show_dashboard(app_state),
        Some(ClientAction::NewClient) => {
            app_state.screens.client_wizard = Some(ClientWizardState::new());
            app_state.screen = AppScreen::ClientWizard;
        }
        Some(ClientAction::EditClient(client_id)) => {
            if let Some(client) = app_state.session.store().client(client_id) {
                app_state.screens.client_wizard = Some(ClientWizardState::from_existing(client));
                app_state.screen = AppScreen::ClientWizard;
            }
        }
        Some(ClientAction::DeleteClient(client_id)) => {
            app_state.session.delete_client(client_id).await?;
            show_clients(app_state);
        }
        None => {}
    }

    Ok(false)
}

async fn handle_client_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.screens.client_wizard {
        Some(state) => handle_client_wizard_input(state)?,
        None => None,
    };

    match action {
        Some(ClientWizardAction::Cancel) => show_clients(app_state),
        Some(ClientWizardAction::Save { client_id, draft }) => {
            let saved = match client_id {
                Some(id) => app_state.session.update_client(id, draft).await,
                None => app_state.session.add_client(draft).await.map(|_| ()),
            };
            match saved {
                Ok(()) => show_clients(app_state),
                Err(e) => {
                    error!(error = %e, "Failed to save client");
                    if let Some(state) = &mut app_state.screens.client_wizard {
                        state.set_error(e.to_string());
                    }
                }
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_documents_screen<S: DocumentScreens>(app_state: &mut AppState) -> Result<bool> {
    let action = match S::list(&mut app_state.screens) {
        Some(state) => handle_documents_input(state)?,
        None => None,
    };

    match action {
        Some(DocumentAction::Back) => show_dashboard(app_state),
        Some(DocumentAction::New) => {
            let wizard = DocumentWizardState::<S>::new(app_state.session.store());
            *S::wizard(&mut app_state.screens) = Some(wizard);
            app_state.screen = S::WIZARD;
        }
        Some(DocumentAction::Edit(id)) => {
            let store = app_state.session.store();
            if let Some(document) = store.document::<S>(id) {
                *S::wizard(&mut app_state.screens) = Some(DocumentWizardState::from_existing(document, store));
                app_state.screen = S::WIZARD;
            }
        }
        Some(DocumentAction::Delete(id)) => {
            app_state.session.delete_document::<S>(id).await?;
            show_documents::<S>(app_state);
        }
        Some(DocumentAction::Export(id)) => {
            let message = match export_document::<S>(&app_state.session, &app_state.exporter, id) {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    error!(id, kind = %S::KIND, error = %e, "Export failed");
                    format!("Export failed: {}", e)
                }
            };
            if let Some(state) = S::list(&mut app_state.screens) {
                state.set_message(message);
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_document_wizard_screen<S: DocumentScreens>(app_state: &mut AppState) -> Result<bool> {
    let action = match S::wizard(&mut app_state.screens) {
        Some(state) => handle_document_wizard_input(state)?,
        None => None,
    };

    match action {
        Some(DocumentWizardAction::Cancel) => show_documents::<S>(app_state),
        Some(DocumentWizardAction::Save { document_id, draft }) => {
            let saved = match document_id {
                Some(id) => app_state.session.update_document(id, draft).await,
                None => app_state.session.add_document(draft).await.map(|_| ()),
            };
            match saved {
                Ok(()) => show_documents::<S>(app_state),
                Err(e) => {
                    error!(kind = %S::KIND, error = %e, "Failed to save document");
                    if let Some(state) = S::wizard(&mut app_state.screens) {
                        state.set_error(e.to_string());
                    }
                }
            }
        }
        None => {}
    }

    Ok(false)
}
