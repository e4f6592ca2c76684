mod terminal;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use neuratek::app::{loading_label, App, AppMsg, SendOutcome};
use neuratek::config::{AppConfig, APP_NAME};
use neuratek::providers::HttpBackend;
use neuratek::services::{ConversationStore, Database, Dispatcher, Persistence};

use terminal::{Command, TerminalClipboard, TerminalPrompter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::load()?;
    let db_path = config.storage.resolve_database_path()?;
    let db = Database::open(&db_path)?;

    let store = ConversationStore::load(
        Persistence::new(Box::new(db)),
        Box::new(TerminalPrompter),
    );
    let backend = HttpBackend::new(&config.backend)?;
    let dispatcher = Dispatcher::new(Arc::new(backend), &config.backend);
    let mut app = App::new(store, dispatcher, Box::new(TerminalClipboard));

    println!("{} (type /help for commands)", APP_NAME);
    terminal::render_thread(&app);

    let stdin = io::stdin();
    loop {
        print!("{}> ", if app.paste_capture() { "paste" } else { "" });
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(&['\r', '\n'][..]).to_string();

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => terminal::print_help(),
            Command::List => terminal::render_thread_list(&app),
            Command::Show => terminal::render_thread(&app),
            Command::Intent(msg) => {
                let redraw = !matches!(msg, AppMsg::TogglePasteCapture | AppMsg::CopyMessage(_));
                app.update(msg).await;
                if redraw {
                    terminal::render_thread(&app);
                }
            }
            Command::Text(text) if app.paste_capture() => {
                app.update(AppMsg::Paste {
                    text,
                    input_focused: true,
                })
                .await;
                terminal::render_thread(&app);
            }
            Command::Text(text) => {
                app.update(AppMsg::SetInput(text)).await;
                match send_with_indicator(&mut app).await {
                    SendOutcome::Rejected | SendOutcome::Busy => {}
                    SendOutcome::Replied | SendOutcome::Failed => terminal::render_last_reply(&app),
                }
            }
            Command::Unknown(cmd) => println!("Unknown command: {}", cmd),
        }
    }

    Ok(())
}

async fn send_with_indicator(app: &mut App) -> SendOutcome {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let send = app.send_message();
    tokio::pin!(send);

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            _ = ticker.tick() => {
                eprint!("\r{}   ", loading_label(started.elapsed()));
            }
        }
    };
    eprint!("\r{}\r", " ".repeat(32));
    outcome
}
