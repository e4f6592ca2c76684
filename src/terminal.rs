use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use base64::Engine;
use neuratek::app::{App, AppMsg};
use neuratek::models::{Message, Role};

/// Confirmations and prompts answered on stdin.
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask(message: &str) -> Option<String> {
        print!("{} ", message);
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("Failed to flush stdout: {}", e);
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) => None,
            Ok(_) => Some(answer.trim().to_string()),
            Err(e) => {
                tracing::error!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

impl neuratek::services::Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        matches!(
            Self::ask(&format!("{} [y/N]", message)).as_deref(),
            Some("y" | "Y" | "yes")
        )
    }

    fn prompt(&self, message: &str) -> Option<String> {
        Self::ask(message)
    }
}

/// Copies through the terminal emulator with an OSC 52 escape sequence.
pub struct TerminalClipboard;

fn osc52(text: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{}\x07", payload)
}

impl neuratek::services::Clipboard for TerminalClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(osc52(text).as_bytes())
            .context("Failed to write clipboard sequence")?;
        stdout.flush().context("Failed to flush stdout")?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    List,
    Show,
    Intent(AppMsg),
    Text(String),
    Unknown(String),
}

impl Command {
    /// Thread and message numbers are 1-based on screen.
    pub fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Text(line.to_string());
        };
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let index = parts
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1));

        match (name, index) {
            ("quit" | "exit", _) => Command::Quit,
            ("help", _) => Command::Help,
            ("list", _) => Command::List,
            ("show", _) => Command::Show,
            ("new", _) => Command::Intent(AppMsg::NewChat),
            ("clear", _) => Command::Intent(AppMsg::ClearHistory),
            ("paste", _) => Command::Intent(AppMsg::TogglePasteCapture),
            ("open", Some(i)) => Command::Intent(AppMsg::SelectChat(i)),
            ("delete", Some(i)) => Command::Intent(AppMsg::DeleteChat(i)),
            ("rename", Some(i)) => Command::Intent(AppMsg::RenameChat(i)),
            ("copy", Some(i)) => Command::Intent(AppMsg::CopyMessage(i)),
            _ => Command::Unknown(line.to_string()),
        }
    }
}

pub fn print_help() {
    println!("  /list            list chats");
    println!("  /show            show the current chat");
    println!("  /new             start a new chat");
    println!("  /open N          switch to chat N");
    println!("  /rename N        rename chat N");
    println!("  /delete N        delete chat N");
    println!("  /clear           delete all chats");
    println!("  /copy N          copy message N of the current chat");
    println!("  /paste           paste the next line as an assistant reply");
    println!("  /quit            exit");
}

pub fn render_thread_list(app: &App) {
    let store = app.store();
    for (i, thread) in store.threads().iter().enumerate() {
        let marker = if i == store.active_index() { '*' } else { ' ' };
        let title = if thread.summary.is_empty() {
            "New conversation"
        } else {
            thread.summary.as_str()
        };
        let count = thread.messages.len();
        println!(
            "{} {:>2}. {} ({} message{})",
            marker,
            i + 1,
            title,
            count,
            if count == 1 { "" } else { "s" }
        );
    }
}

fn message_label(message: &Message) -> &'static str {
    if message.is_pasted() {
        "pasted"
    } else {
        message.role.as_str()
    }
}

fn render_message(index: usize, message: &Message) {
    if message.role == Role::Bot {
        if let Some(reasoning) = &message.reasoning {
            println!("  [{}]", reasoning);
        }
    }
    println!("{:>3} {}: {}", index + 1, message_label(message), message.text);
}

pub fn render_thread(app: &App) {
    let thread = app.store().active_thread();
    if thread.summary.is_empty() {
        println!("== New conversation ==");
    } else {
        println!("== {} ==", thread.summary);
    }
    if thread.messages.is_empty() {
        println!("How can I help you?");
    }
    for (i, message) in thread.messages.iter().enumerate() {
        render_message(i, message);
    }
}

pub fn render_last_reply(app: &App) {
    let messages = &app.store().active_thread().messages;
    if let Some(message) = messages.last() {
        render_message(messages.len() - 1, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("hola"), Command::Text("hola".to_string()));
        assert_eq!(Command::parse("/new"), Command::Intent(AppMsg::NewChat));
        assert_eq!(Command::parse("/delete 2"), Command::Intent(AppMsg::DeleteChat(1)));
        assert_eq!(Command::parse("/open 1"), Command::Intent(AppMsg::SelectChat(0)));
        assert_eq!(Command::parse("/rename 0"), Command::Unknown("/rename 0".to_string()));
        assert_eq!(Command::parse("/copy 3"), Command::Intent(AppMsg::CopyMessage(2)));
        assert_eq!(Command::parse("/copy"), Command::Unknown("/copy".to_string()));
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/bogus"), Command::Unknown("/bogus".to_string()));
    }

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52("hola"), "\x1b]52;c;aG9sYQ==\x07");
    }

    #[test]
    fn test_message_labels() {
        assert_eq!(message_label(&Message::user("a")), "user");
        assert_eq!(message_label(&Message::bot("b", None)), "bot");
        assert_eq!(message_label(&Message::pasted("c", "r")), "pasted");
    }
}
