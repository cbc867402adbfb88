//! Terminal rendering of the observable scan state

use crate::session::api::{ScanStatus, SessionState};
use colored::Colorize;

/// One-line description of a status, or None when there is nothing to say
pub fn describe(status: &ScanStatus) -> Option<String> {
    let message = status.message.as_deref();
    match status.state {
        SessionState::Idle => message.map(str::to_string),
        SessionState::Scanning => Some("Scanning... present a ticket code".to_string()),
        SessionState::Verifying => Some(format!(
            "Verifying '{}'",
            status.scanned.as_deref().unwrap_or_default()
        )),
        SessionState::Confirmed => Some(with_message("Ticket confirmed", message)),
        SessionState::Rejected => Some(with_message("Ticket rejected", message)),
        SessionState::Failed => Some(with_message("Scanner failed", message)),
    }
}

fn with_message(headline: &str, message: Option<&str>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!("{}: {}", headline, message),
        _ => headline.to_string(),
    }
}

/// `describe` with a status mark, coloured when enabled
pub fn render(status: &ScanStatus, color: bool) -> Option<String> {
    let text = describe(status)?;
    let mark = match status.state {
        SessionState::Confirmed => "✔",
        SessionState::Rejected => "✘",
        SessionState::Failed | SessionState::Idle => "!",
        SessionState::Scanning | SessionState::Verifying => "•",
    };
    if !color {
        return Some(format!("{} {}", mark, text));
    }
    let mark = match status.state {
        SessionState::Confirmed => mark.green().bold(),
        SessionState::Rejected => mark.red().bold(),
        SessionState::Failed | SessionState::Idle => mark.yellow().bold(),
        SessionState::Scanning | SessionState::Verifying => mark.cyan(),
    };
    Some(format!("{} {}", mark, text))
}

/// Prints each state change once
#[derive(Debug, Default)]
pub struct StatusPrinter {
    color: bool,
    last: Option<ScanStatus>,
}

impl StatusPrinter {
    pub fn new(color: bool) -> Self {
        Self { color, last: None }
    }

    /// Print `status` unless it repeats the previous one. Returns true if printed.
    pub fn show(&mut self, status: &ScanStatus) -> bool {
        if self.last.as_ref() == Some(status) {
            return false;
        }
        self.last = Some(status.clone());
        match render(status, self.color) {
            Some(line) => {
                println!("{}", line);
                true
            }
            None => false,
        }
    }
}
