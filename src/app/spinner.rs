//! Progress spinner shown while a verification is pending

use crate::session::api::{ScanStatus, SessionState};
use std::io::Write;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Only on a terminal, and only when logs are not already chatty
pub fn should_show_spinner() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr()) && !log::log_enabled!(log::Level::Info)
}

pub struct ProgressSpinner {
    frame_index: usize,
    visible: bool,
}

impl ProgressSpinner {
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            visible: false,
        }
    }

    pub fn tick(&mut self) {
        let frame = BRAILLE_FRAMES[self.frame_index];
        self.frame_index = (self.frame_index + 1) % BRAILLE_FRAMES.len();
        self.visible = true;

        eprint!("\r{frame}");
        let _ = std::io::stderr().flush();
    }

    pub fn finish(&mut self) {
        if self.visible {
            eprint!("\r \r");
            let _ = std::io::stderr().flush();
            self.visible = false;
        }
    }
}

impl Default for ProgressSpinner {
    fn default() -> Self {
        Self::new()
    }
}

/// Animate while the controller is verifying; returns when the controller is gone
pub async fn run_spinner(mut status: watch::Receiver<ScanStatus>) {
    if !should_show_spinner() {
        return;
    }

    let mut spinner = ProgressSpinner::new();
    let mut update_interval = interval(Duration::from_millis(100));
    let mut verifying = status.borrow_and_update().state == SessionState::Verifying;

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                verifying = status.borrow_and_update().state == SessionState::Verifying;
                if !verifying {
                    spinner.finish();
                }
            }

            _ = update_interval.tick() => {
                if verifying {
                    spinner.tick();
                }
            }
        }
    }
    spinner.finish();
}
