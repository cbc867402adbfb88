//! Lifecycle Guard
//!
//! Admits the first decoded event of the current session and refuses all
//! others. [`LifecycleGuard::admit`] does the check and the write in one
//! synchronous call under `&mut self`; there is no await between them.

use crate::decoder::types::SessionToken;

/// Result of offering a decoded event to the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// This session already admitted its payload
    AlreadyAdmitted,
    /// The event belongs to an earlier session
    StaleSession,
    /// No session is open
    NoSession,
}

#[derive(Debug, Default)]
pub struct LifecycleGuard {
    current: Option<SessionToken>,
    admitted: bool,
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the guard for a new session, superseding any earlier one
    pub fn open(&mut self, token: SessionToken) {
        self.current = Some(token);
        self.admitted = false;
    }

    /// Refuse everything until the next `open`
    pub fn close(&mut self) {
        self.current = None;
        self.admitted = false;
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.current
    }

    pub fn is_admitted(&self) -> bool {
        self.admitted
    }

    pub fn admit(&mut self, token: SessionToken) -> Admission {
        match self.current {
            None => Admission::NoSession,
            Some(current) if current != token => Admission::StaleSession,
            Some(_) if self.admitted => Admission::AlreadyAdmitted,
            Some(_) => {
                self.admitted = true;
                Admission::Admitted
            }
        }
    }
}
