//! Error handling shared by every subsystem
//!
//! Errors are split into two groups: those the operator can act on (bad
//! configuration, camera permission) and system failures (network, I/O).
//! The first group is reported with its own message, the second with the
//! context of the operation that failed and details at debug level.

/// Trait for errors that can distinguish between operator-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`. When it returns `false`, `user_message()` returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the operator can act on
    ///
    /// Operator-actionable examples:
    /// - Invalid endpoint or timeout in the configuration
    /// - Camera permission denied
    ///
    /// System examples:
    /// - Network failures while verifying
    /// - Scanner device read errors
    fn is_user_actionable(&self) -> bool;

    /// The operator-facing message, present only for actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log an error with a level of detail based on who can act on it
///
/// Actionable errors log their own message; system errors log the
/// operation context. Full detail is always available at debug level.
///
/// # Examples
/// ```rust,no_run
/// # use ticketscan::core::error_handling::log_error_with_context;
/// # use ticketscan::core::validation::ValidationError;
/// let err = ValidationError::new("Endpoint 'localhost' must start with http:// or https://");
/// log_error_with_context(&err, "Loading configuration");
/// // Logs: "FATAL: Endpoint 'localhost' must start with http:// or https://"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Operator-facing text for an error: its own message when actionable,
/// otherwise the operation context followed by the error.
pub fn describe_for_operator<E: ContextualError + std::fmt::Display>(
    error: &E,
    operation_context: &str,
) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => user_msg.to_string(),
        _ => format!("{}: {}", operation_context, error),
    }
}
