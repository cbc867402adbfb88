//! Application startup and the scan loop

use crate::app::cli::api::{Args, Command, FileConfig, RunConfig, ScanArgs};
use crate::app::display::{render, StatusPrinter};
use crate::app::error::AppError;
use crate::app::spinner::run_spinner;
use crate::core::error_handling::{describe_for_operator, log_error_with_context};
use crate::core::logging::{init_logging, level_for_verbosity, reconfigure_logging};
use crate::core::shutdown::{ShutdownCoordinator, INTERRUPTED_EXIT_CODE};
use crate::core::version::version_line;
use crate::decoder::api::{DecoderFailure, LineDecoder, SessionToken};
use crate::session::api::{
    spawn_controller, ScanController, ScanStatus, SessionError, SessionResult, SessionState,
};
use crate::verify::api::{VerificationClient, Verifier};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

pub const EXIT_CONFIRMED: i32 = 0;
pub const EXIT_REJECTED: i32 = 1;
pub const EXIT_FAILURE: i32 = 2;

/// Parse the command line, run the requested command and return the exit code
pub async fn startup() -> i32 {
    run(Args::parse()).await
}

pub async fn run(args: Args) -> i32 {
    let file = match FileConfig::load(args.config_file.as_deref()).await {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let command = args.command_or_default();
    let scan_args = match &command {
        Command::Scan(scan) => scan.clone(),
        Command::Verify(_) => ScanArgs::default(),
    };
    let config = match RunConfig::resolve(&args, &scan_args, &file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let color = config
        .color
        .unwrap_or_else(|| std::io::IsTerminal::is_terminal(&std::io::stdout()));
    colored::control::set_override(color);

    let log_file = config.log.file.as_deref().and_then(|p| p.to_str());
    if let Err(e) = init_logging(
        Some(&config.log.level),
        Some(&config.log.format),
        log_file,
        color,
    ) {
        let error = AppError::Logging {
            reason: e.to_string(),
        };
        eprintln!("Warning: {}", error);
    } else if args.verbosity() != 0 {
        let level = level_for_verbosity(&config.log.level, args.verbosity());
        if let Err(e) = reconfigure_logging(level) {
            eprintln!("Warning: could not apply log level '{}': {}", level, e);
        }
    }
    log::info!("Starting {}", version_line());
    log::debug!("Resolved configuration: {:?}", config);

    let client = match VerificationClient::new(&config.verify) {
        Ok(client) => client,
        Err(e) => {
            let error = AppError::from(e);
            log_error_with_context(&error, "Creating verification client");
            eprintln!("Error: {}", describe_for_operator(&error, "Creating verification client"));
            return EXIT_FAILURE;
        }
    };

    match command {
        Command::Verify(verify) => verify_once(&client, &verify.text, color).await,
        Command::Scan(_) => {
            ShutdownCoordinator::guard(|shutdown| scan(config, client, shutdown, color)).await
        }
    }
}

/// Verify one text without a scanner
async fn verify_once(client: &VerificationClient, text: &str, color: bool) -> i32 {
    if text.trim().is_empty() {
        eprintln!("Nothing to verify");
        return EXIT_FAILURE;
    }

    let report = client.verify(text).await;
    let state = if report.is_confirmed() {
        SessionState::Confirmed
    } else {
        SessionState::Rejected
    };
    let status = ScanStatus {
        state,
        verify_status: Some(report.outcome.into()),
        scanned: Some(text.to_string()),
        message: report.display_message(),
        ..ScanStatus::default()
    };
    if let Some(line) = render(&status, color) {
        println!("{}", line);
    }
    exit_code_for(&status)
}

/// Run sessions until an outcome (`--once`), end of input, or an interrupt
async fn scan(
    config: RunConfig,
    client: VerificationClient,
    mut shutdown: broadcast::Receiver<()>,
    color: bool,
) -> i32 {
    log::info!(
        "Scanning from {} and verifying against {}",
        config.input,
        config.verify.endpoint
    );

    let decoder = LineDecoder::new(config.input.clone());
    let controller = ScanController::new(Box::new(decoder), Arc::new(client), config.session);
    let handle = spawn_controller(controller);
    let spinner = tokio::spawn(run_spinner(handle.subscribe()));
    let mut status = handle.subscribe();
    let mut printer = StatusPrinter::new(color);
    let mut last_outcome: Option<i32> = None;

    let code = loop {
        let started = tokio::select! {
            started = handle.start() => started,
            _ = shutdown.recv() => break INTERRUPTED_EXIT_CODE,
        };
        let token = match started {
            Ok(token) => token,
            Err(e) => {
                if let Some(code) = input_closed_exit(&e, last_outcome) {
                    log::info!("Scanner input closed after the last session");
                    break code;
                }
                printer.show(&handle.status());
                log_error_with_context(&e, "Starting scan session");
                break EXIT_FAILURE;
            }
        };

        let settled = tokio::select! {
            settled = follow_session(&mut status, &mut printer, token) => settled,
            _ = shutdown.recv() => break INTERRUPTED_EXIT_CODE,
        };
        let settled = match settled {
            Ok(settled) => settled,
            Err(e) => {
                log_error_with_context(&e, "Following scan session");
                break EXIT_FAILURE;
            }
        };

        match settled.state {
            SessionState::Confirmed | SessionState::Rejected => {
                let code = exit_code_for(&settled);
                if config.once {
                    break code;
                }
                last_outcome = Some(code);
            }
            // End of input in continuous mode is the normal way out
            SessionState::Failed if !config.once => break last_outcome.unwrap_or(EXIT_FAILURE),
            _ => break EXIT_FAILURE,
        }
    };

    handle.shutdown().await;
    if let Err(e) = spinner.await {
        log::debug!("Spinner task ended abnormally: {}", e);
    }
    log::debug!("Scan loop finished with exit code {}", code);
    code
}

/// Print every state change of session `token` until it settles
async fn follow_session(
    status: &mut watch::Receiver<ScanStatus>,
    printer: &mut StatusPrinter,
    token: SessionToken,
) -> SessionResult<ScanStatus> {
    loop {
        let current = status.borrow_and_update().clone();
        let ours = current.session.map_or(true, |session| session >= token);
        if ours {
            printer.show(&current);
            if current.is_settled() {
                return Ok(current);
            }
        }
        status
            .changed()
            .await
            .map_err(|_| SessionError::DriverClosed)?;
    }
}

/// In continuous mode a closed input after an outcome ends the run with
/// that outcome's exit code
fn input_closed_exit(error: &SessionError, last_outcome: Option<i32>) -> Option<i32> {
    match error {
        SessionError::CameraUnavailable {
            reason: DecoderFailure::NoDevice,
            ..
        } => last_outcome,
        _ => None,
    }
}

pub fn exit_code_for(status: &ScanStatus) -> i32 {
    match status.state {
        SessionState::Confirmed => EXIT_CONFIRMED,
        SessionState::Rejected => EXIT_REJECTED,
        _ => EXIT_FAILURE,
    }
}
