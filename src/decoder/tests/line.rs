use crate::decoder::api::*;
use crate::decoder::line::failure_for_io;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

fn capture_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

fn unthrottled() -> ScanOptions {
    ScanOptions {
        scan_rate_hint_fps: 0,
        ..ScanOptions::default()
    }
}

async fn next_event(rx: &mut UnboundedReceiver<DecoderEvent>) -> DecoderEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("decoder event within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn test_emits_lines_with_session_token() {
    let file = capture_file("ABC123\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();

    let handle = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(3), tx),
            &unthrottled(),
        )
        .await
        .expect("start should succeed");

    assert_eq!(handle.token(), SessionToken::new(3));
    assert_eq!(decoder.attached_handle(), Some(handle.id()));

    let event = next_event(&mut rx).await;
    assert_eq!(event.token, SessionToken::new(3));
    assert_eq!(
        event.kind,
        DecoderEventKind::Decoded(DecodedPayload::new("ABC123"))
    );

    decoder.stop(&handle);
    decoder.dispose(handle);
    assert_eq!(decoder.attached_handle(), None);
}

async fn attach(
    decoder: &mut LineDecoder,
    token: u64,
    tx: &UnboundedSender<DecoderEvent>,
    options: &ScanOptions,
) -> CameraHandle {
    decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(token), tx.clone()),
            options,
        )
        .await
        .expect("start should succeed")
}

#[tokio::test]
async fn test_serves_one_code_per_attachment() {
    let file = capture_file("AAA\nBBB\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();

    let first = attach(&mut decoder, 1, &tx, &unthrottled()).await;
    let event = next_event(&mut rx).await;
    assert_eq!(event.token, SessionToken::new(1));
    assert_eq!(event.kind, DecoderEventKind::Decoded("AAA".into()));

    // Nothing more is read for a sink that already has its code
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
    decoder.dispose(first);

    let second = attach(&mut decoder, 2, &tx, &unthrottled()).await;
    let event = next_event(&mut rx).await;
    assert_eq!(event.token, SessionToken::new(2));
    assert_eq!(event.kind, DecoderEventKind::Decoded("BBB".into()));
    decoder.dispose(second);

    let third = attach(&mut decoder, 3, &tx, &unthrottled()).await;
    let event = next_event(&mut rx).await;
    assert_eq!(event.token, SessionToken::new(3));
    assert_eq!(event.kind, DecoderEventKind::Failed(DecoderFailure::NoDevice));
    decoder.dispose(third);
}

#[tokio::test]
async fn test_skips_blank_and_repeated_lines() {
    let file = capture_file("\n  \nTICKET-1\nTICKET-1\n\nTICKET-2\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();

    let mut codes = Vec::new();
    for token in 1..=3 {
        let handle = attach(&mut decoder, token, &tx, &unthrottled()).await;
        codes.push(next_event(&mut rx).await.kind);
        decoder.dispose(handle);
    }

    assert_eq!(
        codes,
        vec![
            DecoderEventKind::Decoded("TICKET-1".into()),
            DecoderEventKind::Decoded("TICKET-2".into()),
            DecoderEventKind::Failed(DecoderFailure::NoDevice),
        ]
    );
}

#[tokio::test]
async fn test_keeps_scanned_text_apart_from_line_ending() {
    let file = capture_file("  TICKET 7  \r\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();

    let _handle = attach(&mut decoder, 1, &tx, &unthrottled()).await;

    assert_eq!(
        next_event(&mut rx).await.kind,
        DecoderEventKind::Decoded("  TICKET 7  ".into())
    );
}

#[tokio::test]
async fn test_throttled_code_goes_to_the_next_sink() {
    let file = capture_file("AAA\nBBB\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();
    // 2 fps: codes are at least 500 ms apart
    let throttled = ScanOptions {
        scan_rate_hint_fps: 2,
        ..ScanOptions::default()
    };

    let first = attach(&mut decoder, 1, &tx, &throttled).await;
    assert_eq!(next_event(&mut rx).await.token, SessionToken::new(1));
    decoder.dispose(first);

    // Detached while the next code waits out the scan interval
    let second = attach(&mut decoder, 2, &tx, &throttled).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    decoder.dispose(second);
    let _third = attach(&mut decoder, 3, &tx, &throttled).await;

    let event = next_event(&mut rx).await;
    assert_eq!(event.token, SessionToken::new(3));
    assert_eq!(event.kind, DecoderEventKind::Decoded("BBB".into()));
}

#[tokio::test]
async fn test_end_of_input_closes_device() {
    let file = capture_file("");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, mut rx) = unbounded_channel();

    let handle = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(1), tx.clone()),
            &unthrottled(),
        )
        .await
        .unwrap();

    let event = next_event(&mut rx).await;
    assert_eq!(event.kind, DecoderEventKind::Failed(DecoderFailure::NoDevice));
    decoder.dispose(handle);

    // Give the reader task a moment to finish after reporting
    tokio::time::sleep(Duration::from_millis(100)).await;

    let restart = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(2), tx),
            &unthrottled(),
        )
        .await;
    match restart {
        Err(DecoderError::CameraUnavailable { reason, .. }) => {
            assert_eq!(reason, DecoderFailure::NoDevice)
        }
        other => panic!("expected closed device, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_device_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut decoder = LineDecoder::new(LineSource::Path(dir.path().join("ttyACM9")));
    let (tx, _rx) = unbounded_channel();

    let result = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(1), tx),
            &ScanOptions::default(),
        )
        .await;

    match result {
        Err(DecoderError::CameraUnavailable { reason, detail }) => {
            assert_eq!(reason, DecoderFailure::NoDevice);
            assert!(detail.contains("ttyACM9"));
        }
        other => panic!("expected CameraUnavailable, got {:?}", other),
    }
    assert_eq!(decoder.attached_handle(), None);
}

#[tokio::test]
async fn test_second_start_while_attached_is_rejected() {
    let file = capture_file("");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, _rx) = unbounded_channel();

    // Rejected either as already attached or, once EOF was seen, as closed
    let handle = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(1), tx.clone()),
            &unthrottled(),
        )
        .await
        .unwrap();

    let second = decoder
        .start(
            &ScanTarget::Headless,
            DecoderSink::new(SessionToken::new(2), tx),
            &unthrottled(),
        )
        .await;
    assert!(second.is_err());

    decoder.dispose(handle);
}

#[tokio::test]
async fn test_stop_is_idempotent_and_ignores_foreign_handles() {
    let file = capture_file("A\n");
    let mut decoder = LineDecoder::new(LineSource::Path(file.path().to_path_buf()));
    let (tx, _rx) = unbounded_channel();

    let handle = decoder
        .start(
            &ScanTarget::Surface("preview".to_string()),
            DecoderSink::new(SessionToken::new(1), tx),
            &unthrottled(),
        )
        .await
        .unwrap();

    let foreign = CameraHandle::new(handle.id() + 100, SessionToken::new(1));
    decoder.stop(&foreign);
    assert_eq!(decoder.attached_handle(), Some(handle.id()));

    decoder.stop(&handle);
    decoder.stop(&handle);
    assert_eq!(decoder.attached_handle(), None);
    decoder.dispose(handle);
}

#[test]
fn test_io_errors_map_to_failures() {
    use std::io::{Error, ErrorKind};

    assert_eq!(
        failure_for_io(&Error::from(ErrorKind::NotFound)),
        DecoderFailure::NoDevice
    );
    assert_eq!(
        failure_for_io(&Error::from(ErrorKind::PermissionDenied)),
        DecoderFailure::Denied
    );
    assert_eq!(
        failure_for_io(&Error::from(ErrorKind::Interrupted)),
        DecoderFailure::Unknown
    );
}

#[test]
fn test_line_source_parsing() {
    assert_eq!(LineSource::parse("-"), LineSource::Stdin);
    assert_eq!(
        LineSource::parse("/dev/ttyACM0"),
        LineSource::Path("/dev/ttyACM0".into())
    );
    assert_eq!(LineSource::Stdin.to_string(), "stdin");
}
