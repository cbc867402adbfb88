//! Line-oriented scanner devices
//!
//! Keyboard-wedge and serial barcode/QR scanners do the decoding in
//! hardware and deliver one code per line. [`LineDecoder`] adapts such a
//! device (stdin, a tty, or a capture file) to [`DecoderAdapter`].
//!
//! The device is opened on the first `start` and stays open until the
//! decoder is dropped. A line is only read when a new sink attaches, and
//! each sink receives at most one code.

use crate::decoder::error::{DecoderError, DecoderResult};
use crate::decoder::traits::{DecoderAdapter, DecoderSink};
use crate::decoder::types::{CameraHandle, DecodedPayload, DecoderFailure, ScanOptions, ScanTarget};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Where scanned lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    Stdin,
    Path(PathBuf),
}

impl LineSource {
    /// `-` selects stdin, anything else is a path
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            LineSource::Stdin
        } else {
            LineSource::Path(PathBuf::from(value))
        }
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSource::Stdin => write!(f, "stdin"),
            LineSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
struct Attachment {
    handle_id: u64,
    sink: DecoderSink,
    min_interval: Option<Duration>,
}

struct LineDevice {
    attached: watch::Sender<Option<Attachment>>,
    reader: JoinHandle<()>,
}

/// Decoder adapter over a line-oriented scanner device
pub struct LineDecoder {
    source: LineSource,
    device: Option<LineDevice>,
    next_handle_id: u64,
}

impl LineDecoder {
    pub fn new(source: LineSource) -> Self {
        Self {
            source,
            device: None,
            next_handle_id: 0,
        }
    }

    pub fn source(&self) -> &LineSource {
        &self.source
    }

    /// Id of the handle whose sink is currently attached
    pub fn attached_handle(&self) -> Option<u64> {
        self.device
            .as_ref()
            .and_then(|d| d.attached.borrow().as_ref().map(|a| a.handle_id))
    }

    async fn open(&self) -> DecoderResult<LineReader> {
        match &self.source {
            LineSource::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
            LineSource::Path(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    DecoderError::unavailable(
                        failure_for_io(&e),
                        format!("cannot open {}: {}", path.display(), e),
                    )
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl fmt::Debug for LineDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineDecoder")
            .field("source", &self.source)
            .field("open", &self.device.is_some())
            .field("attached", &self.attached_handle())
            .finish()
    }
}

#[async_trait]
impl DecoderAdapter for LineDecoder {
    fn name(&self) -> &str {
        "line"
    }

    async fn start(
        &mut self,
        target: &ScanTarget,
        sink: DecoderSink,
        options: &ScanOptions,
    ) -> DecoderResult<CameraHandle> {
        if let Some(device) = &self.device {
            if device.reader.is_finished() {
                return Err(DecoderError::unavailable(
                    DecoderFailure::NoDevice,
                    format!("{} is closed", self.source),
                ));
            }
            if device.attached.borrow().is_some() {
                return Err(DecoderError::AlreadyActive {
                    adapter: self.name().to_string(),
                });
            }
        }

        if self.device.is_none() {
            let reader = self.open().await?;
            let (attached, attached_rx) = watch::channel(None);
            let reader = tokio::spawn(pump_lines(reader, attached_rx));
            log::debug!("Opened scanner input {}", self.source);
            self.device = Some(LineDevice { attached, reader });
        }

        log::debug!(
            "Line scanner ignores camera preference '{}' and highlight={} (target: {})",
            options.preferred_camera,
            options.highlight_region,
            target
        );

        self.next_handle_id += 1;
        let handle = CameraHandle::new(self.next_handle_id, sink.token());
        if let Some(device) = &self.device {
            device.attached.send_replace(Some(Attachment {
                handle_id: handle.id(),
                sink,
                min_interval: options.min_interval(),
            }));
        }

        Ok(handle)
    }

    fn stop(&mut self, handle: &CameraHandle) {
        if let Some(device) = &self.device {
            device.attached.send_if_modified(|current| match current {
                Some(attachment) if attachment.handle_id == handle.id() => {
                    *current = None;
                    true
                }
                _ => false,
            });
        }
    }

    fn dispose(&mut self, handle: CameraHandle) {
        self.stop(&handle);
        log::trace!("Disposed {}", handle);
    }
}

impl Drop for LineDecoder {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            device.reader.abort();
        }
    }
}

/// Map an open error onto the decoder failure taxonomy
pub fn failure_for_io(error: &io::Error) -> DecoderFailure {
    match error.kind() {
        io::ErrorKind::NotFound => DecoderFailure::NoDevice,
        io::ErrorKind::PermissionDenied => DecoderFailure::Denied,
        _ => DecoderFailure::Unknown,
    }
}

// Waits for a sink that has not been served a code yet
async fn wait_for_attachment(
    attached: &mut watch::Receiver<Option<Attachment>>,
    served: Option<u64>,
) -> Option<Attachment> {
    loop {
        let current = attached.borrow_and_update().clone();
        match current {
            Some(attachment) if Some(attachment.handle_id) != served => return Some(attachment),
            _ => {}
        }
        if attached.changed().await.is_err() {
            return None;
        }
    }
}

fn is_attached(attached: &watch::Receiver<Option<Attachment>>, handle_id: u64) -> bool {
    attached
        .borrow()
        .as_ref()
        .is_some_and(|a| a.handle_id == handle_id)
}

/// Next non-blank line that differs from the one before it in the stream
///
/// Only the line terminator is removed; the code is otherwise kept as read.
async fn next_code(
    lines: &mut Lines<LineReader>,
    previous: &mut Option<String>,
) -> io::Result<Option<String>> {
    while let Some(line) = lines.next_line().await? {
        let text = line.trim_end_matches(&['\r', '\n'][..]);
        if text.trim().is_empty() {
            continue;
        }
        if previous.as_deref() == Some(text) {
            log::trace!("Suppressing repeated code");
            continue;
        }
        *previous = Some(text.to_string());
        return Ok(Some(text.to_string()));
    }
    Ok(None)
}

// Each attachment is served at most one code, and nothing is read until a
// new sink attaches. A code read for a sink that detached before delivery
// is carried over to the next one. End of input is reported to the sink
// that asked for the next code.
async fn pump_lines(reader: LineReader, mut attached: watch::Receiver<Option<Attachment>>) {
    let mut lines = reader.lines();
    let mut previous: Option<String> = None;
    let mut carried: Option<String> = None;
    let mut served: Option<u64> = None;
    let mut last_emit_at: Option<Instant> = None;

    loop {
        let Some(attachment) = wait_for_attachment(&mut attached, served).await else {
            return;
        };

        let text = match carried.take() {
            Some(text) => text,
            None => match next_code(&mut lines, &mut previous).await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    log::debug!("Scanner input reached end of stream");
                    attachment.sink.failed(DecoderFailure::NoDevice);
                    return;
                }
                Err(e) => {
                    log::warn!("Scanner input read failed: {}", e);
                    attachment.sink.failed(DecoderFailure::Unknown);
                    return;
                }
            },
        };

        if let (Some(interval), Some(at)) = (attachment.min_interval, last_emit_at) {
            tokio::time::sleep_until(at + interval).await;
        }

        if !is_attached(&attached, attachment.handle_id) {
            log::trace!(
                "Handle {} detached before delivery; keeping code for the next sink",
                attachment.handle_id
            );
            carried = Some(text);
            continue;
        }

        attachment.sink.decoded(DecodedPayload::new(text));
        last_emit_at = Some(Instant::now());
        served = Some(attachment.handle_id);
    }
}
