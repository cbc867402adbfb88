//! Decoder data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// Opaque, monotonic identifier of one scan session
///
/// Allocated by the session controller on every `start` and stamped on
/// every event a decoder sink emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The token allocated after this one
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which camera to prefer when several are present
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Environment,
}

/// Options passed to the decoder on `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub preferred_camera: CameraFacing,
    /// Outline the region in which codes are searched
    pub highlight_region: bool,
    /// Upper bound on decode attempts per second; 0 means unthrottled
    pub scan_rate_hint_fps: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            preferred_camera: CameraFacing::Environment,
            highlight_region: true,
            scan_rate_hint_fps: 25,
        }
    }
}

impl ScanOptions {
    /// Minimum spacing between two decoded events, if throttled
    pub fn min_interval(&self) -> Option<Duration> {
        match self.scan_rate_hint_fps {
            0 => None,
            fps => Some(Duration::from_secs(1) / fps),
        }
    }
}

/// Where the decoder renders its preview
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanTarget {
    /// No preview surface
    #[default]
    Headless,
    /// A named preview surface owned by the presentation layer
    Surface(String),
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTarget::Headless => write!(f, "headless"),
            ScanTarget::Surface(name) => write!(f, "surface '{}'", name),
        }
    }
}

/// Why a decoder could not start or stopped producing codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum DecoderFailure {
    Denied,
    NoDevice,
    Unknown,
}

/// Text produced by the decoder for one detected code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    text: String,
}

impl DecodedPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for DecodedPayload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for DecodedPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEventKind {
    Decoded(DecodedPayload),
    Failed(DecoderFailure),
}

/// An event emitted by a decoder sink, tagged with its originating session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderEvent {
    pub token: SessionToken,
    pub kind: DecoderEventKind,
}

/// Live camera acquired by `start`
///
/// Not `Clone`: `dispose` consumes it, so a handle can be released only once.
#[derive(Debug, PartialEq, Eq)]
pub struct CameraHandle {
    id: u64,
    token: SessionToken,
}

impl CameraHandle {
    pub fn new(id: u64, token: SessionToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }
}

impl fmt::Display for CameraHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera {} (session {})", self.id, self.token)
    }
}
