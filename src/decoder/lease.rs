//! Scoped camera ownership
//!
//! A [`CameraLease`] wraps the handle returned by `start`. Every exit path
//! out of scanning calls [`CameraLease::release`], which issues `stop` then
//! `dispose` the first time and does nothing afterwards.

use crate::decoder::traits::DecoderAdapter;
use crate::decoder::types::{CameraHandle, SessionToken};

#[derive(Debug)]
pub struct CameraLease {
    handle: Option<CameraHandle>,
    token: SessionToken,
}

impl CameraLease {
    pub fn new(handle: CameraHandle) -> Self {
        Self {
            token: handle.token(),
            handle: Some(handle),
        }
    }

    /// Session the camera was acquired for
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    /// Stop and dispose the camera. Returns true only for the call that released it.
    pub fn release(&mut self, adapter: &mut dyn DecoderAdapter) -> bool {
        match self.handle.take() {
            Some(handle) => {
                log::debug!("Releasing {} via '{}'", handle, adapter.name());
                adapter.stop(&handle);
                adapter.dispose(handle);
                true
            }
            None => false,
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            log::error!("{} dropped without release", handle);
        }
    }
}
