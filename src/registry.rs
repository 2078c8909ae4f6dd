//! Holder for the single live overlay of an embedding page

use std::rc::Rc;

use tracing::info;

use crate::config::OverlayConfig;
use crate::host::Host;
use crate::runtime::{OverlayError, OverlayHandle};

/// Owns at most one overlay. Installing a new one destroys the previous.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    current: Option<OverlayHandle>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down the current overlay (if any) and keep `handle` instead.
    /// Returns whether something was torn down.
    pub fn replace(&mut self, handle: OverlayHandle) -> bool {
        let replaced = self.clear();
        self.current = Some(handle);
        replaced
    }

    /// Build a fresh overlay and make it current. An invalid config leaves
    /// the existing overlay in place.
    pub fn install(&mut self, config: Option<&OverlayConfig>, host: Rc<dyn Host>) -> Result<&OverlayHandle, OverlayError> {
        let handle = crate::init_overlay(config, host)?;
        if self.clear() {
            info!("replaced existing overlay");
        }
        Ok(self.current.insert(handle))
    }

    /// Reconfigure the current overlay, or install one if there is none
    pub fn install_or_update(
        &mut self,
        config: &OverlayConfig,
        host: Rc<dyn Host>,
    ) -> Result<&OverlayHandle, OverlayError> {
        let Some(handle) = self.current.take() else {
            return self.install(Some(config), host);
        };
        let result = handle.update_config(config);
        let handle = &*self.current.insert(handle);
        result.map(|()| handle)
    }

    pub fn current(&self) -> Option<&OverlayHandle> {
        self.current.as_ref()
    }

    /// Destroy and forget the current overlay. Returns whether one existed.
    pub fn clear(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                handle.destroy();
                true
            }
            None => false,
        }
    }
}
