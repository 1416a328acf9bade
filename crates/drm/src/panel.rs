//! Panel callbacks and the registry display controllers find panels in.
//!
//! A panel driver registers its callbacks under the path of its device node.
//! The display controller owning the other end of the link looks the panel up
//! by that path, attaches it to its connector and then drives the power
//! sequence:
//!
//! ```text
//! prepare -> enable -> (scanning out) -> disable -> unprepare
//! ```

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::DrmError;
use crate::connector::{Connector, DrmDevice};

/// Callbacks a panel driver provides.
///
/// Every power callback must be idempotent: the framework may repeat a call
/// and expects success without side effects.
pub trait PanelFuncs: Send + Sync {
    /// Power the panel up. The video link is not running yet.
    fn prepare(&self) -> Result<(), DrmError> {
        Ok(())
    }

    /// Turn the image on. The video link is running.
    fn enable(&self) -> Result<(), DrmError> {
        Ok(())
    }

    /// Turn the image off while the video link still runs.
    fn disable(&self) -> Result<(), DrmError> {
        Ok(())
    }

    /// Power the panel down.
    fn unprepare(&self) -> Result<(), DrmError> {
        Ok(())
    }

    /// Add the panel's modes to `connector`, returning how many were added.
    fn get_modes(&self, drm: &dyn DrmDevice, connector: &mut Connector) -> usize;
}

/// Shared reference to a registered panel.
pub type PanelHandle = Arc<dyn PanelFuncs>;

struct PanelEntry {
    node_path: String,
    funcs: PanelHandle,
    attached: bool,
}

/// Registered panels keyed by device node path.
pub struct PanelRegistry {
    panels: Mutex<Vec<PanelEntry>>,
}

impl Default for PanelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelRegistry {
    pub const fn new() -> Self {
        Self {
            panels: Mutex::new(Vec::new()),
        }
    }

    /// Publish a panel.
    pub fn add(&self, node_path: &str, funcs: PanelHandle) -> Result<(), DrmError> {
        let mut panels = self.panels.lock();
        if panels.iter().any(|p| p.node_path == node_path) {
            log::warn!("[PANEL] {}: already registered", node_path);
            return Err(DrmError::Busy);
        }
        panels.push(PanelEntry {
            node_path: node_path.to_string(),
            funcs,
            attached: false,
        });
        log::debug!("[PANEL] {}: added", node_path);
        Ok(())
    }

    /// Withdraw a panel, returning its callbacks.
    pub fn remove(&self, node_path: &str) -> Result<PanelHandle, DrmError> {
        let mut panels = self.panels.lock();
        let idx = panels
            .iter()
            .position(|p| p.node_path == node_path)
            .ok_or(DrmError::NotFound)?;
        let entry = panels.remove(idx);
        if entry.attached {
            log::warn!("[PANEL] {}: removed while attached", node_path);
        }
        log::debug!("[PANEL] {}: removed", node_path);
        Ok(entry.funcs)
    }

    /// Look up the panel registered for a device node.
    pub fn find(&self, node_path: &str) -> Option<PanelHandle> {
        self.panels
            .lock()
            .iter()
            .find(|p| p.node_path == node_path)
            .map(|p| Arc::clone(&p.funcs))
    }

    /// Bind the panel to a connector. A panel drives at most one connector.
    pub fn attach(&self, node_path: &str) -> Result<PanelHandle, DrmError> {
        let mut panels = self.panels.lock();
        let entry = panels
            .iter_mut()
            .find(|p| p.node_path == node_path)
            .ok_or(DrmError::NotFound)?;
        if entry.attached {
            return Err(DrmError::Busy);
        }
        entry.attached = true;
        Ok(Arc::clone(&entry.funcs))
    }

    /// Release the panel from its connector. Detaching twice is harmless.
    pub fn detach(&self, node_path: &str) -> Result<(), DrmError> {
        let mut panels = self.panels.lock();
        let entry = panels
            .iter_mut()
            .find(|p| p.node_path == node_path)
            .ok_or(DrmError::NotFound)?;
        entry.attached = false;
        Ok(())
    }

    pub fn is_attached(&self, node_path: &str) -> bool {
        self.panels
            .lock()
            .iter()
            .any(|p| p.node_path == node_path && p.attached)
    }

    pub fn len(&self) -> usize {
        self.panels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::SimpleDrmDevice;
    use crate::mode::DisplayMode;

    struct FixedPanel;

    impl PanelFuncs for FixedPanel {
        fn get_modes(&self, drm: &dyn DrmDevice, connector: &mut Connector) -> usize {
            match drm.duplicate_mode(&DisplayMode::new(25_175, 640, 480)) {
                Some(mode) => {
                    connector.probed_add(mode);
                    1
                }
                None => 0,
            }
        }
    }

    const PATH: &str = "/soc/dsi@7e700000/panel@0";

    #[test]
    fn test_add_find_remove() {
        let registry = PanelRegistry::new();
        assert!(registry.find(PATH).is_none());

        registry.add(PATH, Arc::new(FixedPanel)).expect("Add failed");
        assert_eq!(registry.len(), 1);

        let panel = registry.find(PATH).expect("Panel missing");
        let mut connector = Connector::new();
        assert_eq!(panel.get_modes(&SimpleDrmDevice, &mut connector), 1);
        // Default callbacks succeed
        assert!(panel.prepare().is_ok());
        assert!(panel.unprepare().is_ok());

        assert!(registry.remove(PATH).is_ok());
        assert!(registry.is_empty());
        assert_eq!(registry.remove(PATH).err(), Some(DrmError::NotFound));
    }

    #[test]
    fn test_duplicate_add_is_busy() {
        let registry = PanelRegistry::new();
        registry.add(PATH, Arc::new(FixedPanel)).expect("Add failed");
        assert_eq!(
            registry.add(PATH, Arc::new(FixedPanel)),
            Err(DrmError::Busy)
        );
    }

    #[test]
    fn test_attach_detach() {
        let registry = PanelRegistry::new();
        assert_eq!(registry.attach(PATH).err(), Some(DrmError::NotFound));

        registry.add(PATH, Arc::new(FixedPanel)).expect("Add failed");
        assert!(registry.attach(PATH).is_ok());
        assert!(registry.is_attached(PATH));
        assert_eq!(registry.attach(PATH).err(), Some(DrmError::Busy));

        registry.detach(PATH).expect("Detach failed");
        assert!(!registry.is_attached(PATH));
        registry.detach(PATH).expect("Second detach failed");
        assert!(registry.attach(PATH).is_ok());
    }
}
