//! Connector state a panel fills in when asked for its modes.

use alloc::vec::Vec;

use crate::mode::{DisplayMode, ModeType};

/// Sink properties reported alongside the modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Bits per color channel.
    pub bpc: u8,
    pub width_mm: u32,
    pub height_mm: u32,
}

/// The output a panel is attached to.
#[derive(Debug, Default)]
pub struct Connector {
    probed_modes: Vec<DisplayMode>,
    pub display_info: DisplayInfo,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mode to the probed list.
    pub fn probed_add(&mut self, mode: DisplayMode) {
        self.probed_modes.push(mode);
    }

    pub fn probed_modes(&self) -> &[DisplayMode] {
        &self.probed_modes
    }

    /// First mode flagged as preferred.
    pub fn preferred_mode(&self) -> Option<&DisplayMode> {
        self.probed_modes
            .iter()
            .find(|m| m.mode_type.contains(ModeType::PREFERRED))
    }

    pub fn clear_modes(&mut self) {
        self.probed_modes.clear();
    }
}

/// The display device modes are allocated against.
pub trait DrmDevice {
    /// Copy a mode for the probed list. `None` when allocation fails.
    fn duplicate_mode(&self, mode: &DisplayMode) -> Option<DisplayMode>;
}

/// Device whose allocations always succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleDrmDevice;

impl DrmDevice for SimpleDrmDevice {
    fn duplicate_mode(&self, mode: &DisplayMode) -> Option<DisplayMode> {
        Some(*mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_mode() {
        let mut connector = Connector::new();
        assert!(connector.preferred_mode().is_none());

        let mut a = DisplayMode::new(25_175, 640, 480);
        a.mode_type = ModeType::DRIVER;
        let mut b = DisplayMode::new(83_333, 800, 480);
        b.mode_type = ModeType::DRIVER | ModeType::PREFERRED;

        connector.probed_add(a);
        connector.probed_add(b);
        assert_eq!(connector.probed_modes().len(), 2);
        assert_eq!(connector.preferred_mode().map(|m| m.hdisplay), Some(800));

        connector.clear_modes();
        assert!(connector.probed_modes().is_empty());
    }

    #[test]
    fn test_simple_device_duplicates() {
        let mode = DisplayMode::new(83_333, 800, 480);
        assert_eq!(SimpleDrmDevice.duplicate_mode(&mode), Some(mode));
    }
}
