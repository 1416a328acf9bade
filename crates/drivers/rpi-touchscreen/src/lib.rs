//! Raspberry Pi 7" touchscreen panel driver.
//!
//! The 7" touchscreen consists of a DPI LCD panel, a Toshiba TC358762XBG
//! DSI-DPI bridge, and an I2C-connected Atmel ATTINY88-MUR controlling power
//! management, the LCD PWM, and the touchscreen.
//!
//! This driver presents the device as a MIPI DSI panel to the display
//! framework. The ATTINY88 is located through the panel node's
//! `raspberrypi,touchscreen-bridge` phandle and held until the driver is
//! removed; it is not programmed yet, and the touchscreen is not exposed.

#![no_std]

extern crate alloc;

pub mod config;
pub mod driver;
pub mod panel;

pub use config::{RPI_TOUCHSCREEN_MODES, TouchscreenConfig};
pub use driver::{RpiTouchscreenDriver, probe_with_config};
pub use panel::{BridgeHold, PanelState, RpiTouchscreen, TouchscreenBacklight};

use panel_drm::DrmError;
use panel_error::define_driver_error;

define_driver_error! {
    /// Errors raised while binding the touchscreen.
    pub enum TouchscreenError(0x10) {
        /// Panel node lacks a usable bridge phandle
        NoBridge = 0x01 [ENODEV] => "Bridge chip reference missing",
        /// Bridge node exists but its I2C client is not instantiated yet
        ProbeDefer = 0x02 [EPROBE_DEFER] => "Bridge chip not available yet",
        /// A display framework call failed
        Drm(DrmError) = 0x03 => "Display framework call failed",
    }
}

impl From<DrmError> for TouchscreenError {
    fn from(e: DrmError) -> Self {
        Self::Drm(e)
    }
}
