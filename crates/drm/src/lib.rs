//! # panel_drm
//!
//! The slice of the display framework a panel driver binds to:
//! - display modes and the connector they are probed onto,
//! - the panel callbacks and the registry display controllers look panels up in,
//! - MIPI DSI peripheral configuration, host attach and driver binding,
//! - the backlight class.

#![no_std]

extern crate alloc;

pub mod backlight;
pub mod connector;
pub mod dsi;
pub mod mode;
pub mod panel;

pub use backlight::{BacklightDevice, BacklightOps, BacklightProperties, BacklightState, BlankMode};
pub use connector::{Connector, DisplayInfo, DrmDevice, SimpleDrmDevice};
pub use dsi::{
    DsiDriver, DsiDriverBinding, DsiHost, DsiModeFlags, DsiPixelFormat, MipiDsiDevice,
    ProbeContext, mipi_dsi_attach, mipi_dsi_detach,
};
pub use mode::{DisplayMode, ModeType};
pub use panel::{PanelFuncs, PanelHandle, PanelRegistry};

use panel_error::define_driver_error;
use panel_of::OfError;

define_driver_error! {
    /// Errors raised by the display framework.
    pub enum DrmError(0x02) {
        /// Object already registered or attached
        Busy = 0x01 [EBUSY] => "Resource busy",
        /// No object registered for the device
        NotFound = 0x02 [ENODEV] => "No such device",
        /// Configuration rejected
        InvalidArgument = 0x03 [EINVAL] => "Invalid argument",
        /// Allocation failed
        NoMemory = 0x04 [ENOMEM] => "Out of memory",
        /// Device tree lookup failed
        Of(OfError) = 0x05 => "Device tree lookup failed",
    }
}

impl From<OfError> for DrmError {
    fn from(e: OfError) -> Self {
        Self::Of(e)
    }
}
