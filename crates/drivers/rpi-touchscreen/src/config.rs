//! Panel constants and probe-time configuration.

use panel_drm::{DisplayMode, DsiModeFlags, DsiPixelFormat};

/// Driver name, also used as the log tag.
pub const DRIVER_NAME: &str = "raspberrypi-touchscreen";

/// Compatible string of the panel node.
pub const COMPATIBLE: &str = "raspberrypi,touchscreen";

/// Property of the panel node pointing at the bridge chip's I2C node.
pub const BRIDGE_PROPERTY: &str = "raspberrypi,touchscreen-bridge";

pub const BACKLIGHT_NAME: &str = "raspberrypi-touchscreen-backlight";

pub const MAX_BRIGHTNESS: u32 = 255;

/// The panel's only mode.
///
/// Assumes the DSI PLL runs at 2 GHz / 3 (only integer dividers are
/// available), giving a pixel clock of 2 GHz / 3 / 8.
pub const RPI_TOUCHSCREEN_MODES: [DisplayMode; 1] = [DisplayMode::new(83_333, 800, 480)
    .hsync(61, 2, 44)
    .vsync(7, 2, 21)
    .with_vrefresh(60)];

/// Link and sink parameters applied at probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchscreenConfig {
    /// DSI data lanes.
    pub lanes: u32,
    pub format: DsiPixelFormat,
    pub mode_flags: DsiModeFlags,
    /// Phandle property naming the bridge chip.
    pub bridge_property: &'static str,
    /// Bits per color channel reported to the connector.
    pub bpc: u8,
    pub width_mm: u32,
    pub height_mm: u32,
    pub max_brightness: u32,
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            lanes: 1,
            format: DsiPixelFormat::Rgb888,
            mode_flags: DsiModeFlags::VIDEO | DsiModeFlags::VIDEO_SYNC_PULSE,
            bridge_property: BRIDGE_PROPERTY,
            bpc: 8,
            // Nominal active area; the panel cannot report it.
            width_mm: 217,
            height_mm: 136,
            max_brightness: MAX_BRIGHTNESS,
        }
    }
}
