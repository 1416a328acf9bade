//! Panel callbacks.
//!
//! The TC358762 runs in PLLOFF mode, clocked from the DSI byte clock instead
//! of an external reference. It can only be talked to once the DSI host is up
//! and transmitting, which is why power-on work belongs in `enable` rather
//! than `prepare`.

use alloc::string::{String, ToString};
use alloc::sync::Arc;

use panel_drm::{
    BacklightDevice, BacklightOps, BacklightProperties, BlankMode, Connector, DisplayInfo,
    DrmDevice, DrmError, ModeType, PanelFuncs,
};
use panel_of::I2cClientRef;
use spin::Mutex;

use crate::config::{RPI_TOUCHSCREEN_MODES, TouchscreenConfig};

/// Where the panel is in its power sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Unpowered: never prepared, or unprepared again.
    Off,
    Prepared,
    /// Showing an image.
    Enabled,
}

#[derive(Debug, Default, Clone, Copy)]
struct PowerFlags {
    prepared: bool,
    enabled: bool,
}

/// Hold on the bridge chip's I2C client, shared with the backlight hook.
///
/// Released at remove even if a display controller still has the panel.
#[derive(Debug, Clone)]
pub struct BridgeHold(Arc<Mutex<Option<I2cClientRef>>>);

impl BridgeHold {
    pub fn new(client: I2cClientRef) -> Self {
        Self(Arc::new(Mutex::new(Some(client))))
    }

    /// The client, unless already released.
    pub fn get(&self) -> Option<I2cClientRef> {
        self.0.lock().clone()
    }

    /// Drop the reference. Returns false if it was already gone.
    pub fn release(&self) -> bool {
        self.0.lock().take().is_some()
    }
}

/// One Raspberry Pi touchscreen.
pub struct RpiTouchscreen {
    node_path: String,
    config: TouchscreenConfig,
    /// Power-management chip on the sideband bus.
    bridge: BridgeHold,
    backlight: Option<BacklightDevice>,
    power: Mutex<PowerFlags>,
}

impl core::fmt::Debug for RpiTouchscreen {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RpiTouchscreen")
            .field("node_path", &self.node_path)
            .field("bridge", &self.bridge.get().map(|b| b.node_path().to_string()))
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RpiTouchscreen {
    pub fn new(
        node_path: &str,
        bridge: BridgeHold,
        backlight: Option<BacklightDevice>,
        config: TouchscreenConfig,
    ) -> Self {
        Self {
            node_path: node_path.to_string(),
            config,
            bridge,
            backlight,
            power: Mutex::new(PowerFlags::default()),
        }
    }

    pub fn node_path(&self) -> &str {
        &self.node_path
    }

    /// The bridge client, `None` once released by remove.
    pub fn bridge(&self) -> Option<I2cClientRef> {
        self.bridge.get()
    }

    /// Give up the bridge reference, including the backlight hook's.
    pub fn release_bridge(&self) -> bool {
        self.bridge.release()
    }

    pub fn backlight(&self) -> Option<&BacklightDevice> {
        self.backlight.as_ref()
    }

    pub fn config(&self) -> &TouchscreenConfig {
        &self.config
    }

    pub fn state(&self) -> PanelState {
        let power = *self.power.lock();
        if power.enabled {
            PanelState::Enabled
        } else if power.prepared {
            PanelState::Prepared
        } else {
            PanelState::Off
        }
    }

    /// Run the power-down half of the sequence.
    pub fn power_off(&self) -> Result<(), DrmError> {
        self.disable()?;
        self.unprepare()
    }
}

impl PanelFuncs for RpiTouchscreen {
    fn prepare(&self) -> Result<(), DrmError> {
        let mut power = self.power.lock();
        if power.prepared {
            return Ok(());
        }
        power.prepared = true;
        log::debug!("[RPI-TS] {}: prepared", self.node_path);
        Ok(())
    }

    fn enable(&self) -> Result<(), DrmError> {
        let mut power = self.power.lock();
        if power.enabled {
            return Ok(());
        }
        if let Some(backlight) = &self.backlight {
            backlight.set_power(BlankMode::Unblank)?;
        }
        power.enabled = true;
        log::debug!("[RPI-TS] {}: enabled", self.node_path);
        Ok(())
    }

    fn disable(&self) -> Result<(), DrmError> {
        let mut power = self.power.lock();
        if !power.enabled {
            return Ok(());
        }
        if let Some(backlight) = &self.backlight {
            backlight.set_power(BlankMode::Powerdown)?;
        }
        power.enabled = false;
        log::debug!("[RPI-TS] {}: disabled", self.node_path);
        Ok(())
    }

    fn unprepare(&self) -> Result<(), DrmError> {
        let mut power = self.power.lock();
        if !power.prepared {
            return Ok(());
        }
        power.prepared = false;
        log::debug!("[RPI-TS] {}: unprepared", self.node_path);
        Ok(())
    }

    fn get_modes(&self, drm: &dyn DrmDevice, connector: &mut Connector) -> usize {
        let mut num = 0;

        for (i, m) in RPI_TOUCHSCREEN_MODES.iter().enumerate() {
            let Some(mut mode) = drm.duplicate_mode(m) else {
                log::error!(
                    "[RPI-TS] failed to add mode {}x{}@{}",
                    m.hdisplay,
                    m.vdisplay,
                    m.vrefresh
                );
                continue;
            };

            mode.mode_type |= ModeType::DRIVER;
            if i == 0 {
                mode.mode_type |= ModeType::PREFERRED;
            }
            mode.set_name();

            connector.probed_add(mode);
            num += 1;
        }

        connector.display_info = DisplayInfo {
            bpc: self.config.bpc,
            width_mm: self.config.width_mm,
            height_mm: self.config.height_mm,
        };

        num
    }
}

/// Backlight hook for the touchscreen.
///
/// Brightness is computed but not yet written to the bridge chip.
pub struct TouchscreenBacklight {
    bridge: BridgeHold,
}

impl TouchscreenBacklight {
    pub fn new(bridge: BridgeHold) -> Self {
        Self { bridge }
    }
}

impl BacklightOps for TouchscreenBacklight {
    fn update_status(&self, props: &BacklightProperties) -> Result<(), DrmError> {
        let brightness = props.effective_brightness();
        let Some(bridge) = self.bridge.get() else {
            log::debug!(
                "[RPI-TS] backlight: bridge released, ignoring brightness {}",
                brightness
            );
            return Ok(());
        };
        log::trace!(
            "[RPI-TS] backlight via i2c-{} {:#04x}: brightness {}",
            bridge.adapter_nr(),
            bridge.addr(),
            brightness
        );
        Ok(())
    }
}
