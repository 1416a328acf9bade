//! MIPI DSI peripherals.
//!
//! A DSI peripheral is described by a child node of its host controller; the
//! node's `reg` is the virtual channel. The peripheral driver fills in lane
//! count, pixel format and mode flags during probe and then attaches to the
//! host, which only starts the link once it knows that configuration.

use bitflags::bitflags;

use panel_of::{DeviceTree, I2cClientRegistry, OfDeviceId, OfError, OfNode, match_device};

use crate::DrmError;
use crate::panel::PanelRegistry;

/// Highest virtual channel a DSI link carries.
pub const DSI_MAX_CHANNEL: u32 = 3;

/// Data lanes a DSI link can have.
pub const DSI_MAX_LANES: u32 = 4;

bitflags! {
    /// Link operating mode requested by the peripheral.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DsiModeFlags: u32 {
        /// Video mode rather than command mode.
        const VIDEO = 1 << 0;
        /// Burst mode.
        const VIDEO_BURST = 1 << 1;
        /// Non-burst with sync pulses.
        const VIDEO_SYNC_PULSE = 1 << 2;
        /// Auto vertical count mode.
        const VIDEO_AUTO_VERT = 1 << 3;
        /// Hsync-end packets.
        const VIDEO_HSE = 1 << 4;
        const VIDEO_NO_HFP = 1 << 5;
        const VIDEO_NO_HBP = 1 << 6;
        const VIDEO_NO_HSA = 1 << 7;
        /// Flush display FIFO on vsync pulse.
        const VSYNC_FLUSH = 1 << 8;
        /// Disable EoT packets in HS mode.
        const NO_EOT_PACKET = 1 << 9;
        /// Clock lane may stop between transfers.
        const CLOCK_NON_CONTINUOUS = 1 << 10;
        /// Transmit commands in low power mode.
        const MODE_LPM = 1 << 11;
    }
}

/// Pixel format on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DsiPixelFormat {
    #[default]
    Rgb888,
    /// 18 bits loosely packed into 24.
    Rgb666,
    Rgb666Packed,
    Rgb565,
}

impl DsiPixelFormat {
    /// Bits each pixel occupies on the link.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Rgb888 | Self::Rgb666 => 24,
            Self::Rgb666Packed => 18,
            Self::Rgb565 => 16,
        }
    }
}

/// A peripheral on a DSI link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipiDsiDevice {
    node: OfNode,
    pub channel: u32,
    pub lanes: u32,
    pub format: DsiPixelFormat,
    pub mode_flags: DsiModeFlags,
}

impl MipiDsiDevice {
    /// Instantiate the peripheral described by a child node of the host.
    ///
    /// Lanes start at zero: the driver must configure them before attaching.
    pub fn from_node(node: &OfNode) -> Result<Self, DrmError> {
        let channel = node.reg_address().ok_or(OfError::InvalidAddress)?;
        if channel > DSI_MAX_CHANNEL {
            log::warn!("[DSI] {}: invalid virtual channel {}", node.path(), channel);
            return Err(DrmError::InvalidArgument);
        }
        Ok(Self {
            node: node.clone(),
            channel,
            lanes: 0,
            format: DsiPixelFormat::default(),
            mode_flags: DsiModeFlags::empty(),
        })
    }

    pub fn node(&self) -> &OfNode {
        &self.node
    }

    /// Configuration is complete enough for a host to drive.
    pub fn validate(&self) -> Result<(), DrmError> {
        if self.lanes == 0 || self.lanes > DSI_MAX_LANES {
            return Err(DrmError::InvalidArgument);
        }
        Ok(())
    }
}

/// The host controller side of a DSI link.
pub trait DsiHost {
    fn attach(&mut self, dsi: &MipiDsiDevice) -> Result<(), DrmError>;
    fn detach(&mut self, dsi: &MipiDsiDevice) -> Result<(), DrmError>;
}

/// Attach a configured peripheral to its host.
pub fn mipi_dsi_attach(host: &mut dyn DsiHost, dsi: &MipiDsiDevice) -> Result<(), DrmError> {
    if let Err(e) = dsi.validate() {
        log::error!(
            "[DSI] {}: invalid configuration ({} lanes)",
            dsi.node.path(),
            dsi.lanes
        );
        return Err(e);
    }
    host.attach(dsi)
}

pub fn mipi_dsi_detach(host: &mut dyn DsiHost, dsi: &MipiDsiDevice) -> Result<(), DrmError> {
    host.detach(dsi)
}

/// Framework services handed to DSI drivers.
pub struct ProbeContext<'a> {
    pub tree: &'a DeviceTree,
    pub i2c: &'a I2cClientRegistry,
    pub panels: &'a PanelRegistry,
    pub host: &'a mut dyn DsiHost,
}

/// A driver for DSI peripherals.
pub trait DsiDriver {
    /// Driver name for logs.
    const NAME: &'static str;
    /// Compatible strings the driver binds to.
    const OF_MATCH: &'static [OfDeviceId];

    /// Per-device driver state.
    type Data;
    type Error: From<DrmError> + core::fmt::Display;

    fn probe(dsi: &mut MipiDsiDevice, ctx: &mut ProbeContext<'_>)
    -> Result<Self::Data, Self::Error>;

    /// Tear the device down. On error the device stays bound.
    fn remove(
        dsi: &mut MipiDsiDevice,
        data: &Self::Data,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<(), Self::Error>;

    /// System is going down.
    fn shutdown(_dsi: &mut MipiDsiDevice, _data: &Self::Data) {}
}

/// A device bound to driver `D`.
pub struct DsiDriverBinding<D: DsiDriver> {
    dsi: MipiDsiDevice,
    data: Option<D::Data>,
}

impl<D: DsiDriver> DsiDriverBinding<D> {
    /// Probe `D` on `dsi` if the node matches its table.
    pub fn bind(mut dsi: MipiDsiDevice, ctx: &mut ProbeContext<'_>) -> Result<Self, D::Error> {
        if match_device(D::OF_MATCH, &dsi.node).is_none() {
            return Err(DrmError::NotFound.into());
        }

        log::debug!("[DSI] {}: probing {}", dsi.node.path(), D::NAME);
        match D::probe(&mut dsi, ctx) {
            Ok(data) => {
                log::info!("[DSI] {}: bound to {}", dsi.node.path(), D::NAME);
                Ok(Self {
                    dsi,
                    data: Some(data),
                })
            }
            Err(e) => {
                log::warn!("[DSI] {}: {} probe failed: {}", dsi.node.path(), D::NAME, e);
                Err(e)
            }
        }
    }

    pub fn device(&self) -> &MipiDsiDevice {
        &self.dsi
    }

    pub fn data(&self) -> Option<&D::Data> {
        self.data.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    /// Remove the driver. Unbinding an unbound device does nothing.
    pub fn unbind(&mut self, ctx: &mut ProbeContext<'_>) -> Result<(), D::Error> {
        let Some(data) = self.data.as_ref() else {
            return Ok(());
        };
        D::remove(&mut self.dsi, data, ctx)?;
        self.data = None;
        log::info!("[DSI] {}: unbound from {}", self.dsi.node.path(), D::NAME);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if let Some(data) = self.data.as_ref() {
            D::shutdown(&mut self.dsi, data);
        }
    }
}
