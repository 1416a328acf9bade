//! Shared fixture: the board device tree, an I2C core, a panel registry and a
//! DSI host that records what attaches to it.

#![allow(dead_code)]

use panel_drm::{
    DrmError, DsiDriverBinding, DsiHost, MipiDsiDevice, PanelRegistry, ProbeContext,
};
use panel_of::{DeviceTree, I2cClientRef, I2cClientRegistry};
use rpi_touchscreen::{RpiTouchscreenDriver, TouchscreenError};

// Compiled from data/rpi-touchscreen.dts
pub const DTB: &[u8] = include_bytes!("../data/rpi-touchscreen.dtb");

pub const I2C_ADAPTER: &str = "/soc/i2c@7e805000";
pub const BRIDGE: &str = "/soc/i2c@7e805000/bridge@45";
/// Wired to the bridge.
pub const PANEL: &str = "/soc/dsi@7e700000/panel@0";
/// No bridge property.
pub const PANEL_NO_BRIDGE: &str = "/soc/dsi@7e700000/panel@1";
/// Bridge phandle points nowhere.
pub const PANEL_DANGLING: &str = "/soc/dsi@7e700000/panel@2";
/// Bridge phandle points at the GPIO controller.
pub const PANEL_NOT_I2C: &str = "/soc/dsi@7e700000/panel@3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub channel: u32,
    pub lanes: u32,
}

#[derive(Default)]
pub struct RecordingHost {
    pub attached: Vec<Attachment>,
    pub fail_attach: bool,
    pub fail_detach: bool,
}

impl DsiHost for RecordingHost {
    fn attach(&mut self, dsi: &MipiDsiDevice) -> Result<(), DrmError> {
        if self.fail_attach {
            return Err(DrmError::Busy);
        }
        self.attached.push(Attachment {
            channel: dsi.channel,
            lanes: dsi.lanes,
        });
        Ok(())
    }

    fn detach(&mut self, dsi: &MipiDsiDevice) -> Result<(), DrmError> {
        if self.fail_detach {
            return Err(DrmError::Busy);
        }
        self.attached.retain(|a| a.channel != dsi.channel);
        Ok(())
    }
}

pub type Binding = DsiDriverBinding<RpiTouchscreenDriver>;

pub struct Fixture {
    pub tree: DeviceTree,
    pub i2c: I2cClientRegistry,
    pub panels: PanelRegistry,
    pub host: RecordingHost,
}

impl Fixture {
    /// Board with the I2C bus already scanned.
    pub fn new() -> Self {
        let fixture = Self::without_i2c_clients();
        fixture.scan_i2c();
        fixture
    }

    /// Board whose I2C adapter has not probed yet.
    pub fn without_i2c_clients() -> Self {
        Self {
            tree: DeviceTree::parse(DTB).expect("Invalid DTB"),
            i2c: I2cClientRegistry::new(),
            panels: PanelRegistry::new(),
            host: RecordingHost::default(),
        }
    }

    pub fn scan_i2c(&self) {
        let count = self
            .i2c
            .scan_bus(&self.tree, I2C_ADAPTER, 1)
            .expect("Scan failed");
        assert_eq!(count, 1);
    }

    pub fn dsi(&self, path: &str) -> MipiDsiDevice {
        let node = self.tree.find_node(path).expect("Node missing");
        MipiDsiDevice::from_node(node).expect("DSI device not created")
    }

    pub fn bind(&mut self, path: &str) -> Result<Binding, TouchscreenError> {
        let dsi = self.dsi(path);
        let mut ctx = ProbeContext {
            tree: &self.tree,
            i2c: &self.i2c,
            panels: &self.panels,
            host: &mut self.host,
        };
        Binding::bind(dsi, &mut ctx)
    }

    pub fn unbind(&mut self, binding: &mut Binding) -> Result<(), TouchscreenError> {
        let mut ctx = ProbeContext {
            tree: &self.tree,
            i2c: &self.i2c,
            panels: &self.panels,
            host: &mut self.host,
        };
        binding.unbind(&mut ctx)
    }

    /// A fresh reference to the bridge client; its count includes itself.
    pub fn bridge_ref(&self) -> I2cClientRef {
        let node = self.tree.find_node(BRIDGE).expect("Bridge node missing");
        self.i2c.find_by_node(node).expect("Bridge client missing")
    }
}
