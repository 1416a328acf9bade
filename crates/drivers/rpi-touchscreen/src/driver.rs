//! Probe, remove and shutdown of the DSI peripheral.

use alloc::string::ToString;
use alloc::sync::Arc;

use panel_drm::{
    BacklightDevice, DsiDriver, MipiDsiDevice, ProbeContext, mipi_dsi_attach, mipi_dsi_detach,
};
use panel_of::{I2cClientRef, OfDeviceId, OfNode};

use crate::TouchscreenError;
use crate::config::{COMPATIBLE, DRIVER_NAME, TouchscreenConfig};
use crate::panel::{BridgeHold, RpiTouchscreen};

pub const OF_MATCH: &[OfDeviceId] = &[OfDeviceId::new(COMPATIBLE)];

/// The touchscreen's DSI driver.
pub struct RpiTouchscreenDriver;

impl DsiDriver for RpiTouchscreenDriver {
    const NAME: &'static str = DRIVER_NAME;
    const OF_MATCH: &'static [OfDeviceId] = OF_MATCH;

    type Data = Arc<RpiTouchscreen>;
    type Error = TouchscreenError;

    fn probe(
        dsi: &mut MipiDsiDevice,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Arc<RpiTouchscreen>, TouchscreenError> {
        probe_with_config(dsi, ctx, TouchscreenConfig::default())
    }

    fn remove(
        dsi: &mut MipiDsiDevice,
        ts: &Arc<RpiTouchscreen>,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<(), TouchscreenError> {
        if let Err(e) = mipi_dsi_detach(ctx.host, dsi) {
            log::error!(
                "[RPI-TS] {}: failed to detach from DSI host: {}",
                ts.node_path(),
                e.errno()
            );
            return Err(e.into());
        }

        // The host link is gone; nothing below may stop the remove.
        if let Err(e) = ctx.panels.detach(ts.node_path()) {
            log::warn!("[RPI-TS] {}: panel detach failed: {}", ts.node_path(), e);
        }
        if let Err(e) = ctx.panels.remove(ts.node_path()) {
            log::warn!("[RPI-TS] {}: panel remove failed: {}", ts.node_path(), e);
        }

        // A controller may still hold the panel; the bridge goes now regardless.
        ts.release_bridge();
        log::info!("[RPI-TS] {}: removed", ts.node_path());
        Ok(())
    }

    fn shutdown(_dsi: &mut MipiDsiDevice, ts: &Arc<RpiTouchscreen>) {
        if let Err(e) = ts.power_off() {
            log::warn!("[RPI-TS] {}: power off failed: {}", ts.node_path(), e);
        }
    }
}

/// Probe with explicit link and sink parameters.
pub fn probe_with_config(
    dsi: &mut MipiDsiDevice,
    ctx: &mut ProbeContext<'_>,
    config: TouchscreenConfig,
) -> Result<Arc<RpiTouchscreen>, TouchscreenError> {
    dsi.mode_flags = config.mode_flags;
    dsi.format = config.format;
    dsi.lanes = config.lanes;

    let path = dsi.node().path().to_string();
    let client = find_bridge(ctx, dsi.node(), config.bridge_property)?;
    let (adapter_nr, addr) = (client.adapter_nr(), client.addr());
    let bridge = BridgeHold::new(client);
    let backlight = register_backlight(&bridge, &config)?;

    let ts = Arc::new(RpiTouchscreen::new(&path, bridge, backlight, config));

    // On failure `ts` drops here and releases the bridge.
    ctx.panels.add(&path, ts.clone())?;

    if let Err(e) = mipi_dsi_attach(ctx.host, dsi) {
        log::error!("[RPI-TS] {}: failed to attach to DSI host: {}", path, e);
        if let Err(e) = ctx.panels.remove(&path) {
            log::warn!("[RPI-TS] {}: failed to withdraw panel: {}", path, e);
        }
        ts.release_bridge();
        return Err(e.into());
    }

    log::info!(
        "[RPI-TS] {}: {} lane(s), bridge at i2c-{} {:#04x}",
        path,
        dsi.lanes,
        adapter_nr,
        addr
    );
    Ok(ts)
}

/// Resolve the bridge chip's I2C client through the panel node.
fn find_bridge(
    ctx: &ProbeContext<'_>,
    node: &OfNode,
    property: &str,
) -> Result<I2cClientRef, TouchscreenError> {
    let Some(bridge_node) = ctx.tree.parse_phandle(node, property, 0) else {
        log::error!("[RPI-TS] {}: missing {} reference", node.path(), property);
        return Err(TouchscreenError::NoBridge);
    };

    ctx.i2c.find_by_node(bridge_node).ok_or_else(|| {
        log::debug!(
            "[RPI-TS] {}: bridge {} not instantiated yet, deferring",
            node.path(),
            bridge_node.path()
        );
        TouchscreenError::ProbeDefer
    })
}

#[cfg(feature = "backlight")]
fn register_backlight(
    bridge: &BridgeHold,
    config: &TouchscreenConfig,
) -> Result<Option<BacklightDevice>, TouchscreenError> {
    use alloc::boxed::Box;

    use crate::config::BACKLIGHT_NAME;
    use crate::panel::TouchscreenBacklight;

    let ops = Box::new(TouchscreenBacklight::new(bridge.clone()));
    match BacklightDevice::register(BACKLIGHT_NAME, config.max_brightness, ops) {
        Ok(backlight) => Ok(Some(backlight)),
        Err(e) => {
            log::error!("[RPI-TS] failed to register backlight: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(not(feature = "backlight"))]
fn register_backlight(
    _bridge: &BridgeHold,
    _config: &TouchscreenConfig,
) -> Result<Option<BacklightDevice>, TouchscreenError> {
    Ok(None)
}
