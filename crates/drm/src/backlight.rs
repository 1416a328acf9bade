//! Backlight class.
//!
//! A backlight device owns its properties; the driver only supplies the hook
//! that pushes a new state to hardware.

use alloc::boxed::Box;
use alloc::string::{String, ToString};

use bitflags::bitflags;
use spin::Mutex;

use crate::DrmError;

/// Framebuffer blanking level requested for the backlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankMode {
    #[default]
    Unblank,
    Normal,
    VsyncSuspend,
    HsyncSuspend,
    Powerdown,
}

bitflags! {
    /// Core state bits maintained by the backlight class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BacklightState: u32 {
        const SUSPENDED = 1 << 0;
        const FBBLANK = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BacklightProperties {
    pub brightness: u32,
    pub max_brightness: u32,
    pub power: BlankMode,
    pub state: BacklightState,
}

impl BacklightProperties {
    /// Brightness the hardware should show: zero while blanked or suspended.
    pub fn effective_brightness(&self) -> u32 {
        if self.power != BlankMode::Unblank
            || self
                .state
                .intersects(BacklightState::SUSPENDED | BacklightState::FBBLANK)
        {
            return 0;
        }
        self.brightness
    }
}

/// Driver hook applying a new state.
pub trait BacklightOps: Send + Sync {
    fn update_status(&self, props: &BacklightProperties) -> Result<(), DrmError>;
}

/// A registered backlight.
pub struct BacklightDevice {
    name: String,
    props: Mutex<BacklightProperties>,
    ops: Box<dyn BacklightOps>,
}

impl core::fmt::Debug for BacklightDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BacklightDevice")
            .field("name", &self.name)
            .field("props", &*self.props.lock())
            .finish_non_exhaustive()
    }
}

impl BacklightDevice {
    /// Register a backlight starting unblanked at full brightness.
    pub fn register(
        name: &str,
        max_brightness: u32,
        ops: Box<dyn BacklightOps>,
    ) -> Result<Self, DrmError> {
        if name.is_empty() {
            return Err(DrmError::InvalidArgument);
        }
        log::debug!("[BACKLIGHT] {}: registered, max {}", name, max_brightness);
        Ok(Self {
            name: name.to_string(),
            props: Mutex::new(BacklightProperties {
                brightness: max_brightness,
                max_brightness,
                power: BlankMode::Unblank,
                state: BacklightState::empty(),
            }),
            ops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> BacklightProperties {
        *self.props.lock()
    }

    /// Push the current properties to hardware.
    pub fn update_status(&self) -> Result<(), DrmError> {
        let props = *self.props.lock();
        self.ops.update_status(&props)
    }

    pub fn set_power(&self, power: BlankMode) -> Result<(), DrmError> {
        self.props.lock().power = power;
        self.update_status()
    }

    pub fn set_brightness(&self, brightness: u32) -> Result<(), DrmError> {
        {
            let mut props = self.props.lock();
            if brightness > props.max_brightness {
                return Err(DrmError::InvalidArgument);
            }
            props.brightness = brightness;
        }
        self.update_status()
    }

    /// Mark the device suspended or resumed.
    pub fn set_suspended(&self, suspended: bool) -> Result<(), DrmError> {
        self.props
            .lock()
            .state
            .set(BacklightState::SUSPENDED, suspended);
        self.update_status()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use alloc::sync::Arc;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u32>>,
    }

    struct RecordingOps(Arc<Recorder>);

    impl BacklightOps for RecordingOps {
        fn update_status(&self, props: &BacklightProperties) -> Result<(), DrmError> {
            self.0.seen.lock().push(props.effective_brightness());
            Ok(())
        }
    }

    #[test]
    fn test_effective_brightness() {
        let mut props = BacklightProperties {
            brightness: 128,
            max_brightness: 255,
            ..Default::default()
        };
        assert_eq!(props.effective_brightness(), 128);

        props.power = BlankMode::Powerdown;
        assert_eq!(props.effective_brightness(), 0);

        props.power = BlankMode::Unblank;
        props.state = BacklightState::FBBLANK;
        assert_eq!(props.effective_brightness(), 0);
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let recorder = Arc::new(Recorder::default());
        assert!(matches!(
            BacklightDevice::register("", 255, Box::new(RecordingOps(recorder))),
            Err(DrmError::InvalidArgument)
        ));
    }

    #[test]
    fn test_updates_reach_ops() {
        let recorder = Arc::new(Recorder::default());
        let bl = BacklightDevice::register("test", 255, Box::new(RecordingOps(recorder.clone())))
            .expect("Register failed");
        assert_eq!(bl.props().brightness, 255);

        bl.set_brightness(100).expect("Set brightness failed");
        bl.set_power(BlankMode::Powerdown).expect("Power down failed");
        bl.set_power(BlankMode::Unblank).expect("Unblank failed");
        bl.set_suspended(true).expect("Suspend failed");

        assert_eq!(*recorder.seen.lock(), [100, 0, 100, 0]);
        assert_eq!(bl.set_brightness(256), Err(DrmError::InvalidArgument));
    }
}
