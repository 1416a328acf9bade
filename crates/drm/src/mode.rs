//! Display mode description.
//!
//! Timings follow the usual layout: each direction has an active region, a
//! front porch, a sync pulse and a back porch, and `*total` is their sum.
//!
//! ```text
//!   hdisplay   hsync_start   hsync_end   htotal
//!  |----------|-------------|-----------|
//!    active     front porch    sync       back porch
//! ```

use core::fmt::{self, Write};

use bitflags::bitflags;

/// Maximum length of a mode name, terminator excluded.
pub const DISPLAY_MODE_LEN: usize = 32;

bitflags! {
    /// Mode origin and preference bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModeType: u32 {
        /// The mode the sink prefers.
        const PREFERRED = 1 << 3;
        /// Mode provided by the driver rather than read from the sink.
        const DRIVER = 1 << 6;
    }
}

/// Fixed-capacity mode name, truncated on overflow.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ModeName {
    buf: [u8; DISPLAY_MODE_LEN],
    len: usize,
}

impl ModeName {
    pub const fn empty() -> Self {
        Self {
            buf: [0; DISPLAY_MODE_LEN],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ModeName {
    fn default() -> Self {
        Self::empty()
    }
}

impl Write for ModeName {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            let width = c.len_utf8();
            if self.len + width > DISPLAY_MODE_LEN {
                break;
            }
            c.encode_utf8(&mut self.buf[self.len..self.len + width]);
            self.len += width;
        }
        Ok(())
    }
}

impl fmt::Debug for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single video mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    /// Pixel clock in kHz.
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    /// Nominal refresh rate in Hz, 0 if it should be derived from the clock.
    pub vrefresh: u32,
    pub mode_type: ModeType,
    pub name: ModeName,
}

impl DisplayMode {
    /// Mode with only the active area set; porches start at zero.
    pub const fn new(clock: u32, hdisplay: u16, vdisplay: u16) -> Self {
        Self {
            clock,
            hdisplay,
            hsync_start: hdisplay,
            hsync_end: hdisplay,
            htotal: hdisplay,
            vdisplay,
            vsync_start: vdisplay,
            vsync_end: vdisplay,
            vtotal: vdisplay,
            vrefresh: 0,
            mode_type: ModeType::empty(),
            name: ModeName::empty(),
        }
    }

    /// Horizontal blanking as front porch, sync length and back porch.
    #[must_use]
    pub const fn hsync(mut self, front_porch: u16, sync_len: u16, back_porch: u16) -> Self {
        self.hsync_start = self.hdisplay.saturating_add(front_porch);
        self.hsync_end = self.hsync_start.saturating_add(sync_len);
        self.htotal = self.hsync_end.saturating_add(back_porch);
        self
    }

    /// Vertical blanking as front porch, sync length and back porch.
    #[must_use]
    pub const fn vsync(mut self, front_porch: u16, sync_len: u16, back_porch: u16) -> Self {
        self.vsync_start = self.vdisplay.saturating_add(front_porch);
        self.vsync_end = self.vsync_start.saturating_add(sync_len);
        self.vtotal = self.vsync_end.saturating_add(back_porch);
        self
    }

    #[must_use]
    pub const fn with_vrefresh(mut self, vrefresh: u32) -> Self {
        self.vrefresh = vrefresh;
        self
    }

    // Porches of an unordered mode read as zero; check `is_valid` first.
    pub const fn hfront_porch(&self) -> u16 {
        self.hsync_start.saturating_sub(self.hdisplay)
    }

    pub const fn hsync_len(&self) -> u16 {
        self.hsync_end.saturating_sub(self.hsync_start)
    }

    pub const fn hback_porch(&self) -> u16 {
        self.htotal.saturating_sub(self.hsync_end)
    }

    pub const fn vfront_porch(&self) -> u16 {
        self.vsync_start.saturating_sub(self.vdisplay)
    }

    pub const fn vsync_len(&self) -> u16 {
        self.vsync_end.saturating_sub(self.vsync_start)
    }

    pub const fn vback_porch(&self) -> u16 {
        self.vtotal.saturating_sub(self.vsync_end)
    }

    /// Timings are ordered and the clock runs.
    pub fn is_valid(&self) -> bool {
        self.clock != 0
            && self.hdisplay != 0
            && self.vdisplay != 0
            && self.hdisplay <= self.hsync_start
            && self.hsync_start <= self.hsync_end
            && self.hsync_end <= self.htotal
            && self.vdisplay <= self.vsync_start
            && self.vsync_start <= self.vsync_end
            && self.vsync_end <= self.vtotal
    }

    /// Refresh rate in Hz.
    ///
    /// The declared rate wins; otherwise it is derived from the pixel clock
    /// and the totals, rounded to nearest.
    pub fn refresh_rate(&self) -> u32 {
        if self.vrefresh != 0 {
            return self.vrefresh;
        }
        let pixels = u64::from(self.htotal) * u64::from(self.vtotal);
        if pixels == 0 {
            return 0;
        }
        let hz = u64::from(self.clock) * 1000;
        ((hz + pixels / 2) / pixels) as u32
    }

    /// Name the mode after its active area, e.g. `800x480`.
    pub fn set_name(&mut self) {
        self.name = ModeName::empty();
        // ModeName truncates instead of failing.
        let _ = write!(self.name, "{}x{}", self.hdisplay, self.vdisplay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODE: DisplayMode = DisplayMode::new(83_333, 800, 480)
        .hsync(61, 2, 44)
        .vsync(7, 2, 21)
        .with_vrefresh(60);

    #[test]
    fn test_builder_timings() {
        assert_eq!(MODE.hsync_start, 861);
        assert_eq!(MODE.hsync_end, 863);
        assert_eq!(MODE.htotal, 907);
        assert_eq!(MODE.vsync_start, 487);
        assert_eq!(MODE.vsync_end, 489);
        assert_eq!(MODE.vtotal, 510);

        assert_eq!(MODE.hfront_porch(), 61);
        assert_eq!(MODE.hsync_len(), 2);
        assert_eq!(MODE.hback_porch(), 44);
        assert_eq!(MODE.vfront_porch(), 7);
        assert_eq!(MODE.vsync_len(), 2);
        assert_eq!(MODE.vback_porch(), 21);
        assert!(MODE.is_valid());
    }

    #[test]
    fn test_invalid_modes() {
        let mut mode = MODE;
        mode.clock = 0;
        assert!(!mode.is_valid());

        let mut mode = MODE;
        mode.hsync_end = mode.htotal + 1;
        assert!(!mode.is_valid());
    }

    #[test]
    fn test_unordered_mode_porches_saturate() {
        let mut mode = MODE;
        mode.hsync_start = 10;
        mode.vtotal = 0;
        assert!(!mode.is_valid());
        assert_eq!(mode.hfront_porch(), 0);
        assert_eq!(mode.hsync_len(), 853);
        assert_eq!(mode.vback_porch(), 0);

        let wide = DisplayMode::new(1, u16::MAX - 1, 1).hsync(4, 4, 4);
        assert_eq!(wide.htotal, u16::MAX);
    }

    #[test]
    fn test_refresh_rate() {
        assert_eq!(MODE.refresh_rate(), 60);

        // 148.5 MHz over 2200x1125 is 1080p60
        let derived = DisplayMode::new(148_500, 1920, 1080)
            .hsync(88, 44, 148)
            .vsync(4, 5, 36);
        assert_eq!(derived.refresh_rate(), 60);
    }

    #[test]
    fn test_set_name() {
        let mut mode = MODE;
        assert!(mode.name.is_empty());
        mode.set_name();
        assert_eq!(mode.name.as_str(), "800x480");
    }

    #[test]
    fn test_name_truncates() {
        let mut name = ModeName::empty();
        let _ = name.write_str("0123456789abcdef0123456789abcdefXYZ");
        assert_eq!(name.as_str().len(), DISPLAY_MODE_LEN);
        assert!(name.as_str().ends_with("cdef"));
    }
}
