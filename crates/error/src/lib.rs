//! Driver error handling infrastructure.
//!
//! Provides the `define_driver_error!` macro for consistent error type
//! definitions across the panel driver crates. Every generated error carries:
//! - a 16-bit code (`subsystem << 8 | variant`) for logs,
//! - a human readable description,
//! - a negative errno the host framework understands.
//!
//! ## Usage
//!
//! ### Simple errors (no inner data)
//! ```ignore
//! define_driver_error! {
//!     pub enum OfError(0x01) {
//!         InvalidBlob = 0x01 [EINVAL] => "Invalid device tree blob",
//!         NoDevice = 0x02 [ENODEV] => "No such device node",
//!     }
//! }
//! ```
//!
//! ### Nested errors (with inner error type)
//!
//! The errno of a nested variant is taken from the inner error unless one is
//! given explicitly.
//! ```ignore
//! define_driver_error! {
//!     pub enum DrmError(0x02) {
//!         Of(OfError) = 0x01 => "Device tree lookup failed",
//!     }
//! }
//! ```

#![no_std]

/// Errno values used by the panel stack.
///
/// Positive constants, as in the uapi headers. The kernel-internal
/// `EPROBE_DEFER` is not part of the uapi and lives here.
pub mod errno {
    pub use linux_raw_sys::errno::{EBUSY, EINVAL, EIO, ENODEV, ENOENT, ENOMEM};

    /// Driver requests probe retry once a dependency shows up.
    pub const EPROBE_DEFER: u32 = 517;
}

/// Macro to define a driver error type with consistent handling.
///
/// Supports both simple variants and nested variants containing inner errors.
/// Simple variants without an explicit errno report `-EIO`.
#[macro_export]
macro_rules! define_driver_error {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($subsystem:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(($inner:ty))? = $code:literal $([$errno:ident])? => $desc:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(($inner))?,
            )*
        }

        impl $name {
            /// Subsystem identifier for this error type.
            pub const SUBSYSTEM: u8 = $subsystem;

            /// Get numeric error code for debugging.
            pub const fn code(&self) -> u16 {
                match self {
                    $(
                        $crate::define_driver_error!(@pattern $variant $(($inner))? _unused) => {
                            (($subsystem as u16) << 8) | $code
                        }
                    )*
                }
            }

            /// Get error name for logging.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(
                        $crate::define_driver_error!(@pattern $variant $(($inner))? _unused) => {
                            $desc
                        }
                    )*
                }
            }

            /// Negative errno handed back to the host framework.
            pub const fn errno(&self) -> i32 {
                match self {
                    $(
                        $crate::define_driver_error!(@pattern $variant $(($inner))? inner) => {
                            $crate::define_driver_error!(@errno ($($inner)?) ($($errno)?) inner)
                        }
                    )*
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $(
                        $crate::define_driver_error!(@pattern $variant $(($inner))? inner) => {
                            $crate::define_driver_error!(@display_body self f $desc $(($inner))? inner)
                        }
                    )*
                }
            }
        }

        impl core::error::Error for $name {}
    };

    // Helper to generate patterns
    (@pattern $variant:ident ($inner:ty) $bind:ident) => { Self::$variant($bind) };
    (@pattern $variant:ident $bind:ident) => { Self::$variant };

    // Helper to pick the errno
    (@errno ($inner:ty) ($errno:ident) $bind:ident) => {{
        let _ = $bind;
        -($crate::errno::$errno as i32)
    }};
    (@errno () ($errno:ident) $bind:ident) => { -($crate::errno::$errno as i32) };
    (@errno ($inner:ty) () $bind:ident) => { $bind.errno() };
    (@errno () () $bind:ident) => { -($crate::errno::EIO as i32) };

    // Helper to generate display bodies
    (@display_body $self:ident $f:ident $desc:literal ($inner:ty) $bind:ident) => {
        write!($f, "E{:04X}: {} ({})", $self.code(), $desc, $bind)
    };
    (@display_body $self:ident $f:ident $desc:literal $bind:ident) => {
        write!($f, "E{:04X}: {}", $self.code(), $desc)
    };
}

#[cfg(test)]
mod tests {
    use super::errno::{EBUSY, ENODEV, EPROBE_DEFER};

    define_driver_error! {
        /// Test error type
        pub enum TestError(0xFF) {
            /// Missing device
            Missing = 0x01 [ENODEV] => "Missing device",
            /// Busy device
            Busy = 0x02 [EBUSY] => "Device busy",
            Unspecified = 0x03 => "Unspecified failure",
        }
    }

    define_driver_error! {
        pub enum NestedTestError(0xFE) {
            Inner(TestError) = 0x01 => "Nested error",
            Deferred(TestError) = 0x02 [EPROBE_DEFER] => "Deferred",
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TestError::Missing.code(), 0xFF01);
        assert_eq!(TestError::Busy.code(), 0xFF02);
        assert_eq!(NestedTestError::Inner(TestError::Missing).code(), 0xFE01);
    }

    #[test]
    fn test_error_names() {
        assert_eq!(TestError::Missing.name(), "Missing device");
        assert_eq!(NestedTestError::Inner(TestError::Busy).name(), "Nested error");
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(TestError::Missing.errno(), -(ENODEV as i32));
        assert_eq!(TestError::Busy.errno(), -(EBUSY as i32));
        assert_eq!(TestError::Unspecified.errno(), -5);
    }

    #[test]
    fn test_nested_errno_delegates_unless_overridden() {
        assert_eq!(
            NestedTestError::Inner(TestError::Busy).errno(),
            -(EBUSY as i32)
        );
        assert_eq!(
            NestedTestError::Deferred(TestError::Missing).errno(),
            -(EPROBE_DEFER as i32)
        );
    }

    #[test]
    fn test_display_format() {
        extern crate std;
        use std::format;
        assert_eq!(format!("{}", TestError::Missing), "EFF01: Missing device");
        assert_eq!(
            format!("{}", NestedTestError::Inner(TestError::Missing)),
            "EFE01: Nested error (EFF01: Missing device)"
        );
    }

    #[test]
    fn test_subsystem_constant() {
        assert_eq!(TestError::SUBSYSTEM, 0xFF);
        assert_eq!(NestedTestError::SUBSYSTEM, 0xFE);
    }
}
