//! Device tree access for the panel drivers.
//!
//! Parses a flattened device tree into an owned snapshot, resolves phandle
//! references between nodes, matches nodes against driver compatible tables
//! and keeps the list of I2C clients instantiated from the tree.

#![no_std]

extern crate alloc;

pub mod i2c;
pub mod matching;
pub mod tree;

pub use i2c::{I2cClient, I2cClientRef, I2cClientRegistry};
pub use matching::{OfDeviceId, match_device};
pub use tree::{DeviceTree, OfNode, OfProperty};

use panel_error::define_driver_error;

define_driver_error! {
    /// Errors raised by device tree and I2C client lookups.
    pub enum OfError(0x01) {
        /// Blob header is malformed or the root node is missing
        InvalidBlob = 0x01 [EINVAL] => "Invalid device tree blob",
        /// Requested node does not exist
        NoDevice = 0x02 [ENODEV] => "Device tree node not found",
        /// A client is already registered for the node or address
        Busy = 0x03 [EBUSY] => "Device already registered",
        /// `reg` is missing or out of range for the bus
        InvalidAddress = 0x04 [EINVAL] => "Invalid bus address",
    }
}
