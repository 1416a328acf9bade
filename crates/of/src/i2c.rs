//! I2C clients instantiated from the device tree.
//!
//! The registry plays the part of the I2C core: adapters are scanned once and
//! every child node with a `reg` becomes a client. Drivers that only *refer*
//! to a client (like a panel pointing at its power-management chip) look it up
//! by node and hold an [`I2cClientRef`] for as long as they use it.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;

use spin::Mutex;

use crate::OfError;
use crate::tree::{DeviceTree, OfNode};

/// Highest address a 10-bit I2C client can use.
pub const I2C_MAX_ADDR: u32 = 0x3ff;

/// An instantiated I2C client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cClient {
    name: String,
    addr: u16,
    adapter_nr: u32,
    node_path: String,
}

impl I2cClient {
    pub fn new(name: &str, addr: u16, adapter_nr: u32, node_path: &str) -> Self {
        Self {
            name: name.to_string(),
            addr,
            adapter_nr,
            node_path: node_path.to_string(),
        }
    }

    /// Build a client from a child node of an adapter.
    ///
    /// The client name is the first compatible string without its vendor
    /// prefix, falling back to the node name without unit address.
    pub fn from_node(node: &OfNode, adapter_nr: u32) -> Result<Self, OfError> {
        let addr = node.reg_address().ok_or(OfError::InvalidAddress)?;
        if addr > I2C_MAX_ADDR {
            return Err(OfError::InvalidAddress);
        }

        let name = match node.compatible().next() {
            Some(compat) => compat.split_once(',').map_or(compat, |(_, model)| model),
            None => node.name().split('@').next().unwrap_or(node.name()),
        };

        Ok(Self::new(name, addr as u16, adapter_nr, node.path()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> u16 {
        self.addr
    }

    pub fn adapter_nr(&self) -> u32 {
        self.adapter_nr
    }

    pub fn node_path(&self) -> &str {
        &self.node_path
    }
}

/// Counted reference to a registered client.
///
/// Cloning takes another reference, dropping releases it.
#[derive(Debug, Clone)]
pub struct I2cClientRef(Arc<I2cClient>);

impl I2cClientRef {
    /// References currently held, the registry's own included while the
    /// client is registered.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Deref for I2cClientRef {
    type Target = I2cClient;

    fn deref(&self) -> &I2cClient {
        &self.0
    }
}

/// Registered I2C clients.
pub struct I2cClientRegistry {
    clients: Mutex<Vec<Arc<I2cClient>>>,
}

impl Default for I2cClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cClientRegistry {
    pub const fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
        }
    }

    /// Register a client.
    ///
    /// Fails with `Busy` if the node or the adapter/address pair is taken.
    pub fn register(&self, client: I2cClient) -> Result<I2cClientRef, OfError> {
        let mut clients = self.clients.lock();
        let taken = clients.iter().any(|c| {
            c.node_path == client.node_path
                || (c.adapter_nr == client.adapter_nr && c.addr == client.addr)
        });
        if taken {
            log::warn!(
                "[OF] i2c-{}: address {:#04x} ({}) already in use",
                client.adapter_nr,
                client.addr,
                client.node_path
            );
            return Err(OfError::Busy);
        }

        log::debug!(
            "[OF] i2c-{}: registered {} at {:#04x}",
            client.adapter_nr,
            client.name,
            client.addr
        );
        let client = Arc::new(client);
        clients.push(Arc::clone(&client));
        Ok(I2cClientRef(client))
    }

    /// Instantiate a client for every child of the adapter at `adapter_path`.
    ///
    /// Children without a usable `reg` are skipped. Returns the number of
    /// clients registered.
    pub fn scan_bus(
        &self,
        tree: &DeviceTree,
        adapter_path: &str,
        adapter_nr: u32,
    ) -> Result<usize, OfError> {
        tree.find_node(adapter_path).ok_or(OfError::NoDevice)?;

        let mut count = 0;
        for child in tree.children(adapter_path) {
            match I2cClient::from_node(child, adapter_nr) {
                Ok(client) => {
                    self.register(client)?;
                    count += 1;
                }
                Err(e) => log::warn!("[OF] {}: skipped: {}", child.path(), e),
            }
        }
        Ok(count)
    }

    /// Look up the client instantiated for `node`, taking a reference.
    pub fn find_by_node(&self, node: &OfNode) -> Option<I2cClientRef> {
        self.clients
            .lock()
            .iter()
            .find(|c| c.node_path == node.path())
            .map(|c| I2cClientRef(Arc::clone(c)))
    }

    /// Drop the registry's reference to the client at `node_path`.
    ///
    /// Outstanding [`I2cClientRef`]s stay valid.
    pub fn unregister(&self, node_path: &str) -> Result<(), OfError> {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|c| c.node_path != node_path);
        if clients.len() == before {
            return Err(OfError::NoDevice);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
