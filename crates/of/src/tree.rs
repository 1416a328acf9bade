//! Owned device tree snapshot.
//!
//! The flattened blob is walked once with the `fdt` crate and every node is
//! copied out together with its full path. Lookups afterwards never touch the
//! blob, so the tree can outlive it and be shared between drivers.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use fdt::Fdt;
use fdt::node::FdtNode;

use crate::OfError;

/// A raw property as stored in the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfProperty {
    pub name: String,
    pub value: Vec<u8>,
}

/// One device tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfNode {
    path: String,
    name: String,
    compatible: Vec<String>,
    phandle: Option<u32>,
    properties: Vec<OfProperty>,
}

impl OfNode {
    /// Full path, e.g. `/soc/dsi@7e700000/panel@0`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Node name including the unit address.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent_path(&self) -> Option<&str> {
        if self.path == "/" {
            return None;
        }
        match self.path.rsplit_once('/') {
            Some(("", _)) => Some("/"),
            Some((parent, _)) => Some(parent),
            None => None,
        }
    }

    pub fn phandle(&self) -> Option<u32> {
        self.phandle
    }

    /// Compatible strings, most specific first.
    pub fn compatible(&self) -> impl Iterator<Item = &str> {
        self.compatible.iter().map(String::as_str)
    }

    pub fn is_compatible(&self, compatible: &str) -> bool {
        self.compatible().any(|c| c == compatible)
    }

    pub fn properties(&self) -> &[OfProperty] {
        &self.properties
    }

    /// Raw value of a property.
    pub fn property(&self, name: &str) -> Option<&[u8]> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_slice())
    }

    /// The `index`-th big-endian cell of a property.
    pub fn property_u32(&self, name: &str, index: usize) -> Option<u32> {
        be_cell(self.property(name)?, index)
    }

    /// First cell of `reg`.
    ///
    /// Bus addresses for I2C and DSI children are a single cell.
    pub fn reg_address(&self) -> Option<u32> {
        self.property_u32("reg", 0)
    }
}

/// Read the `index`-th big-endian u32 of a property value.
fn be_cell(value: &[u8], index: usize) -> Option<u32> {
    let start = index.checked_mul(4)?;
    let bytes = value.get(start..start.checked_add(4)?)?;
    bytes.try_into().ok().map(u32::from_be_bytes)
}

/// Split a `stringlist` property into its entries.
fn string_list(value: &[u8]) -> Vec<String> {
    value
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .filter_map(|s| core::str::from_utf8(s).ok())
        .map(ToString::to_string)
        .collect()
}

/// Parsed device tree.
#[derive(Debug, Clone, Default)]
pub struct DeviceTree {
    nodes: Vec<OfNode>,
}

impl DeviceTree {
    /// Parse a flattened device tree blob.
    pub fn parse(blob: &[u8]) -> Result<Self, OfError> {
        let fdt = Fdt::new(blob).map_err(|_| OfError::InvalidBlob)?;
        let root = fdt.find_node("/").ok_or(OfError::InvalidBlob)?;

        let mut nodes = Vec::new();
        collect(root, String::from("/"), &mut nodes);

        log::debug!("[OF] Parsed device tree: {} nodes", nodes.len());
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[OfNode] {
        &self.nodes
    }

    pub fn find_node(&self, path: &str) -> Option<&OfNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Resolve a phandle to its node. Phandle 0 is never valid.
    pub fn find_by_phandle(&self, phandle: u32) -> Option<&OfNode> {
        if phandle == 0 {
            return None;
        }
        self.nodes.iter().find(|n| n.phandle == Some(phandle))
    }

    /// All nodes carrying `compatible`, in tree order.
    pub fn find_compatible<'a>(&'a self, compatible: &'a str) -> impl Iterator<Item = &'a OfNode> {
        self.nodes.iter().filter(move |n| n.is_compatible(compatible))
    }

    /// Direct children of the node at `path`.
    pub fn children<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a OfNode> {
        self.nodes
            .iter()
            .filter(move |n| n.parent_path() == Some(path))
    }

    /// Follow the `index`-th phandle stored in `property` of `node`.
    ///
    /// Returns `None` when the property is absent, too short, or points at a
    /// phandle no node carries.
    pub fn parse_phandle(&self, node: &OfNode, property: &str, index: usize) -> Option<&OfNode> {
        let phandle = node.property_u32(property, index)?;
        let target = self.find_by_phandle(phandle);
        if target.is_none() {
            log::warn!(
                "[OF] {}: {} references unknown phandle {:#x}",
                node.path,
                property,
                phandle
            );
        }
        target
    }
}

fn collect(node: FdtNode<'_, '_>, path: String, out: &mut Vec<OfNode>) {
    let properties: Vec<OfProperty> = node
        .properties()
        .map(|p| OfProperty {
            name: p.name.to_string(),
            value: p.value.to_vec(),
        })
        .collect();

    let find = |name: &str| properties.iter().find(|p| p.name == name);
    let compatible = find("compatible").map(|p| string_list(&p.value)).unwrap_or_default();
    let phandle = find("phandle")
        .or_else(|| find("linux,phandle"))
        .and_then(|p| be_cell(&p.value, 0));

    let name = if path == "/" {
        String::from("/")
    } else {
        node.name.to_string()
    };

    out.push(OfNode {
        path: path.clone(),
        name,
        compatible,
        phandle,
        properties,
    });

    for child in node.children() {
        let child_path = if path == "/" {
            format!("/{}", child.name)
        } else {
            format!("{}/{}", path, child.name)
        };
        collect(child, child_path, out);
    }
}
