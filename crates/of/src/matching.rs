//! Compatible-string matching between device nodes and driver tables.

use crate::tree::OfNode;

/// One entry of a driver's device tree match table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfDeviceId {
    pub compatible: &'static str,
}

impl OfDeviceId {
    pub const fn new(compatible: &'static str) -> Self {
        Self { compatible }
    }
}

/// Find the table entry that best matches `node`.
///
/// The node's compatible list is ordered from most to least specific, so the
/// entry matching the earliest compatible string wins regardless of its
/// position in the table.
pub fn match_device<'t>(table: &'t [OfDeviceId], node: &OfNode) -> Option<&'t OfDeviceId> {
    node.compatible()
        .find_map(|compat| table.iter().find(|id| id.compatible == compat))
}
