//! ## [PC (Property Context)](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/294c83c6-ff92-42f5-b6b6-876c29fa9737)
//!
//! A BTH with 2-byte property-id keys and 6-byte entries
//! (`wPropType` + value dword). Fixed values up to 4 bytes are inline; wider
//! fixed values and variable values live on the heap; variable values past
//! [`MAX_HEAP_ALLOC`] spill into a sub-node referenced by an LTP-type NID.

use super::*;
use crate::ndb::{NodeId, NodeIdType};
use super::bth::build_bth;
use super::heap::{HeapClientSig, HeapOnNode, MAX_HEAP_ALLOC};
use super::prop_type::{is_fixed, PropertyValue};

/// Property id of a 32-bit tag.
pub fn prop_id(tag: u32) -> u16 {
    (tag >> 16) as u16
}

/// Property type code of a 32-bit tag.
pub fn prop_type_code(tag: u32) -> u16 {
    tag as u16
}

/// Sub-node NID carrying a property value that exceeded the heap cap.
pub fn property_subnode_nid(pid: u16) -> NodeId {
    NodeId::from((u32::from(pid) << 5) | NodeIdType::ListsTablesProperties as u32)
}

/// A finished Property Context: the HN page streams plus any spilled values.
pub struct PcNode {
    pub pages: Vec<Vec<u8>>,
    pub subnodes: Vec<(NodeId, Vec<u8>)>,
}

/// Build a Property Context from `(tag, value)` pairs. Pairs may arrive in
/// any order; the BTH requires and gets ascending property ids.
pub fn build_pc(properties: &[(u32, PropertyValue)]) -> LtpResult<PcNode> {
    let mut hn = HeapOnNode::new(HeapClientSig::PropertyContext);
    let mut subnodes = Vec::new();

    let mut sorted: Vec<_> = properties.iter().collect();
    sorted.sort_by_key(|(tag, _)| prop_id(*tag));

    let mut records = Vec::with_capacity(sorted.len());
    for (tag, value) in sorted {
        let prop_type = value.prop_type();
        if prop_type_code(*tag) != u16::from(prop_type) {
            return Err(LtpError::PropertyTagTypeMismatch(*tag, prop_type));
        }
        let pid = prop_id(*tag);

        let dword = if let Some(inline) = value.inline_dword() {
            inline
        } else if is_fixed(prop_type) {
            let bytes = value
                .fixed_heap_bytes()
                .unwrap_or_default();
            u32::from(hn.allocate(&bytes)?)
        } else {
            let bytes = value.variable_bytes().unwrap_or_default();
            if bytes.len() > MAX_HEAP_ALLOC {
                let nid = property_subnode_nid(pid);
                if subnodes.iter().any(|(existing, _)| *existing == nid) {
                    return Err(LtpError::DuplicateSubnodeProperty(pid));
                }
                subnodes.push((nid, bytes));
                u32::from(nid)
            } else {
                u32::from(hn.allocate(&bytes)?)
            }
        };

        let mut data = Vec::with_capacity(6);
        data.extend_from_slice(&u16::from(prop_type).to_le_bytes());
        data.extend_from_slice(&dword.to_le_bytes());
        records.push((pid.to_le_bytes().to_vec(), data));
    }

    let header_hid = build_bth(&mut hn, 2, 6, &records)?;
    hn.set_user_root(header_hid);

    Ok(PcNode {
        pages: hn.finalize(),
        subnodes,
    })
}
