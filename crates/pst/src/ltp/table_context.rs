//! ## [TC (Table Context)](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/5e48be0d-a75a-4918-a277-50408ff96740)
//!
//! A schema-driven row table on a Heap-on-Node. The column set is fixed at
//! build time; rows are packed back-to-back at a fixed stride with a trailing
//! Cell Existence Bitmap, and a row-index BTH maps `dwRowID` to row number.

use super::*;
use crate::ndb::{NodeId, NodeIdType};
use super::bth::build_bth;
use super::heap::{HeapClientSig, HeapOnNode, MAX_HEAP_ALLOC};
use super::prop_context::{prop_id, prop_type_code, property_subnode_nid};
use super::prop_type::{column_size, is_fixed, PropertyType, PropertyValue};

/// `bType` of a `TCINFO`.
const TC_TYPE: u8 = 0x7C;

/// Synthetic first column of every TC: the row's `dwRowID`.
pub const PID_TAG_LTP_ROW_ID: u32 = 0x67F2_0003;

/// One table row: its `dwRowID` plus the populated cells.
#[derive(Clone, Debug, Default)]
pub struct TableRow {
    pub row_id: u32,
    pub values: Vec<(u32, PropertyValue)>,
}

impl TableRow {
    pub fn new(row_id: u32) -> Self {
        Self { row_id, values: Vec::new() }
    }

    pub fn set(mut self, tag: u32, value: PropertyValue) -> Self {
        self.values.push((tag, value));
        self
    }
}

/// A finished Table Context: the HN page streams plus any spilled values.
pub struct TcNode {
    pub pages: Vec<Vec<u8>>,
    pub subnodes: Vec<(NodeId, Vec<u8>)>,
}

struct ColumnDesc {
    tag: u32,
    offset: u16,
    size: u8,
    bit: u8,
}

/// Sort user columns into the canonical groups: fixed ≥ 4 bytes, fixed
/// 2 bytes, fixed 1 byte, then variable-size, each ascending by tag. Returns
/// the ordered tags and the `rgib` group boundaries.
fn layout_columns(column_tags: &[u32]) -> LtpResult<(Vec<ColumnDesc>, [u16; 4], usize)> {
    let mut group_wide = Vec::new();
    let mut group_two = Vec::new();
    let mut group_one = Vec::new();
    let mut group_var = Vec::new();

    for &tag in column_tags {
        if tag == PID_TAG_LTP_ROW_ID {
            continue;
        }
        let prop_type = PropertyType::try_from(prop_type_code(tag))?;
        if is_fixed(prop_type) {
            match column_size(prop_type) {
                2 => group_two.push(tag),
                1 => group_one.push(tag),
                _ => group_wide.push(tag),
            }
        } else {
            group_var.push(tag);
        }
    }
    group_wide.sort_unstable();
    group_two.sort_unstable();
    group_one.sort_unstable();
    group_var.sort_unstable();

    let total_cols = group_wide.len() + group_two.len() + group_one.len() + group_var.len() + 1;
    let ceb_size = total_cols.div_ceil(8);

    let mut columns = vec![ColumnDesc {
        tag: PID_TAG_LTP_ROW_ID,
        offset: 0,
        size: 4,
        bit: 0,
    }];

    let mut offset = 4_u16;
    let mut end_wide = 4_u16;
    let mut end_two = 4_u16;

    let wide_count = group_wide.len();
    let two_count = group_two.len();
    let ordered = group_wide
        .into_iter()
        .chain(group_two)
        .chain(group_one)
        .chain(group_var);

    for (i, tag) in ordered.enumerate() {
        let prop_type = PropertyType::try_from(prop_type_code(tag))?;
        let size = if is_fixed(prop_type) { column_size(prop_type) } else { 4 };
        columns.push(ColumnDesc {
            tag,
            offset,
            size: size as u8,
            bit: (i + 1) as u8,
        });
        offset += size as u16;

        if i < wide_count {
            end_wide = offset;
        }
        if i < wide_count + two_count {
            end_two = offset;
        }
    }
    if two_count == 0 {
        end_two = end_wide;
    }

    let stride = offset as usize + ceb_size;
    let rgib = [0, end_wide, end_two, stride as u16];
    Ok((columns, rgib, ceb_size))
}

/// Build a Table Context from its column tags and rows. Cells whose tag is
/// not in the column set are ignored.
pub fn build_tc(column_tags: &[u32], rows: &[TableRow]) -> LtpResult<TcNode> {
    let mut hn = HeapOnNode::new(HeapClientSig::TableContext);
    let mut subnodes = Vec::new();

    let (columns, rgib, ceb_size) = layout_columns(column_tags)?;
    let stride = rgib[3] as usize;
    let ceb_offset = stride - ceb_size;

    let mut row_data = Vec::with_capacity(rows.len() * stride);
    for row in rows {
        let mut buf = vec![0_u8; stride];
        buf[0..4].copy_from_slice(&row.row_id.to_le_bytes());
        let mut ceb = vec![0_u8; ceb_size];
        ceb[0] |= 0x80;

        for (tag, value) in &row.values {
            let Some(column) = columns.iter().find(|column| column.tag == *tag) else {
                continue;
            };
            let prop_type = value.prop_type();
            if prop_type_code(*tag) != u16::from(prop_type) {
                return Err(LtpError::PropertyTagTypeMismatch(*tag, prop_type));
            }

            ceb[usize::from(column.bit) / 8] |= 0x80 >> (column.bit % 8);
            let offset = usize::from(column.offset);

            if is_fixed(prop_type) {
                match value {
                    PropertyValue::Integer16(v) => {
                        buf[offset..offset + 2].copy_from_slice(&v.to_le_bytes())
                    }
                    PropertyValue::Integer32(v) => {
                        buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes())
                    }
                    PropertyValue::Boolean(v) => {
                        buf[offset..offset + 4].copy_from_slice(&u32::from(*v).to_le_bytes())
                    }
                    PropertyValue::Integer64(v) => {
                        buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes())
                    }
                    PropertyValue::Time(v) => {
                        buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes())
                    }
                    PropertyValue::Guid(v) => buf[offset..offset + 16].copy_from_slice(v),
                    _ => {}
                }
            } else {
                let bytes = value.variable_bytes().unwrap_or_default();
                let hnid = if bytes.len() > MAX_HEAP_ALLOC {
                    let nid = property_subnode_nid(prop_id(*tag));
                    if subnodes.iter().any(|(existing, _)| *existing == nid) {
                        return Err(LtpError::DuplicateSubnodeProperty(prop_id(*tag)));
                    }
                    subnodes.push((nid, bytes));
                    u32::from(nid)
                } else {
                    u32::from(hn.allocate(&bytes)?)
                };
                buf[offset..offset + 4].copy_from_slice(&hnid.to_le_bytes());
            }
        }

        buf[ceb_offset..stride].copy_from_slice(&ceb);
        row_data.extend_from_slice(&buf);
    }

    // Row matrix: on the heap when it fits, otherwise in a sub-node keyed by
    // the synthetic row-id column.
    let hnid_rows = if row_data.is_empty() {
        0
    } else if row_data.len() > MAX_HEAP_ALLOC {
        let nid = property_subnode_nid(prop_id(PID_TAG_LTP_ROW_ID));
        subnodes.push((nid, row_data));
        u32::from(nid)
    } else {
        u32::from(hn.allocate(&row_data)?)
    };

    // Row-index BTH: dwRowID → row number, sorted by row id.
    let hid_row_index = if rows.is_empty() {
        0
    } else {
        let mut pairs: Vec<(u32, u32)> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.row_id, index as u32))
            .collect();
        pairs.sort_unstable_by_key(|&(row_id, _)| row_id);
        let records: Vec<_> = pairs
            .iter()
            .map(|(row_id, index)| {
                (row_id.to_le_bytes().to_vec(), index.to_le_bytes().to_vec())
            })
            .collect();
        u32::from(build_bth(&mut hn, 4, 4, &records)?)
    };

    // TCINFO followed by the TCOLDESC array.
    let mut tcinfo = Vec::with_capacity(22 + columns.len() * 8);
    tcinfo.push(TC_TYPE);
    tcinfo.push(columns.len() as u8);
    for boundary in rgib {
        tcinfo.extend_from_slice(&boundary.to_le_bytes());
    }
    tcinfo.extend_from_slice(&hid_row_index.to_le_bytes());
    tcinfo.extend_from_slice(&hnid_rows.to_le_bytes());
    tcinfo.extend_from_slice(&0_u32.to_le_bytes());
    for column in &columns {
        tcinfo.extend_from_slice(&column.tag.to_le_bytes());
        tcinfo.extend_from_slice(&column.offset.to_le_bytes());
        tcinfo.push(column.size);
        tcinfo.push(column.bit);
    }

    let tcinfo_hid = hn.allocate(&tcinfo)?;
    hn.set_user_root(tcinfo_hid);

    Ok(TcNode {
        pages: hn.finalize(),
        subnodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::tags::*;

    fn tcinfo_of(page: &[u8]) -> &[u8] {
        // hidUserRoot names the TCINFO allocation; walk the page map to it.
        let user_root = u32::from_le_bytes(page[4..8].try_into().unwrap());
        let index = (user_root >> 5 & 0x7FF) as usize;
        let ib_hnpm = u16::from_le_bytes([page[0], page[1]]) as usize;
        let offsets = &page[ib_hnpm + 4..];
        let start = u16::from_le_bytes([offsets[(index - 1) * 2], offsets[(index - 1) * 2 + 1]]);
        let end = u16::from_le_bytes([offsets[index * 2], offsets[index * 2 + 1]]);
        &page[start as usize..end as usize]
    }

    #[test]
    fn test_empty_tc_keeps_row_id_column() {
        let tc = build_tc(&[], &[]).unwrap();
        assert_eq!(tc.pages.len(), 1);

        let page = &tc.pages[0];
        let tcinfo = tcinfo_of(page);
        assert_eq!(tcinfo[0], TC_TYPE);
        assert_eq!(tcinfo[1], 1);
        // rgib: 0, 4, 4, 5 (dwRowID + one CEB byte).
        assert_eq!(u16::from_le_bytes([tcinfo[2], tcinfo[3]]), 0);
        assert_eq!(u16::from_le_bytes([tcinfo[4], tcinfo[5]]), 4);
        assert_eq!(u16::from_le_bytes([tcinfo[6], tcinfo[7]]), 4);
        assert_eq!(u16::from_le_bytes([tcinfo[8], tcinfo[9]]), 5);
        // hidRowIndex and hnidRows are both empty.
        assert_eq!(u32::from_le_bytes(tcinfo[10..14].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(tcinfo[14..18].try_into().unwrap()), 0);
        // First TCOLDESC is the synthetic row-id column.
        assert_eq!(
            u32::from_le_bytes(tcinfo[22..26].try_into().unwrap()),
            PID_TAG_LTP_ROW_ID
        );
    }

    #[test]
    fn test_column_grouping() {
        let columns = [
            PID_TAG_DISPLAY_NAME,          // variable
            PID_TAG_CONTENT_COUNT,         // fixed 4
            PID_TAG_MESSAGE_DELIVERY_TIME, // fixed 8
            PID_TAG_SUBFOLDERS,            // fixed 4 (bool)
        ];
        let tc = build_tc(&columns, &[]).unwrap();
        let page = &tc.pages[0];
        let tcinfo = tcinfo_of(page);

        assert_eq!(tcinfo[1], 5);
        // Fixed group: delivery time (0x0E06) < content count (0x3602) <
        // subfolders (0x360A); then the variable display name.
        let tags: Vec<u32> = (0..5)
            .map(|i| u32::from_le_bytes(tcinfo[22 + i * 8..26 + i * 8].try_into().unwrap()))
            .collect();
        assert_eq!(
            tags,
            vec![
                PID_TAG_LTP_ROW_ID,
                PID_TAG_MESSAGE_DELIVERY_TIME,
                PID_TAG_CONTENT_COUNT,
                PID_TAG_SUBFOLDERS,
                PID_TAG_DISPLAY_NAME,
            ]
        );

        // Offsets: 0, 4, 12, 16, 20; stride 24 + 1 CEB byte.
        let offsets: Vec<u16> = (0..5)
            .map(|i| u16::from_le_bytes([tcinfo[26 + i * 8], tcinfo[27 + i * 8]]))
            .collect();
        assert_eq!(offsets, vec![0, 4, 12, 16, 20]);
        assert_eq!(u16::from_le_bytes([tcinfo[8], tcinfo[9]]), 25);
    }

    #[test]
    fn test_row_cells_and_ceb() {
        let columns = [PID_TAG_CONTENT_COUNT, PID_TAG_DISPLAY_NAME];
        let rows = [TableRow::new(0x420)
            .set(PID_TAG_CONTENT_COUNT, PropertyValue::Integer32(7))
            .set(PID_TAG_DISPLAY_NAME, PropertyValue::Unicode("Inbox".into()))];
        let tc = build_tc(&columns, &rows).unwrap();
        let page = &tc.pages[0];

        // Allocation 1 is the "Inbox" cell, allocation 2 the row matrix.
        let row = &page[12 + 10..12 + 10 + 13];
        assert_eq!(u32::from_le_bytes(row[0..4].try_into().unwrap()), 0x420);
        assert_eq!(u32::from_le_bytes(row[4..8].try_into().unwrap()), 7);
        let hnid = u32::from_le_bytes(row[8..12].try_into().unwrap());
        assert_eq!(hnid & 0x1F, 0);
        // CEB: bits 0 (row id), 1 (count), 2 (name) set, MSB-first.
        assert_eq!(row[12], 0b1110_0000);
    }

    #[test]
    fn test_missing_cell_left_absent() {
        let columns = [PID_TAG_CONTENT_COUNT, PID_TAG_DISPLAY_NAME];
        let rows = [TableRow::new(1).set(PID_TAG_CONTENT_COUNT, PropertyValue::Integer32(0))];
        let tc = build_tc(&columns, &rows).unwrap();
        let page = &tc.pages[0];

        // No variable cells were allocated: first allocation is the rows.
        let row = &page[12..12 + 13];
        assert_eq!(row[12], 0b1100_0000);
        assert_eq!(u32::from_le_bytes(row[8..12].try_into().unwrap()), 0);
    }

    #[test]
    fn test_large_row_matrix_spills_to_subnode() {
        let columns = [PID_TAG_MESSAGE_SIZE];
        let rows: Vec<_> = (0..500_u32)
            .map(|i| TableRow::new(i + 32).set(PID_TAG_MESSAGE_SIZE, PropertyValue::Integer32(1)))
            .collect();
        let tc = build_tc(&columns, &rows).unwrap();

        let (nid, data) = tc
            .subnodes
            .iter()
            .find(|(nid, _)| *nid == property_subnode_nid(0x67F2))
            .expect("row matrix should spill");
        assert_eq!(u32::from(*nid) & 0x1F, 0x1F);
        // Stride: dwRowID + 4-byte size + 1 CEB byte.
        assert_eq!(data.len(), 500 * 9);
    }
}
