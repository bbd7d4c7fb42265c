//! ## [Blocks](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/a9c1981d-d1ea-457c-b39e-dc7fb0eb95d4)
//!
//! Leaf data blocks carry raw payload and a 16-byte trailer, padded to a
//! 64-byte boundary. XBLOCKs chain the chunks of an over-one-block stream;
//! SLBLOCKs index the sub-nodes of a parent node. Both are packed as internal
//! blocks with the same trailer.

use super::*;
use crate::block_sig::compute_sig;
use crate::crc::compute_crc;

pub const BLOCK_ALIGN: usize = 64;
pub const BLOCK_TRAILER_SIZE: usize = 16;
/// 8192 minus the trailer.
pub const MAX_BLOCK_DATA: usize = 8176;

const XBLOCK_BTYPE: u8 = 0x01;
const SLBLOCK_BTYPE: u8 = 0x02;

/// Total on-disk size of a block holding `data_len` raw bytes.
pub fn block_total_size(data_len: usize) -> usize {
    (data_len + BLOCK_TRAILER_SIZE).div_ceil(BLOCK_ALIGN) * BLOCK_ALIGN
}

/// Pack a block for writing at file offset `ib`: payload, zero padding to the
/// 64-byte boundary, then the `BLOCKTRAILER` (`cb`, `wSig`, `dwCRC`, `bid`).
pub fn pack_block(data: &[u8], block_id: BlockId, ib: u64) -> NdbResult<Vec<u8>> {
    if data.len() > MAX_BLOCK_DATA {
        return Err(NdbError::BlockTooLarge(data.len()));
    }

    let total = block_total_size(data.len());
    let mut block = Vec::with_capacity(total);
    block.extend_from_slice(data);
    block.resize(total - BLOCK_TRAILER_SIZE, 0);

    block.extend_from_slice(&(data.len() as u16).to_le_bytes());
    block.extend_from_slice(&compute_sig(ib, block_id.into()).to_le_bytes());
    block.extend_from_slice(&compute_crc(0, data).to_le_bytes());
    block.extend_from_slice(&u64::from(block_id).to_le_bytes());

    Ok(block)
}

/// Build the payload of an [XBLOCK](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/5b7a6935-e83d-4917-9f62-6ce3707f09e0):
/// `btype=1`, `cLevel=1`, the chunk BIDs in order, and the total raw length.
pub fn build_xblock(block_ids: &[BlockId], total_data_len: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + block_ids.len() * 8);
    data.push(XBLOCK_BTYPE);
    data.push(0x01);
    data.extend_from_slice(&(block_ids.len() as u16).to_le_bytes());
    data.extend_from_slice(&total_data_len.to_le_bytes());
    for &bid in block_ids {
        data.extend_from_slice(&u64::from(bid).to_le_bytes());
    }
    data
}

/// One `SLENTRY`: a sub-node NID with its data stream BID and (usually zero)
/// sub-node index BID.
#[derive(Clone, Copy, Debug)]
pub struct SubnodeLeafEntry {
    pub node: NodeId,
    pub block: BlockId,
    pub sub_block: BlockId,
}

/// Build the payload of an [SLBLOCK](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/85c4d943-0779-43c5-bd98-61dc9bb5dfd6):
/// `btype=2`, `cLevel=0`, then the 24-byte entries.
pub fn build_sl_block(entries: &[SubnodeLeafEntry]) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + entries.len() * 24);
    data.push(SLBLOCK_BTYPE);
    data.push(0x00);
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    for entry in entries {
        data.extend_from_slice(&u64::from(entry.node).to_le_bytes());
        data.extend_from_slice(&u64::from(entry.block).to_le_bytes());
        data.extend_from_slice(&u64::from(entry.sub_block).to_le_bytes());
    }
    data
}
