//! [HEADER](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/c9876f5a-664b-46a3-9887-ba63f113abf5)

use super::*;
use crate::crc::compute_crc;

const HEADER_MAGIC: &[u8; 4] = b"!BDN";
const HEADER_MAGIC_CLIENT: &[u8; 2] = b"SM";

/// `wVer` for a Unicode PST.
const NDB_VERSION_UNICODE: u16 = 23;
const NDB_CLIENT_VERSION: u16 = 19;
const NDB_PLATFORM_CREATE: u8 = 0x01;
const NDB_PLATFORM_ACCESS: u8 = 0x01;
const NDB_SENTINEL: u8 = 0x80;

pub const HEADER_SIZE: usize = 564;
pub const ROOT_SIZE: usize = 72;

/// `dwCRCPartial` covers this many bytes starting at offset 0x08.
const CRC_PARTIAL_LEN: usize = 471;
/// `dwCRCFull` covers this many bytes starting at offset 0x08.
const CRC_FULL_LEN: usize = 516;

/// `bCryptMethod`
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum NdbCryptMethod {
    /// `NDB_CRYPT_NONE`: Data blocks are not encoded
    #[default]
    None = 0x00,
    /// `NDB_CRYPT_PERMUTE`: Encoded with the Permutation algorithm
    Permute = 0x01,
}

/// `fAMapValid`
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum AmapStatus {
    /// `INVALID_AMAP`: One or more AMaps in the PST are INVALID
    #[default]
    Invalid = 0x00,
    /// `VALID_AMAP1`: Deprecated
    Valid1 = 0x01,
    /// `VALID_AMAP2`: The AMaps are VALID
    Valid2 = 0x02,
}

/// `BREF`: a physical block pointer.
#[derive(Clone, Copy, Default, Debug)]
pub struct BlockRef {
    pub block: BlockId,
    pub index: u64,
}

impl BlockRef {
    fn pack_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&u64::from(self.block).to_le_bytes());
        buf.extend_from_slice(&self.index.to_le_bytes());
    }
}

/// [ROOT](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/32ce8c94-4757-46c8-a169-3fd21abee584)
#[derive(Clone, Copy, Debug)]
pub struct Root {
    pub file_eof: u64,
    pub amap_last: u64,
    pub amap_free: u64,
    pub pmap_free: u64,
    pub node_btree: BlockRef,
    pub block_btree: BlockRef,
    pub amap_status: AmapStatus,
}

impl Root {
    pub fn pack(&self) -> Vec<u8> {
        let mut root = Vec::with_capacity(ROOT_SIZE);
        root.extend_from_slice(&0_u32.to_le_bytes());
        root.extend_from_slice(&self.file_eof.to_le_bytes());
        root.extend_from_slice(&self.amap_last.to_le_bytes());
        root.extend_from_slice(&self.amap_free.to_le_bytes());
        root.extend_from_slice(&self.pmap_free.to_le_bytes());
        self.node_btree.pack_into(&mut root);
        self.block_btree.pack_into(&mut root);
        root.push(self.amap_status as u8);
        root.push(0);
        root.extend_from_slice(&0_u16.to_le_bytes());
        debug_assert_eq!(root.len(), ROOT_SIZE);
        root
    }
}

/// Build the complete 564-byte Unicode header. The two deprecated FM/FP maps
/// are filled with 0xFF and both CRCs are computed over the final contents.
pub fn build_header(
    root: &Root,
    bid_next_page: u64,
    bid_next_block: u64,
    unique: u32,
    crypt_method: NdbCryptMethod,
) -> Vec<u8> {
    let mut buf = vec![0_u8; HEADER_SIZE];

    buf[0x00..0x04].copy_from_slice(HEADER_MAGIC);
    // dwCRCPartial at 0x04 is filled below.
    buf[0x08..0x0A].copy_from_slice(HEADER_MAGIC_CLIENT);
    buf[0x0A..0x0C].copy_from_slice(&NDB_VERSION_UNICODE.to_le_bytes());
    buf[0x0C..0x0E].copy_from_slice(&NDB_CLIENT_VERSION.to_le_bytes());
    buf[0x0E] = NDB_PLATFORM_CREATE;
    buf[0x0F] = NDB_PLATFORM_ACCESS;
    // dwReserved1/dwReserved2 at 0x10/0x14, bidUnused at 0x18: zero.

    buf[0x20..0x28].copy_from_slice(&bid_next_page.to_le_bytes());
    buf[0x28..0x2C].copy_from_slice(&unique.to_le_bytes());
    // rgnid[32] at 0x2C: NID allocation counters, zero — the writer assigns
    // NIDs itself. qwUnused at 0xAC: zero.

    buf[0xB4..0xB4 + ROOT_SIZE].copy_from_slice(&root.pack());
    // dwAlign at 0xFC: zero.

    // rgbFM / rgbFP: deprecated maps, all 0xFF.
    buf[0x100..0x180].fill(0xFF);
    buf[0x180..0x200].fill(0xFF);

    buf[0x200] = NDB_SENTINEL;
    buf[0x201] = crypt_method as u8;
    // rgbReserved at 0x202: zero.
    buf[0x204..0x20C].copy_from_slice(&bid_next_block.to_le_bytes());

    let crc_partial = compute_crc(0, &buf[0x08..0x08 + CRC_PARTIAL_LEN]);
    buf[0x04..0x08].copy_from_slice(&crc_partial.to_le_bytes());

    let crc_full = compute_crc(0, &buf[0x08..0x08 + CRC_FULL_LEN]);
    buf[0x20C..0x210].copy_from_slice(&crc_full.to_le_bytes());

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> Root {
        Root {
            file_eof: 0x8000,
            amap_last: FIRST_AMAP_OFFSET,
            amap_free: 0x1000,
            pmap_free: 0,
            node_btree: BlockRef { block: BlockId::from(5), index: 0x7000 },
            block_btree: BlockRef { block: BlockId::from(7), index: 0x7200 },
            amap_status: AmapStatus::Valid2,
        }
    }

    #[test]
    fn test_root_layout() {
        let root = sample_root().pack();
        assert_eq!(root.len(), ROOT_SIZE);
        assert_eq!(u64::from_le_bytes(root[4..12].try_into().unwrap()), 0x8000);
        assert_eq!(u64::from_le_bytes(root[36..44].try_into().unwrap()), 5);
        assert_eq!(u64::from_le_bytes(root[44..52].try_into().unwrap()), 0x7000);
        assert_eq!(root[68], AmapStatus::Valid2 as u8);
    }

    #[test]
    fn test_header_crcs_verify() {
        let header = build_header(&sample_root(), 9, 16, 1, NdbCryptMethod::None);
        assert_eq!(header.len(), HEADER_SIZE);
        assert_eq!(&header[..4], HEADER_MAGIC);

        let crc_partial = u32::from_le_bytes(header[0x04..0x08].try_into().unwrap());
        assert_eq!(crc_partial, compute_crc(0, &header[0x08..0x08 + CRC_PARTIAL_LEN]));

        let crc_full = u32::from_le_bytes(header[0x20C..0x210].try_into().unwrap());
        assert_eq!(crc_full, compute_crc(0, &header[0x08..0x08 + CRC_FULL_LEN]));
    }

    #[test]
    fn test_header_fixed_fields() {
        let header = build_header(&sample_root(), 9, 16, 1, NdbCryptMethod::None);
        assert_eq!(u16::from_le_bytes(header[0x0A..0x0C].try_into().unwrap()), 23);
        assert_eq!(u16::from_le_bytes(header[0x0C..0x0E].try_into().unwrap()), 19);
        assert_eq!(header[0x200], NDB_SENTINEL);
        assert!(header[0x100..0x200].iter().all(|&b| b == 0xFF));
        assert_eq!(u64::from_le_bytes(header[0x20..0x28].try_into().unwrap()), 9);
        assert_eq!(u64::from_le_bytes(header[0x204..0x20C].try_into().unwrap()), 16);
    }
}
