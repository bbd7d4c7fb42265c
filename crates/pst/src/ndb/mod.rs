//! ## [Node Database (NDB) Layer](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/e4efaad0-1876-446e-9d34-bb921588f924)

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NdbError {
    #[error("Invalid nidType: 0x{0:02X}")]
    InvalidNodeIdType(u8),
    #[error("Invalid nidIndex: 0x{0:08X}")]
    InvalidNodeIndex(u32),
    #[error("Block data too large: {0} bytes")]
    BlockTooLarge(usize),
    #[error("Sub-node value too large: {0} bytes")]
    SubnodeValueTooLarge(u64),
    #[error("Duplicate NID in NBT: 0x{0:X}")]
    DuplicateNodeId(u64),
    #[error("BTree key inversion: 0x{0:X} >= 0x{1:X}")]
    BTreeKeyInversion(u64, u64),
}

impl From<NdbError> for io::Error {
    fn from(err: NdbError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

pub type NdbResult<T> = Result<T, NdbError>;

pub mod amap;
pub mod block;
pub mod block_id;
pub mod btree;
pub mod header;
pub mod node_id;

pub use amap::*;
pub use block::*;
pub use block_id::*;
pub use btree::*;
pub use header::*;
pub use node_id::*;
