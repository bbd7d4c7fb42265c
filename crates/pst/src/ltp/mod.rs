//! ## [Lists, Tables, and Properties (LTP) Layer](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/4c24c7d2-5c5a-4b99-88b2-f4b84cc293ae)

use std::io;
use thiserror::Error;

pub mod bth;
pub mod heap;
pub mod prop_context;
pub mod prop_type;
pub mod table_context;

#[derive(Error, Debug)]
pub enum LtpError {
    #[error("Node Database error: {0}")]
    NodeDatabaseError(#[from] crate::ndb::NdbError),
    #[error("Invalid HID hidIndex: 0x{0:04X}")]
    InvalidHeapIndex(u16),
    #[error("Heap allocation too large: {0} bytes")]
    HeapAllocationTooLarge(usize),
    #[error("Invalid wPropType: 0x{0:04X}")]
    InvalidPropertyType(u16),
    #[error("Property tag 0x{0:08X} does not match value type {1:?}")]
    PropertyTagTypeMismatch(u32, crate::ltp::prop_type::PropertyType),
    #[error("Duplicate sub-node NID for property 0x{0:04X}")]
    DuplicateSubnodeProperty(u16),
}

impl From<LtpError> for io::Error {
    fn from(err: LtpError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

pub type LtpResult<T> = Result<T, LtpError>;
