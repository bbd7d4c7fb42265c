//! ## [Data Types](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/1d61ee78-4466-4141-8276-f45153484619)

use super::*;

/// [Property Data Types](https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/MS-OXCDATA/0c77892e-288e-435a-9c49-be1c20c7afdb)
/// written by this crate.
#[repr(u16)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PropertyType {
    /// `PtypInteger16`: 2 bytes; a 16-bit integer
    Integer16 = 0x0002,
    /// `PtypInteger32`: 4 bytes; a 32-bit integer
    Integer32 = 0x0003,
    /// `PtypBoolean`: restricted to 1 or 0, stored in a 4-byte slot
    Boolean = 0x000B,
    /// `PtypInteger64`: 8 bytes; a 64-bit integer
    Integer64 = 0x0014,
    /// `PtypString8`: Variable size; a multibyte-character string
    String8 = 0x001E,
    /// `PtypString`: Variable size; a UTF-16LE string
    Unicode = 0x001F,
    /// `PtypTime`: 8 bytes; 100-nanosecond intervals since January 1, 1601
    Time = 0x0040,
    /// `PtypGuid`: 16 bytes; a GUID with little-endian fields
    Guid = 0x0048,
    /// `PtypBinary`: Variable size
    Binary = 0x0102,
}

impl TryFrom<u16> for PropertyType {
    type Error = LtpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0002 => Ok(Self::Integer16),
            0x0003 => Ok(Self::Integer32),
            0x000B => Ok(Self::Boolean),
            0x0014 => Ok(Self::Integer64),
            0x001E => Ok(Self::String8),
            0x001F => Ok(Self::Unicode),
            0x0040 => Ok(Self::Time),
            0x0048 => Ok(Self::Guid),
            0x0102 => Ok(Self::Binary),
            invalid => Err(LtpError::InvalidPropertyType(invalid)),
        }
    }
}

impl From<PropertyType> for u16 {
    fn from(value: PropertyType) -> Self {
        value as u16
    }
}

/// A typed MAPI property value. Each [`PropertyType`] this crate writes maps
/// to exactly one variant.
#[derive(Clone, PartialEq, Debug)]
pub enum PropertyValue {
    Integer16(i16),
    Integer32(i32),
    Boolean(bool),
    Integer64(i64),
    /// A raw FILETIME.
    Time(u64),
    Guid([u8; 16]),
    String8(String),
    Unicode(String),
    Binary(Vec<u8>),
}

impl PropertyValue {
    pub fn prop_type(&self) -> PropertyType {
        match self {
            Self::Integer16(_) => PropertyType::Integer16,
            Self::Integer32(_) => PropertyType::Integer32,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Integer64(_) => PropertyType::Integer64,
            Self::Time(_) => PropertyType::Time,
            Self::Guid(_) => PropertyType::Guid,
            Self::String8(_) => PropertyType::String8,
            Self::Unicode(_) => PropertyType::Unicode,
            Self::Binary(_) => PropertyType::Binary,
        }
    }

    /// The 4-byte inline representation, for fixed values that fit the PC
    /// entry's data dword.
    pub fn inline_dword(&self) -> Option<u32> {
        match self {
            Self::Integer16(value) => Some(u32::from(*value as u16)),
            Self::Integer32(value) => Some(*value as u32),
            Self::Boolean(value) => Some(u32::from(*value)),
            _ => None,
        }
    }

    /// The heap representation of a fixed-size value wider than 4 bytes.
    pub fn fixed_heap_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Integer64(value) => Some(value.to_le_bytes().to_vec()),
            Self::Time(value) => Some(value.to_le_bytes().to_vec()),
            Self::Guid(value) => Some(value.to_vec()),
            _ => None,
        }
    }

    /// Encode a variable-size value: UTF-16LE without a trailing NUL for
    /// Unicode, UTF-8 for String8, raw bytes for Binary.
    pub fn variable_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::String8(value) => Some(value.as_bytes().to_vec()),
            Self::Unicode(value) => Some(
                value
                    .encode_utf16()
                    .flat_map(|unit| unit.to_le_bytes())
                    .collect(),
            ),
            Self::Binary(value) => Some(value.clone()),
            _ => None,
        }
    }

}

/// Column width for a property type inside a TC row.
pub fn column_size(prop_type: PropertyType) -> usize {
    match prop_type {
        PropertyType::Integer16 => 2,
        PropertyType::Integer32 | PropertyType::Boolean => 4,
        PropertyType::Integer64 | PropertyType::Time => 8,
        PropertyType::Guid => 16,
        PropertyType::String8 | PropertyType::Unicode | PropertyType::Binary => 4,
    }
}

pub fn is_fixed(prop_type: PropertyType) -> bool {
    !matches!(
        prop_type,
        PropertyType::String8 | PropertyType::Unicode | PropertyType::Binary
    )
}
