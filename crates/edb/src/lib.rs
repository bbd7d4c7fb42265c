//! # edb-extract
//!
//! Recovers mail objects from Microsoft Exchange mailbox databases (ESE/EDB
//! format): per-row message extraction with LZXPRESS and property-blob
//! decoding, folder-hierarchy resolution, attachment linkage, and exporters
//! to EML/ICS/VCF files or a Unicode PST (via [`edb_pst`]).
//!
//! The ESE page layer itself is out of scope: callers supply any reader that
//! implements the [`ese`] traits, which mirror the minimal
//! tables/columns/records/long-values surface of common ESE libraries.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod ese;
pub mod export;
pub mod extractor;
pub mod filetime;
pub mod folders;
pub mod lzxpress;
pub mod mailbox;
pub mod message;
pub mod propblob;

pub use extractor::{ExtractorConfig, MessageExtractor};
pub use message::{MailAttachment, MailMessage, Recipient, RecipientKind};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Required table missing: {0}")]
    MissingTable(String),
    #[error("Required column missing: {table}.{column}")]
    MissingColumn { table: String, column: String },
    #[error("Mailbox {0} not found")]
    MailboxNotFound(u32),
    #[error("PST synthesis error: {0}")]
    PstError(#[from] edb_pst::PstError),
}

impl From<ExtractError> for io::Error {
    fn from(err: ExtractError) -> io::Error {
        match err {
            ExtractError::Io { source, .. } => source,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
