//! # edb-pst
//!
//! A write-only implementation of the
//! [Unicode PST file format](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/6b57253b-0853-47bb-99bb-d4b8f78105f0):
//! the NDB layer (blocks, B-trees, allocation maps, header), the LTP layer
//! (heaps, property and table contexts), and the messaging layer (store,
//! folders, messages, attachments), assembled by [`PstWriter`] into a file
//! that Outlook and `libpff` accept.
//!
//! ```no_run
//! use edb_pst::messaging::message::{MessageContent, RecipientContent, RecipientKind};
//! use edb_pst::PstWriter;
//!
//! # fn main() -> std::io::Result<()> {
//! let mut pst = PstWriter::new("Recovered Mailbox");
//! let inbox = pst.add_folder("Inbox", None)?;
//! pst.add_message(
//!     inbox,
//!     &MessageContent {
//!         subject: "Hello".into(),
//!         body_text: "World".into(),
//!         sender_email: "alice@example.com".into(),
//!         recipients: vec![RecipientContent {
//!             display_name: "Bob".into(),
//!             email: "bob@example.com".into(),
//!             kind: RecipientKind::To,
//!         }],
//!         ..Default::default()
//!     },
//! )?;
//! pst.write("recovered.pst")?;
//! # Ok(())
//! # }
//! ```

use std::io;
use thiserror::Error;

pub mod ltp;
pub mod messaging;
pub mod ndb;
pub mod writer;

mod block_sig;
mod crc;

pub use block_sig::compute_sig;
pub use crc::compute_crc;
pub use writer::PstWriter;

#[derive(Error, Debug)]
pub enum PstError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Node Database error: {0}")]
    NodeDatabaseError(#[from] ndb::NdbError),
    #[error("Lists, Tables, Properties error: {0}")]
    ListsTablesPropertiesError(#[from] ltp::LtpError),
    #[error("Messaging error: {0}")]
    MessagingError(#[from] messaging::MessagingError),
}

impl From<PstError> for io::Error {
    fn from(err: PstError) -> io::Error {
        match err {
            PstError::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

pub type PstResult<T> = Result<T, PstError>;
