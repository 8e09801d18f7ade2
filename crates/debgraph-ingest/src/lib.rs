//! Offline acquisition parsers for Debgraph
//!
//! Turns the text formats the pipeline is fed from into flat records:
//! - `dm.txt` (DM permission ledger) -> `{fingerprint, uid, allow: [...]}`
//! - dpkg `available` (RFC822-style stanzas) -> one record per package
//!
//! Directory dumps need no parser here: they are already JSON arrays of
//! records. Fetching (LDAP, HTTP) happens outside this workspace.

pub mod control;
pub mod dm;

pub use control::{parse_available, LIST_FIELDS};
pub use dm::parse_dm_permissions;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl IngestError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        IngestError::Malformed {
            line,
            message: message.into(),
        }
    }
}
