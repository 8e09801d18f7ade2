//! Record transformers, one per entity kind.
//!
//! A transformer maps a whole source collection to at most one node
//! collection plus a relation contribution. Mandatory attributes that are
//! missing abort the run; optional ones are copied only when present.

mod developer;
mod dm;
mod gpg;
mod group;
mod package;
mod server;
mod ssh;

pub use developer::{is_excluded_status, DeveloperTransformer};
pub use dm::DmPermissionTransformer;
pub use gpg::GpgKeyTransformer;
pub use group::GroupTransformer;
pub use package::PackageTransformer;
pub use server::ServerTransformer;
pub use ssh::SshKeyTransformer;

use crate::error::TransformError;
use crate::graph::{NodeCollection, Relations};
use crate::record::RawRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    /// `None` for relation-only transformers.
    pub nodes: Option<NodeCollection>,
    pub relations: Relations,
}

pub trait Transformer {
    /// Label used in logs and errors.
    fn name(&self) -> &'static str;

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError>;
}
