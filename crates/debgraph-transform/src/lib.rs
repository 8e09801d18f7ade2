//! Debgraph transformation engine
//!
//! Turns flat directory and archive records into graph collections:
//! - LDAP groups, developers and servers -> node collections
//! - GPG fingerprints and SSH host keys -> derived key collections
//! - Package listing -> packages + "built from" edges
//! - DM permission ledger -> permission edges only
//!
//! Every edge lands in one run-scoped [`Relations`] map, deduplicated by
//! `(from, to, kind)`. The engine does no I/O of its own: records come in
//! through a [`SourceLoader`] and collections go out through a [`GraphSink`].

pub mod config;
pub mod error;
pub mod graph;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod transformers;

pub use config::{PipelineConfig, SourceNames};
pub use error::{PipelineError, TransformError};
pub use graph::{merge, Node, NodeCollection, NodeRef, Relation, RelationId, Relations};
pub use output::{GraphSnapshot, OutputFlavor};
pub use pipeline::{
    GraphSink, Pipeline, PipelineRun, PipelineState, RunReport, SourceLoader, Stage, StageReport,
};
pub use record::RawRecord;
pub use transformers::{TransformOutput, Transformer};

/// Node collection names, as written to the graph database.
pub mod collections {
    pub const GROUPS: &str = "groups";
    pub const DEVELOPERS: &str = "developers";
    pub const SERVERS: &str = "servers";
    pub const GPG_KEYS: &str = "gpg_keys";
    pub const SSH_KEYS: &str = "ssh_keys";
    pub const PACKAGES: &str = "packages";
    /// The single edge collection.
    pub const RELATIONS: &str = "relations";
}

/// Relation kind labels.
pub mod kinds {
    pub const MEMBER_OF: &str = "Member of";
    pub const HAS_ACCESS_TO: &str = "Has access to";
    pub const OWNS_KEY: &str = "Owns key";
    pub const BUILT_FROM: &str = "Built from";
    pub const HAS_DM_PERMISSION: &str = "Has DM permission";
    pub const GIVE_DM_PERMISSION: &str = "Give DM permission";
}
