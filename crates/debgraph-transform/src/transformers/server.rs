use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, NodeRef, Relation, Relations};
use crate::kinds;
use crate::record::RawRecord;

const ENTITY: &str = "server";

/// LDAP `debianServer` -> `servers`, plus group access edges (group -> host).
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerTransformer;

impl Transformer for ServerTransformer {
    fn name(&self) -> &'static str {
        "servers"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::SERVERS);
        let mut relations = Relations::new();

        for (index, record) in records.iter().enumerate() {
            let hostname = record.require_first_str(ENTITY, index, "hostname")?;

            let mut server = Node::keyed(hostname.clone());
            server.copy_first(record, "description", "description");
            server.copy_all(record, "purpose", "purpose");
            server.copy_first(record, "architecture", "architecture");
            server.copy_first(record, "machine", "machine");
            server.copy_first(record, "memory", "memory");
            server.copy_first(record, "disk", "disk");
            server.copy_first(record, "distribution", "distribution");
            server.copy_first(record, "access", "access");
            server.copy_first(record, "admin", "admin");
            server.copy_all(record, "sponsor", "sponsor");
            server.copy_first(record, "l", "locality");

            let host = nodes.node_ref(hostname);
            for gid in record.strings("allowedGroups") {
                let group = NodeRef::new(collections::GROUPS, gid);
                relations.insert(Relation::new(&group, &host, kinds::HAS_ACCESS_TO));
            }

            nodes.insert(server);
        }

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations,
        })
    }
}
