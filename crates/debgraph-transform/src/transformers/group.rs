use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, Relations};
use crate::record::RawRecord;

const ENTITY: &str = "group";

/// LDAP `debianGroup` -> `groups`.
///
/// The group name (`gid`) is the key since every other record refers to
/// groups by name rather than by number.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupTransformer;

impl Transformer for GroupTransformer {
    fn name(&self) -> &'static str {
        "groups"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::GROUPS);

        for (index, record) in records.iter().enumerate() {
            let gid = record.require_first_str(ENTITY, index, "gid")?;
            let gid_number = record.require_first(ENTITY, index, "gidNumber")?.clone();

            let mut group = Node::keyed(gid);
            group.set("gid", gid_number);
            group.copy_first(record, "description", "description");
            nodes.insert(group);
        }

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations: Relations::new(),
        })
    }
}
