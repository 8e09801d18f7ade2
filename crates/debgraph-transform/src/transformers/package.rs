use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, Relation, Relations};
use crate::keys::split_source;
use crate::kinds;
use crate::record::RawRecord;

const ENTITY: &str = "package";

/// dpkg `available` stanzas -> `packages`, plus "built from" edges.
///
/// A package naming a `source` registers that source package as a bare stub
/// in the same collection. Stubs and full definitions share keys, so
/// whichever is inserted last is kept: a full stanza read after the stub
/// replaces it, a stub inferred after the full stanza replaces the stanza.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageTransformer;

impl Transformer for PackageTransformer {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::PACKAGES);
        let mut relations = Relations::new();

        for (index, record) in records.iter().enumerate() {
            let name = record.require_first_str(ENTITY, index, "package")?;

            let mut package = Node::keyed(name.clone());
            for (attribute, value) in record.attributes() {
                let field = attribute.to_lowercase();
                if field == "package" {
                    continue;
                }
                if Node::is_reserved(&field) {
                    tracing::debug!(
                        package = %name,
                        field = %field,
                        "dropping reserved stanza field"
                    );
                    continue;
                }
                package.set(field, value.clone());
            }

            // Stub first, so a self-sourced package keeps its own stanza.
            if let Some(source) = record.first_str("source") {
                let split = split_source(&source);
                nodes.insert(Node::keyed(split.name.clone()));

                if split.name != name {
                    let mut built_from = Relation::new(
                        &nodes.node_ref(name.as_str()),
                        &nodes.node_ref(split.name),
                        kinds::BUILT_FROM,
                    );
                    if let Some(version) = split.version {
                        built_from = built_from.with("version", version);
                    }
                    relations.insert(built_from);
                }
            }

            nodes.insert(package);
        }

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations,
        })
    }
}
