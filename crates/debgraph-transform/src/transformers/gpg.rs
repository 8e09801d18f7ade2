use super::{is_excluded_status, TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, Relations};
use crate::record::RawRecord;
use serde_json::Value;

const ENTITY: &str = "developer";

/// Developer `keyFingerPrint` values -> `gpg_keys`.
///
/// Directory fingerprints are fixed-format hex, so they are used as keys
/// verbatim. Each distinct fingerprint yields one node whose `owner` lists
/// every account carrying it. Keys of excluded accounts are still emitted,
/// but those accounts are left out of `owner`.
#[derive(Debug, Clone, Default)]
pub struct GpgKeyTransformer {
    excluded_statuses: Vec<String>,
}

impl GpgKeyTransformer {
    pub fn new(excluded_statuses: Vec<String>) -> Self {
        Self { excluded_statuses }
    }
}

impl Transformer for GpgKeyTransformer {
    fn name(&self) -> &'static str {
        "gpg_keys"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::GPG_KEYS);

        for (index, record) in records.iter().enumerate() {
            let fingerprints = record.strings("keyFingerPrint");
            if fingerprints.is_empty() {
                continue;
            }
            let uid = record.require_first_str(ENTITY, index, "uid")?;
            let excluded = is_excluded_status(record, &self.excluded_statuses);

            for fingerprint in fingerprints {
                let mut owners = nodes
                    .get(&fingerprint)
                    .and_then(|existing| existing.get("owner"))
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let owner = Value::String(uid.clone());
                if !excluded && !owners.contains(&owner) {
                    owners.push(owner);
                }

                let mut key = Node::keyed(fingerprint);
                key.set("owner", Value::Array(owners));
                nodes.insert(key);
            }
        }

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations: Relations::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_node_per_distinct_fingerprint() {
        let records = vec![
            RawRecord::new()
                .with("uid", json!(["alice"]))
                .with("keyFingerPrint", json!(["AAAA", "BBBB"])),
            RawRecord::new()
                .with("uid", json!(["bob"]))
                .with("keyFingerPrint", json!(["BBBB"])),
            RawRecord::new().with("uid", json!(["carol"])),
        ];

        let out = GpgKeyTransformer::default().transform(&records).unwrap();
        let nodes = out.nodes.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.get("AAAA").unwrap().name, "AAAA");
        assert_eq!(
            nodes.get("BBBB").unwrap().get("owner"),
            Some(&json!(["alice", "bob"]))
        );
        assert!(out.relations.is_empty());
    }

    #[test]
    fn excluded_accounts_keep_keys_but_not_ownership() {
        let records = vec![
            RawRecord::new()
                .with("uid", json!(["alice"]))
                .with("keyFingerPrint", json!(["AAAA"])),
            RawRecord::new()
                .with("uid", json!(["gone"]))
                .with("accountStatus", json!(["memorial"]))
                .with("keyFingerPrint", json!(["AAAA", "CCCC"])),
        ];

        let transformer = GpgKeyTransformer::new(vec!["memorial".to_string()]);
        let nodes = transformer.transform(&records).unwrap().nodes.unwrap();
        assert_eq!(nodes.get("AAAA").unwrap().get("owner"), Some(&json!(["alice"])));
        assert_eq!(nodes.get("CCCC").unwrap().get("owner"), Some(&json!([])));
    }
}
