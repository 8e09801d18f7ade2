use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{NodeRef, Relation, Relations};
use crate::kinds;
use crate::record::RawRecord;
use serde_json::Value;

const ENTITY: &str = "dm permission";

/// DM permission ledger -> permission edges only.
///
/// Each record is `{fingerprint, uid?, allow: [{name, giver}]}`. Every
/// allowance yields a grantee edge and a giver edge to the package.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmPermissionTransformer;

fn allowance_field(
    entry: &Value,
    index: usize,
    field: &str,
) -> Result<String, TransformError> {
    let Value::Object(map) = entry else {
        return Err(TransformError::InvalidValue {
            entity: ENTITY,
            index,
            attribute: "allow".to_string(),
            message: format!("entry must be an object, got {entry}"),
        });
    };
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TransformError::MissingField {
            entity: ENTITY,
            index,
            attribute: format!("allow.{field}"),
        })
}

impl Transformer for DmPermissionTransformer {
    fn name(&self) -> &'static str {
        "dm_permissions"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut relations = Relations::new();

        for (index, record) in records.iter().enumerate() {
            let fingerprint = record.require_first_str(ENTITY, index, "fingerprint")?;
            let grantee = NodeRef::new(collections::GPG_KEYS, fingerprint);

            for entry in record.values("allow") {
                let package = allowance_field(entry, index, "name")?;
                let giver = allowance_field(entry, index, "giver")?;

                let package = NodeRef::new(collections::PACKAGES, package);
                let giver = NodeRef::new(collections::GPG_KEYS, giver);
                relations.insert(Relation::new(&grantee, &package, kinds::HAS_DM_PERMISSION));
                relations.insert(Relation::new(&giver, &package, kinds::GIVE_DM_PERMISSION));
            }
        }

        Ok(TransformOutput {
            nodes: None,
            relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RelationId;
    use serde_json::json;

    #[test]
    fn one_allowance_yields_two_edges_and_no_nodes() {
        let record = RawRecord::new()
            .with("fingerprint", "F1")
            .with("allow", json!([{"name": "pkgA", "giver": "F2"}]));

        let out = DmPermissionTransformer.transform(&[record]).unwrap();
        assert!(out.nodes.is_none());
        assert_eq!(out.relations.len(), 2);

        let pkg = NodeRef::new("packages", "pkgA");
        assert!(out.relations.contains(&RelationId::new(
            &NodeRef::new("gpg_keys", "F1"),
            &pkg,
            "Has DM permission"
        )));
        assert!(out.relations.contains(&RelationId::new(
            &NodeRef::new("gpg_keys", "F2"),
            &pkg,
            "Give DM permission"
        )));
    }

    #[test]
    fn record_without_allowances_contributes_nothing() {
        let record = RawRecord::new().with("fingerprint", "F1").with("uid", "Jane");
        let out = DmPermissionTransformer.transform(&[record]).unwrap();
        assert!(out.relations.is_empty());
    }

    #[test]
    fn repeated_giver_collapses() {
        let record = RawRecord::new().with("fingerprint", "F1").with(
            "allow",
            json!([
                {"name": "pkgA", "giver": "F2"},
                {"name": "pkgA", "giver": "F2"},
                {"name": "pkgB", "giver": "F2"},
            ]),
        );
        let out = DmPermissionTransformer.transform(&[record]).unwrap();
        assert_eq!(out.relations.len(), 4);
    }

    #[test]
    fn malformed_allowances_are_fatal() {
        let not_an_object = RawRecord::new()
            .with("fingerprint", "F1")
            .with("allow", json!(["pkgA"]));
        assert!(matches!(
            DmPermissionTransformer.transform(&[not_an_object]),
            Err(TransformError::InvalidValue { .. })
        ));

        let no_giver = RawRecord::new()
            .with("fingerprint", "F1")
            .with("allow", json!([{"name": "pkgA"}]));
        assert!(matches!(
            DmPermissionTransformer.transform(&[no_giver]),
            Err(TransformError::MissingField { .. })
        ));
    }
}
