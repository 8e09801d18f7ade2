use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, NodeRef, Relation, Relations};
use crate::keys::first_token;
use crate::kinds;
use crate::record::RawRecord;

const ENTITY: &str = "developer";

/// `true` when the first `accountStatus` value contains any of `markers`.
///
/// Substring match: `"inactive 2019-03-01"` is as excluded as `"inactive"`.
pub fn is_excluded_status(record: &RawRecord, markers: &[String]) -> bool {
    let Some(status) = record.first_str("accountStatus") else {
        return false;
    };
    markers.iter().any(|marker| status.contains(marker.as_str()))
}

/// LDAP `debianDeveloper` -> `developers`, plus membership, host access and
/// key ownership edges.
#[derive(Debug, Clone)]
pub struct DeveloperTransformer {
    excluded_statuses: Vec<String>,
}

impl DeveloperTransformer {
    pub fn new(excluded_statuses: Vec<String>) -> Self {
        Self { excluded_statuses }
    }
}

impl Transformer for DeveloperTransformer {
    fn name(&self) -> &'static str {
        "developers"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::DEVELOPERS);
        let mut relations = Relations::new();
        let mut skipped = 0usize;

        for (index, record) in records.iter().enumerate() {
            if is_excluded_status(record, &self.excluded_statuses) {
                skipped += 1;
                continue;
            }

            let uid = record.require_first_str(ENTITY, index, "uid")?;
            let uid_number = record.require_first(ENTITY, index, "uidNumber")?.clone();
            let cn = record.require_first_str(ENTITY, index, "cn")?;
            let name = match record.first_str("sn") {
                Some(sn) if !sn.is_empty() => format!("{cn} {sn}"),
                _ => cn,
            };

            let mut developer = Node::new(uid.clone(), name);
            developer.set("uid_number", uid_number);
            developer.copy_first(record, "gidNumber", "gid_number");
            developer.copy_first(record, "ircNick", "irc_nick");
            developer.copy_first(record, "labeledURI", "website");
            developer.copy_first(record, "c", "country");
            developer.copy_first(record, "l", "locality");
            developer.copy_first(record, "loginShell", "login_shell");
            developer.copy_first(record, "jabberJID", "jabber");
            developer.copy_first(record, "accountStatus", "status");
            developer.copy_all(record, "keyFingerPrint", "fingerprints");
            developer.copy_all(record, "supplementaryGid", "groups");

            let me = nodes.node_ref(uid);

            for gid in record.strings("supplementaryGid") {
                let group = NodeRef::new(collections::GROUPS, gid);
                relations.insert(Relation::new(&me, &group, kinds::MEMBER_OF));
            }

            for allowed in record.strings("allowedHost") {
                let Some(host) = first_token(&allowed) else {
                    continue;
                };
                let server = NodeRef::new(collections::SERVERS, host);
                relations.insert(Relation::new(&me, &server, kinds::HAS_ACCESS_TO));
            }

            for fingerprint in record.strings("keyFingerPrint") {
                let key = NodeRef::new(collections::GPG_KEYS, fingerprint);
                relations.insert(Relation::new(&me, &key, kinds::OWNS_KEY));
            }

            nodes.insert(developer);
        }

        tracing::debug!(
            developers = nodes.len(),
            excluded = skipped,
            relations = relations.len(),
            "transformed developer records"
        );

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::graph::RelationId;
    use serde_json::json;

    fn transformer() -> DeveloperTransformer {
        DeveloperTransformer::new(PipelineConfig::default().excluded_statuses)
    }

    fn developer(uid: &str) -> RawRecord {
        RawRecord::new()
            .with("uid", json!([uid]))
            .with("uidNumber", json!([2001]))
            .with("cn", json!(["Jane"]))
            .with("sn", json!(["Doe"]))
    }

    #[test]
    fn builds_node_and_relations() {
        let record = developer("jdoe")
            .with("ircNick", json!(["jd"]))
            .with("supplementaryGid", json!(["Debian", "adm"]))
            .with("allowedHost", json!(["ries.debian.org needed for ftp work"]))
            .with("keyFingerPrint", json!(["0123ABCD"]));

        let out = transformer().transform(&[record]).unwrap();
        let nodes = out.nodes.unwrap();
        let jdoe = nodes.get("jdoe").unwrap();

        assert_eq!(jdoe.name, "Jane Doe");
        assert_eq!(jdoe.get("uid_number"), Some(&json!(2001)));
        assert_eq!(jdoe.get("irc_nick"), Some(&json!("jd")));
        assert_eq!(jdoe.get("groups"), Some(&json!(["Debian", "adm"])));
        assert!(jdoe.get("website").is_none());

        let me = NodeRef::new("developers", "jdoe");
        assert_eq!(out.relations.len(), 4);
        assert!(out.relations.contains(&RelationId::new(
            &me,
            &NodeRef::new("groups", "adm"),
            kinds::MEMBER_OF
        )));
        assert!(out.relations.contains(&RelationId::new(
            &me,
            &NodeRef::new("servers", "ries.debian.org"),
            kinds::HAS_ACCESS_TO
        )));
        assert!(out.relations.contains(&RelationId::new(
            &me,
            &NodeRef::new("gpg_keys", "0123ABCD"),
            kinds::OWNS_KEY
        )));
    }

    #[test]
    fn excluded_statuses_drop_node_and_relations() {
        let records = vec![
            developer("gone").with("accountStatus", json!(["memorial 2020-01-01"])),
            developer("old")
                .with("accountStatus", json!(["inactive (see note)"]))
                .with("supplementaryGid", json!(["Debian"])),
            developer("leaving").with("accountStatus", json!(["retiring"])),
            developer("here").with("accountStatus", json!(["active"])),
        ];

        let out = transformer().transform(&records).unwrap();
        let nodes = out.nodes.unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains("here"));
        assert!(out.relations.is_empty());
    }

    #[test]
    fn name_falls_back_to_cn() {
        let record = RawRecord::new()
            .with("uid", json!(["solo"]))
            .with("uidNumber", json!([3000]))
            .with("cn", json!(["Solo"]));
        let out = transformer().transform(&[record]).unwrap();
        assert_eq!(out.nodes.unwrap().get("solo").unwrap().name, "Solo");
    }

    #[test]
    fn missing_uid_is_fatal() {
        let record = RawRecord::new().with("cn", json!(["Nobody"]));
        let err = transformer().transform(&[record]).unwrap_err();
        assert!(err.to_string().contains("`uid`"));
    }
}
