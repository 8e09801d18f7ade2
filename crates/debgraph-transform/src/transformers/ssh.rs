use super::{TransformOutput, Transformer};
use crate::collections;
use crate::error::TransformError;
use crate::graph::{Node, NodeCollection, NodeRef, Relation, Relations};
use crate::keys::content_hash_key;
use crate::kinds;
use crate::record::RawRecord;

const ENTITY: &str = "server";

/// Parsed `<kind> <material> <label> [comment]` host key line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SshKeyLine<'a> {
    pub kind: &'a str,
    pub material: &'a str,
    pub label: &'a str,
    pub comment: Option<&'a str>,
}

/// `None` for lines with fewer than three tokens.
pub(crate) fn parse_key_line(line: &str) -> Option<SshKeyLine<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    Some(SshKeyLine {
        kind: tokens[0],
        material: tokens[1],
        label: tokens[2],
        comment: tokens.get(3).copied(),
    })
}

/// Server `sshRSAHostKey` values -> `ssh_keys`, plus host ownership edges.
///
/// Keys are the SHA-256 of the key material token.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeyTransformer;

impl Transformer for SshKeyTransformer {
    fn name(&self) -> &'static str {
        "ssh_keys"
    }

    fn transform(&self, records: &[RawRecord]) -> Result<TransformOutput, TransformError> {
        let mut nodes = NodeCollection::new(collections::SSH_KEYS);
        let mut relations = Relations::new();

        for (index, record) in records.iter().enumerate() {
            let lines = record.strings("sshRSAHostKey");
            if lines.is_empty() {
                continue;
            }
            let hostname = record.require_first_str(ENTITY, index, "hostname")?;
            let host = NodeRef::new(collections::SERVERS, hostname.as_str());

            for line in &lines {
                let Some(parsed) = parse_key_line(line) else {
                    tracing::warn!(
                        host = %hostname,
                        line = %line,
                        "skipping malformed ssh host key"
                    );
                    continue;
                };

                let key = content_hash_key(parsed.material);
                let mut ssh_key = Node::new(key.clone(), parsed.label);
                ssh_key.set("kind", parsed.kind);
                ssh_key.set("fingerprint", parsed.material);
                if let Some(comment) = parsed.comment {
                    ssh_key.set("comment", comment);
                }

                relations.insert(Relation::new(&host, &nodes.node_ref(key), kinds::OWNS_KEY));
                nodes.insert(ssh_key);
            }
        }

        Ok(TransformOutput {
            nodes: Some(nodes),
            relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_key_lines() {
        assert_eq!(
            parse_key_line("ssh-rsa AAAAB3 ries.debian.org root@ries"),
            Some(SshKeyLine {
                kind: "ssh-rsa",
                material: "AAAAB3",
                label: "ries.debian.org",
                comment: Some("root@ries"),
            })
        );
        assert_eq!(parse_key_line("ssh-rsa AAAAB3").map(|l| l.kind), None);
    }

    #[test]
    fn hashes_material_and_links_host() {
        let record = RawRecord::new()
            .with("hostname", json!(["ries.debian.org"]))
            .with(
                "sshRSAHostKey",
                json!([
                    "ssh-rsa AAAAB3NzaC1yc2E ries.debian.org",
                    "ssh-ed25519 AAAAC3NzaC1lZDI1 ries.debian.org extra",
                    "broken-line",
                ]),
            );

        let out = SshKeyTransformer.transform(&[record]).unwrap();
        let nodes = out.nodes.unwrap();
        assert_eq!(nodes.len(), 2);

        let rsa_key = content_hash_key("AAAAB3NzaC1yc2E");
        let rsa = nodes.get(&rsa_key).unwrap();
        assert_eq!(rsa.name, "ries.debian.org");
        assert_eq!(rsa.get("kind"), Some(&json!("ssh-rsa")));
        assert_eq!(rsa.get("fingerprint"), Some(&json!("AAAAB3NzaC1yc2E")));
        assert!(rsa.get("comment").is_none());

        let ed = nodes.get(&content_hash_key("AAAAC3NzaC1lZDI1")).unwrap();
        assert_eq!(ed.get("comment"), Some(&json!("extra")));

        assert_eq!(out.relations.len(), 2);
        assert!(out
            .relations
            .iter()
            .all(|r| r.from == "servers/ries.debian.org" && r.kind == kinds::OWNS_KEY));
    }

    #[test]
    fn short_lines_emit_nothing() {
        let record = RawRecord::new()
            .with("hostname", json!(["x"]))
            .with("sshRSAHostKey", json!(["ssh-rsa AAAA"]));
        let out = SshKeyTransformer.transform(&[record]).unwrap();
        assert!(out.nodes.unwrap().is_empty());
        assert!(out.relations.is_empty());
    }
}
