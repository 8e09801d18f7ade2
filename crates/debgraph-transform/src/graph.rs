//! Graph model: node collections and the deduplicated relation map.

use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Nodes
// ============================================================================

/// A node record: collection-unique `key`, display `name`, optional attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Node {
    /// Field names a serialized node already uses for its identity, in
    /// either output flavor. Open-ended attributes must not take them.
    pub const RESERVED_FIELDS: &'static [&'static str] =
        &["key", "name", "_key", "_id", "_rev", "_from", "_to", "from", "to"];

    pub fn is_reserved(field: &str) -> bool {
        Self::RESERVED_FIELDS.contains(&field)
    }

    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// A node whose display name is its key.
    pub fn keyed(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(key.clone(), key)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Copy the first value of `attribute` into `field`, if present.
    pub fn copy_first(&mut self, record: &RawRecord, attribute: &str, field: &str) {
        if let Some(value) = record.first(attribute) {
            self.set(field, value.clone());
        }
    }

    /// Copy every value of `attribute` into `field` as a list, if present.
    pub fn copy_all(&mut self, record: &RawRecord, attribute: &str, field: &str) {
        let values = record.values(attribute);
        if !values.is_empty() {
            self.set(
                field,
                Value::Array(values.into_iter().cloned().collect::<Vec<_>>()),
            );
        }
    }
}

/// Key-unique set of nodes of one kind. Later inserts overwrite earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCollection {
    name: String,
    nodes: BTreeMap<String, Node>,
}

impl NodeCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert `node`, returning the node it replaced.
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.key.clone(), node)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Overwrite-merge `other` into `self`.
    pub fn extend(&mut self, other: NodeCollection) {
        self.nodes.extend(other.nodes);
    }

    /// Reference to the node stored under `key` in this collection.
    pub fn node_ref(&self, key: impl Into<String>) -> NodeRef {
        NodeRef::new(self.name.clone(), key)
    }
}

// ============================================================================
// Relations
// ============================================================================

/// Collection-qualified node reference, rendered `collection/key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub collection: String,
    pub key: String,
}

impl NodeRef {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

/// Directed, typed edge. Endpoints are not checked against node collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub kind: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Relation {
    pub fn new(from: &NodeRef, to: &NodeRef, kind: impl Into<String>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            kind: kind.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    pub fn id(&self) -> RelationId {
        RelationId {
            from: self.from.clone(),
            to: self.to.clone(),
            kind: self.kind.clone(),
        }
    }
}

/// Run-wide relation identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId {
    pub from: String,
    pub to: String,
    pub kind: String,
}

impl RelationId {
    pub fn new(from: &NodeRef, to: &NodeRef, kind: impl Into<String>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            kind: kind.into(),
        }
    }
}

/// Deduplicated relation map. Inserting an existing identity replaces the
/// whole stored relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relations {
    edges: BTreeMap<RelationId, Relation>,
}

impl Relations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: Relation) -> Option<Relation> {
        self.edges.insert(relation.id(), relation)
    }

    pub fn get(&self, id: &RelationId) -> Option<&Relation> {
        self.edges.get(id)
    }

    pub fn contains(&self, id: &RelationId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Relations in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.edges.values()
    }

    /// Absorb `contributed`: absent identities are added, colliding ones are
    /// replaced by the contributed relation.
    pub fn merge(&mut self, contributed: Relations) {
        self.edges.extend(contributed.edges);
    }
}

impl FromIterator<Relation> for Relations {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        let mut relations = Relations::new();
        for relation in iter {
            relations.insert(relation);
        }
        relations
    }
}

/// `merge(accumulated, contributed)`: key set is the union, a colliding key
/// carries the contributed value.
pub fn merge(mut accumulated: Relations, contributed: Relations) -> Relations {
    accumulated.merge(contributed);
    accumulated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edge(from: &str, to: &str, kind: &str) -> Relation {
        Relation::new(
            &NodeRef::new("developers", from),
            &NodeRef::new("groups", to),
            kind,
        )
    }

    #[test]
    fn node_ref_renders_collection_and_key() {
        assert_eq!(NodeRef::new("servers", "ries").to_string(), "servers/ries");
    }

    #[test]
    fn later_node_overwrites_earlier() {
        let mut nodes = NodeCollection::new("packages");
        nodes.insert(Node::keyed("bash"));
        let mut full = Node::keyed("bash");
        full.set("version", "5.2");
        let replaced = nodes.insert(full);

        assert!(replaced.is_some());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.get("bash").unwrap().get("version"), Some(&json!("5.2")));
    }

    #[test]
    fn copy_helpers_skip_absent_attributes() {
        let record = RawRecord::new()
            .with("description", json!(["Debian admins"]))
            .with("purpose", json!(["buildd", "porterbox"]));
        let mut node = Node::keyed("adm");
        node.copy_first(&record, "description", "description");
        node.copy_all(&record, "purpose", "purpose");
        node.copy_first(&record, "memory", "memory");

        assert_eq!(node.get("description"), Some(&json!("Debian admins")));
        assert_eq!(node.get("purpose"), Some(&json!(["buildd", "porterbox"])));
        assert!(node.get("memory").is_none());
    }

    #[test]
    fn same_identity_collapses_to_one_relation() {
        let relations: Relations = vec![
            edge("jdoe", "adm", "Member of"),
            edge("jdoe", "adm", "Member of"),
        ]
        .into_iter()
        .collect();
        assert_eq!(relations.len(), 1);
    }

    #[test]
    fn kind_is_part_of_the_identity() {
        let relations: Relations = vec![
            edge("jdoe", "adm", "Member of"),
            edge("jdoe", "adm", "Has access to"),
        ]
        .into_iter()
        .collect();
        assert_eq!(relations.len(), 2);
    }

    #[test]
    fn merge_replaces_whole_record_on_collision() {
        let accumulated: Relations = vec![edge("a", "g", "Member of").with("note", "old")]
            .into_iter()
            .collect();
        let contributed: Relations = vec![edge("a", "g", "Member of").with("since", 2020)]
            .into_iter()
            .collect();

        let merged = merge(accumulated, contributed);
        let stored = merged
            .get(&edge("a", "g", "Member of").id())
            .expect("relation present");
        assert_eq!(stored.attributes.get("since"), Some(&json!(2020)));
        assert!(stored.attributes.get("note").is_none());
    }

    #[test]
    fn relation_serializes_flat() {
        let relation = Relation::new(
            &NodeRef::new("packages", "bar"),
            &NodeRef::new("packages", "foo"),
            "Built from",
        )
        .with("version", "1.2-3");
        assert_eq!(
            serde_json::to_value(&relation).unwrap(),
            json!({
                "from": "packages/bar",
                "to": "packages/foo",
                "kind": "Built from",
                "version": "1.2-3"
            })
        );
    }
}
