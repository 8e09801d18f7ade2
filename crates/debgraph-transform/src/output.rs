//! Collection rendering.
//!
//! Collections serialize as JSON arrays. The `arango` flavor renames the
//! identity fields to the ones `arangoimport` expects.

use crate::graph::{NodeCollection, Relations};
use crate::pipeline::GraphSink;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFlavor {
    /// `key`, `from`, `to`
    #[default]
    Plain,
    /// `_key`, `_from`, `_to`
    Arango,
}

impl OutputFlavor {
    fn rename(self, mut document: Value) -> Value {
        if self == OutputFlavor::Plain {
            return document;
        }
        if let Value::Object(map) = &mut document {
            for field in ["key", "from", "to"] {
                if let Some(value) = map.remove(field) {
                    map.insert(format!("_{field}"), value);
                }
            }
        }
        document
    }

    pub fn render_nodes(self, nodes: &NodeCollection) -> serde_json::Result<Value> {
        let mut documents = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            documents.push(self.rename(serde_json::to_value(node)?));
        }
        Ok(Value::Array(documents))
    }

    pub fn render_relations(self, relations: &Relations) -> serde_json::Result<Value> {
        let mut documents = Vec::with_capacity(relations.len());
        for relation in relations.iter() {
            documents.push(self.rename(serde_json::to_value(relation)?));
        }
        Ok(Value::Array(documents))
    }
}

/// In-memory [`GraphSink`]: keeps the last emitted copy of each collection.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub collections: BTreeMap<String, NodeCollection>,
    /// `None` until the run reaches `Done`.
    pub relations: Option<Relations>,
}

impl GraphSnapshot {
    pub fn collection(&self, name: &str) -> Option<&NodeCollection> {
        self.collections.get(name)
    }

    /// Render every collection, keyed by collection name.
    pub fn render(&self, flavor: OutputFlavor) -> serde_json::Result<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        for (name, nodes) in &self.collections {
            out.insert(name.clone(), flavor.render_nodes(nodes)?);
        }
        if let Some(relations) = &self.relations {
            out.insert(
                crate::collections::RELATIONS.to_string(),
                flavor.render_relations(relations)?,
            );
        }
        Ok(out)
    }
}

impl GraphSink for GraphSnapshot {
    fn emit_nodes(&mut self, nodes: &NodeCollection) -> anyhow::Result<()> {
        self.collections.insert(nodes.name().to_string(), nodes.clone());
        Ok(())
    }

    fn emit_relations(&mut self, relations: &Relations) -> anyhow::Result<()> {
        self.relations = Some(relations.clone());
        Ok(())
    }
}
