//! Directory-backed loader and sink.

use anyhow::{Context as _, Result};
use debgraph_transform::{
    GraphSink, NodeCollection, OutputFlavor, RawRecord, Relations, SourceLoader,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `<dir>/<source>.json`, a JSON array of records.
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SourceLoader for DirectoryLoader {
    fn load(&mut self, source: &str) -> Result<Vec<RawRecord>> {
        let path = self.dir.join(format!("{source}.json"));
        read_records(&path)
    }
}

pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_json(path: &Path, value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json(value, pretty)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn to_json(value: &impl serde::Serialize, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Writes `<dir>/<collection>.json` for every emitted collection.
pub struct DirectorySink {
    dir: PathBuf,
    flavor: OutputFlavor,
    pretty: bool,
    written: Vec<(String, usize)>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, flavor: OutputFlavor, pretty: bool) -> Self {
        Self {
            dir: dir.into(),
            flavor,
            pretty,
            written: Vec::new(),
        }
    }

    /// `(collection, documents)` in emission order.
    pub fn written(&self) -> &[(String, usize)] {
        &self.written
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn write(&mut self, collection: &str, documents: Value) -> Result<()> {
        let count = documents.as_array().map(Vec::len).unwrap_or(0);
        let path = self.path(collection);
        write_json(&path, &documents, self.pretty)?;
        tracing::debug!(collection, documents = count, path = %path.display(), "wrote collection");
        self.written.push((collection.to_string(), count));
        Ok(())
    }
}

impl GraphSink for DirectorySink {
    fn emit_nodes(&mut self, nodes: &NodeCollection) -> Result<()> {
        let documents = self.flavor.render_nodes(nodes)?;
        self.write(nodes.name(), documents)
    }

    fn emit_relations(&mut self, relations: &Relations) -> Result<()> {
        let documents = self.flavor.render_relations(relations)?;
        self.write(debgraph_transform::collections::RELATIONS, documents)
    }

    /// Renders and stages every collection as `<collection>.json.tmp`, then
    /// renames them into place. Any render or write failure removes the
    /// staged files and leaves none of the stage's collections written.
    fn emit_stage(&mut self, collections: &[NodeCollection]) -> Result<()> {
        let mut rendered = Vec::with_capacity(collections.len());
        for nodes in collections {
            let documents = self.flavor.render_nodes(nodes)?;
            let count = documents.as_array().map(Vec::len).unwrap_or(0);
            rendered.push((nodes.name(), to_json(&documents, self.pretty)?, count));
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let mut staged: Vec<PathBuf> = Vec::with_capacity(rendered.len());
        for (collection, text, _) in &rendered {
            let tmp = self.dir.join(format!("{collection}.json.tmp"));
            if let Err(error) = fs::write(&tmp, text) {
                for path in &staged {
                    let _ = fs::remove_file(path);
                }
                return Err(error).with_context(|| format!("failed to write {}", tmp.display()));
            }
            staged.push(tmp);
        }

        for ((collection, _, count), tmp) in rendered.into_iter().zip(staged) {
            let path = self.path(collection);
            fs::rename(&tmp, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(
                collection,
                documents = count,
                path = %path.display(),
                "wrote collection"
            );
            self.written.push((collection.to_string(), count));
        }
        Ok(())
    }
}
