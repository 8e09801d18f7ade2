//! Pipeline orchestration.
//!
//! A [`Pipeline`] is an ordered list of stages, each binding one source to
//! the transformers that consume it. A [`PipelineRun`] walks the stages:
//!
//! ```text
//! Loading(0) -> Transforming(0) -> Loading(1) -> ... -> Transforming(n) -> Done
//! ```
//!
//! Any error moves the run to `Failed` instead. Node collections touched by
//! a stage are handed to the [`GraphSink`] together, once every transformer
//! of that stage succeeded. The merged relation map is
//! handed over once, on entering `Done`. Stage order decides which record
//! wins on key collisions, both for nodes and relations.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::graph::{NodeCollection, Relations};
use crate::record::RawRecord;
use crate::transformers::{
    DeveloperTransformer, DmPermissionTransformer, GpgKeyTransformer, GroupTransformer,
    PackageTransformer, ServerTransformer, SshKeyTransformer, Transformer,
};
use anyhow::anyhow;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Seams
// ============================================================================

/// Supplies the raw records of a named source.
pub trait SourceLoader {
    fn load(&mut self, source: &str) -> anyhow::Result<Vec<RawRecord>>;
}

impl SourceLoader for BTreeMap<String, Vec<RawRecord>> {
    fn load(&mut self, source: &str) -> anyhow::Result<Vec<RawRecord>> {
        self.get(source)
            .cloned()
            .ok_or_else(|| anyhow!("unknown source `{source}`"))
    }
}

impl SourceLoader for HashMap<String, Vec<RawRecord>> {
    fn load(&mut self, source: &str) -> anyhow::Result<Vec<RawRecord>> {
        self.get(source)
            .cloned()
            .ok_or_else(|| anyhow!("unknown source `{source}`"))
    }
}

/// Receives finished collections.
pub trait GraphSink {
    fn emit_nodes(&mut self, nodes: &NodeCollection) -> anyhow::Result<()>;

    fn emit_relations(&mut self, relations: &Relations) -> anyhow::Result<()>;

    /// Every collection touched by one stage. Sinks that can fail part way
    /// should override this so a failure leaves none of them emitted.
    fn emit_stage(&mut self, collections: &[NodeCollection]) -> anyhow::Result<()> {
        for nodes in collections {
            self.emit_nodes(nodes)?;
        }
        Ok(())
    }
}

// ============================================================================
// Pipeline definition
// ============================================================================

/// One source and the transformers run against it, in order.
pub struct Stage {
    pub source: String,
    pub transformers: Vec<Box<dyn Transformer>>,
}

impl Stage {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            transformers: Vec::new(),
        }
    }

    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }
}

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Groups, developers, servers, packages, then DM permissions.
    pub fn standard(config: &PipelineConfig) -> Self {
        let sources = &config.sources;
        Pipeline::new()
            .stage(Stage::new(&sources.groups).with(GroupTransformer))
            .stage(
                Stage::new(&sources.developers)
                    .with(DeveloperTransformer::new(config.excluded_statuses.clone()))
                    .with(GpgKeyTransformer::new(config.excluded_statuses.clone())),
            )
            .stage(
                Stage::new(&sources.servers)
                    .with(ServerTransformer)
                    .with(SshKeyTransformer),
            )
            .stage(Stage::new(&sources.packages).with(PackageTransformer))
            .stage(Stage::new(&sources.dm_permissions).with(DmPermissionTransformer))
    }

    pub fn start(&self) -> PipelineRun<'_> {
        PipelineRun {
            pipeline: self,
            state: PipelineState::Loading { stage: 0 },
            records: Vec::new(),
            collections: BTreeMap::new(),
            relations: Relations::new(),
            report: RunReport::default(),
        }
    }

    /// Run every stage; see [`PipelineRun::run_to_completion`].
    pub fn run(
        &self,
        loader: &mut dyn SourceLoader,
        sink: &mut dyn GraphSink,
    ) -> Result<RunReport, PipelineError> {
        self.start().run_to_completion(loader, sink)
    }
}

// ============================================================================
// Run state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Loading { stage: usize },
    Transforming { stage: usize },
    Done,
    /// A step returned an error. Terminal, like `Done`.
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub source: String,
    pub records: usize,
    /// Node count per collection after this stage.
    pub nodes: BTreeMap<String, usize>,
    /// Relations contributed by this stage, before run-wide deduplication.
    pub relations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    /// Size of the merged relation collection.
    pub relations: usize,
}

pub struct PipelineRun<'p> {
    pipeline: &'p Pipeline,
    state: PipelineState,
    records: Vec<RawRecord>,
    collections: BTreeMap<String, NodeCollection>,
    relations: Relations,
    report: RunReport,
}

impl<'p> PipelineRun<'p> {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    pub fn collection(&self, name: &str) -> Option<&NodeCollection> {
        self.collections.get(name)
    }

    /// Advance by one state. There is no retry: the first error moves the
    /// run to `Failed` and every later step is refused. Collections already
    /// emitted stay emitted.
    pub fn step(
        &mut self,
        loader: &mut dyn SourceLoader,
        sink: &mut dyn GraphSink,
    ) -> Result<PipelineState, PipelineError> {
        match self.state {
            PipelineState::Done => return Err(PipelineError::Finished),
            PipelineState::Failed => return Err(PipelineError::Halted),
            _ => {}
        }
        if let Err(error) = self.advance(loader, sink) {
            tracing::warn!(error = %error, "pipeline run halted");
            self.state = PipelineState::Failed;
            return Err(error);
        }
        Ok(self.state)
    }

    /// Step until `Done`, returning the run report.
    pub fn run_to_completion(
        mut self,
        loader: &mut dyn SourceLoader,
        sink: &mut dyn GraphSink,
    ) -> Result<RunReport, PipelineError> {
        while self.state != PipelineState::Done {
            self.step(loader, sink)?;
        }
        Ok(self.report)
    }

    fn advance(
        &mut self,
        loader: &mut dyn SourceLoader,
        sink: &mut dyn GraphSink,
    ) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Done | PipelineState::Failed => {}
            PipelineState::Loading { stage } if stage >= self.pipeline.stages.len() => {
                self.finish(sink)?;
            }
            PipelineState::Loading { stage } => {
                let pipeline = self.pipeline;
                let source = &pipeline.stages[stage].source;
                let records = loader.load(source).map_err(|error| PipelineError::Load {
                    source_name: source.clone(),
                    error,
                })?;
                tracing::info!(source = %source, records = records.len(), "loaded source");
                self.records = records;
                self.state = PipelineState::Transforming { stage };
            }
            PipelineState::Transforming { stage } => {
                self.transform_stage(stage, sink)?;
                self.records.clear();
                if stage + 1 < self.pipeline.stages.len() {
                    self.state = PipelineState::Loading { stage: stage + 1 };
                } else {
                    self.finish(sink)?;
                }
            }
        }
        Ok(())
    }

    fn transform_stage(
        &mut self,
        stage: usize,
        sink: &mut dyn GraphSink,
    ) -> Result<(), PipelineError> {
        let pipeline = self.pipeline;
        let stage_def = &pipeline.stages[stage];
        let mut staged_nodes: BTreeMap<String, NodeCollection> = BTreeMap::new();
        let mut staged_relations = Relations::new();
        let mut contributed = 0usize;

        for transformer in &stage_def.transformers {
            let output = transformer.transform(&self.records).map_err(|error| {
                PipelineError::Transform {
                    source_name: stage_def.source.clone(),
                    transformer: transformer.name(),
                    error,
                }
            })?;

            tracing::debug!(
                source = %stage_def.source,
                transformer = transformer.name(),
                nodes = output.nodes.as_ref().map(NodeCollection::len).unwrap_or(0),
                relations = output.relations.len(),
                "transformer finished"
            );

            contributed += output.relations.len();
            staged_relations.merge(output.relations);
            if let Some(nodes) = output.nodes {
                staged_nodes
                    .entry(nodes.name().to_string())
                    .or_insert_with(|| NodeCollection::new(nodes.name()))
                    .extend(nodes);
            }
        }

        // Every transformer succeeded: emit what the stage touched, then commit.
        let merged: Vec<NodeCollection> = staged_nodes
            .into_iter()
            .map(|(name, nodes)| {
                let mut collection = self
                    .collections
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| NodeCollection::new(name.as_str()));
                collection.extend(nodes);
                collection
            })
            .collect();
        if !merged.is_empty() {
            sink.emit_stage(&merged).map_err(|error| PipelineError::Emit {
                collection: merged
                    .iter()
                    .map(NodeCollection::name)
                    .collect::<Vec<_>>()
                    .join(", "),
                error,
            })?;
        }

        self.relations.merge(staged_relations);
        let mut report = StageReport {
            source: stage_def.source.clone(),
            records: self.records.len(),
            nodes: BTreeMap::new(),
            relations: contributed,
        };
        for collection in merged {
            report
                .nodes
                .insert(collection.name().to_string(), collection.len());
            self.collections
                .insert(collection.name().to_string(), collection);
        }

        tracing::info!(
            source = %report.source,
            records = report.records,
            relations = report.relations,
            "stage complete"
        );
        self.report.stages.push(report);
        Ok(())
    }

    fn finish(&mut self, sink: &mut dyn GraphSink) -> Result<(), PipelineError> {
        sink.emit_relations(&self.relations)
            .map_err(|error| PipelineError::Emit {
                collection: crate::collections::RELATIONS.to_string(),
                error,
            })?;
        self.report.relations = self.relations.len();
        self.state = PipelineState::Done;
        tracing::info!(relations = self.report.relations, "pipeline done");
        Ok(())
    }
}
