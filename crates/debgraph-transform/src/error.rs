use thiserror::Error;

/// A record violated the transformer contract.
///
/// Both variants are fatal: upstream acquisition guarantees canonical fields,
/// so a violation means format drift and must not yield partial output.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{entity} record #{index} is missing mandatory attribute `{attribute}`")]
    MissingField {
        entity: &'static str,
        index: usize,
        attribute: String,
    },

    #[error("{entity} record #{index}: attribute `{attribute}` {message}")]
    InvalidValue {
        entity: &'static str,
        index: usize,
        attribute: String,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load source `{source_name}`: {error:#}")]
    Load {
        source_name: String,
        error: anyhow::Error,
    },

    #[error("transformer `{transformer}` failed on source `{source_name}`")]
    Transform {
        source_name: String,
        transformer: &'static str,
        #[source]
        error: TransformError,
    },

    #[error("failed to emit collection `{collection}`: {error:#}")]
    Emit {
        collection: String,
        error: anyhow::Error,
    },

    #[error("pipeline run already finished")]
    Finished,

    #[error("pipeline run halted by an earlier error")]
    Halted,
}
