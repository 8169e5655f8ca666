use thiserror::Error;

use super::transform::TransformError;

/// Failures surfaced while ingesting a document or rendering its facts.
///
/// Malformed periods and instants inside a context never show up here; they
/// are dropped per context during ingestion.
#[derive(Debug, Error)]
pub enum IxbrlError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("fact references undeclared context '{0}'")]
    UnknownContext(String),

    #[error("fact references undeclared unit '{0}'")]
    UnknownUnit(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("namespace prefix '{prefix}' in '{name}' is not declared")]
    UnknownPrefix { prefix: String, name: String },

    #[error("unit '{0}' has neither a measure nor a divide")]
    MalformedUnit(String),

    #[error("continuation chain loops back to '{0}'")]
    ContinuationCycle(String),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("not implemented: {0}")]
    Unimplemented(&'static str),
}
