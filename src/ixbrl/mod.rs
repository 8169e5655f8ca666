//! Inline XBRL ingestion: context tree, fact values and triple output.

pub mod context;
pub mod document;
pub mod error;
pub mod qname;
pub mod relationship;
pub mod transform;
pub mod triples;
pub mod unit;
pub mod value;

pub use context::{Context, ContextId, ContextTree};
pub use document::Ixbrl;
pub use error::IxbrlError;
pub use qname::QName;
pub use relationship::Relationship;
pub use transform::{IxtRegistry, Transform, TransformError};
pub use triples::{write_ntriples, Node, Triple, Uri};
pub use unit::Unit;
pub use value::{FactValue, Value, ValueId, ValueKind};

/// Inline XBRL 1.1 and 1.0 namespaces.
pub const IX_NAMESPACES: &[&str] = &[
    "http://www.xbrl.org/2013/inlineXBRL",
    "http://www.xbrl.org/2008/inlineXBRL",
];
pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
pub const XBRLDI: &str = "http://xbrl.org/2006/xbrldi";
