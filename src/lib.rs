pub mod core;
pub mod ixbrl;

// Re-exports
pub use crate::core::config::{IxbrlConfig, ScalePolicy};
pub use crate::ixbrl::{Ixbrl, IxbrlError, Triple};
