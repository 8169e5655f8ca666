use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use sha1::{Digest, Sha1};

use super::qname::QName;
use super::triples::vocab;

/// Hex SHA-1 of a string; used for context ids and entity URI segments.
pub fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// One fragment of a context definition: a single reporting axis.
///
/// Equality and hashing go through the `Display` form, so two relationships
/// with the same logical content are interchangeable keys. An entity's
/// `name` is a label and does not take part in identity.
#[derive(Clone, Debug)]
pub enum Relationship {
    Entity {
        id: String,
        scheme: String,
        name: Option<String>,
    },
    Period {
        start: NaiveDate,
        end: NaiveDate,
    },
    Instant {
        date: NaiveDate,
    },
    Dimension {
        dimension: QName,
        value: QName,
    },
}

impl Relationship {
    pub fn entity(id: impl Into<String>, scheme: impl Into<String>) -> Self {
        Relationship::Entity {
            id: id.into(),
            scheme: scheme.into(),
            name: None,
        }
    }

    pub fn period(start: NaiveDate, end: NaiveDate) -> Self {
        Relationship::Period { start, end }
    }

    pub fn instant(date: NaiveDate) -> Self {
        Relationship::Instant { date }
    }

    pub fn dimension(dimension: QName, value: QName) -> Self {
        Relationship::Dimension { dimension, value }
    }

    /// Human-readable label.
    pub fn description(&self) -> String {
        match self {
            Relationship::Entity {
                id,
                name: Some(name),
                ..
            } => format!("{} ({})", name, id),
            Relationship::Entity { id, scheme, .. } => format!("Entity {} ({})", id, scheme),
            Relationship::Period { start, end } => format!("{} - {}", start, end),
            Relationship::Instant { date } => date.to_string(),
            Relationship::Dimension { value, .. } => value.local_name.clone(),
        }
    }

    /// The ontology class a context reached through this edge instantiates.
    pub fn type_uri(&self) -> &'static str {
        match self {
            Relationship::Entity { .. } => vocab::ENTITY,
            Relationship::Period { .. } => vocab::PERIOD,
            Relationship::Instant { .. } => vocab::INSTANT,
            Relationship::Dimension { .. } => vocab::DIMENSION,
        }
    }

    /// Path segment appended to the parent's URI.
    pub fn uri_fragment(&self) -> String {
        match self {
            Relationship::Entity { id, scheme, .. } => {
                format!("/{}/{}", &sha1_hex(scheme)[..4], id)
            }
            Relationship::Period { start, end } => format!("/{}-{}", start, end),
            Relationship::Instant { date } => format!("/{}", date),
            Relationship::Dimension { dimension, value } => {
                format!("/{}={}", dimension.local_name, value.local_name)
            }
        }
    }

    /// SHA-1 of the string form.
    pub fn id(&self) -> String {
        sha1_hex(&self.to_string())
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Entity { id, scheme, .. } => write!(f, "entity({},{})", id, scheme),
            Relationship::Period { start, end } => write!(f, "period({},{})", start, end),
            Relationship::Instant { date } => write!(f, "instant({})", date),
            Relationship::Dimension { dimension, value } => {
                write!(f, "dimension({},{})", dimension, value)
            }
        }
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Relationship {}

impl Hash for Relationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
