//! Triple output: the graph alphabet, the emission traversal over the
//! context tree, and an N-Triples writer.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use super::context::ContextId;
use super::document::Ixbrl;
use super::error::IxbrlError;
use super::relationship::Relationship;
use super::value::FactValue;

pub mod vocab {
    pub const IS_A: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
    pub const RDFS_PROPERTY: &str = "http://www.w3.org/2000/01/rdf-schema#Property";

    pub const CONTAINS: &str = "http://local/contains";
    pub const REPORTS: &str = "http://local/reports";

    pub const CONTEXT: &str = "http://local/t#context";
    pub const ROOT: &str = "http://local/t#root";
    pub const ENTITY: &str = "http://local/t#entity";
    pub const PERIOD: &str = "http://local/t#period";
    pub const INSTANT: &str = "http://local/t#instant";
    pub const DIMENSION: &str = "http://local/t#dimension";
    pub const AXIS: &str = "http://local/t#axis";
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Uri(pub String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Uri(uri.into())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Node {
    Uri(Uri),
    Literal(String),
}

impl Node {
    pub fn uri(uri: impl Into<String>) -> Self {
        Node::Uri(Uri::new(uri))
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Uri(uri) => write!(f, "{}", uri),
            Node::Literal(text) => {
                f.write_str("\"")?;
                for c in text.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Triple {
    pub subject: Uri,
    pub predicate: Uri,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Node) -> Self {
        Self {
            subject: Uri::new(subject),
            predicate: Uri::new(predicate),
            object,
        }
    }
}

/// One N-Triples statement, without the trailing newline.
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

pub fn write_ntriples<W: Write>(out: &mut W, triples: &[Triple]) -> io::Result<()> {
    for triple in triples {
        writeln!(out, "{}", triple)?;
    }
    Ok(())
}

/// Depth-first walk over a finished context tree.
pub(crate) struct Emitter<'a, 'input> {
    ixbrl: &'a Ixbrl<'input>,
    out: Vec<Triple>,
}

impl<'a, 'input> Emitter<'a, 'input> {
    pub(crate) fn new(ixbrl: &'a Ixbrl<'input>) -> Self {
        Self {
            ixbrl,
            out: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> Result<Vec<Triple>, IxbrlError> {
        let root = self.ixbrl.tree().root();
        self.ontology();
        self.context(root, None)?;
        Ok(self.out)
    }

    fn push(&mut self, subject: impl Into<String>, predicate: &str, object: Node) {
        self.out.push(Triple::new(subject, predicate, object));
    }

    fn ontology(&mut self) {
        let classes = [
            (vocab::CONTEXT, "Context"),
            (vocab::ENTITY, "Entity"),
            (vocab::PERIOD, "Period"),
            (vocab::INSTANT, "Instant"),
            (vocab::DIMENSION, "Dimension"),
        ];
        for (class, label) in classes {
            self.push(class, vocab::LABEL, Node::literal(label));
        }
        for (class, _) in classes {
            self.push(class, vocab::IS_A, Node::uri(vocab::RDFS_CLASS));
        }
    }

    fn context(&mut self, id: ContextId, rel: Option<&Relationship>) -> Result<(), IxbrlError> {
        let ixbrl = self.ixbrl;
        let tree = ixbrl.tree();
        let node = tree.get(id);
        let uri = node.uri();

        let (class, label) = match rel {
            None => (vocab::ROOT, "everything".to_string()),
            Some(rel @ Relationship::Entity { .. }) => (
                rel.type_uri(),
                ixbrl
                    .entity_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| rel.description()),
            ),
            Some(rel) => (rel.type_uri(), rel.description()),
        };
        self.push(uri.clone(), vocab::IS_A, Node::uri(class));
        self.push(uri.clone(), vocab::LABEL, Node::literal(label));

        for (child_rel, child) in node.children() {
            let child_uri = Node::uri(tree.get(*child).uri());
            match child_rel {
                Relationship::Entity { .. } => self.push(uri.clone(), vocab::CONTAINS, child_uri),
                Relationship::Period { .. } | Relationship::Instant { .. } => {
                    self.push(uri.clone(), vocab::REPORTS, child_uri)
                }
                Relationship::Dimension { dimension, .. } => {
                    let axis = dimension.uri();
                    self.push(uri.clone(), &axis, child_uri);
                    self.push(axis.clone(), vocab::IS_A, Node::uri(vocab::AXIS));
                    self.push(axis, vocab::LABEL, Node::literal(dimension.local_name.clone()));
                }
            }
            self.context(*child, Some(child_rel))?;
        }

        for (name, value_id) in &node.values {
            let predicate = name.uri();
            let object = match ixbrl.render(*value_id)? {
                FactValue::QName(q) => Node::uri(q.uri()),
                FactValue::Text(text) => Node::literal(text),
            };
            self.push(uri.clone(), &predicate, object);
            self.push(predicate.clone(), vocab::IS_A, Node::uri(vocab::RDFS_PROPERTY));
            self.push(predicate, vocab::LABEL, Node::literal(name.local_name.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntriples_escaping() {
        let t = Triple::new(
            "http://local/root",
            vocab::LABEL,
            Node::literal("say \"hi\"\nback\\slash"),
        );
        assert_eq!(
            t.to_string(),
            r#"<http://local/root> <http://www.w3.org/2000/01/rdf-schema#label> "say \"hi\"\nback\\slash" ."#
        );
    }

    #[test]
    fn test_write_ntriples() {
        let triples = vec![
            Triple::new("http://a", vocab::IS_A, Node::uri(vocab::ROOT)),
            Triple::new("http://a", vocab::LABEL, Node::literal("x")),
        ];
        let mut buf = Vec::new();
        write_ntriples(&mut buf, &triples).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("\"x\" .\n"));
    }

    #[test]
    fn test_json_shape() {
        let t = Triple::new("http://a", vocab::LABEL, Node::literal("x"));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["subject"], "http://a");
        assert_eq!(json["object"]["type"], "literal");
        assert_eq!(json["object"]["value"], "x");
    }
}
