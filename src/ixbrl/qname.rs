use std::fmt;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::error::IxbrlError;

/// A namespace-qualified name such as a taxonomy concept, dimension or
/// member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local_name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Resolves a `prefix:local` (or unprefixed) name against the namespace
    /// declarations in scope at `node`.
    pub fn resolve(node: Node, name: &str) -> Result<Self, IxbrlError> {
        let name = name.trim();
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };

        let namespace = node
            .lookup_namespace_uri(prefix)
            .ok_or_else(|| IxbrlError::UnknownPrefix {
                prefix: prefix.unwrap_or("").to_string(),
                name: name.to_string(),
            })?;

        Ok(Self::new(namespace, local))
    }

    /// Like [`QName::resolve`], but only accepts a single `prefix:local`
    /// token whose prefix is declared. Used to recognise enumeration values.
    pub fn try_resolve_prefixed(node: Node, text: &str) -> Option<Self> {
        let text = text.trim();
        let (prefix, local) = text.split_once(':')?;
        if !is_ncname(prefix) || !is_ncname(local) {
            return None;
        }
        let namespace = node.lookup_namespace_uri(Some(prefix))?;
        Some(Self::new(namespace, local))
    }

    /// `namespace#local`, the form used for predicates and enumeration
    /// objects in the triple output.
    pub fn uri(&self) -> String {
        format!("{}#{}", self.namespace, self.local_name)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<root xmlns="http://default" xmlns:a="http://a"><a:item/></root>"#;

    #[test]
    fn test_resolve_prefixed_and_default() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let item = doc.root_element().first_element_child().unwrap();

        let name = QName::resolve(item, "a:Revenue").unwrap();
        assert_eq!(name, QName::new("http://a", "Revenue"));
        assert_eq!(name.to_string(), "{http://a}Revenue");
        assert_eq!(name.uri(), "http://a#Revenue");

        let name = QName::resolve(item, "Plain").unwrap();
        assert_eq!(name.namespace, "http://default");
    }

    #[test]
    fn test_unknown_prefix_is_an_error() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let err = QName::resolve(doc.root_element(), "zz:Thing").unwrap_err();
        assert!(matches!(err, IxbrlError::UnknownPrefix { ref prefix, .. } if prefix == "zz"));
    }

    #[test]
    fn test_try_resolve_prefixed_rejects_prose() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        assert!(QName::try_resolve_prefixed(root, " a:Member ").is_some());
        assert!(QName::try_resolve_prefixed(root, "Note: see above").is_none());
        assert!(QName::try_resolve_prefixed(root, "b:Member").is_none());
        assert!(QName::try_resolve_prefixed(root, "Member").is_none());
    }
}
