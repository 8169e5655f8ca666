//! The context tree.
//!
//! Every iXBRL context is decomposed into a sequence of [`Relationship`]s and
//! resolved into a tree rooted at an empty context. Contexts sharing a
//! prefix share the nodes along that prefix, e.g.
//!
//! ```text
//!                 root
//!                   |  entity X
//!                  C1
//!          period   |   instant
//!          ,--------+--------.
//!         C2                 C3
//! ```
//!
//! Nodes live in an arena indexed by [`ContextId`]; edges are held in a
//! separate `(parent, relationship) -> child` table.

use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;

use super::qname::QName;
use super::relationship::{sha1_hex, Relationship};
use super::value::ValueId;

pub const ROOT_URI: &str = "http://local/root";
const LOCAL_BASE: &str = "http://local";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

impl ContextId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct Context {
    pub entity: Option<Relationship>,
    pub period: Option<Relationship>,
    pub instant: Option<Relationship>,
    pub dimensions: Vec<Relationship>,
    /// Facts attached directly to this node, in first-insertion order.
    pub values: IndexMap<QName, ValueId>,
    /// Context ids declared in the document that resolved to this node.
    pub declared_ids: Vec<String>,
    parent: Option<ContextId>,
    path: Vec<Relationship>,
    children: Vec<(Relationship, ContextId)>,
}

impl Context {
    fn derive(&self, parent: ContextId, rel: &Relationship) -> Self {
        let mut child = Context {
            entity: self.entity.clone(),
            period: self.period.clone(),
            instant: self.instant.clone(),
            dimensions: self.dimensions.clone(),
            parent: Some(parent),
            path: self.path.clone(),
            ..Default::default()
        };
        child.apply(rel);
        child.path.push(rel.clone());
        child
    }

    fn apply(&mut self, rel: &Relationship) {
        match rel {
            Relationship::Entity { .. } => self.entity = Some(rel.clone()),
            Relationship::Period { .. } => self.period = Some(rel.clone()),
            Relationship::Instant { .. } => self.instant = Some(rel.clone()),
            Relationship::Dimension { .. } => self.dimensions.push(rel.clone()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// Relationships leading from the root to this node.
    pub fn path(&self) -> &[Relationship] {
        &self.path
    }

    /// Child edges in creation order.
    pub fn children(&self) -> &[(Relationship, ContextId)] {
        &self.children
    }

    /// The field content of the node: entity, period, instant, then
    /// dimensions. Two nodes reached through different paths may share it.
    pub fn relationships(&self) -> Vec<&Relationship> {
        self.entity
            .iter()
            .chain(self.period.iter())
            .chain(self.instant.iter())
            .chain(self.dimensions.iter())
            .collect()
    }

    pub fn uri(&self) -> String {
        if self.path.is_empty() {
            return ROOT_URI.to_string();
        }
        let mut uri = LOCAL_BASE.to_string();
        for rel in &self.path {
            uri.push_str(&rel.uri_fragment());
        }
        uri
    }

    /// Document-independent content hash of the relationship path.
    pub fn id(&self) -> String {
        sha1_hex(&self.path.iter().join("//"))
    }
}

#[derive(Debug)]
pub struct ContextTree {
    nodes: Vec<Context>,
    edges: HashMap<(ContextId, Relationship), ContextId>,
}

impl Default for ContextTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Context::default()],
            edges: HashMap::new(),
        }
    }

    pub fn root(&self) -> ContextId {
        ContextId(0)
    }

    pub fn get(&self, id: ContextId) -> &Context {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: ContextId) -> &mut Context {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &Context)> {
        self.nodes.iter().enumerate().map(|(i, c)| (ContextId(i), c))
    }

    pub fn child(&self, parent: ContextId, rel: &Relationship) -> Option<ContextId> {
        self.edges.get(&(parent, rel.clone())).copied()
    }

    /// Walks `rels` from the root, creating missing nodes on the way.
    /// The same sequence always lands on the same node.
    pub fn resolve(&mut self, rels: &[Relationship]) -> ContextId {
        let mut current = self.root();
        for rel in rels {
            current = self.lookup_or_insert(current, rel);
        }
        current
    }

    fn lookup_or_insert(&mut self, parent: ContextId, rel: &Relationship) -> ContextId {
        if let Some(child) = self.child(parent, rel) {
            return child;
        }

        let id = ContextId(self.nodes.len());
        let node = self.nodes[parent.0].derive(parent, rel);
        self.nodes.push(node);
        self.nodes[parent.0].children.push((rel.clone(), id));
        self.edges.insert((parent, rel.clone()), id);

        log::debug!("New context {} under {}", self.nodes[id.0].uri(), parent.0);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dim(axis: &str, member: &str) -> Relationship {
        Relationship::dimension(QName::new("http://t", axis), QName::new("http://t", member))
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let mut tree = ContextTree::new();
        let rels = vec![
            Relationship::entity("123", "scheme"),
            Relationship::period(date("2020-01-01"), date("2020-12-31")),
        ];
        let a = tree.resolve(&rels);
        let b = tree.resolve(&rels.clone());
        assert_eq!(a, b);
        assert_eq!(tree.len(), 3);
        assert_eq!(
            tree.get(a).id(),
            sha1_hex("entity(123,scheme)//period(2020-01-01,2020-12-31)")
        );
    }

    #[test]
    fn test_uri_composition() {
        let mut tree = ContextTree::new();
        let id = tree.resolve(&[
            Relationship::entity("123", "scheme"),
            Relationship::period(date("2020-01-01"), date("2020-12-31")),
        ]);
        let expected = format!(
            "http://local/{}/123/2020-01-01-2020-12-31",
            &sha1_hex("scheme")[..4]
        );
        assert_eq!(tree.get(id).uri(), expected);
        assert_eq!(tree.get(tree.root()).uri(), ROOT_URI);
        assert_eq!(tree.get(tree.root()).id(), sha1_hex(""));
    }

    #[test]
    fn test_shared_prefix_shares_nodes() {
        let mut tree = ContextTree::new();
        let entity = Relationship::entity("1", "s");
        let dur = tree.resolve(&[
            entity.clone(),
            Relationship::period(date("2020-01-01"), date("2020-12-31")),
        ]);
        let inst = tree.resolve(&[entity.clone(), Relationship::instant(date("2020-12-31"))]);

        let ent_node = tree.child(tree.root(), &entity).unwrap();
        assert_eq!(tree.get(dur).parent(), Some(ent_node));
        assert_eq!(tree.get(inst).parent(), Some(ent_node));
        assert_eq!(tree.get(ent_node).children().len(), 2);
        assert_eq!(tree.get(tree.root()).children().len(), 1);
    }

    #[test]
    fn test_fields_are_inherited_and_applied() {
        let mut tree = ContextTree::new();
        let id = tree.resolve(&[
            Relationship::entity("1", "s"),
            Relationship::instant(date("2021-03-31")),
            dim("A", "X"),
            dim("B", "Y"),
        ]);
        let node = tree.get(id);
        assert_eq!(node.entity, Some(Relationship::entity("1", "s")));
        assert_eq!(node.instant, Some(Relationship::instant(date("2021-03-31"))));
        assert!(node.period.is_none());
        assert_eq!(node.dimensions, vec![dim("A", "X"), dim("B", "Y")]);
        assert_eq!(node.path().len(), 4);
    }

    #[test]
    fn test_order_changes_identity_but_not_content() {
        let mut tree = ContextTree::new();
        let a = tree.resolve(&[dim("A", "X"), dim("B", "Y")]);
        let b = tree.resolve(&[dim("B", "Y"), dim("A", "X")]);
        assert_ne!(a, b);
        assert_ne!(tree.get(a).uri(), tree.get(b).uri());

        let mut left: Vec<String> = tree.get(a).relationships().iter().map(|r| r.to_string()).collect();
        let mut right: Vec<String> = tree.get(b).relationships().iter().map(|r| r.to_string()).collect();
        left.sort();
        right.sort();
        assert_eq!(left, right);
    }

    #[test]
    fn test_overwriting_singleton_fields() {
        let mut tree = ContextTree::new();
        let id = tree.resolve(&[
            Relationship::entity("1", "s"),
            Relationship::entity("2", "s"),
        ]);
        assert_eq!(tree.get(id).entity, Some(Relationship::entity("2", "s")));
        assert_eq!(tree.get(id).relationships().len(), 1);
    }
}
