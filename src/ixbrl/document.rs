use std::collections::HashSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use roxmltree::{Document, Node, ParsingOptions};

use super::context::{ContextId, ContextTree};
use super::error::IxbrlError;
use super::qname::QName;
use super::relationship::Relationship;
use super::transform::{IxtRegistry, Transform};
use super::triples::{Emitter, Triple};
use super::unit::Unit;
use super::value::{FactValue, Value, ValueId, ValueKind};
use super::{IX_NAMESPACES, XBRLDI, XBRLI};
use crate::core::config::IxbrlConfig;

/// Concepts whose value names the reporting entity, by jurisdiction.
static ENTITY_NAME_CONCEPTS: Lazy<Vec<QName>> = Lazy::new(|| {
    vec![
        // Companies House
        QName::new(
            "http://xbrl.frc.org.uk/cd/2019-01-01/business",
            "EntityCurrentLegalOrRegisteredName",
        ),
        // SEC
        QName::new("http://xbrl.sec.gov/dei/2020-01-31", "EntityRegistrantName"),
        // ESEF
        QName::new(
            "http://xbrl.ifrs.org/taxonomy/2017-03-09/ifrs-full",
            "NameOfReportingEntityOrOtherMeansOfIdentification",
        ),
    ]
});

/// A parsed iXBRL document: the context tree, units and facts, plus the
/// source document the facts' fragments point into.
pub struct Ixbrl<'input> {
    document: Document<'input>,
    tree: ContextTree,
    contexts: IndexMap<String, ContextId>,
    units: IndexMap<String, Unit>,
    values: Vec<Value>,
    facts: IndexMap<(ContextId, QName), ValueId>,
    entity_name: Option<String>,
    config: IxbrlConfig,
    transformer: Box<dyn Transform>,
}

/// Everything ingestion builds before the document is moved into [`Ixbrl`].
#[derive(Default)]
struct Ingest {
    tree: ContextTree,
    contexts: IndexMap<String, ContextId>,
    units: IndexMap<String, Unit>,
    values: Vec<Value>,
    facts: IndexMap<(ContextId, QName), ValueId>,
    /// `continuedAt` target id -> fact it extends.
    links: IndexMap<String, ValueId>,
}

impl<'input> Ixbrl<'input> {
    pub fn parse(text: &'input str, config: IxbrlConfig) -> Result<Self, IxbrlError> {
        Self::parse_with_transform(text, config, IxtRegistry)
    }

    pub fn parse_with_transform(
        text: &'input str,
        config: IxbrlConfig,
        transformer: impl Transform + 'static,
    ) -> Result<Self, IxbrlError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(text, options)?;
        Self::from_document(document, config, Box::new(transformer))
    }

    /// Runs the ingestion passes in order: units, contexts, facts,
    /// continuations, entity name.
    pub fn from_document(
        document: Document<'input>,
        config: IxbrlConfig,
        transformer: Box<dyn Transform>,
    ) -> Result<Self, IxbrlError> {
        let mut ingest = Ingest::default();
        ingest.units(&document)?;
        ingest.contexts(&document)?;
        ingest.facts(&document)?;
        ingest.continuations(&document)?;

        log::info!(
            "Parsed {} units, {} contexts into {} tree nodes, {} facts",
            ingest.units.len(),
            ingest.contexts.len(),
            ingest.tree.len(),
            ingest.facts.len()
        );

        let mut ixbrl = Ixbrl {
            document,
            tree: ingest.tree,
            contexts: ingest.contexts,
            units: ingest.units,
            values: ingest.values,
            facts: ingest.facts,
            entity_name: None,
            config,
            transformer,
        };
        ixbrl.entity_name = ixbrl.find_entity_name();
        Ok(ixbrl)
    }

    pub fn document(&self) -> &Document<'input> {
        &self.document
    }

    pub fn config(&self) -> &IxbrlConfig {
        &self.config
    }

    pub fn tree(&self) -> &ContextTree {
        &self.tree
    }

    /// Declared context id -> resolved node.
    pub fn contexts(&self) -> &IndexMap<String, ContextId> {
        &self.contexts
    }

    pub fn context(&self, declared_id: &str) -> Option<ContextId> {
        self.contexts.get(declared_id).copied()
    }

    pub fn units(&self) -> &IndexMap<String, Unit> {
        &self.units
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn fact_id(&self, context: ContextId, name: &QName) -> Option<ValueId> {
        self.facts.get(&(context, name.clone())).copied()
    }

    pub fn fact(&self, context: ContextId, name: &QName) -> Option<&Value> {
        self.fact_id(context, name).map(|id| self.value(id))
    }

    /// Facts in ingestion order; a fact overwritten by a later one with the
    /// same context and name is not included.
    pub fn facts(&self) -> impl Iterator<Item = &Value> {
        self.facts.values().map(|id| self.value(*id))
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    pub fn raw_text(&self, id: ValueId) -> Result<String, IxbrlError> {
        self.value(id).raw_text(&self.document)
    }

    pub fn render(&self, id: ValueId) -> Result<FactValue, IxbrlError> {
        self.value(id)
            .render(&self.document, self.transformer.as_ref(), &self.config)
    }

    pub fn triples(&self) -> Result<Vec<Triple>, IxbrlError> {
        Emitter::new(self).run()
    }

    fn find_entity_name(&self) -> Option<String> {
        let id = self
            .facts
            .iter()
            .find(|((_, name), _)| ENTITY_NAME_CONCEPTS.contains(name))
            .map(|(_, id)| *id)?;

        match self.render(id) {
            Ok(value) => Some(value.to_string().trim().to_string()),
            Err(e) => {
                log::warn!("Could not render entity name: {}", e);
                None
            }
        }
    }
}

impl Ingest {
    fn units(&mut self, doc: &Document) -> Result<(), IxbrlError> {
        for unit_elt in doc.descendants().filter(|n| n.has_tag_name((XBRLI, "unit"))) {
            let id = required_attribute(unit_elt, "id")?;

            let divide = child(unit_elt, "divide").and_then(|div| {
                let num = child(div, "unitNumerator").and_then(|n| child(n, "measure"))?;
                let den = child(div, "unitDenominator").and_then(|n| child(n, "measure"))?;
                Some(Unit::divide(measure(num), measure(den)))
            });

            let unit = match divide {
                Some(unit) => unit,
                None => child(unit_elt, "measure")
                    .map(measure)
                    .ok_or_else(|| IxbrlError::MalformedUnit(id.to_string()))?,
            };

            log::debug!("Unit {}: {}", id, unit);
            self.units.insert(id.to_string(), unit);
        }
        Ok(())
    }

    fn contexts(&mut self, doc: &Document) -> Result<(), IxbrlError> {
        for ctx_elt in doc.descendants().filter(|n| n.has_tag_name((XBRLI, "context"))) {
            let id = required_attribute(ctx_elt, "id")?;
            let mut rels = Vec::new();

            let identifier = ctx_elt
                .descendants()
                .filter(|n| n.has_tag_name((XBRLI, "entity")))
                .flat_map(|e| e.descendants())
                .find(|n| n.has_tag_name((XBRLI, "identifier")));
            if let Some(ident) = identifier {
                let scheme = ident.attribute("scheme").unwrap_or_else(|| {
                    log::debug!("Context {}: identifier has no scheme", id);
                    ""
                });
                rels.push(Relationship::entity(
                    ident.text().unwrap_or("").trim(),
                    scheme,
                ));
            }

            for period in ctx_elt
                .descendants()
                .filter(|n| n.has_tag_name((XBRLI, "period")))
            {
                match (
                    descendant_date(period, "startDate"),
                    descendant_date(period, "endDate"),
                ) {
                    (Some(start), Some(end)) => rels.push(Relationship::period(start, end)),
                    _ => log::debug!("Context {}: no usable start/end dates", id),
                }
                match descendant_date(period, "instant") {
                    Some(date) => rels.push(Relationship::instant(date)),
                    None => log::debug!("Context {}: no usable instant", id),
                }
            }

            let mut dimensions = Vec::new();
            let containers = ctx_elt.descendants().filter(|n| {
                n.has_tag_name((XBRLI, "segment")) || n.has_tag_name((XBRLI, "scenario"))
            });
            for container in containers {
                for member in container.descendants().filter(|n| n.is_element()) {
                    if member.has_tag_name((XBRLDI, "explicitMember")) {
                        let dimension =
                            QName::resolve(member, required_attribute(member, "dimension")?)?;
                        let value = QName::resolve(member, member.text().unwrap_or(""))?;
                        dimensions.push(Relationship::dimension(dimension, value));
                    } else if member.has_tag_name((XBRLDI, "typedMember")) {
                        log::debug!("Context {}: skipping typed member", id);
                    }
                }
            }
            // Canonical order so contexts with equal content share a node.
            dimensions.sort_by(|a, b| dimension_key(a).cmp(&dimension_key(b)));
            rels.extend(dimensions);

            let node = self.tree.resolve(&rels);
            self.tree.get_mut(node).declared_ids.push(id.to_string());
            self.contexts.insert(id.to_string(), node);
        }
        Ok(())
    }

    fn facts(&mut self, doc: &Document) -> Result<(), IxbrlError> {
        for elt in doc.descendants().filter(|n| is_ix(*n, "nonNumeric")) {
            self.fact(elt, ValueKind::NonNumeric)?;
        }
        for elt in doc.descendants().filter(|n| is_ix(*n, "nonFraction")) {
            let kind = self.non_fraction_kind(elt)?;
            self.fact(elt, kind)?;
        }
        // Kept so their context shows them; rendering one is an error.
        for elt in doc.descendants().filter(|n| is_ix(*n, "fraction")) {
            self.fact(elt, ValueKind::Fraction)?;
        }
        Ok(())
    }

    fn non_fraction_kind(&self, elt: Node) -> Result<ValueKind, IxbrlError> {
        let unit_ref = required_attribute(elt, "unitRef")?;
        let unit = self
            .units
            .get(unit_ref)
            .cloned()
            .ok_or_else(|| IxbrlError::UnknownUnit(unit_ref.to_string()))?;
        let scale = elt
            .attribute("scale")
            .and_then(|s| s.trim().parse::<i32>().ok())
            .unwrap_or(0);

        Ok(ValueKind::NonFraction {
            unit,
            scale,
            negative: elt.attribute("sign") == Some("-"),
        })
    }

    fn fact(&mut self, elt: Node, kind: ValueKind) -> Result<(), IxbrlError> {
        let name = QName::resolve(elt, required_attribute(elt, "name")?)?;
        let context_ref = required_attribute(elt, "contextRef")?;
        let context = *self
            .contexts
            .get(context_ref)
            .ok_or_else(|| IxbrlError::UnknownContext(context_ref.to_string()))?;
        let format = elt
            .attribute("format")
            .map(|f| QName::resolve(elt, f))
            .transpose()?;

        let id = ValueId(self.values.len());
        self.values.push(Value {
            name: name.clone(),
            context,
            elements: vec![elt.id()],
            format,
            kind,
        });

        log::debug!("Fact {} in context {}", name, context_ref);
        self.tree.get_mut(context).values.insert(name.clone(), id);
        self.facts.insert((context, name), id);

        if let Some(target) = elt.attribute("continuedAt") {
            self.links.insert(target.to_string(), id);
        }
        Ok(())
    }

    /// Appends continuation content to the facts that reference it. Every
    /// chain is followed from its originating fact, so the order in which
    /// continuation elements appear in the document does not matter.
    fn continuations(&mut self, doc: &Document) -> Result<(), IxbrlError> {
        let mut continuations: IndexMap<&str, Node> = IndexMap::new();
        for elt in doc.descendants().filter(|n| is_ix(*n, "continuation")) {
            continuations.insert(required_attribute(elt, "id")?, elt);
        }

        let mut claimed: HashSet<&str> = HashSet::new();
        for (target, value_id) in &self.links {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut next = Some(target.as_str());

            while let Some(id) = next {
                let Some((key, cont)) = continuations.get_key_value(id) else {
                    log::warn!("continuedAt '{}' names no continuation element", id);
                    break;
                };
                if !seen.insert(*key) {
                    return Err(IxbrlError::ContinuationCycle(id.to_string()));
                }
                claimed.insert(*key);
                self.values[value_id.0]
                    .elements
                    .extend(cont.children().map(|c| c.id()));
                next = cont.attribute("continuedAt");
            }
        }

        for id in continuations.keys().filter(|id| !claimed.contains(*id)) {
            log::warn!("Continuation '{}' is not reached from any fact", id);
        }
        Ok(())
    }
}

fn is_ix(node: Node, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node
            .tag_name()
            .namespace()
            .is_some_and(|ns| IX_NAMESPACES.contains(&ns))
}

fn child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((XBRLI, local)))
}

fn measure(node: Node) -> Unit {
    Unit::measure(node.text().unwrap_or("").trim())
}

fn required_attribute<'a>(node: Node<'a, '_>, attribute: &'static str) -> Result<&'a str, IxbrlError> {
    node.attribute(attribute)
        .ok_or_else(|| IxbrlError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })
}

fn descendant_date(node: Node, local: &str) -> Option<NaiveDate> {
    let text = node
        .descendants()
        .find(|n| n.has_tag_name((XBRLI, local)))?
        .text()?;
    parse_date(text)
}

/// `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = text.trim().split('T').next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn dimension_key(rel: &Relationship) -> Option<&QName> {
    match rel {
        Relationship::Dimension { dimension, .. } => Some(dimension),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2020, 12, 31);
        assert_eq!(parse_date(" 2020-12-31 "), expected);
        assert_eq!(parse_date("2020-12-31T00:00:00"), expected);
        assert_eq!(parse_date("31/12/2020"), None);
        assert_eq!(parse_date(""), None);
    }
}
