use std::fmt;

use roxmltree::{Document, Node, NodeId};

use super::context::ContextId;
use super::error::IxbrlError;
use super::qname::QName;
use super::transform::Transform;
use super::unit::Unit;
use super::IX_NAMESPACES;
use crate::core::config::{IxbrlConfig, ScalePolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    NonNumeric,
    NonFraction {
        unit: Unit,
        /// Base-10 exponent from the `scale` attribute.
        scale: i32,
        /// `sign="-"` on the element.
        negative: bool,
    },
    /// Not supported; asking for its text is an error.
    Fraction,
}

/// A tagged fact.
#[derive(Clone, Debug)]
pub struct Value {
    pub name: QName,
    pub context: ContextId,
    /// Source fragments whose text is concatenated, in chain order. Element
    /// fragments contribute their content but not their tail.
    pub elements: Vec<NodeId>,
    pub format: Option<QName>,
    pub kind: ValueKind,
}

/// A rendered fact value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactValue {
    Text(String),
    /// The fact's content is itself a QName (an enumeration member).
    QName(QName),
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Text(s) => write!(f, "{}", s),
            FactValue::QName(q) => write!(f, "{}", q),
        }
    }
}

impl Value {
    pub fn non_numeric(name: QName, context: ContextId) -> Self {
        Self::with_kind(name, context, ValueKind::NonNumeric)
    }

    pub fn non_fraction(name: QName, context: ContextId, unit: Unit, scale: i32) -> Self {
        Self::with_kind(
            name,
            context,
            ValueKind::NonFraction {
                unit,
                scale,
                negative: false,
            },
        )
    }

    pub fn fraction(name: QName, context: ContextId) -> Self {
        Self::with_kind(name, context, ValueKind::Fraction)
    }

    fn with_kind(name: QName, context: ContextId, kind: ValueKind) -> Self {
        Self {
            name,
            context,
            elements: Vec::new(),
            format: None,
            kind,
        }
    }

    pub fn unit(&self) -> Option<&Unit> {
        match &self.kind {
            ValueKind::NonFraction { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// `10^scale`; 1 for facts without a scale.
    pub fn scale_multiplier(&self) -> f64 {
        match self.kind {
            ValueKind::NonFraction { scale, .. } => 10f64.powi(scale),
            _ => 1.0,
        }
    }

    /// Concatenated text of all fragments, before any transform.
    pub fn raw_text(&self, doc: &Document) -> Result<String, IxbrlError> {
        if self.kind == ValueKind::Fraction {
            return Err(IxbrlError::Unimplemented("fraction values"));
        }

        let mut out = String::new();
        for node in self.elements.iter().filter_map(|id| doc.get_node(*id)) {
            collect_text(node, &mut out);
        }
        Ok(out)
    }

    /// Raw text run through the format transform and, under
    /// [`ScalePolicy::Apply`], scaled.
    pub fn render(
        &self,
        doc: &Document,
        transformer: &dyn Transform,
        config: &IxbrlConfig,
    ) -> Result<FactValue, IxbrlError> {
        let raw = self.raw_text(doc)?;

        let mut value = match &self.format {
            Some(format) => match transformer.transform(format, &raw, self) {
                Ok(value) => value,
                Err(e) if config.strict_transforms => return Err(e.into()),
                Err(e) => {
                    log::warn!("{}: {}; keeping raw text", self.name, e);
                    raw
                }
            },
            None => raw,
        };

        if let ValueKind::NonFraction {
            scale, negative, ..
        } = self.kind
        {
            if config.scale == ScalePolicy::Apply {
                match apply_scale(&value, scale, negative) {
                    Some(scaled) => value = scaled,
                    None => log::warn!(
                        "{}: scale {} not applied to '{}'",
                        self.name,
                        scale,
                        value
                    ),
                }
            }
            return Ok(FactValue::Text(value));
        }

        if self.format.is_none() {
            let enumeration = self
                .elements
                .first()
                .and_then(|id| doc.get_node(*id))
                .and_then(|node| QName::try_resolve_prefixed(node, &value));
            if let Some(qname) = enumeration {
                return Ok(FactValue::QName(qname));
            }
        }

        Ok(FactValue::Text(value))
    }
}

fn collect_text(node: Node, out: &mut String) {
    if node.is_text() {
        out.push_str(node.text().unwrap_or(""));
        return;
    }
    if is_exclude(node) {
        return;
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

fn is_exclude(node: Node) -> bool {
    let tag = node.tag_name();
    tag.name() == "exclude" && tag.namespace().is_some_and(|ns| IX_NAMESPACES.contains(&ns))
}

/// Largest `|scale|` that is applied; beyond the range of an `f64`.
pub const MAX_SCALE: u32 = 308;

/// Multiplies a plain decimal string by `10^exponent` by moving the decimal
/// point, and negates it when `negative` is set. Exponents outside
/// `±MAX_SCALE` are refused.
pub fn apply_scale(value: &str, exponent: i32, negative: bool) -> Option<String> {
    if exponent.unsigned_abs() > MAX_SCALE {
        return None;
    }
    let value = value.trim();
    let (mut minus, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    if negative {
        minus = !minus;
    }

    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit())
        || int_part.len() + frac_part.len() == 0
    {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent as i64;

    let (int_digits, frac_digits) = if point <= 0 {
        (
            String::new(),
            format!("{}{}", "0".repeat((-point) as usize), digits),
        )
    } else if point as usize >= digits.len() {
        (
            format!("{}{}", digits, "0".repeat(point as usize - digits.len())),
            String::new(),
        )
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let int_digits = match int_digits.trim_start_matches('0') {
        "" => "0",
        s => s,
    };
    let frac_digits = frac_digits.trim_end_matches('0');

    let mut out = String::new();
    if minus && (int_digits != "0" || !frac_digits.is_empty()) {
        out.push('-');
    }
    out.push_str(int_digits);
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(frac_digits);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ixbrl::context::ContextTree;
    use crate::ixbrl::transform::{IxtRegistry, TransformError};

    fn fact_with(doc: &Document, ids: &[&str]) -> Value {
        let mut v = Value::non_numeric(QName::new("http://t", "Fact"), ContextTree::new().root());
        for id in ids {
            let node = doc
                .descendants()
                .find(|n| n.attribute("id") == Some(*id))
                .unwrap();
            v.elements.push(node.id());
        }
        v
    }

    #[test]
    fn test_flattening_excludes_outer_tail() {
        let doc = Document::parse(r#"<p><f id="f">A <b>B</b> C</f> tail</p>"#).unwrap();
        let v = fact_with(&doc, &["f"]);
        assert_eq!(v.raw_text(&doc).unwrap(), "A B C");
    }

    #[test]
    fn test_flattening_nested_tails() {
        let doc =
            Document::parse(r#"<f id="f">one<i>two<u>three</u>four</i>five</f>"#).unwrap();
        let v = fact_with(&doc, &["f"]);
        assert_eq!(v.raw_text(&doc).unwrap(), "onetwothreefourfive");
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let doc = Document::parse(r#"<r><a id="x">Hello </a>gap<a id="y">world</a></r>"#).unwrap();
        let v = fact_with(&doc, &["x", "y"]);
        assert_eq!(v.raw_text(&doc).unwrap(), "Hello world");
    }

    #[test]
    fn test_exclude_is_skipped() {
        let doc = Document::parse(
            r#"<f id="f" xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">Page<ix:exclude> 7 </ix:exclude> text</f>"#,
        )
        .unwrap();
        let v = fact_with(&doc, &["f"]);
        assert_eq!(v.raw_text(&doc).unwrap(), "Page text");
    }

    #[test]
    fn test_fraction_is_unimplemented() {
        let doc = Document::parse("<r/>").unwrap();
        let v = Value::fraction(QName::new("http://t", "F"), ContextTree::new().root());
        assert!(matches!(v.raw_text(&doc), Err(IxbrlError::Unimplemented(_))));
    }

    #[test]
    fn test_render_transform_strict_and_lenient() {
        let doc = Document::parse(r#"<f id="f">12,5</f>"#).unwrap();
        let mut v = fact_with(&doc, &["f"]);
        v.format = Some(QName::new("http://ixt", "no-such-format"));

        let lenient = IxbrlConfig::default();
        assert_eq!(
            v.render(&doc, &IxtRegistry, &lenient).unwrap(),
            FactValue::Text("12,5".to_string())
        );

        let strict = IxbrlConfig {
            strict_transforms: true,
            ..IxbrlConfig::default()
        };
        assert!(matches!(
            v.render(&doc, &IxtRegistry, &strict),
            Err(IxbrlError::Transform(TransformError::UnsupportedFormat(_)))
        ));

        v.format = Some(QName::new("http://ixt", "num-comma-decimal"));
        assert_eq!(
            v.render(&doc, &IxtRegistry, &strict).unwrap(),
            FactValue::Text("12.5".to_string())
        );
    }

    #[test]
    fn test_scale_recorded_or_applied() {
        let doc = Document::parse(r#"<f id="f">1,234</f>"#).unwrap();
        let mut v = fact_with(&doc, &["f"]);
        v.kind = ValueKind::NonFraction {
            unit: Unit::measure("iso4217:GBP"),
            scale: 3,
            negative: true,
        };
        v.format = Some(QName::new("http://ixt", "num-dot-decimal"));
        assert_eq!(v.scale_multiplier(), 1000.0);

        let recorded = IxbrlConfig::default();
        assert_eq!(
            v.render(&doc, &IxtRegistry, &recorded).unwrap(),
            FactValue::Text("1234".to_string())
        );

        let applied = IxbrlConfig {
            scale: ScalePolicy::Apply,
            ..IxbrlConfig::default()
        };
        assert_eq!(
            v.render(&doc, &IxtRegistry, &applied).unwrap(),
            FactValue::Text("-1234000".to_string())
        );
    }

    #[test]
    fn test_enumeration_values_resolve_to_qnames() {
        let doc = Document::parse(
            r#"<f id="f" xmlns:us-gaap="http://fasb.org/us-gaap/2023">us-gaap:MemberA</f>"#,
        )
        .unwrap();
        let v = fact_with(&doc, &["f"]);
        assert_eq!(
            v.render(&doc, &IxtRegistry, &IxbrlConfig::default()).unwrap(),
            FactValue::QName(QName::new("http://fasb.org/us-gaap/2023", "MemberA"))
        );
    }

    #[test]
    fn test_apply_scale() {
        assert_eq!(apply_scale("1234.5", 3, false).unwrap(), "1234500");
        assert_eq!(apply_scale("12", -2, false).unwrap(), "0.12");
        assert_eq!(apply_scale("1.50", 6, false).unwrap(), "1500000");
        assert_eq!(apply_scale("5", -3, true).unwrap(), "-0.005");
        assert_eq!(apply_scale("0", 3, true).unwrap(), "0");
        assert_eq!(apply_scale("-7", 0, true).unwrap(), "7");
        assert!(apply_scale("abc", 3, false).is_none());
        assert!(apply_scale("", 3, false).is_none());
    }

    #[test]
    fn test_apply_scale_is_bounded() {
        assert_eq!(apply_scale("1", 308, false).unwrap().len(), 309);
        assert!(apply_scale("1", 200_000_000, false).is_none());
        assert!(apply_scale("1", -2_000_000_000, false).is_none());
        assert!(apply_scale("1", i32::MIN, true).is_none());
    }

    #[test]
    fn test_oversized_scale_keeps_transformed_text() {
        let doc = Document::parse(r#"<f id="f">12</f>"#).unwrap();
        let mut v = fact_with(&doc, &["f"]);
        v.kind = ValueKind::NonFraction {
            unit: Unit::measure("iso4217:GBP"),
            scale: 2_000_000_000,
            negative: false,
        };
        let applied = IxbrlConfig {
            scale: ScalePolicy::Apply,
            ..IxbrlConfig::default()
        };
        assert_eq!(
            v.render(&doc, &IxtRegistry, &applied).unwrap(),
            FactValue::Text("12".to_string())
        );
    }
}
