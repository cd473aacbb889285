//! The schema tree shared by the merge and emission passes.
//!
//! A run owns exactly one tree, rooted in a [`Slot`]. Objects keep their
//! fields in first-appearance order; arrays that carry objects are modelled
//! by the schema of their first element; everything else collapses into a
//! leaf holding the distinct values (witnesses) observed at that position.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value;

// ------------------------------- Literals --------------------------------- //

/// A scalar witness, or a sequence of them for arrays without objects.
///
/// Text is stored escape-sanitized (see [`sanitize_text`]) so it can be
/// pasted into double-quoted output without further escaping.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i128),
    Real(OrderedFloat<f64>),
    Text(String),
    Seq(Vec<Literal>),
}

impl Literal {
    /// Scalar or object-free array → literal. Objects (at any depth) yield `None`.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Literal::Integer(i as i128))
                } else if let Some(u) = n.as_u64() {
                    Some(Literal::Integer(u as i128))
                } else {
                    n.as_f64().map(|f| Literal::Real(OrderedFloat(f)))
                }
            }
            Value::String(s) => Some(Literal::Text(sanitize_text(s))),
            Value::Array(xs) => xs.iter().map(Literal::from_json).collect::<Option<Vec<_>>>().map(Literal::Seq),
            Value::Object(_) => None,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Literal::Seq(_))
    }

    /// The value classification looks at: itself for bare witnesses, the
    /// first element for wrapped ones (none for an empty sequence).
    pub fn representative(&self) -> Option<&Literal> {
        match self {
            Literal::Seq(xs) => xs.first(),
            other => Some(other),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Every text fragment reachable from this literal.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Literal::Text(s) => vec![s.as_str()],
            Literal::Seq(xs) => xs.iter().flat_map(Literal::texts).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Real(x) => match serde_json::Number::from_f64(x.0) {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "{}", x.0),
            },
            Literal::Text(s) => f.write_str(s),
            Literal::Seq(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match x {
                        Literal::Text(s) => write!(f, "\"{s}\"")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

/// Escape tab, backslash and double quote so the text survives literal emission.
pub fn sanitize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// True if an object appears anywhere inside `v` (including `v` itself).
pub fn includes_object(v: &Value) -> bool {
    match v {
        Value::Object(_) => true,
        Value::Array(xs) => xs.iter().any(includes_object),
        _ => false,
    }
}

// --------------------------------- Tree ----------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaTree {
    Object(ObjectNode),
    Array(ArrayNode),
    Leaf(LeafNode),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectNode {
    pub fields: IndexMap<String, Slot>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayNode {
    pub element: Box<SchemaTree>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeafNode {
    pub witnesses: BTreeSet<Literal>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub schema: SchemaTree,
    pub optional: bool,
    pub nullable: bool,
    pub inconsistent: bool,
}

impl Slot {
    pub fn new(schema: SchemaTree) -> Self {
        Self { schema, optional: false, nullable: false, inconsistent: false }
    }
}

impl SchemaTree {
    pub fn is_empty_object(&self) -> bool {
        matches!(self, SchemaTree::Object(o) if o.fields.is_empty())
    }

    pub fn is_empty_array(&self) -> bool {
        matches!(self, SchemaTree::Leaf(l) if l.is_empty_array())
    }

    pub fn is_null_only(&self) -> bool {
        matches!(self, SchemaTree::Leaf(l) if l.is_null_only())
    }
}

impl LeafNode {
    pub fn is_empty_array(&self) -> bool {
        self.witnesses.len() == 1 && self.witnesses.contains(&Literal::Seq(Vec::new()))
    }

    pub fn is_null_only(&self) -> bool {
        self.witnesses.len() == 1 && self.witnesses.contains(&Literal::Null)
    }

    pub fn has_wrapped(&self) -> bool {
        self.witnesses.iter().any(Literal::is_wrapped)
    }

    pub fn has_bare(&self) -> bool {
        self.witnesses.iter().any(|w| !w.is_wrapped())
    }

    /// Some witness is an array holding another array.
    pub fn has_nested(&self) -> bool {
        self.witnesses.iter().any(|w| matches!(w, Literal::Seq(xs) if xs.iter().any(Literal::is_wrapped)))
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_doubles_escapes() {
        assert_eq!(sanitize_text("a\tb"), "a\\tb");
        assert_eq!(sanitize_text(r#"say "hi" \o/"#), r#"say \"hi\" \\o/"#);
        assert_eq!(sanitize_text("plain"), "plain");
    }

    #[test]
    fn literal_from_json_wraps_scalar_arrays() {
        let lit = Literal::from_json(&json!(["a", 1, [true]])).unwrap();
        assert_eq!(
            lit,
            Literal::Seq(vec![
                Literal::Text("a".into()),
                Literal::Integer(1),
                Literal::Seq(vec![Literal::Bool(true)]),
            ])
        );
        assert!(Literal::from_json(&json!([1, {"x": 1}])).is_none());
    }

    #[test]
    fn representative_is_first_element() {
        let lit = Literal::from_json(&json!([3, 4])).unwrap();
        assert_eq!(lit.representative(), Some(&Literal::Integer(3)));
        assert_eq!(Literal::Seq(Vec::new()).representative(), None);
    }

    #[test]
    fn display_matches_emitted_literals() {
        assert_eq!(Literal::Real(OrderedFloat(1.0)).to_string(), "1.0");
        assert_eq!(Literal::Integer(-7).to_string(), "-7");
        let seq = Literal::from_json(&json!(["a", 2])).unwrap();
        assert_eq!(seq.to_string(), r#"["a", 2]"#);
    }

    #[test]
    fn nested_sequences_are_detected() {
        let leaf = |v: serde_json::Value| LeafNode { witnesses: BTreeSet::from([Literal::from_json(&v).unwrap()]) };
        assert!(leaf(json!([["a"]])).has_nested());
        assert!(leaf(json!([1, [2]])).has_nested());
        assert!(!leaf(json!(["a", "b"])).has_nested());
        assert!(!leaf(json!("a")).has_nested());
    }

    #[test]
    fn includes_object_is_recursive() {
        assert!(includes_object(&json!([[{"a": 1}]])));
        assert!(!includes_object(&json!([[1], 2])));
    }
}
