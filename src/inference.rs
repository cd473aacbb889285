//! Schema merge engine.
//!
//! Samples are folded, strictly left to right, into one schema tree. Every
//! merge is an OR over the per-slot flags and a set-union over leaf
//! witnesses, so for structurally consistent samples the result does not
//! depend on sample order. A structural clash never rewrites the tree: the
//! slot is flagged `inconsistent` and the conflicting sample is dropped at
//! that position.
//!
//! Known limitation: arrays holding objects are modelled by their first
//! element only. Neither length nor per-index variation is tracked.
pub mod arr;
pub mod leaf;
pub mod obj;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{includes_object, LeafNode, Literal, ObjectNode, SchemaTree, Slot};

// ------------------------------- Context ---------------------------------- //

/// The flags of the slot that owns the node being merged.
///
/// Passed down the recursion instead of storing a child → parent link.
/// Array elements report to the slot owning the array.
pub struct SlotContext<'a> {
    nullable: &'a mut bool,
    inconsistent: &'a mut bool,
}

impl SlotContext<'_> {
    pub fn mark_nullable(&mut self) {
        *self.nullable = true;
    }

    pub fn mark_inconsistent(&mut self) {
        *self.inconsistent = true;
    }
}

// ----------------------------- Initialize --------------------------------- //

/// Build a fresh node with the shape of `v`. Every nested slot starts with
/// all flags cleared; a null sample marks the owner nullable.
pub fn initialize(v: &Value, ctx: &mut SlotContext<'_>) -> SchemaTree {
    match v {
        Value::Object(m) => SchemaTree::Object(ObjectNode::from_map(m)),
        Value::Array(xs) if includes_object(v) => match xs.first() {
            Some(first) => arr::initialize(first, ctx),
            None => SchemaTree::Leaf(LeafNode::default()),
        },
        other => {
            let mut leaf = LeafNode::default();
            if let Some(lit) = Literal::from_json(other) {
                if lit == Literal::Null {
                    ctx.mark_nullable();
                }
                leaf.witnesses.insert(lit);
            }
            SchemaTree::Leaf(leaf)
        }
    }
}

impl ObjectNode {
    pub fn from_map(m: &Map<String, Value>) -> Self {
        let mut out = Self::default();
        for (k, v) in m {
            out.fields.insert(k.clone(), Slot::from_value(v));
        }
        out
    }
}

impl Slot {
    /// A new, required slot shaped like `v`.
    pub fn from_value(v: &Value) -> Self {
        let mut nullable = false;
        let mut inconsistent = false;
        let schema = initialize(v, &mut SlotContext { nullable: &mut nullable, inconsistent: &mut inconsistent });
        Self { schema, optional: false, nullable, inconsistent }
    }

    pub fn merge(&mut self, v: &Value) {
        let Slot { schema, nullable, inconsistent, .. } = self;
        merge_node(schema, v, &mut SlotContext { nullable, inconsistent });
    }
}

// -------------------------------- Merge ----------------------------------- //

pub fn merge_node(node: &mut SchemaTree, v: &Value, ctx: &mut SlotContext<'_>) {
    let promote = match node {
        SchemaTree::Object(o) => {
            match v {
                Value::Object(m) => o.merge(m),
                Value::Null => ctx.mark_nullable(),
                _ => ctx.mark_inconsistent(),
            }
            false
        }
        SchemaTree::Array(a) => {
            a.merge(v, ctx);
            false
        }
        SchemaTree::Leaf(l) => l.merge(v, ctx),
    };
    // an unobserved leaf takes the shape of its first structured sample
    if promote {
        *node = initialize(v, ctx);
    }
}

/// One fold step: `None` initializes the tree from `v`.
pub fn merge(root: Option<Slot>, v: &Value) -> Slot {
    match root {
        None => Slot::from_value(v),
        Some(mut slot) => {
            slot.merge(v);
            slot
        }
    }
}

// ------------------------------- Front API -------------------------------- //

#[derive(Debug, Default)]
pub struct Inference {
    root: Option<Slot>,
    samples: u64,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_value(&mut self, v: &Value) {
        self.root = Some(merge(self.root.take(), v));
        self.samples += 1;
    }

    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    pub fn root(&self) -> Option<&Slot> {
        self.root.as_ref()
    }

    /// Freeze the tree for emission.
    pub fn solve(self) -> Result<Slot> {
        debug!(samples = self.samples, "schema merge finished");
        self.root.ok_or(Error::NoSamples)
    }
}

pub fn infer_from_values<'a, I>(values: I) -> Option<Slot>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inf = Inference::new();
    for v in values {
        inf.observe_value(v);
    }
    inf.root
}

// ------------------------------- Debug view ------------------------------- //

/// JSON rendering of a merged slot (flags, shape and witnesses).
pub fn emit_schema(slot: &Slot) -> Value {
    json!({
        "optional": slot.optional,
        "nullable": slot.nullable,
        "inconsistent": slot.inconsistent,
        "schema": emit_tree(&slot.schema),
    })
}

fn emit_tree(tree: &SchemaTree) -> Value {
    match tree {
        SchemaTree::Object(o) => {
            let fields: Map<String, Value> = o.fields.iter().map(|(k, s)| (k.clone(), emit_schema(s))).collect();
            json!({ "type": "object", "fields": fields })
        }
        SchemaTree::Array(a) => json!({ "type": "array", "element": emit_tree(&a.element) }),
        SchemaTree::Leaf(l) => json!({
            "type": "leaf",
            "witnesses": l.witnesses.iter().map(literal_to_json).collect::<Vec<_>>(),
        }),
    }
}

fn literal_to_json(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Integer(i) => i64::try_from(*i).map(Value::from).unwrap_or_else(|_| Value::from(i.to_string())),
        Literal::Real(x) => serde_json::Number::from_f64(x.0).map(Value::Number).unwrap_or(Value::Null),
        Literal::Text(s) => Value::String(s.clone()),
        Literal::Seq(xs) => Value::Array(xs.iter().map(literal_to_json).collect()),
    }
}

// ------------------------------- Tests ------------------------------------ //
