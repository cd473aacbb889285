use serde_json::Value;

use super::{initialize as initialize_node, merge_node, SlotContext};
use crate::schema::{includes_object, ArrayNode, SchemaTree};

/// Array schema built from the first element of a sample array.
pub(crate) fn initialize(first: &Value, ctx: &mut SlotContext<'_>) -> SchemaTree {
    SchemaTree::Array(ArrayNode { element: Box::new(initialize_node(first, ctx)) })
}

impl ArrayNode {
    /// Only arrays carrying an object are merged, through their first
    /// element; the length of the sample array is ignored.
    pub(crate) fn merge(&mut self, v: &Value, ctx: &mut SlotContext<'_>) {
        match v {
            Value::Array(xs) if includes_object(v) => {
                if let Some(first) = xs.first() {
                    merge_node(&mut self.element, first, ctx);
                }
            }
            Value::Null => ctx.mark_nullable(),
            _ => ctx.mark_inconsistent(),
        }
    }
}
