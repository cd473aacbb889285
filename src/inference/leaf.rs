use serde_json::Value;

use super::SlotContext;
use crate::schema::{includes_object, LeafNode, Literal};

impl LeafNode {
    /// Leaf merge. Returns `true` when the leaf must be replaced by a
    /// structured node initialized from `v` (nothing but null was seen so far).
    pub(crate) fn merge(&mut self, v: &Value, ctx: &mut SlotContext<'_>) -> bool {
        if v.is_null() {
            ctx.mark_nullable();
            return false;
        }
        if self.is_null_only() {
            self.witnesses.clear();
        }

        if v.is_object() || includes_object(v) {
            if self.witnesses.is_empty() {
                return true;
            }
            ctx.mark_inconsistent();
            return false;
        }

        let Some(lit) = Literal::from_json(v) else {
            ctx.mark_inconsistent();
            return false;
        };
        let clash = if lit.is_wrapped() { self.has_bare() } else { self.has_wrapped() };
        if clash {
            ctx.mark_inconsistent();
        } else {
            self.witnesses.insert(lit);
        }
        false
    }
}
