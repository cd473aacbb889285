use serde_json::{Map, Value};

use crate::schema::{ObjectNode, Slot};

impl ObjectNode {
    /// Object × object: fields missing from the sample become optional,
    /// fields new to the tree are appended as optional, shared fields recurse.
    pub(crate) fn merge(&mut self, m: &Map<String, Value>) {
        for (k, slot) in self.fields.iter_mut() {
            if !m.contains_key(k) {
                slot.optional = true;
            }
        }
        for (k, v) in m {
            match self.fields.get_mut(k) {
                Some(slot) => slot.merge(v),
                None => {
                    let mut slot = Slot::from_value(v);
                    slot.optional = true;
                    self.fields.insert(k.clone(), slot);
                }
            }
        }
    }
}
