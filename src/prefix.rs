//! Choice of the optional/nullable marker characters.
use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::SchemaTree;

/// Characters prefixed to field labels: `optional` first, then `nullable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Markers {
    pub optional: char,
    pub nullable: char,
}

/// Every field name in the tree, through nested objects and array elements.
pub fn collect_field_names(tree: &SchemaTree) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_into(tree, &mut out);
    out
}

fn collect_into(tree: &SchemaTree, out: &mut BTreeSet<String>) {
    match tree {
        SchemaTree::Object(o) => {
            for (k, slot) in &o.fields {
                out.insert(k.clone());
                collect_into(&slot.schema, out);
            }
        }
        SchemaTree::Array(a) => collect_into(&a.element, out),
        SchemaTree::Leaf(_) => {}
    }
}

/// First two candidates, in order, that no field name starts with.
pub fn select_markers(tree: &SchemaTree, candidates: &[char]) -> Result<Markers> {
    let used: BTreeSet<char> = collect_field_names(tree).iter().filter_map(|k| k.chars().next()).collect();

    let mut free = candidates.iter().copied().filter(|c| !used.contains(c));
    let optional = free.next();
    // candidates may repeat; the two markers must differ
    let nullable = free.find(|c| Some(*c) != optional);

    match (optional, nullable) {
        (Some(optional), Some(nullable)) => {
            debug!(%optional, %nullable, "selected key prefixes");
            Ok(Markers { optional, nullable })
        }
        (first, _) => Err(Error::MarkersExhausted { candidates: candidates.len(), found: usize::from(first.is_some()) }),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer_from_values;
    use serde_json::json;

    fn tree(samples: &[serde_json::Value]) -> SchemaTree {
        infer_from_values(samples).unwrap().schema
    }

    #[test]
    fn names_are_collected_through_arrays() {
        let t = tree(&[json!({"a": {"b": 1}, "xs": [{"c": 1, "d": {"e": null}}]})]);
        let names: Vec<String> = collect_field_names(&t).into_iter().collect();
        assert_eq!(names, ["a", "b", "c", "d", "e", "xs"]);
    }

    #[test]
    fn first_two_free_candidates_win() {
        let t = tree(&[json!({"a": 1})]);
        assert_eq!(select_markers(&t, &['_', '+', '~']).unwrap(), Markers { optional: '_', nullable: '+' });
    }

    #[test]
    fn colliding_candidates_are_skipped() {
        let t = tree(&[json!({"_id": 1, "nested": {"+x": 2}})]);
        assert_eq!(select_markers(&t, &['_', '+', '~', '§']).unwrap(), Markers { optional: '~', nullable: '§' });
    }

    #[test]
    fn duplicate_candidates_do_not_yield_equal_markers() {
        let t = tree(&[json!({"a": 1})]);
        assert_eq!(select_markers(&t, &['_', '_', '+']).unwrap(), Markers { optional: '_', nullable: '+' });
    }

    #[test]
    fn exhausted_candidates_abort() {
        let t = tree(&[json!({"_a": 1, "+b": 2, "~c": 3})]);
        let err = select_markers(&t, &['_', '+', '~', '§']).unwrap_err();
        assert!(matches!(err, Error::MarkersExhausted { candidates: 4, found: 1 }));
        assert!(select_markers(&t, &['_', '+']).is_err());
    }

    #[test]
    fn scalar_root_has_no_names() {
        let t = tree(&[json!(5)]);
        assert!(collect_field_names(&t).is_empty());
        assert!(select_markers(&t, &['_', '+']).is_ok());
    }
}
