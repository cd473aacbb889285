//! Model emission engine.
//!
//! One read-only walk over the frozen tree produces the leaf catalog and the
//! nested `key_parser_dict` structure that references it. The dedup cache is
//! owned by the walk, so two emissions of the same tree give the same text.
pub mod catalog;
pub mod classify;

use tracing::warn;

use crate::config::Config;
use crate::prefix::Markers;
use crate::schema::{ArrayNode, LeafNode, ObjectNode, SchemaTree, Slot};
use catalog::{Catalog, CatalogEntry, Reference};
use classify::{classify, ClassifyOptions};

const INCONSISTENT_COMMENT: &str = "# Inconsistencies appeared in the analysis of the following node!";
const NESTED_ARRAY_COMMENT: &str = "# Arrays of arrays are not yet supported by the JSON parser!";

/// Structure entries start this many indents deep.
const ROOT_DEPTH: usize = 6;
/// Owner name for leaves that sit directly at the root.
const ROOT_FIELD: &str = "json";

#[derive(Clone, Copy, Debug)]
pub struct EmitOptions<'a> {
    pub indent: &'a str,
    pub markers: Markers,
    pub strip_chars: &'a [char],
    pub classify: ClassifyOptions<'a>,
}

impl<'a> EmitOptions<'a> {
    pub fn new(config: &'a Config, markers: Markers) -> Self {
        Self {
            indent: &config.indent,
            markers,
            strip_chars: &config.identifier_strip_chars,
            classify: ClassifyOptions {
                date_formats: &config.date_formats,
                max_enum_values: config.max_enum_values,
                free_text_extras: &config.free_text_extras,
            },
        }
    }
}

/// The generated parser model, ready to be written out.
#[derive(Clone, Debug)]
pub struct ParserModel {
    pub catalog: Vec<CatalogEntry>,
    pub structure: String,
    pub inconsistencies: usize,
    indent: String,
}

impl ParserModel {
    /// Header, catalog entries, then the root structure entry.
    pub fn render(&self) -> String {
        let mut out = String::from("Parser:\n");
        for entry in &self.catalog {
            out.push_str(&entry.render(&self.indent));
            out.push('\n');
        }
        out.push_str(&self.structure);
        out.push('\n');
        out
    }
}

pub fn emit(root: &Slot, opts: EmitOptions<'_>) -> ParserModel {
    let mut emitter = Emitter::new(opts);
    emitter.root(root);
    emitter.finish()
}

// ------------------------------- Emitter ---------------------------------- //

pub struct Emitter<'a> {
    opts: EmitOptions<'a>,
    catalog: Catalog,
    out: String,
    inconsistencies: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(opts: EmitOptions<'a>) -> Self {
        Self { catalog: Catalog::new(opts.strip_chars), opts, out: String::new(), inconsistencies: 0 }
    }

    pub fn finish(self) -> ParserModel {
        ParserModel {
            catalog: self.catalog.into_entries(),
            structure: self.out,
            inconsistencies: self.inconsistencies,
            indent: self.opts.indent.to_string(),
        }
    }

    fn root(&mut self, root: &Slot) {
        let head = self.opts.indent.repeat(4);
        let body = self.opts.indent.repeat(5);
        let Markers { optional, nullable } = self.opts.markers;
        self.out.push_str(&format!(
            "{head}- id: json\n{body}start: True\n{body}type: JsonModelElement\n{body}name: 'model'\n\
             {body}optional_key_prefix: '{optional}'\n{body}nullable_key_prefix: '{nullable}'"
        ));
        if root.inconsistent {
            warn!("inconsistent shapes observed at the root");
            self.inconsistencies += 1;
            self.line(5, INCONSISTENT_COMMENT);
        }
        self.line(5, "key_parser_dict:");
        self.value(&root.schema, ROOT_FIELD, ROOT_DEPTH);
    }

    // ------------------------------ writing ------------------------------- //

    fn open_line(&mut self, depth: usize) {
        self.out.push('\n');
        self.out.push_str(&self.opts.indent.repeat(depth));
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.open_line(depth);
        self.out.push_str(text);
    }

    /// `- ` padded so the item's content lines up with the next indent level.
    fn list_marker(&mut self, depth: usize) {
        self.open_line(depth);
        self.out.push_str("- ");
        self.out.push_str(&" ".repeat(self.opts.indent.len().saturating_sub(2)));
    }

    // ------------------------------- walk --------------------------------- //

    /// Whatever follows `label:` for a slot whose schema is `tree`.
    fn value(&mut self, tree: &SchemaTree, field: &str, depth: usize) {
        match tree {
            SchemaTree::Object(o) if o.fields.is_empty() => self.out.push_str(" EMPTY_OBJECT"),
            SchemaTree::Object(o) => self.fields(o, depth, false),
            SchemaTree::Array(a) => self.array(a, field, depth),
            SchemaTree::Leaf(l) if l.has_nested() => self.line(depth, NESTED_ARRAY_COMMENT),
            SchemaTree::Leaf(l) => match self.leaf(l, field) {
                Reference::Element(id) if l.has_wrapped() => {
                    self.list_marker(depth);
                    self.out.push_str(&id);
                }
                r => self.out.push_str(&format!(" {r}")),
            },
        }
    }

    /// Fields of an object at `depth`. As a list item the first field shares
    /// the `- ` line one level up.
    fn fields(&mut self, obj: &ObjectNode, depth: usize, list_item: bool) {
        for (i, (name, slot)) in obj.fields.iter().enumerate() {
            let item = list_item && i == 0;
            let line_depth = if item { depth - 1 } else { depth };
            if slot.inconsistent {
                warn!(field = %name, "inconsistent shapes observed");
                self.inconsistencies += 1;
                self.line(line_depth, INCONSISTENT_COMMENT);
            }
            if item {
                self.list_marker(line_depth);
            } else {
                self.open_line(depth);
            }
            let label = self.label(name, slot);
            self.out.push_str(&label);
            self.out.push(':');
            self.value(&slot.schema, name, depth + 1);
        }
    }

    fn array(&mut self, arr: &ArrayNode, field: &str, depth: usize) {
        match arr.element.as_ref() {
            SchemaTree::Object(o) if o.fields.is_empty() => {
                self.list_marker(depth);
                self.out.push_str("EMPTY_OBJECT");
            }
            SchemaTree::Object(o) => self.fields(o, depth + 1, true),
            SchemaTree::Leaf(l) if !l.has_wrapped() => {
                let r = self.leaf(l, field);
                self.list_marker(depth);
                self.out.push_str(&r.to_string());
            }
            SchemaTree::Array(_) | SchemaTree::Leaf(_) => self.line(depth, NESTED_ARRAY_COMMENT),
        }
    }

    fn leaf(&mut self, leaf: &LeafNode, field: &str) -> Reference {
        let class = classify(leaf, &self.opts.classify);
        self.catalog.intern(field, class)
    }

    /// Field name with the nullable/optional markers; quoted unless it starts
    /// with a letter.
    fn label(&self, name: &str, slot: &Slot) -> String {
        let mut label = String::new();
        if slot.nullable && !slot.schema.is_null_only() {
            label.push(self.opts.markers.nullable);
        }
        if slot.optional {
            label.push(self.opts.markers.optional);
        }
        label.push_str(name);
        if name.chars().next().is_some_and(char::is_alphabetic) {
            label
        } else {
            format!("\"{}\"", crate::schema::sanitize_text(&label))
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
