//! Leaf element catalog and the per-run identifier dedup cache.
use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::classify::{Classification, Sign};
use crate::schema::Literal;

/// Characters every free-text element accepts.
pub const VARIABLE_BASE_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

// digits, optionally dotted, optionally followed by an `_suffix`
static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^[0-9]+(\.[0-9]+)?(_.*)?$").expect("identifier regex"));

/// Identifier for generated elements: numeric-looking names are quoted,
/// everything else loses the configured problematic characters.
pub fn sanitize_identifier(s: &str, strip: &[char]) -> String {
    if NUMERIC_ID.is_match(s) {
        format!("\"{s}\"")
    } else {
        s.chars().filter(|c| !strip.contains(c)).collect()
    }
}

// ------------------------------- Entries ---------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    DateTime { format: String },
    Fixed { value: String },
    Wordlist { values: Vec<String> },
    Integer { sign: Sign },
    Float { sign: Sign },
    Variable { charset: String },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::DateTime { .. } => "DateTimeModelElement",
            ElementKind::Fixed { .. } => "FixedDataModelElement",
            ElementKind::Wordlist { .. } => "FixedWordlistDataModelElement",
            ElementKind::Integer { .. } => "DecimalIntegerValueModelElement",
            ElementKind::Float { .. } => "DecimalFloatValueModelElement",
            ElementKind::Variable { .. } => "VariableByteDataModelElement",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub kind: ElementKind,
}

impl CatalogEntry {
    /// One `- id: ...` block, every line newline-terminated.
    pub fn render(&self, indent: &str) -> String {
        let head = indent.repeat(4);
        let body = indent.repeat(5);
        let mut out = format!("{head}- id: {}\n{body}type: {}\n{body}name: '{}'\n", self.id, self.kind.type_name(), self.id);
        match &self.kind {
            ElementKind::DateTime { format } => out.push_str(&format!("{body}date_format: '{format}'\n")),
            ElementKind::Fixed { value } if value.contains('\'') => out.push_str(&format!("{body}args: \"{value}\"\n")),
            ElementKind::Fixed { value } => out.push_str(&format!("{body}args: '{value}'\n")),
            ElementKind::Wordlist { values } => {
                out.push_str(&format!("{body}args:\n"));
                for v in values {
                    out.push_str(&format!("{body}- \"{v}\"\n"));
                }
            }
            ElementKind::Integer { sign } => {
                if *sign == Sign::Optional {
                    out.push_str(&format!("{body}value_sign_type: 'optional'\n"));
                }
            }
            ElementKind::Float { sign } => {
                out.push_str(&format!("{body}exponent_type: 'optional'\n"));
                if *sign == Sign::Optional {
                    out.push_str(&format!("{body}value_sign_type: 'optional'\n"));
                }
            }
            ElementKind::Variable { charset } => out.push_str(&format!("{body}args: \"{charset}\"\n")),
        }
        out
    }
}

/// What the structure section writes for a leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Element(String),
    EmptyArray,
    NullObject,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Element(id) => f.write_str(id),
            Reference::EmptyArray => f.write_str("\"EMPTY_ARRAY\""),
            Reference::NullObject => f.write_str("\"NULL_OBJECT\""),
        }
    }
}

// -------------------------------- Dedup ----------------------------------- //

/// Parameterizations already cataloged under one field identifier.
#[derive(Debug, Default)]
struct FieldIds {
    time: Vec<String>,
    fixed: Vec<Literal>,
    lists: Vec<Vec<Literal>>,
    int: bool,
    int_signed: bool,
    float: bool,
    float_signed: bool,
    var: Vec<String>,
}

/// Index of `item` in `seen`, appending it first if new.
fn position_or_push<T: PartialEq>(seen: &mut Vec<T>, item: &T) -> (usize, bool)
where
    T: Clone,
{
    match seen.iter().position(|x| x == item) {
        Some(n) => (n, false),
        None => {
            seen.push(item.clone());
            (seen.len() - 1, true)
        }
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    strip: Vec<char>,
    cache: BTreeMap<String, FieldIds>,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(strip_chars: &[char]) -> Self {
        Self { strip: strip_chars.to_vec(), ..Self::default() }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    /// Reference for a classified leaf owned by `field`, cataloging a new
    /// element the first time a (field, category, parameters) triple shows up.
    pub fn intern(&mut self, field: &str, class: Classification) -> Reference {
        let key = sanitize_identifier(field, &self.strip);
        let ids = self.cache.entry(key).or_default();

        let (suffix, kind) = match class {
            Classification::EmptyArray => return Reference::EmptyArray,
            Classification::Null => return Reference::NullObject,
            Classification::Time { format } => {
                let (n, new) = position_or_push(&mut ids.time, &format);
                (format!("_time{n}"), new.then(|| ElementKind::DateTime { format }))
            }
            Classification::Fixed { value } => {
                let (n, new) = position_or_push(&mut ids.fixed, &value);
                (format!("_str{n}"), new.then(|| ElementKind::Fixed { value: value.to_string() }))
            }
            Classification::Enumeration { values } => {
                let (n, new) = position_or_push(&mut ids.lists, &values);
                let kind = ElementKind::Wordlist { values: values.iter().map(Literal::to_string).collect() };
                (format!("_list{n}"), new.then_some(kind))
            }
            Classification::Integer { sign } => {
                let (seen, suffix) = match sign {
                    Sign::Unsigned => (&mut ids.int, "_int"),
                    Sign::Optional => (&mut ids.int_signed, "_intopt"),
                };
                let new = !std::mem::replace(seen, true);
                (suffix.to_string(), new.then_some(ElementKind::Integer { sign }))
            }
            Classification::Real { sign } => {
                let (seen, suffix) = match sign {
                    Sign::Unsigned => (&mut ids.float, "_float"),
                    Sign::Optional => (&mut ids.float_signed, "_floatopt"),
                };
                let new = !std::mem::replace(seen, true);
                (suffix.to_string(), new.then_some(ElementKind::Float { sign }))
            }
            Classification::FreeText { extras } => {
                let (n, new) = position_or_push(&mut ids.var, &extras);
                (format!("_var{n}"), new.then(|| ElementKind::Variable { charset: format!("{VARIABLE_BASE_CHARSET}{extras}") }))
            }
        };

        let id = sanitize_identifier(&format!("{field}{suffix}"), &self.strip);
        if let Some(kind) = kind {
            self.entries.push(CatalogEntry { id: id.clone(), kind });
        }
        Reference::Element(id)
    }
}

// ------------------------------- Tests ------------------------------------ //
