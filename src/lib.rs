//! Parser-model generator for JSON logs.
//!
//! Sample records are merged into one schema tree ([`inference`]), marker
//! characters are chosen that no field name starts with ([`prefix`]), and the
//! frozen tree is compiled into a parser model ([`emit`]).
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod inference;
pub mod path_de;
pub mod prefix;
pub mod schema;
pub mod source;

use serde_json::Value;

use crate::config::Config;
use crate::emit::{EmitOptions, ParserModel};
use crate::error::{Error, Result};
use crate::schema::Slot;

/// Compile a merged tree. Fails before producing anything when no marker pair
/// is available.
pub fn build_model(root: &Slot, config: &Config) -> Result<ParserModel> {
    let markers = prefix::select_markers(&root.schema, &config.marker_candidates)?;
    Ok(emit::emit(root, EmitOptions::new(config, markers)))
}

/// Merge `values` in order and compile the result.
pub fn generate_model<'a, I>(values: I, config: &Config) -> Result<ParserModel>
where
    I: IntoIterator<Item = &'a Value>,
{
    let root = inference::infer_from_values(values).ok_or(Error::NoSamples)?;
    build_model(&root, config)
}
