//! Run configuration.
//!
//! Every knob has a default, so an empty `{}` file (or no file at all) is a
//! valid configuration. Command-line flags are applied on top by the CLI.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::emit::classify::validate_date_format;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input files, read in order. Literal paths or glob patterns.
    pub input_files: Vec<String>,
    /// Where the parser model is written; stdout when absent.
    pub output_file: Option<PathBuf>,
    /// One level of indentation in the generated model (spaces only).
    pub indent: String,
    /// strftime-style patterns tried, in order, for timestamp detection.
    pub date_formats: Vec<String>,
    /// Candidates for the optional/nullable label prefixes, in preference order.
    pub marker_candidates: Vec<char>,
    /// Characters removed from generated element identifiers.
    pub identifier_strip_chars: Vec<char>,
    /// Tokens that widen a free-text element's accepted characters when they
    /// occur in a witness. Escaped forms (`\\`, `\"`, `\t`) match the
    /// escape-sanitized witnesses.
    pub free_text_extras: Vec<String>,
    /// Largest distinct-value count still emitted as a word list.
    pub max_enum_values: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_files: Vec::new(),
            output_file: None,
            indent: "  ".into(),
            date_formats: vec!["%Y-%m-%dT%H:%M:%S.%fZ".into()],
            marker_candidates: vec!['_', '+', '~', '§'],
            identifier_strip_chars: vec!['@'],
            free_text_extras: [
                " ", ",", ".", ";", ":", "=", "*", "~", "'", "`", "\\\\", "\\\"", "\\t", "/", "|", "!", "?", "@",
                "&", "#", "%", "$", "§", "+", "<", "{", "[", "(", ")", "]", "}", ">",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_enum_values: 3,
        }
    }
}

impl Config {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
        let config: Self = crate::path_de::from_json_with_path(&src, path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.indent.len() < 2 || !self.indent.chars().all(|c| c == ' ') {
            return Err(invalid("indent", "must be at least two spaces"));
        }
        for format in &self.date_formats {
            validate_date_format(format).map_err(|message| invalid("date_formats", message))?;
        }
        let distinct: BTreeSet<char> = self.marker_candidates.iter().copied().collect();
        if distinct.len() != self.marker_candidates.len() {
            return Err(invalid("marker_candidates", "characters must not repeat"));
        }
        if distinct.len() < 2 {
            return Err(invalid("marker_candidates", "needs at least two characters"));
        }
        if self.free_text_extras.iter().any(String::is_empty) {
            return Err(invalid("free_text_extras", "tokens must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> Error {
    Error::InvalidConfigValue { field, message: message.into() }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(src: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(src.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.max_enum_values, 3);
        assert!(config.free_text_extras.contains(&"\\\"".to_string()));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("{}");
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let file = write_config(r#"{ "max_enum_values": 5, "marker_candidates": ["!", "^"] }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.max_enum_values, 5);
        assert_eq!(config.marker_candidates, ['!', '^']);
        assert_eq!(config.indent, "  ");
    }

    #[test]
    fn type_errors_name_the_key_path() {
        let file = write_config(r#"{ "max_enum_values": "many" }"#);
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_enum_values"), "{err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config(r#"{ "tab_string": "  " }"#);
        assert!(matches!(Config::load(file.path()), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_indent = Config { indent: "\t".into(), ..Config::default() };
        assert!(matches!(bad_indent.validate(), Err(Error::InvalidConfigValue { field: "indent", .. })));

        let bad_format = Config { date_formats: vec!["%Y-%!".into()], ..Config::default() };
        assert!(matches!(bad_format.validate(), Err(Error::InvalidConfigValue { field: "date_formats", .. })));

        let repeated = Config { marker_candidates: vec!['_', '+', '_'], ..Config::default() };
        assert!(matches!(repeated.validate(), Err(Error::InvalidConfigValue { field: "marker_candidates", .. })));

        let one_marker = Config { marker_candidates: vec!['_'], ..Config::default() };
        assert!(matches!(one_marker.validate(), Err(Error::InvalidConfigValue { field: "marker_candidates", .. })));
    }
}
