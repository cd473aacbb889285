use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize a JSON document, naming the offending key path on failure.
pub fn from_json_with_path<T: DeserializeOwned>(src: &str, origin: &Path) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        Error::ConfigParse { path: origin.to_path_buf(), message: format!("at {path} → {}", err.into_inner()) }
    })
}
