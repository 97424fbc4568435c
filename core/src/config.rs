use crate::error::{Error, Result};
use crate::snippet::SnippetConfig;
use crate::tokenizer::TokenizerConfig;
use crate::vectorizer::Weighting;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for building and querying an index. Every field has a default,
/// so a config file only needs the keys it changes:
///
/// ```json
/// { "tokenizer": { "stem": true }, "snippet": { "max_chars": 300 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub tokenizer: TokenizerConfig,
    pub weighting: Weighting,
    pub snippet: SnippetConfig,
}

impl IndexConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: IndexConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.snippet.max_chars == 0 {
            return Err(Error::Config("snippet.max_chars must be positive".into()));
        }
        if self.tokenizer.min_token_len == 0 {
            return Err(Error::Config("tokenizer.min_token_len must be positive".into()));
        }
        Ok(())
    }
}
