use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// How the annotator treats a result whose type has no display rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRulePolicy {
    /// Abort the whole request. Rule-table completeness is a deploy-time
    /// invariant.
    #[default]
    Fail,
    /// Keep the row with an empty display mapping and the generic
    /// fallback rendering.
    Skip,
}

/// Engine settings, loaded from `omnidex.toml` merged with `OMNIDEX_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Name of the database holding the `search_index` table.
    pub database: String,
    /// Path to the YAML display-rule file.
    pub rules_file: PathBuf,
    /// Database name to SQLite file path. `":memory:"` is accepted.
    #[serde(default)]
    pub databases: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub missing_rule: MissingRulePolicy,
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        Self::from_file("omnidex.toml")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("OMNIDEX_"))
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}
