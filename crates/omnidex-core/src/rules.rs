//! The per-type display rule table.
//!
//! Rule files are two-level YAML mappings, source name first:
//!
//! ```yaml
//! github:
//!   issues:
//!     display_sql: |-
//!       select full_name, state from issues where html_url = :key
//!     display: |-
//!       <h3>{{ title }}</h3><p>{{ display.full_name }}</p>
//! ```
//!
//! Keys are flattened to the namespaced record type, `"github/issues"`.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// How to enrich and render one record type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayRule {
    /// Optional lookup query, parameterized on `:key`, returning zero or
    /// one row of extra display fields.
    #[serde(default)]
    pub display_sql: Option<String>,
    /// Optional template source, rendered with the record fields plus the
    /// `display` mapping. Stored under `display` in rule files.
    #[serde(default, rename = "display")]
    pub display_template: Option<String>,
}

/// Display rules keyed by namespaced record type. Read-only during
/// request handling; reloaded only by explicit reconfiguration.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, DisplayRule>,
}

impl RuleTable {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let nested: BTreeMap<String, BTreeMap<String, DisplayRule>> =
            serde_yaml::from_str(text)
                .map_err(|e| Error::InvalidConfig(format!("rule file: {}", e)))?;
        let mut rules = HashMap::new();
        for (source, types) in nested {
            for (type_name, rule) in types {
                rules.insert(format!("{}/{}", source, type_name), rule);
            }
        }
        Ok(Self { rules })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("rule file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Insert a rule under an already-namespaced type key.
    pub fn insert(&mut self, type_name: impl Into<String>, rule: DisplayRule) {
        self.rules.insert(type_name.into(), rule);
    }

    pub fn get(&self, type_name: &str) -> Option<&DisplayRule> {
        self.rules.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
