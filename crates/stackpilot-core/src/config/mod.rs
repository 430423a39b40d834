//! Configuration document and its persistent store

pub mod migration;
pub mod schema;

use crate::error::CoreError;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flat key-value configuration document. Keys and types are canonical
/// after load-time migration; all access goes through the typed accessors.
///
/// The document is exclusively owned by the [`ConfigStore`] for the duration
/// of one invocation; question topics and the resolver mutate it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    values: BTreeMap<String, Value>,
}

impl ConfigDocument {
    /// A document populated with every schema default.
    pub fn defaults() -> Self {
        let values = schema::SCHEMA
            .iter()
            .map(|e| (e.key.to_string(), schema::default_value(e)))
            .collect();
        Self { values }
    }

    /// Build a document from a raw loaded map. Unknown keys are kept as-is
    /// so migration can translate or drop them.
    pub fn from_raw(raw: BTreeMap<String, Value>) -> Self {
        Self { values: raw }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String value of a key, falling back to the schema default.
    pub fn get_str(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => schema::entry(key).map(|e| e.default.to_string()).unwrap_or_default(),
        }
    }

    /// Boolean value of a key, falling back to the schema default.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            _ => schema::entry(key).map(|e| e.default == "true").unwrap_or(false),
        }
    }

    /// Port value of a key. A non-numeric stored value falls back to the
    /// schema default.
    pub fn get_port(&self, key: &str) -> u16 {
        self.get_str(key)
            .parse()
            .ok()
            .or_else(|| schema::entry(key).and_then(|e| e.default.parse().ok()))
            .unwrap_or(0)
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    pub fn set_port(&mut self, key: &str, value: u16) {
        self.values.insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Substitution map for the template renderer: every key uppercased,
    /// booleans rendered as "true"/"" so guards treat false as absent.
    pub fn render_context(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::Bool(true) => "true".to_string(),
                    Value::Bool(false) => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.to_uppercase(), rendered)
            })
            .collect()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Loads and persists the configuration document as a flat JSON object with
/// owner-only permissions.
pub struct ConfigStore {
    path: PathBuf,
    first_run: bool,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            first_run: false,
        }
    }

    /// Whether no prior configuration existed when [`load`](Self::load) ran.
    pub fn first_run(&self) -> bool {
        self.first_run
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, degrading to schema defaults when the file is
    /// missing or unreadable, then run migration. Never fails on content:
    /// a corrupt or partial document degrades rather than raising.
    pub fn load(&mut self) -> ConfigDocument {
        let raw = std::fs::read_to_string(&self.path).ok().and_then(|text| {
            serde_json::from_str::<BTreeMap<String, Value>>(&text).ok()
        });

        let mut doc = match raw {
            Some(map) => ConfigDocument::from_raw(map),
            None => {
                self.first_run = true;
                ConfigDocument::defaults()
            }
        };

        migration::migrate(&mut doc);
        doc
    }

    /// Persist the complete in-memory document. The write is all-or-nothing:
    /// the document is serialized first, written to a temporary file, then
    /// renamed over the destination.
    pub fn save(&self, doc: &ConfigDocument) -> Result<()> {
        let text = serde_json::to_string_pretty(&doc.to_json())
            .context("Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::filesystem(parent, e))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &text).map_err(|e| CoreError::filesystem(&tmp, e))?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CoreError::filesystem(&self.path, e))?;

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| CoreError::filesystem(path, e))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
