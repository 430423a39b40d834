//! Schema migration for configurations persisted by older releases
//!
//! Migration is a single typed-decoder step executed once at load time.
//! After it runs, every recognized key holds its canonical type and name;
//! internal code never sees legacy encodings. Migration never fails: a
//! corrupt or partial document degrades to schema defaults.

use super::schema::{self, KeyType, SCHEMA_VERSION};
use super::ConfigDocument;
use semver::Version;
use serde_json::Value;

/// Key renames applied to pre-2.0 documents, old name to current name.
const RENAMES: &[(&str, &str)] = &[
    ("backend_server_role", "backend_role"),
    ("aws_backup_bucket", "aws_bucket_name"),
    ("http_port", "exposed_http_port"),
];

/// Bring a loaded document up to the current schema in place.
/// Idempotent: migrating an already-current document is a no-op.
pub fn migrate(doc: &mut ConfigDocument) {
    if is_legacy(doc) {
        apply_renames(doc);
        split_postgres_db(doc);
        rename_primary_role(doc);
    }

    coerce_booleans(doc);
    normalize_scalars(doc);
    drop_unknown_keys(doc);
    fill_defaults(doc);

    doc.set_str("config_version", SCHEMA_VERSION);
}

/// A document is legacy when its stamped version is missing, unparsable,
/// or older than the current schema version.
fn is_legacy(doc: &ConfigDocument) -> bool {
    let current = Version::parse(SCHEMA_VERSION).unwrap_or(Version::new(0, 0, 0));
    match doc.get("config_version") {
        Some(Value::String(v)) => Version::parse(v).map(|v| v < current).unwrap_or(true),
        _ => true,
    }
}

fn apply_renames(doc: &mut ConfigDocument) {
    for (old, new) in RENAMES {
        if let Some(value) = doc.remove(old) {
            // The current name wins if both are somehow present.
            if !doc.contains(new) {
                match value {
                    Value::String(s) => doc.set_str(new, s),
                    Value::Bool(b) => doc.set_bool(new, b),
                    other => doc.set_str(new, other.to_string()),
                }
            }
        }
    }
}

/// Older releases had one shared `postgres_db`; it now splits into
/// role-specific databases when the split keys are absent.
fn split_postgres_db(doc: &mut ConfigDocument) {
    if let Some(Value::String(db)) = doc.remove("postgres_db") {
        if !doc.contains("postgres_db_api") {
            doc.set_str("postgres_db_api", db.clone());
        }
        if !doc.contains("postgres_db_reports") {
            doc.set_str("postgres_db_reports", format!("{}_reports", db));
        }
    }
}

/// The authoritative backend role used to be called "master".
fn rename_primary_role(doc: &mut ConfigDocument) {
    if let Some(Value::String(role)) = doc.get("backend_role") {
        if role == "master" {
            doc.set_str("backend_role", "primary");
        }
    }
}

/// Legacy documents encode booleans as the strings "1" (yes) and "2" (no),
/// and hand-edited ones sometimes as numbers. "1" (or the number 1) maps to
/// true; any other non-bool scalar maps to false.
fn coerce_booleans(doc: &mut ConfigDocument) {
    for key in schema::BOOLEAN_KEYS {
        let coerced = match doc.get(key) {
            None | Some(Value::Bool(_)) => None,
            Some(Value::String(raw)) => Some(raw == "1"),
            Some(Value::Number(n)) => Some(n.as_i64() == Some(1)),
            Some(_) => Some(false),
        };
        if let Some(value) = coerced {
            doc.set_bool(key, value);
        }
    }
}

/// Canonicalize non-boolean scalars: ports and strings are stored as JSON
/// strings, numbers are stringified.
fn normalize_scalars(doc: &mut ConfigDocument) {
    let keys: Vec<String> = doc.keys().map(str::to_string).collect();
    for key in keys {
        let Some(entry) = schema::entry(&key) else {
            continue;
        };
        if matches!(entry.kind, KeyType::Str | KeyType::Port) {
            match doc.get(&key) {
                Some(Value::String(_)) => {}
                Some(Value::Number(n)) => {
                    let n = n.to_string();
                    doc.set_str(&key, n);
                }
                Some(Value::Bool(b)) => {
                    let b = b.to_string();
                    doc.set_str(&key, b);
                }
                _ => doc.set_str(&key, entry.default),
            }
        }
    }
}

/// Unknown keys with no rename rule are dropped rather than carried along.
fn drop_unknown_keys(doc: &mut ConfigDocument) {
    let unknown: Vec<String> = doc
        .keys()
        .filter(|k| schema::entry(k).is_none())
        .map(str::to_string)
        .collect();
    for key in unknown {
        doc.remove(&key);
    }
}

/// Every schema key missing from the document gets its default.
fn fill_defaults(doc: &mut ConfigDocument) {
    for entry in schema::SCHEMA {
        if !doc.contains(entry.key) {
            match entry.kind {
                KeyType::Bool => doc.set_bool(entry.key, entry.default == "true"),
                KeyType::Str | KeyType::Port => doc.set_str(entry.key, entry.default),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn legacy_doc(pairs: &[(&str, Value)]) -> ConfigDocument {
        let map: BTreeMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ConfigDocument::from_raw(map)
    }

    #[test]
    fn test_migration_is_idempotent() {
        let mut doc = legacy_doc(&[
            ("multi_server", Value::String("1".into())),
            ("backend_server_role", Value::String("master".into())),
            ("postgres_db", Value::String("appdb".into())),
        ]);
        migrate(&mut doc);
        let once = doc.clone();
        migrate(&mut doc);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_string_flags_become_booleans() {
        for key in schema::BOOLEAN_KEYS {
            let mut doc = legacy_doc(&[(key, Value::String("1".into()))]);
            migrate(&mut doc);
            assert!(doc.get_bool(key), "{} should migrate \"1\" to true", key);

            let mut doc = legacy_doc(&[(key, Value::String("2".into()))]);
            migrate(&mut doc);
            assert!(!doc.get_bool(key), "{} should migrate \"2\" to false", key);
        }
    }

    #[test]
    fn test_numeric_flags_become_booleans() {
        let mut doc = legacy_doc(&[
            ("use_aws", Value::Number(1.into())),
            ("debug", Value::Number(0.into())),
            ("use_backup", Value::Null),
        ]);
        migrate(&mut doc);
        assert!(doc.get_bool("use_aws"));
        assert!(matches!(doc.get("use_aws"), Some(Value::Bool(true))));
        assert!(!doc.get_bool("debug"));
        assert!(matches!(doc.get("debug"), Some(Value::Bool(false))));
        assert!(matches!(doc.get("use_backup"), Some(Value::Bool(false))));
    }

    #[test]
    fn test_master_role_becomes_primary() {
        let mut doc = legacy_doc(&[("backend_server_role", Value::String("master".into()))]);
        migrate(&mut doc);
        assert!(!doc.contains("backend_server_role"));
        assert_eq!(doc.get_str("backend_role"), "primary");
    }

    #[test]
    fn test_postgres_db_splits_into_role_specific_keys() {
        let mut doc = legacy_doc(&[("postgres_db", Value::String("appdb".into()))]);
        migrate(&mut doc);
        assert!(!doc.contains("postgres_db"));
        assert_eq!(doc.get_str("postgres_db_api"), "appdb");
        assert_eq!(doc.get_str("postgres_db_reports"), "appdb_reports");
    }

    #[test]
    fn test_split_keeps_existing_split_keys() {
        let mut doc = legacy_doc(&[
            ("postgres_db", Value::String("appdb".into())),
            ("postgres_db_api", Value::String("kept".into())),
        ]);
        migrate(&mut doc);
        assert_eq!(doc.get_str("postgres_db_api"), "kept");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let mut doc = legacy_doc(&[("long_gone_setting", Value::String("x".into()))]);
        migrate(&mut doc);
        assert!(!doc.contains("long_gone_setting"));
    }

    #[test]
    fn test_missing_keys_get_defaults_and_version_is_stamped() {
        let mut doc = legacy_doc(&[]);
        migrate(&mut doc);
        assert_eq!(doc.get_str("config_version"), SCHEMA_VERSION);
        assert_eq!(doc.get_str("postgres_profile"), "Mixed");
        assert!(!doc.get_bool("use_aws"));
    }

    #[test]
    fn test_numeric_port_is_stringified() {
        let mut doc = legacy_doc(&[("exposed_http_port", Value::Number(8080.into()))]);
        migrate(&mut doc);
        assert_eq!(doc.get_port("exposed_http_port"), 8080);
        assert!(matches!(
            doc.get("exposed_http_port"),
            Some(Value::String(_))
        ));
    }

    #[test]
    fn test_current_document_skips_legacy_rules() {
        // A current-version document holding the literal value "master"
        // for some unrelated string key must not be rewritten.
        let mut doc = ConfigDocument::defaults();
        doc.set_str("backend_role", "secondary");
        migrate(&mut doc);
        assert_eq!(doc.get_str("backend_role"), "secondary");
    }
}
