//! Canonical configuration keys, types and defaults

use serde_json::Value;

/// Current configuration schema version. Documents stamped with an older
/// version are passed through migration on load.
pub const SCHEMA_VERSION: &str = "2.0.0";

/// Ports reserved by TLS termination when Let's Encrypt is active.
pub const TLS_RESERVED_PORTS: &[u16] = &[80, 443];

/// Keys that hold booleans in the current schema. Legacy documents encode
/// these as the strings "1" (yes) and "2" (no); migration coerces them.
pub const BOOLEAN_KEYS: &[&str] = &[
    "advanced",
    "dev_mode",
    "debug",
    "multi_server",
    "maintenance_mode",
    "use_proxy",
    "use_letsencrypt",
    "use_backup",
    "use_aws",
    "use_celery",
    "aws_credentials_valid",
    "run_postgres_backup_from_current_server",
    "run_redis_backup_from_current_server",
];

/// Scalar type expected for a key after migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Bool,
    Str,
    Port,
}

/// One canonical schema entry: key name, type, default value.
pub struct SchemaEntry {
    pub key: &'static str,
    pub kind: KeyType,
    pub default: &'static str,
}

const fn b(key: &'static str, default: &'static str) -> SchemaEntry {
    SchemaEntry {
        key,
        kind: KeyType::Bool,
        default,
    }
}

const fn s(key: &'static str, default: &'static str) -> SchemaEntry {
    SchemaEntry {
        key,
        kind: KeyType::Str,
        default,
    }
}

const fn p(key: &'static str, default: &'static str) -> SchemaEntry {
    SchemaEntry {
        key,
        kind: KeyType::Port,
        default,
    }
}

/// The full canonical key set. Every recognized key appears here exactly
/// once; migration drops keys with no entry and no rename rule.
pub const SCHEMA: &[SchemaEntry] = &[
    // identity / topology
    s("config_version", SCHEMA_VERSION),
    s("unique_id", ""),
    b("advanced", "false"),
    b("dev_mode", "false"),
    b("debug", "false"),
    b("multi_server", "false"),
    s("server_role", "frontend"),
    s("backend_role", "primary"),
    b("maintenance_mode", "false"),
    // networking
    s("public_domain_name", "stackpilot.local"),
    s("app_subdomain", "app"),
    s("api_subdomain", "api"),
    p("exposed_http_port", "80"),
    p("proxy_port", "8080"),
    b("use_proxy", "false"),
    b("use_letsencrypt", "false"),
    s("letsencrypt_email", ""),
    s("primary_backend_host", ""),
    p("primary_backend_port", "8000"),
    // credentials
    s("admin_username", "admin"),
    s("admin_password", ""),
    s("api_secret_key", ""),
    s("postgres_user", "stackpilot"),
    s("postgres_password", ""),
    s("postgres_db_api", "stackpilot_api"),
    s("postgres_db_reports", "stackpilot_reports"),
    s("mongo_root_user", "root"),
    s("mongo_root_password", ""),
    s("mongo_user", "stackpilot"),
    s("mongo_password", ""),
    s("redis_password", ""),
    // storage sizing
    s("postgres_ram", "2"),
    s("postgres_profile", "Mixed"),
    // backups
    b("use_backup", "false"),
    s("postgres_backup_schedule", ""),
    s("mongo_backup_schedule", ""),
    s("redis_backup_schedule", ""),
    s("media_backup_schedule", ""),
    b("run_postgres_backup_from_current_server", "false"),
    b("run_redis_backup_from_current_server", "false"),
    s("backup_retention_days", "30"),
    // AWS / feature toggles
    b("use_aws", "false"),
    s("aws_access_key_id", ""),
    s("aws_secret_access_key", ""),
    s("aws_region", ""),
    s("aws_bucket_name", ""),
    b("aws_credentials_valid", "false"),
    b("use_celery", "true"),
];

/// Look up the schema entry for a key.
pub fn entry(key: &str) -> Option<&'static SchemaEntry> {
    SCHEMA.iter().find(|e| e.key == key)
}

/// The default value for a key, as a typed JSON scalar.
pub fn default_value(e: &SchemaEntry) -> Value {
    match e.kind {
        KeyType::Bool => Value::Bool(e.default == "true"),
        KeyType::Str | KeyType::Port => Value::String(e.default.to_string()),
    }
}

/// Default backup schedule (cron syntax) for a backup category. Applied by
/// the resolver only when the current role owns the category.
pub fn default_schedule(category: crate::resolver::BackupCategory) -> &'static str {
    use crate::resolver::BackupCategory::*;
    match category {
        Postgres => "0 2 * * 0",
        Mongo => "0 1 * * 0",
        Redis => "0 3 * * 0",
        Media => "0 0 * * 0",
    }
}
