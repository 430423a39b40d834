//! Derived configuration values
//!
//! Pure functions over the configuration document, re-evaluated whenever an
//! input affecting them changes. Nothing here prompts or touches the
//! filesystem.

use crate::config::{schema, ConfigDocument};

/// Backup categories, each owned by exactly one role in a given topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupCategory {
    Postgres,
    Mongo,
    Redis,
    Media,
}

impl BackupCategory {
    pub const ALL: [BackupCategory; 4] = [
        BackupCategory::Postgres,
        BackupCategory::Mongo,
        BackupCategory::Redis,
        BackupCategory::Media,
    ];

    pub fn schedule_key(&self) -> &'static str {
        match self {
            BackupCategory::Postgres => "postgres_backup_schedule",
            BackupCategory::Mongo => "mongo_backup_schedule",
            BackupCategory::Redis => "redis_backup_schedule",
            BackupCategory::Media => "media_backup_schedule",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BackupCategory::Postgres => "PostgreSQL",
            BackupCategory::Mongo => "MongoDB",
            BackupCategory::Redis => "Redis",
            BackupCategory::Media => "media files",
        }
    }
}

/// Server role in the current topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Single-instance installation running every service.
    Single,
    Frontend,
    PrimaryBackend,
    SecondaryBackend,
}

/// The role the document currently describes.
pub fn role(doc: &ConfigDocument) -> Role {
    if !doc.get_bool("multi_server") {
        return Role::Single;
    }
    match doc.get_str("server_role").as_str() {
        "backend" => {
            if doc.get_str("backend_role") == "secondary" {
                Role::SecondaryBackend
            } else {
                Role::PrimaryBackend
            }
        }
        _ => Role::Frontend,
    }
}

/// The port the public hostname actually answers on: the proxy port when a
/// reverse proxy terminates traffic, otherwise the directly-exposed port.
pub fn effective_public_port(doc: &ConfigDocument) -> u16 {
    if doc.get_bool("use_proxy") {
        if doc.get_bool("use_letsencrypt") {
            443
        } else {
            doc.get_port("proxy_port")
        }
    } else {
        doc.get_port("exposed_http_port")
    }
}

/// Whether the current role/topology is the authoritative owner of a backup
/// category. Non-owned categories must never carry a schedule.
pub fn owns_backup(doc: &ConfigDocument, category: BackupCategory) -> bool {
    use BackupCategory::*;
    match role(doc) {
        Role::Single => true,
        Role::Frontend => category == Media,
        Role::PrimaryBackend => match category {
            Mongo => true,
            Postgres => doc.get_bool("run_postgres_backup_from_current_server"),
            Redis => doc.get_bool("run_redis_backup_from_current_server"),
            Media => false,
        },
        Role::SecondaryBackend => match category {
            Postgres => doc.get_bool("run_postgres_backup_from_current_server"),
            Redis => doc.get_bool("run_redis_backup_from_current_server"),
            Mongo | Media => false,
        },
    }
}

/// Default schedule for a category on this document, empty when not owned
/// or when backups are disabled.
pub fn default_backup_schedule(doc: &ConfigDocument, category: BackupCategory) -> &'static str {
    if doc.get_bool("use_backup") && owns_backup(doc, category) {
        schema::default_schedule(category)
    } else {
        ""
    }
}

/// Compose project prefix, derived from topology and role so independently
/// started frontend/backend/maintenance stacks never share docker networks.
pub fn compose_prefix(doc: &ConfigDocument) -> String {
    match role(doc) {
        Role::Single => "stackpilot".to_string(),
        Role::Frontend => "stackpilot-fe".to_string(),
        Role::PrimaryBackend => "stackpilot-be-primary".to_string(),
        Role::SecondaryBackend => "stackpilot-be-secondary".to_string(),
    }
}

/// Prefix for the maintenance stack, kept distinct from the serving stack.
pub fn maintenance_prefix(doc: &ConfigDocument) -> String {
    format!("{}-maintenance", compose_prefix(doc))
}

/// Write every derived key back into the document: clears schedules for
/// non-owned categories and stores the effective port for template use.
pub fn apply(doc: &mut ConfigDocument) {
    for category in BackupCategory::ALL {
        if !owns_backup(doc, category) || !doc.get_bool("use_backup") {
            doc.set_str(category.schedule_key(), "");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> ConfigDocument {
        ConfigDocument::defaults()
    }

    fn secondary_backend() -> ConfigDocument {
        let mut doc = ConfigDocument::defaults();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "backend");
        doc.set_str("backend_role", "secondary");
        doc
    }

    #[test]
    fn test_effective_port_prefers_proxy() {
        let mut doc = single();
        doc.set_port("exposed_http_port", 8081);
        assert_eq!(effective_public_port(&doc), 8081);

        doc.set_bool("use_proxy", true);
        doc.set_port("proxy_port", 8443);
        assert_eq!(effective_public_port(&doc), 8443);

        doc.set_bool("use_letsencrypt", true);
        assert_eq!(effective_public_port(&doc), 443);
    }

    #[test]
    fn test_single_instance_owns_all_categories() {
        let doc = single();
        for category in BackupCategory::ALL {
            assert!(owns_backup(&doc, category));
        }
    }

    #[test]
    fn test_frontend_owns_media_only() {
        let mut doc = single();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "frontend");
        assert!(owns_backup(&doc, BackupCategory::Media));
        assert!(!owns_backup(&doc, BackupCategory::Postgres));
        assert!(!owns_backup(&doc, BackupCategory::Mongo));
        assert!(!owns_backup(&doc, BackupCategory::Redis));
    }

    #[test]
    fn test_secondary_backend_needs_delegation() {
        let mut doc = secondary_backend();
        doc.set_bool("use_backup", true);
        doc.set_bool("run_postgres_backup_from_current_server", false);
        assert!(!owns_backup(&doc, BackupCategory::Postgres));
        assert_eq!(default_backup_schedule(&doc, BackupCategory::Postgres), "");

        doc.set_bool("run_postgres_backup_from_current_server", true);
        assert!(owns_backup(&doc, BackupCategory::Postgres));
        assert!(!default_backup_schedule(&doc, BackupCategory::Postgres).is_empty());

        // Mongo backups never run from a secondary.
        assert!(!owns_backup(&doc, BackupCategory::Mongo));
    }

    #[test]
    fn test_apply_clears_non_owned_schedules() {
        let mut doc = secondary_backend();
        doc.set_bool("use_backup", true);
        doc.set_str("mongo_backup_schedule", "0 1 * * 0");
        doc.set_bool("run_postgres_backup_from_current_server", true);
        doc.set_str("postgres_backup_schedule", "0 5 * * 2");

        apply(&mut doc);
        assert_eq!(doc.get_str("mongo_backup_schedule"), "");
        assert_eq!(doc.get_str("postgres_backup_schedule"), "0 5 * * 2");
    }

    #[test]
    fn test_compose_prefixes_are_distinct_per_role() {
        let mut prefixes = std::collections::HashSet::new();
        assert!(prefixes.insert(compose_prefix(&single())));

        let mut fe = single();
        fe.set_bool("multi_server", true);
        fe.set_str("server_role", "frontend");
        assert!(prefixes.insert(compose_prefix(&fe)));

        let mut be = fe.clone();
        be.set_str("server_role", "backend");
        assert!(prefixes.insert(compose_prefix(&be)));

        let sec = secondary_backend();
        assert!(prefixes.insert(compose_prefix(&sec)));
        assert!(prefixes.insert(maintenance_prefix(&sec)));
    }
}
