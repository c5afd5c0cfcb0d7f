//! Database schema definitions.
//!
//! Timestamps are stored as INTEGER (Unix milliseconds). Structured fields
//! (social links, badge) are JSON text. Foreign keys are declared for
//! documentation and on-demand checking only; the `foreign_keys` pragma stays
//! off, so deleting an entity leaves its junction rows behind unless the
//! caller removes them first.

use rusqlite::{Connection, OptionalExtension, Result};
use tracing::debug;

/// Schema version this build understands.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_VERSION_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);";

// ====================
// Lookup Tables
// ====================

const LOOKUP_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        color TEXT,
        bullet TEXT,
        description TEXT
    );",
    "CREATE TABLE IF NOT EXISTS connection_strengths (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        color TEXT
    );",
    "CREATE TABLE IF NOT EXISTS employee_ranges (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS estimated_arrs (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL
    );",
];

// ====================
// Entity Tables
// ====================

const ENTITY_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS companies (
        id TEXT PRIMARY KEY,
        logo TEXT,
        name TEXT NOT NULL,
        domain TEXT,
        email TEXT,
        phone TEXT,
        description TEXT,
        address TEXT,
        state TEXT,
        city TEXT,
        zip TEXT,
        country TEXT,
        angel_list TEXT,
        linkedin TEXT,
        connection_strength_id TEXT,
        x TEXT,
        instagram TEXT,
        facebook TEXT,
        telegram TEXT,
        founded_at INTEGER,
        estimated_arr_id TEXT,
        employee_range_id TEXT,
        last_interaction_at INTEGER,
        last_contacted TEXT,
        team_id TEXT,
        badge TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (connection_strength_id) REFERENCES connection_strengths(id),
        FOREIGN KEY (estimated_arr_id) REFERENCES estimated_arrs(id),
        FOREIGN KEY (employee_range_id) REFERENCES employee_ranges(id)
    );",
    "CREATE TABLE IF NOT EXISTS contacts (
        id TEXT PRIMARY KEY,
        avatar TEXT,
        initials TEXT,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        position TEXT,
        company_id TEXT,
        address TEXT,
        state TEXT,
        city TEXT,
        zip TEXT,
        country TEXT,
        social_links TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (company_id) REFERENCES companies(id)
    );",
    "CREATE TABLE IF NOT EXISTS deals (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        user_name TEXT NOT NULL,
        avatar TEXT,
        status TEXT,
        priority TEXT,
        due_at INTEGER NOT NULL,
        completed_at INTEGER,
        completed_by TEXT,
        comments INTEGER DEFAULT 0,
        amount REAL,
        currency TEXT,
        payment_date INTEGER,
        payment_type TEXT,
        contract_number TEXT,
        discount REAL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_by TEXT NOT NULL,
        status TEXT,
        priority TEXT,
        due_at INTEGER NOT NULL,
        completed_at INTEGER,
        completed_by TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_by TEXT NOT NULL,
        status TEXT NOT NULL,
        logo TEXT,
        due_at INTEGER NOT NULL,
        completed_at INTEGER,
        completed_by TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );",
];

// ====================
// Junction Tables
// ====================

/// `(table, owner column, owner table, other column, other table)`.
const JUNCTIONS: &[(&str, &str, &str, &str, &str)] = &[
    ("company_contacts", "company_id", "companies", "contact_id", "contacts"),
    ("company_categories", "company_id", "companies", "category_id", "categories"),
    ("deal_companies", "deal_id", "deals", "company_id", "companies"),
    ("deal_contacts", "deal_id", "deals", "contact_id", "contacts"),
    ("deal_related_deals", "deal_id", "deals", "related_deal_id", "deals"),
    ("task_companies", "task_id", "tasks", "company_id", "companies"),
    ("task_contacts", "task_id", "tasks", "contact_id", "contacts"),
    ("task_deals", "task_id", "tasks", "deal_id", "deals"),
    ("task_assigned_contacts", "task_id", "tasks", "contact_id", "contacts"),
    ("note_companies", "note_id", "notes", "company_id", "companies"),
    ("note_assigned_contacts", "note_id", "notes", "contact_id", "contacts"),
    ("note_deals", "note_id", "notes", "deal_id", "deals"),
];

fn junction_ddl(table: &str, owner: &str, owner_table: &str, other: &str, other_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {owner} TEXT NOT NULL,
            {other} TEXT NOT NULL,
            PRIMARY KEY ({owner}, {other}),
            FOREIGN KEY ({owner}) REFERENCES {owner_table}(id),
            FOREIGN KEY ({other}) REFERENCES {other_table}(id)
        );"
    )
}

// ====================
// Indexes
// ====================

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email);",
    "CREATE INDEX IF NOT EXISTS idx_contacts_company_id ON contacts(company_id);",
    "CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);",
    "CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);",
    "CREATE INDEX IF NOT EXISTS idx_companies_domain ON companies(domain);",
    "CREATE INDEX IF NOT EXISTS idx_companies_created_at ON companies(created_at);",
    "CREATE INDEX IF NOT EXISTS idx_companies_country ON companies(country);",
    "CREATE INDEX IF NOT EXISTS idx_deals_status ON deals(status);",
    "CREATE INDEX IF NOT EXISTS idx_deals_priority ON deals(priority);",
    "CREATE INDEX IF NOT EXISTS idx_deals_due_at ON deals(due_at);",
    "CREATE INDEX IF NOT EXISTS idx_deals_created_at ON deals(created_at);",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_at ON tasks(due_at);",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_by ON tasks(created_by);",
    "CREATE INDEX IF NOT EXISTS idx_notes_status ON notes(status);",
    "CREATE INDEX IF NOT EXISTS idx_notes_created_by ON notes(created_by);",
];

/// All DDL in dependency order: version table, lookups, entities,
/// junctions, indexes.
#[must_use]
pub fn schema_statements() -> Vec<String> {
    let mut statements = vec![SCHEMA_VERSION_TABLE.to_string()];
    statements.extend(LOOKUP_TABLES.iter().map(ToString::to_string));
    statements.extend(ENTITY_TABLES.iter().map(ToString::to_string));
    statements.extend(
        JUNCTIONS
            .iter()
            .map(|(t, o, ot, x, xt)| junction_ddl(t, o, ot, x, xt)),
    );
    statements.extend(INDEXES.iter().map(ToString::to_string));
    statements
}

/// Apply the schema to the database and record the current version.
///
/// Idempotent: every statement uses `IF NOT EXISTS`, and the version table
/// is rewritten to hold exactly one row.
///
/// # Errors
///
/// Returns the first failing DDL statement's error; there is no partial
/// schema recovery.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    for ddl in schema_statements() {
        conn.execute_batch(&ddl)?;
    }

    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![SCHEMA_VERSION, chrono::Utc::now().timestamp_millis()],
    )?;

    debug!(version = SCHEMA_VERSION, "Schema applied");
    Ok(())
}

/// Read the recorded schema version.
///
/// Returns 0 when the version table is missing or empty.
#[must_use]
pub fn schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .optional()
    .ok()
    .flatten()
    .flatten()
    .unwrap_or(0)
}

/// List user tables in name order.
///
/// # Errors
///
/// Returns an error if `sqlite_master` cannot be read.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?
    .query_map([], |row| row.get(0))?
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables = table_names(&conn).unwrap();
        for expected in [
            "schema_version",
            "categories",
            "connection_strengths",
            "employee_ranges",
            "estimated_arrs",
            "companies",
            "contacts",
            "deals",
            "tasks",
            "notes",
            "company_contacts",
            "deal_related_deals",
            "note_deals",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
        assert_eq!(tables.len(), 22);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn), 0);
    }

    #[test]
    fn test_foreign_keys_not_enforced() {
        let engine = crate::storage::engine::Engine::open_in_memory().unwrap();
        let conn = engine.conn();
        apply_schema(conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 0);

        // Dangling reference is accepted
        conn.execute(
            "INSERT INTO company_contacts (company_id, contact_id) VALUES ('nope', 'nobody')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_junction_pair_is_unique() {
        let engine = crate::storage::engine::Engine::open_in_memory().unwrap();
        let conn = engine.conn();
        apply_schema(conn).unwrap();

        let insert = "INSERT INTO deal_contacts (deal_id, contact_id) VALUES ('d1', 'c1')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
