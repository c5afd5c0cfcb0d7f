//! Persistence across handles: file-backed reopen, export/import, quota.

use chrono::Duration;
use crm::config::{OpenOptions, DB_VERSION_KEY};
use crm::model::{now, Company, Contact, Deal, Priority, WorkStatus};
use crm::storage::migrations::rollback_migration;
use crm::storage::seed::find_migration;
use crm::storage::{FileStore, KeyValueStore, SqliteStorage};
use crm::Error;
use tempfile::TempDir;

fn open_file(dir: &std::path::Path, options: OpenOptions) -> SqliteStorage {
    SqliteStorage::open(Box::new(FileStore::open(dir).unwrap()), options).unwrap()
}

#[test]
fn test_reopen_file_store_keeps_records() {
    let temp = TempDir::new().unwrap();

    {
        let db = open_file(temp.path(), OpenOptions::without_migrations());
        db.contacts()
            .create(&Contact::new("Ann Lee").with_id("c1").with_email("ann@example.com"))
            .unwrap();
        db.deals()
            .create(&Deal::new("Renewal", "", "ann", now() + Duration::days(3)).with_id("d1"))
            .unwrap();
        db.deals().add_contact("d1", "c1").unwrap();
        db.close().unwrap();
    }

    let store = FileStore::open(temp.path()).unwrap();
    assert_eq!(store.get(DB_VERSION_KEY).unwrap().as_deref(), Some("1"));

    let db = open_file(temp.path(), OpenOptions::without_migrations());
    let ann = db.contacts().find_by_email("ann@example.com").unwrap().unwrap();
    assert_eq!(ann.id, "c1");
    let deal = db.deals().get_with_relationships("d1").unwrap().unwrap();
    assert_eq!(deal.contact_ids, vec!["c1"]);
}

#[test]
fn test_force_new_ignores_stored_snapshot() {
    let temp = TempDir::new().unwrap();
    {
        let db = open_file(temp.path(), OpenOptions::without_migrations());
        db.contacts().create(&Contact::new("Gone").with_id("c1")).unwrap();
    }

    let db = open_file(temp.path(), OpenOptions {
        force_new: true,
        ..OpenOptions::without_migrations()
    });
    assert!(db.contacts().get_by_id("c1").unwrap().is_none());
    assert_eq!(db.schema_version(), 1);
}

#[test]
fn test_export_import_between_handles() {
    let source = SqliteStorage::open_memory().unwrap();
    source
        .deals()
        .create(
            &Deal::new("Expansion", "Second team", "bob", now())
                .with_id("d1")
                .with_status(WorkStatus::InProgress)
                .with_priority(Priority::High)
                .with_amount(12_500.0, "USD"),
        )
        .unwrap();
    let image = source.export().unwrap();
    assert!(image.starts_with(b"SQLite format 3\0"));

    let mut target = SqliteStorage::open_memory().unwrap();
    target.import(&image).unwrap();

    let stats = target.deals().get_statistics().unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.in_progress, 1);
    assert!((stats.total_value - 12_500.0).abs() < f64::EPSILON);
}

#[test]
fn test_quota_keeps_in_memory_changes() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path()).unwrap().with_quota(1024);

    // The initial save does not fit either; open still hands out the database.
    let db = SqliteStorage::open(Box::new(store), OpenOptions::without_migrations()).unwrap();

    let err = db.contacts().create(&Contact::new("Ann").with_id("c1")).unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(err.hint().unwrap().contains("export"));
    assert!(db.contacts().get_by_id("c1").unwrap().is_some());
}

#[test]
fn test_seeded_database_survives_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let db = open_file(temp.path(), OpenOptions::default());
        assert_eq!(db.stats().unwrap().count_of("contacts"), Some(5));
    }

    // Migrations are recorded, so a second open does not duplicate anything.
    let db = open_file(temp.path(), OpenOptions::default());
    let stats = db.stats().unwrap();
    assert_eq!(stats.count_of("contacts"), Some(5));
    assert_eq!(stats.count_of("deals"), Some(3));
    assert!(db.check_foreign_keys().unwrap().is_empty());
}

#[test]
fn test_import_rejects_garbage() {
    let mut db = SqliteStorage::open_memory().unwrap();
    db.contacts().create(&Contact::new("Kept").with_id("c1")).unwrap();

    let result = db.import(&[0xAB_u8; 8192]);
    assert!(matches!(result, Err(Error::EngineInit(_) | Error::Database(_))));
    assert!(db.contacts().get_by_id("c1").unwrap().is_some());
}

#[test]
fn test_linked_contact_deletes_after_import() {
    let mut db = SqliteStorage::open_memory().unwrap();
    db.contacts().create(&Contact::new("Ann").with_id("c1")).unwrap();
    db.companies().create(&Company::new("Acme").with_id("co1")).unwrap();
    db.companies().add_contact("co1", "c1").unwrap();

    let image = db.export().unwrap();
    db.import(&image).unwrap();

    assert!(db.contacts().delete("c1").unwrap());
    assert!(db.contacts().get_by_id("c1").unwrap().is_none());
    // Junction rows are left behind and only show up in the manual check
    assert_eq!(db.companies().contact_ids("co1").unwrap(), vec!["c1"]);
    assert_eq!(db.check_foreign_keys().unwrap().len(), 1);

    // Linking to an owner that does not exist is not rejected either
    db.companies().add_contact("missing", "c1").unwrap();
}

#[test]
fn test_rollback_after_reopen() {
    let temp = TempDir::new().unwrap();
    drop(open_file(temp.path(), OpenOptions::default()));

    let db = open_file(temp.path(), OpenOptions::without_migrations());
    let deals = find_migration(4).unwrap();
    rollback_migration(&db, deals).unwrap();
    assert_eq!(db.stats().unwrap().count_of("deals"), Some(0));

    // Deleting a seeded contact that companies still link to
    assert!(db.contacts().delete("contact-1").unwrap());
}
